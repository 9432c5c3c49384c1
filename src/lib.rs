pub mod error;
pub mod feed;
pub mod models;
pub mod snapshot;
pub mod state;
pub mod utils;
pub mod commands {
    pub mod aggregate;
    pub mod cluster;
    pub mod events;
    pub mod placement;
    pub mod scheduling;
    pub mod stats;
}

pub use commands::cluster::{available_resources, build_dashboard};
pub use error::{DashboardError, DashboardResult};
pub use feed::{DashboardFeed, SnapshotKind, SnapshotUpdate};
pub use models::DashboardView;
pub use snapshot::{decode_list, ClusterSnapshot};
pub use state::{SelectionState, UsageBasis, ViewMode};
