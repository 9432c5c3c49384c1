//! Latest-snapshot holder that republishes the dashboard view on every change.
//!
//! The host's watch collaborator pushes whole lists; subscribers only ever see
//! the most recent [`DashboardView`].

use chrono::Utc;
use k8s_openapi::api::core::v1::{Event, Namespace, Node, Pod};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::commands::cluster::build_dashboard;
use crate::models::DashboardView;
use crate::snapshot::ClusterSnapshot;
use crate::state::SelectionState;
use crate::utils::logging::{log_category, Category};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapshotKind {
    Nodes,
    Pods,
    Namespaces,
    Events,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SnapshotKind::Nodes => "nodes",
            SnapshotKind::Pods => "pods",
            SnapshotKind::Namespaces => "namespaces",
            SnapshotKind::Events => "events",
        };
        f.write_str(name)
    }
}

/// One message from the watch collaborator.
#[derive(Debug, Clone)]
pub enum SnapshotUpdate {
    Nodes(Vec<Node>),
    Pods(Vec<Pod>),
    Namespaces(Vec<Namespace>),
    Events(Vec<Event>),
    FetchFailed(SnapshotKind, String),
}

pub struct DashboardFeed {
    snapshot: ClusterSnapshot,
    selection: SelectionState,
    failures: BTreeMap<SnapshotKind, String>,
    sender: watch::Sender<Arc<DashboardView>>,
}

impl DashboardFeed {
    pub fn new(selection: SelectionState) -> (Self, watch::Receiver<Arc<DashboardView>>) {
        let snapshot = ClusterSnapshot::default();
        let initial = Arc::new(build_dashboard(&snapshot, &selection, Utc::now()));
        let (sender, receiver) = watch::channel(initial);
        let feed = Self {
            snapshot,
            selection,
            failures: BTreeMap::new(),
            sender,
        };
        (feed, receiver)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DashboardView>> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> &ClusterSnapshot {
        &self.snapshot
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Replace one list (clearing that kind's failure) or record a fetch failure, then republish.
    pub fn apply(&mut self, update: SnapshotUpdate) -> Arc<DashboardView> {
        match update {
            SnapshotUpdate::Nodes(nodes) => {
                self.snapshot.nodes = nodes;
                self.failures.remove(&SnapshotKind::Nodes);
            }
            SnapshotUpdate::Pods(pods) => {
                self.snapshot.pods = pods;
                self.failures.remove(&SnapshotKind::Pods);
            }
            SnapshotUpdate::Namespaces(namespaces) => {
                self.snapshot.namespaces = namespaces;
                self.failures.remove(&SnapshotKind::Namespaces);
            }
            SnapshotUpdate::Events(events) => {
                self.snapshot.events = events;
                self.failures.remove(&SnapshotKind::Events);
            }
            SnapshotUpdate::FetchFailed(kind, detail) => {
                log_category(Category::Feed, log::Level::Warn, &format!("{} fetch failed: {}", kind, detail));
                self.failures.insert(kind, detail);
            }
        }

        self.snapshot.error = if self.failures.is_empty() {
            None
        } else {
            Some(
                self.failures
                    .iter()
                    .map(|(kind, detail)| format!("{}: {}", kind, detail))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };

        self.publish()
    }

    pub fn set_selection(&mut self, selection: SelectionState) -> Arc<DashboardView> {
        self.selection = selection;
        self.publish()
    }

    fn publish(&self) -> Arc<DashboardView> {
        let view = Arc::new(build_dashboard(&self.snapshot, &self.selection, Utc::now()));
        log_category(
            Category::Feed,
            log::Level::Debug,
            &format!("publishing view to {} subscriber(s)", self.sender.receiver_count()),
        );
        self.sender.send_replace(view.clone());
        view
    }
}
