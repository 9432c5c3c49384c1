use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::utils::quantity::{FormattedQuantity, ResourceKind};

// ============================================================================
// Utilization statistics
// ============================================================================

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeUtilization {
    pub node: String,
    pub capacity: f64,
    pub used: f64,
    pub percentage: f64,
}

/// Nearest-rank selections over nodes sorted by utilization, descending.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct Percentiles {
    pub p100: Option<NodeUtilization>,
    pub p99: Option<NodeUtilization>,
    pub p90: Option<NodeUtilization>,
    pub p50: Option<NodeUtilization>,
    pub p10: Option<NodeUtilization>,
    pub p0: Option<NodeUtilization>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStats {
    pub resource: String,
    pub kind: ResourceKind,
    pub total: f64,
    pub used: f64,
    pub percentage: f64,
    pub total_display: FormattedQuantity,
    pub used_display: FormattedQuantity,
    /// Sorted by percentage, highest first
    pub nodes: Vec<NodeUtilization>,
    pub percentiles: Percentiles,
    /// Node counts for [0,10), [10,20), ... [90,100]
    pub distribution: [usize; 10],
}

// ============================================================================
// Placement
// ============================================================================

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PodVisual {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub phase: String,
    /// Effective usage of the primary resource
    pub effective: f64,
    /// effective / node capacity, clamped to [0, 1]
    pub share: f64,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NodeResourceSummary {
    pub resource: String,
    pub capacity: f64,
    pub used: f64,
    pub percentage: f64,
    pub capacity_display: FormattedQuantity,
    pub used_display: FormattedQuantity,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    pub name: String,
    pub uid: String,
    pub roles: Vec<String>,
    pub ready: bool,
    pub unschedulable: bool,
    pub resources: Vec<NodeResourceSummary>,
    pub pods: Vec<PodVisual>,
}

// ============================================================================
// Scheduling pressure
// ============================================================================

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UnscheduledPod {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub message: String,
    /// Shortened, stable classification used for grouping
    pub reason_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct FailureReasonCount {
    pub reason: String,
    pub count: usize,
}

// ============================================================================
// Activity
// ============================================================================

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub uid: String,
    pub reason: String,
    pub message: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub object_kind: String,
    pub object_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryCounts {
    pub nodes: usize,
    pub dropped_nodes: usize,
    pub pods: usize,
    pub dropped_pods: usize,
    pub namespaces: usize,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub inventory: InventoryCounts,
    pub namespaces: Vec<String>,
    pub available_resources: Vec<String>,
    pub resources: Vec<ResourceStats>,
    pub placements: Vec<NodePlacement>,
    pub unscheduled: Vec<UnscheduledPod>,
    pub failure_reasons: Vec<FailureReasonCount>,
    pub activity: Vec<ActivityEntry>,
}

impl DashboardView {
    /// A view carrying only an inline error message.
    pub fn failed(message: String, generated_at: DateTime<Utc>) -> Self {
        Self {
            error: Some(message),
            generated_at,
            inventory: InventoryCounts::default(),
            namespaces: Vec::new(),
            available_resources: Vec::new(),
            resources: Vec::new(),
            placements: Vec::new(),
            unscheduled: Vec::new(),
            failure_reasons: Vec::new(),
            activity: Vec::new(),
        }
    }
}
