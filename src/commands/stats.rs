//! Cluster and per-node utilization statistics for one resource.

use k8s_openapi::api::core::v1::Node;

use crate::commands::aggregate::ResourceTotals;
use crate::models::{NodeUtilization, Percentiles, ResourceStats};
use crate::state::UsageBasis;
use crate::utils::node_capacity;
use crate::utils::quantity::{format_resource, ResourceKind};

pub const DISTRIBUTION_BUCKETS: usize = 10;

/// used / total as a percentage clamped to [0, 100]; a zero total is 0%.
pub fn utilization_percentage(used: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    let pct = used / total * 100.0;
    if pct.is_finite() { pct.clamp(0.0, 100.0) } else { 0.0 }
}

/// Nearest rank over a list sorted descending: index = ceil((n - 1) * (1 - p / 100)).
/// P100 is the first (highest) entry, P0 the last.
pub fn select_percentile(sorted_desc: &[NodeUtilization], p: f64) -> Option<&NodeUtilization> {
    if sorted_desc.is_empty() {
        return None;
    }
    let last = sorted_desc.len() - 1;
    let index = (last as f64 * (1.0 - p / 100.0)).ceil();
    let index = if index <= 0.0 { 0 } else { (index as usize).min(last) };
    sorted_desc.get(index)
}

fn percentiles(sorted_desc: &[NodeUtilization]) -> Percentiles {
    let pick = |p: f64| select_percentile(sorted_desc, p).cloned();
    Percentiles {
        p100: pick(100.0),
        p99: pick(99.0),
        p90: pick(90.0),
        p50: pick(50.0),
        p10: pick(10.0),
        p0: pick(0.0),
    }
}

/// Bucket for a clamped percentage: [0,10) .. [80,90) are half-open, [90,100] is closed.
pub fn bucket_index(percentage: f64) -> usize {
    if percentage >= 90.0 {
        return DISTRIBUTION_BUCKETS - 1;
    }
    let index = (percentage / 10.0).floor();
    if index <= 0.0 { 0 } else { index as usize }
}

pub fn distribution(nodes: &[NodeUtilization]) -> [usize; DISTRIBUTION_BUCKETS] {
    let mut buckets = [0usize; DISTRIBUTION_BUCKETS];
    for node in nodes {
        buckets[bucket_index(node.percentage)] += 1;
    }
    buckets
}

/// Per-node utilization of `resource`, highest first.
///
/// Only nodes advertising the resource in their capacity take part.
pub fn node_utilizations(nodes: &[&Node], totals: &ResourceTotals, resource: &str, basis: UsageBasis) -> Vec<NodeUtilization> {
    let mut rows: Vec<NodeUtilization> = nodes
        .iter()
        .filter_map(|node| {
            let name = node.metadata.name.clone()?;
            let capacity = node_capacity(node, resource)?;
            let used = totals.node_usage(resource, &name, basis);
            Some(NodeUtilization {
                percentage: utilization_percentage(used, capacity),
                node: name,
                capacity,
                used,
            })
        })
        .collect();

    rows.sort_by(|a, b| b.percentage.total_cmp(&a.percentage).then_with(|| a.node.cmp(&b.node)));
    rows
}

/// Cluster totals, per-node breakdown, percentiles and histogram for one resource.
/// `nodes` must already be structurally valid.
pub fn compute_resource_stats(nodes: &[&Node], totals: &ResourceTotals, resource: &str, basis: UsageBasis) -> ResourceStats {
    let rows = node_utilizations(nodes, totals, resource, basis);

    let total: f64 = rows.iter().map(|r| r.capacity).sum();
    let used: f64 = rows.iter().map(|r| r.used).sum();

    ResourceStats {
        resource: resource.to_string(),
        kind: ResourceKind::for_resource(resource),
        total,
        used,
        percentage: utilization_percentage(used, total),
        total_display: format_resource(resource, total),
        used_display: format_resource(resource, used),
        percentiles: percentiles(&rows),
        distribution: distribution(&rows),
        nodes: rows,
    }
}
