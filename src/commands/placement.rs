use k8s_openapi::api::core::v1::{Node, Pod};
use kube::ResourceExt;
use std::collections::BTreeMap;

use crate::commands::aggregate::{PodResources, ResourceTotals};
use crate::commands::stats::utilization_percentage;
use crate::models::{NodePlacement, NodeResourceSummary, PodVisual};
use crate::snapshot::valid_pods;
use crate::state::SelectionState;
use crate::utils::quantity::format_resource;
use crate::utils::{assigned_node, is_node_ready, is_node_unschedulable, is_terminal, node_capacity, node_roles, pod_phase};

fn resource_summary(node: &Node, totals: &ResourceTotals, resource: &str, selection: &SelectionState) -> Option<NodeResourceSummary> {
    let capacity = node_capacity(node, resource)?;
    let used = totals.node_usage(resource, &node.name_any(), selection.usage_basis);
    Some(NodeResourceSummary {
        resource: resource.to_string(),
        capacity,
        used,
        percentage: utilization_percentage(used, capacity),
        capacity_display: format_resource(resource, capacity),
        used_display: format_resource(resource, used),
    })
}

fn pod_visual(pod: &Pod, primary: Option<&str>, capacity: Option<f64>) -> PodVisual {
    let effective = primary.map(|r| PodResources::from_pod(pod).effective(r)).unwrap_or(0.0);
    let share = match capacity {
        Some(cap) if cap > 0.0 => (effective / cap).clamp(0.0, 1.0),
        _ => 0.0,
    };
    PodVisual {
        name: pod.name_any(),
        namespace: pod.namespace().unwrap_or_default(),
        uid: pod.uid().unwrap_or_default(),
        phase: pod_phase(pod).to_string(),
        effective,
        share,
    }
}

/// Per-node layout of bound pods, nodes ordered by name.
///
/// Pods are sized by the primary (first selected) resource and listed largest
/// first. The namespace filter hides pods but never hides nodes.
pub fn node_placements(nodes: &[&Node], pods: &[Pod], totals: &ResourceTotals, selection: &SelectionState) -> Vec<NodePlacement> {
    let primary = selection.primary_resource();

    let mut by_node: BTreeMap<&str, Vec<&Pod>> = BTreeMap::new();
    for pod in valid_pods(pods) {
        if is_terminal(pod) || !selection.includes_namespace(pod.metadata.namespace.as_deref()) {
            continue;
        }
        if let Some(node) = assigned_node(pod) {
            by_node.entry(node).or_default().push(pod);
        }
    }

    let mut placements: Vec<NodePlacement> = nodes
        .iter()
        .map(|node| {
            let name = node.name_any();
            let capacity = primary.and_then(|r| node_capacity(node, r));

            let mut visuals: Vec<PodVisual> = by_node
                .get(name.as_str())
                .map(|pods| pods.iter().map(|pod| pod_visual(pod, primary, capacity)).collect())
                .unwrap_or_default();
            visuals.sort_by(|a, b| {
                b.effective
                    .total_cmp(&a.effective)
                    .then_with(|| a.namespace.cmp(&b.namespace))
                    .then_with(|| a.name.cmp(&b.name))
            });

            NodePlacement {
                uid: node.uid().unwrap_or_default(),
                roles: node_roles(node),
                ready: is_node_ready(node),
                unschedulable: is_node_unschedulable(node),
                resources: selection
                    .resources
                    .iter()
                    .filter_map(|r| resource_summary(node, totals, r, selection))
                    .collect(),
                pods: visuals,
                name,
            }
        })
        .collect();

    placements.sort_by(|a, b| a.name.cmp(&b.name));
    placements
}
