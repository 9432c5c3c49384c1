use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Namespace, Node};
use kube::ResourceExt;
use std::collections::BTreeSet;

use crate::commands::aggregate::aggregate_node_usage;
use crate::commands::events::recent_activity;
use crate::commands::placement::node_placements;
use crate::commands::scheduling::{failure_reason_histogram, unscheduled_pods};
use crate::commands::stats::compute_resource_stats;
use crate::models::{DashboardView, InventoryCounts};
use crate::snapshot::{valid_namespaces, valid_nodes, valid_pods, ClusterSnapshot};
use crate::state::{SelectionState, ViewMode};
use crate::utils::logging::{log_category, Category};

const LEADING_RESOURCES: [&str; 3] = ["cpu", "memory", "pods"];

/// Every resource name any node advertises: cpu, memory and pods first, the rest alphabetical.
pub fn available_resources(nodes: &[&Node]) -> Vec<String> {
    let names: BTreeSet<&str> = nodes
        .iter()
        .filter_map(|n| n.status.as_ref()?.capacity.as_ref())
        .flat_map(|cap| cap.keys().map(String::as_str))
        .collect();

    let mut ordered: Vec<String> = LEADING_RESOURCES
        .iter()
        .filter(|r| names.contains(*r))
        .map(|r| r.to_string())
        .collect();
    ordered.extend(names.iter().filter(|r| !LEADING_RESOURCES.contains(*r)).map(|r| r.to_string()));
    ordered
}

pub fn namespace_options(namespaces: &[&Namespace]) -> Vec<String> {
    let names: BTreeSet<String> = namespaces.iter().map(|ns| ns.name_any()).collect();
    names.into_iter().collect()
}

/// Everything the dashboard renders for one snapshot and selection.
pub fn build_dashboard(snapshot: &ClusterSnapshot, selection: &SelectionState, now: DateTime<Utc>) -> DashboardView {
    if let Some(detail) = &snapshot.error {
        log_category(Category::Aggregate, log::Level::Warn, &format!("snapshot unavailable: {}", detail));
        return DashboardView::failed(format!("Error loading cluster data: {}", detail), now);
    }

    let nodes = valid_nodes(&snapshot.nodes);
    let namespaces = valid_namespaces(&snapshot.namespaces);
    let pod_count = valid_pods(&snapshot.pods).len();

    let totals = aggregate_node_usage(&snapshot.pods);

    let resources = selection
        .resources
        .iter()
        .map(|r| compute_resource_stats(&nodes, &totals, r, selection.usage_basis))
        .collect();

    let placements = match selection.view_mode {
        ViewMode::Placement => node_placements(&nodes, &snapshot.pods, &totals, selection),
        ViewMode::Utilization => Vec::new(),
    };

    let unscheduled = unscheduled_pods(&snapshot.pods, selection);
    let failure_reasons = failure_reason_histogram(&unscheduled);
    let activity = recent_activity(&snapshot.events, selection, selection.activity_limit, now);

    let inventory = InventoryCounts {
        nodes: nodes.len(),
        dropped_nodes: snapshot.nodes.len() - nodes.len(),
        pods: pod_count,
        dropped_pods: snapshot.pods.len() - pod_count,
        namespaces: namespaces.len(),
    };

    log_category(
        Category::Aggregate,
        log::Level::Debug,
        &format!(
            "dashboard built: {} nodes, {} pods, {} unscheduled, {} activity entries",
            inventory.nodes,
            inventory.pods,
            unscheduled.len(),
            activity.len()
        ),
    );

    DashboardView {
        error: None,
        generated_at: now,
        inventory,
        namespaces: namespace_options(&namespaces),
        available_resources: available_resources(&nodes),
        resources,
        placements,
        unscheduled,
        failure_reasons,
        activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use k8s_openapi::api::core::v1::{Event, Pod};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn node(name: &str, capacity: serde_json::Value) -> Node {
        serde_json::from_value(json!({
            "metadata": {"name": name, "uid": format!("{}-uid", name)},
            "status": {"capacity": capacity, "conditions": [{"type": "Ready", "status": "True"}]}
        }))
        .unwrap()
    }

    fn namespace(name: &str) -> Namespace {
        serde_json::from_value(json!({"metadata": {"name": name, "uid": format!("{}-uid", name)}})).unwrap()
    }

    fn two_node_snapshot() -> ClusterSnapshot {
        let web: Pod = serde_json::from_value(json!({
            "metadata": {"name": "web", "namespace": "default", "uid": "web-uid"},
            "spec": {"nodeName": "node-a", "containers": [
                {"name": "app", "resources": {"requests": {"cpu": "2000m"}, "limits": {"cpu": "3"}}}
            ]},
            "status": {"phase": "Running"}
        }))
        .unwrap();
        let stuck: Pod = serde_json::from_value(json!({
            "metadata": {"name": "stuck", "namespace": "batch", "uid": "stuck-uid"},
            "spec": {"containers": [{"name": "app", "resources": {"requests": {"cpu": "16"}}}]},
            "status": {"phase": "Pending", "conditions": [{
                "type": "PodScheduled", "status": "False", "reason": "Unschedulable",
                "message": "0/2 nodes are available: 2 Insufficient cpu. preemption: 0/2 nodes are available: 2 No preemption victims found for incoming pod."
            }]}
        }))
        .unwrap();
        let ghost: Pod = serde_json::from_value(json!({
            "metadata": {"name": "ghost", "namespace": "default"},
            "spec": {"nodeName": "node-b", "containers": [{"name": "c", "resources": {"requests": {"cpu": "4"}}}]},
            "status": {"phase": "Running"}
        }))
        .unwrap();
        let scheduled: Event = serde_json::from_value(json!({
            "metadata": {"name": "web.1", "namespace": "default", "uid": "ev-1"},
            "reason": "Scheduled",
            "message": "Successfully assigned default/web to node-a",
            "involvedObject": {"kind": "Pod", "name": "web", "namespace": "default"},
            "lastTimestamp": "2026-10-18T11:58:00Z"
        }))
        .unwrap();

        ClusterSnapshot {
            nodes: vec![
                node("node-b", json!({"cpu": "4", "memory": "8Gi", "pods": "110"})),
                node("node-a", json!({"cpu": "4", "memory": "8Gi", "pods": "110"})),
            ],
            pods: vec![web, stuck, ghost],
            namespaces: vec![namespace("default"), namespace("batch")],
            events: vec![scheduled],
            error: None,
        }
    }

    #[test]
    fn test_two_node_dashboard() {
        let view = build_dashboard(&two_node_snapshot(), &SelectionState::default(), now());

        assert!(view.error.is_none());
        assert_eq!(view.namespaces, vec!["batch", "default"]);
        assert_eq!(view.available_resources, vec!["cpu", "memory", "pods"]);
        assert_eq!(
            view.inventory,
            InventoryCounts { nodes: 2, dropped_nodes: 0, pods: 2, dropped_pods: 1, namespaces: 2 }
        );

        let cpu = &view.resources[0];
        assert_eq!(cpu.resource, "cpu");
        assert_eq!(cpu.total, 8.0);
        assert_eq!(cpu.used, 3.0);
        assert_eq!(cpu.percentage, 37.5);
        assert_eq!(cpu.nodes[0].node, "node-a");
        assert_eq!(cpu.nodes[0].percentage, 75.0);
        assert_eq!(cpu.nodes[1].percentage, 0.0);

        assert_eq!(view.placements.len(), 2);
        assert_eq!(view.placements[0].name, "node-a");
        assert_eq!(view.placements[0].pods[0].name, "web");
        assert!(view.placements[1].pods.is_empty());

        assert_eq!(view.unscheduled.len(), 1);
        assert_eq!(view.unscheduled[0].reason_key, "Insufficient cpu");
        assert_eq!(view.failure_reasons[0].count, 1);

        assert_eq!(view.activity.len(), 1);
        assert_eq!(view.activity[0].age.as_deref(), Some("2m"));
    }

    #[test]
    fn test_utilization_mode_skips_placements() {
        let mut selection = SelectionState::default();
        selection.view_mode = ViewMode::Utilization;
        let view = build_dashboard(&two_node_snapshot(), &selection, now());

        assert!(view.placements.is_empty());
        assert_eq!(view.resources.len(), 2);
    }

    #[test]
    fn test_fetch_error_yields_inline_message() {
        let mut snapshot = two_node_snapshot();
        snapshot.error = Some("connection refused".to_string());
        let view = build_dashboard(&snapshot, &SelectionState::default(), now());

        assert_eq!(view.error.as_deref(), Some("Error loading cluster data: connection refused"));
        assert!(view.resources.is_empty());
        assert!(view.placements.is_empty());
        assert_eq!(view.inventory, InventoryCounts::default());
    }

    #[test]
    fn test_available_resources_order() {
        let nodes = vec![
            node("a", json!({"memory": "1Gi", "nvidia.com/gpu": "1", "cpu": "2"})),
            node("b", json!({"ephemeral-storage": "10Gi", "pods": "110", "cpu": "2"})),
        ];
        let refs: Vec<&Node> = nodes.iter().collect();
        assert_eq!(
            available_resources(&refs),
            vec!["cpu", "memory", "pods", "ephemeral-storage", "nvidia.com/gpu"]
        );
    }

    #[test]
    fn test_serialized_view_uses_camel_case() {
        let view = build_dashboard(&two_node_snapshot(), &SelectionState::default(), now());
        let value = serde_json::to_value(&view).unwrap();

        assert!(value.get("availableResources").is_some());
        assert!(value.get("failureReasons").is_some());
        assert!(value.get("error").is_none());
        assert_eq!(value["resources"][0]["totalDisplay"]["unit"], "cores");
    }
}
