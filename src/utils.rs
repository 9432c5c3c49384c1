use k8s_openapi::api::core::v1 as k8s_core;

pub mod logging;
pub mod quantity;

use quantity::parse_resource;

const ROLE_LABEL_PREFIX: &str = "node-role.kubernetes.io/";

pub fn pod_phase(pod: &k8s_core::Pod) -> &str {
    pod.status.as_ref().and_then(|s| s.phase.as_deref()).unwrap_or("Unknown")
}

/// Succeeded and Failed pods no longer hold resources on their node.
pub fn is_terminal(pod: &k8s_core::Pod) -> bool {
    matches!(pod_phase(pod), "Succeeded" | "Failed")
}

/// The node a pod is bound to, if any. Empty names count as unbound.
pub fn assigned_node(pod: &k8s_core::Pod) -> Option<&str> {
    pod.spec
        .as_ref()
        .and_then(|s| s.node_name.as_deref())
        .filter(|n| !n.is_empty())
}

pub fn is_node_ready(node: &k8s_core::Node) -> bool {
    node.status
        .as_ref()
        .and_then(|s| s.conditions.as_ref())
        .map(|conds| conds.iter().any(|c| c.type_ == "Ready" && c.status == "True"))
        .unwrap_or(false)
}

pub fn is_node_unschedulable(node: &k8s_core::Node) -> bool {
    node.spec.as_ref().and_then(|s| s.unschedulable).unwrap_or(false)
}

pub fn node_roles(node: &k8s_core::Node) -> Vec<String> {
    node.metadata
        .labels
        .as_ref()
        .map(|labels| {
            labels
                .keys()
                .filter_map(|k| k.strip_prefix(ROLE_LABEL_PREFIX))
                .filter(|role| !role.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Parsed capacity of one resource, `None` when the node does not advertise it.
pub fn node_capacity(node: &k8s_core::Node, resource: &str) -> Option<f64> {
    node.status
        .as_ref()
        .and_then(|s| s.capacity.as_ref())
        .and_then(|cap| cap.get(resource))
        .map(|q| parse_resource(resource, &q.0))
}
