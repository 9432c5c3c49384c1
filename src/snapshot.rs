//! Cluster object snapshots and their structural validation.
//!
//! Snapshots are whole-list replacements delivered by the host's watch
//! collaborator. Entries missing required fields are dropped silently (debug log
//! only) and never reach any derived structure.

use k8s_openapi::api::core::v1::{Event, Namespace, Node, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{DashboardError, DashboardResult};
use crate::utils::logging::{log_category, log_dropped, Category};

/// The latest full lists of every object kind the dashboard reads.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    pub nodes: Vec<Node>,
    pub pods: Vec<Pod>,
    pub namespaces: Vec<Namespace>,
    pub events: Vec<Event>,
    /// Upstream fetch failure reported by the collaborator
    pub error: Option<String>,
}

fn has_identity(meta: &ObjectMeta) -> bool {
    let named = meta.name.as_deref().is_some_and(|n| !n.is_empty());
    let identified = meta.uid.as_deref().is_some_and(|u| !u.is_empty());
    named && identified
}

pub fn is_valid_node(node: &Node) -> bool {
    has_identity(&node.metadata) && node.status.as_ref().and_then(|s| s.capacity.as_ref()).is_some()
}

pub fn is_valid_pod(pod: &Pod) -> bool {
    has_identity(&pod.metadata)
        && pod.metadata.namespace.as_deref().is_some_and(|ns| !ns.is_empty())
        && pod.spec.is_some()
        && pod.status.is_some()
}

pub fn is_valid_namespace(namespace: &Namespace) -> bool {
    has_identity(&namespace.metadata)
}

pub fn is_valid_event(event: &Event) -> bool {
    has_identity(&event.metadata) && event.reason.as_deref().is_some_and(|r| !r.is_empty())
}

fn keep_valid<'a, T>(kind: &str, items: &'a [T], valid: fn(&T) -> bool) -> Vec<&'a T> {
    let kept: Vec<&T> = items.iter().filter(|item| valid(*item)).collect();
    log_dropped(kind, items.len() - kept.len(), items.len());
    kept
}

pub fn valid_nodes(nodes: &[Node]) -> Vec<&Node> {
    keep_valid("node", nodes, is_valid_node)
}

pub fn valid_pods(pods: &[Pod]) -> Vec<&Pod> {
    keep_valid("pod", pods, is_valid_pod)
}

pub fn valid_namespaces(namespaces: &[Namespace]) -> Vec<&Namespace> {
    keep_valid("namespace", namespaces, is_valid_namespace)
}

pub fn valid_events(events: &[Event]) -> Vec<&Event> {
    keep_valid("event", events, is_valid_event)
}

#[derive(Deserialize)]
struct ObjectList {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

/// Decode a Kubernetes list document (`{"items": [...]}`).
///
/// A malformed document is an error; an item that does not decode as `K` is
/// dropped like any other structurally invalid entry.
pub fn decode_list<K: DeserializeOwned>(json: &str) -> DashboardResult<Vec<K>> {
    let list: ObjectList = serde_json::from_str(json).map_err(DashboardError::InvalidSnapshot)?;
    let total = list.items.len();

    let decoded: Vec<K> = list
        .items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<K>(item) {
            Ok(obj) => Some(obj),
            Err(e) => {
                log_category(Category::Snapshot, log::Level::Debug, &format!("skipping undecodable item: {}", e));
                None
            }
        })
        .collect();

    log_dropped("list", total - decoded.len(), total);
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_node_validation() {
        let good: Node = serde_json::from_value(json!({
            "metadata": {"name": "a", "uid": "1"},
            "status": {"capacity": {"cpu": "4"}}
        }))
        .unwrap();
        let no_uid: Node = serde_json::from_value(json!({
            "metadata": {"name": "b"},
            "status": {"capacity": {"cpu": "4"}}
        }))
        .unwrap();
        let no_capacity: Node = serde_json::from_value(json!({
            "metadata": {"name": "c", "uid": "3"},
            "status": {}
        }))
        .unwrap();

        let nodes = vec![good, no_uid, no_capacity];
        let kept = valid_nodes(&nodes);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].metadata.name.as_deref(), Some("a"));
    }

    #[test]
    fn test_pod_validation() {
        let missing_status: Pod = serde_json::from_value(json!({
            "metadata": {"name": "p", "namespace": "default", "uid": "1"},
            "spec": {"containers": []}
        }))
        .unwrap();
        let missing_namespace: Pod = serde_json::from_value(json!({
            "metadata": {"name": "p", "uid": "1"},
            "spec": {"containers": []},
            "status": {}
        }))
        .unwrap();
        assert!(!is_valid_pod(&missing_status));
        assert!(!is_valid_pod(&missing_namespace));
    }

    #[test]
    fn test_decode_list_drops_undecodable_items() {
        let doc = json!({
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                {"metadata": {"name": "ok", "namespace": "default", "uid": "1"}, "spec": {"containers": [{"name": "app"}]}, "status": {}},
                {"metadata": {"name": "broken"}, "spec": {"containers": "not-a-list"}}
            ]
        });

        let pods: Vec<Pod> = decode_list(&doc.to_string()).unwrap();
        assert_eq!(pods.len(), 1);
        assert_eq!(pods[0].metadata.name.as_deref(), Some("ok"));
    }

    #[test]
    fn test_decode_list_rejects_malformed_document() {
        let err = decode_list::<Node>("not json").unwrap_err();
        assert!(matches!(err, DashboardError::InvalidSnapshot(_)));

        let empty: Vec<Node> = decode_list("{}").unwrap();
        assert!(empty.is_empty());
    }
}
