//! Request/limit aggregation per pod and per node.

use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::snapshot::valid_pods;
use crate::state::UsageBasis;
use crate::utils::quantity::parse_resource;
use crate::utils::{assigned_node, is_terminal};

/// Accumulated requests and limits of one resource, keyed by node name.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct ResourceUsage {
    pub requests: BTreeMap<String, f64>,
    pub limits: BTreeMap<String, f64>,
}

/// Resource name -> per-node requests/limits. Rebuilt from scratch for every snapshot.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct ResourceTotals {
    resources: BTreeMap<String, ResourceUsage>,
}

impl ResourceTotals {
    pub fn get(&self, resource: &str) -> Option<&ResourceUsage> {
        self.resources.get(resource)
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn requests(&self, resource: &str, node: &str) -> f64 {
        self.get(resource).and_then(|u| u.requests.get(node)).copied().unwrap_or(0.0)
    }

    pub fn limits(&self, resource: &str, node: &str) -> f64 {
        self.get(resource).and_then(|u| u.limits.get(node)).copied().unwrap_or(0.0)
    }

    pub fn node_effective(&self, resource: &str, node: &str) -> f64 {
        self.requests(resource, node).max(self.limits(resource, node))
    }

    /// Requests, or limits when the request total is exactly zero.
    pub fn node_requests_first(&self, resource: &str, node: &str) -> f64 {
        let requests = self.requests(resource, node);
        if requests == 0.0 {
            self.limits(resource, node)
        } else {
            requests
        }
    }

    pub fn node_usage(&self, resource: &str, node: &str, basis: UsageBasis) -> f64 {
        match basis {
            UsageBasis::Effective => self.node_effective(resource, node),
            UsageBasis::RequestsFirst => self.node_requests_first(resource, node),
        }
    }

    fn add_requests(&mut self, resource: &str, node: &str, value: f64) {
        let usage = self.resources.entry(resource.to_string()).or_default();
        *usage.requests.entry(node.to_string()).or_insert(0.0) += value;
    }

    fn add_limits(&mut self, resource: &str, node: &str, value: f64) {
        let usage = self.resources.entry(resource.to_string()).or_default();
        *usage.limits.entry(node.to_string()).or_insert(0.0) += value;
    }
}

/// Requests and limits summed over one pod's own containers.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct PodResources {
    pub requests: BTreeMap<String, f64>,
    pub limits: BTreeMap<String, f64>,
}

fn accumulate(into: &mut BTreeMap<String, f64>, quantities: Option<&BTreeMap<String, Quantity>>) {
    for (resource, quantity) in quantities.into_iter().flatten() {
        *into.entry(resource.clone()).or_insert(0.0) += parse_resource(resource, &quantity.0);
    }
}

impl PodResources {
    pub fn from_pod(pod: &Pod) -> Self {
        let mut totals = PodResources::default();
        if let Some(spec) = &pod.spec {
            for container in &spec.containers {
                let resources = container.resources.as_ref();
                accumulate(&mut totals.requests, resources.and_then(|r| r.requests.as_ref()));
                accumulate(&mut totals.limits, resources.and_then(|r| r.limits.as_ref()));
            }
        }
        totals
    }

    /// max(requests, limits); sizes the pod in placement views.
    pub fn effective(&self, resource: &str) -> f64 {
        let requests = self.requests.get(resource).copied().unwrap_or(0.0);
        let limits = self.limits.get(resource).copied().unwrap_or(0.0);
        requests.max(limits)
    }
}

/// Sum requests and limits of every bound, non-terminal, valid pod into its node.
pub fn aggregate_node_usage(pods: &[Pod]) -> ResourceTotals {
    let mut totals = ResourceTotals::default();

    for pod in valid_pods(pods) {
        if is_terminal(pod) {
            continue;
        }
        let Some(node) = assigned_node(pod) else {
            continue;
        };

        let pod_totals = PodResources::from_pod(pod);
        for (resource, value) in &pod_totals.requests {
            totals.add_requests(resource, node, *value);
        }
        for (resource, value) in &pod_totals.limits {
            totals.add_limits(resource, node, *value);
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod(name: &str, node: &str, phase: &str, containers: serde_json::Value) -> Pod {
        serde_json::from_value(json!({
            "metadata": {"name": name, "namespace": "default", "uid": format!("{}-uid", name)},
            "spec": {"nodeName": node, "containers": containers},
            "status": {"phase": phase}
        }))
        .unwrap()
    }

    #[test]
    fn test_pod_effective_is_max_of_sums() {
        let p = pod(
            "web",
            "node-a",
            "Running",
            json!([
                {"name": "app", "resources": {"requests": {"cpu": "500m"}, "limits": {"cpu": "1"}}},
                {"name": "sidecar", "resources": {"requests": {"cpu": "1500m", "memory": "256Mi"}}}
            ]),
        );
        let totals = PodResources::from_pod(&p);

        assert_eq!(totals.requests["cpu"], 2.0);
        assert_eq!(totals.limits["cpu"], 1.0);
        assert_eq!(totals.effective("cpu"), 2.0);
        assert_eq!(totals.effective("memory"), 256.0 * 1024.0 * 1024.0);
        assert_eq!(totals.effective("nvidia.com/gpu"), 0.0);
    }

    #[test]
    fn test_aggregate_by_node() {
        let pods = vec![
            pod("a", "node-a", "Running", json!([{"name": "c", "resources": {"requests": {"cpu": "2000m"}, "limits": {"cpu": "3"}}}])),
            pod("b", "node-a", "Pending", json!([{"name": "c", "resources": {"requests": {"cpu": "250m", "pods": "1"}}}])),
            pod("c", "node-b", "Running", json!([{"name": "c", "resources": {"limits": {"memory": "1Gi"}}}])),
        ];
        let totals = aggregate_node_usage(&pods);

        assert_eq!(totals.requests("cpu", "node-a"), 2.25);
        assert_eq!(totals.limits("cpu", "node-a"), 3.0);
        assert_eq!(totals.node_effective("cpu", "node-a"), 3.0);
        assert_eq!(totals.requests("pods", "node-a"), 1.0);
        assert_eq!(totals.node_effective("memory", "node-b"), 1073741824.0);
        assert_eq!(totals.resource_names().collect::<Vec<_>>(), vec!["cpu", "memory", "pods"]);
    }

    #[test]
    fn test_terminal_and_unbound_pods_are_excluded() {
        let pods = vec![
            pod("done", "node-a", "Succeeded", json!([{"name": "c", "resources": {"requests": {"cpu": "1"}}}])),
            pod("crashed", "node-a", "Failed", json!([{"name": "c", "resources": {"requests": {"cpu": "1"}}}])),
            pod("pending", "", "Pending", json!([{"name": "c", "resources": {"requests": {"cpu": "1"}}}])),
        ];
        let totals = aggregate_node_usage(&pods);
        assert_eq!(totals, ResourceTotals::default());
    }

    #[test]
    fn test_invalid_pod_is_excluded() {
        let no_uid: Pod = serde_json::from_value(json!({
            "metadata": {"name": "ghost", "namespace": "default"},
            "spec": {"nodeName": "node-a", "containers": [{"name": "c", "resources": {"requests": {"cpu": "1"}}}]},
            "status": {"phase": "Running"}
        }))
        .unwrap();
        let totals = aggregate_node_usage(&[no_uid]);
        assert_eq!(totals.requests("cpu", "node-a"), 0.0);
    }

    #[test]
    fn test_requests_first_falls_back_to_limits() {
        let pods = vec![
            pod("a", "node-a", "Running", json!([{"name": "c", "resources": {"requests": {"cpu": "1"}, "limits": {"cpu": "2"}}}])),
            pod("b", "node-b", "Running", json!([{"name": "c", "resources": {"limits": {"cpu": "2"}}}])),
            pod("c", "node-c", "Running", json!([{"name": "c", "resources": {"requests": {"cpu": "0"}, "limits": {"cpu": "500m"}}}])),
        ];
        let totals = aggregate_node_usage(&pods);

        assert_eq!(totals.node_usage("cpu", "node-a", UsageBasis::RequestsFirst), 1.0);
        assert_eq!(totals.node_usage("cpu", "node-b", UsageBasis::RequestsFirst), 2.0);
        // An explicit zero request is indistinguishable from no request.
        assert_eq!(totals.node_usage("cpu", "node-c", UsageBasis::RequestsFirst), 0.5);
        assert_eq!(totals.node_usage("cpu", "node-a", UsageBasis::Effective), 2.0);
    }
}
