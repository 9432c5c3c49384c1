use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{DashboardError, DashboardResult};

const DEFAULT_ACTIVITY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViewMode {
    /// Utilization bars and statistics only
    Utilization,
    /// Statistics plus per-node pod placement
    #[default]
    Placement,
}

/// How a node's consumption of a resource is derived from its pods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UsageBasis {
    /// max(requests, limits)
    #[default]
    Effective,
    /// requests, or limits when the request total is exactly zero
    RequestsFirst,
}

/// UI selection state. Owned by the host and passed into every computation;
/// nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionState {
    pub resources: Vec<String>,
    /// Empty means every namespace.
    pub namespaces: BTreeSet<String>,
    pub view_mode: ViewMode,
    pub usage_basis: UsageBasis,
    pub activity_limit: usize,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            resources: vec!["cpu".to_string(), "memory".to_string()],
            namespaces: BTreeSet::new(),
            view_mode: ViewMode::default(),
            usage_basis: UsageBasis::default(),
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
        }
    }
}

impl SelectionState {
    pub fn from_json(json: &str) -> DashboardResult<Self> {
        serde_json::from_str(json).map_err(DashboardError::InvalidSelection)
    }

    /// First selected resource; drives pod sizing in the placement view.
    pub fn primary_resource(&self) -> Option<&str> {
        self.resources.first().map(String::as_str)
    }

    pub fn includes_namespace(&self, namespace: Option<&str>) -> bool {
        if self.namespaces.is_empty() {
            return true;
        }
        namespace.map_or(false, |ns| self.namespaces.contains(ns))
    }

    pub fn toggle_resource(&mut self, resource: &str) {
        if let Some(pos) = self.resources.iter().position(|r| r == resource) {
            self.resources.remove(pos);
        } else {
            self.resources.push(resource.to_string());
        }
    }

    pub fn toggle_namespace(&mut self, namespace: &str) {
        if !self.namespaces.remove(namespace) {
            self.namespaces.insert(namespace.to_string());
        }
    }

    /// Replace the selected resources, rejecting names no node advertises.
    pub fn select_resources(&mut self, resources: &[&str], available: &[String]) -> DashboardResult<()> {
        if let Some(unknown) = resources.iter().find(|r| !available.iter().any(|a| a == *r)) {
            return Err(DashboardError::UnknownResource(unknown.to_string()));
        }
        self.resources = resources.iter().map(|r| r.to_string()).collect();
        Ok(())
    }
}
