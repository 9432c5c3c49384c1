//! Scheduling-failure extraction and classification.
//!
//! Scheduler messages are free text. Classification is heuristic: anything the
//! extractors do not recognise degrades to a shortened tail of the message.

use k8s_openapi::api::core::v1::{Pod, PodCondition};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::{FailureReasonCount, UnscheduledPod};
use crate::snapshot::valid_pods;
use crate::state::SelectionState;
use crate::utils::logging::{log_category, Category};
use crate::utils::{assigned_node, pod_phase};

pub const UNKNOWN_REASON: &str = "Unknown reason";
const MAX_REASON_CHARS: usize = 100;

struct Patterns {
    availability_prefix: Regex,
    pvc_not_found: Regex,
    pvc_unbound: Regex,
    insufficient: Regex,
    taint: Regex,
    node_affinity: Regex,
    pod_affinity: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        availability_prefix: Regex::new(r"^\s*\d+/\d+ nodes are available:\s*").expect("valid prefix pattern"),
        pvc_not_found: Regex::new(r#"(?i)persistentvolumeclaim "([^"]+)" not found"#).expect("valid pvc pattern"),
        pvc_unbound: Regex::new(r"(?i)unbound immediate persistentvolumeclaims").expect("valid pvc pattern"),
        insufficient: Regex::new(r"\d+ Insufficient ([A-Za-z0-9./_-]+)").expect("valid insufficient pattern"),
        taint: Regex::new(r"had (?:untolerated )?taints?\s*\{([^}]*)\}").expect("valid taint pattern"),
        node_affinity: Regex::new(r"(?i)didn't match (?:Pod's )?node (?:affinity|selector)").expect("valid affinity pattern"),
        pod_affinity: Regex::new(r"(?i)didn't (?:match|satisfy) (?:pod|existing pods) (?:anti-)?affinity").expect("valid affinity pattern"),
    })
}

/// The message (or reason) of a `PodScheduled=False` condition.
pub fn scheduling_failure(conditions: &[PodCondition]) -> Option<String> {
    let condition = conditions.iter().find(|c| c.type_ == "PodScheduled" && c.status == "False")?;
    condition
        .message
        .clone()
        .filter(|m| !m.is_empty())
        .or_else(|| condition.reason.clone().filter(|r| !r.is_empty()))
}

fn push_unique(labels: &mut Vec<String>, label: String) {
    if !labels.contains(&label) {
        labels.push(label);
    }
}

fn tail_after_colon(text: &str) -> String {
    let tail = text.rsplit(':').next().unwrap_or(text);
    tail.trim().trim_end_matches('.').trim().chars().take(MAX_REASON_CHARS).collect()
}

/// Shorten a scheduler message to a stable key for grouping.
pub fn classify_failure(message: &str) -> String {
    let p = patterns();

    let stripped = p.availability_prefix.replace(message, "");
    let body = match stripped.find("preemption:") {
        Some(idx) => &stripped[..idx],
        None => &stripped[..],
    };
    let body = body.trim().trim_end_matches('.').trim();

    let mut labels: Vec<String> = Vec::new();

    if let Some(caps) = p.pvc_not_found.captures(body) {
        push_unique(&mut labels, format!("PVC \"{}\" not found", &caps[1]));
    } else if p.pvc_unbound.is_match(body) {
        push_unique(&mut labels, "Unbound PersistentVolumeClaims".to_string());
    }

    for caps in p.insufficient.captures_iter(body) {
        let resource = caps[1].trim_end_matches('.');
        push_unique(&mut labels, format!("Insufficient {}", resource));
    }

    for caps in p.taint.captures_iter(body) {
        push_unique(&mut labels, format!("Untolerated taint {{{}}}", caps[1].trim()));
    }

    if p.node_affinity.is_match(body) {
        push_unique(&mut labels, "Node affinity/selector mismatch".to_string());
    }
    if p.pod_affinity.is_match(body) {
        push_unique(&mut labels, "Pod affinity/anti-affinity mismatch".to_string());
    }

    if !labels.is_empty() {
        return labels.join("; ");
    }

    let fallback = tail_after_colon(body);
    if fallback.is_empty() {
        log_category(
            Category::Scheduling,
            log::Level::Debug,
            &format!("unclassified scheduling message: {}", message),
        );
        UNKNOWN_REASON.to_string()
    } else {
        fallback
    }
}

/// Pending, unbound pods the scheduler has rejected, ordered by namespace and name.
pub fn unscheduled_pods(pods: &[Pod], selection: &SelectionState) -> Vec<UnscheduledPod> {
    let mut result: Vec<UnscheduledPod> = valid_pods(pods)
        .into_iter()
        .filter(|pod| pod_phase(pod) == "Pending" && assigned_node(pod).is_none())
        .filter(|pod| selection.includes_namespace(pod.metadata.namespace.as_deref()))
        .filter_map(|pod| {
            let conditions = pod.status.as_ref()?.conditions.as_deref().unwrap_or(&[]);
            let message = scheduling_failure(conditions)?;
            let since = conditions
                .iter()
                .find(|c| c.type_ == "PodScheduled")
                .and_then(|c| c.last_transition_time.as_ref())
                .map(|t| t.0);

            Some(UnscheduledPod {
                name: pod.metadata.name.clone().unwrap_or_default(),
                namespace: pod.metadata.namespace.clone().unwrap_or_default(),
                uid: pod.metadata.uid.clone().unwrap_or_default(),
                reason_key: classify_failure(&message),
                message,
                since,
            })
        })
        .collect();

    result.sort_by(|a, b| a.namespace.cmp(&b.namespace).then_with(|| a.name.cmp(&b.name)));
    result
}

/// Count unscheduled pods per classification key, most frequent first.
pub fn failure_reason_histogram(unscheduled: &[UnscheduledPod]) -> Vec<FailureReasonCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for pod in unscheduled {
        *counts.entry(pod.reason_key.as_str()).or_insert(0) += 1;
    }

    let mut histogram: Vec<FailureReasonCount> = counts
        .into_iter()
        .map(|(reason, count)| FailureReasonCount { reason: reason.to_string(), count })
        .collect();
    histogram.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.reason.cmp(&b.reason)));
    histogram
}
