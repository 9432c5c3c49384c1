use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;
use kube::ResourceExt;

use crate::models::ActivityEntry;
use crate::snapshot::valid_events;
use crate::state::SelectionState;

/// Event reasons surfaced in the recent-activity list.
pub const SCHEDULING_EVENT_REASONS: &[&str] = &[
    "Scheduled",
    "FailedScheduling",
    "Preempted",
    "Preempting",
    "Evicted",
    "TaintManagerEviction",
    "NotTriggerScaleUp",
    "TriggeredScaleUp",
    "FailedBinding",
];

pub fn is_scheduling_event(event: &Event) -> bool {
    event.reason.as_deref().is_some_and(|r| SCHEDULING_EVENT_REASONS.contains(&r))
}

/// Last time an event was observed, falling back through the older timestamp fields.
pub fn last_seen(event: &Event) -> Option<DateTime<Utc>> {
    event
        .last_timestamp
        .as_ref()
        .map(|t| t.0)
        .or_else(|| event.event_time.as_ref().map(|t| t.0))
        .or_else(|| event.first_timestamp.as_ref().map(|t| t.0))
        .or_else(|| event.metadata.creation_timestamp.as_ref().map(|t| t.0))
}

/// Compact age such as `45s`, `12m`, `3h` or `2d`. Future times read as `0s`.
pub fn format_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3600),
        s => format!("{}d", s / 86_400),
    }
}

fn activity_entry(event: &Event, now: DateTime<Utc>) -> ActivityEntry {
    let involved = &event.involved_object;
    let seen = last_seen(event);
    ActivityEntry {
        uid: event.uid().unwrap_or_default(),
        reason: event.reason.clone().unwrap_or_default(),
        message: event.message.clone().unwrap_or_default(),
        type_: event.type_.clone().unwrap_or_else(|| "Normal".to_string()),
        object_kind: involved.kind.clone().unwrap_or_default(),
        object_name: involved.name.clone().unwrap_or_default(),
        namespace: involved.namespace.clone(),
        count: event.count.unwrap_or(1),
        last_seen: seen,
        age: seen.map(|t| format_age(now, t)),
    }
}

/// Scheduling-related events, newest first, at most `limit` entries.
pub fn recent_activity(events: &[Event], selection: &SelectionState, limit: usize, now: DateTime<Utc>) -> Vec<ActivityEntry> {
    let mut kept: Vec<&Event> = valid_events(events)
        .into_iter()
        .filter(|e| is_scheduling_event(e))
        .filter(|e| selection.includes_namespace(e.involved_object.namespace.as_deref()))
        .collect();

    // Undated events sort last.
    kept.sort_by(|a, b| last_seen(b).cmp(&last_seen(a)));

    kept.into_iter().take(limit).map(|e| activity_entry(e, now)).collect()
}
