use log::Level;

/// Log categories, one `log` target each so hosts can filter per area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Snapshot,
    Aggregate,
    Scheduling,
    Feed,
    Host,
}

impl Category {
    pub fn target(self) -> &'static str {
        match self {
            Category::Snapshot => "nodescope::snapshot",
            Category::Aggregate => "nodescope::aggregate",
            Category::Scheduling => "nodescope::scheduling",
            Category::Feed => "nodescope::feed",
            Category::Host => "nodescope::host",
        }
    }

    fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "snapshot" => Category::Snapshot,
            "aggregate" => Category::Aggregate,
            "scheduling" => Category::Scheduling,
            "feed" => Category::Feed,
            _ => Category::Host,
        }
    }
}

/// Write a log entry under a category.
pub fn log_category(category: Category, level: Level, message: &str) {
    log::log!(target: category.target(), level, "{}", message);
}

/// Record that objects were dropped by structural validation.
pub fn log_dropped(kind: &str, dropped: usize, total: usize) {
    if dropped == 0 {
        return;
    }
    log_category(
        Category::Snapshot,
        Level::Debug,
        &format!("dropped {}/{} invalid {} entries", dropped, total, kind),
    );
}

fn parse_level(level: &str) -> Level {
    match level.to_ascii_uppercase().as_str() {
        "ERROR" => Level::Error,
        "WARN" | "WARNING" => Level::Warn,
        "DEBUG" => Level::Debug,
        "TRACE" => Level::Trace,
        _ => Level::Info,
    }
}

/// Relay a log line emitted by the rendering host into the same log stream.
/// Returns the formatted line so callers can mirror it elsewhere.
pub fn relay_host_message(level: &str, category: &str, message: &str, data: Option<&serde_json::Value>) -> String {
    let msg = if let Some(d) = data {
        format!("{} | {}", message, d)
    } else {
        message.to_string()
    };
    log_category(Category::from_name(category), parse_level(level), &msg);
    msg
}
