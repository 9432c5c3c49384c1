//! Resource quantity parsing and human formatting.
//!
//! Quantities arrive as Kubernetes quantity strings ("500m", "2Gi", "4").
//! Every parser here is total: malformed or empty input yields 0, never an error.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use super::logging::{log_category, Category};

const MEMORY_SUFFIXES: [&str; 6] = ["Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];
const MEMORY_UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Which parser a resource name is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Cpu,
    Memory,
    Generic,
}

impl ResourceKind {
    pub fn for_resource(resource: &str) -> Self {
        match resource {
            "cpu" => ResourceKind::Cpu,
            "memory" => ResourceKind::Memory,
            _ => ResourceKind::Generic,
        }
    }
}

fn cpu_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+(\.\d+)?)(m)?$").expect("valid cpu pattern"))
}

fn memory_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+(\.\d+)?)([KMGTPE]i)?$").expect("valid memory pattern"))
}

fn plain_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+)?$").expect("valid number pattern"))
}

fn leading_number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("valid leading number pattern")
    })
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Lenient fallback: the longest numeric prefix, or 0 when there is none.
/// Sign is kept, so "-2" comes back as -2.
fn leading_number(value: &str) -> f64 {
    let number = leading_number_pattern()
        .find(value)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(finite_or_zero)
        .unwrap_or(0.0);
    if number < 0.0 {
        log_category(Category::Snapshot, log::Level::Warn, &format!("negative quantity {:?} passed through", value));
    }
    number
}

/// Parse a CPU quantity into cores. "500m" -> 0.5, "2" -> 2.0.
pub fn parse_cpu(value: &str) -> f64 {
    let value = value.trim();
    if value.is_empty() {
        return 0.0;
    }

    match cpu_pattern().captures(value) {
        Some(caps) => {
            let number = caps[1].parse::<f64>().unwrap_or(0.0);
            let cores = if caps.get(3).is_some() { number / 1000.0 } else { number };
            finite_or_zero(cores)
        }
        None => leading_number(value),
    }
}

/// Parse a memory quantity into bytes. "1Gi" -> 1073741824, "512" -> 512.
pub fn parse_memory(value: &str) -> f64 {
    let value = value.trim();
    if value.is_empty() {
        return 0.0;
    }

    match memory_pattern().captures(value) {
        Some(caps) => {
            let number = caps[1].parse::<f64>().unwrap_or(0.0);
            let exponent = caps
                .get(3)
                .and_then(|suffix| MEMORY_SUFFIXES.iter().position(|s| *s == suffix.as_str()))
                .map(|idx| idx as i32 + 1)
                .unwrap_or(0);
            finite_or_zero(number * 1024f64.powi(exponent))
        }
        None => leading_number(value),
    }
}

/// Parse an extended resource (pods, ephemeral-storage, nvidia.com/gpu, ...).
/// Plain numbers are dimensionless counts; anything else goes through the byte parser.
pub fn parse_generic(value: &str) -> f64 {
    let value = value.trim();
    if plain_number_pattern().is_match(value) {
        return finite_or_zero(value.parse::<f64>().unwrap_or(0.0));
    }
    parse_memory(value)
}

pub fn parse_quantity(value: &str, kind: ResourceKind) -> f64 {
    match kind {
        ResourceKind::Cpu => parse_cpu(value),
        ResourceKind::Memory => parse_memory(value),
        ResourceKind::Generic => parse_generic(value),
    }
}

/// Parse a quantity using the parser selected by the resource name.
pub fn parse_resource(resource: &str, value: &str) -> f64 {
    parse_quantity(value, ResourceKind::for_resource(resource))
}

// ============================================================================
// Formatting
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedQuantity {
    pub value: String,
    pub unit: String,
}

impl FormattedQuantity {
    pub fn new(value: impl Into<String>, unit: impl Into<String>) -> Self {
        Self { value: value.into(), unit: unit.into() }
    }
}

impl fmt::Display for FormattedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit.as_str() {
            "" => write!(f, "{}", self.value),
            "m" => write!(f, "{}m", self.value),
            unit => write!(f, "{} {}", self.value, unit),
        }
    }
}

/// Scale a byte count through B, KiB, MiB, GiB, TiB. Always two decimals,
/// except zero which is ("0", "B").
pub fn format_memory(bytes: f64) -> FormattedQuantity {
    if bytes == 0.0 {
        return FormattedQuantity::new("0", "B");
    }

    let mut value = bytes;
    let mut unit_index = 0;
    while value >= 1024.0 && unit_index < MEMORY_UNITS.len() - 1 {
        value /= 1024.0;
        unit_index += 1;
    }

    FormattedQuantity::new(format!("{:.2}", value), MEMORY_UNITS[unit_index])
}

/// Cores below one render as millicores, everything else as cores.
pub fn format_cpu(cores: f64) -> FormattedQuantity {
    if cores == 0.0 {
        return FormattedQuantity::new("0", "cores");
    }
    if cores > 0.0 && cores < 1.0 {
        return FormattedQuantity::new(format!("{}", (cores * 1000.0).round() as i64), "m");
    }
    FormattedQuantity::new(format!("{:.2}", cores), "cores")
}

/// Pod counts and small whole numbers print as bare integers; the rest is
/// assumed to be bytes (ephemeral-storage, hugepages).
pub fn format_generic(resource: &str, value: f64) -> FormattedQuantity {
    if resource == "pods" {
        return FormattedQuantity::new(format!("{}", value.round() as i64), "pods");
    }
    if value.fract() == 0.0 && value.abs() < 1024.0 {
        return FormattedQuantity::new(format!("{}", value as i64), "");
    }
    format_memory(value)
}

pub fn format_resource(resource: &str, value: f64) -> FormattedQuantity {
    match ResourceKind::for_resource(resource) {
        ResourceKind::Cpu => format_cpu(value),
        ResourceKind::Memory => format_memory(value),
        ResourceKind::Generic => format_generic(resource, value),
    }
}
