use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SUMMARIZE_ROUTE: &str = "/summarize";
pub const HEALTH_ROUTE: &str = "/health";

/// Aggregates computed by the server over the submitted `hosts` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_hosts: u64,
    pub critical_risk: u64,
    pub high_risk: u64,
    pub services_count: u64,
    /// Only the count is shown, so entries are kept as whatever JSON the
    /// server sent; a `null` id still counts.
    pub unique_vulnerabilities: Vec<Value>,
    pub countries: Vec<String>,
}

/// Successful `/summarize` reply. `metrics` and `summary` are required; a body
/// missing either fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeResponse {
    pub metrics: MetricsSummary,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hosts_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
