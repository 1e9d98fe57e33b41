use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::Value;
use shared::protocol::MetricsSummary;

const UNKNOWN: &str = "Unknown";

/// The slice of a scanned host that metric extraction reads. Every field is
/// optional; anything else in the record is ignored here. Scalar leaves are
/// kept as raw JSON so a number where a string was expected does not reject
/// the whole submission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostRecord {
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub threat_intelligence: ThreatIntelligence,
    #[serde(default)]
    pub services: Vec<ServiceRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub country: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreatIntelligence {
    #[serde(default)]
    pub risk_level: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceRecord {
    #[serde(default)]
    pub vulnerabilities: Vec<VulnerabilityRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VulnerabilityRecord {
    #[serde(default)]
    pub cve_id: Option<Value>,
}

/// Text for a scalar leaf: strings as-is, other values as their JSON text,
/// missing or `null` as "Unknown".
fn label_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn extract_key_metrics(hosts: &[HostRecord]) -> MetricsSummary {
    let mut critical_risk = 0;
    let mut high_risk = 0;
    let mut services_count = 0;
    let mut vulnerabilities = BTreeSet::new();
    let mut countries = BTreeSet::new();

    for host in hosts {
        let risk = host
            .threat_intelligence
            .risk_level
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_lowercase();
        match risk.as_str() {
            "critical" => critical_risk += 1,
            "high" => high_risk += 1,
            _ => {}
        }

        for service in &host.services {
            services_count += 1;
            for vuln in &service.vulnerabilities {
                vulnerabilities.insert(label_of(vuln.cve_id.as_ref()));
            }
        }

        countries.insert(label_of(host.location.country.as_ref()));
    }

    MetricsSummary {
        total_hosts: hosts.len() as u64,
        critical_risk,
        high_risk,
        services_count,
        unique_vulnerabilities: vulnerabilities.into_iter().map(Value::String).collect(),
        countries: countries.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hosts(value: serde_json::Value) -> Vec<HostRecord> {
        serde_json::from_value(value).expect("hosts")
    }

    #[test]
    fn counts_risk_tiers_case_insensitively() {
        let hosts = hosts(serde_json::json!([
            { "threat_intelligence": { "risk_level": "CRITICAL" } },
            { "threat_intelligence": { "risk_level": "High" } },
            { "threat_intelligence": { "risk_level": "high" } },
            { "threat_intelligence": { "risk_level": "low" } },
            {}
        ]));
        let metrics = extract_key_metrics(&hosts);
        assert_eq!(metrics.total_hosts, 5);
        assert_eq!(metrics.critical_risk, 1);
        assert_eq!(metrics.high_risk, 2);
    }

    #[test]
    fn collects_services_and_distinct_vulnerabilities() {
        let hosts = hosts(serde_json::json!([
            {
                "ip": "10.0.0.1",
                "location": { "country": "US" },
                "services": [
                    { "port": 22, "vulnerabilities": [{ "cve_id": "CVE-2023-38408" }] },
                    { "port": 80, "vulnerabilities": [{ "cve_id": "CVE-2021-41773" }, {}] }
                ]
            },
            {
                "ip": "10.0.0.2",
                "location": { "country": "CN" },
                "services": [
                    { "port": 22, "vulnerabilities": [{ "cve_id": "CVE-2023-38408" }] }
                ]
            }
        ]));
        let metrics = extract_key_metrics(&hosts);
        assert_eq!(metrics.services_count, 3);
        assert_eq!(
            metrics.unique_vulnerabilities,
            vec!["CVE-2021-41773", "CVE-2023-38408", "Unknown"]
        );
        assert_eq!(metrics.countries, vec!["CN", "US"]);
    }

    #[test]
    fn missing_location_counts_as_unknown_country() {
        let hosts = hosts(serde_json::json!([{ "ip": "10.0.0.9" }]));
        let metrics = extract_key_metrics(&hosts);
        assert_eq!(metrics.countries, vec!["Unknown"]);
        assert!(metrics.unique_vulnerabilities.is_empty());
    }

    #[test]
    fn non_string_leaves_do_not_reject_the_host() {
        let hosts = hosts(serde_json::json!([
            {
                "location": { "country": 44 },
                "threat_intelligence": { "risk_level": 3 },
                "services": [{ "vulnerabilities": [{ "cve_id": null }, { "cve_id": 1234 }] }]
            }
        ]));
        let metrics = extract_key_metrics(&hosts);
        assert_eq!(metrics.countries, vec!["44"]);
        assert_eq!(metrics.unique_vulnerabilities, vec!["1234", "Unknown"]);
        assert_eq!(metrics.critical_risk + metrics.high_risk, 0);
    }

    #[test]
    fn empty_host_list_yields_zeroes() {
        assert_eq!(extract_key_metrics(&[]), MetricsSummary::default());
    }
}
