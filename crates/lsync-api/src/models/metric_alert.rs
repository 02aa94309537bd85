use serde::{Deserialize, Serialize};

/// Metric condition: one or more metric queries evaluated against
/// thresholds, routed to destinations by alerting rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAlertAttributes {
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub expression: AlertExpression,

    pub queries: Vec<MetricQuery>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerting_rules: Vec<AlertingRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertExpression {
    #[serde(default)]
    pub is_multi: bool,

    #[serde(default)]
    pub is_no_data: bool,

    /// Comparison operator: `above` or `below`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<String>,

    #[serde(default)]
    pub thresholds: Thresholds,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub query_name: String,

    pub tql: String,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default = "default_display")]
    pub display: String,
}

fn default_display() -> String {
    "line".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertingRule {
    pub destination_id: String,

    pub update_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    pub value: String,
}
