// Wire representations of the resource kinds this client manages.
//
// Every kind shares the same outer object shape; only `attributes` and
// `relationships` vary. `RemoteResource` dispatches an untyped payload on
// its `type` discriminant.

mod condition;
mod dashboard;
mod metric_alert;
mod stream;

pub use condition::{ConditionAttributes, ConditionRelationships};
pub use dashboard::DashboardAttributes;
pub use metric_alert::{
    AlertExpression, AlertingRule, Label, MetricAlertAttributes, MetricQuery, Thresholds,
};
pub use stream::{CustomData, StreamAttributes};

use serde::{Deserialize, Serialize};

pub const STREAM: &str = "stream";
pub const DASHBOARD: &str = "dashboard";
pub const CONDITION: &str = "condition";
pub const METRIC_ALERT: &str = "metric_alert";

/// Outer shape shared by every resource object on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject<A, R = serde_json::Value> {
    #[serde(rename = "type")]
    pub kind: String,

    /// Assigned by the server; absent on create requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub attributes: A,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<R>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl<A, R> ResourceObject<A, R> {
    /// Request object without identity, relationships, or links.
    pub fn new(kind: &str, attributes: A) -> Self {
        Self {
            kind: kind.to_owned(),
            id: None,
            attributes,
            relationships: None,
            links: None,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_relationships(mut self, relationships: R) -> Self {
        self.relationships = Some(relationships);
        self
    }
}

pub type Stream = ResourceObject<StreamAttributes>;
pub type Dashboard = ResourceObject<DashboardAttributes>;
pub type Condition = ResourceObject<ConditionAttributes, ConditionRelationships>;
pub type MetricAlert = ResourceObject<MetricAlertAttributes>;

/// `{"type", "id"}` pointer to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

impl ResourceRef {
    pub fn new(kind: &str, id: impl Into<String>) -> Self {
        Self {
            kind: kind.to_owned(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,
}

/// A relationship as it appears on the wire: inline `data` on requests,
/// `links.related` on responses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResourceRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

// ── Subtype dispatch ────────────────────────────────────────────────

/// Any resource object, discriminated by its `type` field.
///
/// Serializes back to the plain wire object, without a variant tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RemoteResource {
    Stream(Stream),
    Dashboard(Dashboard),
    Condition(Condition),
    MetricAlert(MetricAlert),
    /// A kind this client has no model for.
    Other {
        #[serde(rename = "type")]
        kind: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
}

impl RemoteResource {
    /// Decode an untyped `data` payload into the variant named by `type`.
    pub fn from_data(data: serde_json::Value) -> Result<Self, serde_json::Error> {
        let kind = data
            .get("type")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| <serde_json::Error as serde::de::Error>::missing_field("type"))?;

        Ok(match kind.as_str() {
            STREAM => Self::Stream(serde_json::from_value(data)?),
            DASHBOARD => Self::Dashboard(serde_json::from_value(data)?),
            CONDITION => Self::Condition(serde_json::from_value(data)?),
            METRIC_ALERT => Self::MetricAlert(serde_json::from_value(data)?),
            _ => Self::Other {
                id: data
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_owned),
                kind,
            },
        })
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Stream(_) => STREAM,
            Self::Dashboard(_) => DASHBOARD,
            Self::Condition(_) => CONDITION,
            Self::MetricAlert(_) => METRIC_ALERT,
            Self::Other { kind, .. } => kind,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Stream(r) => r.id.as_deref(),
            Self::Dashboard(r) => r.id.as_deref(),
            Self::Condition(r) => r.id.as_deref(),
            Self::MetricAlert(r) => r.id.as_deref(),
            Self::Other { id, .. } => id.as_deref(),
        }
    }
}
