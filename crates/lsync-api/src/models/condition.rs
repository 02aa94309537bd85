// Stream-backed alert conditions.
//
// The owning stream travels as inline `data` on requests, but responses
// only carry `links.related`, an absolute URL that must be dereferenced
// to recover the stream identifier.

use serde::{Deserialize, Serialize};

use super::{Relationship, ResourceRef, STREAM};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionAttributes {
    pub name: String,

    /// Threshold expression, e.g. `error_ratio > 0.1`.
    pub expression: String,

    #[serde(rename = "evaluation-window-ms")]
    pub evaluation_window_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionRelationships {
    #[serde(default)]
    pub stream: Relationship,
}

impl ConditionRelationships {
    /// Request-side relationship pointing at a stream by id.
    pub fn for_stream(stream_id: impl Into<String>) -> Self {
        Self {
            stream: Relationship {
                data: Some(ResourceRef::new(STREAM, stream_id)),
                links: None,
            },
        }
    }

    /// URL of the related stream, when the server supplied one.
    pub fn stream_link(&self) -> Option<&str> {
        self.stream
            .links
            .as_ref()
            .and_then(|links| links.related.as_deref())
    }
}
