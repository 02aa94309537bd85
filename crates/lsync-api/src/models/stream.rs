use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Named bags of free-form fields attached to a stream, keyed by name.
pub type CustomData = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamAttributes {
    pub name: String,

    /// Span query. The server may normalize clause order.
    pub query: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom_data: CustomData,
}
