use serde::{Deserialize, Serialize};

use super::ResourceRef;

/// Stream dashboard: a named, ordered collection of streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardAttributes {
    pub name: String,

    #[serde(default)]
    pub streams: Vec<ResourceRef>,
}
