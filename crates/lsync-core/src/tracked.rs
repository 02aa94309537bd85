// Local record of one declared resource and whether it exists remotely.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a tracked resource stands relative to the server.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum Presence {
    /// Declared but never created, or found missing on read.
    #[default]
    Absent,
    Created(String),
    Deleted,
}

/// A declared resource: the project it lives in, its attributes, and
/// its remote identity once it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracked<A> {
    pub project: String,
    pub attrs: A,
    #[serde(default)]
    pub presence: Presence,
}

impl<A> Tracked<A> {
    pub fn new(project: impl Into<String>, attrs: A) -> Self {
        Self {
            project: project.into(),
            attrs,
            presence: Presence::Absent,
        }
    }

    /// Already-created resource, as after an import.
    pub fn existing(project: impl Into<String>, id: impl Into<String>, attrs: A) -> Self {
        Self {
            project: project.into(),
            attrs,
            presence: Presence::Created(id.into()),
        }
    }

    pub fn id(&self) -> Option<&str> {
        match &self.presence {
            Presence::Created(id) => Some(id),
            Presence::Absent | Presence::Deleted => None,
        }
    }
}

/// Result of refreshing a tracked resource from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Present,
    /// The server no longer has it; the identifier was cleared.
    Gone,
}

/// `<project>.<id>` reference accepted by import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    pub project: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedImportRef;

impl FromStr for ImportRef {
    type Err = MalformedImportRef;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(project), Some(id), None) if !project.is_empty() && !id.is_empty() => Ok(Self {
                project: project.to_owned(),
                id: id.to_owned(),
            }),
            _ => Err(MalformedImportRef),
        }
    }
}

impl fmt::Display for ImportRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project, self.id)
    }
}
