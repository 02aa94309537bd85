// ── Core error types ──
//
// Reconciliation failures. API errors pass through untouched so callers
// can still branch on HTTP status; everything else is detected locally
// before any request is sent.

use thiserror::Error;

use lsync_api::UNKNOWN_STATUS;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Api(#[from] lsync_api::Error),

    // ── Input ────────────────────────────────────────────────────────
    #[error(
        "error importing {kind}: expecting an ID formed as '<project>.<{kind}_id>' (provided: {reference})"
    )]
    InvalidImportReference {
        kind: &'static str,
        reference: String,
    },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("{kind} in project {project} has no identifier; create or import it first")]
    Untracked { kind: &'static str, project: String },

    #[error("{kind} {id} already exists; update it instead of creating it")]
    AlreadyCreated { kind: &'static str, id: String },

    #[error("{kind} {id} not found in project {project}")]
    NotFound {
        kind: &'static str,
        project: String,
        id: String,
    },

    // ── Protocol ─────────────────────────────────────────────────────
    #[error("server returned a {kind} without an identifier")]
    MissingIdentifier { kind: &'static str },

    #[error("{kind} {id} carries no {relationship} reference")]
    MissingRelationship {
        kind: &'static str,
        id: String,
        relationship: &'static str,
    },
}

impl CoreError {
    /// HTTP status behind the failure, or -1 when there was none.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Api(err) => err.status_code(),
            _ => UNKNOWN_STATUS,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api(err) => err.is_not_found(),
            Self::NotFound { .. } => true,
            _ => false,
        }
    }
}
