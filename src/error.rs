//! Error taxonomy for the remote API, the local registry and note operations
//!
//! - `ApiError`: classification of a single remote call (or of a retry loop
//!   that gave up)
//! - `RegistryError`: local mirror failures (I/O, JSON, hierarchy invariants)
//! - `NotesError`: what `NoteManager` callers see, including the distinct
//!   `PartiallyApplied` case where the remote mutation succeeded but the local
//!   mirror could not be saved

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Remote API errors
// ============================================================================

/// Failure of a call to the remote note service
#[derive(Debug, Error)]
pub enum ApiError {
    /// 401/403: bad or missing credentials. Never retried.
    #[error("authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    /// 400: the request itself is wrong. Never retried.
    #[error("request rejected as invalid: {message}")]
    Validation { message: String },

    /// 404: the identifier does not exist remotely.
    #[error("resource not found: {path}")]
    NotFound { path: String },

    /// 429: throttled by the remote service. Retried with backoff.
    #[error("rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// 5xx: remote side failure. Retried with backoff.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Any other non-2xx status
    #[error("unexpected HTTP status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// Timeout, connection refused, reset... Retried with backoff.
    #[error("network error: {0}")]
    Transport(String),

    /// A 2xx response whose body could not be understood
    #[error("invalid response body: {0}")]
    Decode(String),

    /// A retryable failure that persisted through every allowed attempt
    #[error("giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<ApiError>,
    },
}

impl ApiError {
    /// Classify a non-success HTTP status into an error
    pub fn from_status(status: u16, path: &str, body: String) -> Self {
        match status {
            400 => Self::Validation { message: body },
            401 | 403 => Self::Authentication {
                status,
                message: body,
            },
            404 => Self::NotFound {
                path: path.to_string(),
            },
            429 => Self::RateLimited { message: body },
            500..=599 => Self::Server {
                status,
                message: body,
            },
            _ => Self::UnexpectedStatus {
                status,
                message: body,
            },
        }
    }

    /// Short machine-readable name, surfaced to agents as `error_kind`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::Validation { .. } => "validation",
            Self::NotFound { .. } => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::Server { .. } => "server",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::RetriesExhausted { last, .. } => last.kind(),
        }
    }

    /// True for a 404, including one that surfaced through the retry loop
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::RetriesExhausted { last, .. } => last.is_not_found(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

// ============================================================================
// Local registry errors
// ============================================================================

/// Failure of the local JSON-backed registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("registry file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Inserting or moving the folder would put it inside its own subtree
    #[error("folder {folder_id} cannot be placed under {parent_id}: it would create a cycle")]
    Cycle { folder_id: String, parent_id: String },

    #[error("unknown folder: {0}")]
    UnknownFolder(String),

    #[error("unknown note: {0}")]
    UnknownNote(String),

    #[error("identifier already registered: {0}")]
    DuplicateId(String),
}

// ============================================================================
// Note operation errors
// ============================================================================

/// Errors returned by `NoteManager`
#[derive(Debug, Error)]
pub enum NotesError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The remote mutation succeeded but the local mirror could not be
    /// persisted. Remote and local state have diverged.
    #[error("remote {operation} of {id} succeeded but the local registry was not saved: {source}")]
    PartiallyApplied {
        operation: &'static str,
        id: String,
        #[source]
        source: RegistryError,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("note not found: {0}")]
    NoteNotFound(String),

    #[error("folder not found: {0}")]
    FolderNotFound(String),
}

impl NotesError {
    /// Short machine-readable name, surfaced to agents as `error_kind`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Api(e) => e.kind(),
            Self::Registry(RegistryError::Cycle { .. }) => "cycle",
            Self::Registry(_) => "registry",
            Self::PartiallyApplied { .. } => "partially_applied",
            Self::InvalidInput(_) => "invalid_input",
            Self::NoteNotFound(_) => "note_not_found",
            Self::FolderNotFound(_) => "folder_not_found",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(401, "/v1/notes", String::new()),
            ApiError::Authentication { status: 401, .. }
        ));
        assert!(matches!(
            ApiError::from_status(403, "/v1/notes", String::new()),
            ApiError::Authentication { status: 403, .. }
        ));
        assert!(matches!(
            ApiError::from_status(400, "/v1/notes", "bad".into()),
            ApiError::Validation { .. }
        ));
        assert!(matches!(
            ApiError::from_status(404, "/v1/notes/x", String::new()),
            ApiError::NotFound { ref path } if path == "/v1/notes/x"
        ));
        assert!(matches!(
            ApiError::from_status(429, "/v1/notes", String::new()),
            ApiError::RateLimited { .. }
        ));
        assert!(matches!(
            ApiError::from_status(503, "/v1/notes", String::new()),
            ApiError::Server { status: 503, .. }
        ));
        assert!(matches!(
            ApiError::from_status(418, "/v1/notes", String::new()),
            ApiError::UnexpectedStatus { status: 418, .. }
        ));
    }

    #[test]
    fn test_exhausted_reports_inner_kind() {
        let err = ApiError::RetriesExhausted {
            attempts: 3,
            last: Box::new(ApiError::Server {
                status: 503,
                message: "unavailable".into(),
            }),
        };
        assert_eq!(err.kind(), "server");
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_partially_applied_kind() {
        let err = NotesError::PartiallyApplied {
            operation: "create_note",
            id: "n1".into(),
            source: RegistryError::UnknownNote("n1".into()),
        };
        assert_eq!(err.kind(), "partially_applied");
        assert!(err.to_string().contains("n1"));
    }
}
