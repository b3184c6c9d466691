use thiserror::Error;

/// Errors shared by every ocres component
///
/// Each variant maps onto one of the response outcomes a resource can
/// produce, so the same error can travel from a handler to a client
/// without losing its kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The request was malformed or carried an out-of-range value
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The resource or observation does not exist (or no longer exists)
    #[error("Not found: {0}")]
    NotFound(String),

    /// The peer could not be reached or did not answer in time
    #[error("Transport error: {0}")]
    Transport(String),

    /// The resource owner failed while applying a valid request
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`ResourceError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Transport,
    Internal,
}

impl ResourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResourceError::Validation(_) => ErrorKind::Validation,
            ResourceError::NotFound(_) => ErrorKind::NotFound,
            ResourceError::Transport(_) => ErrorKind::Transport,
            ResourceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Human readable detail without the kind prefix
    pub fn detail(&self) -> &str {
        match self {
            ResourceError::Validation(msg)
            | ResourceError::NotFound(msg)
            | ResourceError::Transport(msg)
            | ResourceError::Internal(msg) => msg,
        }
    }
}

impl From<serde_json::Error> for ResourceError {
    fn from(err: serde_json::Error) -> Self {
        ResourceError::Validation(format!("malformed representation: {}", err))
    }
}

/// Result type for ocres operations
pub type Result<T> = std::result::Result<T, ResourceError>;
