use super::{CatalogError, StorageError};

/// Result alias used across the workspace.
pub type IntentLayerResult<T> = Result<T, IntentLayerError>;

/// Caller-facing failure taxonomy. Every [`IntentLayerError`] maps onto exactly one kind.
///
/// `Conflict` has no kind: session-cap conflicts are resolved by LRU eviction
/// inside the session store and never reach a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Timeout,
    Exhausted,
    Unavailable,
}

/// Top-level error for every IntentLayer operation.
#[derive(Debug, thiserror::Error)]
pub enum IntentLayerError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("session not found: {id}")]
    SessionNotFound { id: String },

    #[error("user not found: {id}")]
    UserNotFound { id: String },

    #[error("template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("{operation} timed out after {elapsed_ms}ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("candidates exhausted: {reason}")]
    Exhausted { reason: String },

    #[error("{component} unavailable: {reason}")]
    Unavailable { component: String, reason: String },

    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    CatalogError(#[from] CatalogError),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl IntentLayerError {
    /// Shorthand for [`IntentLayerError::InvalidInput`].
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`IntentLayerError::Unavailable`].
    pub fn unavailable(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Classify this error into the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } | Self::ConfigError { .. } => ErrorKind::InvalidInput,
            Self::SessionNotFound { .. }
            | Self::UserNotFound { .. }
            | Self::TemplateNotFound { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Exhausted { .. } => ErrorKind::Exhausted,
            Self::CatalogError(CatalogError::InvalidDefinition { .. })
            | Self::CatalogError(CatalogError::DuplicateName { .. })
            | Self::CatalogError(CatalogError::Parse { .. }) => ErrorKind::InvalidInput,
            Self::Unavailable { .. }
            | Self::StorageError(_)
            | Self::CatalogError(CatalogError::Io { .. })
            | Self::SerializationError(_) => ErrorKind::Unavailable,
        }
    }

    /// Whether the engine should take its fallback path instead of failing the turn.
    pub fn triggers_fallback(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}
