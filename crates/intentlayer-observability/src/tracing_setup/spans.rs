//! Span definitions per operation: rank, compose, record, session, maintenance.

/// Create a rank span.
#[macro_export]
macro_rules! rank_span {
    ($session_id:expr, $intent:expr) => {
        tracing::info_span!("intentlayer.rank", session_id = %$session_id, intent = %$intent)
    };
}

/// Create a compose span.
#[macro_export]
macro_rules! compose_span {
    ($intent:expr, $candidates:expr) => {
        tracing::info_span!("intentlayer.compose", intent = %$intent, candidates = $candidates)
    };
}

/// Create a record span.
#[macro_export]
macro_rules! record_span {
    ($session_id:expr) => {
        tracing::info_span!("intentlayer.record", session_id = %$session_id)
    };
}

/// Create a session span.
#[macro_export]
macro_rules! session_span {
    ($operation:expr, $key:expr) => {
        tracing::info_span!("intentlayer.session", operation = $operation, key = %$key)
    };
}

/// Create a maintenance span.
#[macro_export]
macro_rules! maintenance_span {
    ($cycle:expr) => {
        tracing::info_span!("intentlayer.maintenance", cycle = $cycle)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const RANK: &str = "intentlayer.rank";
    pub const COMPOSE: &str = "intentlayer.compose";
    pub const RECORD: &str = "intentlayer.record";
    pub const SESSION: &str = "intentlayer.session";
    pub const MAINTENANCE: &str = "intentlayer.maintenance";
}
