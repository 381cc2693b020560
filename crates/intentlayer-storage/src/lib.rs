//! # intentlayer-storage
//!
//! SQLite write-through persistence for the IntentLayer engine.
//! Implements [`IPersistence`](intentlayer_core::traits::IPersistence) on a single
//! WAL-mode connection with versioned migrations.

mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use intentlayer_core::errors::{IntentLayerError, StorageError};

/// Wrap a SQLite failure message into the workspace error type.
pub(crate) fn to_storage_err(message: String) -> IntentLayerError {
    IntentLayerError::StorageError(StorageError::SqliteError { message })
}
