//! Single connection behind a `std::sync::Mutex`. Writes are serialized.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use intentlayer_core::errors::IntentLayerResult;

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

/// The one connection every persistence call goes through.
///
/// The lock is synchronous because callers commit while holding a session
/// lock and must not yield.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path) -> IntentLayerResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> IntentLayerResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the lock and run `f` with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> IntentLayerResult<T>
    where
        F: FnOnce(&mut Connection) -> IntentLayerResult<T>,
    {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("connection lock poisoned".to_string()))?;
        f(&mut guard)
    }
}
