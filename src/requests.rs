// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result;
use rusqlite::{Connection, params};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Idempotency guard. A recorded request id means the mutation it identifies
/// has already been applied and must not be applied again.
pub trait RequestLedger: Send + Sync {
    /// Atomic check-and-insert. Returns `true` when the id was fresh and is
    /// now recorded, `false` when it was already present. The check and the
    /// insert must be a single step per id; a read followed by a conditional
    /// write leaves a window where two concurrent identical requests both
    /// observe "not present" and both apply.
    fn check_and_record(&self, request_id: &str, owner: &str) -> Result<bool>;

    /// Release an id whose guarded mutation failed, so the client can retry
    /// with the same id.
    fn forget(&self, request_id: &str) -> Result<()>;
}

/// Process-lifetime guard for the file-backed mode. Duplicates across process
/// restarts are not caught by this tier.
#[derive(Default)]
pub struct MemoryRequestLedger {
    seen: Mutex<HashSet<String>>,
}

impl MemoryRequestLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestLedger for MemoryRequestLedger {
    fn check_and_record(&self, request_id: &str, _owner: &str) -> Result<bool> {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        Ok(seen.insert(request_id.to_string()))
    }

    fn forget(&self, request_id: &str) -> Result<()> {
        let mut seen = self.seen.lock().unwrap_or_else(|e| e.into_inner());
        seen.remove(request_id);
        Ok(())
    }
}

/// Durable guard backed by the `requests` table; authoritative for the
/// SQLite-backed mode. The primary key makes the insert the atomic step.
pub struct SqliteRequestLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRequestLedger {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl RequestLedger for SqliteRequestLedger {
    fn check_and_record(&self, request_id: &str, owner: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO requests(request_id, user_id, applied_at)
             VALUES (?1, ?2, datetime('now'))",
            params![request_id, owner],
        )?;
        Ok(inserted == 1)
    }

    fn forget(&self, request_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        conn.execute("DELETE FROM requests WHERE request_id=?1", params![request_id])?;
        Ok(())
    }
}
