// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Never more than this many snapshots resident per backup directory.
pub const BACKUP_CAP: usize = 100;

/// Snapshots a collection file into a sibling `backups/` directory before a
/// destructive overwrite. Rotation failure must abort the triggering write:
/// overwriting the only copy without a snapshot is unrecoverable in file mode.
pub struct BackupRotator {
    cap: usize,
}

impl Default for BackupRotator {
    fn default() -> Self {
        Self { cap: BACKUP_CAP }
    }
}

impl BackupRotator {
    pub fn with_cap(cap: usize) -> Self {
        Self { cap }
    }

    pub fn backup_dir(file: &Path) -> Result<PathBuf> {
        let parent = file
            .parent()
            .ok_or_else(|| Error::StorageUnavailable(format!("no parent dir for {}", file.display())))?;
        Ok(parent.join("backups"))
    }

    /// Copy `file` into the backup directory under a timestamped name,
    /// evicting oldest snapshots first so the cap is never exceeded.
    /// A file that does not exist yet has nothing to snapshot.
    pub fn rotate(&self, file: &Path) -> Result<()> {
        if !file.exists() {
            return Ok(());
        }
        let dir = Self::backup_dir(file)?;
        fs::create_dir_all(&dir)?;

        // Evict down to cap-1 before copying, oldest first.
        let mut snapshots = list_snapshots(&dir)?;
        while self.cap > 0 && snapshots.len() >= self.cap {
            let (_, _, oldest) = snapshots.remove(0);
            fs::remove_file(&oldest)?;
        }

        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("collection");
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::StorageUnavailable(e.to_string()))?
            .as_nanos();
        let name = format!("{}-{:030}.json", stem, nanos);
        fs::copy(file, dir.join(name))?;
        Ok(())
    }
}

/// Snapshot files sorted oldest-first by modification time, with the
/// timestamped file name as tie-break for clocks coarser than the write rate.
fn list_snapshots(dir: &Path) -> Result<Vec<(SystemTime, String, PathBuf)>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let mtime = entry.metadata()?.modified()?;
        let name = entry.file_name().to_string_lossy().into_owned();
        out.push((mtime, name, path));
    }
    out.sort();
    Ok(out)
}
