// Copyright (c) 2025 Coffer Project.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use coffer::backup::{BACKUP_CAP, BackupRotator};
use std::fs;

#[test]
fn rotation_caps_at_100_newest() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("expenses.json");
    let rotator = BackupRotator::default();

    for i in 0..150 {
        fs::write(&file, format!("[{}]", i)).unwrap();
        rotator.rotate(&file).unwrap();
    }

    let backup_dir = dir.path().join("backups");
    let mut contents: Vec<i64> = fs::read_dir(&backup_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().and_then(|x| x.to_str()) == Some("json"))
        .map(|p| {
            let raw = fs::read_to_string(p).unwrap();
            raw.trim_start_matches('[').trim_end_matches(']').parse().unwrap()
        })
        .collect();
    contents.sort();

    // Exactly the cap remains, and they are the 100 most recent snapshots.
    assert_eq!(contents.len(), BACKUP_CAP);
    assert_eq!(contents, (50..150).collect::<Vec<i64>>());
}

#[test]
fn missing_file_is_nothing_to_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let rotator = BackupRotator::default();
    rotator.rotate(&dir.path().join("expenses.json")).unwrap();
    assert!(!dir.path().join("backups").exists());
}

#[test]
fn small_cap_evicts_before_copying() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("incomes.json");
    let rotator = BackupRotator::with_cap(3);

    for i in 0..10 {
        fs::write(&file, format!("[{}]", i)).unwrap();
        rotator.rotate(&file).unwrap();
        let count = fs::read_dir(dir.path().join("backups")).unwrap().count();
        assert!(count <= 3, "cap exceeded after rotation {}: {}", i, count);
    }
}
