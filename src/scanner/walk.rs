//! Filesystem walk

use crate::scanner::{DiscoveredSnapshot, ScanError};
use std::fs;
use std::path::Path;

/// Scan the snapshot root for structurally complete snapshots
///
/// Top-level directory names are tenants; each tenant's subdirectories whose
/// names parse as decimal timestamps are snapshot candidates. A candidate
/// qualifies when both `nodes/` and `relationships/` exist and each contains
/// at least one entry; anything else is presumed to be a write in progress
/// and is left for a later scan.
///
/// Within a tenant, snapshots are reported oldest first so catch-up after a
/// restart replays deployments in arrival order.
pub fn scan(root: &Path) -> Result<Vec<DiscoveredSnapshot>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootMissing {
            path: root.display().to_string(),
        });
    }

    let tenants = fs::read_dir(root).map_err(|source| ScanError::Io {
        path: root.display().to_string(),
        source,
    })?;

    let mut discovered = Vec::new();

    for tenant_entry in tenants.flatten() {
        let tenant_path = tenant_entry.path();
        if !tenant_path.is_dir() {
            continue;
        }
        let Some(tenant) = tenant_entry.file_name().to_str().map(str::to_string) else {
            continue;
        };

        let Ok(candidates) = fs::read_dir(&tenant_path) else {
            // Tenant directory vanished or became unreadable mid-scan
            continue;
        };

        let mut snapshots: Vec<DiscoveredSnapshot> = Vec::new();
        for candidate in candidates.flatten() {
            let path = candidate.path();
            if !path.is_dir() {
                continue;
            }
            // Non-integer names are not snapshots
            let Some(timestamp) = candidate
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u64>().ok())
            else {
                continue;
            };

            if is_complete(&path) {
                snapshots.push(DiscoveredSnapshot {
                    tenant: tenant.clone(),
                    timestamp,
                    path,
                });
            }
        }

        snapshots.sort_by_key(|snapshot| snapshot.timestamp);
        discovered.extend(snapshots);
    }

    Ok(discovered)
}

/// A snapshot is complete when nodes/ and relationships/ both have content
fn is_complete(snapshot_path: &Path) -> bool {
    dir_has_entries(&snapshot_path.join("nodes"))
        && dir_has_entries(&snapshot_path.join("relationships"))
}

fn dir_has_entries(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn write_snapshot(root: &Path, tenant: &str, timestamp: &str) {
        let snapshot = root.join(tenant).join(timestamp);
        for (section, kind) in [("nodes", "Person"), ("relationships", "KNOWS")] {
            let dir = snapshot.join(section).join(kind);
            fs::create_dir_all(&dir).unwrap();
            File::create(dir.join("part-0.parquet")).unwrap();
        }
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let err = scan(Path::new("/nonexistent/snapshots")).unwrap_err();
        assert!(matches!(err, ScanError::RootMissing { .. }));
    }

    #[test]
    fn test_scan_empty_root_finds_nothing() {
        let root = TempDir::new().unwrap();
        assert!(scan(root.path()).unwrap().is_empty());
    }

    #[test]
    fn test_scan_finds_complete_snapshot() {
        let root = TempDir::new().unwrap();
        write_snapshot(root.path(), "customer1", "100");

        let found = scan(root.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tenant, "customer1");
        assert_eq!(found[0].timestamp, 100);
        assert_eq!(found[0].path, root.path().join("customer1").join("100"));
    }

    #[test]
    fn test_scan_skips_incomplete_snapshots() {
        let root = TempDir::new().unwrap();

        // nodes only
        fs::create_dir_all(root.path().join("t1/100/nodes/Person")).unwrap();
        File::create(root.path().join("t1/100/nodes/Person/part-0.parquet")).unwrap();

        // both sections present but relationships empty
        fs::create_dir_all(root.path().join("t1/200/nodes/Person")).unwrap();
        File::create(root.path().join("t1/200/nodes/Person/part-0.parquet")).unwrap();
        fs::create_dir_all(root.path().join("t1/200/relationships")).unwrap();

        assert!(scan(root.path()).unwrap().is_empty());
    }

    #[test]
    fn test_scan_skips_non_integer_directory_names() {
        let root = TempDir::new().unwrap();
        write_snapshot(root.path(), "t1", "100");
        fs::create_dir_all(root.path().join("t1/latest/nodes")).unwrap();
        fs::create_dir_all(root.path().join("t1/.tmp-upload/nodes")).unwrap();

        let found = scan(root.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].timestamp, 100);
    }

    #[test]
    fn test_scan_ignores_stray_files() {
        let root = TempDir::new().unwrap();
        File::create(root.path().join("README.txt")).unwrap();
        write_snapshot(root.path(), "t1", "100");
        File::create(root.path().join("t1").join("manifest.json")).unwrap();

        let found = scan(root.path()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_scan_yields_ascending_timestamps_per_tenant() {
        let root = TempDir::new().unwrap();
        write_snapshot(root.path(), "t1", "300");
        write_snapshot(root.path(), "t1", "100");
        write_snapshot(root.path(), "t1", "200");

        let found = scan(root.path()).unwrap();
        let timestamps: Vec<u64> = found.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![100, 200, 300]);
    }

    #[test]
    fn test_scan_picks_up_snapshot_completed_between_scans() {
        let root = TempDir::new().unwrap();

        fs::create_dir_all(root.path().join("t1/100/nodes/Person")).unwrap();
        File::create(root.path().join("t1/100/nodes/Person/part-0.parquet")).unwrap();
        assert!(scan(root.path()).unwrap().is_empty());

        // The writer finishes the relationships section
        let rel_dir = root.path().join("t1/100/relationships/KNOWS");
        fs::create_dir_all(&rel_dir).unwrap();
        File::create(rel_dir.join("part-0.parquet")).unwrap();

        assert_eq!(scan(root.path()).unwrap().len(), 1);
    }
}
