//! Versioning store: keeps the previous artifact under a timestamped name
//! before a new one is written to the same path.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use documenter_std::fs::{CreateDirAll, ExistsFile, RenameFile, WriteFile};
use documenter_std::time::GetNow;
use tracing::{debug, info};

use crate::error::StoreError;

/// `strftime` pattern of the suffix appended to backups.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Two backups of the same path within one second share a name; the later
/// one replaces the earlier.
pub struct VersioningStore<F, C> {
    fs: F,
    clock: C,
    timezone: Tz,
}

impl<F, C> VersioningStore<F, C>
where
    F: ExistsFile + RenameFile + WriteFile + CreateDirAll,
    C: GetNow,
{
    /// Backup timestamps are rendered in `timezone`.
    pub fn new(fs: F, clock: C, timezone: Tz) -> Self {
        Self {
            fs,
            clock,
            timezone,
        }
    }

    /// Moves an existing file at `path` to its timestamped backup name.
    ///
    /// Returns the backup path, or `None` when there was nothing to preserve.
    pub fn preserve(&self, path: &Path) -> Result<Option<PathBuf>, StoreError> {
        if !self.fs.exists(path) {
            debug!(path = %path.display(), "Nothing to back up");
            return Ok(None);
        }

        let stamp = self
            .clock
            .now()
            .with_timezone(&self.timezone)
            .format(BACKUP_TIMESTAMP_FORMAT)
            .to_string();
        let backup = backup_path(path, &stamp)?;

        self.fs
            .rename(path, &backup)
            .map_err(|source| StoreError::Backup {
                path: path.to_path_buf(),
                backup: backup.clone(),
                source,
            })?;

        info!(path = %path.display(), backup = %backup.display(), "Backed up existing file");
        Ok(Some(backup))
    }

    /// Writes `contents` to `path`, creating the parent directory if needed.
    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs
                .create_dir_all(parent)
                .map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        self.fs
            .write(path, contents)
            .map_err(|source| StoreError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Preserves the current file, then writes the new one.
    ///
    /// Nothing is written if the backup fails. If the write fails after a
    /// backup, the previous content stays under the backup name and `path` is
    /// left absent.
    pub fn preserve_and_write(
        &self,
        path: &Path,
        contents: &[u8],
    ) -> Result<Option<PathBuf>, StoreError> {
        let backup = self.preserve(path)?;
        self.write(path, contents)?;
        Ok(backup)
    }
}

/// `{dir}/{stem}_{stamp}.{ext}` for `{dir}/{stem}.{ext}`.
pub fn backup_path(path: &Path, stamp: &str) -> Result<PathBuf, StoreError> {
    let stem = path
        .file_stem()
        .ok_or_else(|| StoreError::InvalidPath(path.to_path_buf()))?;

    let mut name = OsString::from(stem);
    name.push("_");
    name.push(stamp);
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    Ok(path.with_file_name(name))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use documenter_std::fs::{MemFs, SystemFs};
    use documenter_std::time::MockClock;

    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 45).unwrap()
    }

    fn mem_store(clock: MockClock) -> (MemFs, VersioningStore<MemFs, MockClock>) {
        let fs = MemFs::new();
        (fs.clone(), VersioningStore::new(fs, clock, chrono_tz::UTC))
    }

    #[test]
    fn backup_name_inserts_stamp_before_extension() {
        let path = Path::new("docs/prod-docs.md");
        assert_eq!(
            backup_path(path, "20240601_123045").unwrap(),
            PathBuf::from("docs/prod-docs_20240601_123045.md")
        );
        assert_eq!(
            backup_path(Path::new("README"), "20240601_123045").unwrap(),
            PathBuf::from("README_20240601_123045")
        );
    }

    #[test]
    fn preserve_missing_path_is_noop() {
        let (fs, store) = mem_store(MockClock::at(noon()));

        let backup = store.preserve(Path::new("docs/prod-docs.md")).unwrap();

        assert_eq!(backup, None);
        assert!(fs.is_empty());
    }

    #[test]
    fn preserve_then_write_keeps_old_content_in_one_backup() {
        let (fs, store) = mem_store(MockClock::at(noon()));
        let path = Path::new("docs/prod-docs.md");
        fs.insert(path, "old report");

        let backup = store.preserve_and_write(path, b"new report").unwrap();

        let expected = PathBuf::from("docs/prod-docs_20240601_123045.md");
        assert_eq!(backup.as_deref(), Some(expected.as_path()));
        assert_eq!(fs.get(&expected), Some(b"old report".to_vec()));
        assert_eq!(fs.get(path), Some(b"new report".to_vec()));
        assert_eq!(fs.len(), 2);
    }

    #[test]
    fn backup_stamp_uses_configured_timezone() {
        let fs = MemFs::new();
        let store = VersioningStore::new(fs.clone(), MockClock::at(noon()), chrono_tz::Asia::Tokyo);
        fs.insert("prod-docs.json", "{}");

        let backup = store.preserve(Path::new("prod-docs.json")).unwrap();

        assert_eq!(backup, Some(PathBuf::from("prod-docs_20240601_213045.json")));
    }

    #[test]
    fn same_second_backups_collide() {
        let (fs, store) = mem_store(MockClock::at(noon()));
        let path = Path::new("prod-docs.md");
        fs.insert(path, "v1");

        store.preserve_and_write(path, b"v2").unwrap();
        store.preserve_and_write(path, b"v3").unwrap();

        assert_eq!(fs.len(), 2);
        assert_eq!(fs.get("prod-docs_20240601_123045.md"), Some(b"v2".to_vec()));
        assert_eq!(fs.get(path), Some(b"v3".to_vec()));
    }

    #[test]
    fn later_runs_get_distinct_backups() {
        let clock = MockClock::at(noon());
        let (fs, store) = mem_store(clock.clone());
        let path = Path::new("prod-docs.md");
        fs.insert(path, "v1");

        store.preserve_and_write(path, b"v2").unwrap();
        clock.advance(chrono::Duration::days(1));
        store.preserve_and_write(path, b"v3").unwrap();

        assert_eq!(fs.get("prod-docs_20240601_123045.md"), Some(b"v1".to_vec()));
        assert_eq!(fs.get("prod-docs_20240602_123045.md"), Some(b"v2".to_vec()));
        assert_eq!(fs.get(path), Some(b"v3".to_vec()));
    }

    #[test]
    fn failed_write_after_backup_keeps_backup() {
        let (fs, store) = mem_store(MockClock::at(noon()));
        let path = Path::new("docs/prod-docs.md");
        fs.insert(path, "old report");
        fs.fail_writes_to(path);

        let err = store.preserve_and_write(path, b"new report").unwrap_err();

        assert!(matches!(err, StoreError::Write { .. }));
        assert!(fs.get(path).is_none());
        assert_eq!(
            fs.get("docs/prod-docs_20240601_123045.md"),
            Some(b"old report".to_vec())
        );
    }

    #[test]
    fn write_creates_parent_directory() {
        let (fs, store) = mem_store(MockClock::at(noon()));
        store.write(Path::new("out/nested/a.md"), b"x").unwrap();
        assert!(fs.dir_exists(Path::new("out/nested")));
    }

    #[test]
    fn works_against_real_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("lab-docs.md");
        let store = VersioningStore::new(SystemFs, MockClock::at(noon()), chrono_tz::UTC);

        assert_eq!(store.preserve_and_write(&path, b"first").unwrap(), None);
        let backup = store.preserve_and_write(&path, b"second").unwrap().unwrap();

        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "first");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(
            backup.file_name().unwrap().to_str().unwrap(),
            "lab-docs_20240601_123045.md"
        );
    }
}
