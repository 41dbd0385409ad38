#[cfg(any(test, feature = "test-support"))]
use std::collections::{BTreeMap, HashSet};
#[cfg(any(test, feature = "test-support"))]
use std::io;
#[cfg(any(test, feature = "test-support"))]
use std::path::{Path, PathBuf};
#[cfg(any(test, feature = "test-support"))]
use std::sync::{Arc, Mutex};

#[cfg(any(test, feature = "test-support"))]
use super::{CreateDirAll, ExistsFile, ReadFile, RenameFile, WriteFile};

/// In-memory filesystem. Clones share the same state.
///
/// Paths are stored as raw [`PathBuf`] keys with **no normalization**;
/// `"a.md"` and `"./a.md"` are distinct entries.
///
/// Writes to a path registered with [`fail_writes_to`](MemFs::fail_writes_to)
/// return `PermissionDenied`, which lets tests exercise a failed write after a
/// successful backup.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct MemFs {
    inner: Arc<Mutex<MemFsInner>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct MemFsInner {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    failing_writes: HashSet<PathBuf>,
}

#[cfg(any(test, feature = "test-support"))]
impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.inner.lock().unwrap().files.get(path.as_ref()).cloned()
    }

    /// All file paths, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().files.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().files.is_empty()
    }

    pub fn dir_exists(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().dirs.contains(path)
    }

    pub fn fail_writes_to(&self, path: impl AsRef<Path>) {
        self.inner
            .lock()
            .unwrap()
            .failing_writes
            .insert(path.as_ref().to_path_buf());
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ReadFile for MemFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self
            .get(path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(any(test, feature = "test-support"))]
impl WriteFile for MemFs {
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_writes.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "write rejected by MemFs",
            ));
        }
        inner.files.insert(path.to_path_buf(), contents.to_vec());
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
impl ExistsFile for MemFs {
    fn exists(&self, path: &Path) -> bool {
        self.inner.lock().unwrap().files.contains_key(path)
    }
}

#[cfg(any(test, feature = "test-support"))]
impl RenameFile for MemFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let content = inner
            .files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))?;
        inner.files.insert(to.to_path_buf(), content);
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
impl CreateDirAll for MemFs {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                inner.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_moves_content() {
        let fs = MemFs::new();
        fs.insert("out/a.md", "old");

        fs.rename(Path::new("out/a.md"), Path::new("out/a_1.md"))
            .unwrap();

        assert!(!fs.exists(Path::new("out/a.md")));
        assert_eq!(fs.read_to_string(Path::new("out/a_1.md")).unwrap(), "old");
    }

    #[test]
    fn rename_of_missing_file_is_not_found() {
        let fs = MemFs::new();
        let err = fs
            .rename(Path::new("missing.md"), Path::new("other.md"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn failing_writes_leave_state_untouched() {
        let fs = MemFs::new();
        fs.fail_writes_to("out/a.md");

        let err = fs.write(Path::new("out/a.md"), b"x").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(fs.is_empty());
    }

    #[test]
    fn clones_share_files() {
        let fs = MemFs::new();
        let clone = fs.clone();
        clone.write(Path::new("a.md"), b"x").unwrap();
        assert_eq!(fs.get("a.md"), Some(b"x".to_vec()));
    }

    #[test]
    fn create_dir_all_records_ancestors() {
        let fs = MemFs::new();
        fs.create_dir_all(Path::new("docs/hosts")).unwrap();
        assert!(fs.dir_exists(Path::new("docs")));
        assert!(fs.dir_exists(Path::new("docs/hosts")));
    }
}
