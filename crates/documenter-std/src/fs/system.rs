use std::path::Path;

use super::{CreateDirAll, ExistsFile, ReadFile, RenameFile, WriteFile};

/// Zero-sized type; delegates to `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFs;

impl ReadFile for SystemFs {
    #[inline]
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }
}

impl WriteFile for SystemFs {
    #[inline]
    fn write(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        std::fs::write(path, contents)
    }
}

impl ExistsFile for SystemFs {
    #[inline]
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

impl RenameFile for SystemFs {
    #[inline]
    fn rename(&self, from: &Path, to: &Path) -> std::io::Result<()> {
        std::fs::rename(from, to)
    }
}

impl CreateDirAll for SystemFs {
    #[inline]
    fn create_dir_all(&self, path: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_replaces_existing_destination() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("a.md");
        let to = dir.path().join("b.md");
        let fs = SystemFs;

        fs.write(&from, b"new").unwrap();
        fs.write(&to, b"old").unwrap();
        fs.rename(&from, &to).unwrap();

        assert!(!fs.exists(&from));
        assert_eq!(fs.read_to_string(&to).unwrap(), "new");
    }

    #[test]
    fn directories_are_not_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!SystemFs.exists(dir.path()));
    }

    #[test]
    fn create_dir_all_builds_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        SystemFs.create_dir_all(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
