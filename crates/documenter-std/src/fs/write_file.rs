use std::io;
use std::path::Path;

/// Creates or truncates `path` with `contents`.
pub trait WriteFile {
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}
