use std::io;
use std::path::Path;

/// Moves `from` to `to`, replacing `to` if it already exists.
pub trait RenameFile {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}
