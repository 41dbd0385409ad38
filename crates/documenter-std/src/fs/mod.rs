//! Filesystem operations needed to version and write report artifacts.
//!
//! ```
//! use documenter_std::fs::{ExistsFile, RenameFile, SystemFs};
//! use std::path::Path;
//!
//! fn move_aside<F: ExistsFile + RenameFile>(fs: &F, from: &Path, to: &Path) -> std::io::Result<bool> {
//!     if !fs.exists(from) {
//!         return Ok(false);
//!     }
//!     fs.rename(from, to)?;
//!     Ok(true)
//! }
//!
//! let moved = move_aside(&SystemFs, Path::new("/nonexistent/a.md"), Path::new("/nonexistent/b.md"));
//! assert!(!moved.unwrap());
//! ```

mod create_dir_all;
mod exists_file;
mod mem;
mod read_file;
mod rename_file;
mod system;
mod write_file;

pub use create_dir_all::CreateDirAll;
pub use exists_file::ExistsFile;
#[cfg(any(test, feature = "test-support"))]
pub use mem::MemFs;
pub use read_file::ReadFile;
pub use rename_file::RenameFile;
pub use system::SystemFs;
pub use write_file::WriteFile;
