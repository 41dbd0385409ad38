//! Thin seams over `std` used by the Portainer documenter.
//!
//! | Concern | Trait(s) | Production | Test |
//! |---------|----------|------------|------|
//! | Env vars | [`ReadEnv`] | [`SystemEnv`] | [`InMemoryEnv`]* |
//! | Filesystem | [`ReadFile`], [`WriteFile`], [`ExistsFile`], [`RenameFile`], [`CreateDirAll`] | [`SystemFs`] | [`MemFs`]* |
//! | Wall clock | [`GetNow`] | [`SystemClock`] | [`MockClock`]* |
//!
//! *Available with `#[cfg(test)]` or the `"test-support"` feature.
//!
//! Every test double is `Send + Sync` so it can be shared with tasks on a
//! multi-threaded tokio runtime.

pub mod env;
pub mod fs;
pub mod time;

pub use env::{ReadEnv, SystemEnv};
pub use fs::{CreateDirAll, ExistsFile, ReadFile, RenameFile, SystemFs, WriteFile};
pub use time::{GetNow, SystemClock};

#[cfg(any(test, feature = "test-support"))]
pub use env::InMemoryEnv;
#[cfg(any(test, feature = "test-support"))]
pub use fs::MemFs;
#[cfg(any(test, feature = "test-support"))]
pub use time::MockClock;
