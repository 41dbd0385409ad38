//! Environment variable access.
//!
//! ```
//! use documenter_std::env::{ReadEnv, SystemEnv};
//!
//! fn output_dir<E: ReadEnv>(env: &E) -> String {
//!     env.non_empty("PORTAINER_OUTPUT_DIR")
//!         .unwrap_or_else(|| "./docs".to_string())
//! }
//!
//! let dir = output_dir(&SystemEnv);
//! ```

mod in_memory;
mod read_env;
mod system;

#[cfg(any(test, feature = "test-support"))]
pub use in_memory::InMemoryEnv;
pub use read_env::ReadEnv;
pub use system::SystemEnv;
