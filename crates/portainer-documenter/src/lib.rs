//! # portainer-documenter
//!
//! Scheduled documentation snapshots of one or more Portainer instances.
//!
//! ## Features
//!
//! - Any number of targets, each with its own URL and credentials (API token
//!   or username/password). A single legacy target is still accepted.
//! - Runs once at startup, then daily at a wall-clock time in an IANA zone.
//!   DST changes keep the configured local time.
//! - Targets are documented concurrently; one failing target never affects
//!   the others or stops the service.
//! - Reports are Markdown or JSON, written to `{output_dir}/{name}-docs.{ext}`.
//!   The previous report is kept as `{name}-docs_{YYYYMMDD_HHMMSS}.{ext}`.
//! - Graceful shutdown on Ctrl-C / SIGTERM: an idle service stops at once,
//!   a run in progress is allowed to finish.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use documenter_std::{SystemClock, SystemFs};
//! use portainer_documenter::{
//!     OutputSettings, PortainerCollector, ReportRenderer, ScheduleSpec, Service,
//!     VersioningStore, config::OutputFormat, load_targets, targets::{TargetConfig, TargetsSource},
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let targets = load_targets(TargetsSource::Legacy(TargetConfig {
//!     url: Some("https://portainer.example.com".into()),
//!     token: Some("ptr_xxx".into()),
//!     ..Default::default()
//! }))?;
//! let schedule = ScheduleSpec::parse("02:00", "Europe/Berlin")?;
//! let sections = Default::default();
//!
//! let mut service = Service::new(
//!     targets,
//!     PortainerCollector::new(std::time::Duration::from_secs(30), sections)?,
//!     ReportRenderer::new(sections),
//!     VersioningStore::new(SystemFs, SystemClock, schedule.timezone()),
//!     SystemClock,
//!     OutputSettings { dir: "./docs".into(), format: OutputFormat::Markdown },
//!     schedule,
//! );
//! service.run(CancellationToken::new()).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod document;
pub mod error;
pub mod portainer;
pub mod render;
pub mod schedule;
pub mod service;
pub mod signal;
pub mod store;
pub mod targets;
pub mod traits;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use config::ServiceConfig;
pub use coordinator::{OutputSettings, RunOutcome, RunStatus, RunSummary, run_once};
pub use document::{Document, Sections};
pub use error::{CollectError, ConfigError, StoreError};
pub use portainer::PortainerCollector;
pub use render::ReportRenderer;
pub use schedule::{ScheduleSpec, next_trigger};
pub use service::{Service, ServiceExit, ServiceState};
pub use store::VersioningStore;
pub use targets::{Auth, Target, load_targets};
pub use traits::{Collector, Renderer};
