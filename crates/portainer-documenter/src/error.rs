//! Error types for the documenter.
//!
//! Only [`ConfigError`] is fatal. [`CollectError`] and [`StoreError`] are
//! raised per target during a run and folded into that target's outcome.

use std::path::PathBuf;

use thiserror::Error;

use crate::document::Document;

/// Invalid or missing configuration detected at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no targets configured: set PORTAINER_HOSTS or PORTAINER_URL")]
    NoTargets,

    #[error("target '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    #[error("duplicate target name '{0}'")]
    DuplicateTarget(String),

    #[error("invalid target list: {0}")]
    InvalidTargetList(String),

    #[error("invalid schedule time '{value}': expected HH:MM (24-hour)")]
    InvalidScheduleTime { value: String },

    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("invalid output format '{0}': expected 'markdown' or 'json'")]
    InvalidOutputFormat(String),

    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {reason}")]
    ParseFile { path: PathBuf, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Failure to collect a target's data.
#[derive(Debug, Error)]
pub enum CollectError {
    /// Credentials were rejected or no session could be established.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The target could not be reached or a required resource failed.
    #[error("connectivity error: {0}")]
    Connectivity(String),

    /// Some optional sub-resources failed; the rest were collected.
    #[error("partial data, missing: {}", missing.join(", "))]
    PartialData {
        document: Box<Document>,
        missing: Vec<String>,
    },
}

impl CollectError {
    /// Short classifier used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Connectivity(_) => "connectivity",
            Self::PartialData { .. } => "partial_data",
        }
    }
}

/// Filesystem failure while versioning or writing an artifact.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to back up {path} to {backup}: {source}")]
    Backup {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("output path {0} has no file name")]
    InvalidPath(PathBuf),
}
