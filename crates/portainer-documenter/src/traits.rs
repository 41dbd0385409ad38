use std::future::Future;

use crate::{config::OutputFormat, document::Document, error::CollectError, targets::Target};

/// Fetch everything worth documenting from one target.
///
/// Retry policy, if any, lives in the implementation; the run coordinator
/// calls this exactly once per target per run.
pub trait Collector: Send + Sync {
    fn collect(&self, target: &Target) -> impl Future<Output = Result<Document, CollectError>> + Send;
}

/// Turn a collected document into report bytes.
///
/// Must be deterministic for identical input.
pub trait Renderer: Send + Sync {
    fn render(&self, document: &Document, format: OutputFormat) -> Vec<u8>;
}
