//! One documentation run over every configured target.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use documenter_std::fs::{CreateDirAll, ExistsFile, RenameFile, WriteFile};
use documenter_std::time::GetNow;
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::{
    config::{OutputFormat, output_path},
    error::CollectError,
    store::VersioningStore,
    targets::Target,
    traits::{Collector, Renderer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// Some sections were missing; the report was still written.
    PartialFailure,
    Failure,
}

/// Result of documenting one target in one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub target_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: RunStatus,
    pub error: Option<String>,
    pub output_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[RunOutcome]) -> Self {
        outcomes.iter().fold(
            Self {
                attempted: outcomes.len(),
                ..Self::default()
            },
            |mut summary, outcome| {
                match outcome.status {
                    RunStatus::Success => summary.succeeded += 1,
                    RunStatus::PartialFailure => summary.partial += 1,
                    RunStatus::Failure => summary.failed += 1,
                }
                summary
            },
        )
    }

    pub fn any_failed(&self) -> bool {
        self.failed > 0
    }
}

/// Where and how reports are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub format: OutputFormat,
}

/// Documents every target concurrently and returns one outcome per target in
/// registry order. Failures are folded into the outcomes, never returned.
pub async fn run_once<C, R, F, K>(
    targets: &[Target],
    collector: &C,
    renderer: &R,
    store: &VersioningStore<F, K>,
    output: &OutputSettings,
    clock: &K,
) -> Vec<RunOutcome>
where
    C: Collector,
    R: Renderer,
    F: ExistsFile + RenameFile + WriteFile + CreateDirAll,
    K: GetNow,
{
    join_all(
        targets
            .iter()
            .map(|target| run_target(target, collector, renderer, store, output, clock)),
    )
    .await
}

async fn run_target<C, R, F, K>(
    target: &Target,
    collector: &C,
    renderer: &R,
    store: &VersioningStore<F, K>,
    output: &OutputSettings,
    clock: &K,
) -> RunOutcome
where
    C: Collector,
    R: Renderer,
    F: ExistsFile + RenameFile + WriteFile + CreateDirAll,
    K: GetNow,
{
    let started_at = clock.now();
    let finish = |status, error: Option<String>, output_path| RunOutcome {
        target_name: target.name().to_string(),
        started_at,
        finished_at: clock.now(),
        status,
        error,
        output_path,
    };

    debug!(target = %target.name(), "Collecting");
    let (document, missing) = match collector.collect(target).await {
        Ok(document) => (document, None),
        Err(CollectError::PartialData { document, missing }) => (*document, Some(missing)),
        Err(e) => {
            error!(target = %target.name(), kind = e.kind(), error = %e, "Collection failed");
            return finish(RunStatus::Failure, Some(e.to_string()), None);
        }
    };

    let path = output_path(&output.dir, target, output.format);
    let bytes = renderer.render(&document, output.format);
    if let Err(e) = store.preserve_and_write(&path, &bytes) {
        error!(target = %target.name(), kind = "write", error = %e, "Could not write report");
        return finish(RunStatus::Failure, Some(e.to_string()), None);
    }

    match missing {
        None => {
            info!(target = %target.name(), path = %path.display(), "Report written");
            finish(RunStatus::Success, None, Some(path))
        }
        Some(missing) => {
            let reason = format!("missing sections: {}", missing.join(", "));
            warn!(
                target = %target.name(),
                kind = "partial_data",
                path = %path.display(),
                %reason,
                "Report written with missing sections"
            );
            finish(RunStatus::PartialFailure, Some(reason), Some(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use chrono::TimeZone;
    use documenter_std::fs::MemFs;
    use documenter_std::time::MockClock;

    use super::*;
    use crate::mocks::MockCollector;
    use crate::render::ReportRenderer;
    use crate::targets::{TargetConfig, TargetsSource, load_targets};

    fn targets(names: &[&str]) -> Vec<Target> {
        let configs = names
            .iter()
            .map(|name| TargetConfig {
                name: Some(name.to_string()),
                url: Some(format!("https://{name}.example.com")),
                token: Some("ptr_test".to_string()),
                ..Default::default()
            })
            .collect();
        load_targets(TargetsSource::Many(configs)).unwrap()
    }

    struct Fixture {
        fs: MemFs,
        clock: MockClock,
        store: VersioningStore<MemFs, MockClock>,
        output: OutputSettings,
    }

    fn fixture() -> Fixture {
        let fs = MemFs::new();
        let clock = MockClock::at(Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap());
        Fixture {
            store: VersioningStore::new(fs.clone(), clock.clone(), chrono_tz::UTC),
            fs,
            clock,
            output: OutputSettings {
                dir: PathBuf::from("docs"),
                format: OutputFormat::Markdown,
            },
        }
    }

    async fn run(f: &Fixture, targets: &[Target], collector: &MockCollector) -> Vec<RunOutcome> {
        run_once(targets, collector, &ReportRenderer::default(), &f.store, &f.output, &f.clock).await
    }

    #[tokio::test]
    async fn one_failing_target_does_not_affect_the_others() {
        let f = fixture();
        let targets = targets(&["alpha", "beta", "gamma"]);
        let collector = MockCollector::new();
        collector.fail_connectivity("beta");

        let outcomes = run(&f, &targets, &collector).await;

        let names: Vec<_> = outcomes.iter().map(|o| o.target_name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
        assert_eq!(outcomes[0].status, RunStatus::Success);
        assert_eq!(outcomes[1].status, RunStatus::Failure);
        assert_eq!(outcomes[2].status, RunStatus::Success);
        assert!(outcomes[1].error.as_deref().unwrap().contains("connectivity"));
        assert!(f.fs.get("docs/alpha-docs.md").is_some());
        assert!(f.fs.get("docs/beta-docs.md").is_none());
        assert!(f.fs.get("docs/gamma-docs.md").is_some());
        assert_eq!(collector.call_count(), 3);
    }

    #[tokio::test]
    async fn auth_failure_writes_nothing() {
        let f = fixture();
        let targets = targets(&["prod"]);
        let collector = MockCollector::new();
        collector.fail_auth("prod");

        let outcomes = run(&f, &targets, &collector).await;

        assert_eq!(outcomes[0].status, RunStatus::Failure);
        assert_eq!(outcomes[0].output_path, None);
        assert!(f.fs.is_empty());
    }

    #[tokio::test]
    async fn partial_data_still_writes_report() {
        let f = fixture();
        let targets = targets(&["prod"]);
        let collector = MockCollector::new();
        collector.partial("prod", &["registries"]);

        let outcomes = run(&f, &targets, &collector).await;

        assert_eq!(outcomes[0].status, RunStatus::PartialFailure);
        assert_eq!(
            outcomes[0].error.as_deref(),
            Some("missing sections: registries")
        );
        assert_eq!(
            outcomes[0].output_path.as_deref(),
            Some(Path::new("docs/prod-docs.md"))
        );
        assert!(f.fs.get("docs/prod-docs.md").is_some());
    }

    #[tokio::test]
    async fn write_failure_is_recorded_and_backup_kept() {
        let f = fixture();
        let targets = targets(&["prod"]);
        f.fs.insert("docs/prod-docs.md", "yesterday");
        f.fs.fail_writes_to("docs/prod-docs.md");

        let outcomes = run(&f, &targets, &MockCollector::new()).await;

        assert_eq!(outcomes[0].status, RunStatus::Failure);
        assert!(outcomes[0].error.as_deref().unwrap().contains("failed to write"));
        assert_eq!(
            f.fs.get("docs/prod-docs_20240601_020000.md"),
            Some(b"yesterday".to_vec())
        );
    }

    #[tokio::test]
    async fn second_run_backs_up_first_report() {
        let f = fixture();
        let targets = targets(&["prod"]);
        let collector = MockCollector::new();

        run(&f, &targets, &collector).await;
        f.clock.advance(chrono::Duration::days(1));
        run(&f, &targets, &collector).await;

        assert!(f.fs.get("docs/prod-docs.md").is_some());
        assert!(f.fs.get("docs/prod-docs_20240602_020000.md").is_some());
        assert_eq!(f.fs.len(), 2);
    }

    #[tokio::test]
    async fn json_format_uses_json_extension() {
        let mut f = fixture();
        f.output.format = OutputFormat::Json;
        let targets = targets(&["prod"]);

        let outcomes = run(&f, &targets, &MockCollector::new()).await;

        assert_eq!(
            outcomes[0].output_path.as_deref(),
            Some(Path::new("docs/prod-docs.json"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn targets_are_collected_concurrently() {
        let f = fixture();
        let targets = targets(&["a", "b", "c"]);
        let collector = MockCollector::new().with_delay(std::time::Duration::from_secs(10));

        let started = tokio::time::Instant::now();
        let outcomes = run(&f, &targets, &collector).await;

        assert_eq!(outcomes.len(), 3);
        assert!(started.elapsed() < std::time::Duration::from_secs(20));
    }

    #[test]
    fn summary_counts_each_status() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap();
        let outcome = |status| RunOutcome {
            target_name: "t".to_string(),
            started_at: at,
            finished_at: at,
            status,
            error: None,
            output_path: None,
        };
        let outcomes = [
            outcome(RunStatus::Success),
            outcome(RunStatus::Failure),
            outcome(RunStatus::PartialFailure),
            outcome(RunStatus::Success),
        ];

        let summary = RunSummary::from_outcomes(&outcomes);

        assert_eq!(
            summary,
            RunSummary {
                attempted: 4,
                succeeded: 2,
                partial: 1,
                failed: 1,
            }
        );
        assert!(summary.any_failed());
        assert!(!RunSummary::from_outcomes(&[]).any_failed());
    }
}
