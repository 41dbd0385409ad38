//! The long-running schedule loop.

use documenter_std::fs::{CreateDirAll, ExistsFile, RenameFile, WriteFile};
use documenter_std::time::GetNow;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    coordinator::{OutputSettings, RunOutcome, RunSummary, run_once},
    schedule::{ScheduleSpec, duration_until, next_trigger},
    store::VersioningStore,
    targets::Target,
    traits::{Collector, Renderer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Starting,
    Running,
    Sleeping,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceExit {
    Shutdown,
}

/// Runs once immediately, then daily on the schedule until stopped.
///
/// Stopping while asleep returns at once. Stopping during a run lets that run
/// finish and starts no further one.
pub struct Service<C, R, F, K> {
    targets: Vec<Target>,
    collector: C,
    renderer: R,
    store: VersioningStore<F, K>,
    clock: K,
    output: OutputSettings,
    schedule: ScheduleSpec,
    state: ServiceState,
    completed_runs: u64,
}

impl<C, R, F, K> Service<C, R, F, K>
where
    C: Collector,
    R: Renderer,
    F: ExistsFile + RenameFile + WriteFile + CreateDirAll,
    K: GetNow,
{
    pub fn new(
        targets: Vec<Target>,
        collector: C,
        renderer: R,
        store: VersioningStore<F, K>,
        clock: K,
        output: OutputSettings,
        schedule: ScheduleSpec,
    ) -> Self {
        Self {
            targets,
            collector,
            renderer,
            store,
            clock,
            output,
            schedule,
            state: ServiceState::Starting,
            completed_runs: 0,
        }
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    pub fn completed_runs(&self) -> u64 {
        self.completed_runs
    }

    /// A single pass over every target, with its summary logged.
    pub async fn run_pass(&mut self) -> Vec<RunOutcome> {
        self.state = ServiceState::Running;
        let run = self.completed_runs + 1;
        info!(run, targets = self.targets.len(), "Starting documentation run");

        let outcomes = run_once(
            &self.targets,
            &self.collector,
            &self.renderer,
            &self.store,
            &self.output,
            &self.clock,
        )
        .await;

        let summary = RunSummary::from_outcomes(&outcomes);
        info!(
            run,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            partial = summary.partial,
            failed = summary.failed,
            "Documentation run finished"
        );
        self.completed_runs += 1;
        outcomes
    }

    /// One pass, then stop. A stop request during the pass is noted but the
    /// pass always completes, so no report is left half written.
    pub async fn run_single(&mut self, stop: &CancellationToken) -> Vec<RunOutcome> {
        let outcomes = self.run_pass().await;
        if stop.is_cancelled() {
            info!("Stop requested during run; run completed before exiting");
        }
        self.state = ServiceState::Stopped;
        outcomes
    }

    pub async fn run(&mut self, stop: CancellationToken) -> ServiceExit {
        loop {
            self.state = match self.state {
                ServiceState::Starting => {
                    info!(schedule = %self.schedule, "Service started");
                    ServiceState::Running
                }
                ServiceState::Running => {
                    self.run_pass().await;
                    if stop.is_cancelled() {
                        info!("Stop requested during run; not scheduling another");
                        ServiceState::Stopped
                    } else {
                        ServiceState::Sleeping
                    }
                }
                ServiceState::Sleeping => self.sleep_until_next(&stop).await,
                ServiceState::Stopped => {
                    info!(completed_runs = self.completed_runs, "Service stopped");
                    return ServiceExit::Shutdown;
                }
            };
        }
    }

    async fn sleep_until_next(&self, stop: &CancellationToken) -> ServiceState {
        let now = self.clock.now();
        let trigger = next_trigger(now, &self.schedule);
        let wait = duration_until(now, trigger);
        info!(
            next_run = %trigger.with_timezone(&self.schedule.timezone()),
            wait_secs = wait.as_secs(),
            "Sleeping until next run"
        );

        tokio::select! {
            _ = stop.cancelled() => {
                debug!("Stop requested while sleeping");
                ServiceState::Stopped
            }
            _ = tokio::time::sleep(wait) => ServiceState::Running,
        }
    }
}
