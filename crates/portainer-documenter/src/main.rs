use clap::Parser;
use documenter_std::{SystemClock, SystemEnv, SystemFs};
use portainer_documenter::{
    OutputSettings, PortainerCollector, ReportRenderer, RunStatus, Service, ServiceConfig,
    ServiceExit, VersioningStore,
    config::{self, Args},
    signal,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let default_level = if config::verbose_requested(&args, &SystemEnv, &SystemFs) {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = config::from_args(args, &SystemEnv, &SystemFs).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });
    log_config(&config);

    let collector = PortainerCollector::new(config.http_timeout, config.sections)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to set up Portainer client");
            std::process::exit(1);
        });
    let store = VersioningStore::new(SystemFs, SystemClock, config.schedule.timezone());
    let output = OutputSettings {
        dir: config.output_dir.clone(),
        format: config.output_format,
    };

    let mut service = Service::new(
        config.targets,
        collector,
        ReportRenderer::new(config.sections),
        store,
        SystemClock,
        output,
        config.schedule,
    );

    let stop = CancellationToken::new();
    let signals = signal::cancel_on_signal(stop.clone());

    if config.once {
        let outcomes = service.run_single(&stop).await;
        stop.cancel();
        let _ = signals.await;
        if outcomes.iter().any(|o| o.status == RunStatus::Failure) {
            std::process::exit(1);
        }
        return;
    }

    let ServiceExit::Shutdown = service.run(stop.clone()).await;
    stop.cancel();
    let _ = signals.await;
}

fn log_config(config: &ServiceConfig) {
    for target in &config.targets {
        tracing::info!(
            target = %target.name(),
            url = %target.base_url(),
            auth = target.auth().kind(),
            "Configured target"
        );
    }
    tracing::info!(
        schedule = %config.schedule,
        output_dir = %config.output_dir.display(),
        format = ?config.output_format,
        sections = ?config.sections,
        http_timeout_secs = config.http_timeout.as_secs(),
        once = config.once,
        verbose = config.verbose,
        "Configuration loaded"
    );
}
