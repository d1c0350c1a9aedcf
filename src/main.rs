use std::sync::Arc;

use tracing::{error, info};

use script_exporter::config::{Config, LoggingConfig};
use script_exporter::server::{ExporterServer, ExporterState};
use script_exporter::{logging, PrometheusSink, ShellRunner, Supervisor};

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Logging first, so configuration errors below are reported through it
    let logging_config = LoggingConfig::from_env()?;
    logging::init(&logging_config)?;

    info!("Starting script_exporter {}", script_exporter::VERSION);

    let config = Config::from_env().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;
    config.log_summary();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.worker_count())
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sink = PrometheusSink::new();
    let runner = ShellRunner::new(config.server.shell.clone());
    let checks_total = config.checks.len();
    let checks_active = config.checks.iter().filter(|c| c.active).count();

    let mut supervisor = Supervisor::new(
        config.checks,
        Arc::new(sink.clone()),
        Arc::new(runner),
        config.scheduler,
    );

    let state = Arc::new(ExporterState::new(
        sink,
        checks_total,
        checks_active,
        supervisor.running_ref(),
    ));
    let server = ExporterServer::bind(config.server.listen_addr, state).await?;
    let server_shutdown = server.shutdown_handle();

    // Loops are counted before /health can be queried
    supervisor.start();
    let server_task = tokio::spawn(server.run());

    shutdown_signal().await;
    info!("Shutting down...");

    let reports = supervisor.stop().await;
    for report in &reports {
        info!(
            check = %report.check,
            ticks = report.ticks,
            reason = ?report.reason,
            "check stopped"
        );
    }

    server_shutdown.trigger();
    if let Err(e) = server_task.await {
        error!(error = %e, "exporter server task failed");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
