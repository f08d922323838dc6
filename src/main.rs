//! Waves reward bot storage service
//!
//! Bridges the event bus over stdio: inbound envelopes arrive as JSON lines
//! on stdin, outcome events leave as JSON lines on stdout. Logs go to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use waves_reward_storage::{
    AppError, AppResult, BusEvent, ChannelPublisher, Config, EventPublisher, StorageService,
};

const INBOUND_CAPACITY: usize = 1024;

/// Initialize tracing/logging
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "waves_reward_storage=debug".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

async fn write_line(stdout: &mut Stdout, line: &str) -> std::io::Result<()> {
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    run().await?;

    Ok(())
}

fn join_failed(err: tokio::task::JoinError) -> AppError {
    AppError::Internal(err.to_string())
}

async fn run() -> AppResult<()> {
    let config = Config::from_env()?;

    tracing::info!("Starting wallet storage service");

    let (publisher, mut outbound) = ChannelPublisher::new();
    let publisher: Arc<dyn EventPublisher> = Arc::new(publisher);

    // Outbound events -> stdout; ends once every publisher handle is dropped
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(event) = outbound.recv().await {
            let line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(err) => {
                    tracing::error!(error = %err, event = %event.kind, "Could not encode event");
                    continue;
                }
            };
            if let Err(err) = write_line(&mut stdout, &line).await {
                tracing::error!(error = %err, "Could not write to stdout");
                break;
            }
        }
    });

    let service = match StorageService::connect(&config, publisher).await {
        Ok(service) => Arc::new(service),
        Err(err) => {
            // STORAGE_NOT_CONNECTED is already queued; let it reach stdout
            writer.await.map_err(join_failed)?;
            return Err(err.into());
        }
    };

    let (events, inbound) = mpsc::channel::<BusEvent>(INBOUND_CAPACITY);
    let runner = tokio::spawn(service.clone().run(inbound));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => match serde_json::from_str::<BusEvent>(&line) {
                    Ok(event) => {
                        if events.send(event).await.is_err() {
                            tracing::error!("Event loop stopped unexpectedly");
                            break;
                        }
                    }
                    Err(err) => tracing::warn!(error = %err, "Skipping malformed envelope"),
                },
                None => {
                    tracing::info!("Input closed");
                    break;
                }
            },
            _ = &mut shutdown => break,
        }
    }

    // Cleanup
    tracing::info!("Service shutting down...");
    drop(events);
    runner.await.map_err(join_failed)?;
    service.close().await;
    drop(service);
    writer.await.map_err(join_failed)?;
    tracing::info!("Goodbye!");

    Ok(())
}

/// Shutdown signal handler for graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
