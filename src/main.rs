use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use issue_duty::config::Options;
use issue_duty::dispatch::{DELIVERY_CHANNEL_BUFFER, Dispatcher, SystemClock};
use issue_duty::mail::SmtpMailer;
use issue_duty::server::{AppState, build_router};

/// Emails whoever is on duty today about new GitHub issue activity.
#[derive(Debug, Parser)]
#[command(name = "issue-duty", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "issue_duty=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Configuration problems are fatal: refuse to start rather than run with
    // a partially valid duty roster.
    let options = match Options::load(&cli.config) {
        Ok(options) => options,
        Err(e) => {
            error!(config = %cli.config, error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let roster = options.duty.to_roster();
    if roster.is_empty() {
        warn!("Duty roster is entirely empty; no notifications will ever be sent");
    }

    let mailer = match SmtpMailer::new(&options.smtp, &options.email) {
        Ok(mailer) => Arc::new(mailer),
        Err(e) => {
            error!(error = %e, "Failed to set up SMTP transport");
            return ExitCode::FAILURE;
        }
    };

    let (tx, rx) = mpsc::channel(DELIVERY_CHANNEL_BUFFER);
    let shutdown = CancellationToken::new();

    let dispatcher = Dispatcher::new(roster, Box::new(SystemClock), mailer);
    let dispatcher_cancel = shutdown.clone();
    let dispatcher_task = tokio::spawn(async move {
        dispatcher.run(rx, dispatcher_cancel).await;
    });

    let secret = options.secret_code.as_ref().map(|s| s.as_bytes().to_vec());
    let app = build_router(AppState::new(tx, secret));

    let addr = SocketAddr::from(([0, 0, 0, 0], options.http.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    info!("Listening on {}", addr);

    let server_shutdown = shutdown.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            server_shutdown.cancel();
        })
        .await;

    if let Err(e) = served {
        error!(error = %e, "Server error");
        shutdown.cancel();
        let _ = dispatcher_task.await;
        return ExitCode::FAILURE;
    }

    // In-flight jobs may be dropped here; delivery is best-effort.
    let _ = dispatcher_task.await;
    info!("Shut down");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}
