mod polling;

use crate::core::credentials::Credentials;
use crate::core::notifications::{DesktopNotifier, LogOnlyNotifier, Notifier};
use crate::core::settings::Settings;
use crate::query::SonarClient;
use anyhow::{Context, Result};
use tokio::signal;

pub use polling::TicketWatcher;

pub async fn run(settings: &Settings) -> Result<()> {
    let credentials = Credentials::from_env()?;
    let client = SonarClient::new(&credentials, settings.http.timeout())
        .context("Failed to build HTTP client")?;

    let notifier: Box<dyn Notifier> = if settings.notifications.enabled {
        Box::new(DesktopNotifier)
    } else {
        tracing::info!("Desktop notifications disabled in config");
        Box::new(LogOnlyNotifier)
    };

    tracing::info!(
        endpoint = %credentials.graphql_url,
        interval_secs = settings.polling.interval_secs,
        "Starting ticket watcher"
    );

    let mut watcher = TicketWatcher::new(client, notifier, settings.notifications.duration());
    watcher
        .run(settings.polling.interval(), shutdown_signal())
        .await;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
