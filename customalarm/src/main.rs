// CustomAlarm - headless host for the alarm repository
// Builds the configured backend and logs every list snapshot until Ctrl-C

use customalarm::config::DEFAULT_LOG_FILTER;
use customalarm::{AppConfig, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CustomAlarm");

    let config = AppConfig::from_env()?;
    let state = AppState::initialize(&config).await?;

    let alarms = state.alarms_view_model();
    let mut changes = alarms.changes();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            snapshot = changes.next() => match snapshot {
                Some(list) => {
                    let enabled = list.iter().filter(|a| a.enabled).count();
                    tracing::info!(
                        "Alarms snapshot v{}: {} alarms, {} enabled",
                        changes.version(),
                        list.len(),
                        enabled
                    );
                }
                None => break,
            },
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    state.shutdown().await;
    Ok(())
}
