use anyhow::{Context, Result};
use observation::config::{load_config, ObservationConfig};
use observation::ObservationClient;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "observation=info,observation_tail=info".into()),
        )
        .init();

    info!("Observation tail starting...");

    // Config path: first argument, then OBSERVATION_CONFIG, else defaults
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("OBSERVATION_CONFIG").ok());

    let config = match config_path {
        Some(path) => {
            load_config(&path).with_context(|| format!("Failed to load configuration {}", path))?
        }
        None => ObservationConfig::default(),
    };

    info!(
        url = %config.client.url,
        reconnect_delay_ms = config.client.reconnect_delay_ms,
        subscriptions = config.subscriptions.len(),
        "Configuration loaded"
    );

    if config.subscriptions.is_empty() {
        warn!("No subscriptions configured, no events will be received");
    }

    let (client, supervisor) = ObservationClient::spawn(&config.client);

    for subscription in config.subscriptions {
        let event_type = subscription.event_type.to_string();
        let label = event_type.clone();
        client
            .on(
                subscription.event_type,
                move |event, source, source_data, data| {
                    info!(
                        event_type = %label,
                        event = %event,
                        source = %source,
                        source_data = %source_data,
                        data = %data,
                        "Event received"
                    );
                },
                subscription.data,
            )
            .with_context(|| format!("Failed to subscribe to {}", event_type))?;
        info!(event_type = %event_type, "Subscribed");
    }

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    client.shutdown()?;
    supervisor.await.context("Supervisor task failed")?;
    info!("Observation tail stopped");

    Ok(())
}
