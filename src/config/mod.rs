use crate::event::EventType;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Complete observation client configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationConfig {
    #[serde(default)]
    pub client: ClientConfig,
    /// Listeners registered by `observation-tail`
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionConfig>,
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Observation WebSocket endpoint
    #[serde(default = "default_url")]
    pub url: String,
    /// Delay before reconnecting after the session is lost (milliseconds)
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_url() -> String {
    std::env::var("OBSERVATION_URL")
        .unwrap_or_else(|_| "ws://localhost:8080/xwiki/websocket/p/observation".to_string())
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl ClientConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

/// One configured listener
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    /// Event class name, or `{ id, params }`
    pub event_type: EventType,
    /// Passed back with every event
    #[serde(default)]
    pub data: Value,
}

/// Load configuration from TOML file
pub fn load_config(path: impl AsRef<Path>) -> Result<ObservationConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: ObservationConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ObservationConfig::default();
        assert_eq!(config.client.reconnect_delay_ms, 5000);
        assert_eq!(config.client.reconnect_delay(), Duration::from_secs(5));
        assert!(config.subscriptions.is_empty());
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [client]
            url = "wss://wiki.example.com/xwiki/websocket/p/observation"
            reconnect_delay_ms = 250

            [[subscriptions]]
            event_type = "org.xwiki.bridge.event.DocumentUpdatedEvent"
            data = { tag = "updates", count = 3 }

            [[subscriptions]]
            event_type = { id = "org.xwiki.refactoring.event.DocumentRenamedEvent", params = { wiki = "xwiki" } }
        "#;

        let config: ObservationConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.client.url,
            "wss://wiki.example.com/xwiki/websocket/p/observation"
        );
        assert_eq!(config.client.reconnect_delay(), Duration::from_millis(250));
        assert_eq!(config.subscriptions.len(), 2);

        assert_eq!(
            config.subscriptions[0].event_type,
            EventType::new("org.xwiki.bridge.event.DocumentUpdatedEvent")
        );
        assert_eq!(
            config.subscriptions[0].data,
            json!({"tag": "updates", "count": 3})
        );

        assert_eq!(
            config.subscriptions[1].event_type,
            EventType::new("org.xwiki.refactoring.event.DocumentRenamedEvent")
                .with_param("wiki", "xwiki")
        );
        assert_eq!(config.subscriptions[1].data, Value::Null);
    }

    #[test]
    fn test_partial_config() {
        // Test that missing sections use defaults
        let toml = r#"
            [client]
            reconnect_delay_ms = 1000
        "#;

        let config: ObservationConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.client.reconnect_delay_ms, 1000);
        assert!(!config.client.url.is_empty()); // Default
        assert!(config.subscriptions.is_empty()); // Default
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[client]\nurl = \"ws://127.0.0.1:9000/observation\"\n\n[[subscriptions]]\nevent_type = \"my.EventType\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.client.url, "ws://127.0.0.1:9000/observation");
        assert_eq!(config.subscriptions[0].event_type, EventType::new("my.EventType"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/nonexistent/observation.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client\nurl = ").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
