//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! TOML files and `LIVEVIEW__`-prefixed environment variables. Each
//! sub-module represents a logical configuration section, and every field
//! has a default so the server starts without any file at all.

pub mod app;
pub mod logging;
pub mod presence;
pub mod realtime;
pub mod session;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::logging::LoggingConfig;
pub use self::presence::{PresenceConfig, RedisPresenceConfig};
pub use self::realtime::RealtimeConfig;
pub use self::session::SessionConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Presence store settings.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Real-time WebSocket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Viewer identity settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files and the environment.
    ///
    /// Merges `config/default.toml`, the `config/{env}.toml` overlay, and
    /// environment variables prefixed with `LIVEVIEW__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("LIVEVIEW")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("realtime.bot_user_agents")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Parse configuration from an in-memory TOML document.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.presence.provider, "redis");
        assert_eq!(config.presence.ttl_seconds, 120);
        assert_eq!(config.session.cookie_name, "sessionid");
        assert!(!config.realtime.rebroadcast_on_ping);
        assert!(config.realtime.bot_user_agents.iter().any(|s| s == "slurp"));
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AppConfig::from_toml(
            r#"
            [presence]
            provider = "memory"
            ttl_seconds = 90

            [realtime]
            broadcast = "redis"
            bot_user_agents = ["curl"]
            "#,
        )
        .unwrap();

        assert_eq!(config.presence.provider, "memory");
        assert_eq!(config.presence.ttl_seconds, 90);
        assert_eq!(config.presence.redis.key_prefix, "liveview:");
        assert_eq!(config.realtime.broadcast, "redis");
        assert_eq!(config.realtime.bot_user_agents, vec!["curl".to_string()]);
    }

    #[test]
    fn test_wrong_type_is_a_configuration_error() {
        let err = AppConfig::from_toml("[server]\nport = \"not a port\"").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Configuration);
    }
}
