//! Configuration module for environment variable parsing.
//!
//! All settings come from environment variables. Unset or unparseable values
//! fall back to the defaults below.

use std::env;

use anyhow::{anyhow, Context, Result};
use url::Url;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name reported in logs and on the index route
    pub service_name: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Default log filter, used when `RUST_LOG` is not set
    pub log_level: String,

    // =========================================================================
    // RabbitMQ
    // =========================================================================

    /// Exchange every event is published to
    pub rabbitmq_exchange: String,

    /// Exchange kind (`direct`, `topic`, `fanout`, `headers`)
    pub rabbitmq_exchange_type: String,

    /// Queue name. Recognized for deployment tooling, the publisher never binds it.
    pub rabbitmq_queue: String,

    /// URL scheme, `amqp` or `amqps`
    pub rabbitmq_protocol: String,

    /// Broker host. A full `amqp://` URL here is used verbatim.
    pub rabbitmq_host: String,

    pub rabbitmq_port: u16,

    pub rabbitmq_vhost: String,

    pub rabbitmq_username: String,

    pub rabbitmq_password: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Config {
            service_name: string("SERVICE_NAME", "rabbitmq-github-events"),

            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            log_level: string("LOG_LEVEL", "info"),

            rabbitmq_exchange: string("RABBITMQ_EXCHANGE", "github-events"),
            rabbitmq_exchange_type: string("RABBITMQ_EXCHANGE_TYPE", "direct"),
            rabbitmq_queue: string("RABBITMQ_QUEUE", "github-events"),
            rabbitmq_protocol: string("RABBITMQ_PROTOCOL", "amqp"),
            rabbitmq_host: string("RABBITMQ_HOST", "localhost"),

            rabbitmq_port: lookup("RABBITMQ_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(5672),

            rabbitmq_vhost: string("RABBITMQ_VHOST", "/"),
            rabbitmq_username: string("RABBITMQ_USERNAME", "guest"),
            rabbitmq_password: string("RABBITMQ_PASSWORD", "guest"),
        }
    }

    /// Build the AMQP connection URL from the individual RabbitMQ settings.
    ///
    /// The vhost is percent-encoded as a single path segment, so the default
    /// `/` becomes `%2F` and a space becomes `%20`.
    pub fn amqp_url(&self) -> Result<String> {
        if self.rabbitmq_host.contains("://") {
            return Ok(self.rabbitmq_host.clone());
        }

        let base = format!(
            "{}://{}:{}",
            self.rabbitmq_protocol, self.rabbitmq_host, self.rabbitmq_port
        );
        let mut url = Url::parse(&base).context("Invalid RabbitMQ host or protocol")?;

        url.set_username(&self.rabbitmq_username)
            .map_err(|_| anyhow!("RabbitMQ URL cannot carry a username"))?;
        url.set_password(Some(&self.rabbitmq_password))
            .map_err(|_| anyhow!("RabbitMQ URL cannot carry a password"))?;

        url.path_segments_mut()
            .map_err(|_| anyhow!("RabbitMQ URL cannot carry a vhost"))?
            .clear()
            .push(&self.rabbitmq_vhost);

        Ok(url.to_string())
    }
}
