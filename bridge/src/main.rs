//! rabbitmq-github-events web server.
//!
//! Starts the one-time RabbitMQ setup in the background, then serves the
//! webhook endpoint. Requests never wait on the broker.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ghevents::web::{router, AppState};
use ghevents::{AmqpBroker, Config, ExchangeSpec, Publisher};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!(service = %config.service_name, "web_server_starting");
    info!(
        port = config.port,
        exchange = %config.rabbitmq_exchange,
        exchange_type = %config.rabbitmq_exchange_type,
        queue = %config.rabbitmq_queue,
        rabbitmq_host = %config.rabbitmq_host,
        rabbitmq_vhost = %config.rabbitmq_vhost,
        "config_loaded"
    );

    let amqp_url = config.amqp_url().context("Invalid RabbitMQ configuration")?;
    let publisher = Publisher::new(
        AmqpBroker::new(amqp_url),
        ExchangeSpec::new(&config.rabbitmq_exchange, &config.rabbitmq_exchange_type),
    );

    // Failures are logged by the publisher; requests keep being accepted.
    tokio::spawn({
        let publisher = publisher.clone();
        async move {
            if publisher.start().await.is_err() {
                warn!("rabbitmq_unavailable_until_restart");
            }
        }
    });

    let state = AppState::new(config.clone(), publisher);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
