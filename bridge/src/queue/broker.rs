//! Broker operations behind a trait, with the lapin implementation.
//!
//! The [`Publisher`](super::Publisher) drives setup and publishing through
//! [`Broker`] so the same state machine runs against RabbitMQ and against an
//! in-memory broker in tests.

use anyhow::{Context, Result};
use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ExchangeDeclareOptions},
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind,
};
use tracing::info;

/// Exchange the publisher declares once and publishes every event to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeSpec {
    pub name: String,
    pub kind: String,
}

impl ExchangeSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// One message bound for the exchange.
#[derive(Debug, Clone, Copy)]
pub struct Outgoing<'a> {
    pub routing_key: &'a str,
    pub payload: &'a [u8],
    pub message_id: Option<&'a str>,
}

/// Connection, exchange declaration and publish primitives.
#[async_trait]
pub trait Broker: Send + Sync + 'static {
    /// Open channel handle, shared by all publishes once setup completes.
    type Channel: Send + Sync + 'static;

    /// Connect to the broker and open a channel on the connection.
    async fn open_channel(&self) -> Result<Self::Channel>;

    /// Declare the exchange on an open channel.
    async fn declare_exchange(&self, channel: &Self::Channel, exchange: &ExchangeSpec) -> Result<()>;

    /// Send one message. Returns once the frame is written, without waiting
    /// for any broker acknowledgment.
    async fn publish(
        &self,
        channel: &Self::Channel,
        exchange: &str,
        message: Outgoing<'_>,
    ) -> Result<()>;
}

/// RabbitMQ broker reached over AMQP 0.9.1.
pub struct AmqpBroker {
    url: String,
}

/// Channel plus the connection that owns it.
pub struct AmqpChannel {
    channel: Channel,
    _connection: Connection,
}

impl AmqpBroker {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait]
impl Broker for AmqpBroker {
    type Channel = AmqpChannel;

    async fn open_channel(&self) -> Result<AmqpChannel> {
        info!(url_length = self.url.len(), "rabbitmq_connecting");

        let connection = Connection::connect(&self.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        info!("rabbitmq_connected");

        let channel = connection
            .create_channel()
            .await
            .context("Failed to create channel")?;

        info!(channel_id = channel.id(), "rabbitmq_channel_created");

        Ok(AmqpChannel {
            channel,
            _connection: connection,
        })
    }

    async fn declare_exchange(&self, channel: &AmqpChannel, exchange: &ExchangeSpec) -> Result<()> {
        channel
            .channel
            .exchange_declare(
                &exchange.name,
                exchange_kind(&exchange.kind),
                ExchangeDeclareOptions {
                    durable: false,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to declare exchange {}", exchange.name))?;

        info!(
            exchange = %exchange.name,
            exchange_type = %exchange.kind,
            "rabbitmq_exchange_declared"
        );

        Ok(())
    }

    async fn publish(
        &self,
        channel: &AmqpChannel,
        exchange: &str,
        message: Outgoing<'_>,
    ) -> Result<()> {
        let mut properties =
            BasicProperties::default().with_content_type("application/json".into());
        if let Some(message_id) = message.message_id {
            properties = properties.with_message_id(message_id.into());
        }

        // The returned confirm is dropped: confirms are not enabled on this channel.
        channel
            .channel
            .basic_publish(
                exchange,
                message.routing_key,
                BasicPublishOptions::default(),
                message.payload,
                properties,
            )
            .await
            .context("Failed to publish to exchange")?;

        Ok(())
    }
}

/// Map a configured exchange type onto lapin's exchange kinds.
fn exchange_kind(kind: &str) -> ExchangeKind {
    match kind.to_ascii_lowercase().as_str() {
        "direct" => ExchangeKind::Direct,
        "fanout" => ExchangeKind::Fanout,
        "headers" => ExchangeKind::Headers,
        "topic" => ExchangeKind::Topic,
        _ => ExchangeKind::Custom(kind.to_string()),
    }
}
