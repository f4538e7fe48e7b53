//! Queue module for RabbitMQ operations.
//!
//! This module provides:
//! - The [`Broker`] seam and its lapin implementation
//! - The [`Publisher`] with its one-time connection/channel/exchange setup
//! - The [`EventSink`] trait the web layer publishes through
//!
//! ## Wire contract
//!
//! ```text
//! exchange: RABBITMQ_EXCHANGE (non-durable)   routing key: x-github-event   body: JSON record
//! ```

pub mod broker;
pub mod publisher;
pub mod sink;

pub use broker::{AmqpBroker, Broker, ExchangeSpec, Outgoing};
pub use publisher::Publisher;
pub use sink::{EventSink, PublisherState};
