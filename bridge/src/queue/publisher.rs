//! Async RabbitMQ publisher for GitHub events.
//!
//! The publisher connects, opens a channel and declares the exchange exactly
//! once. Every publish awaits that single setup, so requests arriving while
//! it is still running all share its outcome instead of starting their own.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::broker::{AmqpBroker, Broker, ExchangeSpec, Outgoing};
use super::sink::{EventSink, PublisherState};
use crate::event::GithubEvent;

type SetupOutcome<C> = Result<C, Arc<anyhow::Error>>;

/// Publisher owning the broker connection, channel and exchange.
///
/// Cloning is cheap and every clone shares the same setup.
pub struct Publisher<B: Broker = AmqpBroker> {
    inner: Arc<PublisherInner<B>>,
}

struct PublisherInner<B: Broker> {
    broker: B,
    exchange: ExchangeSpec,
    started: AtomicBool,
    setup: OnceCell<SetupOutcome<B::Channel>>,
}

impl<B: Broker> Clone for Publisher<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Broker> Publisher<B> {
    pub fn new(broker: B, exchange: ExchangeSpec) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                broker,
                exchange,
                started: AtomicBool::new(false),
                setup: OnceCell::new(),
            }),
        }
    }

    /// Run the one-time setup, or wait for the run already in progress.
    pub async fn start(&self) -> Result<()> {
        self.ready().await.map(|_| ())
    }

    pub fn state(&self) -> PublisherState {
        match self.inner.setup.get() {
            Some(Ok(_)) => PublisherState::Ready,
            Some(Err(_)) => PublisherState::Failed,
            None if self.inner.started.load(Ordering::Acquire) => PublisherState::Connecting,
            None => PublisherState::Disconnected,
        }
    }

    /// Publish an event to the exchange, routed by its event type.
    ///
    /// Fails if the event has no routing key, if setup failed (now or
    /// earlier), if the record cannot be serialized, or if the broker refuses
    /// the frame.
    pub async fn publish(&self, event: &GithubEvent) -> Result<()> {
        let routing_key = event
            .routing_key()
            .ok_or_else(|| anyhow!("Event has no x-github-event header to route by"))?;

        let channel = self.ready().await?;

        let body = event.payload().context("Failed to serialize event")?;

        self.inner
            .broker
            .publish(
                channel,
                &self.inner.exchange.name,
                Outgoing {
                    routing_key,
                    payload: &body,
                    message_id: event.delivery_id(),
                },
            )
            .await?;

        info!(
            exchange = %self.inner.exchange.name,
            routing_key = %routing_key,
            delivery_id = ?event.delivery_id(),
            body_length = body.len(),
            "rabbitmq_event_published"
        );

        Ok(())
    }

    async fn ready(&self) -> Result<&B::Channel> {
        self.inner
            .setup
            .get_or_init(|| self.setup())
            .await
            .as_ref()
            .map_err(|e| anyhow!("RabbitMQ unavailable: {e:#}"))
    }

    async fn setup(&self) -> SetupOutcome<B::Channel> {
        self.inner.started.store(true, Ordering::Release);

        let exchange = &self.inner.exchange;
        info!(exchange = %exchange.name, exchange_type = %exchange.kind, "rabbitmq_setup_start");

        let outcome = async {
            let channel = self.inner.broker.open_channel().await?;
            self.inner.broker.declare_exchange(&channel, exchange).await?;
            Ok::<_, anyhow::Error>(channel)
        }
        .await;

        match outcome {
            Ok(channel) => {
                info!(exchange = %exchange.name, "rabbitmq_publisher_ready");
                Ok(channel)
            }
            Err(e) => {
                error!(exchange = %exchange.name, error = %format!("{e:#}"), "rabbitmq_setup_failed");
                Err(Arc::new(e))
            }
        }
    }
}

#[async_trait]
impl<B: Broker> EventSink for Publisher<B> {
    async fn send(&self, event: &GithubEvent) -> Result<()> {
        self.publish(event).await
    }

    fn state(&self) -> PublisherState {
        Publisher::state(self)
    }
}
