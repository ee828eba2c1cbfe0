//! Publish/subscribe fan-out
//!
//! [`EventBus`] is the external bus: opaque JSON strings per channel name.
//! [`EventPublisher`] sits in front of it on the decision path. Publishing
//! only queues the message; a background task delivers it and logs
//! failures, so a broken bus never fails a transaction. The queue is
//! bounded: when a stalled bus lets it fill up, new messages are dropped
//! and counted as publish failures.

use crate::error::{Result, RuntimeError};
use crate::observability::Counter;
use async_trait::async_trait;
use sentra_core::{FraudAlert, Transaction};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Bus channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Internal consumers of new transactions
    TransactionsCreated,
    /// Live dashboards
    TransactionsLive,
    FraudAlerts,
    SimulationEvents,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::TransactionsCreated,
        Channel::TransactionsLive,
        Channel::FraudAlerts,
        Channel::SimulationEvents,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::TransactionsCreated => "transactions.created",
            Channel::TransactionsLive => "transactions.live",
            Channel::FraudAlerts => "fraud.alerts",
            Channel::SimulationEvents => "simulation.events",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publish/subscribe bus
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, channel: Channel, payload: String) -> Result<()>;
}

/// In-process bus over tokio broadcast channels
///
/// Publishing with no subscriber is not an error.
pub struct InMemoryEventBus {
    senders: HashMap<Channel, broadcast::Sender<String>>,
}

impl InMemoryEventBus {
    pub fn new(capacity: usize) -> Self {
        let senders = Channel::ALL
            .into_iter()
            .map(|channel| (channel, broadcast::channel(capacity.max(1)).0))
            .collect();
        Self { senders }
    }

    pub fn subscribe(&self, channel: Channel) -> broadcast::Receiver<String> {
        match self.senders.get(&channel) {
            Some(sender) => sender.subscribe(),
            // every channel is registered in new()
            None => broadcast::channel(1).1,
        }
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, channel: Channel, payload: String) -> Result<()> {
        let sender = self
            .senders
            .get(&channel)
            .ok_or_else(|| RuntimeError::Publish(format!("unknown channel {}", channel)))?;
        let delivered = sender.send(payload).unwrap_or(0);
        tracing::debug!("published to {} ({} subscribers)", channel, delivered);
        Ok(())
    }
}

/// Messages the publisher queues before dropping new ones
pub const DEFAULT_PUBLISH_QUEUE_CAPACITY: usize = 4096;

#[derive(Debug)]
struct OutboundMessage {
    channel: Channel,
    payload: String,
}

/// Fire-and-forget publisher in front of an [`EventBus`]
///
/// Must be created inside a tokio runtime. Messages are delivered in the
/// order they were queued.
pub struct EventPublisher {
    sender: mpsc::Sender<OutboundMessage>,
    failures: Option<Arc<Counter>>,
}

impl EventPublisher {
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self::with_capacity(bus, None, DEFAULT_PUBLISH_QUEUE_CAPACITY)
    }

    /// Publisher that counts dropped and undeliverable messages
    pub fn with_failure_counter(bus: Arc<dyn EventBus>, failures: Arc<Counter>) -> Self {
        Self::with_capacity(bus, Some(failures), DEFAULT_PUBLISH_QUEUE_CAPACITY)
    }

    pub fn with_capacity(
        bus: Arc<dyn EventBus>,
        failures: Option<Arc<Counter>>,
        capacity: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let delivery_failures = failures.clone();
        tokio::spawn(async move {
            Self::deliver(receiver, bus, delivery_failures).await;
        });
        Self { sender, failures }
    }

    async fn deliver(
        mut receiver: mpsc::Receiver<OutboundMessage>,
        bus: Arc<dyn EventBus>,
        failures: Option<Arc<Counter>>,
    ) {
        while let Some(message) = receiver.recv().await {
            if let Err(e) = bus.publish(message.channel, message.payload).await {
                tracing::error!("Failed to publish to {}: {}", message.channel, e);
                if let Some(failures) = &failures {
                    failures.inc();
                }
            }
        }
        tracing::debug!("event publisher task ended (channel closed)");
    }

    /// Queue one payload per channel; any error has already been counted
    fn enqueue<T: Serialize + ?Sized>(&self, channels: &[Channel], payload: &T) -> Result<()> {
        let payload = match serde_json::to_string(payload) {
            Ok(payload) => payload,
            Err(e) => {
                self.count_failures(channels.len());
                return Err(e.into());
            }
        };

        let mut dropped = Vec::new();
        for &channel in channels {
            let message = OutboundMessage {
                channel,
                payload: payload.clone(),
            };
            match self.sender.try_send(message) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => dropped.push(channel),
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.count_failures(1);
                    return Err(RuntimeError::Publish(format!(
                        "publisher closed, dropped message for {}",
                        channel
                    )));
                }
            }
        }

        if dropped.is_empty() {
            return Ok(());
        }
        self.count_failures(dropped.len());
        tracing::warn!("publish queue full, dropped messages for {:?}", dropped);
        Err(RuntimeError::Publish(format!(
            "publish queue full, dropped {} message(s)",
            dropped.len()
        )))
    }

    fn count_failures(&self, count: usize) {
        if let Some(failures) = &self.failures {
            failures.add(count as u64);
        }
    }

    /// Queue a scored transaction on the created and live channels
    pub fn publish_transaction_created(&self, transaction: &Transaction) -> Result<()> {
        self.enqueue(
            &[Channel::TransactionsCreated, Channel::TransactionsLive],
            transaction,
        )
    }

    pub fn publish_fraud_alert(&self, alert: &FraudAlert) -> Result<()> {
        self.enqueue(&[Channel::FraudAlerts], alert)
    }

    pub fn publish_simulation_event(&self, event: &serde_json::Value) -> Result<()> {
        self.enqueue(&[Channel::SimulationEvents], event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::transaction_at;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::time::timeout;

    struct BrokenBus;

    /// Bus whose deliveries never complete
    struct StalledBus;

    #[async_trait]
    impl EventBus for StalledBus {
        async fn publish(&self, _channel: Channel, _payload: String) -> Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[async_trait]
    impl EventBus for BrokenBus {
        async fn publish(&self, _channel: Channel, _payload: String) -> Result<()> {
            Err(RuntimeError::Publish("connection reset".to_string()))
        }
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(Channel::TransactionsCreated.as_str(), "transactions.created");
        assert_eq!(Channel::TransactionsLive.as_str(), "transactions.live");
        assert_eq!(Channel::FraudAlerts.to_string(), "fraud.alerts");
        assert_eq!(Channel::SimulationEvents.as_str(), "simulation.events");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = InMemoryEventBus::default();
        assert!(bus
            .publish(Channel::FraudAlerts, "{}".to_string())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_transaction_goes_to_both_channels() {
        let bus = Arc::new(InMemoryEventBus::default());
        let mut created = bus.subscribe(Channel::TransactionsCreated);
        let mut live = bus.subscribe(Channel::TransactionsLive);
        let mut alerts = bus.subscribe(Channel::FraudAlerts);
        let publisher = EventPublisher::new(bus.clone());

        let transaction = transaction_at("tx-1", "user-1", Utc::now());
        publisher.publish_transaction_created(&transaction).unwrap();

        let wait = Duration::from_secs(1);
        let first = timeout(wait, created.recv()).await.unwrap().unwrap();
        let second = timeout(wait, live.recv()).await.unwrap().unwrap();
        assert_eq!(first, second);

        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value["transactionId"], "tx-1");
        assert!(alerts.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_simulation_event() {
        let bus = Arc::new(InMemoryEventBus::default());
        let mut events = bus.subscribe(Channel::SimulationEvents);
        let publisher = EventPublisher::new(bus.clone());

        publisher
            .publish_simulation_event(&serde_json::json!({"type": "simulation.started"}))
            .unwrap();

        let message = timeout(Duration::from_secs(1), events.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(message.contains("simulation.started"));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_counted_not_returned() {
        let failures = Arc::new(Counter::new("publish_failures"));
        let publisher = EventPublisher::with_failure_counter(Arc::new(BrokenBus), failures.clone());

        let transaction = transaction_at("tx-1", "user-1", Utc::now());
        assert!(publisher.publish_transaction_created(&transaction).is_ok());

        for _ in 0..100 {
            if failures.get() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(failures.get(), 2);
    }

    #[tokio::test]
    async fn test_full_queue_drops_and_counts() {
        let failures = Arc::new(Counter::new("publish_failures"));
        let publisher =
            EventPublisher::with_capacity(Arc::new(StalledBus), Some(failures.clone()), 2);
        let event = serde_json::json!({"type": "simulation.started"});

        // the delivery task has not run yet, so nothing is drained between sends
        assert!(publisher.publish_simulation_event(&event).is_ok());
        assert!(publisher.publish_simulation_event(&event).is_ok());

        let err = publisher.publish_simulation_event(&event).unwrap_err();
        assert!(matches!(err, RuntimeError::Publish(ref m) if m.contains("queue full")));
        assert!(publisher.publish_simulation_event(&event).is_err());
        assert_eq!(failures.get(), 2);
    }
}
