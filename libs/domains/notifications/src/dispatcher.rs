//! Producer side of the fan-out.
//!
//! `notify_new_item` is synchronous and never fails: implementations hand
//! the job off and return. Errors past that point are logged and dropped.

use redis::aio::ConnectionManager;
use stream_worker::{StreamProcessor, StreamProducer};
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::models::NewItemNotification;
use crate::streams::NotificationStream;

pub trait NotificationDispatcher: Send + Sync {
    fn notify_new_item(&self, notification: NewItemNotification);
}

/// Publishes to the `notifications:new_item` stream.
///
/// Each call spawns its own `XADD`; callers must be inside a tokio runtime.
#[derive(Clone)]
pub struct RedisStreamDispatcher {
    producer: StreamProducer,
}

impl RedisStreamDispatcher {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            producer: StreamProducer::from_stream_def::<NotificationStream>(redis),
        }
    }
}

impl NotificationDispatcher for RedisStreamDispatcher {
    fn notify_new_item(&self, notification: NewItemNotification) {
        let producer = self.producer.clone();
        tokio::spawn(async move {
            if let Err(e) = producer.send(&notification).await {
                warn!(
                    notification_id = %notification.id,
                    recipient_id = %notification.recipient_id,
                    error = %e,
                    "Failed to enqueue new item notification"
                );
            }
        });
    }
}

/// In-process queue used when no Redis is configured.
#[derive(Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<NewItemNotification>,
}

impl ChannelDispatcher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NewItemNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationDispatcher for ChannelDispatcher {
    fn notify_new_item(&self, notification: NewItemNotification) {
        if let Err(e) = self.tx.send(notification) {
            warn!(
                notification_id = %e.0.id,
                "Notification channel closed, dropping notification"
            );
        }
    }
}

/// Feed channel notifications to `processor` until shutdown or until every
/// dispatcher is dropped. Failures are logged, never retried.
pub async fn drain_channel<P>(
    mut rx: mpsc::UnboundedReceiver<NewItemNotification>,
    processor: P,
    mut shutdown: watch::Receiver<bool>,
) where
    P: StreamProcessor<NewItemNotification>,
{
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            next = rx.recv() => {
                let Some(notification) = next else { break };
                if let Err(e) = processor.process(&notification).await {
                    warn!(
                        processor = processor.name(),
                        notification_id = %notification.id,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }
    }
    debug!("Notification channel drained");
}
