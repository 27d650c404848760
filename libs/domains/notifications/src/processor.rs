//! Stream-side handling of notification jobs.

use std::sync::Arc;

use async_trait::async_trait;
use stream_worker::{StreamError, StreamProcessor};
use tracing::info;

use crate::error::NotificationResult;
use crate::models::NewItemNotification;

/// Final hop of a notification: whatever actually reaches the user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &NewItemNotification) -> NotificationResult<()>;
}

/// Sink that records each delivery in the log.
#[derive(Debug, Clone, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, notification: &NewItemNotification) -> NotificationResult<()> {
        info!(
            target: "notifications",
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            item_id = %notification.item_id,
            item_name = %notification.item_name,
            created_by = %notification.created_by,
            "New item notification delivered"
        );
        Ok(())
    }
}

pub struct NotificationProcessor<S: NotificationSink> {
    sink: Arc<S>,
}

impl<S: NotificationSink> NotificationProcessor<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }
}

impl<S: NotificationSink> Clone for NotificationProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
        }
    }
}

#[async_trait]
impl<S: NotificationSink + 'static> StreamProcessor<NewItemNotification>
    for NotificationProcessor<S>
{
    async fn process(&self, job: &NewItemNotification) -> Result<(), StreamError> {
        self.sink.deliver(job).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "NotificationProcessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotificationError;
    use uuid::Uuid;

    fn notification() -> NewItemNotification {
        NewItemNotification::new(Uuid::now_v7(), Uuid::now_v7(), "Bike", Uuid::now_v7())
    }

    #[tokio::test]
    async fn process_hands_job_to_sink() {
        let job = notification();
        let expected_id = job.id;

        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .withf(move |n| n.id == expected_id)
            .times(1)
            .returning(|_| Ok(()));

        let processor = NotificationProcessor::new(sink);
        processor.process(&job).await.unwrap();
    }

    #[tokio::test]
    async fn sink_failure_becomes_processing_error() {
        let mut sink = MockNotificationSink::new();
        sink.expect_deliver()
            .returning(|_| Err(NotificationError::Delivery("mailbox full".into())));

        let processor = NotificationProcessor::new(sink);
        let err = processor.process(&notification()).await.unwrap_err();

        assert!(matches!(err, StreamError::Processing(msg) if msg.contains("mailbox full")));
    }

    #[tokio::test]
    async fn log_sink_always_succeeds() {
        assert!(LogSink.deliver(&notification()).await.is_ok());
    }
}
