use stream_worker::StreamError;
use thiserror::Error;

pub type NotificationResult<T> = Result<T, NotificationError>;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

impl From<StreamError> for NotificationError {
    fn from(err: StreamError) -> Self {
        NotificationError::Queue(err.to_string())
    }
}

impl From<NotificationError> for StreamError {
    fn from(err: NotificationError) -> Self {
        StreamError::Processing(err.to_string())
    }
}
