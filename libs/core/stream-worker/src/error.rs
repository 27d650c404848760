use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StreamError {
    pub fn processing(message: impl Into<String>) -> Self {
        StreamError::Processing(message.into())
    }

    /// Server replied that the consumer group does not exist.
    pub fn is_nogroup(&self) -> bool {
        matches!(self, StreamError::Redis(e) if e.to_string().contains("NOGROUP"))
    }

    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            StreamError::Redis(e) if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
        )
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}
