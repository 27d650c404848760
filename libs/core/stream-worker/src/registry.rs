use crate::error::StreamError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use strum::{AsRefStr, Display, EnumString};

/// Field names used inside stream entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MessageKey {
    /// JSON payload
    Job,
    /// Job type, for consumers that multiplex
    Kind,
}

/// Static description of a stream and the group that consumes it.
///
/// ```rust,ignore
/// pub struct NotificationStream;
///
/// impl StreamDef for NotificationStream {
///     const STREAM_NAME: &'static str = "notifications:new_item";
///     const CONSUMER_GROUP: &'static str = "notification_workers";
/// }
/// ```
pub trait StreamDef: Send + Sync {
    const STREAM_NAME: &'static str;
    const CONSUMER_GROUP: &'static str;

    /// Approximate cap passed to `XADD MAXLEN ~`.
    const MAX_LENGTH: i64 = 100_000;

    const BATCH_SIZE: usize = 10;

    fn stream_name() -> &'static str {
        Self::STREAM_NAME
    }

    fn consumer_group() -> &'static str {
        Self::CONSUMER_GROUP
    }
}

/// Payload carried in the `job` field of a stream entry.
pub trait StreamJob: Serialize + DeserializeOwned + Send + Sync + Clone {
    fn job_id(&self) -> String;

    /// Value of the `kind` field written next to the payload.
    fn kind(&self) -> &'static str {
        "job"
    }
}

/// Handles one job. Errors are logged by the worker and not retried.
#[async_trait]
pub trait StreamProcessor<J: StreamJob>: Send + Sync {
    async fn process(&self, job: &J) -> Result<(), StreamError>;

    fn name(&self) -> &'static str;

    async fn health_check(&self) -> Result<bool, StreamError> {
        Ok(true)
    }
}
