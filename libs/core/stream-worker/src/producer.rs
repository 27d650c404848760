use crate::error::StreamError;
use crate::registry::{MessageKey, StreamDef, StreamJob};
use redis::aio::ConnectionManager;
use tracing::debug;

/// Appends jobs to a stream with `XADD ... MAXLEN ~`.
#[derive(Clone)]
pub struct StreamProducer {
    redis: ConnectionManager,
    stream_name: String,
    max_length: i64,
}

impl StreamProducer {
    pub fn new(redis: ConnectionManager, stream_name: impl Into<String>) -> Self {
        Self {
            redis,
            stream_name: stream_name.into(),
            max_length: 100_000,
        }
    }

    /// Producer whose stream name and cap match the worker's definition.
    pub fn from_stream_def<S: StreamDef>(redis: ConnectionManager) -> Self {
        Self::new(redis, S::STREAM_NAME).with_max_length(S::MAX_LENGTH)
    }

    pub fn with_max_length(mut self, max_length: i64) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Returns the entry id assigned by Redis.
    pub async fn send<J: StreamJob>(&self, job: &J) -> Result<String, StreamError> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.redis.clone();

        let stream_id: String = redis::cmd("XADD")
            .arg(&self.stream_name)
            .arg("MAXLEN")
            .arg("~")
            .arg(self.max_length)
            .arg("*")
            .arg(MessageKey::Kind.as_ref())
            .arg(job.kind())
            .arg(MessageKey::Job.as_ref())
            .arg(&payload)
            .query_async(&mut conn)
            .await?;

        debug!(
            stream = %self.stream_name,
            stream_id = %stream_id,
            job_id = %job.job_id(),
            "Enqueued job"
        );
        Ok(stream_id)
    }
}
