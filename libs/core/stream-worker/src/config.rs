use crate::registry::StreamDef;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub stream_name: String,
    pub consumer_group: String,
    /// Unique per process, `worker-<uuid>` unless set
    pub consumer_id: String,
    pub batch_size: usize,
    /// `XREADGROUP BLOCK` in milliseconds; `None` polls instead
    pub block_timeout_ms: Option<u64>,
    /// Sleep between polls when not blocking
    pub poll_interval_ms: u64,
    pub max_concurrent_jobs: usize,
}

impl WorkerConfig {
    pub fn new(stream_name: impl Into<String>, consumer_group: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            consumer_group: consumer_group.into(),
            consumer_id: format!("worker-{}", Uuid::new_v4()),
            batch_size: 10,
            block_timeout_ms: Some(5000),
            poll_interval_ms: 1000,
            max_concurrent_jobs: 1,
        }
    }

    pub fn from_stream_def<S: StreamDef>() -> Self {
        Self::new(S::STREAM_NAME, S::CONSUMER_GROUP).with_batch_size(S::BATCH_SIZE)
    }

    pub fn with_consumer_id(mut self, id: impl Into<String>) -> Self {
        self.consumer_id = id.into();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_blocking(mut self, timeout_ms: u64) -> Self {
        self.block_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_polling(mut self, interval_ms: u64) -> Self {
        self.block_timeout_ms = None;
        self.poll_interval_ms = interval_ms;
        self
    }

    pub fn with_max_concurrent_jobs(mut self, count: usize) -> Self {
        self.max_concurrent_jobs = count.max(1);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.block_timeout_ms.is_some()
    }
}
