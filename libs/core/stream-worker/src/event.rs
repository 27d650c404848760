use crate::registry::StreamJob;
use chrono::{DateTime, Utc};

/// A decoded stream entry.
#[derive(Debug, Clone)]
pub struct StreamEvent<J: StreamJob> {
    /// Entry id, `<millis>-<seq>`
    pub stream_id: String,
    pub job: J,
    /// When Redis accepted the entry
    pub timestamp: DateTime<Utc>,
}

impl<J: StreamJob> StreamEvent<J> {
    pub fn new(stream_id: String, job: J) -> Self {
        let timestamp = parse_stream_timestamp(&stream_id).unwrap_or_else(Utc::now);
        Self {
            stream_id,
            job,
            timestamp,
        }
    }

    pub fn job_id(&self) -> String {
        self.job.job_id()
    }

    /// Time spent in the stream before this worker saw it.
    pub fn queue_latency(&self) -> chrono::Duration {
        Utc::now() - self.timestamp
    }
}

fn parse_stream_timestamp(stream_id: &str) -> Option<DateTime<Utc>> {
    let (millis, _seq) = stream_id.split_once('-')?;
    DateTime::from_timestamp_millis(millis.parse().ok()?)
}
