use crate::config::WorkerConfig;
use crate::error::StreamError;
use crate::event::StreamEvent;
use crate::registry::{MessageKey, StreamJob};
use redis::RedisResult;
use redis::aio::ConnectionManager;
use tracing::{debug, info, warn};

type StreamReply = Vec<(String, Vec<(String, Vec<(String, String)>)>)>;
type Entries = Vec<(String, Vec<(String, String)>)>;

/// Entries split into decodable jobs and ids that should be dropped.
#[derive(Debug)]
pub struct ParsedEntries<J: StreamJob> {
    pub events: Vec<StreamEvent<J>>,
    pub rejected: Vec<String>,
}

/// Decodes the `job` field of each entry.
pub fn parse_entries<J: StreamJob>(entries: Entries) -> ParsedEntries<J> {
    let mut parsed = ParsedEntries {
        events: Vec::with_capacity(entries.len()),
        rejected: Vec::new(),
    };

    for (stream_id, fields) in entries {
        let payload = fields
            .iter()
            .find(|(key, _)| key == MessageKey::Job.as_ref())
            .map(|(_, value)| value.as_str());

        match payload.map(serde_json::from_str::<J>) {
            Some(Ok(job)) => parsed.events.push(StreamEvent::new(stream_id, job)),
            Some(Err(e)) => {
                warn!(stream_id = %stream_id, error = %e, "Dropping undecodable job");
                parsed.rejected.push(stream_id);
            }
            None => {
                warn!(stream_id = %stream_id, "Dropping entry without a job field");
                parsed.rejected.push(stream_id);
            }
        }
    }

    parsed
}

/// Consumer-group reads and acknowledgements for one stream.
#[derive(Clone)]
pub struct StreamConsumer {
    redis: ConnectionManager,
    config: WorkerConfig,
}

impl StreamConsumer {
    pub fn new(redis: ConnectionManager, config: WorkerConfig) -> Self {
        Self { redis, config }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// `XGROUP CREATE ... MKSTREAM`, tolerating an existing group.
    pub async fn ensure_consumer_group(&self) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();
        let result: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(()) => {
                info!(
                    stream = %self.config.stream_name,
                    group = %self.config.consumer_group,
                    "Created consumer group"
                );
                Ok(())
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(group = %self.config.consumer_group, "Consumer group already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Entries delivered to this consumer earlier but never acknowledged.
    pub async fn read_pending<J: StreamJob>(&self) -> Result<Vec<StreamEvent<J>>, StreamError> {
        let mut conn = self.redis.clone();
        let reply: Option<StreamReply> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id)
            .arg("COUNT")
            .arg(self.config.batch_size)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg("0")
            .query_async(&mut conn)
            .await?;

        self.accept(reply.unwrap_or_default()).await
    }

    /// New entries; blocks up to `block_timeout_ms` when configured.
    pub async fn read_new<J: StreamJob>(&self) -> Result<Vec<StreamEvent<J>>, StreamError> {
        let mut conn = self.redis.clone();

        let mut cmd = redis::cmd("XREADGROUP");
        cmd.arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_id);
        if let Some(timeout) = self.config.block_timeout_ms {
            cmd.arg("BLOCK").arg(timeout);
        }
        cmd.arg("COUNT")
            .arg(self.config.batch_size)
            .arg("STREAMS")
            .arg(&self.config.stream_name)
            .arg(">");

        let reply: Option<StreamReply> = cmd.query_async(&mut conn).await?;
        self.accept(reply.unwrap_or_default()).await
    }

    pub async fn ack(&self, stream_id: &str) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();
        let _: i64 = redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(stream_id)
            .query_async(&mut conn)
            .await?;

        debug!(stream_id = %stream_id, "Acknowledged entry");
        Ok(())
    }

    /// Round-trips a `PING` on the shared connection.
    pub async fn ping(&self) -> Result<(), StreamError> {
        let mut conn = self.redis.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn accept<J: StreamJob>(&self, reply: StreamReply) -> Result<Vec<StreamEvent<J>>, StreamError> {
        let mut events = Vec::new();
        for (_stream, entries) in reply {
            let parsed = parse_entries::<J>(entries);
            // Undecodable entries would otherwise sit in the pending list forever.
            for stream_id in &parsed.rejected {
                self.ack(stream_id).await?;
            }
            events.extend(parsed.events);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    struct Greeting {
        id: u32,
        text: String,
    }

    impl StreamJob for Greeting {
        fn job_id(&self) -> String {
            self.id.to_string()
        }
    }

    fn entry(id: &str, fields: &[(&str, &str)]) -> (String, Vec<(String, String)>) {
        (
            id.to_string(),
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn decodes_job_field_and_ignores_others() {
        let parsed = parse_entries::<Greeting>(vec![entry(
            "1-0",
            &[("kind", "greeting"), ("job", r#"{"id":7,"text":"hi"}"#)],
        )]);

        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].stream_id, "1-0");
        assert_eq!(parsed.events[0].job.text, "hi");
    }

    #[test]
    fn rejects_missing_and_malformed_payloads() {
        let parsed = parse_entries::<Greeting>(vec![
            entry("1-0", &[("kind", "greeting")]),
            entry("2-0", &[("job", "{not json")]),
            entry("3-0", &[("job", r#"{"id":3,"text":"ok"}"#)]),
        ]);

        assert_eq!(parsed.rejected, vec!["1-0".to_string(), "2-0".to_string()]);
        assert_eq!(parsed.events.len(), 1);
        assert_eq!(parsed.events[0].job.id, 3);
    }
}
