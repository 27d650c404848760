use crate::config::WorkerConfig;
use crate::consumer::StreamConsumer;
use crate::error::StreamError;
use crate::event::StreamEvent;
use crate::registry::{StreamJob, StreamProcessor};
use redis::aio::ConnectionManager;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

const MAX_BACKOFF_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Processed,
    Failed,
}

/// Runs the processor on one event. Failures are logged, never retried.
pub async fn handle_event<J, P>(processor: &P, event: &StreamEvent<J>) -> JobOutcome
where
    J: StreamJob,
    P: StreamProcessor<J> + ?Sized,
{
    let started = Instant::now();
    match processor.process(&event.job).await {
        Ok(()) => {
            debug!(
                stream_id = %event.stream_id,
                job_id = %event.job_id(),
                processor = processor.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Job processed"
            );
            JobOutcome::Processed
        }
        Err(e) => {
            warn!(
                stream_id = %event.stream_id,
                job_id = %event.job_id(),
                processor = processor.name(),
                error = %e,
                "Job failed, dropping"
            );
            JobOutcome::Failed
        }
    }
}

/// Consumer-group worker loop.
pub struct StreamWorker<J, P>
where
    J: StreamJob,
    P: StreamProcessor<J>,
{
    consumer: StreamConsumer,
    processor: Arc<P>,
    config: WorkerConfig,
    permits: Arc<Semaphore>,
    _job: PhantomData<J>,
}

impl<J, P> StreamWorker<J, P>
where
    J: StreamJob + 'static,
    P: StreamProcessor<J> + 'static,
{
    pub fn new(redis: ConnectionManager, processor: P, config: WorkerConfig) -> Self {
        Self::with_arc_processor(redis, Arc::new(processor), config)
    }

    pub fn with_arc_processor(redis: ConnectionManager, processor: Arc<P>, config: WorkerConfig) -> Self {
        Self {
            consumer: StreamConsumer::new(redis, config.clone()),
            permits: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            processor,
            config,
            _job: PhantomData,
        }
    }

    pub fn consumer(&self) -> &StreamConsumer {
        &self.consumer
    }

    /// Reads and handles batches until `shutdown` turns `true`.
    ///
    /// Entries left pending by a previous run of this consumer are handled
    /// first. Redis errors back off exponentially up to 30 seconds.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), StreamError> {
        info!(
            consumer_id = %self.config.consumer_id,
            stream = %self.config.stream_name,
            group = %self.config.consumer_group,
            processor = self.processor.name(),
            blocking = self.config.is_blocking(),
            max_concurrent_jobs = self.config.max_concurrent_jobs,
            "Starting stream worker"
        );

        self.consumer.ensure_consumer_group().await?;

        match self.consumer.read_pending::<J>().await {
            Ok(pending) if !pending.is_empty() => {
                info!(count = pending.len(), "Handling entries left pending");
                self.dispatch(pending).await;
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Could not read pending entries"),
        }

        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);
        let mut consecutive_errors: u32 = 0;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let batch = tokio::select! {
                batch = self.consumer.read_new::<J>() => batch,
                changed = shutdown.changed() => {
                    // Sender dropped.
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            };

            match batch {
                Ok(events) => {
                    if consecutive_errors > 0 {
                        info!(consecutive_errors, "Stream connection recovered");
                        consecutive_errors = 0;
                    }
                    let idle = events.is_empty();
                    self.dispatch(events).await;

                    if idle && !self.config.is_blocking() {
                        tokio::select! {
                            _ = tokio::time::sleep(poll_interval) => {}
                            _ = shutdown.changed() => {}
                        }
                    }
                }
                Err(e) if e.is_nogroup() => {
                    warn!("Consumer group missing, recreating");
                    if let Err(e) = self.consumer.ensure_consumer_group().await {
                        error!(error = %e, "Failed to recreate consumer group");
                    }
                }
                Err(e) => {
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    let backoff = backoff_secs(consecutive_errors);
                    error!(error = %e, consecutive_errors, backoff_secs = backoff, "Failed to read from stream");
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(backoff)) => {}
                        _ = shutdown.changed() => {}
                    }
                }
            }
        }

        info!("Stream worker stopped");
        Ok(())
    }

    async fn dispatch(&self, events: Vec<StreamEvent<J>>) {
        if events.is_empty() {
            return;
        }

        if self.config.max_concurrent_jobs == 1 {
            for event in events {
                self.complete(&event).await;
            }
            return;
        }

        let mut tasks = JoinSet::new();
        for event in events {
            let permits = Arc::clone(&self.permits);
            let processor = Arc::clone(&self.processor);
            let consumer = self.consumer.clone();
            tasks.spawn(async move {
                // The semaphore is never closed.
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                handle_event(processor.as_ref(), &event).await;
                ack_or_log(&consumer, &event.stream_id).await;
            });
        }
        while tasks.join_next().await.is_some() {}
    }

    async fn complete(&self, event: &StreamEvent<J>) {
        handle_event(self.processor.as_ref(), event).await;
        ack_or_log(&self.consumer, &event.stream_id).await;
    }
}

async fn ack_or_log(consumer: &StreamConsumer, stream_id: &str) {
    if let Err(e) = consumer.ack(stream_id).await {
        error!(stream_id = %stream_id, error = %e, "Failed to acknowledge entry");
    }
}

fn backoff_secs(consecutive_errors: u32) -> u64 {
    2u64.saturating_pow(consecutive_errors.min(5)).min(MAX_BACKOFF_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    struct Job {
        id: u32,
        fail: bool,
    }

    impl StreamJob for Job {
        fn job_id(&self) -> String {
            self.id.to_string()
        }
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StreamProcessor<Job> for Counting {
        async fn process(&self, job: &Job) -> Result<(), StreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if job.fail {
                Err(StreamError::processing("boom"))
            } else {
                Ok(())
            }
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn success_is_processed() {
        let processor = Counting::default();
        let event = StreamEvent::new("1-0".into(), Job { id: 1, fail: false });

        assert_eq!(handle_event(&processor, &event).await, JobOutcome::Processed);
        assert_eq!(processor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_reported_once_without_retry() {
        let processor = Counting::default();
        let event = StreamEvent::new("1-0".into(), Job { id: 2, fail: true });

        assert_eq!(handle_event(&processor, &event).await, JobOutcome::Failed);
        assert_eq!(processor.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(backoff_secs(1), 2);
        assert_eq!(backoff_secs(3), 8);
        assert_eq!(backoff_secs(5), 30);
        assert_eq!(backoff_secs(40), 30);
    }
}
