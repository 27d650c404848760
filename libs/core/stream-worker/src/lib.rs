//! Redis Streams plumbing for background jobs.
//!
//! A domain describes its stream with [`StreamDef`], its payload with
//! [`StreamJob`] and its handler with [`StreamProcessor`]. Producers append
//! with [`StreamProducer`]; a [`StreamWorker`] reads through a consumer group.
//!
//! Delivery is best-effort: every entry is handled once and acknowledged
//! whether the processor succeeded or not. There is no retry queue.
//!
//! ```ignore
//! let config = WorkerConfig::from_stream_def::<NotificationStream>();
//! let worker = StreamWorker::new(redis, processor, config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod consumer;
mod error;
mod event;
mod producer;
mod registry;
mod worker;

pub use config::WorkerConfig;
pub use consumer::{ParsedEntries, StreamConsumer, parse_entries};
pub use error::StreamError;
pub use event::StreamEvent;
pub use producer::StreamProducer;
pub use registry::{MessageKey, StreamDef, StreamJob, StreamProcessor};
pub use worker::{JobOutcome, StreamWorker, handle_event};
