//! Notifications Domain
//!
//! Fan-out of "new item" notifications. The marketplace hands one
//! [`NewItemNotification`] per recipient to a [`NotificationDispatcher`]
//! and moves on; delivery happens elsewhere.
//!
//! ```text
//! ┌──────────────────┐
//! │ Item lifecycle   │  ← create() fans out once per user
//! └────────┬─────────┘
//!          │ notify_new_item (fire-and-forget)
//! ┌────────▼─────────┐
//! │   Dispatcher     │  ← Redis stream or in-process channel
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐
//! │ Notification     │  ← StreamProcessor, consumed by notification-worker
//! │ processor + sink │
//! └──────────────────┘
//! ```

pub mod dispatcher;
pub mod error;
pub mod models;
pub mod processor;
pub mod streams;

pub use dispatcher::{
    ChannelDispatcher, NotificationDispatcher, RedisStreamDispatcher, drain_channel,
};
pub use error::{NotificationError, NotificationResult};
pub use models::NewItemNotification;
pub use processor::{LogSink, NotificationProcessor, NotificationSink};
pub use streams::NotificationStream;
