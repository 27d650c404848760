use stream_worker::StreamDef;

/// Redis stream carrying [`crate::NewItemNotification`] jobs.
pub struct NotificationStream;

impl StreamDef for NotificationStream {
    const STREAM_NAME: &'static str = "notifications:new_item";
    const CONSUMER_GROUP: &'static str = "notification_workers";
    const MAX_LENGTH: i64 = 50_000;
}
