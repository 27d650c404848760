use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stream_worker::StreamJob;
use uuid::Uuid;

/// One recipient's copy of a "new item" announcement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewItemNotification {
    pub id: Uuid,
    /// User this copy is addressed to.
    pub recipient_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    /// Seller who listed the item.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl NewItemNotification {
    pub fn new(
        recipient_id: Uuid,
        item_id: Uuid,
        item_name: impl Into<String>,
        created_by: Uuid,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            recipient_id,
            item_id,
            item_name: item_name.into(),
            created_by,
            created_at: Utc::now(),
        }
    }
}

impl StreamJob for NewItemNotification {
    fn job_id(&self) -> String {
        self.id.to_string()
    }

    fn kind(&self) -> &'static str {
        "new_item"
    }
}
