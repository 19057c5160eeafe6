use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One physical entry (and, once `exited_at` is set, the matching exit) at
/// a gate. A row with `exited_at = NULL` means the attendee is inside.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketEntry {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub entered_at: DateTime<Utc>,
    pub exited_at: Option<DateTime<Utc>>,
}

impl TicketEntry {
    pub fn is_open(&self) -> bool {
        self.exited_at.is_none()
    }
}
