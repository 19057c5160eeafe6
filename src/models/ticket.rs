use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ticket lifecycle flag. The gate never writes this; `used` and `invalid`
/// are administrative revocation states set outside this service. The
/// inside/outside signal lives in `ticket_entries` (open vs. closed record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "ticket_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Valid,
    Used,
    Invalid,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub ticket_code: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a ticket row; id and timestamps are store-assigned.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub ticket_code: String,
    pub status: TicketStatus,
}
