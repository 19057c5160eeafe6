use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Event, EventRegistration, NewTicket, Ticket, TicketEntry};
use crate::store::{StoreError, TicketStore};

/// Postgres-backed [`TicketStore`]. Uniqueness of (event_id, user_id) is
/// enforced by the schema, which is what keeps concurrent issuance down to
/// one row.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TicketStore for PgStore {
    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(event)
    }

    async fn registrations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EventRegistration>, StoreError> {
        let registrations = sqlx::query_as::<_, EventRegistration>(
            "SELECT * FROM event_registrations WHERE user_id = $1 ORDER BY registered_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(registrations)
    }

    async fn find_ticket(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Ticket>, StoreError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE event_id = $1 AND user_id = $2",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let inserted = sqlx::query_as::<_, Ticket>(
            "INSERT INTO tickets (event_id, user_id, ticket_code, status) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(ticket.event_id)
        .bind(ticket.user_id)
        .bind(&ticket.ticket_code)
        .bind(ticket.status)
        .fetch_one(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn latest_entry(&self, ticket_id: Uuid) -> Result<Option<TicketEntry>, StoreError> {
        let entry = sqlx::query_as::<_, TicketEntry>(
            "SELECT * FROM ticket_entries WHERE ticket_id = $1 \
             ORDER BY entered_at DESC LIMIT 1",
        )
        .bind(ticket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn insert_entry(
        &self,
        ticket_id: Uuid,
        entered_at: DateTime<Utc>,
    ) -> Result<TicketEntry, StoreError> {
        let entry = sqlx::query_as::<_, TicketEntry>(
            "INSERT INTO ticket_entries (ticket_id, entered_at) \
             VALUES ($1, $2) RETURNING *",
        )
        .bind(ticket_id)
        .bind(entered_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn close_entry(
        &self,
        entry_id: Uuid,
        exited_at: DateTime<Utc>,
    ) -> Result<TicketEntry, StoreError> {
        let entry = sqlx::query_as::<_, TicketEntry>(
            "UPDATE ticket_entries SET exited_at = $2 WHERE id = $1 RETURNING *",
        )
        .bind(entry_id)
        .bind(exited_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }
}
