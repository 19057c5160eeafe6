//! Storage seam for the ticketing core.
//!
//! Issuance and the gate state machine never talk to a database directly;
//! they go through [`TicketStore`]. The binary wires in [`PgStore`], tests
//! and local development use [`MemoryStore`].

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, EventRegistration, NewTicket, Ticket, TicketEntry};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key already holds a row. Issuance treats this as "somebody
    /// else won the race" and re-fetches.
    #[error("duplicate row for unique key")]
    Duplicate,

    /// The backing store could not be reached or failed mid-query.
    #[error("ticket store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // 23505 = unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::Duplicate;
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}

/// Row-level access to the four ticketing tables.
///
/// Only the operations the ticketing core needs: compound-key lookups,
/// inserts, and the one update the gate performs (closing an entry record).
pub trait TicketStore: Send + Sync + 'static {
    fn find_event(
        &self,
        event_id: Uuid,
    ) -> impl Future<Output = Result<Option<Event>, StoreError>> + Send;

    fn registrations_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<EventRegistration>, StoreError>> + Send;

    /// Lookup by the (event, user) compound key — the same pair the ticket
    /// code encodes, so a scanned code resolves without any prior lookup.
    fn find_ticket(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<Ticket>, StoreError>> + Send;

    /// Returns [`StoreError::Duplicate`] if a ticket already exists for the
    /// (event, user) pair.
    fn insert_ticket(
        &self,
        ticket: NewTicket,
    ) -> impl Future<Output = Result<Ticket, StoreError>> + Send;

    /// Most recent entry record for a ticket, by `entered_at`.
    fn latest_entry(
        &self,
        ticket_id: Uuid,
    ) -> impl Future<Output = Result<Option<TicketEntry>, StoreError>> + Send;

    fn insert_entry(
        &self,
        ticket_id: Uuid,
        entered_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<TicketEntry, StoreError>> + Send;

    /// Sets `exited_at` on an existing entry record.
    fn close_entry(
        &self,
        entry_id: Uuid,
        exited_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<TicketEntry, StoreError>> + Send;
}
