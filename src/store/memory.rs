use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Event, EventRegistration, NewTicket, Ticket, TicketEntry};
use crate::store::{StoreError, TicketStore};

/// In-memory [`TicketStore`] for tests and local development.
///
/// Enforces the same (event_id, user_id) uniqueness the Postgres schema
/// does, counts reads and writes so tests can assert the zero-write
/// rejection paths, and can be flipped into a failure mode to simulate an
/// unreachable upstream.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    events: Vec<Event>,
    registrations: Vec<EventRegistration>,
    tickets: Vec<Ticket>,
    entries: Vec<TicketEntry>,
    reads: usize,
    writes: usize,
    unavailable: bool,
}

impl Inner {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&self, event: Event) {
        self.inner.lock().unwrap().events.push(event);
    }

    pub fn add_registration(&self, event_id: Uuid, user_id: Uuid) -> EventRegistration {
        let registration = EventRegistration {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            registered_at: Utc::now(),
        };
        self.inner
            .lock()
            .unwrap()
            .registrations
            .push(registration.clone());
        registration
    }

    /// Simulate the store being unreachable; every call fails with
    /// [`StoreError::Unavailable`] until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unwrap().unavailable = unavailable;
    }

    pub fn ticket_count(&self) -> usize {
        self.inner.lock().unwrap().tickets.len()
    }

    pub fn entry_count(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn reads(&self) -> usize {
        self.inner.lock().unwrap().reads
    }

    pub fn writes(&self) -> usize {
        self.inner.lock().unwrap().writes
    }
}

impl TicketStore for MemoryStore {
    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        inner.reads += 1;
        Ok(inner.events.iter().find(|e| e.id == event_id).cloned())
    }

    async fn registrations_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<EventRegistration>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        inner.reads += 1;
        let mut registrations: Vec<EventRegistration> = inner
            .registrations
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        registrations.sort_by_key(|r| r.registered_at);
        Ok(registrations)
    }

    async fn find_ticket(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Ticket>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        inner.reads += 1;
        Ok(inner
            .tickets
            .iter()
            .find(|t| t.event_id == event_id && t.user_id == user_id)
            .cloned())
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<Ticket, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        if inner
            .tickets
            .iter()
            .any(|t| t.event_id == ticket.event_id && t.user_id == ticket.user_id)
        {
            return Err(StoreError::Duplicate);
        }
        inner.writes += 1;
        let now = Utc::now();
        let inserted = Ticket {
            id: Uuid::new_v4(),
            event_id: ticket.event_id,
            user_id: ticket.user_id,
            ticket_code: ticket.ticket_code,
            status: ticket.status,
            created_at: now,
            updated_at: now,
        };
        inner.tickets.push(inserted.clone());
        Ok(inserted)
    }

    async fn latest_entry(&self, ticket_id: Uuid) -> Result<Option<TicketEntry>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        inner.reads += 1;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.ticket_id == ticket_id)
            .max_by_key(|e| e.entered_at)
            .cloned())
    }

    async fn insert_entry(
        &self,
        ticket_id: Uuid,
        entered_at: DateTime<Utc>,
    ) -> Result<TicketEntry, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        inner.writes += 1;
        let entry = TicketEntry {
            id: Uuid::new_v4(),
            ticket_id,
            entered_at,
            exited_at: None,
        };
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    async fn close_entry(
        &self,
        entry_id: Uuid,
        exited_at: DateTime<Utc>,
    ) -> Result<TicketEntry, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.check_available()?;
        inner.writes += 1;
        let entry = inner
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| StoreError::Unavailable(format!("no entry record {entry_id}")))?;
        entry.exited_at = Some(exited_at);
        Ok(entry.clone())
    }
}
