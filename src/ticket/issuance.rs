//! Lazy, idempotent ticket issuance.
//!
//! A ticket row comes into existence the first time it is asked for, and a
//! given (event, user) pair only ever gets one row. Uniqueness is the
//! store's job (unique key on the pair); on a lost insert race we simply
//! re-fetch the winner, since both sides encode the identical code.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, NewTicket, Ticket, TicketStatus};
use crate::store::{StoreError, TicketStore};
use crate::ticket::code;

#[derive(Debug, Error)]
pub enum IssuanceError {
    /// The backing store could not be reached. Retrying is the caller's
    /// decision, not this layer's.
    #[error("ticket store unreachable")]
    UpstreamUnavailable(#[source] StoreError),
}

/// A ticket joined with its event, as the ticket views consume it.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedTicket {
    pub ticket: Ticket,
    pub event: Event,
}

pub struct IssuanceService<S> {
    store: Arc<S>,
}

impl<S> Clone for IssuanceService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: TicketStore> IssuanceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the ticket for (event, user), creating it on first access.
    ///
    /// Callers are trusted to have checked the registration upstream; this
    /// service does not re-validate it.
    pub async fn get_or_create(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Ticket, IssuanceError> {
        if let Some(existing) = self
            .store
            .find_ticket(event_id, user_id)
            .await
            .map_err(IssuanceError::UpstreamUnavailable)?
        {
            return Ok(existing);
        }

        let new_ticket = NewTicket {
            event_id,
            user_id,
            ticket_code: code::encode(event_id, user_id),
            status: TicketStatus::Valid,
        };

        match self.store.insert_ticket(new_ticket).await {
            Ok(ticket) => {
                tracing::info!(%event_id, %user_id, ticket_id = %ticket.id, "Issued ticket");
                Ok(ticket)
            }
            // Lost the race: a concurrent call inserted first. Their row is
            // the ticket; fetch and return it.
            Err(StoreError::Duplicate) => self
                .store
                .find_ticket(event_id, user_id)
                .await
                .map_err(IssuanceError::UpstreamUnavailable)?
                .ok_or_else(|| {
                    IssuanceError::UpstreamUnavailable(StoreError::Unavailable(
                        "ticket row missing after duplicate insert".to_string(),
                    ))
                }),
            Err(err) => Err(IssuanceError::UpstreamUnavailable(err)),
        }
    }

    /// All of the user's tickets, one per confirmed registration, issuing
    /// lazily where a registration has no ticket yet.
    pub async fn tickets_for_user(&self, user_id: Uuid) -> Result<Vec<IssuedTicket>, IssuanceError> {
        let registrations = self
            .store
            .registrations_for_user(user_id)
            .await
            .map_err(IssuanceError::UpstreamUnavailable)?;

        let mut tickets = Vec::with_capacity(registrations.len());
        for registration in registrations {
            let Some(event) = self
                .store
                .find_event(registration.event_id)
                .await
                .map_err(IssuanceError::UpstreamUnavailable)?
            else {
                tracing::warn!(
                    event_id = %registration.event_id,
                    "Registration references a missing event; skipping"
                );
                continue;
            };

            let ticket = self.get_or_create(registration.event_id, user_id).await?;
            tickets.push(IssuedTicket { ticket, event });
        }

        Ok(tickets)
    }
}
