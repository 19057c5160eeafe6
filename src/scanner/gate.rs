//! Gate entry state machine.
//!
//! A scanned payload either toggles the attendee between inside and outside
//! or is rejected. The authoritative inside/outside signal is the ticket's
//! most recent entry record: open (no `exited_at`) means inside. The gate
//! is a strict toggle — no capacity check, no event time-window check.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::models::{Event, Ticket, TicketEntry, TicketStatus};
use crate::store::{StoreError, TicketStore};
use crate::ticket::code::{self, DecodeError};

/// Why a scan was turned away. Rejections are expected operator-facing
/// outcomes (stale screenshots, random QR codes), not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The payload does not parse as a ticket code.
    MalformedPayload,
    /// The code parsed but no valid ticket matches its (event, user) pair.
    UnknownTicket,
}

/// Flat entry-status view used by the feedback panel and the scan API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySignal {
    Entered,
    Exited,
    Error,
}

/// Result of processing one scan.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Entered {
        ticket: Ticket,
        event: Option<Event>,
        record: TicketEntry,
    },
    Exited {
        ticket: Ticket,
        event: Option<Event>,
        record: TicketEntry,
    },
    Rejected {
        reason: RejectReason,
        raw_code: String,
    },
}

impl ScanOutcome {
    pub fn ticket_status(&self) -> &'static str {
        match self {
            ScanOutcome::Entered { .. } | ScanOutcome::Exited { .. } => "valid",
            ScanOutcome::Rejected { .. } => "invalid",
        }
    }

    pub fn entry_status(&self) -> EntrySignal {
        match self {
            ScanOutcome::Entered { .. } => EntrySignal::Entered,
            ScanOutcome::Exited { .. } => EntrySignal::Exited,
            ScanOutcome::Rejected { .. } => EntrySignal::Error,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ScanOutcome::Entered { .. } => "Entry confirmed",
            ScanOutcome::Exited { .. } => "Exit confirmed",
            ScanOutcome::Rejected {
                reason: RejectReason::MalformedPayload,
                ..
            } => "Invalid QR format",
            ScanOutcome::Rejected {
                reason: RejectReason::UnknownTicket,
                ..
            } => "Invalid or used ticket",
        }
    }

    pub fn event_title(&self) -> &str {
        match self {
            ScanOutcome::Entered { event, .. } | ScanOutcome::Exited { event, .. } => event
                .as_ref()
                .map(|e| e.title.as_str())
                .unwrap_or("Unknown"),
            ScanOutcome::Rejected { .. } => "Unknown",
        }
    }

    pub fn scanned_code(&self) -> &str {
        match self {
            ScanOutcome::Entered { ticket, .. } | ScanOutcome::Exited { ticket, .. } => {
                &ticket.ticket_code
            }
            ScanOutcome::Rejected { raw_code, .. } => raw_code,
        }
    }
}

#[derive(Debug, Error)]
pub enum GateError {
    /// The store failed mid-scan. Distinct from a rejection: the scan could
    /// not be judged at all and the operator should retry it.
    #[error("ticket store unreachable during scan")]
    Store(#[from] StoreError),
}

pub struct GateProcessor<S> {
    store: Arc<S>,
}

impl<S> Clone for GateProcessor<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: TicketStore> GateProcessor<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Judge one scanned payload and record the transition.
    ///
    /// Exactly one write on an accepted scan (a new entry record, or the
    /// exit timestamp on the open one); zero writes on rejection.
    pub async fn process_scan(&self, raw: &str) -> Result<ScanOutcome, GateError> {
        let key = match code::decode(raw) {
            Ok(key) => key,
            Err(DecodeError::MalformedPayload) => {
                tracing::debug!(payload = %raw.trim(), "Rejected malformed scan payload");
                return Ok(ScanOutcome::Rejected {
                    reason: RejectReason::MalformedPayload,
                    raw_code: raw.trim().to_string(),
                });
            }
        };

        let ticket = match self.store.find_ticket(key.event_id, key.user_id).await? {
            Some(ticket) if ticket.status == TicketStatus::Valid => ticket,
            _ => {
                tracing::debug!(
                    event_id = %key.event_id,
                    user_id = %key.user_id,
                    "Rejected scan with no valid ticket"
                );
                return Ok(ScanOutcome::Rejected {
                    reason: RejectReason::UnknownTicket,
                    raw_code: raw.trim().to_string(),
                });
            }
        };

        // For the operator panel only; a missing event row does not reject.
        let event = self.store.find_event(key.event_id).await?;

        let latest = self.store.latest_entry(ticket.id).await?;
        let now = Utc::now();

        match latest {
            Some(open) if open.is_open() => {
                let record = self.store.close_entry(open.id, now).await?;
                tracing::info!(ticket_id = %ticket.id, entry_id = %record.id, "Exit recorded");
                Ok(ScanOutcome::Exited {
                    ticket,
                    event,
                    record,
                })
            }
            _ => {
                let record = self.store.insert_entry(ticket.id, now).await?;
                tracing::info!(ticket_id = %ticket.id, entry_id = %record.id, "Entry recorded");
                Ok(ScanOutcome::Entered {
                    ticket,
                    event,
                    record,
                })
            }
        }
    }
}
