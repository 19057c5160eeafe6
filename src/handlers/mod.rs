use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scanner::feedback::{feedback_for, ScanFeedback};
use crate::scanner::gate::EntrySignal;
use crate::state::AppState;
use crate::store::TicketStore;
use crate::ticket::{qr_image, IssuedTicket};
use crate::utils::error::AppError;
use crate::utils::response::success;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "whereabout-api",
    };

    success(payload, "Health check successful").into_response()
}

/// Get-or-create the ticket for a (event, user) pair. Registration is
/// checked upstream; this endpoint trusts its caller the way the ticket
/// view does.
pub async fn get_ticket<S: TicketStore>(
    State(state): State<AppState<S>>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let event = state
        .store
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{event_id}' was not found")))?;

    let ticket = state.issuance.get_or_create(event_id, user_id).await?;

    Ok(success(IssuedTicket { ticket, event }, "Ticket ready").into_response())
}

/// The ticket's QR image, as shown/downloaded from the ticket view.
pub async fn get_ticket_qr<S: TicketStore>(
    State(state): State<AppState<S>>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    state
        .store
        .find_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Event with id '{event_id}' was not found")))?;

    let ticket = state.issuance.get_or_create(event_id, user_id).await?;
    let png = qr_image::render_png(&ticket.ticket_code)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

/// Every ticket the user holds, one per confirmed registration.
pub async fn list_user_tickets<S: TicketStore>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let tickets = state.issuance.tickets_for_user(user_id).await?;

    Ok(success(tickets, "Tickets ready").into_response())
}

#[derive(Deserialize)]
pub struct ScanRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub ticket_status: String,
    pub entry_status: EntrySignal,
    pub message: String,
    pub event_title: String,
    pub scanned_at: DateTime<Utc>,
    /// Signals for thin gate clients that do not map outcomes themselves.
    pub feedback: ScanFeedback,
}

/// Runs the gate state machine for one scanned payload. Rejections are
/// 200s — they are outcomes the operator sees, not request errors.
pub async fn process_scan<S: TicketStore>(
    State(state): State<AppState<S>>,
    Json(request): Json<ScanRequest>,
) -> Result<Response, AppError> {
    if request.code.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Scan payload must not be empty".to_string(),
        ));
    }

    let outcome = state.gate.process_scan(&request.code).await?;
    let scanned_at = Utc::now();
    let feedback = feedback_for(&outcome, scanned_at);

    let response = ScanResponse {
        ticket_status: outcome.ticket_status().to_string(),
        entry_status: outcome.entry_status(),
        message: outcome.message().to_string(),
        event_title: outcome.event_title().to_string(),
        scanned_at,
        feedback,
    };

    Ok(success(response, outcome.message()).into_response())
}
