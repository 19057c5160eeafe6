use axum::{
    routing::{get, post},
    Router,
};

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{
    get_ticket, get_ticket_qr, health_check, list_user_tickets, process_scan,
};
use crate::state::AppState;
use crate::store::TicketStore;

pub fn create_routes<S: TicketStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/tickets/:event_id/:user_id", get(get_ticket::<S>))
        .route("/api/tickets/:event_id/:user_id/qr", get(get_ticket_qr::<S>))
        .route("/api/users/:user_id/tickets", get(list_user_tickets::<S>))
        .route("/api/scan", post(process_scan::<S>))
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
        .with_state(state)
}
