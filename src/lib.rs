//! WhereAbout ticketing backend: QR ticket issuance and gate scanning for
//! campus events. The ticketing core (codec, issuance, capture loop, gate
//! state machine, feedback) is store-agnostic; the binary wires it to
//! Postgres and serves it over HTTP.

pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod scanner;
pub mod state;
pub mod store;
pub mod ticket;
pub mod utils;
