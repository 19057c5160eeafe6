use std::sync::Arc;

use crate::scanner::gate::GateProcessor;
use crate::store::TicketStore;
use crate::ticket::IssuanceService;

/// Shared application state: one store, with issuance and the gate built
/// over it. Generic over the store so tests run the whole stack against
/// [`crate::store::MemoryStore`].
pub struct AppState<S: TicketStore> {
    pub store: Arc<S>,
    pub issuance: IssuanceService<S>,
    pub gate: GateProcessor<S>,
}

impl<S: TicketStore> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            issuance: IssuanceService::new(store.clone()),
            gate: GateProcessor::new(store.clone()),
            store,
        }
    }
}

impl<S: TicketStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            issuance: self.issuance.clone(),
            gate: self.gate.clone(),
        }
    }
}
