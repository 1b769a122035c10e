//! Engine Session Handle
//!
//! The engine session is process-wide shared state. Every handler receives a
//! clone of the same handle, and every facade interaction runs while holding
//! its mutex, so at most one call is ever inside the engine.

use parking_lot::Mutex;
use std::sync::Arc;

use super::AccountingEngine;

/// Shared, serialized access to the accounting engine session
#[derive(Clone)]
pub struct EngineHandle {
    session: Arc<Mutex<Box<dyn AccountingEngine>>>,
}

impl EngineHandle {
    pub fn new(engine: impl AccountingEngine + 'static) -> Self {
        Self {
            session: Arc::new(Mutex::new(Box::new(engine))),
        }
    }

    /// Run one interaction with the engine while holding the session lock.
    ///
    /// Multi-step sequences that must not interleave with other requests
    /// (check-then-create) belong inside a single `call`.
    pub fn call<T>(&self, f: impl FnOnce(&mut dyn AccountingEngine) -> T) -> T {
        let mut session = self.session.lock();
        f(session.as_mut())
    }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle").finish_non_exhaustive()
    }
}
