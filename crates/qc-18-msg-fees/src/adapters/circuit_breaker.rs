use crate::domain::MsgFeesError;
use crate::ports::CircuitBreaker;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use tracing::info;

/// Circuit breaker that trips individual message types by type URL.
#[derive(Default)]
pub struct MsgTypeCircuitBreaker {
    disabled: RwLock<BTreeSet<String>>,
}

impl MsgTypeCircuitBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn disable(&self, msg_type_url: &str) {
        info!("[qc-18] circuit breaker tripped for {}", msg_type_url);
        self.disabled.write().insert(msg_type_url.to_string());
    }

    pub fn enable(&self, msg_type_url: &str) {
        info!("[qc-18] circuit breaker reset for {}", msg_type_url);
        self.disabled.write().remove(msg_type_url);
    }
}

impl CircuitBreaker for MsgTypeCircuitBreaker {
    fn is_allowed(&self, msg_type_url: &str) -> Result<bool, MsgFeesError> {
        Ok(!self.disabled.read().contains(msg_type_url))
    }
}
