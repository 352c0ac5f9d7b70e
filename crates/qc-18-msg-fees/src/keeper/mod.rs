//! Message fees keeper.
//!
//! Owns the fee schedule store and implements the three fee operations:
//!
//! - **schedule**: rule CRUD, params and genesis
//! - **calculator**: distribution plan for a batch of messages
//! - **distribution**: paying a plan out of a payer account

mod calculator;
mod distribution;
mod schedule;

pub use calculator::ensure_sufficient_fees;
pub use schedule::{msg_fee_key, MSG_FEE_KEY_PREFIX, PARAMS_KEY};

use crate::config::MsgFeesConfig;
use crate::ports::KvStore;
use std::sync::Arc;

/// Keeper of the additional fee store.
#[derive(Clone)]
pub struct MsgFeesKeeper {
    store: Arc<dyn KvStore>,
    config: MsgFeesConfig,
}

impl MsgFeesKeeper {
    pub fn new(store: Arc<dyn KvStore>, config: MsgFeesConfig) -> Self {
        Self { store, config }
    }

    /// Signer required on fee schedule changes.
    pub fn authority(&self) -> &str {
        &self.config.authority
    }

    pub fn fee_collector_name(&self) -> &str {
        &self.config.fee_collector_name
    }

    pub fn config(&self) -> &MsgFeesConfig {
        &self.config
    }
}
