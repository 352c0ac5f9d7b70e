//! Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the subsystem depends on. All calls are synchronous and run
//! against the enclosing transaction's working state.

use crate::domain::errors::{BankError, MsgFeesError, StoreError};
use crate::domain::value_objects::{Address, Coins};

/// Ordered `(key, value)` cursor returned by [`KvStore::prefix_iter`].
pub type KvIter<'a> = Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>;

/// Ordered key-value store backing the fee schedule.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError>;

    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn prefix_iter(&self, prefix: &[u8]) -> Result<KvIter<'_>, StoreError>;
}

/// Account balance transfers (the treasury).
///
/// Each call is atomic: it either moves the full amount or fails without
/// changing any balance.
pub trait Bank: Send + Sync {
    fn send_coins(&self, from: &Address, to: &Address, amount: &Coins) -> Result<(), BankError>;

    /// Moves coins into the named module account.
    fn send_coins_to_module(
        &self,
        from: &Address,
        module: &str,
        amount: &Coins,
    ) -> Result<(), BankError>;
}

/// Per-transaction fee meter attached by the fee-charging pipeline.
pub trait FeeMeter {
    /// Simulation runs record consumption but skip sufficiency checks.
    fn is_simulate(&self) -> bool;

    /// Everything consumed so far in this transaction.
    fn fee_consumed(&self) -> Coins;

    /// Records `amount` owed for `msg_type_url`. An empty `recipient` means the
    /// fee collector. Fails without recording anything when a ledger would
    /// overflow.
    fn consume_fee(
        &mut self,
        amount: &Coins,
        msg_type_url: &str,
        recipient: &str,
    ) -> Result<(), MsgFeesError>;
}

/// Per-message-type kill switch.
pub trait CircuitBreaker: Send + Sync {
    fn is_allowed(&self, msg_type_url: &str) -> Result<bool, MsgFeesError>;
}

/// Descriptor of a declared message type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub type_url: String,
    pub full_name: String,
}

/// Registry of every message type the node knows how to decode.
pub trait InterfaceRegistry: Send + Sync {
    /// `None` when the type was never declared.
    fn resolve(&self, type_url: &str) -> Option<TypeDescriptor>;
}
