//! # QC-18: Message Fees Subsystem
//!
//! Per-message-type additional fees on top of the base gas fee. A governance
//! managed schedule says what each message type costs and how much of it goes
//! to a named recipient; the rest is kept by the fee collector.
//!
//! ## Architecture
//!
//! - **Domain**: Coins, fee rules, distribution plans, params, messages
//! - **Keeper**: Fee schedule store, distribution calculator, distribution executor
//! - **Router**: Fee-aware message dispatch with explicit service registration
//! - **Ports**: Inbound (MsgFeesApi) and Outbound (KvStore, Bank, FeeMeter,
//!   CircuitBreaker, InterfaceRegistry)
//! - **Adapters**: In-memory store and bank, fee gas meter, type registry,
//!   circuit breaker
//! - **Application**: Module message service and transaction settlement
//!
//! ## Fee split
//!
//! A fee `a` with `b` recipient basis points pays the recipient
//! `floor(a * b / 10000)`; the remainder stays with the module. Without a
//! recipient the whole fee stays with the module.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod keeper;
pub mod ports;
pub mod router;

pub use adapters::{
    FeeGasMeter, InMemoryBank, InMemoryInterfaceRegistry, InMemoryKvStore, MsgTypeCircuitBreaker,
};
pub use application::{MsgFeesService, MSG_SERVICE_NAME};
pub use config::{MsgFeesConfig, DEFAULT_AUTHORITY, FEE_COLLECTOR_NAME};
pub use domain::entities::*;
pub use domain::errors::{BankError, MsgFeesError, RegistrationError, StoreError};
pub use domain::msgs::*;
pub use domain::value_objects::*;
pub use keeper::MsgFeesKeeper;
pub use ports::inbound::MsgFeesApi;
pub use ports::outbound::{Bank, CircuitBreaker, FeeMeter, InterfaceRegistry, KvStore};
pub use router::{MethodDesc, MsgContext, MsgResult, MsgServiceRouter, ServiceDesc, TxContext};
