//! Ports module for Message Fees
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use inbound::MsgFeesApi;
pub use outbound::{
    Bank, CircuitBreaker, FeeMeter, InterfaceRegistry, KvIter, KvStore, TypeDescriptor,
};
