//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports, used by tests, genesis
//! tooling and single-process simulations.

mod circuit_breaker;
mod fee_meter;
mod memory_bank;
mod memory_store;
mod type_registry;

pub use circuit_breaker::MsgTypeCircuitBreaker;
pub use fee_meter::FeeGasMeter;
pub use memory_bank::InMemoryBank;
pub use memory_store::InMemoryKvStore;
pub use type_registry::InMemoryInterfaceRegistry;
