//! Domain module for Message Fees
//!
//! Contains value objects, entities, messages, events, errors and the
//! deterministic ordering helpers shared by the calculator, executor and
//! router.

pub mod entities;
pub mod errors;
pub mod events;
pub mod msgs;
pub mod ordering;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use events::*;
pub use msgs::*;
pub use ordering::sorted_entries;
pub use value_objects::*;
