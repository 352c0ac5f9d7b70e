//! Application layer: the module message service and transaction
//! settlement.

pub mod service;
pub mod settlement;

pub use service::{MsgFeesService, MSG_SERVICE_NAME};
