//! Message routing: service descriptors, execution contexts and the
//! fee-aware dispatcher.

mod context;
mod dispatcher;
mod service;

pub use context::{wrap_service_result, MsgContext, MsgResult, TxContext};
pub use dispatcher::MsgServiceRouter;
pub use service::{HybridHandler, MethodDesc, MethodHandler, ServiceDesc};
