//! Service descriptors: the explicit method → request type table a module
//! hands to the router.

use super::context::MsgContext;
use crate::domain::{Msg, MsgFeesError, MsgResponse, TypedMsg, TypedResponse};
use std::fmt;
use std::sync::Arc;

/// Type-erased method handler.
pub type MethodHandler =
    Arc<dyn Fn(&mut MsgContext, &dyn Msg) -> Result<Box<dyn MsgResponse>, MsgFeesError> + Send + Sync>;

/// Handler looked up by message name. Skips fee consumption and validation;
/// only the circuit breaker applies.
pub type HybridHandler = MethodHandler;

/// One method of a message service.
#[derive(Clone)]
pub struct MethodDesc {
    pub method_name: String,
    /// Concrete request type served by this method.
    pub request_type_url: String,
    /// Response type the handler must return.
    pub response_type_url: String,
    pub handler: MethodHandler,
}

impl MethodDesc {
    /// Builds a method from a strongly typed handler.
    ///
    /// The request and response type URLs come from the Rust types, so the
    /// mapping is fixed at compile time.
    pub fn typed<M, R, F>(method_name: impl Into<String>, handler: F) -> Self
    where
        M: TypedMsg,
        R: TypedResponse,
        F: Fn(&mut MsgContext, &M) -> Result<R, MsgFeesError> + Send + Sync + 'static,
    {
        let erased = move |ctx: &mut MsgContext, msg: &dyn Msg| -> Result<Box<dyn MsgResponse>, MsgFeesError> {
            let request = msg.as_any().downcast_ref::<M>().ok_or_else(|| {
                MsgFeesError::InvalidRequest(format!(
                    "expected {}, got {}",
                    M::TYPE_URL,
                    msg.type_url()
                ))
            })?;
            let response = handler(ctx, request)?;
            Ok(Box::new(response))
        };

        Self {
            method_name: method_name.into(),
            request_type_url: M::TYPE_URL.to_string(),
            response_type_url: R::TYPE_URL.to_string(),
            handler: Arc::new(erased),
        }
    }
}

impl fmt::Debug for MethodDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDesc")
            .field("method_name", &self.method_name)
            .field("request_type_url", &self.request_type_url)
            .field("response_type_url", &self.response_type_url)
            .finish_non_exhaustive()
    }
}

/// A named set of methods registered together.
#[derive(Clone, Debug)]
pub struct ServiceDesc {
    pub service_name: String,
    pub methods: Vec<MethodDesc>,
}

impl ServiceDesc {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: MethodDesc) -> Self {
        self.methods.push(method);
        self
    }

    /// `/service/method`, used in registration errors and logs.
    pub fn full_method_name(&self, method: &MethodDesc) -> String {
        format!("/{}/{}", self.service_name, method.method_name)
    }
}
