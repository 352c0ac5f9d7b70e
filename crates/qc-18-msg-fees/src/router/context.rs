//! Transaction and message execution contexts.

use crate::domain::{Coins, Event, EventManager, MsgResponse, EVENT_MESSAGE};
use crate::ports::FeeMeter;

/// State of the transaction whose messages are being dispatched.
///
/// The fee meter is attached by the fee-charging pipeline. Messages replayed
/// outside that pipeline (passed governance proposals) run without one.
pub struct TxContext<'a> {
    declared_fee: Coins,
    gas_limit: u64,
    fee_meter: Option<&'a mut dyn FeeMeter>,
}

impl<'a> TxContext<'a> {
    pub fn new(declared_fee: Coins, gas_limit: u64) -> Self {
        Self {
            declared_fee,
            gas_limit,
            fee_meter: None,
        }
    }

    pub fn with_fee_meter(mut self, fee_meter: &'a mut dyn FeeMeter) -> Self {
        self.fee_meter = Some(fee_meter);
        self
    }

    /// Fee the transaction declared it will pay.
    pub fn declared_fee(&self) -> &Coins {
        &self.declared_fee
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn fee_meter(&mut self) -> Option<&mut (dyn FeeMeter + 'a)> {
        self.fee_meter.as_deref_mut()
    }

    pub fn has_fee_meter(&self) -> bool {
        self.fee_meter.is_some()
    }
}

/// Context handed to a handler for exactly one message.
#[derive(Debug)]
pub struct MsgContext {
    msg_type_url: String,
    gas_limit: u64,
    events: EventManager,
}

impl MsgContext {
    pub fn new(msg_type_url: impl Into<String>, gas_limit: u64) -> Self {
        Self {
            msg_type_url: msg_type_url.into(),
            gas_limit,
            events: EventManager::new(),
        }
    }

    pub fn msg_type_url(&self) -> &str {
        &self.msg_type_url
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn emit(&mut self, event: Event) {
        self.events.emit(event);
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }
}

/// Outcome of a successfully dispatched message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgResult {
    /// Encoded handler response.
    pub data: Vec<u8>,
    pub msg_response_type_url: String,
    /// Handler events followed by the `message` event.
    pub events: Vec<Event>,
}

/// Packages a handler response together with the events it emitted.
pub fn wrap_service_result(ctx: MsgContext, response: &dyn MsgResponse) -> MsgResult {
    let action = Event::new(EVENT_MESSAGE).with_attribute("action", ctx.msg_type_url.clone());
    let mut events = ctx.events.into_events();
    events.push(action);

    MsgResult {
        data: response.encode(),
        msg_response_type_url: response.type_url().to_string(),
        events,
    }
}
