//! Error types for the Message Fees subsystem.

use thiserror::Error;

/// All runtime errors raised by the fee schedule, calculator, executor and
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MsgFeesError {
    /// Rule operation attempted with a blank message type.
    #[error("msg type is empty")]
    EmptyMessageType,

    /// A rule already exists for the message type.
    #[error("msg fee already exists for {0}")]
    AlreadyExists(String),

    /// No rule exists for the message type.
    #[error("msg fee does not exist for {0}")]
    NotFound(String),

    /// Basis points text is not an integer in [0, 10000].
    #[error("invalid recipient basis points: {0}")]
    InvalidBasisPoints(String),

    /// The fee schedule store rejected a rule write.
    #[error("invalid fee proposal: {0}")]
    InvalidProposal(String),

    /// Denomination cannot be converted into the conversion fee denom.
    #[error("denom not supported for conversion: {0}")]
    UnsupportedDenomination(String),

    /// Malformed or overflowing fee amount.
    #[error("invalid fee amount: {0}")]
    InvalidAmount(String),

    /// A transfer failed or the plan needs more than was made available.
    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Recipient is not a well-formed address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Declared transaction fee is below floor price plus additional fees.
    #[error("insufficient fee: got {got:?} required {required:?}")]
    InsufficientFee { got: String, required: String },

    /// The circuit breaker disallows this message type.
    #[error("circuit breaker disables execution of this message: {0}")]
    CircuitBreakerDisallowed(String),

    /// Handler returned something other than the declared response.
    #[error("invalid response type: expected {expected}, got {got}")]
    InvalidResponseType { expected: String, got: String },

    /// Signer is not the governance authority.
    #[error("expected {expected} as authority, got {got}")]
    Unauthorized { expected: String, got: String },

    /// No handler is registered for the message type.
    #[error("unrecognized message type: {0}")]
    UnknownMessageType(String),

    /// Message failed its own structural checks.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A handler failed while executing.
    #[error("handler failed: {0}")]
    Handler(String),

    /// Store access failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Stored bytes could not be decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

/// Failures surfaced by a [`crate::ports::KvStore`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store is read-only")]
    ReadOnly,

    #[error("backend error: {0}")]
    Backend(String),
}

/// Failures surfaced by a [`crate::ports::Bank`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    #[error("insufficient balance for {account}: has {available}, needs {required}")]
    InsufficientBalance {
        account: String,
        available: String,
        required: String,
    },

    #[error("unknown module account: {0}")]
    UnknownModule(String),

    #[error("balance overflow for {0}")]
    Overflow(String),
}

/// Fatal configuration errors found while building the router.
///
/// These indicate a broken build and stop the node at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error(
        "type_url {type_url} has not been registered yet; register all message types \
         in the type registry before registering service {service}"
    )]
    UnregisteredType { service: String, type_url: String },

    #[error(
        "msg service {method} has already been registered; make sure to only register \
         each service once"
    )]
    DuplicateRoute { method: String, type_url: String },
}
