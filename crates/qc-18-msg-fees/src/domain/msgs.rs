//! Message and response contracts, plus the messages owned by this module.
//!
//! Every routable request implements [`Msg`]; concrete request types also
//! implement [`TypedMsg`] so the router can bind them at registration time
//! without inspecting handlers.

use super::entities::determine_bips;
use super::errors::MsgFeesError;
use super::value_objects::{parse_address, Coin};
use std::any::Any;
use std::fmt;

/// A routable request.
pub trait Msg: Any + fmt::Debug + Send + Sync {
    /// Fully qualified type URL, e.g. `/qc.bank.v1.MsgSend`.
    fn type_url(&self) -> &str;

    /// Stateless structural checks run before the handler.
    fn validate_basic(&self) -> Result<(), MsgFeesError> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any;
}

/// A concrete request type with a compile-time type URL.
pub trait TypedMsg: Msg + Sized {
    const TYPE_URL: &'static str;
}

/// A handler response.
pub trait MsgResponse: Any + fmt::Debug + Send + Sync {
    fn type_url(&self) -> &str;

    /// Encoded response bytes placed in the dispatch result.
    fn encode(&self) -> Vec<u8>;
}

/// A concrete response type with a compile-time type URL.
pub trait TypedResponse: MsgResponse + Sized {
    const TYPE_URL: &'static str;
}

/// Strips the leading `/` of a type URL to obtain the message name.
pub fn msg_name(type_url: &str) -> &str {
    type_url.strip_prefix('/').unwrap_or(type_url)
}

macro_rules! impl_msg {
    ($ty:ty, $url:expr) => {
        impl TypedMsg for $ty {
            const TYPE_URL: &'static str = $url;
        }
    };
}

macro_rules! impl_empty_response {
    ($ty:ident, $url:expr) => {
        #[derive(Clone, Debug, Default, PartialEq, Eq)]
        pub struct $ty;

        impl MsgResponse for $ty {
            fn type_url(&self) -> &str {
                $url
            }

            fn encode(&self) -> Vec<u8> {
                Vec::new()
            }
        }

        impl TypedResponse for $ty {
            const TYPE_URL: &'static str = $url;
        }
    };
}

fn validate_authority(authority: &str) -> Result<(), MsgFeesError> {
    parse_address(authority).map(|_| ())
}

fn validate_type_url(msg_type_url: &str) -> Result<(), MsgFeesError> {
    if msg_type_url.is_empty() {
        return Err(MsgFeesError::EmptyMessageType);
    }
    Ok(())
}

/// Assesses a caller-declared fee on top of any scheduled fee.
///
/// The amount may be given in [`crate::domain::USD_DENOM`]; it is converted
/// into the conversion fee denom before it is split.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgAssessCustomMsgFee {
    pub name: String,
    pub amount: Coin,
    pub recipient: String,
    pub from: String,
    /// Decimal text; empty means the default split when a recipient is set.
    pub recipient_basis_points: String,
}

impl MsgAssessCustomMsgFee {
    pub fn bips(&self) -> Result<u32, MsgFeesError> {
        determine_bips(&self.recipient, &self.recipient_basis_points)
    }
}

impl Msg for MsgAssessCustomMsgFee {
    fn type_url(&self) -> &str {
        Self::TYPE_URL
    }

    fn validate_basic(&self) -> Result<(), MsgFeesError> {
        self.amount.validate()?;
        if self.amount.is_zero() {
            return Err(MsgFeesError::InvalidAmount(format!(
                "amount must be positive: {}",
                self.amount
            )));
        }
        parse_address(&self.from)?;
        if !self.recipient.is_empty() {
            parse_address(&self.recipient)?;
        }
        self.bips()?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_msg!(MsgAssessCustomMsgFee, "/qc.msgfees.v1.MsgAssessCustomMsgFee");
impl_empty_response!(
    MsgAssessCustomMsgFeeResponse,
    "/qc.msgfees.v1.MsgAssessCustomMsgFeeResponse"
);

/// Governance request to create a fee rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgAddMsgFee {
    pub authority: String,
    pub msg_type_url: String,
    pub additional_fee: Coin,
    pub recipient: String,
    pub recipient_basis_points: String,
}

impl Msg for MsgAddMsgFee {
    fn type_url(&self) -> &str {
        Self::TYPE_URL
    }

    fn validate_basic(&self) -> Result<(), MsgFeesError> {
        validate_authority(&self.authority)?;
        validate_type_url(&self.msg_type_url)?;
        self.additional_fee.validate()?;
        if !self.recipient.is_empty() {
            parse_address(&self.recipient)?;
        }
        determine_bips(&self.recipient, &self.recipient_basis_points)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_msg!(MsgAddMsgFee, "/qc.msgfees.v1.MsgAddMsgFee");
impl_empty_response!(MsgAddMsgFeeResponse, "/qc.msgfees.v1.MsgAddMsgFeeResponse");

/// Governance request to replace an existing fee rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgUpdateMsgFee {
    pub authority: String,
    pub msg_type_url: String,
    pub additional_fee: Coin,
    pub recipient: String,
    pub recipient_basis_points: String,
}

impl Msg for MsgUpdateMsgFee {
    fn type_url(&self) -> &str {
        Self::TYPE_URL
    }

    fn validate_basic(&self) -> Result<(), MsgFeesError> {
        validate_authority(&self.authority)?;
        validate_type_url(&self.msg_type_url)?;
        self.additional_fee.validate()?;
        if !self.recipient.is_empty() {
            parse_address(&self.recipient)?;
        }
        determine_bips(&self.recipient, &self.recipient_basis_points)?;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_msg!(MsgUpdateMsgFee, "/qc.msgfees.v1.MsgUpdateMsgFee");
impl_empty_response!(
    MsgUpdateMsgFeeResponse,
    "/qc.msgfees.v1.MsgUpdateMsgFeeResponse"
);

/// Governance request to delete a fee rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgRemoveMsgFee {
    pub authority: String,
    pub msg_type_url: String,
}

impl Msg for MsgRemoveMsgFee {
    fn type_url(&self) -> &str {
        Self::TYPE_URL
    }

    fn validate_basic(&self) -> Result<(), MsgFeesError> {
        validate_authority(&self.authority)?;
        validate_type_url(&self.msg_type_url)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_msg!(MsgRemoveMsgFee, "/qc.msgfees.v1.MsgRemoveMsgFee");
impl_empty_response!(
    MsgRemoveMsgFeeResponse,
    "/qc.msgfees.v1.MsgRemoveMsgFeeResponse"
);

/// Governance request to change the conversion fee denom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgUpdateConversionFeeDenom {
    pub authority: String,
    pub conversion_fee_denom: String,
}

impl Msg for MsgUpdateConversionFeeDenom {
    fn type_url(&self) -> &str {
        Self::TYPE_URL
    }

    fn validate_basic(&self) -> Result<(), MsgFeesError> {
        validate_authority(&self.authority)?;
        super::value_objects::validate_denom(&self.conversion_fee_denom)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_msg!(
    MsgUpdateConversionFeeDenom,
    "/qc.msgfees.v1.MsgUpdateConversionFeeDenom"
);
impl_empty_response!(
    MsgUpdateConversionFeeDenomResponse,
    "/qc.msgfees.v1.MsgUpdateConversionFeeDenomResponse"
);

/// Governance request to change the USD conversion rate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgUpdateUsdConversionRate {
    pub authority: String,
    pub usd_conversion_rate: u64,
}

impl Msg for MsgUpdateUsdConversionRate {
    fn type_url(&self) -> &str {
        Self::TYPE_URL
    }

    fn validate_basic(&self) -> Result<(), MsgFeesError> {
        validate_authority(&self.authority)?;
        if self.usd_conversion_rate == 0 {
            return Err(MsgFeesError::InvalidRequest(
                "usd conversion rate must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl_msg!(
    MsgUpdateUsdConversionRate,
    "/qc.msgfees.v1.MsgUpdateUsdConversionRate"
);
impl_empty_response!(
    MsgUpdateUsdConversionRateResponse,
    "/qc.msgfees.v1.MsgUpdateUsdConversionRateResponse"
);

/// Type URLs of every message owned by this module.
pub fn module_msg_type_urls() -> [&'static str; 6] {
    [
        MsgAssessCustomMsgFee::TYPE_URL,
        MsgAddMsgFee::TYPE_URL,
        MsgUpdateMsgFee::TYPE_URL,
        MsgRemoveMsgFee::TYPE_URL,
        MsgUpdateConversionFeeDenom::TYPE_URL,
        MsgUpdateUsdConversionRate::TYPE_URL,
    ]
}
