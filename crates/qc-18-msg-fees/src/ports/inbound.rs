//! Inbound Ports (Driving Ports / API)
//!
//! Administrative and query surface consumed by governance and operators.

use crate::domain::entities::{MsgFee, MsgFeesDistribution, Params};
use crate::domain::errors::MsgFeesError;
use crate::domain::msgs::{
    Msg, MsgAddMsgFee, MsgRemoveMsgFee, MsgUpdateConversionFeeDenom, MsgUpdateMsgFee,
    MsgUpdateUsdConversionRate,
};

/// Message Fees API.
///
/// Mutating calls require the request's `authority` to equal
/// [`authority`](Self::authority).
pub trait MsgFeesApi: Send + Sync {
    /// Address allowed to change the fee schedule and params.
    fn authority(&self) -> &str;

    fn add_msg_fee(&self, request: &MsgAddMsgFee) -> Result<(), MsgFeesError>;

    fn update_msg_fee(&self, request: &MsgUpdateMsgFee) -> Result<(), MsgFeesError>;

    fn remove_msg_fee(&self, request: &MsgRemoveMsgFee) -> Result<(), MsgFeesError>;

    fn update_conversion_fee_denom(
        &self,
        request: &MsgUpdateConversionFeeDenom,
    ) -> Result<(), MsgFeesError>;

    fn update_usd_conversion_rate(
        &self,
        request: &MsgUpdateUsdConversionRate,
    ) -> Result<(), MsgFeesError>;

    fn query_msg_fee(&self, msg_type_url: &str) -> Result<Option<MsgFee>, MsgFeesError>;

    /// Every rule in message-type order.
    fn query_all_msg_fees(&self) -> Result<Vec<MsgFee>, MsgFeesError>;

    fn query_params(&self) -> Result<Params, MsgFeesError>;

    /// Fee plan the given messages would be charged.
    fn calculate_msg_fees(&self, msgs: &[&dyn Msg]) -> Result<MsgFeesDistribution, MsgFeesError>;
}
