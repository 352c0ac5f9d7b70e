//! Message Fees Service
//!
//! Implements [`MsgFeesApi`] on top of the keeper and exposes the module's
//! own messages as a [`ServiceDesc`] for the router.

use crate::domain::{
    Event, Msg, MsgAddMsgFee, MsgAddMsgFeeResponse, MsgAssessCustomMsgFee,
    MsgAssessCustomMsgFeeResponse, MsgFee, MsgFeesDistribution, MsgFeesError, MsgRemoveMsgFee,
    MsgRemoveMsgFeeResponse, MsgUpdateConversionFeeDenom, MsgUpdateConversionFeeDenomResponse,
    MsgUpdateMsgFee, MsgUpdateMsgFeeResponse, MsgUpdateUsdConversionRate,
    MsgUpdateUsdConversionRateResponse, Params, EVENT_ASSESS_CUSTOM_MSG_FEE,
};
use crate::keeper::MsgFeesKeeper;
use crate::ports::inbound::MsgFeesApi;
use crate::router::{MethodDesc, MsgContext, ServiceDesc};
use std::sync::Arc;
use tracing::{info, warn};

/// Service name the module's messages are registered under.
pub const MSG_SERVICE_NAME: &str = "qc.msgfees.v1.Msg";

/// Message Fees Service
///
/// Governance requests are checked against the keeper's authority before
/// they touch the store.
#[derive(Clone)]
pub struct MsgFeesService {
    keeper: MsgFeesKeeper,
}

impl MsgFeesService {
    pub fn new(keeper: MsgFeesKeeper) -> Self {
        Self { keeper }
    }

    pub fn keeper(&self) -> &MsgFeesKeeper {
        &self.keeper
    }

    fn ensure_authority(&self, got: &str) -> Result<(), MsgFeesError> {
        if got != self.keeper.authority() {
            warn!("[qc-18] rejected request signed by {}", got);
            return Err(MsgFeesError::Unauthorized {
                expected: self.keeper.authority().to_string(),
                got: got.to_string(),
            });
        }
        Ok(())
    }

    /// Records an assessed custom fee.
    ///
    /// The fee itself is charged by the router when the message is
    /// dispatched; the handler only reports it.
    pub fn assess_custom_msg_fee(
        &self,
        ctx: &mut MsgContext,
        msg: &MsgAssessCustomMsgFee,
    ) -> Result<MsgAssessCustomMsgFeeResponse, MsgFeesError> {
        let bips = msg.bips()?;
        ctx.emit(
            Event::new(EVENT_ASSESS_CUSTOM_MSG_FEE)
                .with_attribute("name", msg.name.clone())
                .with_attribute("amount", msg.amount.to_string())
                .with_attribute("recipient", msg.recipient.clone())
                .with_attribute("recipient_basis_points", bips.to_string())
                .with_attribute("from", msg.from.clone()),
        );
        Ok(MsgAssessCustomMsgFeeResponse)
    }

    /// Descriptor binding every module message to this service.
    pub fn service_desc(self: Arc<Self>) -> ServiceDesc {
        let assess = Arc::clone(&self);
        let add = Arc::clone(&self);
        let update = Arc::clone(&self);
        let remove = Arc::clone(&self);
        let denom = Arc::clone(&self);
        let rate = self;

        ServiceDesc::new(MSG_SERVICE_NAME)
            .with_method(MethodDesc::typed(
                "AssessCustomMsgFee",
                move |ctx: &mut MsgContext, msg: &MsgAssessCustomMsgFee| {
                    assess.assess_custom_msg_fee(ctx, msg)
                },
            ))
            .with_method(MethodDesc::typed(
                "AddMsgFee",
                move |_ctx: &mut MsgContext, msg: &MsgAddMsgFee| {
                    add.add_msg_fee(msg).map(|_| MsgAddMsgFeeResponse)
                },
            ))
            .with_method(MethodDesc::typed(
                "UpdateMsgFee",
                move |_ctx: &mut MsgContext, msg: &MsgUpdateMsgFee| {
                    update.update_msg_fee(msg).map(|_| MsgUpdateMsgFeeResponse)
                },
            ))
            .with_method(MethodDesc::typed(
                "RemoveMsgFee",
                move |_ctx: &mut MsgContext, msg: &MsgRemoveMsgFee| {
                    remove.remove_msg_fee(msg).map(|_| MsgRemoveMsgFeeResponse)
                },
            ))
            .with_method(MethodDesc::typed(
                "UpdateConversionFeeDenom",
                move |_ctx: &mut MsgContext, msg: &MsgUpdateConversionFeeDenom| {
                    denom
                        .update_conversion_fee_denom(msg)
                        .map(|_| MsgUpdateConversionFeeDenomResponse)
                },
            ))
            .with_method(MethodDesc::typed(
                "UpdateUsdConversionRate",
                move |_ctx: &mut MsgContext, msg: &MsgUpdateUsdConversionRate| {
                    rate.update_usd_conversion_rate(msg)
                        .map(|_| MsgUpdateUsdConversionRateResponse)
                },
            ))
    }
}

impl MsgFeesApi for MsgFeesService {
    fn authority(&self) -> &str {
        self.keeper.authority()
    }

    fn add_msg_fee(&self, request: &MsgAddMsgFee) -> Result<(), MsgFeesError> {
        self.ensure_authority(&request.authority)?;
        request.validate_basic()?;

        self.keeper.add_msg_fee(
            &request.msg_type_url,
            &request.recipient,
            &request.recipient_basis_points,
            request.additional_fee.clone(),
        )
    }

    fn update_msg_fee(&self, request: &MsgUpdateMsgFee) -> Result<(), MsgFeesError> {
        self.ensure_authority(&request.authority)?;
        request.validate_basic()?;

        self.keeper.update_msg_fee(
            &request.msg_type_url,
            &request.recipient,
            &request.recipient_basis_points,
            request.additional_fee.clone(),
        )
    }

    fn remove_msg_fee(&self, request: &MsgRemoveMsgFee) -> Result<(), MsgFeesError> {
        self.ensure_authority(&request.authority)?;
        request.validate_basic()?;

        self.keeper.remove_msg_fee(&request.msg_type_url)
    }

    fn update_conversion_fee_denom(
        &self,
        request: &MsgUpdateConversionFeeDenom,
    ) -> Result<(), MsgFeesError> {
        self.ensure_authority(&request.authority)?;
        request.validate_basic()?;

        let mut params = self.keeper.get_params()?;
        params.conversion_fee_denom = request.conversion_fee_denom.clone();
        self.keeper.set_params(&params)?;

        info!(
            "[qc-18] conversion fee denom set to {}",
            request.conversion_fee_denom
        );
        Ok(())
    }

    fn update_usd_conversion_rate(
        &self,
        request: &MsgUpdateUsdConversionRate,
    ) -> Result<(), MsgFeesError> {
        self.ensure_authority(&request.authority)?;
        request.validate_basic()?;

        let mut params = self.keeper.get_params()?;
        params.usd_conversion_rate = request.usd_conversion_rate;
        self.keeper.set_params(&params)?;

        info!(
            "[qc-18] usd conversion rate set to {}",
            request.usd_conversion_rate
        );
        Ok(())
    }

    fn query_msg_fee(&self, msg_type_url: &str) -> Result<Option<MsgFee>, MsgFeesError> {
        if msg_type_url.is_empty() {
            return Err(MsgFeesError::EmptyMessageType);
        }
        self.keeper.get_msg_fee(msg_type_url)
    }

    fn query_all_msg_fees(&self) -> Result<Vec<MsgFee>, MsgFeesError> {
        self.keeper.all_msg_fees()
    }

    fn query_params(&self) -> Result<Params, MsgFeesError> {
        self.keeper.get_params()
    }

    fn calculate_msg_fees(&self, msgs: &[&dyn Msg]) -> Result<MsgFeesDistribution, MsgFeesError> {
        self.keeper.calculate_additional_fees_to_be_paid(msgs)
    }
}
