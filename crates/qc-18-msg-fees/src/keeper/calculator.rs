//! Fee distribution calculator.

use super::MsgFeesKeeper;
use crate::domain::{
    Coin, Coins, Msg, MsgAssessCustomMsgFee, MsgFeesDistribution, MsgFeesError, TypedMsg,
    USD_DENOM,
};
use tracing::{debug, warn};

/// Checks that the declared transaction fee covers the floor gas price for
/// `gas_limit` plus `msg_fees`.
pub fn ensure_sufficient_fees(
    declared_fee: &Coins,
    floor_gas_price: &Coin,
    gas_limit: u64,
    msg_fees: &Coins,
) -> Result<(), MsgFeesError> {
    let floor_amount = floor_gas_price
        .amount
        .checked_mul(gas_limit as u128)
        .ok_or_else(|| {
            MsgFeesError::InvalidAmount(format!(
                "floor gas price {} overflows for gas limit {}",
                floor_gas_price, gas_limit
            ))
        })?;

    let mut required = Coins::from(Coin::new(floor_gas_price.denom.clone(), floor_amount));
    required.add(msg_fees)?;

    if !declared_fee.is_all_gte(&required) {
        warn!(
            "[qc-18] insufficient fee: got {} required {}",
            declared_fee, required
        );
        return Err(MsgFeesError::InsufficientFee {
            got: declared_fee.to_string(),
            required: required.to_string(),
        });
    }

    Ok(())
}

impl MsgFeesKeeper {
    /// Converts a reference-denom amount into the conversion fee denom.
    ///
    /// Amounts already in the conversion denom pass through; any other denom
    /// is rejected.
    pub fn convert_denom_to_conversion_denom(&self, coin: &Coin) -> Result<Coin, MsgFeesError> {
        let params = self.get_params()?;

        if coin.denom == USD_DENOM {
            let amount = coin
                .amount
                .checked_mul(params.usd_conversion_rate as u128)
                .ok_or_else(|| {
                    MsgFeesError::InvalidAmount(format!("conversion of {} overflows", coin))
                })?;
            return Ok(Coin::new(params.conversion_fee_denom, amount));
        }
        if coin.denom == params.conversion_fee_denom {
            return Ok(coin.clone());
        }

        Err(MsgFeesError::UnsupportedDenomination(coin.denom.clone()))
    }

    /// Computes the additional fees owed for `msgs` and how they split.
    ///
    /// Pure with respect to the store: the same messages against the same
    /// rules always produce the same plan.
    pub fn calculate_additional_fees_to_be_paid(
        &self,
        msgs: &[&dyn Msg],
    ) -> Result<MsgFeesDistribution, MsgFeesError> {
        let mut distribution = MsgFeesDistribution::new();

        for msg in msgs {
            let type_url = msg.type_url();

            if let Some(msg_fee) = self.get_msg_fee(type_url)? {
                distribution.increase(
                    &msg_fee.additional_fee,
                    msg_fee.recipient_basis_points,
                    &msg_fee.recipient,
                )?;
            }

            if type_url == MsgAssessCustomMsgFee::TYPE_URL {
                let assess = msg
                    .as_any()
                    .downcast_ref::<MsgAssessCustomMsgFee>()
                    .ok_or_else(|| {
                        MsgFeesError::InvalidRequest(format!(
                            "unable to convert {:?} to MsgAssessCustomMsgFee",
                            msg
                        ))
                    })?;

                let fee = self.convert_denom_to_conversion_denom(&assess.amount)?;
                let bips = assess.bips()?;
                distribution.increase(&fee, bips, &assess.recipient)?;
            }
        }

        debug!(
            "[qc-18] calculated additional fees {} for {} msgs",
            distribution.total_additional_fees,
            msgs.len()
        );
        Ok(distribution)
    }
}
