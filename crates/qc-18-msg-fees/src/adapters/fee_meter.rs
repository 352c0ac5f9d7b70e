//! Fee gas meter attached to transactions by the fee-charging pipeline.

use crate::domain::{Coins, MsgFeesError};
use crate::ports::FeeMeter;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Tracks the additional fees consumed by each message of a transaction.
///
/// The per-recipient ledger is what the settlement step pays out; the empty
/// recipient key stands for the fee collector.
#[derive(Clone, Debug, Default)]
pub struct FeeGasMeter {
    simulate: bool,
    consumed: Coins,
    used_by_msg_type: BTreeMap<String, Coins>,
    distributions: BTreeMap<String, Coins>,
}

impl FeeGasMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulated() -> Self {
        Self {
            simulate: true,
            ..Self::default()
        }
    }

    /// Fees consumed for one message type across the transaction.
    pub fn fee_consumed_by_msg_type(&self, msg_type_url: &str) -> Coins {
        self.used_by_msg_type
            .get(msg_type_url)
            .cloned()
            .unwrap_or_default()
    }

    /// Fees owed per recipient, keyed for [`crate::keeper::MsgFeesKeeper::deduct_fees_distributions`].
    pub fn fee_consumed_distributions(&self) -> HashMap<String, Coins> {
        self.distributions
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn updated_ledgers(
        &self,
        amount: &Coins,
        msg_type_url: &str,
        recipient: &str,
    ) -> Result<(Coins, Coins, Coins), MsgFeesError> {
        let consumed = self.consumed.checked_add(amount)?;
        let by_type = self
            .fee_consumed_by_msg_type(msg_type_url)
            .checked_add(amount)?;
        let by_recipient = self
            .distributions
            .get(recipient)
            .cloned()
            .unwrap_or_default()
            .checked_add(amount)?;
        Ok((consumed, by_type, by_recipient))
    }
}

impl FeeMeter for FeeGasMeter {
    fn is_simulate(&self) -> bool {
        self.simulate
    }

    fn fee_consumed(&self) -> Coins {
        self.consumed.clone()
    }

    /// Records `amount` in all three ledgers or in none of them.
    fn consume_fee(
        &mut self,
        amount: &Coins,
        msg_type_url: &str,
        recipient: &str,
    ) -> Result<(), MsgFeesError> {
        if amount.is_zero() {
            return Ok(());
        }

        let (consumed, by_type, by_recipient) = self
            .updated_ledgers(amount, msg_type_url, recipient)
            .map_err(|e| {
                warn!("[qc-18] fee meter overflow for {}: {}", msg_type_url, e);
                e
            })?;

        debug!(
            "[qc-18] consuming {} for {} (recipient {:?})",
            amount, msg_type_url, recipient
        );
        self.consumed = consumed;
        self.used_by_msg_type
            .insert(msg_type_url.to_string(), by_type);
        self.distributions.insert(recipient.to_string(), by_recipient);
        Ok(())
    }
}
