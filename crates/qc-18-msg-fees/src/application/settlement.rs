//! End-of-transaction settlement of consumed message fees.

use super::service::MsgFeesService;
use crate::adapters::FeeGasMeter;
use crate::domain::{Address, MsgFeesError};
use crate::ports::{Bank, FeeMeter};
use tracing::info;

impl MsgFeesService {
    /// Pays out everything `meter` consumed during the transaction.
    ///
    /// Recipients receive their recorded shares; the fee collector receives
    /// the module-retained portion and any unassigned remainder.
    pub fn settle_transaction(
        &self,
        bank: &dyn Bank,
        payer: &Address,
        meter: &FeeGasMeter,
    ) -> Result<(), MsgFeesError> {
        let consumed = meter.fee_consumed();
        if consumed.is_zero() {
            return Ok(());
        }

        self.keeper().deduct_fees_distributions(
            bank,
            payer,
            &consumed,
            &meter.fee_consumed_distributions(),
        )?;

        info!("[qc-18] settled {} msg fees for {:?}", consumed, payer);
        Ok(())
    }
}
