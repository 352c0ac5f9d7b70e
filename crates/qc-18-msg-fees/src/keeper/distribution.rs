//! Distribution executor: pays a fee plan out of a payer account.

use super::MsgFeesKeeper;
use crate::domain::{parse_address, sorted_entries, Address, Coins, MsgFeesDistribution, MsgFeesError};
use crate::ports::Bank;
use std::collections::HashMap;
use tracing::{debug, error};

impl MsgFeesKeeper {
    /// Pays `fees` out of `payer` and sweeps whatever is left of
    /// `remaining_fees` to the fee collector.
    ///
    /// Keys of `fees` are recipient addresses; the empty key goes to the fee
    /// collector. Recipients are paid in ascending key order. Assumes an
    /// all-or-nothing enclosing transaction: a failure part way through leaves
    /// earlier transfers for the caller to discard.
    pub fn deduct_fees_distributions(
        &self,
        bank: &dyn Bank,
        payer: &Address,
        remaining_fees: &Coins,
        fees: &HashMap<String, Coins>,
    ) -> Result<(), MsgFeesError> {
        let mut sent = Coins::new();

        for (key, coins) in sorted_entries(fees) {
            if coins.is_zero() {
                continue;
            }

            if key.is_empty() {
                bank.send_coins_to_module(payer, self.fee_collector_name(), coins)
                    .map_err(|e| MsgFeesError::InsufficientFunds(e.to_string()))?;
            } else {
                let recipient = parse_address(key)?;
                bank.send_coins(payer, &recipient, coins)
                    .map_err(|e| MsgFeesError::InsufficientFunds(e.to_string()))?;
            }
            debug!("[qc-18] distributed {} to {:?}", coins, key);

            sent.add(coins)?;
        }

        let unsent = remaining_fees.checked_sub(&sent).ok_or_else(|| {
            error!(
                "[qc-18] distribution exceeds available fees: remaining {} sent {}",
                remaining_fees, sent
            );
            MsgFeesError::InsufficientFunds(format!(
                "negative balance after sending coins to accounts and fee collector: \
                 remaining fees {}, sent {}",
                remaining_fees, sent
            ))
        })?;

        if !unsent.is_zero() {
            bank.send_coins_to_module(payer, self.fee_collector_name(), &unsent)
                .map_err(|e| MsgFeesError::InsufficientFunds(e.to_string()))?;
            debug!("[qc-18] swept {} to {}", unsent, self.fee_collector_name());
        }

        Ok(())
    }

    /// Settles a calculated plan, with the module-retained portion going to the
    /// fee collector.
    pub fn settle_distribution(
        &self,
        bank: &dyn Bank,
        payer: &Address,
        total_available: &Coins,
        distribution: &MsgFeesDistribution,
    ) -> Result<(), MsgFeesError> {
        self.deduct_fees_distributions(bank, payer, total_available, &distribution.settlement_map())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryBank, InMemoryKvStore};
    use crate::config::{MsgFeesConfig, FEE_COLLECTOR_NAME};
    use crate::domain::{format_address, BankError, Coin};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records every transfer as `(destination, amount)` in call order.
    #[derive(Default)]
    struct RecordingBank {
        transfers: Mutex<Vec<(String, Coins)>>,
    }

    impl RecordingBank {
        fn transfers(&self) -> Vec<(String, Coins)> {
            self.transfers.lock().clone()
        }
    }

    impl Bank for RecordingBank {
        fn send_coins(&self, _from: &Address, to: &Address, amount: &Coins) -> Result<(), BankError> {
            self.transfers
                .lock()
                .push((format_address(to), amount.clone()));
            Ok(())
        }

        fn send_coins_to_module(
            &self,
            _from: &Address,
            module: &str,
            amount: &Coins,
        ) -> Result<(), BankError> {
            self.transfers
                .lock()
                .push((module.to_string(), amount.clone()));
            Ok(())
        }
    }

    fn nqc(amount: u128) -> Coins {
        Coins::from(Coin::new("nqc", amount))
    }

    fn setup(balance: u128) -> (MsgFeesKeeper, InMemoryBank, Address) {
        let keeper = MsgFeesKeeper::new(Arc::new(InMemoryKvStore::new()), MsgFeesConfig::default());
        let bank = InMemoryBank::new();
        bank.register_module(FEE_COLLECTOR_NAME);
        let payer = Address::repeat_byte(0xaa);
        bank.mint(payer, &nqc(balance)).unwrap();
        (keeper, bank, payer)
    }

    #[test]
    fn test_distribute_and_sweep_remainder() {
        let (keeper, bank, payer) = setup(1_000);
        let r1 = Address::repeat_byte(1);
        let r2 = Address::repeat_byte(2);
        let fees: HashMap<String, Coins> = [
            (format_address(&r2), nqc(20)),
            (String::new(), nqc(30)),
            (format_address(&r1), nqc(10)),
        ]
        .into_iter()
        .collect();

        keeper
            .deduct_fees_distributions(&bank, &payer, &nqc(100), &fees)
            .unwrap();

        assert_eq!(bank.balance(&r1), nqc(10));
        assert_eq!(bank.balance(&r2), nqc(20));
        // 30 from the empty key plus the 40 swept remainder
        assert_eq!(bank.module_balance(FEE_COLLECTOR_NAME), nqc(70));
        assert_eq!(bank.balance(&payer), nqc(900));
    }

    #[test]
    fn test_recipients_paid_in_key_order_then_sweep() {
        let keeper = MsgFeesKeeper::new(Arc::new(InMemoryKvStore::new()), MsgFeesConfig::default());
        let bank = RecordingBank::default();
        let r1 = format_address(&Address::repeat_byte(1));
        let r2 = format_address(&Address::repeat_byte(2));
        let mut fees = HashMap::new();
        fees.insert(r2.clone(), nqc(20));
        fees.insert(String::new(), nqc(30));
        fees.insert(r1.clone(), nqc(10));

        keeper
            .deduct_fees_distributions(&bank, &Address::repeat_byte(0xaa), &nqc(100), &fees)
            .unwrap();

        assert_eq!(
            bank.transfers(),
            vec![
                (FEE_COLLECTOR_NAME.to_string(), nqc(30)),
                (r1, nqc(10)),
                (r2, nqc(20)),
                (FEE_COLLECTOR_NAME.to_string(), nqc(40)),
            ]
        );
    }

    #[test]
    fn test_plan_exceeding_available_fails() {
        let (keeper, bank, payer) = setup(1_000);
        let fees: HashMap<String, Coins> =
            [(format_address(&Address::repeat_byte(1)), nqc(60))].into_iter().collect();

        assert!(matches!(
            keeper.deduct_fees_distributions(&bank, &payer, &nqc(50), &fees),
            Err(MsgFeesError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn test_invalid_recipient_address() {
        let (keeper, bank, payer) = setup(1_000);
        let fees: HashMap<String, Coins> = [("not-an-address".to_string(), nqc(5))]
            .into_iter()
            .collect();

        assert!(matches!(
            keeper.deduct_fees_distributions(&bank, &payer, &nqc(5), &fees),
            Err(MsgFeesError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_transfer_failure_is_insufficient_funds() {
        let (keeper, bank, payer) = setup(3);
        let fees: HashMap<String, Coins> = [(String::new(), nqc(5))].into_iter().collect();

        assert!(matches!(
            keeper.deduct_fees_distributions(&bank, &payer, &nqc(5), &fees),
            Err(MsgFeesError::InsufficientFunds(_))
        ));
    }

    #[test]
    fn test_settle_distribution_plan() {
        let (keeper, bank, payer) = setup(500);
        let r1 = Address::repeat_byte(1);
        let mut plan = MsgFeesDistribution::new();
        plan.increase(&Coin::new("nqc", 100), 2_500, &format_address(&r1))
            .unwrap();
        plan.increase(&Coin::new("nqc", 100), 2_500, &format_address(&r1))
            .unwrap();

        keeper
            .settle_distribution(&bank, &payer, &nqc(210), &plan)
            .unwrap();

        assert_eq!(bank.balance(&r1), nqc(50));
        assert_eq!(bank.module_balance(FEE_COLLECTOR_NAME), nqc(160));
        assert_eq!(bank.balance(&payer), nqc(290));
    }
}
