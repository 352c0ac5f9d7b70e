use crate::domain::{format_address, Address, BankError, Coins};
use crate::ports::Bank;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

#[derive(Default)]
struct Balances {
    accounts: HashMap<Address, Coins>,
    modules: HashMap<String, Coins>,
}

/// In-memory implementation of Bank for testing.
///
/// Module accounts must be registered before they can receive coins.
#[derive(Default)]
pub struct InMemoryBank {
    balances: RwLock<Balances>,
}

impl InMemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty module account.
    pub fn register_module(&self, module: &str) {
        self.balances
            .write()
            .modules
            .entry(module.to_string())
            .or_default();
    }

    /// Credits `amount` to `account` out of thin air.
    pub fn mint(&self, account: Address, amount: &Coins) -> Result<(), BankError> {
        let mut balances = self.balances.write();
        balances
            .accounts
            .entry(account)
            .or_default()
            .add(amount)
            .map_err(|_| BankError::Overflow(format_address(&account)))
    }

    pub fn balance(&self, account: &Address) -> Coins {
        self.balances
            .read()
            .accounts
            .get(account)
            .cloned()
            .unwrap_or_default()
    }

    pub fn module_balance(&self, module: &str) -> Coins {
        self.balances
            .read()
            .modules
            .get(module)
            .cloned()
            .unwrap_or_default()
    }

    fn debit(balances: &mut Balances, from: &Address, amount: &Coins) -> Result<(), BankError> {
        let available = balances.accounts.get(from).cloned().unwrap_or_default();
        let left = available
            .checked_sub(amount)
            .ok_or_else(|| BankError::InsufficientBalance {
                account: format_address(from),
                available: available.to_string(),
                required: amount.to_string(),
            })?;
        balances.accounts.insert(*from, left);
        Ok(())
    }
}

impl Bank for InMemoryBank {
    fn send_coins(&self, from: &Address, to: &Address, amount: &Coins) -> Result<(), BankError> {
        let mut balances = self.balances.write();

        let mut credited = balances.accounts.get(to).cloned().unwrap_or_default();
        credited
            .add(amount)
            .map_err(|_| BankError::Overflow(format_address(to)))?;

        Self::debit(&mut balances, from, amount)?;
        // A self-transfer must see the debit before crediting.
        if from == to {
            credited = balances.accounts.get(to).cloned().unwrap_or_default();
            credited
                .add(amount)
                .map_err(|_| BankError::Overflow(format_address(to)))?;
        }
        balances.accounts.insert(*to, credited);

        debug!(
            "[qc-18] bank: sent {} from {} to {}",
            amount,
            format_address(from),
            format_address(to)
        );
        Ok(())
    }

    fn send_coins_to_module(
        &self,
        from: &Address,
        module: &str,
        amount: &Coins,
    ) -> Result<(), BankError> {
        let mut balances = self.balances.write();

        let mut credited = balances
            .modules
            .get(module)
            .cloned()
            .ok_or_else(|| BankError::UnknownModule(module.to_string()))?;
        credited
            .add(amount)
            .map_err(|_| BankError::Overflow(module.to_string()))?;

        Self::debit(&mut balances, from, amount)?;
        balances.modules.insert(module.to_string(), credited);

        debug!(
            "[qc-18] bank: sent {} from {} to module {}",
            amount,
            format_address(from),
            module
        );
        Ok(())
    }
}
