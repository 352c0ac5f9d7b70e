//! Value objects for the Message Fees subsystem.
//!
//! Denominated amounts (`Coin`), multi-denomination bags (`Coins`) and
//! account addresses.

use super::errors::MsgFeesError;
use primitive_types::H160;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Integer quantity of a single denomination.
pub type Amount = u128;

/// Account address (20 bytes, rendered as `0x`-prefixed hex).
pub type Address = H160;

/// Shortest accepted denomination.
const MIN_DENOM_LEN: usize = 3;
/// Longest accepted denomination.
const MAX_DENOM_LEN: usize = 128;

/// Validates a denomination string.
///
/// A denom starts with an ASCII letter and continues with letters, digits or
/// one of `/:._-`.
pub fn validate_denom(denom: &str) -> Result<(), MsgFeesError> {
    if denom.len() < MIN_DENOM_LEN || denom.len() > MAX_DENOM_LEN {
        return Err(MsgFeesError::InvalidAmount(format!(
            "invalid denom length: {:?}",
            denom
        )));
    }

    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    if !first_ok || !rest_ok {
        return Err(MsgFeesError::InvalidAmount(format!(
            "invalid denom: {:?}",
            denom
        )));
    }

    Ok(())
}

/// Parses a `0x`-prefixed, 40 hex digit address.
pub fn parse_address(text: &str) -> Result<Address, MsgFeesError> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| MsgFeesError::InvalidAddress(format!("missing 0x prefix: {:?}", text)))?;

    let bytes = hex::decode(digits)
        .map_err(|e| MsgFeesError::InvalidAddress(format!("{:?}: {}", text, e)))?;

    if bytes.len() != Address::len_bytes() {
        return Err(MsgFeesError::InvalidAddress(format!(
            "expected 20 bytes, got {}: {:?}",
            bytes.len(),
            text
        )));
    }

    Ok(Address::from_slice(&bytes))
}

/// Renders an address in the form accepted by [`parse_address`].
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

/// An amount of a single denomination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// A coin is well formed when its denom is valid.
    pub fn validate(&self) -> Result<(), MsgFeesError> {
        validate_denom(&self.denom)
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A bag of amounts keyed by denomination.
///
/// Zero amounts are never stored, so two bags holding the same value compare
/// equal regardless of how they were built.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coins(BTreeMap<String, Amount>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a bag from a list of coins, summing duplicate denoms.
    pub fn from_coins<'a>(coins: impl IntoIterator<Item = &'a Coin>) -> Result<Self, MsgFeesError> {
        let mut bag = Self::new();
        for coin in coins {
            bag.add_coin(coin)?;
        }
        Ok(bag)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Amount held for `denom` (zero when absent).
    pub fn amount_of(&self, denom: &str) -> Amount {
        self.0.get(denom).copied().unwrap_or(0)
    }

    /// Coins in denom order.
    pub fn iter(&self) -> impl Iterator<Item = Coin> + '_ {
        self.0
            .iter()
            .map(|(denom, amount)| Coin::new(denom.clone(), *amount))
    }

    pub fn add_coin(&mut self, coin: &Coin) -> Result<(), MsgFeesError> {
        if coin.is_zero() {
            return Ok(());
        }
        coin.validate()?;

        let slot = self.0.entry(coin.denom.clone()).or_insert(0);
        *slot = slot.checked_add(coin.amount).ok_or_else(|| {
            MsgFeesError::InvalidAmount(format!("overflow adding {}", coin))
        })?;
        Ok(())
    }

    /// Adds every denomination of `other`. On overflow `self` is unchanged.
    pub fn add(&mut self, other: &Coins) -> Result<(), MsgFeesError> {
        *self = self.checked_add(other)?;
        Ok(())
    }

    /// Returns `self + other` without touching `self`.
    pub fn checked_add(&self, other: &Coins) -> Result<Coins, MsgFeesError> {
        let mut sum = self.clone();
        for coin in other.iter() {
            sum.add_coin(&coin)?;
        }
        Ok(sum)
    }

    /// Returns `self - other`, or `None` if any denomination would go negative.
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut result = self.0.clone();
        for (denom, amount) in &other.0 {
            let have = result.get(denom).copied().unwrap_or(0);
            let left = have.checked_sub(*amount)?;
            if left == 0 {
                result.remove(denom);
            } else {
                result.insert(denom.clone(), left);
            }
        }
        Some(Coins(result))
    }

    /// True when every denomination in `required` is covered by `self`.
    pub fn is_all_gte(&self, required: &Coins) -> bool {
        required
            .0
            .iter()
            .all(|(denom, amount)| self.amount_of(denom) >= *amount)
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        let mut bag = Coins::new();
        if !coin.is_zero() {
            bag.0.insert(coin.denom, coin.amount);
        }
        bag
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", rendered.join(","))
    }
}
