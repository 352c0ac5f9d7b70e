//! Domain entities for the Message Fees subsystem.
//!
//! - [`MsgFee`]: the fee rule stored per message type
//! - [`MsgFeesDistribution`]: the plan accumulated while scanning messages
//! - [`Params`]: governance-managed settings read by the calculator and router
//! - [`GenesisState`]: import/export snapshot of the module

use super::errors::MsgFeesError;
use super::value_objects::{parse_address, validate_denom, Amount, Coin, Coins};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Upper bound for recipient basis points (100%).
pub const MAX_BASIS_POINTS: u32 = 10_000;

/// Recipient share used when a recipient is set without explicit basis points.
pub const DEFAULT_MSG_FEE_BIPS: u32 = 5_000;

/// The USD-pegged reference denomination. One unit is a thousandth of a dollar.
pub const USD_DENOM: &str = "usd";

/// Native denomination fees are converted into by default.
pub const DEFAULT_CONVERSION_FEE_DENOM: &str = "nqc";

/// Native units per reference unit.
pub const DEFAULT_USD_CONVERSION_RATE: u64 = 40_000_000;

/// Default floor gas price amount (in the conversion fee denom).
pub const DEFAULT_FLOOR_GAS_PRICE: Amount = 1_000;

/// Resolves the effective basis points for a rule or custom fee.
///
/// - recipient and text set: parse the text, must be in [0, 10000]
/// - recipient set, text empty: [`DEFAULT_MSG_FEE_BIPS`]
/// - recipient empty: always 0
pub fn determine_bips(recipient: &str, basis_points: &str) -> Result<u32, MsgFeesError> {
    if recipient.is_empty() {
        return Ok(0);
    }
    if basis_points.is_empty() {
        return Ok(DEFAULT_MSG_FEE_BIPS);
    }

    let bips: u32 = basis_points
        .parse()
        .map_err(|e| MsgFeesError::InvalidBasisPoints(format!("{:?}: {}", basis_points, e)))?;
    if bips > MAX_BASIS_POINTS {
        return Err(MsgFeesError::InvalidBasisPoints(format!(
            "recipient basis points can only be between 0 and 10,000: {}",
            basis_points
        )));
    }

    Ok(bips)
}

/// Splits `amount` into `(recipient_share, remainder)`.
///
/// The share is `floor(amount * bips / 10000)`, computed without overflowing
/// for any `Amount`. The two parts always sum to `amount`.
pub fn split_amount(amount: Amount, bips: u32) -> Result<(Amount, Amount), MsgFeesError> {
    if bips > MAX_BASIS_POINTS {
        return Err(MsgFeesError::InvalidBasisPoints(bips.to_string()));
    }

    let denominator = MAX_BASIS_POINTS as Amount;
    let bips = bips as Amount;
    // amount = q * 10000 + r, so floor(amount * bips / 10000) = q * bips + floor(r * bips / 10000)
    let share = (amount / denominator) * bips + (amount % denominator) * bips / denominator;

    Ok((share, amount - share))
}

/// Additional fee rule for one message type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgFee {
    pub msg_type_url: String,
    pub additional_fee: Coin,
    /// Empty means the whole fee goes to the fee collector.
    pub recipient: String,
    pub recipient_basis_points: u32,
}

impl MsgFee {
    pub fn new(
        msg_type_url: impl Into<String>,
        additional_fee: Coin,
        recipient: impl Into<String>,
        recipient_basis_points: u32,
    ) -> Self {
        Self {
            msg_type_url: msg_type_url.into(),
            additional_fee,
            recipient: recipient.into(),
            recipient_basis_points,
        }
    }

    /// Checks the rule invariants. The store itself never calls this.
    pub fn validate(&self) -> Result<(), MsgFeesError> {
        if self.msg_type_url.is_empty() {
            return Err(MsgFeesError::EmptyMessageType);
        }
        self.additional_fee.validate()?;

        if self.recipient_basis_points > MAX_BASIS_POINTS {
            return Err(MsgFeesError::InvalidBasisPoints(
                self.recipient_basis_points.to_string(),
            ));
        }
        if self.recipient.is_empty() {
            if self.recipient_basis_points != 0 {
                return Err(MsgFeesError::InvalidBasisPoints(format!(
                    "{} set without a recipient",
                    self.recipient_basis_points
                )));
            }
        } else {
            parse_address(&self.recipient)?;
        }

        Ok(())
    }
}

/// Fee plan for a batch of messages.
///
/// `total_additional_fees == additional_module_fees + sum(recipient_distributions)`
/// holds after every [`increase`](Self::increase).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsgFeesDistribution {
    pub total_additional_fees: Coins,
    pub additional_module_fees: Coins,
    /// Iterate with [`crate::domain::ordering::sorted_entries`] for side effects.
    pub recipient_distributions: HashMap<String, Coins>,
}

impl MsgFeesDistribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one fee into the plan. On error the plan is unchanged.
    pub fn increase(&mut self, fee: &Coin, bips: u32, recipient: &str) -> Result<(), MsgFeesError> {
        fee.validate()?;

        let total = self.total_additional_fees.checked_add(&Coins::from(fee.clone()))?;
        let (share, remainder) = if recipient.is_empty() {
            (0, fee.amount)
        } else {
            split_amount(fee.amount, bips)?
        };
        let module = self
            .additional_module_fees
            .checked_add(&Coins::from(Coin::new(fee.denom.clone(), remainder)))?;
        let recipient_share = if share > 0 {
            let owed = self
                .recipient_distributions
                .get(recipient)
                .cloned()
                .unwrap_or_default()
                .checked_add(&Coins::from(Coin::new(fee.denom.clone(), share)))?;
            Some(owed)
        } else {
            None
        };

        self.total_additional_fees = total;
        self.additional_module_fees = module;
        if let Some(owed) = recipient_share {
            self.recipient_distributions
                .insert(recipient.to_string(), owed);
        }

        Ok(())
    }

    /// Sum of everything owed to named recipients.
    pub fn recipient_total(&self) -> Result<Coins, MsgFeesError> {
        let mut total = Coins::new();
        for coins in self.recipient_distributions.values() {
            total.add(coins)?;
        }
        Ok(total)
    }

    /// Distribution map for settlement, with the module portion under the
    /// empty key.
    pub fn settlement_map(&self) -> HashMap<String, Coins> {
        let mut map = self.recipient_distributions.clone();
        if !self.additional_module_fees.is_zero() {
            map.insert(String::new(), self.additional_module_fees.clone());
        }
        map
    }
}

/// Governance-managed parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Minimum price per unit of gas.
    pub floor_gas_price: Coin,
    /// Conversion-denom units per [`USD_DENOM`] unit.
    pub usd_conversion_rate: u64,
    /// Denomination custom fees are converted into.
    pub conversion_fee_denom: String,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            floor_gas_price: Coin::new(DEFAULT_CONVERSION_FEE_DENOM, DEFAULT_FLOOR_GAS_PRICE),
            usd_conversion_rate: DEFAULT_USD_CONVERSION_RATE,
            conversion_fee_denom: DEFAULT_CONVERSION_FEE_DENOM.to_string(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), MsgFeesError> {
        self.floor_gas_price.validate()?;
        validate_denom(&self.conversion_fee_denom)
    }
}

/// Module state at genesis.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    pub msg_fees: Vec<MsgFee>,
}

impl GenesisState {
    pub fn validate(&self) -> Result<(), MsgFeesError> {
        self.params.validate()?;

        let mut seen = std::collections::HashSet::new();
        for fee in &self.msg_fees {
            fee.validate()?;
            if !seen.insert(fee.msg_type_url.as_str()) {
                return Err(MsgFeesError::AlreadyExists(fee.msg_type_url.clone()));
            }
        }

        Ok(())
    }

    /// Parses a genesis document. Does not validate it.
    pub fn from_json(json: &str) -> Result<Self, MsgFeesError> {
        serde_json::from_str(json).map_err(|e| MsgFeesError::Codec(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, MsgFeesError> {
        serde_json::to_string_pretty(self).map_err(|e| MsgFeesError::Codec(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipient() -> String {
        format!("0x{}", "11".repeat(20))
    }

    #[test]
    fn test_determine_bips() {
        let r = recipient();
        assert_eq!(determine_bips(&r, "10000"), Ok(10_000));
        assert_eq!(determine_bips(&r, "0"), Ok(0));
        assert_eq!(determine_bips(&r, ""), Ok(DEFAULT_MSG_FEE_BIPS));
        assert_eq!(determine_bips("", "2500"), Ok(0));
        assert_eq!(determine_bips("", "garbage"), Ok(0));

        assert!(matches!(
            determine_bips(&r, "10001"),
            Err(MsgFeesError::InvalidBasisPoints(_))
        ));
        assert!(matches!(
            determine_bips(&r, "-1"),
            Err(MsgFeesError::InvalidBasisPoints(_))
        ));
        assert!(matches!(
            determine_bips(&r, "fifty"),
            Err(MsgFeesError::InvalidBasisPoints(_))
        ));
    }

    #[test]
    fn test_split_amount_truncates() {
        assert_eq!(split_amount(100, 2_500), Ok((25, 75)));
        assert_eq!(split_amount(1, 5_000), Ok((0, 1)));
        assert_eq!(split_amount(9_999, 1), Ok((0, 9_999)));
        assert_eq!(split_amount(10_001, 10_000), Ok((10_001, 0)));
        assert_eq!(split_amount(Amount::MAX, 10_000), Ok((Amount::MAX, 0)));
        assert!(split_amount(1, 10_001).is_err());
    }

    #[test]
    fn test_increase_without_recipient() {
        let mut dist = MsgFeesDistribution::new();
        dist.increase(&Coin::new("nqc", 100), 0, "").unwrap();

        assert!(dist.recipient_distributions.is_empty());
        assert_eq!(dist.additional_module_fees.amount_of("nqc"), 100);
        assert_eq!(dist.total_additional_fees.amount_of("nqc"), 100);
    }

    #[test]
    fn test_increase_ignores_bips_without_recipient() {
        let mut dist = MsgFeesDistribution::new();
        dist.increase(&Coin::new("nqc", 100), 7_000, "").unwrap();

        assert!(dist.recipient_distributions.is_empty());
        assert_eq!(dist.additional_module_fees.amount_of("nqc"), 100);
    }

    #[test]
    fn test_increase_with_recipient() {
        let r = recipient();
        let mut dist = MsgFeesDistribution::new();
        dist.increase(&Coin::new("nqc", 100), 2_500, &r).unwrap();
        dist.increase(&Coin::new("nqc", 100), 2_500, &r).unwrap();

        assert_eq!(dist.total_additional_fees.amount_of("nqc"), 200);
        assert_eq!(dist.recipient_distributions[&r].amount_of("nqc"), 50);
        assert_eq!(dist.additional_module_fees.amount_of("nqc"), 150);
    }

    #[test]
    fn test_increase_rejects_malformed_fee() {
        let mut dist = MsgFeesDistribution::new();
        let result = dist.increase(&Coin::new("!!", 100), 0, "");
        assert!(matches!(result, Err(MsgFeesError::InvalidAmount(_))));
        assert_eq!(dist, MsgFeesDistribution::new());
    }

    #[test]
    fn test_increase_overflow_keeps_plan_balanced() {
        let r = recipient();
        let mut dist = MsgFeesDistribution::new();
        dist.increase(&Coin::new("nqc", Amount::MAX), 0, "").unwrap();
        let before = dist.clone();

        let result = dist.increase(&Coin::new("nqc", 2), 5_000, &r);

        assert!(matches!(result, Err(MsgFeesError::InvalidAmount(_))));
        assert_eq!(dist, before);
        assert!(!dist.recipient_distributions.contains_key(&r));
    }

    #[test]
    fn test_settlement_map_uses_empty_key_for_module() {
        let r = recipient();
        let mut dist = MsgFeesDistribution::new();
        dist.increase(&Coin::new("nqc", 10), 5_000, &r).unwrap();

        let map = dist.settlement_map();
        assert_eq!(map[""].amount_of("nqc"), 5);
        assert_eq!(map[&r].amount_of("nqc"), 5);
    }

    #[test]
    fn test_msg_fee_validate() {
        let ok = MsgFee::new("/qc.bank.v1.MsgSend", Coin::new("nqc", 1), recipient(), 100);
        assert!(ok.validate().is_ok());

        let no_type = MsgFee::new("", Coin::new("nqc", 1), "", 0);
        assert_eq!(no_type.validate(), Err(MsgFeesError::EmptyMessageType));

        let orphan_bips = MsgFee::new("/qc.bank.v1.MsgSend", Coin::new("nqc", 1), "", 100);
        assert!(matches!(
            orphan_bips.validate(),
            Err(MsgFeesError::InvalidBasisPoints(_))
        ));

        let bad_recipient = MsgFee::new("/qc.bank.v1.MsgSend", Coin::new("nqc", 1), "bob", 100);
        assert!(matches!(
            bad_recipient.validate(),
            Err(MsgFeesError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_genesis_rejects_duplicate_rules() {
        let fee = MsgFee::new("/qc.bank.v1.MsgSend", Coin::new("nqc", 1), "", 0);
        let genesis = GenesisState {
            params: Params::default(),
            msg_fees: vec![fee.clone(), fee],
        };
        assert!(matches!(
            genesis.validate(),
            Err(MsgFeesError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_genesis_json() {
        let genesis = GenesisState {
            params: Params::default(),
            msg_fees: vec![MsgFee::new(
                "/qc.bank.v1.MsgSend",
                Coin::new("usd", 2),
                recipient(),
                2_500,
            )],
        };

        let json = genesis.to_json().unwrap();
        assert!(json.contains("\"recipient_basis_points\": 2500"));
        assert_eq!(GenesisState::from_json(&json).unwrap(), genesis);

        assert!(matches!(
            GenesisState::from_json("{ \"params\": 7 }"),
            Err(MsgFeesError::Codec(_))
        ));
    }
}
