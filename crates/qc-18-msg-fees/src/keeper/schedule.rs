//! Fee schedule store: rule CRUD, params and genesis.

use super::MsgFeesKeeper;
use crate::domain::{determine_bips, Coin, GenesisState, MsgFee, MsgFeesError, Params};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

/// Key prefix for fee rules; the message type URL follows it.
pub const MSG_FEE_KEY_PREFIX: &[u8] = &[0x00];

/// Key holding the encoded [`Params`].
pub const PARAMS_KEY: &[u8] = &[0x01];

/// Store key of the rule for `msg_type_url`.
pub fn msg_fee_key(msg_type_url: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(MSG_FEE_KEY_PREFIX.len() + msg_type_url.len());
    key.extend_from_slice(MSG_FEE_KEY_PREFIX);
    key.extend_from_slice(msg_type_url.as_bytes());
    key
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, MsgFeesError> {
    bincode::deserialize(bytes).map_err(|e| MsgFeesError::Codec(e.to_string()))
}

impl MsgFeesKeeper {
    /// Upserts `msg_fee` under its message type. Performs no validation.
    pub fn set_msg_fee(&self, msg_fee: &MsgFee) -> Result<(), MsgFeesError> {
        let bytes = bincode::serialize(msg_fee).map_err(|e| MsgFeesError::Codec(e.to_string()))?;
        self.store.set(&msg_fee_key(&msg_fee.msg_type_url), bytes)?;
        Ok(())
    }

    /// Rule for `msg_type_url`, or `None` when no additional fee applies.
    pub fn get_msg_fee(&self, msg_type_url: &str) -> Result<Option<MsgFee>, MsgFeesError> {
        match self.store.get(&msg_fee_key(msg_type_url))? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(decode(&bytes)?)),
            _ => Ok(None),
        }
    }

    pub fn remove_msg_fee(&self, msg_type_url: &str) -> Result<(), MsgFeesError> {
        let key = msg_fee_key(msg_type_url);
        match self.store.get(&key)? {
            Some(bytes) if !bytes.is_empty() => {}
            _ => return Err(MsgFeesError::NotFound(msg_type_url.to_string())),
        }

        self.store.delete(&key)?;
        info!("[qc-18] removed msg fee for {}", msg_type_url);
        Ok(())
    }

    /// Visits every rule in message-type order until `handle` returns `true`.
    pub fn iterate_msg_fees<F>(&self, mut handle: F) -> Result<(), MsgFeesError>
    where
        F: FnMut(MsgFee) -> bool,
    {
        for (_, value) in self.store.prefix_iter(MSG_FEE_KEY_PREFIX)? {
            let record: MsgFee = decode(&value)?;
            if handle(record) {
                break;
            }
        }
        Ok(())
    }

    /// All rules in message-type order.
    pub fn all_msg_fees(&self) -> Result<Vec<MsgFee>, MsgFeesError> {
        let mut fees = Vec::new();
        self.iterate_msg_fees(|fee| {
            fees.push(fee);
            false
        })?;
        Ok(fees)
    }

    /// Creates a rule. Fails if one already exists for the message type.
    pub fn add_msg_fee(
        &self,
        msg_type_url: &str,
        recipient: &str,
        basis_points: &str,
        additional_fee: Coin,
    ) -> Result<(), MsgFeesError> {
        if msg_type_url.is_empty() {
            return Err(MsgFeesError::EmptyMessageType);
        }
        if self.get_msg_fee(msg_type_url)?.is_some() {
            return Err(MsgFeesError::AlreadyExists(msg_type_url.to_string()));
        }

        self.write_rule(msg_type_url, recipient, basis_points, additional_fee)?;
        info!("[qc-18] added msg fee for {}", msg_type_url);
        Ok(())
    }

    /// Replaces a rule. Fails if none exists for the message type.
    pub fn update_msg_fee(
        &self,
        msg_type_url: &str,
        recipient: &str,
        basis_points: &str,
        additional_fee: Coin,
    ) -> Result<(), MsgFeesError> {
        if msg_type_url.is_empty() {
            return Err(MsgFeesError::EmptyMessageType);
        }
        if self.get_msg_fee(msg_type_url)?.is_none() {
            return Err(MsgFeesError::NotFound(msg_type_url.to_string()));
        }

        self.write_rule(msg_type_url, recipient, basis_points, additional_fee)?;
        info!("[qc-18] updated msg fee for {}", msg_type_url);
        Ok(())
    }

    fn write_rule(
        &self,
        msg_type_url: &str,
        recipient: &str,
        basis_points: &str,
        additional_fee: Coin,
    ) -> Result<(), MsgFeesError> {
        let bips = determine_bips(recipient, basis_points)?;
        let msg_fee = MsgFee::new(msg_type_url, additional_fee, recipient, bips);

        self.set_msg_fee(&msg_fee)
            .map_err(|e| MsgFeesError::InvalidProposal(e.to_string()))
    }

    /// Stored params, or the defaults when none were written yet.
    pub fn get_params(&self) -> Result<Params, MsgFeesError> {
        match self.store.get(PARAMS_KEY)? {
            Some(bytes) if !bytes.is_empty() => decode(&bytes),
            _ => Ok(Params::default()),
        }
    }

    pub fn set_params(&self, params: &Params) -> Result<(), MsgFeesError> {
        let bytes = bincode::serialize(params).map_err(|e| MsgFeesError::Codec(e.to_string()))?;
        self.store.set(PARAMS_KEY, bytes)?;
        debug!("[qc-18] params updated: {:?}", params);
        Ok(())
    }

    pub fn floor_gas_price(&self) -> Result<Coin, MsgFeesError> {
        Ok(self.get_params()?.floor_gas_price)
    }

    pub fn usd_conversion_rate(&self) -> Result<u64, MsgFeesError> {
        Ok(self.get_params()?.usd_conversion_rate)
    }

    pub fn conversion_fee_denom(&self) -> Result<String, MsgFeesError> {
        Ok(self.get_params()?.conversion_fee_denom)
    }

    /// Loads params and rules from a validated genesis state.
    pub fn init_genesis(&self, genesis: &GenesisState) -> Result<(), MsgFeesError> {
        genesis.validate()?;

        self.set_params(&genesis.params)?;
        for msg_fee in &genesis.msg_fees {
            self.set_msg_fee(msg_fee)?;
        }

        info!(
            "[qc-18] genesis loaded with {} msg fees",
            genesis.msg_fees.len()
        );
        Ok(())
    }

    pub fn export_genesis(&self) -> Result<GenesisState, MsgFeesError> {
        Ok(GenesisState {
            params: self.get_params()?,
            msg_fees: self.all_msg_fees()?,
        })
    }
}
