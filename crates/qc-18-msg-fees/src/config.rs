//! Configuration for the Message Fees Subsystem

use serde::{Deserialize, Serialize};

/// Module account that receives module-retained fees and swept remainders.
pub const FEE_COLLECTOR_NAME: &str = "fee_collector";

/// Governance module account address (`gov` in the low bytes).
pub const DEFAULT_AUTHORITY: &str = "0x0000000000000000000000000000000000676f76";

/// Static keeper configuration, fixed at node startup.
///
/// Governance-managed values live in [`crate::domain::Params`] instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MsgFeesConfig {
    /// Module account receiving the fee collector's share.
    pub fee_collector_name: String,
    /// Address allowed to change the fee schedule.
    pub authority: String,
}

impl Default for MsgFeesConfig {
    fn default() -> Self {
        Self {
            fee_collector_name: FEE_COLLECTOR_NAME.to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parse_address;

    #[test]
    fn test_default_config() {
        let config = MsgFeesConfig::default();
        assert_eq!(config.fee_collector_name, "fee_collector");
        assert!(parse_address(&config.authority).is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MsgFeesConfig =
            serde_json::from_str(r#"{ "fee_collector_name": "treasury" }"#).unwrap();
        assert_eq!(config.fee_collector_name, "treasury");
        assert_eq!(config.authority, DEFAULT_AUTHORITY);
    }
}
