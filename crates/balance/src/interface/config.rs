use alloy::primitives::Address;
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};

/// Configuration of the [`crate::BalanceTracer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceTracerConfig {
    /// If true, every contract is attributed to the top contract of its call chain.
    pub top_contracts: bool,
    /// Callers whose callees are never attributed, e.g. well-known system contracts.
    pub excluded_addresses: Vec<Address>,
}

impl BalanceTracerConfig {
    /// Decodes the JSON configuration. A missing or `null` configuration is the default.
    pub fn from_json(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            None | Some("") | Some("null") => Ok(Self::default()),
            Some(raw) => serde_json::from_str(raw)
                .map_err(|e| eyre!("invalid balance tracer config: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json() {
        assert_eq!(BalanceTracerConfig::from_json(None).unwrap(), Default::default());
        assert_eq!(BalanceTracerConfig::from_json(Some(" ")).unwrap(), Default::default());

        let config = BalanceTracerConfig::from_json(Some(
            r#"{"topContracts":true,"excludedAddresses":["0x0000000000000000000000000000000000000400"]}"#,
        ))
        .unwrap();
        assert!(config.top_contracts);
        assert_eq!(config.excluded_addresses, vec![Address::with_last_byte(4)]);
    }

    #[test]
    fn test_from_json_rejects_bad_address() {
        assert!(BalanceTracerConfig::from_json(Some(r#"{"excludedAddresses":["0x04"]}"#)).is_err());
    }
}
