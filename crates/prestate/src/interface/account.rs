use std::collections::BTreeMap;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use statetrace_common::StateReader;

/// Stands in for contract code in every emitted account. Only whether code is present
/// matters to the diff, so the code itself is never reported.
pub const CODE_SENTINEL: &[u8] = b"0";

/// An account's state as first observed during the traced transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Balance.
    pub balance: U256,
    /// Whether the account has code.
    pub code_present: bool,
    /// Nonce.
    pub nonce: u64,
    /// Storage slots read or written so far.
    pub storage: BTreeMap<B256, B256>,
}

impl AccountSnapshot {
    /// Reads balance, nonce and code presence of `address`. Storage is filled on demand.
    pub fn load(state: &dyn StateReader, address: Address) -> Self {
        Self {
            balance: state.balance(address),
            code_present: !state.code(address).is_empty(),
            nonce: state.nonce(address),
            storage: BTreeMap::new(),
        }
    }

    /// Whether the account holds anything, as opposed to being all default fields.
    pub fn exists(&self) -> bool {
        self.nonce > 0 || self.code_present || !self.storage.is_empty() || !self.balance.is_zero()
    }

    /// The serialized form of the snapshot.
    pub fn to_account_state(&self) -> AccountState {
        AccountState {
            balance: Some(self.balance),
            code: self.code_present.then(|| Bytes::from_static(CODE_SENTINEL)),
            nonce: (self.nonce != 0).then_some(self.nonce),
            storage: self.storage.clone(),
        }
    }
}

/// The serialized state of an account. Absent fields were either default or unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Balance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
    /// [`CODE_SENTINEL`] when the account has code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Bytes>,
    /// Nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    /// Storage.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<B256, B256>,
}

impl AccountState {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.balance.is_none() &&
            self.code.is_none() &&
            self.nonce.is_none() &&
            self.storage.is_empty()
    }
}

/// Serialized accounts, ordered by address.
pub type StateMap = BTreeMap<Address, AccountState>;

/// The result document in diff mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffState {
    /// Changed fields of every changed account, after the transaction.
    pub post: StateMap,
    /// The same accounts before the transaction.
    pub pre: StateMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exists() {
        assert!(!AccountSnapshot::default().exists());
        assert!(AccountSnapshot { nonce: 1, ..Default::default() }.exists());
        assert!(AccountSnapshot { code_present: true, ..Default::default() }.exists());
        assert!(AccountSnapshot { balance: U256::from(1), ..Default::default() }.exists());

        let mut storage = BTreeMap::new();
        storage.insert(B256::ZERO, B256::ZERO);
        assert!(AccountSnapshot { storage, ..Default::default() }.exists());
    }

    #[test]
    fn test_account_state_serialization() {
        let snapshot = AccountSnapshot {
            balance: U256::from(0x10),
            code_present: true,
            nonce: 0,
            storage: BTreeMap::from([(B256::with_last_byte(1), B256::with_last_byte(2))]),
        };

        let value = serde_json::to_value(snapshot.to_account_state()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "balance": "0x10",
                "code": "0x30",
                "storage": {
                    "0x0000000000000000000000000000000000000000000000000000000000000001":
                        "0x0000000000000000000000000000000000000000000000000000000000000002"
                }
            })
        );
    }
}
