use std::collections::{BTreeMap, HashMap};

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::StateReader;

/// An account held by [`MemoryState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryAccount {
    /// Current balance.
    #[serde(default)]
    pub balance: U256,
    /// Current nonce.
    #[serde(default)]
    pub nonce: u64,
    /// Current code.
    #[serde(default)]
    pub code: Bytes,
    /// Current storage. Missing slots read as zero.
    #[serde(default)]
    pub storage: BTreeMap<B256, B256>,
}

/// An ephemeral, in-memory state store.
///
/// Used to replay recorded executions, where the state is mutated between hooks the same way
/// the engine mutated it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryState {
    accounts: HashMap<Address, MemoryAccount>,
}

impl MemoryState {
    /// Create a new, empty [`MemoryState`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `address`, builder style.
    pub fn with_account(mut self, address: Address, account: MemoryAccount) -> Self {
        self.accounts.insert(address, account);
        self
    }

    /// The account at `address`, if it was ever written.
    pub fn account(&self, address: &Address) -> Option<&MemoryAccount> {
        self.accounts.get(address)
    }

    /// Sets the balance of `address`.
    pub fn set_balance(&mut self, address: Address, balance: U256) {
        self.accounts.entry(address).or_default().balance = balance;
    }

    /// Sets the nonce of `address`.
    pub fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.accounts.entry(address).or_default().nonce = nonce;
    }

    /// Sets the code of `address`.
    pub fn set_code(&mut self, address: Address, code: Bytes) {
        self.accounts.entry(address).or_default().code = code;
    }

    /// Writes storage `slot` of `address`. Writing zero clears the slot.
    pub fn set_storage(&mut self, address: Address, slot: B256, value: B256) {
        let storage = &mut self.accounts.entry(address).or_default().storage;
        if value == B256::ZERO {
            storage.remove(&slot);
        } else {
            storage.insert(slot, value);
        }
    }

    /// Removes `address` entirely, as a self-destruct does at the end of a transaction.
    pub fn destroy(&mut self, address: Address) {
        trace!(address = format!("{:?}", address), "destroying account");
        self.accounts.remove(&address);
    }
}

impl StateReader for MemoryState {
    fn balance(&self, address: Address) -> U256 {
        self.accounts.get(&address).map(|account| account.balance).unwrap_or_default()
    }

    fn nonce(&self, address: Address) -> u64 {
        self.accounts.get(&address).map(|account| account.nonce).unwrap_or_default()
    }

    fn code(&self, address: Address) -> Bytes {
        self.accounts.get(&address).map(|account| account.code.clone()).unwrap_or_default()
    }

    fn storage(&self, address: Address, slot: B256) -> B256 {
        self.accounts
            .get(&address)
            .and_then(|account| account.storage.get(&slot).copied())
            .unwrap_or_default()
    }
}
