use std::collections::{btree_map, hash_map::Entry, HashMap};

use alloy::primitives::{Address, B256};
use statetrace_common::StateReader;
use tracing::trace;

use crate::{AccountSnapshot, StateMap};

/// Lazily populated snapshots of every account the transaction touched.
///
/// An account enters the cache the first time it is ensured and keeps the values read at that
/// moment; later writes by the transaction are not reflected.
#[derive(Debug, Default)]
pub(crate) struct SnapshotCache {
    accounts: HashMap<Address, AccountSnapshot>,
}

impl SnapshotCache {
    /// Returns the snapshot of `address`, reading it from `state` on first sight.
    pub(crate) fn ensure(
        &mut self,
        state: &dyn StateReader,
        address: Address,
    ) -> &mut AccountSnapshot {
        match self.accounts.entry(address) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                trace!(address = format!("{:?}", address), "snapshotting account");
                entry.insert(AccountSnapshot::load(state, address))
            }
        }
    }

    /// Ensures `address`, then snapshots storage `slot` of it on first sight.
    pub(crate) fn ensure_slot(&mut self, state: &dyn StateReader, address: Address, slot: B256) {
        let account = self.ensure(state, address);
        if let btree_map::Entry::Vacant(entry) = account.storage.entry(slot) {
            trace!(
                address = format!("{:?}", address),
                slot = format!("{:?}", slot),
                "snapshotting storage slot"
            );
            entry.insert(state.storage(address, slot));
        }
    }

    pub(crate) fn get(&self, address: &Address) -> Option<&AccountSnapshot> {
        self.accounts.get(address)
    }

    pub(crate) fn remove(&mut self, address: &Address) -> Option<AccountSnapshot> {
        self.accounts.remove(address)
    }

    pub(crate) fn retain(&mut self, f: impl FnMut(&Address, &mut AccountSnapshot) -> bool) {
        self.accounts.retain(f)
    }

    /// Drains the cache into its serialized form.
    pub(crate) fn take(&mut self) -> StateMap {
        std::mem::take(&mut self.accounts)
            .into_iter()
            .map(|(address, account)| (address, account.to_account_state()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use statetrace_common::state::{MemoryAccount, MemoryState};

    use super::*;

    #[test]
    fn test_ensure_keeps_first_observation() {
        let address = Address::repeat_byte(1);
        let mut state = MemoryState::new().with_account(
            address,
            MemoryAccount { balance: U256::from(10), nonce: 2, ..Default::default() },
        );
        let mut cache = SnapshotCache::default();

        cache.ensure(&state, address);
        state.set_balance(address, U256::from(99));
        let snapshot = cache.ensure(&state, address);

        assert_eq!(snapshot.balance, U256::from(10));
        assert_eq!(snapshot.nonce, 2);
        assert!(!snapshot.code_present);
    }

    #[test]
    fn test_ensure_slot_snapshots_account_first() {
        let address = Address::repeat_byte(1);
        let slot = B256::with_last_byte(1);
        let mut state = MemoryState::new();
        state.set_storage(address, slot, B256::with_last_byte(5));
        let mut cache = SnapshotCache::default();

        cache.ensure_slot(&state, address, slot);
        state.set_storage(address, slot, B256::with_last_byte(6));
        cache.ensure_slot(&state, address, slot);

        let snapshot = cache.get(&address).unwrap();
        assert_eq!(snapshot.storage.get(&slot), Some(&B256::with_last_byte(5)));
    }
}
