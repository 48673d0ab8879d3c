use std::collections::{BTreeMap, HashSet};

use alloy::primitives::Address;
use tracing::trace;

/// Attributes contracts to the top contract of the call chain that first reached them.
///
/// Attributions are recorded incrementally as calls are observed. Once recorded, an
/// attribution never changes.
#[derive(Debug, Clone, Default)]
pub(crate) struct TopContracts {
    excluded: HashSet<Address>,
    parents: BTreeMap<Address, Address>,
}

impl TopContracts {
    pub(crate) fn new(excluded: impl IntoIterator<Item = Address>) -> Self {
        Self { excluded: excluded.into_iter().collect(), parents: BTreeMap::new() }
    }

    /// Follows recorded attributions from `address` up to its root.
    pub(crate) fn resolve(&self, address: Address) -> Address {
        let mut current = address;
        // every hop consumes a distinct record, so this bounds the walk even on a cycle
        for _ in 0..self.parents.len() {
            match self.parents.get(&current) {
                Some(parent) => current = *parent,
                None => break,
            }
        }
        current
    }

    /// Records that `caller` called `contract`, attributing `contract` to the root of
    /// `caller` unless it is already attributed, would become its own root, or `caller` is
    /// excluded.
    pub(crate) fn record(&mut self, caller: Address, contract: Address) {
        if caller == contract ||
            self.excluded.contains(&caller) ||
            self.parents.contains_key(&contract)
        {
            return;
        }

        let top = self.resolve(caller);
        if top == contract {
            return;
        }

        trace!(
            contract = format!("{:?}", contract),
            top = format!("{:?}", top),
            "attributing contract"
        );
        self.parents.insert(contract, top);
    }

    /// Drains the recorded attributions.
    pub(crate) fn take(&mut self) -> BTreeMap<Address, Address> {
        std::mem::take(&mut self.parents)
    }
}
