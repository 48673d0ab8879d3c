use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// The result document of the [`crate::BalanceTracer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedInputs {
    /// Every contract that hashed something, with the `0x`-prefixed inputs it hashed.
    pub contracts: BTreeMap<Address, BTreeSet<String>>,
    /// The top contract each contract was attributed to. Only present when attribution is
    /// enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_contracts: Option<BTreeMap<Address, Address>>,
}
