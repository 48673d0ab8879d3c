use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::state::MemoryState;
use crate::{ExecutionEnv, StateReader};

/// Block and transaction level context a tracer may ask the engine for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockContext {
    /// The block's fee recipient.
    pub coinbase: Address,
    /// The transaction's gas price.
    pub gas_price: U256,
}

/// An [`ExecutionEnv`] backed by a [`MemoryState`].
#[derive(Debug, Clone, Default)]
pub struct MemoryEnv {
    /// Block and transaction context.
    pub context: BlockContext,
    /// The mutable state store.
    pub state: MemoryState,
}

impl MemoryEnv {
    /// Creates a new [`MemoryEnv`].
    pub fn new(context: BlockContext, state: MemoryState) -> Self {
        Self { context, state }
    }
}

impl ExecutionEnv for MemoryEnv {
    fn state(&self) -> &dyn StateReader {
        &self.state
    }

    fn coinbase(&self) -> Address {
        self.context.coinbase
    }

    fn gas_price(&self) -> U256 {
        self.context.gas_price
    }
}
