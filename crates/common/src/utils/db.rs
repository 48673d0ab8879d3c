use std::fmt::Debug;

use alloy::primitives::{Address, Bytes, B256, U256};
use revm::{
    primitives::{AccountInfo, KECCAK_EMPTY},
    DatabaseRef,
};
use tracing::warn;

use super::env::BlockContext;
use crate::{ExecutionEnv, StateReader};

/// A [`StateReader`] over any revm [`DatabaseRef`].
///
/// Backend errors are logged and read as a missing account, since tracers cannot act on them.
#[derive(Debug, Clone)]
pub struct RevmState<DB> {
    db: DB,
}

impl<DB> RevmState<DB> {
    /// Create a new [`RevmState`] wrapping `db`.
    pub fn new(db: DB) -> Self {
        Self { db }
    }

    /// The wrapped database.
    pub fn inner(&self) -> &DB {
        &self.db
    }

    /// Mutable access to the wrapped database, e.g. to commit the transaction's changes.
    pub fn inner_mut(&mut self) -> &mut DB {
        &mut self.db
    }
}

impl<DB> RevmState<DB>
where
    DB: DatabaseRef,
    DB::Error: Debug,
{
    /// Get basic account information.
    fn basic(&self, address: Address) -> Option<AccountInfo> {
        match self.db.basic_ref(address) {
            Ok(info) => info,
            Err(err) => {
                warn!(
                    address = format!("{:?}", address),
                    error = format!("{:?}", err),
                    "failed to read account"
                );
                None
            }
        }
    }
}

impl<DB> StateReader for RevmState<DB>
where
    DB: DatabaseRef,
    DB::Error: Debug,
{
    fn balance(&self, address: Address) -> U256 {
        self.basic(address).map(|info| info.balance).unwrap_or_default()
    }

    fn nonce(&self, address: Address) -> u64 {
        self.basic(address).map(|info| info.nonce).unwrap_or_default()
    }

    fn code(&self, address: Address) -> Bytes {
        let Some(info) = self.basic(address) else {
            return Bytes::new();
        };
        if info.code_hash == KECCAK_EMPTY {
            return Bytes::new();
        }

        // the code may be cached on the account, otherwise it is looked up by hash
        if let Some(code) = info.code {
            return code.original_bytes();
        }
        match self.db.code_by_hash_ref(info.code_hash) {
            Ok(code) => code.original_bytes(),
            Err(err) => {
                warn!(
                    address = format!("{:?}", address),
                    code_hash = format!("{:?}", info.code_hash),
                    error = format!("{:?}", err),
                    "failed to read contract code"
                );
                Bytes::new()
            }
        }
    }

    fn storage(&self, address: Address, slot: B256) -> B256 {
        match self.db.storage_ref(address, U256::from_be_bytes(slot.0)) {
            Ok(value) => B256::from(value.to_be_bytes::<32>()),
            Err(err) => {
                warn!(
                    address = format!("{:?}", address),
                    slot = format!("{:?}", slot),
                    error = format!("{:?}", err),
                    "failed to read storage slot"
                );
                B256::ZERO
            }
        }
    }
}

/// An [`ExecutionEnv`] backed by a revm database.
#[derive(Debug, Clone)]
pub struct RevmEnv<DB> {
    /// Block and transaction context.
    pub context: BlockContext,
    /// The state store.
    pub state: RevmState<DB>,
}

impl<DB> RevmEnv<DB> {
    /// Create a new [`RevmEnv`].
    pub fn new(context: BlockContext, db: DB) -> Self {
        Self { context, state: RevmState::new(db) }
    }
}

impl<DB> ExecutionEnv for RevmEnv<DB>
where
    DB: DatabaseRef,
    DB::Error: Debug,
{
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

#[cfg(test)]
mod tests {
    use revm::{
        db::{CacheDB, EmptyDB},
        primitives::Bytecode,
    };

    use super::*;

    #[test]
    fn test_reads_through_cache_db() {
        let address = Address::repeat_byte(0x11);
        let code = Bytes::from_static(&[0x60, 0x00, 0x60, 0x00, 0xf3]);
        let bytecode = Bytecode::new_raw(code.clone());

        let mut db = CacheDB::new(EmptyDB::default());
        db.insert_account_info(
            address,
            AccountInfo {
                balance: U256::from(1000),
                nonce: 3,
                code_hash: bytecode.hash_slow(),
                code: Some(bytecode),
            },
        );
        db.insert_account_storage(address, U256::from(1), U256::from(42)).unwrap();

        let state = RevmState::new(db);
        assert_eq!(state.balance(address), U256::from(1000));
        assert_eq!(state.nonce(address), 3);
        assert_eq!(state.code(address), code);
        assert_eq!(
            state.storage(address, B256::from(U256::from(1).to_be_bytes::<32>())),
            B256::from(U256::from(42).to_be_bytes::<32>())
        );
    }

    #[test]
    fn test_missing_account_reads_as_zero() {
        let state = RevmState::new(CacheDB::new(EmptyDB::default()));
        let address = Address::repeat_byte(0x22);

        assert_eq!(state.balance(address), U256::ZERO);
        assert_eq!(state.nonce(address), 0);
        assert!(state.code(address).is_empty());
        assert_eq!(state.storage(address, B256::ZERO), B256::ZERO);
    }
}
