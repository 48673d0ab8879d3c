use std::collections::HashSet;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use eyre::{bail, Result};
use revm::interpreter::opcode;
use statetrace_common::{
    interrupt::InterruptHandle,
    memory::{memory_copy_padded, word_to_address, word_to_b256},
    CallFrame, ExecutionEnv, ExecutionTracer, FrameEnd, StateReader, StepContext, TraceOutput,
    TracerPhase,
};
use tracing::{debug, trace, warn};

use super::cache::SnapshotCache;
use crate::{
    AccountSnapshot, AccountState, DiffState, PrestateTracerConfig, StateMap, CODE_SENTINEL,
};

/// Reconstructs the state a single transaction read, or in diff mode the state it changed.
///
/// Accounts and storage slots are snapshotted the first time execution touches them. Since the
/// engine charges the sender and moves the value before the first frame starts, those
/// mutations are reversed on the snapshots at frame start.
#[derive(Debug, Default)]
pub struct PrestateTracer {
    config: PrestateTracerConfig,
    pre: SnapshotCache,
    post: StateMap,
    created: HashSet<Address>,
    deleted: HashSet<Address>,
    /// Gas bought for the whole transaction.
    gas_limit: u64,
    phase: TracerPhase,
    interrupt: InterruptHandle,
}

impl PrestateTracer {
    /// Creates a new [`PrestateTracer`].
    pub fn new(config: PrestateTracerConfig) -> Self {
        Self { config, ..Default::default() }
    }

    /// Creates a new [`PrestateTracer`] from its JSON configuration.
    pub fn from_json(raw: Option<&str>) -> Result<Self> {
        PrestateTracerConfig::from_json(raw).map(Self::new)
    }

    /// The tracer's configuration.
    pub fn config(&self) -> &PrestateTracerConfig {
        &self.config
    }

    /// A handle that stops this tracer from another thread.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    fn accepts(&self, hook: &'static str) -> bool {
        if self.phase.is_finalized() {
            warn!(hook, "prestate tracer received a hook after its result was taken");
            return false;
        }
        true
    }

    fn lookup_created(&mut self, state: &dyn StateReader, address: Address) {
        self.pre.ensure(state, address);
        self.created.insert(address);
    }

    /// Removes created accounts that had no footprint before the transaction.
    fn drop_empty_created(&mut self) {
        for address in &self.created {
            if self.pre.get(address).is_some_and(|account| !account.exists()) {
                trace!(address = format!("{:?}", address), "dropping empty created account");
                self.pre.remove(address);
            }
        }
    }

    fn compute_diff(&mut self, state: &dyn StateReader) {
        let deleted = &self.deleted;
        let post = &mut self.post;

        self.pre.retain(|address, pre| {
            // self-destructed accounts keep their prestate but have no poststate
            if deleted.contains(address) {
                return true;
            }
            match diff_account(state, *address, pre) {
                Some(account) => {
                    post.insert(*address, account);
                    true
                }
                None => false,
            }
        });
    }
}

/// Compares `pre` with the current state of `address`.
///
/// Returns the changed fields, or `None` when nothing changed. Storage slots that did not
/// change, or that were zero before the transaction, are removed from `pre`.
fn diff_account(
    state: &dyn StateReader,
    address: Address,
    pre: &mut AccountSnapshot,
) -> Option<AccountState> {
    let mut modified = false;
    let mut post = AccountState::default();

    let balance = state.balance(address);
    if balance != pre.balance {
        modified = true;
        post.balance = Some(balance);
    }

    let nonce = state.nonce(address);
    if nonce != pre.nonce {
        modified = true;
        post.nonce = (nonce != 0).then_some(nonce);
    }

    let code_present = !state.code(address).is_empty();
    if code_present != pre.code_present {
        modified = true;
        post.code = code_present.then(|| Bytes::from_static(CODE_SENTINEL));
    }

    pre.storage.retain(|slot, value| {
        let current = state.storage(address, *slot);
        if current == *value {
            return false;
        }
        modified = true;
        // a slot cleared by the transaction is reported by its absence from the poststate
        if current != B256::ZERO {
            post.storage.insert(*slot, current);
        }
        *value != B256::ZERO
    });

    modified.then_some(post)
}

impl ExecutionTracer for PrestateTracer {
    fn on_tx_start(&mut self, gas_limit: u64) {
        if !self.accepts("tx_start") {
            return;
        }
        self.phase = TracerPhase::Tracing;
        self.gas_limit = gas_limit;
    }

    fn on_tx_end(&mut self, env: &dyn ExecutionEnv, _rest_gas: u64) {
        if !self.accepts("tx_end") {
            return;
        }
        if self.config.diff_mode {
            self.compute_diff(env.state());
        }
        self.drop_empty_created();
    }

    fn on_frame_start(&mut self, env: &dyn ExecutionEnv, frame: &CallFrame<'_>) {
        if !self.accepts("frame_start") {
            return;
        }
        let state = env.state();
        self.phase = TracerPhase::Tracing;

        self.pre.ensure(state, frame.from);
        self.pre.ensure(state, frame.to);
        self.pre.ensure(state, env.coinbase());

        // the recipient was already credited with the value
        let to = self.pre.ensure(state, frame.to);
        to.balance = to.balance.checked_sub(frame.value).unwrap_or_else(|| {
            warn!(
                address = format!("{:?}", frame.to),
                value = %frame.value,
                "recipient balance is below the transferred value"
            );
            U256::ZERO
        });

        // the sender was already charged the value and the gas bought, and its nonce bumped
        let gas_cost = env.gas_price().saturating_mul(U256::from(self.gas_limit));
        let from = self.pre.ensure(state, frame.from);
        from.balance = from.balance.saturating_add(frame.value).saturating_add(gas_cost);
        from.nonce = from.nonce.checked_sub(1).unwrap_or_else(|| {
            warn!(address = format!("{:?}", frame.from), "sender nonce is already zero");
            0
        });

        if frame.create {
            self.created.insert(frame.to);
        }
    }

    fn on_frame_end(&mut self, _frame: &FrameEnd<'_>) {
        if !self.accepts("frame_end") {
            return;
        }
        if !self.config.diff_mode {
            self.drop_empty_created();
        }
    }

    fn on_step(&mut self, env: &dyn ExecutionEnv, step: &StepContext<'_>) {
        if step.is_faulted() || self.interrupt.is_stopped() || !self.accepts("step") {
            return;
        }
        let state = env.state();
        let contract = step.contract;

        match step.op {
            opcode::SLOAD | opcode::SSTORE => {
                if let Some(slot) = step.stack_back(0) {
                    self.pre.ensure_slot(state, contract, word_to_b256(slot));
                }
            }
            opcode::EXTCODECOPY |
            opcode::EXTCODEHASH |
            opcode::EXTCODESIZE |
            opcode::BALANCE |
            opcode::SELFDESTRUCT => {
                if let Some(word) = step.stack_back(0) {
                    self.pre.ensure(state, word_to_address(word));
                    if step.op == opcode::SELFDESTRUCT {
                        self.deleted.insert(contract);
                    }
                }
            }
            opcode::DELEGATECALL | opcode::CALL | opcode::STATICCALL | opcode::CALLCODE
                if step.stack.len() >= 5 =>
            {
                if let Some(word) = step.stack_back(1) {
                    self.pre.ensure(state, word_to_address(word));
                }
            }
            opcode::CREATE => {
                // prior creations in the same frame have already advanced the nonce
                let address = contract.create(state.nonce(contract));
                self.lookup_created(state, address);
            }
            opcode::CREATE2 => {
                let (Some(offset), Some(size), Some(salt)) =
                    (step.stack_back(1), step.stack_back(2), step.stack_back(3))
                else {
                    return;
                };
                let init_code = match memory_copy_padded(step.memory, offset, size) {
                    Ok(init_code) => init_code,
                    Err(err) => {
                        debug!(
                            error = %err,
                            offset = %offset,
                            size = %size,
                            "failed to copy CREATE2 init code"
                        );
                        return;
                    }
                };
                let address = contract.create2(word_to_b256(salt), keccak256(&init_code));
                self.lookup_created(state, address);
            }
            _ => {}
        }
    }

    fn get_result(&mut self) -> Result<TraceOutput> {
        if self.phase.is_finalized() {
            bail!("prestate tracer result was already taken");
        }
        self.phase = TracerPhase::Finalized;

        let pre = self.pre.take();
        let result = if self.config.diff_mode {
            serde_json::to_value(DiffState { post: std::mem::take(&mut self.post), pre })?
        } else {
            serde_json::to_value(pre)?
        };
        self.created.clear();
        self.deleted.clear();

        Ok(TraceOutput::new(result, self.interrupt.reason().map(str::to_string)))
    }

    fn stop(&self, reason: &str) {
        debug!(reason, "stopping prestate tracer");
        self.interrupt.stop(reason);
    }
}
