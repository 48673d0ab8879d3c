use std::collections::{BTreeMap, BTreeSet};

use alloy::primitives::Address;
use eyre::{bail, Result};
use revm::interpreter::opcode;
use statetrace_common::{
    interrupt::InterruptHandle, memory::memory_copy_padded, CallFrame, ExecutionEnv,
    ExecutionTracer, FrameEnd, StepContext, TraceOutput, TracerPhase,
};
use tracing::{debug, warn};

use super::attribution::TopContracts;
use crate::{BalanceTracerConfig, HashedInputs};

/// Collects, per contract, every distinct input passed to `KECCAK256`.
///
/// With `topContracts` enabled it also attributes every executing contract to the top
/// contract of the call chain that first reached it.
#[derive(Debug, Default)]
pub struct BalanceTracer {
    config: BalanceTracerConfig,
    contracts: BTreeMap<Address, BTreeSet<String>>,
    top_contracts: TopContracts,
    phase: TracerPhase,
    interrupt: InterruptHandle,
}

impl BalanceTracer {
    /// Creates a new [`BalanceTracer`].
    pub fn new(config: BalanceTracerConfig) -> Self {
        let top_contracts = TopContracts::new(config.excluded_addresses.iter().copied());
        Self { config, top_contracts, ..Default::default() }
    }

    /// Creates a new [`BalanceTracer`] from its JSON configuration.
    pub fn from_json(raw: Option<&str>) -> Result<Self> {
        BalanceTracerConfig::from_json(raw).map(Self::new)
    }

    /// The tracer's configuration.
    pub fn config(&self) -> &BalanceTracerConfig {
        &self.config
    }

    /// A handle that stops this tracer from another thread.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    fn begin(&mut self, hook: &'static str) -> bool {
        match self.phase {
            TracerPhase::Finalized => {
                warn!(hook, "balance tracer received a hook after its result was taken");
                false
            }
            _ => {
                self.phase = TracerPhase::Tracing;
                true
            }
        }
    }
}

impl ExecutionTracer for BalanceTracer {
    fn on_tx_start(&mut self, _gas_limit: u64) {
        self.begin("tx_start");
    }

    fn on_tx_end(&mut self, _env: &dyn ExecutionEnv, _rest_gas: u64) {
        self.begin("tx_end");
    }

    fn on_frame_start(&mut self, _env: &dyn ExecutionEnv, _frame: &CallFrame<'_>) {
        self.begin("frame_start");
    }

    fn on_frame_end(&mut self, _frame: &FrameEnd<'_>) {
        self.begin("frame_end");
    }

    fn on_step(&mut self, _env: &dyn ExecutionEnv, step: &StepContext<'_>) {
        if step.is_faulted() || self.interrupt.is_stopped() || !self.begin("step") {
            return;
        }
        let contract = step.contract;
        self.contracts.entry(contract).or_default();
        if self.config.top_contracts {
            self.top_contracts.record(step.caller, contract);
        }

        if step.op != opcode::KECCAK256 {
            return;
        }
        let (Some(offset), Some(size)) = (step.stack_back(0), step.stack_back(1)) else {
            return;
        };
        match memory_copy_padded(step.memory, offset, size) {
            Ok(data) => {
                let input = format!("0x{}", hex::encode(data));
                self.contracts.entry(contract).or_default().insert(input);
            }
            Err(err) => {
                debug!(error = %err, offset = %offset, size = %size, "failed to copy hashed input")
            }
        }
    }

    fn get_result(&mut self) -> Result<TraceOutput> {
        if self.phase.is_finalized() {
            bail!("balance tracer result was already taken");
        }
        self.phase = TracerPhase::Finalized;

        let mut contracts = std::mem::take(&mut self.contracts);
        contracts.retain(|_, inputs| !inputs.is_empty());
        let top_contracts = self.top_contracts.take();
        let inputs = HashedInputs {
            contracts,
            top_contracts: self.config.top_contracts.then_some(top_contracts),
        };

        Ok(TraceOutput::new(
            serde_json::to_value(inputs)?,
            self.interrupt.reason().map(str::to_string),
        ))
    }

    fn stop(&self, reason: &str) {
        debug!(reason, "stopping balance tracer");
        self.interrupt.stop(reason);
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::U256;
    use statetrace_common::env::MemoryEnv;

    use super::*;

    const CALLER: Address = Address::repeat_byte(0x01);
    const CONTRACT: Address = Address::repeat_byte(0x02);

    fn keccak_step<'a>(stack: &'a [U256], memory: &'a [u8]) -> StepContext<'a> {
        StepContext {
            pc: 0,
            op: opcode::KECCAK256,
            gas: 0,
            cost: 0,
            depth: 1,
            contract: CONTRACT,
            caller: CALLER,
            stack,
            memory,
            error: None,
        }
    }

    fn result(tracer: &mut BalanceTracer) -> HashedInputs {
        serde_json::from_value(tracer.get_result().unwrap().result).unwrap()
    }

    #[test]
    fn test_collects_padded_inputs() {
        let env = MemoryEnv::default();
        let mut tracer = BalanceTracer::default();
        let memory = [0xde, 0xad, 0xbe, 0xef];

        // size, offset; top of stack last
        tracer.on_step(&env, &keccak_step(&[U256::from(2), U256::from(1)], &memory));
        tracer.on_step(&env, &keccak_step(&[U256::from(4), U256::from(2)], &memory));
        tracer.on_step(&env, &keccak_step(&[U256::from(2), U256::from(1)], &memory));

        let inputs = result(&mut tracer);
        assert_eq!(
            inputs.contracts[&CONTRACT],
            BTreeSet::from(["0xadbe".to_string(), "0xbeef0000".to_string()])
        );
        assert!(inputs.top_contracts.is_none());
    }

    #[test]
    fn test_empty_sets_are_dropped() {
        let env = MemoryEnv::default();
        let mut tracer = BalanceTracer::default();

        let mut step = keccak_step(&[], &[]);
        step.op = opcode::ADD;
        tracer.on_step(&env, &step);
        assert!(tracer.contracts.contains_key(&CONTRACT));

        assert!(result(&mut tracer).contracts.is_empty());
    }

    #[test]
    fn test_faulted_and_unreadable_steps_record_nothing() {
        let env = MemoryEnv::default();
        let mut tracer = BalanceTracer::default();

        let fault = eyre::eyre!("out of gas");
        let faulted_stack = [U256::from(1), U256::ZERO];
        let mut faulted = keccak_step(&faulted_stack, &[0xff]);
        faulted.error = Some(&fault);
        tracer.on_step(&env, &faulted);
        assert!(tracer.contracts.is_empty());

        tracer.on_step(&env, &keccak_step(&[U256::MAX, U256::ZERO], &[]));
        tracer.on_step(&env, &keccak_step(&[U256::ZERO], &[]));
        assert!(result(&mut tracer).contracts.is_empty());
    }

    #[test]
    fn test_zero_size_input() {
        let env = MemoryEnv::default();
        let mut tracer = BalanceTracer::default();

        tracer.on_step(&env, &keccak_step(&[U256::ZERO, U256::from(100)], &[]));

        assert_eq!(result(&mut tracer).contracts[&CONTRACT], BTreeSet::from(["0x".to_string()]));
    }

    #[test]
    fn test_interrupted_and_finalized() {
        let env = MemoryEnv::default();
        let mut tracer = BalanceTracer::from_json(Some(r#"{"topContracts":true}"#)).unwrap();

        tracer.stop("canceled");
        tracer.stop("ignored");
        tracer.on_step(&env, &keccak_step(&[U256::from(1), U256::ZERO], &[0xff]));

        let output = tracer.get_result().unwrap();
        assert_eq!(output.error.as_deref(), Some("canceled"));
        assert_eq!(output.result, serde_json::json!({ "contracts": {}, "topContracts": {} }));
        assert!(tracer.get_result().is_err());
    }
}
