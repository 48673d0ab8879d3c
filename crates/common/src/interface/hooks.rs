use alloy::primitives::{Address, Bytes, B256, U256};
use eyre::Result;

use super::output::TraceOutput;

/// Read access to the backing state store of the execution engine.
///
/// Reads are infallible: an account that does not exist reads as zero balance, zero nonce,
/// empty code and zeroed storage.
pub trait StateReader {
    /// The current balance of `address`.
    fn balance(&self, address: Address) -> U256;
    /// The current nonce of `address`.
    fn nonce(&self, address: Address) -> u64;
    /// The current code of `address`.
    fn code(&self, address: Address) -> Bytes;
    /// The current value of storage `slot` of `address`.
    fn storage(&self, address: Address, slot: B256) -> B256;
}

/// The view of the execution engine handed to tracers on every hook that needs to query it.
pub trait ExecutionEnv {
    /// The state store, as it is at the moment the hook fires.
    fn state(&self) -> &dyn StateReader;
    /// The fee recipient of the block the transaction executes in.
    fn coinbase(&self) -> Address;
    /// The gas price paid by the transaction.
    fn gas_price(&self) -> U256;
}

/// A call or create frame, as seen when it starts.
#[derive(Debug, Clone, Copy)]
pub struct CallFrame<'a> {
    /// The caller.
    pub from: Address,
    /// The callee, or the address of the contract being created.
    pub to: Address,
    /// Whether the frame creates a contract.
    pub create: bool,
    /// Call data, or init code for a creation.
    pub input: &'a [u8],
    /// Gas provided to the frame.
    pub gas: u64,
    /// Value transferred with the frame.
    pub value: U256,
}

/// A call or create frame, as seen when it ends.
#[derive(Debug, Clone, Copy)]
pub struct FrameEnd<'a> {
    /// Return data of the frame.
    pub output: &'a [u8],
    /// Gas used by the frame.
    pub gas_used: u64,
    /// The execution error the frame ended with, if any.
    pub error: Option<&'a eyre::Report>,
}

/// Everything the engine exposes about a single dispatched instruction.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Program counter.
    pub pc: u64,
    /// The opcode byte.
    pub op: u8,
    /// Remaining gas.
    pub gas: u64,
    /// Cost of the instruction.
    pub cost: u64,
    /// Call depth, starting at 1 for the outermost frame.
    pub depth: usize,
    /// The address of the executing contract.
    pub contract: Address,
    /// The immediate caller of the executing contract.
    pub caller: Address,
    /// The operand stack, bottom first.
    pub stack: &'a [U256],
    /// The linear memory of the frame.
    pub memory: &'a [u8],
    /// Set when the instruction itself failed.
    pub error: Option<&'a eyre::Report>,
}

impl StepContext<'_> {
    /// Returns the stack word `n` positions below the top, `0` being the top.
    pub fn stack_back(&self, n: usize) -> Option<U256> {
        self.stack.len().checked_sub(n + 1).map(|index| self.stack[index])
    }

    /// Whether the instruction reported a fault.
    pub fn is_faulted(&self) -> bool {
        self.error.is_some()
    }
}

/// Lifecycle of a tracer instance. A tracer traces exactly one transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracerPhase {
    /// Constructed, no hook received yet.
    #[default]
    Idle,
    /// Between the transaction start hook and result retrieval.
    Tracing,
    /// The result was retrieved; the instance is spent.
    Finalized,
}

impl TracerPhase {
    /// Whether the result was already retrieved.
    pub fn is_finalized(&self) -> bool {
        matches!(self, TracerPhase::Finalized)
    }
}

/// The execution hook protocol.
///
/// For one transaction the engine calls, in order: [`ExecutionTracer::on_tx_start`] once,
/// [`ExecutionTracer::on_frame_start`] for the outermost frame, [`ExecutionTracer::on_step`]
/// for every dispatched instruction (or [`ExecutionTracer::on_fault`] when the instruction
/// faults), [`ExecutionTracer::on_enter`]/[`ExecutionTracer::on_exit`] around nested frames,
/// [`ExecutionTracer::on_frame_end`] for the outermost frame and [`ExecutionTracer::on_tx_end`]
/// once. [`ExecutionTracer::get_result`] is called exactly once afterwards.
pub trait ExecutionTracer {
    /// The transaction starts, with the gas limit bought for it.
    fn on_tx_start(&mut self, gas_limit: u64);

    /// The transaction finished executing, with the gas left over.
    fn on_tx_end(&mut self, env: &dyn ExecutionEnv, rest_gas: u64);

    /// The outermost frame starts.
    fn on_frame_start(&mut self, env: &dyn ExecutionEnv, frame: &CallFrame<'_>);

    /// The outermost frame ends.
    fn on_frame_end(&mut self, frame: &FrameEnd<'_>);

    /// A nested frame is entered through the `op` instruction.
    fn on_enter(&mut self, _op: u8, _frame: &CallFrame<'_>) {}

    /// A nested frame exits.
    fn on_exit(&mut self, _frame: &FrameEnd<'_>) {}

    /// An instruction was dispatched.
    fn on_step(&mut self, env: &dyn ExecutionEnv, step: &StepContext<'_>);

    /// An instruction faulted.
    fn on_fault(&mut self, _env: &dyn ExecutionEnv, _step: &StepContext<'_>) {}

    /// Serializes the accumulated trace and drains the tracer.
    fn get_result(&mut self) -> Result<TraceOutput>;

    /// Asks the tracer to stop bookkeeping. Idempotent, callable from any thread through an
    /// [`crate::interrupt::InterruptHandle`].
    fn stop(&self, reason: &str);
}
