use std::path::Path;

use alloy::primitives::{Address, Bytes, B256, U256};
use eyre::{eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    env::{BlockContext, MemoryEnv},
    state::MemoryState,
};
use crate::{CallFrame, ExecutionTracer, FrameEnd, StepContext, TraceOutput};

/// A recorded transaction execution: the state as the engine saw it when the outermost frame
/// started, and the ordered hook events and state writes that followed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayFixture {
    /// Block and transaction context.
    #[serde(flatten)]
    pub context: BlockContext,
    /// Gas bought for the transaction.
    pub gas_limit: u64,
    /// Gas left when the transaction ended.
    #[serde(default)]
    pub rest_gas: u64,
    /// The state after the sender was charged and the value moved, i.e. at frame start.
    #[serde(default)]
    pub state: MemoryState,
    /// Hook events and state writes, in execution order.
    #[serde(default)]
    pub events: Vec<ReplayEvent>,
}

/// A single instruction, as recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedStep {
    /// Program counter.
    #[serde(default)]
    pub pc: u64,
    /// Opcode byte.
    pub op: u8,
    /// Remaining gas.
    #[serde(default)]
    pub gas: u64,
    /// Cost of the instruction.
    #[serde(default)]
    pub cost: u64,
    /// Call depth.
    #[serde(default = "default_depth")]
    pub depth: usize,
    /// Executing contract.
    pub contract: Address,
    /// Immediate caller of the executing contract.
    pub caller: Address,
    /// Operand stack, bottom first.
    #[serde(default)]
    pub stack: Vec<U256>,
    /// Frame memory.
    #[serde(default)]
    pub memory: Bytes,
    /// Fault reported by the engine for this instruction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const fn default_depth() -> usize {
    1
}

/// A frame, as recorded when it started.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedFrame {
    /// The caller.
    pub from: Address,
    /// The callee or created address.
    pub to: Address,
    /// Whether the frame creates a contract.
    #[serde(default)]
    pub create: bool,
    /// Input data.
    #[serde(default)]
    pub input: Bytes,
    /// Gas provided.
    #[serde(default)]
    pub gas: u64,
    /// Value transferred.
    #[serde(default)]
    pub value: U256,
}

/// A frame, as recorded when it ended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedFrameEnd {
    /// Return data.
    #[serde(default)]
    pub output: Bytes,
    /// Gas used.
    #[serde(default)]
    pub gas_used: u64,
    /// Execution error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One entry of [`ReplayFixture::events`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ReplayEvent {
    /// The outermost frame starts.
    FrameStart(RecordedFrame),
    /// The outermost frame ends.
    FrameEnd(RecordedFrameEnd),
    /// A nested frame is entered.
    Enter {
        /// The opcode entering the frame.
        op: u8,
        /// The frame.
        #[serde(flatten)]
        frame: RecordedFrame,
    },
    /// A nested frame exits.
    Exit(RecordedFrameEnd),
    /// An instruction was dispatched.
    Step(RecordedStep),
    /// An instruction faulted.
    Fault(RecordedStep),
    /// The engine wrote a balance.
    SetBalance {
        /// Account.
        address: Address,
        /// New balance.
        balance: U256,
    },
    /// The engine wrote a nonce.
    SetNonce {
        /// Account.
        address: Address,
        /// New nonce.
        nonce: u64,
    },
    /// The engine deployed code.
    SetCode {
        /// Account.
        address: Address,
        /// New code.
        code: Bytes,
    },
    /// The engine wrote a storage slot.
    SetStorage {
        /// Account.
        address: Address,
        /// Slot.
        slot: B256,
        /// New value.
        value: B256,
    },
    /// The engine removed a self-destructed account.
    Destroy {
        /// Account.
        address: Address,
    },
}

impl ReplayFixture {
    /// Loads a fixture from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let fixture = std::fs::read_to_string(path)
            .map_err(|e| eyre!("failed to read fixture {}: {}", path.display(), e))?;
        serde_json::from_str(&fixture)
            .map_err(|e| eyre!("failed to parse fixture {}: {}", path.display(), e))
    }
}

impl RecordedFrame {
    fn as_call_frame(&self) -> CallFrame<'_> {
        CallFrame {
            from: self.from,
            to: self.to,
            create: self.create,
            input: &self.input,
            gas: self.gas,
            value: self.value,
        }
    }
}

/// Drives `tracer` through `fixture` following the hook protocol, then retrieves its result.
pub fn replay<T>(tracer: &mut T, fixture: &ReplayFixture) -> Result<TraceOutput>
where
    T: ExecutionTracer + ?Sized,
{
    let mut env = MemoryEnv::new(fixture.context, fixture.state.clone());

    tracer.on_tx_start(fixture.gas_limit);
    for (index, event) in fixture.events.iter().enumerate() {
        trace!(index, "replaying event");
        match event {
            ReplayEvent::FrameStart(frame) => tracer.on_frame_start(&env, &frame.as_call_frame()),
            ReplayEvent::FrameEnd(end) => {
                let error = end.error.as_ref().map(|e| eyre!("{}", e));
                tracer.on_frame_end(&FrameEnd {
                    output: &end.output,
                    gas_used: end.gas_used,
                    error: error.as_ref(),
                });
            }
            ReplayEvent::Enter { op, frame } => tracer.on_enter(*op, &frame.as_call_frame()),
            ReplayEvent::Exit(end) => {
                let error = end.error.as_ref().map(|e| eyre!("{}", e));
                tracer.on_exit(&FrameEnd {
                    output: &end.output,
                    gas_used: end.gas_used,
                    error: error.as_ref(),
                });
            }
            ReplayEvent::Step(step) | ReplayEvent::Fault(step) => {
                let error = step.error.as_ref().map(|e| eyre!("{}", e));
                let context = StepContext {
                    pc: step.pc,
                    op: step.op,
                    gas: step.gas,
                    cost: step.cost,
                    depth: step.depth,
                    contract: step.contract,
                    caller: step.caller,
                    stack: &step.stack,
                    memory: &step.memory,
                    error: error.as_ref(),
                };
                if matches!(event, ReplayEvent::Fault(_)) {
                    tracer.on_fault(&env, &context);
                } else {
                    tracer.on_step(&env, &context);
                }
            }
            ReplayEvent::SetBalance { address, balance } => {
                env.state.set_balance(*address, *balance)
            }
            ReplayEvent::SetNonce { address, nonce } => env.state.set_nonce(*address, *nonce),
            ReplayEvent::SetCode { address, code } => env.state.set_code(*address, code.clone()),
            ReplayEvent::SetStorage { address, slot, value } => {
                env.state.set_storage(*address, *slot, *value)
            }
            ReplayEvent::Destroy { address } => env.state.destroy(*address),
        }
    }
    tracer.on_tx_end(&env, fixture.rest_gas);

    debug!(events = fixture.events.len(), "replay finished");
    tracer.get_result()
}
