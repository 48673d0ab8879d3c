use alloy::primitives::{Address, Bytes, U256};
use eyre::Result;
use serde_json::json;
use statetrace_common::{
    env::BlockContext,
    replay::{replay, RecordedFrame, RecordedFrameEnd, RecordedStep, ReplayEvent, ReplayFixture},
    CallFrame, ExecutionEnv, ExecutionTracer, FrameEnd, StepContext, TraceOutput,
};

#[derive(Debug, Default)]
struct RecordingTracer {
    calls: Vec<String>,
}

impl ExecutionTracer for RecordingTracer {
    fn on_tx_start(&mut self, gas_limit: u64) {
        self.calls.push(format!("tx_start {}", gas_limit));
    }

    fn on_tx_end(&mut self, env: &dyn ExecutionEnv, rest_gas: u64) {
        let balance = env.state().balance(Address::repeat_byte(1));
        self.calls.push(format!("tx_end {} {}", rest_gas, balance));
    }

    fn on_frame_start(&mut self, env: &dyn ExecutionEnv, frame: &CallFrame<'_>) {
        let balance = env.state().balance(frame.from);
        self.calls.push(format!("frame_start {} {}", frame.value, balance));
    }

    fn on_frame_end(&mut self, frame: &FrameEnd<'_>) {
        self.calls.push(format!("frame_end {}", frame.error.is_some()));
    }

    fn on_enter(&mut self, op: u8, _frame: &CallFrame<'_>) {
        self.calls.push(format!("enter {:#x}", op));
    }

    fn on_exit(&mut self, frame: &FrameEnd<'_>) {
        self.calls.push(format!("exit {}", frame.gas_used));
    }

    fn on_step(&mut self, _env: &dyn ExecutionEnv, step: &StepContext<'_>) {
        self.calls.push(format!("step {:#x} {}", step.op, step.stack_back(0).unwrap_or_default()));
    }

    fn on_fault(&mut self, _env: &dyn ExecutionEnv, step: &StepContext<'_>) {
        self.calls.push(format!("fault {:#x} {}", step.op, step.is_faulted()));
    }

    fn get_result(&mut self) -> Result<TraceOutput> {
        Ok(TraceOutput::new(json!(std::mem::take(&mut self.calls)), None))
    }

    fn stop(&self, _reason: &str) {}
}

#[test]
fn test_replay_follows_event_order() {
    let sender = Address::repeat_byte(1);
    let contract = Address::repeat_byte(2);
    let fixture = ReplayFixture {
        context: BlockContext { coinbase: Address::repeat_byte(9), gas_price: U256::from(1) },
        gas_limit: 50_000,
        rest_gas: 1_000,
        state: Default::default(),
        events: vec![
            ReplayEvent::SetBalance { address: sender, balance: U256::from(10) },
            ReplayEvent::FrameStart(RecordedFrame {
                from: sender,
                to: contract,
                value: U256::from(5),
                ..Default::default()
            }),
            ReplayEvent::Step(RecordedStep {
                op: 0x60,
                contract,
                caller: sender,
                stack: vec![U256::from(3)],
                ..Default::default()
            }),
            ReplayEvent::Enter { op: 0xf1, frame: RecordedFrame::default() },
            ReplayEvent::Exit(RecordedFrameEnd { gas_used: 21, ..Default::default() }),
            ReplayEvent::Fault(RecordedStep {
                op: 0xfd,
                contract,
                caller: sender,
                error: Some("execution reverted".to_string()),
                ..Default::default()
            }),
            ReplayEvent::SetBalance { address: sender, balance: U256::from(7) },
            ReplayEvent::FrameEnd(RecordedFrameEnd {
                output: Bytes::new(),
                gas_used: 49_000,
                error: Some("execution reverted".to_string()),
            }),
        ],
    };

    let mut tracer = RecordingTracer::default();
    let output = replay(&mut tracer, &fixture).unwrap();

    assert_eq!(
        output.result,
        json!([
            "tx_start 50000",
            "frame_start 5 10",
            "step 0x60 3",
            "enter 0xf1",
            "exit 21",
            "fault 0xfd true",
            "frame_end true",
            "tx_end 1000 7",
        ])
    );
    assert!(!output.is_interrupted());
}

#[test]
fn test_fixture_from_json() {
    let fixture: ReplayFixture = serde_json::from_value(json!({
        "coinbase": "0x0000000000000000000000000000000000000009",
        "gasPrice": "0x2",
        "gasLimit": 21000,
        "state": {
            "0x0101010101010101010101010101010101010101": { "balance": "0x64", "nonce": 5 }
        },
        "events": [
            {
                "type": "frameStart",
                "from": "0x0101010101010101010101010101010101010101",
                "to": "0x0202020202020202020202020202020202020202",
                "value": "0xa"
            },
            {
                "type": "step",
                "op": 84,
                "contract": "0x0202020202020202020202020202020202020202",
                "caller": "0x0101010101010101010101010101010101010101",
                "stack": ["0x1"]
            },
            { "type": "frameEnd", "gasUsed": 21000 }
        ]
    }))
    .unwrap();

    assert_eq!(fixture.context.gas_price, U256::from(2));
    assert_eq!(fixture.gas_limit, 21000);
    assert_eq!(fixture.events.len(), 3);
    assert!(matches!(
        &fixture.events[1],
        ReplayEvent::Step(step) if step.op == 0x54 && step.depth == 1 && step.stack == vec![U256::from(1)]
    ));
}
