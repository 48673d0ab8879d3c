mod attribution;
mod tracer;

pub use tracer::*;

use std::time::Instant;

use eyre::{eyre, Result};
use statetrace_common::replay::{replay, ReplayFixture};
use tracing::{info, warn};

use crate::{BalanceArgs, BalanceTracerConfig};

/// The `balance` subcommand. Replays a recorded execution through a [`BalanceTracer`] and
/// prints the collected inputs.
pub fn balance(args: BalanceArgs) -> Result<()> {
    println!("{}", render_balance(args)?);

    Ok(())
}

/// Replays the fixture named by `args` and returns the tracer output as pretty printed JSON.
///
/// Progress is only logged, so the returned document is the whole of the command's stdout.
pub fn render_balance(args: BalanceArgs) -> Result<String> {
    args.validate().map_err(|e| eyre!("Invalid arguments: {}", e))?;

    let fixture = ReplayFixture::from_path(&args.fixture)?;
    let mut tracer = BalanceTracer::new(BalanceTracerConfig {
        top_contracts: args.top_contracts,
        excluded_addresses: args.excluded_addresses,
    });

    info!(
        "replaying {} events from {} (top contracts: {})",
        fixture.events.len(),
        args.fixture.display(),
        args.top_contracts
    );
    let start_time = Instant::now();
    let output = replay(&mut tracer, &fixture)?;
    info!("replay finished in {:?}", start_time.elapsed());

    if let Some(reason) = &output.error {
        warn!("tracing was interrupted: {}", reason);
    }
    Ok(serde_json::to_string_pretty(&output)?)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tempdir::TempDir;

    use super::*;

    // KECCAK256 over the first two bytes of memory
    const FIXTURE: &str = r#"{
        "coinbase": "0x0000000000000000000000000000000000000000",
        "gasPrice": "0x0",
        "gasLimit": 21000,
        "events": [
            { "type": "frameStart", "from": "0x0909090909090909090909090909090909090909",
              "to": "0x0101010101010101010101010101010101010101" },
            { "type": "step", "op": 32, "contract": "0x0101010101010101010101010101010101010101",
              "caller": "0x0909090909090909090909090909090909090909",
              "stack": ["0x2", "0x0"], "memory": "0xabcd" },
            { "type": "frameEnd" }
        ]
    }"#;

    fn write_fixture(tmp: &TempDir) -> std::path::PathBuf {
        let path = tmp.path().join("tx.json");
        std::fs::write(&path, FIXTURE).unwrap();
        path
    }

    #[test]
    fn test_render_is_a_single_json_document() {
        let tmp = TempDir::new("statetrace-balance").unwrap();
        let args = BalanceArgs {
            fixture: write_fixture(&tmp),
            top_contracts: true,
            excluded_addresses: Vec::new(),
        };

        let output: Value = serde_json::from_str(&render_balance(args).unwrap()).unwrap();
        assert_eq!(
            output["result"]["contracts"],
            json!({ "0x0101010101010101010101010101010101010101": ["0xabcd"] })
        );
        assert_eq!(
            output["result"]["topContracts"],
            json!({
                "0x0101010101010101010101010101010101010101":
                    "0x0909090909090909090909090909090909090909"
            })
        );
    }

    #[test]
    fn test_render_rejects_exclusions_without_top_contracts() {
        let tmp = TempDir::new("statetrace-balance").unwrap();
        let args = BalanceArgs {
            fixture: write_fixture(&tmp),
            top_contracts: false,
            excluded_addresses: vec![alloy::primitives::Address::ZERO],
        };

        assert!(render_balance(args).is_err());
    }
}
