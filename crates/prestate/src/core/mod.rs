mod cache;
mod tracer;

pub use tracer::*;

use std::time::Instant;

use eyre::{eyre, Result};
use statetrace_common::replay::{replay, ReplayFixture};
use tracing::{info, warn};

use crate::{PrestateArgs, PrestateTracerConfig};

/// The `prestate` subcommand. Replays a recorded execution through a [`PrestateTracer`] and
/// prints the reconstructed state.
pub fn prestate(args: PrestateArgs) -> Result<()> {
    println!("{}", render_prestate(args)?);

    Ok(())
}

/// Replays the fixture named by `args` and returns the tracer output as pretty printed JSON.
///
/// Progress is only logged, so the returned document is the whole of the command's stdout.
pub fn render_prestate(args: PrestateArgs) -> Result<String> {
    args.validate().map_err(|e| eyre!("Invalid arguments: {}", e))?;

    let fixture = ReplayFixture::from_path(&args.fixture)?;
    let mut tracer = PrestateTracer::new(PrestateTracerConfig { diff_mode: args.diff_mode });

    info!(
        "replaying {} events from {} (diff mode: {})",
        fixture.events.len(),
        args.fixture.display(),
        args.diff_mode
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

    const FIXTURE: &str = r#"{
        "coinbase": "0x4444444444444444444444444444444444444444",
        "gasPrice": "0x0",
        "gasLimit": 21000,
        "state": {
            "0x1111111111111111111111111111111111111111": { "balance": "0x64", "nonce": 1 }
        },
        "events": [
            { "type": "frameStart", "from": "0x1111111111111111111111111111111111111111",
              "to": "0x2222222222222222222222222222222222222222", "value": "0x0" },
            { "type": "frameEnd" }
        ]
    }"#;

    #[test]
    fn test_render_is_a_single_json_document() {
        let tmp = TempDir::new("statetrace-prestate").unwrap();
        let path = tmp.path().join("tx.json");
        std::fs::write(&path, FIXTURE).unwrap();

        let rendered = render_prestate(PrestateArgs { fixture: path, diff_mode: false }).unwrap();

        let output: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            output["result"]["0x1111111111111111111111111111111111111111"],
            json!({ "balance": "0x64" })
        );
        assert!(output.get("error").is_none());
    }

    #[test]
    fn test_render_rejects_missing_fixture() {
        let tmp = TempDir::new("statetrace-prestate").unwrap();
        let args = PrestateArgs { fixture: tmp.path().join("missing.json"), diff_mode: true };

        assert!(render_prestate(args).is_err());
    }
}
