use std::path::PathBuf;

use clap::Parser;
use eyre::{bail, Result};

/// Arguments for the `prestate` subcommand
#[derive(Debug, Clone, Parser)]
#[clap(
    about = "Replay a recorded execution through the prestate tracer",
    override_usage = "statetrace prestate <FIXTURE> [OPTIONS]"
)]
pub struct PrestateArgs {
    /// The path to the recorded execution (a JSON replay fixture).
    pub fixture: PathBuf,

    /// Report only the changed state, as a `{pre, post}` pair.
    #[clap(long, short)]
    pub diff_mode: bool,
}

impl PrestateArgs {
    /// Validates the arguments.
    pub fn validate(&self) -> Result<()> {
        if !self.fixture.is_file() {
            bail!("fixture {} does not exist", self.fixture.display());
        }
        Ok(())
    }
}
