use std::path::PathBuf;

use alloy::primitives::Address;
use clap::Parser;
use eyre::{bail, Result};

/// Arguments for the `balance` subcommand
#[derive(Debug, Clone, Parser)]
#[clap(
    about = "Replay a recorded execution and collect the inputs every contract hashed",
    override_usage = "statetrace balance <FIXTURE> [OPTIONS]"
)]
pub struct BalanceArgs {
    /// The path to the recorded execution (a JSON replay fixture).
    pub fixture: PathBuf,

    /// Attribute every contract to the top contract of its call chain.
    #[clap(long, short)]
    pub top_contracts: bool,

    /// A caller whose callees are never attributed. May be repeated.
    #[clap(long = "exclude", value_name = "ADDRESS")]
    pub excluded_addresses: Vec<Address>,
}

impl BalanceArgs {
    /// Validates the arguments.
    pub fn validate(&self) -> Result<()> {
        if !self.fixture.is_file() {
            bail!("fixture {} does not exist", self.fixture.display());
        }
        if !self.excluded_addresses.is_empty() && !self.top_contracts {
            bail!("--exclude only applies together with --top-contracts");
        }
        Ok(())
    }
}
