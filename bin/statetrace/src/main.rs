//! statetrace: replays recorded EVM executions through the prestate and hashed-input
//! tracers.

pub(crate) mod args;

use args::{Arguments, Subcommands};
use clap::Parser;
use eyre::Result;
use statetrace_config::Configuration;
use tracing::debug;

fn main() -> Result<()> {
    // parse command line arguments
    let args = Arguments::parse();

    // init tracing, holding the guard keeps the log file flushed until exit
    let _guard = args.logs.init_tracing()?;

    // load config
    let config = Configuration::load()?;
    debug!("loaded configuration: {:?}", config);

    match args.sub {
        Subcommands::Config(subargs) => statetrace_config::config(subargs)?,
        Subcommands::Prestate(mut subargs) => {
            if let Some(diff_mode) = config.diff_mode {
                subargs.diff_mode |= diff_mode;
            }

            statetrace_prestate::prestate(subargs)?
        }
        Subcommands::Balance(mut subargs) => {
            if let Some(top_contracts) = config.top_contracts {
                subargs.top_contracts |= top_contracts;
            }
            if subargs.excluded_addresses.is_empty() && subargs.top_contracts {
                subargs.excluded_addresses = config.excluded()?;
            }

            statetrace_balance::balance(subargs)?
        }
    };

    Ok(())
}
