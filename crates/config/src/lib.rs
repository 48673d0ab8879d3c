//! The `config` subcommand, and the persisted CLI configuration.

mod core;
mod interface;
mod utils;

pub use core::*;
pub use interface::*;
pub(crate) use utils::*;
