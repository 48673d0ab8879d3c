//! The `balance` subcommand, and the tracer that collects the inputs every contract hashed.

mod core;
mod interface;

pub use core::*;
pub use interface::*;
