//! The `prestate` subcommand, and the tracer that reconstructs the state a transaction read
//! and changed.

mod core;
mod interface;

pub use core::*;
pub use interface::*;
