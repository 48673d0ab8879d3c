//! Shared pieces of the statetrace tracers: the execution hook protocol, the state access
//! traits, memory helpers and a replay harness for recorded executions.

mod interface;
mod utils;

pub use interface::*;
pub use utils::*;
