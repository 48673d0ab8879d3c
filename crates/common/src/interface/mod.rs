/// The execution hook protocol
mod hooks;
/// Tracer result document
mod output;

pub use hooks::*;
pub use output::*;
