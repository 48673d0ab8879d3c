mod args;
mod config;
mod output;

pub use args::*;
pub use config::*;
pub use output::*;
