mod account;
mod args;
mod config;

pub use account::*;
pub use args::*;
pub use config::*;
