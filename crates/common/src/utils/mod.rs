/// revm-backed state access
pub mod db;
/// In-memory `ExecutionEnv`
pub mod env;
/// Cross-thread interruption flag
pub mod interrupt;
/// Memory and stack word helpers
pub mod memory;
/// Replay of recorded executions
pub mod replay;
/// In-memory state store
pub mod state;
