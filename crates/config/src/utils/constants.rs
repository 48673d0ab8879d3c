/// ANSI color for purple
pub(crate) const PURPLE_ANSI_COLOR: &str = "\x1b[35m";
/// ANSI color for red
pub(crate) const RED_ANSI_COLOR: &str = "\x1b[31m";
/// ANSI color for green
pub(crate) const GREEN_ANSI_COLOR: &str = "\x1b[32m";
/// Reset the ANSI color to the default
pub(crate) const RESET_ANSI_COLOR: &str = "\x1b[0m";

/// The directory under `$HOME` holding the configuration file
pub(crate) const CONFIG_DIR: &str = ".statetrace";
/// The configuration file name
pub(crate) const CONFIG_FILE: &str = "config.json";
/// Prefix of environment variables overriding configuration values
pub(crate) const ENV_PREFIX: &str = "STATETRACE_";

/// The hint printed along with the configuration
pub(crate) const USAGE_HINT: &str = "use `statetrace config <KEY> <VALUE>` to set a key/value pair, or `statetrace config --interactive` to enter interactive mode.";
