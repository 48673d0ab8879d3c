use crate::{
    constants::{GREEN_ANSI_COLOR, RED_ANSI_COLOR, RESET_ANSI_COLOR, USAGE_HINT},
    ConfigArgs, Configuration,
};
use eyre::Result;

/// The `config` command is used to display and edit the current configuration.
/// Output is printed rather than logged, so it stays readable in interactive mode.
pub fn config(args: ConfigArgs) -> Result<()> {
    if args.interactive {
        Configuration::from_interactive()?;
        return Ok(());
    }

    if args.key.is_empty() {
        let config = Configuration::load()?;
        println!("Configuration: {}\n", serde_json::to_string_pretty(&config)?);
        println!("{GREEN_ANSI_COLOR}Hint: {RESET_ANSI_COLOR}{USAGE_HINT}");
        return Ok(());
    }

    if args.value.is_empty() {
        println!("{RED_ANSI_COLOR}Error: {RESET_ANSI_COLOR}{USAGE_HINT}");
        return Ok(());
    }

    match Configuration::update(&Configuration::default_path()?, &args.key, &args.value) {
        Ok(config) => {
            println!(
                "{GREEN_ANSI_COLOR}Success: {RESET_ANSI_COLOR}'{}' set to '{}'.",
                args.key, args.value
            );
            println!("Configuration: {}\n", serde_json::to_string_pretty(&config)?);
        }
        Err(e) => println!("{RED_ANSI_COLOR}Error: {RESET_ANSI_COLOR}{}", e),
    };

    Ok(())
}
