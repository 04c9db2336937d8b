#![allow(clippy::cargo_common_metadata)]
use anyhow::Result;
use ddgmail::{cli, config::Config, setup_logging, ui::output};

fn main() -> Result<()> {
    // Parse command line arguments
    let args = cli::parse_args();

    // Setup logging based on debug flag
    setup_logging(args.debug)?;

    // Initialize configuration
    let config = Config::from_args(&args)?;

    // Execute the appropriate command
    if let Err(e) = cli::execute_command(&config, &args.command) {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
    Ok(())
}
