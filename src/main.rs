//! keydra-iam - IAM access-key rotation for Keydra
//!
//! This is the main entry point for the keydra-iam CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use keydra_iam::config::Config;
use keydra_iam::telemetry;

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration, then apply command-line overrides
    let mut config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(e.exit_code());
        }
    };
    cli.apply_overrides(&mut config);

    // Initialize logging based on configuration and verbosity
    if let Err(e) = telemetry::init_from_verbosity(config.logging.clone(), cli.verbosity()) {
        eprintln!("WARNING: Failed to initialize logging: {}", e);
    }

    tracing::debug!(version = VERSION, "keydra-iam starting");

    // Create command context
    let mut ctx = CommandContext::new(&cli, config);

    // Execute the appropriate command
    let exit_code = match &cli.command {
        Commands::Rotate(args) => args.execute(&mut ctx).await?,
        Commands::Validate(args) => args.execute(&mut ctx).await?,
        Commands::Redact(args) => args.execute(&mut ctx).await?,
        Commands::Distribute(args) => args.execute(&mut ctx).await?,
    };

    std::process::exit(exit_code);
}
