//! jinja-provider command line entry point.

use std::process::ExitCode;

use clap::Parser;
use jinja_provider::cli;
use jinja_provider::core::user_friendly_error;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    let config = cli.build_config();
    cli::init_logging(config.log_level.as_deref());

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute_with_config(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            ExitCode::FAILURE
        }
    }
}
