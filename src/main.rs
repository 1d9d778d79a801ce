use clap::Parser;
use slsa_go_builder::{
    cli::{self, commands::BuilderCommands},
    error::Result,
};

#[derive(Parser)]
#[command(name = cli::CLI_NAME, version = cli::CLI_VERSION, author, about)]
pub struct Cli {
    #[command(subcommand)]
    command: BuilderCommands,
}

fn main() -> Result<()> {
    // Initialize logging
    slsa_go_builder::init_logging()?;

    // Parse command line arguments
    let cli = Cli::parse();

    let result = cli::handle_builder_command(cli.command);

    // Format and display any errors
    if let Err(ref e) = result {
        eprintln!("{}", cli::format_error(e));
    }

    result
}
