mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render {
            template,
            config,
            data,
            uri,
        } => commands::render::run(config, template, data, uri),
        Commands::Check { config } => commands::check::run(config),
        Commands::Relative { to, from } => commands::relative::run(to, from),
    }
}
