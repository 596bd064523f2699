//! offpack CLI - an offline bundle packager for React Native

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};
use offpack::util::diagnostic::{self, suggestions};
use offpack::BundleError;

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();

    if let Err(e) = run(cli) {
        report(&e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("offpack=debug")
    } else {
        EnvFilter::new("offpack=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::Bundle(args) => commands::bundle::execute(args),
    }
}

/// Print an error, with a code frame or suggestions when it is a build error.
fn report(e: &anyhow::Error, color: bool) {
    match e.downcast_ref::<BundleError>() {
        Some(BundleError::InvalidSpecifier(call)) => {
            eprintln!("error: {:#}", e);
            eprint!("{}", diagnostic::render_report(&**call));
        }
        Some(err) => {
            diagnostic::emit(
                &err.to_diagnostic().with_suggestion(suggestions::BUNDLE_FAILED),
                color,
            );
        }
        None => eprintln!("error: {:#}", e),
    }
}
