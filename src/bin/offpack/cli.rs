//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use offpack::BundleFormat;

/// offpack - an offline bundle packager for React Native module graphs
#[derive(Parser)]
#[command(name = "offpack")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bundle the module graph of an entry file
    Bundle(BundleArgs),
}

#[derive(Args)]
pub struct BundleArgs {
    /// Entry file of the business bundle
    #[arg(long, value_name = "PATH")]
    pub entry_file: Option<PathBuf>,

    /// Bundle file, or output directory with --split
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    pub project_root: Option<PathBuf>,

    /// Target platform (defaults to android)
    #[arg(long)]
    pub platform: Option<String>,

    /// Development build; anything but `false` enables it
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_dev
    )]
    pub dev: Option<bool>,

    /// Directory assets are copied to
    #[arg(long, value_name = "PATH")]
    pub assets_output: Option<PathBuf>,

    /// Emit a separate base bundle; only `true` enables it
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = parse_split
    )]
    pub split: Option<bool>,

    /// Business bundle format: indexed or flat (defaults to indexed)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<BundleFormat>,

    /// TOML or JSON config file
    #[arg(long, value_name = "PATH", env = "OFFPACK_CONFIG")]
    pub config_file: Option<PathBuf>,
}

fn parse_dev(value: &str) -> Result<bool, String> {
    Ok(value != "false")
}

fn parse_split(value: &str) -> Result<bool, String> {
    Ok(value == "true")
}
