//! `offpack bundle` command

use anyhow::{Context, Result};

use crate::cli::BundleArgs;
use offpack::ops::bundle::{bundle, BundleOptions};
use offpack::util::config::{BuildConfig, Config};
use offpack::util::paths;

pub fn execute(args: BundleArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to read the current directory")?;

    // Load configuration
    let config_file = args.config_file.as_ref().map(|p| paths::join(&cwd, p));
    let mut config = Config::load_optional(config_file.as_deref())?;

    // Command line overrides the config file
    config.build.merge(BuildConfig {
        project_root: args.project_root,
        entry_file: args.entry_file,
        output: args.output,
        assets_output: args.assets_output,
        platform: args.platform,
        dev: args.dev,
        split: args.split,
        format: args.format,
    });

    let opts = BundleOptions::from_config(&config.build, &cwd)?;
    let summary = bundle(&opts, &config)?;

    for output in &summary.outputs {
        eprintln!("    Finished {}", output.display());
    }
    if summary.assets_copied > 0 {
        eprintln!("      Copied {} asset files", summary.assets_copied);
    }

    Ok(())
}
