//! Implementation of `offpack bundle`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::assets::{copy_assets, plan_assets};
use crate::bundle::prelude::{post_code, pre_code};
use crate::bundle::{flat, indexed, BundleFormat};
use crate::core::error::BundleResult;
use crate::graph::{GraphBuilder, GraphOptions, ScanTransformer, SplitPolicy};
use crate::haste::{HasteFs, IgnoreMatcher, ShortNameRules};
use crate::resolver::{ContextOptions, ProjectContext};
use crate::util::config::{BuildConfig, Config, ResolverConfig};
use crate::util::diagnostic::suggestions;
use crate::util::{fs, paths};

/// File name of both bundles in a split build.
const SPLIT_BUNDLE_NAME: &str = "main.bundle";

/// Options for the bundle command.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleOptions {
    /// Project root, also the root module identifiers are relative to
    pub project_root: PathBuf,

    /// Entry file of the business bundle
    pub entry_file: PathBuf,

    /// Bundle file, or output directory when splitting
    pub output: PathBuf,

    /// Target platform
    pub platform: String,

    /// Development build (no minification)
    pub dev: bool,

    /// Emit a separate base bundle
    pub split: bool,

    /// Business bundle format
    pub format: BundleFormat,

    /// Directory assets are copied to
    pub assets_output: Option<PathBuf>,
}

impl BundleOptions {
    /// Assemble options from merged build settings.
    ///
    /// Relative paths are made absolute against `cwd`, which is also the
    /// default project root.
    pub fn from_config(build: &BuildConfig, cwd: &Path) -> Result<Self> {
        let absolute = |path: &Path| paths::normalize(&paths::join(cwd, path));

        let Some(entry_file) = build.entry_file.as_deref() else {
            bail!("no entry file given\n{}", suggestions::MISSING_ENTRY);
        };
        let Some(output) = build.output.as_deref() else {
            bail!("no output path given\nhelp: Pass the bundle path to `--output`");
        };

        Ok(BundleOptions {
            project_root: build
                .project_root
                .as_deref()
                .map(absolute)
                .unwrap_or_else(|| cwd.to_path_buf()),
            entry_file: absolute(entry_file),
            output: absolute(output),
            platform: build.platform.clone().unwrap_or_else(|| "android".to_string()),
            dev: build.dev.unwrap_or(true),
            split: build.split.unwrap_or(false),
            format: build.format.unwrap_or_default(),
            assets_output: build.assets_output.as_deref().map(absolute),
        })
    }
}

/// What a bundle run produced.
#[derive(Debug, Clone, Default)]
pub struct BundleSummary {
    /// Modules in the base bundle
    pub base_modules: usize,

    /// Modules in the business bundle
    pub business_modules: usize,

    /// Asset files copied
    pub assets_copied: usize,

    /// Bundle files written
    pub outputs: Vec<PathBuf>,
}

/// Crawl the project and set up the resolution context.
pub fn index_project(project_root: &Path, resolver: &ResolverConfig) -> BundleResult<ProjectContext> {
    let ignore = IgnoreMatcher::new(&resolver.ignore_patterns)?;
    let rules = ShortNameRules::new(project_root, &resolver.runtime_package)?;
    let haste = HasteFs::build(
        project_root,
        &[project_root.to_path_buf()],
        &resolver.search_exts(),
        &ignore,
        &rules,
        &resolver.platforms,
    )?;

    let options = ContextOptions {
        source_exts: resolver.source_exts.clone(),
        asset_exts: resolver.asset_exts.clone(),
        image_exts: resolver.image_exts.clone(),
        platforms: resolver.platforms.clone(),
        main_fields: resolver.main_fields.clone(),
    };
    Ok(ProjectContext::new(Arc::new(haste), &options))
}

/// Build the bundles for `options.entry_file` and write them out.
///
/// Bundles are staged next to their destinations and only moved into place
/// once every bundle was built, every asset destination is known and the
/// assets were copied. A failed run leaves no bundle file behind.
pub fn bundle(options: &BundleOptions, config: &Config) -> Result<BundleSummary> {
    if !options.project_root.is_dir() {
        bail!(
            "project root `{}` is not a directory\n{}",
            options.project_root.display(),
            suggestions::PROJECT_ROOT
        );
    }
    if !options.entry_file.is_file() {
        bail!(
            "entry file `{}` does not exist\n{}",
            options.entry_file.display(),
            suggestions::MISSING_ENTRY
        );
    }

    tracing::info!(
        "bundling {} for {}{}",
        options.entry_file.display(),
        options.platform,
        if options.dev { "" } else { " (production)" }
    );

    let ctx = index_project(&options.project_root, &config.resolver)?;
    let transformer = ScanTransformer::new(config.bundle.async_require.clone());
    let graph_options = GraphOptions {
        platform: options.platform.clone(),
        dev: options.dev,
        split: options.split,
        split_policy: SplitPolicy::new(config.bundle.base_prefixes.clone()),
        asset_registry: config.bundle.asset_registry.clone(),
    };
    let graph = GraphBuilder::new(&ctx, &transformer, graph_options).build(&options.entry_file)?;

    let startup = post_code(&[graph.entry_id.clone()]);
    let business = match options.format {
        BundleFormat::Indexed => indexed::encode(&startup, &graph.business)?,
        BundleFormat::Flat => flat::business_bundle(&graph.business, &startup)?.into_bytes(),
    };

    let mut writes = Vec::new();
    if options.split {
        let pre = pre_code(
            &options.project_root,
            &config.bundle.polyfills,
            options.dev,
            &transformer,
        )?;
        let post = post_code(&config.bundle.run_before_main);
        let base = flat::base_bundle(&pre, &graph.base, &post)?;

        writes.push((
            options.output.join("base").join(SPLIT_BUNDLE_NAME),
            base.into_bytes(),
        ));
        writes.push((
            options.output.join("main").join(SPLIT_BUNDLE_NAME),
            business,
        ));
    } else {
        writes.push((options.output.clone(), business));
    }

    let asset_copies = match &options.assets_output {
        Some(assets_output) => Some((
            plan_assets(&graph.assets, &options.platform, assets_output)?,
            assets_output,
        )),
        None => None,
    };

    let staged = writes
        .iter()
        .map(|(path, bytes)| fs::stage_bytes(path, bytes))
        .collect::<BundleResult<Vec<_>>>()?;

    let mut summary = BundleSummary {
        base_modules: graph.base.len(),
        business_modules: graph.business.len(),
        ..BundleSummary::default()
    };
    if let Some((copies, assets_output)) = &asset_copies {
        summary.assets_copied = copy_assets(copies, assets_output)?;
    }

    for (file, (path, bytes)) in staged.into_iter().zip(writes) {
        fs::commit(file, &path)?;
        tracing::info!("wrote {} ({} bytes)", path.display(), bytes.len());
        summary.outputs.push(path);
    }

    tracing::info!(
        "bundled {} modules ({} base, {} business)",
        summary.base_modules + summary.business_modules,
        summary.base_modules,
        summary.business_modules
    );
    Ok(summary)
}
