//! Configuration file support for offpack.
//!
//! A config file is TOML, or JSON when its extension is `.json`. Every
//! section is optional and missing fields keep their defaults.
//!
//! Order of precedence (highest to lowest):
//! 1. Command line
//! 2. Config file
//! 3. Defaults

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bundle::BundleFormat;
use crate::graph::split::DEFAULT_BASE_PREFIXES;

/// offpack configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-build settings, overridable from the command line
    pub build: BuildConfig,

    /// File index and module resolution settings
    pub resolver: ResolverConfig,

    /// Bundle layout settings
    pub bundle: BundleConfig,
}

/// Per-build settings. Unset fields fall back to their defaults when the
/// build options are assembled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Project root (defaults to the current directory)
    pub project_root: Option<PathBuf>,

    /// Entry file of the business bundle
    pub entry_file: Option<PathBuf>,

    /// Bundle file, or output directory when splitting
    pub output: Option<PathBuf>,

    /// Directory assets are copied to
    pub assets_output: Option<PathBuf>,

    /// Target platform (defaults to android)
    pub platform: Option<String>,

    /// Development build (defaults to true)
    pub dev: Option<bool>,

    /// Emit a separate base bundle (defaults to false)
    pub split: Option<bool>,

    /// Business bundle format (defaults to indexed)
    pub format: Option<BundleFormat>,
}

impl BuildConfig {
    /// Merge another build config into this one (other takes precedence).
    pub fn merge(&mut self, other: BuildConfig) {
        if other.project_root.is_some() {
            self.project_root = other.project_root;
        }
        if other.entry_file.is_some() {
            self.entry_file = other.entry_file;
        }
        if other.output.is_some() {
            self.output = other.output;
        }
        if other.assets_output.is_some() {
            self.assets_output = other.assets_output;
        }
        if other.platform.is_some() {
            self.platform = other.platform;
        }
        if other.dev.is_some() {
            self.dev = other.dev;
        }
        if other.split.is_some() {
            self.split = other.split;
        }
        if other.format.is_some() {
            self.format = other.format;
        }
    }
}

/// File index and module resolution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Source extensions, in resolution priority order
    pub source_exts: Vec<String>,

    /// Extensions of files bundled as assets
    pub asset_exts: Vec<String>,

    /// Asset extensions whose dimensions are read
    pub image_exts: Vec<String>,

    /// Platform tokens recognised in file names
    pub platforms: Vec<String>,

    /// package.json fields consulted for the main entry and redirects
    pub main_fields: Vec<String>,

    /// Regular expressions of paths left out of the file index
    pub ignore_patterns: Vec<String>,

    /// Package whose library modules get short names
    pub runtime_package: String,
}

impl ResolverConfig {
    /// Extensions of every file the index records.
    pub fn search_exts(&self) -> Vec<String> {
        let mut exts = self.source_exts.clone();
        for ext in &self.asset_exts {
            if !exts.contains(ext) {
                exts.push(ext.clone());
            }
        }
        exts
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            source_exts: strings(&["js", "json", "ts", "tsx"]),
            asset_exts: strings(&[
                "bmp", "gif", "jpg", "jpeg", "png", "psd", "svg", "webp", "m4v", "mov", "mp4",
                "mpeg", "mpg", "webm", "aac", "aiff", "caf", "m4a", "mp3", "wav", "html", "pdf",
                "otf", "ttf",
            ]),
            image_exts: strings(&[
                "png", "jpg", "jpeg", "bmp", "gif", "webp", "psd", "svg", "tiff",
            ]),
            platforms: strings(&["ios", "android", "windows", "web", "native"]),
            main_fields: strings(&["react-native", "browser", "main"]),
            ignore_patterns: strings(&[
                r"node_modules/react/dist/.*",
                r"website/node_modules/.*",
                r"heapCapture/bundle\.js",
                r".*/__files__/.*",
                r".*/__mocks__/.*",
                r".*/__tests__/.*",
                r".*/__fixtures__/.*",
            ]),
            runtime_package: "react-native".to_string(),
        }
    }
}

/// Bundle layout settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Module identifiers required eagerly at the end of the base bundle
    pub run_before_main: Vec<String>,

    /// Scripts run before any module is defined, relative to the project root
    pub polyfills: Vec<String>,

    /// Identifier prefixes of modules shipped in the base bundle
    pub base_prefixes: Vec<String>,

    /// Specifier of the module assets register with
    pub asset_registry: String,

    /// Specifier of the module backing `import()`
    pub async_require: String,
}

impl Default for BundleConfig {
    fn default() -> Self {
        BundleConfig {
            run_before_main: strings(&[
                "node_modules/react-native/Libraries/Core/InitializeCore.js",
                "node_modules/@sdp.nd/nd-react-wrapper/bundleUtil.js",
            ]),
            polyfills: strings(&[
                "node_modules/metro/src/lib/polyfills/require.js",
                "node_modules/react-native/Libraries/polyfills/Object.es6.js",
                "node_modules/react-native/Libraries/polyfills/console.js",
                "node_modules/react-native/Libraries/polyfills/error-guard.js",
                "node_modules/react-native/Libraries/polyfills/Number.es6.js",
                "node_modules/react-native/Libraries/polyfills/String.prototype.es6.js",
                "node_modules/react-native/Libraries/polyfills/Array.prototype.es6.js",
                "node_modules/react-native/Libraries/polyfills/Array.es6.js",
                "node_modules/react-native/Libraries/polyfills/Object.es7.js",
            ]),
            base_prefixes: strings(DEFAULT_BASE_PREFIXES),
            asset_registry: "react-native/Libraries/Image/AssetRegistry".to_string(),
            async_require: "metro/src/lib/bundle-modules/asyncRequire".to_string(),
        }
    }
}

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse config file: {}", path.display()))
        } else {
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse config file: {}", path.display()))
        }
    }

    /// Load the config file if one is given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = Self::load(path)?;
                tracing::debug!("loaded config from {}", path.display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}
