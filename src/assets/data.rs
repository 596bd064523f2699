//! Asset registration data.
//!
//! An asset module registers one logical asset with the runtime's asset
//! registry: its server location, the scales available in its directory,
//! a content hash and (for images) its size in points.

use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::assets::image;
use crate::assets::path::{try_parse, AssetPathParts};
use crate::core::error::{BundleError, BundleResult};
use crate::util::{fs, paths};

/// Per-file record kept for copying assets after the build.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetInfo {
    pub http_server_location: String,
    pub name: String,
    pub scale: f64,
    pub kind: String,
    pub scales: Vec<f64>,
}

/// The object passed to `registerAsset`.
#[derive(Debug, Clone, Serialize)]
pub struct AssetData {
    #[serde(rename = "__packager_asset")]
    pub packager_asset: bool,
    #[serde(rename = "httpServerLocation")]
    pub http_server_location: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "js_optional_number"
    )]
    pub width: Option<f64>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "js_optional_number"
    )]
    pub height: Option<f64>,
    #[serde(serialize_with = "js_numbers")]
    pub scales: Vec<f64>,
    pub hash: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Scale → file, ascending by scale.
    #[serde(skip)]
    pub files: Vec<(f64, PathBuf)>,
}

impl AssetData {
    /// Collect the data for the asset at `path`.
    ///
    /// `relative_path` is the asset's path relative to the project root and
    /// `listing` the file names of its directory. Only `platform` is
    /// recognised as a platform segment. Image dimensions are read when
    /// `is_image` is set.
    pub fn build(
        path: &Path,
        relative_path: &Path,
        platform: &str,
        listing: &[String],
        is_image: bool,
    ) -> BundleResult<Self> {
        let platforms = [platform];
        let file_name = paths::file_name(path);
        let current = try_parse(file_name, &platforms).ok_or_else(|| BundleError::AssetParse {
            path: path.to_path_buf(),
            reason: "file name does not follow <name>[@<scale>x][.<platform>].<type>".to_string(),
        })?;

        let dir = paths::parent(path);
        let key = group_key(&current);
        let mut files: Vec<(f64, PathBuf)> = Vec::new();
        for sibling in listing {
            let Some(parts) = try_parse(sibling, &platforms) else {
                continue;
            };
            if group_key(&parts) != key {
                continue;
            }
            let sibling_path = dir.join(sibling);
            match files.iter_mut().find(|(scale, _)| *scale == parts.scale) {
                Some(entry) => entry.1 = sibling_path,
                None => files.push((parts.scale, sibling_path)),
            }
        }
        if files.is_empty() {
            files.push((current.scale, path.to_path_buf()));
        }
        files.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut context = md5::Context::new();
        for (_, file) in &files {
            context.consume(fs::read(file)?);
        }
        let hash = format!("{:x}", context.compute());

        let scales: Vec<f64> = files.iter().map(|(scale, _)| *scale).collect();
        let (width, height) = if is_image {
            let primary = scales[0];
            match image::dimensions(&fs::read(path)?) {
                Some((w, h)) => (Some(w as f64 / primary), Some(h as f64 / primary)),
                None => {
                    tracing::debug!("no readable dimensions for {}", path.display());
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        Ok(AssetData {
            packager_asset: true,
            http_server_location: http_server_location(relative_path),
            width,
            height,
            scales,
            hash,
            name: current.name,
            kind: current.kind,
            files,
        })
    }

    /// One copy record per scale file.
    pub fn infos(&self) -> Vec<(PathBuf, AssetInfo)> {
        self.files
            .iter()
            .map(|(scale, file)| {
                let info = AssetInfo {
                    http_server_location: self.http_server_location.clone(),
                    name: self.name.clone(),
                    scale: *scale,
                    kind: self.kind.clone(),
                    scales: self.scales.clone(),
                };
                (file.clone(), info)
            })
            .collect()
    }

    /// Module body registering the asset with `registry`.
    pub fn module_source(&self, registry: &str) -> BundleResult<String> {
        let data = serde_json::to_string(self)
            .map_err(|e| BundleError::Invariant(format!("asset data: {}", e)))?;
        let registry = serde_json::to_string(registry)
            .map_err(|e| BundleError::Invariant(format!("asset registry: {}", e)))?;
        Ok(format!(
            "module.exports = require({}).registerAsset({});",
            registry, data
        ))
    }
}

fn group_key(parts: &AssetPathParts) -> String {
    match &parts.platform {
        Some(platform) => format!("{}{}", parts.asset_name, platform),
        None => parts.asset_name.clone(),
    }
}

/// `/assets/<directory of the relative path>`.
fn http_server_location(relative_path: &Path) -> String {
    let location = paths::join(Path::new("/assets"), paths::parent(relative_path));
    paths::to_slash(&location)
}

fn js_number<S: Serializer>(value: f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        serializer.serialize_i64(value as i64)
    } else {
        serializer.serialize_f64(value)
    }
}

fn js_optional_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => js_number(*v, serializer),
        None => serializer.serialize_none(),
    }
}

fn js_numbers<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
    struct JsNumber(f64);

    impl Serialize for JsNumber {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            js_number(self.0, serializer)
        }
    }

    serializer.collect_seq(values.iter().map(|v| JsNumber(*v)))
}
