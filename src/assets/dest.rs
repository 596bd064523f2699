//! Destination layout of copied assets.

use std::path::PathBuf;

use crate::assets::data::AssetInfo;
use crate::assets::path::{
    android_drawable_folder, android_resource_identifier, base_path, format_scale,
};
use crate::core::error::{BundleError, BundleResult};

/// `drawable-<density>/<resource id>.<type>`.
pub fn android_dest_path(asset: &AssetInfo, scale: f64) -> BundleResult<PathBuf> {
    let folder = android_drawable_folder(scale).ok_or_else(|| BundleError::AssetParse {
        path: PathBuf::from(format!(
            "{}/{}.{}",
            asset.http_server_location, asset.name, asset.kind
        )),
        reason: format!("no android drawable density for scale {}", format_scale(scale)),
    })?;
    let file_name = format!(
        "{}.{}",
        android_resource_identifier(&asset.http_server_location, &asset.name),
        asset.kind
    );
    Ok(PathBuf::from(folder).join(file_name))
}

/// `<location without leading slash>/<name>[@<scale>x].<type>`.
pub fn ios_dest_path(asset: &AssetInfo, scale: f64) -> PathBuf {
    let suffix = if scale == 1.0 {
        String::new()
    } else {
        format!("@{}x", format_scale(scale))
    };
    let file_name = format!("{}{}.{}", asset.name, suffix, asset.kind);
    PathBuf::from(base_path(&asset.http_server_location)).join(file_name)
}

/// Destination for `platform`: Android layout for `android`, iOS layout
/// otherwise.
pub fn dest_path(platform: &str, asset: &AssetInfo, scale: f64) -> BundleResult<PathBuf> {
    if platform == "android" {
        android_dest_path(asset, scale)
    } else {
        Ok(ios_dest_path(asset, scale))
    }
}
