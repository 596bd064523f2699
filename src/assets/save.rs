//! Copy registered assets to the platform's resource layout.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::assets::data::AssetInfo;
use crate::assets::dest::dest_path;
use crate::assets::scales::filter_platform_scales;
use crate::core::error::BundleResult;
use crate::util::fs;

/// One asset file and where it is copied to.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCopy {
    pub src: PathBuf,
    pub dest: PathBuf,
}

/// Destinations of every asset file whose scale the platform ships.
///
/// Nothing is touched on disk, so a bad asset fails the build before any
/// output is written.
pub fn plan_assets(
    assets: &BTreeMap<PathBuf, AssetInfo>,
    platform: &str,
    out_dir: &Path,
) -> BundleResult<Vec<AssetCopy>> {
    let mut copies = Vec::new();
    for (src, info) in assets {
        let valid = filter_platform_scales(platform, &info.scales);
        if !valid.contains(&info.scale) {
            continue;
        }
        copies.push(AssetCopy {
            src: src.clone(),
            dest: out_dir.join(dest_path(platform, info, info.scale)?),
        });
    }
    Ok(copies)
}

/// Copy planned asset files. Returns the number of files copied.
pub fn copy_assets(copies: &[AssetCopy], out_dir: &Path) -> BundleResult<usize> {
    for copy in copies {
        tracing::debug!("copying {} -> {}", copy.src.display(), copy.dest.display());
        fs::copy_file(&copy.src, &copy.dest)?;
    }
    tracing::info!("copied {} assets to {}", copies.len(), out_dir.display());
    Ok(copies.len())
}

/// Copy every asset file whose scale the platform ships. Returns the number
/// of files copied.
pub fn save_assets(
    assets: &BTreeMap<PathBuf, AssetInfo>,
    platform: &str,
    out_dir: &Path,
) -> BundleResult<usize> {
    let copies = plan_assets(assets, platform, out_dir)?;
    copy_assets(&copies, out_dir)
}
