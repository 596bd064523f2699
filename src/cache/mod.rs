//! Build-scoped caches.

pub mod asset_resolution;
pub mod module_package;
pub mod once_map;

pub use asset_resolution::{AssetCandidate, AssetResolutionCache};
pub use module_package::ModulePackageCache;
pub use once_map::OnceMap;
