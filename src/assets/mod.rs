//! Assets: file name grammar, registration data and copying.

pub mod data;
pub mod dest;
pub mod image;
pub mod path;
pub mod save;
pub mod scales;

pub use data::{AssetData, AssetInfo};
pub use path::{try_parse, AssetPathParts};
pub use save::{copy_assets, plan_assets, save_assets, AssetCopy};
pub use scales::filter_platform_scales;
