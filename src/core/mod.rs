//! Core data structures for offpack.
//!
//! This module contains the entities shared by every build phase:
//! - Modules and packages, keyed by absolute path
//! - Module identifiers
//! - Platform tokens
//! - The error taxonomy

pub mod error;
pub mod module;
pub mod module_id;
pub mod package;
pub mod platform;

pub use error::{BundleError, BundleResult};
pub use module::Module;
pub use module_id::ModuleIdFactory;
pub use package::{Package, Redirect, Redirected};
pub use platform::PlatformKey;
