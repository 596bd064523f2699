//! High-level operations.
//!
//! This module contains the implementation of offpack commands.

pub mod bundle;

pub use bundle::{bundle, index_project, BundleOptions, BundleSummary};
