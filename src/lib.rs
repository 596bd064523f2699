//! offpack - an offline bundle packager for React Native module graphs
//!
//! This crate provides the core library functionality for offpack:
//! project indexing, module resolution, graph building and bundle
//! serialization.

pub mod assets;
pub mod bundle;
pub mod cache;
pub mod core;
pub mod graph;
pub mod haste;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities for offpack unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It lays out temporary project trees on disk.
#[cfg(test)]
pub mod test_support;

pub use crate::bundle::{BundleFormat, IndexedBundle};
pub use crate::core::{BundleError, BundleResult, Module, Package};
pub use crate::ops::{BundleOptions, BundleSummary};
pub use crate::util::config::Config;
