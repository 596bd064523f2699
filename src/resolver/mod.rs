//! Module resolution.
//!
//! [`resolve`] maps a specifier required from a module to the file it names.
//! The algorithm only talks to the project through [`ResolutionContext`].

pub mod context;
pub mod resolve;

pub use context::{ContextOptions, ProjectContext, ResolutionContext};
pub use resolve::{resolve, Resolution};
