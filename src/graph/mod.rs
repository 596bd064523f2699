//! The module graph: transformation, traversal and compiled output.

pub mod builder;
pub mod scan;
pub mod split;
pub mod transform;
pub mod wrap;

pub use builder::{BuildContext, BuildGraph, GraphBuilder, GraphOptions};
pub use split::SplitPolicy;
pub use transform::{ContentKind, ScanTransformer, SourceUnit, Transformed, Transformer};
