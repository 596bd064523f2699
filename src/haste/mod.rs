//! Filesystem index and short-name lookup.

pub mod crawl;
pub mod index;
pub mod short_name;

pub use crawl::{crawl, FileMap, IgnoreMatcher};
pub use index::{FileIndex, HasteFs, ShortNameIndex};
pub use short_name::{ModuleKind, ShortNameRules};
