//! Hierarchical result archive.
//!
//! A tree of named groups with UTF-8 string datasets at the leaves,
//! stored on disk as a single JSON document.

pub mod file;
pub mod tree;

pub use file::{ArchiveFile, ARCHIVE_FORMAT, ARCHIVE_VERSION};
pub use tree::{Archive, Dataset, Group, UTF8_DTYPE};
