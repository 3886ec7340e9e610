//! Built-in modules.
//!
//! [`If`] is the branching combinator; the rest are small building blocks
//! (file reading, content and metadata rewrites) that pipelines are wired
//! from.

mod branch;
pub(crate) mod content;
mod read_files;

pub use branch::{If, IfElse};
pub use content::{Content, Meta};
pub use read_files::{
    FILE_BASE, FILE_DIR, FILE_EXT, FILE_NAME, FILE_PATH, FILE_ROOT, ReadFiles, SearchDepth,
};
