// src/document/mod.rs
pub mod convert;
pub mod tree;

// Re-export the tree model and the conversion boundary
#[allow(unused_imports)]
pub use convert::{convert_document, Conversion, Converter, SourceFormat};
#[allow(unused_imports)]
pub use tree::{Block, BlockId, BlockKind, DocumentTree};
