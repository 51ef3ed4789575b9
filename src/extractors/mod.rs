// src/extractors/mod.rs
pub mod catalog;
pub mod collector;
pub mod locator;
pub mod normalize;
pub mod scanner;
pub mod section;
pub mod trace;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use catalog::{SectionCatalog, SectionDefinition};
#[allow(unused_imports)]
pub use section::{ExtractionMode, ParseResult, SectionExtractor};
#[allow(unused_imports)]
pub use trace::{LogObserver, NoopObserver, RecordingObserver, Tee, TraceEvent, TraceObserver};
