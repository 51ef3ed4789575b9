// src/source/mod.rs
pub mod client;
pub mod models;

pub use client::load_document;
#[allow(unused_imports)]
pub use models::{DocumentSource, LoadedDocument};
