//! Per-user store of extracted documents and the folder that indexes them.

mod service;

pub use service::{CatalogService, DocumentChanges};
