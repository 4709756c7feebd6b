#![deny(unsafe_code)]

pub mod baseline;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hash;
pub mod rebuild;
pub mod source;

pub use crate::baseline::{BaselineKey, BaselineSnapshot, BaselineStore, RuleCensus};
pub use crate::cache::{BaselineCache, SnapshotCache};
pub use crate::catalog::MessageCatalog;
pub use crate::config::{BaselineConfig, CatalogConfig, DiagnosticsConfig};
pub use crate::error::StandardsError;
pub use crate::hash::{sha256_hex, taxonomy_hash};
pub use crate::rebuild::{BaselineRebuilder, RebuildState};
pub use crate::source::{BaselineSource, TaxonomyAssertionSource};
