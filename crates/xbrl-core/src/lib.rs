#![deny(unsafe_code)]

pub mod classify;
pub mod compose;
pub mod coverage;
pub mod dedupe;
pub mod enrich;
pub mod error;
pub mod facts;
pub mod filter;
pub mod heuristics;
pub mod ids;
pub mod pipeline;
pub mod report;
pub mod rule_builder;

pub use crate::classify::{ClassificationRule, Classifier, is_generic_code};
pub use crate::compose::{ComposedMessage, MessageComposer, RHS_EXPANSION_LIMIT, compute_gap};
pub use crate::coverage::{CoverageTracker, summarize};
pub use crate::enrich::{CatalogLookup, CellRef, Enricher, Enrichment};
pub use crate::error::RuleModelError;
pub use crate::facts::FactIndex;
pub use crate::filter::{DroppedSample, FilterReport, NonActionableFilter};
pub use crate::heuristics::analyze;
pub use crate::ids::{canonical_key, full_id, short_id};
pub use crate::pipeline::{CoverageRequest, DiagnosticsPipeline, PipelineContext};
pub use crate::report::{CodeCount, FailureSample, RunDiagnostics, RunReport};
pub use crate::rule_builder::build_rule;
