pub mod category;
pub mod codes;
pub mod coverage;
pub mod decimal;
pub mod diagnostic;
pub mod error;
pub mod event;
pub mod failure;
pub mod flags;
pub mod numeric;
pub mod options;
pub mod rule;

pub use category::Category;
pub use codes::{ColCode, RowCode};
pub use coverage::{CoverageStatus, CoverageSummary, RebuildPhase, UnavailableReason};
pub use decimal::Decimal;
pub use diagnostic::{DiagnosticRecord, Gap};
pub use error::{ModelError, Result};
pub use event::{RawEvent, Severity};
pub use failure::FailureKind;
pub use flags::{ContributorKind, DominantContributor, HeuristicFlags};
pub use numeric::{NumericValue, ScaleHint};
pub use options::{NonActionableMode, PipelineOptions, Profile};
pub use rule::{
    ObservedFact, Operator, RuleDefinition, RuleInstance, RuleTerm, SignConvention, TermRef,
    TermStatus,
};
