pub mod error;
pub mod events;
pub mod facts;
pub mod mapping;
pub mod rules;

pub use error::{IngestError, Result};
pub use events::{EventBatch, SkippedEvent, load_events, parse_events};
pub use facts::load_facts;
pub use mapping::{
    MappedCell, MappedFact, Qualifier, TableMapping, list_mapping_files, load_table_mapping,
    load_table_mappings,
};
pub use rules::{load_rules, parse_rules};
