//! Normalization for values reported by the validation engine.
//!
//! - **numeric**: heterogeneous numeric text to a canonical decimal
//! - **label**: row/column label shortening and truncation
//! - **render**: locale-neutral display of magnitudes and percentages

pub mod error;
pub mod label;
pub mod numeric;
pub mod render;

pub use error::NormalizationError;
pub use label::{display_label, short_label, strip_table_prefix, truncate_label};
pub use numeric::{normalize_number, parse_number};
pub use render::{format_grouped, format_percent, format_value, render_decimal};
