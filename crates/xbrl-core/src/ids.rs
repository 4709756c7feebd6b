//! Stable finding ids.

use sha2::{Digest, Sha256};
use xbrl_model::{ColCode, DiagnosticRecord, RowCode};

const SHORT_ID_LEN: usize = 16;

/// Fields that identify a finding across runs, `|`-joined.
pub fn canonical_key(record: &DiagnosticRecord) -> String {
    [
        record.severity.as_str(),
        record.code.trim(),
        record.rule_id.as_deref().unwrap_or(""),
        record.table_id.as_deref().unwrap_or(""),
        record.row_code.as_ref().map_or("", RowCode::as_str),
        record.col_code.as_ref().map_or("", ColCode::as_str),
        record.concept_ln.as_deref().unwrap_or(""),
        record.context_ref.as_deref().unwrap_or(""),
    ]
    .join("|")
}

/// SHA-256 hex of the canonical key.
pub fn full_id(record: &DiagnosticRecord) -> String {
    hex::encode(Sha256::digest(canonical_key(record).as_bytes()))
}

pub fn short_id(record: &DiagnosticRecord) -> String {
    let mut id = full_id(record);
    id.truncate(SHORT_ID_LEN);
    id
}

/// Sets both `id_full` and its short prefix `id`.
pub fn assign_ids(records: &mut [DiagnosticRecord]) {
    for record in records {
        let full = full_id(record);
        record.id = full[..SHORT_ID_LEN].to_string();
        record.id_full = full;
    }
}
