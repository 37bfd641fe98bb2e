//! Evidence Assembler
//!
//! Bounds a transaction history for embedding in a prompt: at most
//! [`MAX_EVIDENCE_RECORDS`] records, serialized to JSON, then cut to
//! [`MAX_EVIDENCE_CHARS`] characters.
//!
//! The cut is made on the serialized string, so the last record (and the
//! closing bracket) may be lost. The prompt is read by a model, not parsed,
//! and this lossiness is accepted.

use serde::Serialize;

use crate::error::Result;

/// Most records ever serialized into a prompt
pub const MAX_EVIDENCE_RECORDS: usize = 50;

/// Character budget of the serialized evidence
pub const MAX_EVIDENCE_CHARS: usize = 6000;

/// Serialized, bounded evidence ready for a prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvidenceSet {
    text: String,
    record_count: usize,
    truncated: bool,
}

impl EvidenceSet {
    /// Assemble evidence from the leading records of `records`
    pub fn assemble<T: Serialize>(records: &[T]) -> Result<Self> {
        let window = &records[..records.len().min(MAX_EVIDENCE_RECORDS)];
        let mut text = serde_json::to_string(window)?;
        let truncated = truncate_chars(&mut text, MAX_EVIDENCE_CHARS);

        if truncated {
            tracing::debug!(records = window.len(), "Evidence truncated to character budget");
        }

        Ok(Self {
            text,
            record_count: window.len(),
            truncated,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Records serialized before the character cut
    pub const fn record_count(&self) -> usize {
        self.record_count
    }

    pub const fn is_truncated(&self) -> bool {
        self.truncated
    }
}

/// Cut `text` to at most `max` characters. Returns whether anything was removed.
pub(crate) fn truncate_chars(text: &mut String, max: usize) -> bool {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            true
        }
        None => false,
    }
}
