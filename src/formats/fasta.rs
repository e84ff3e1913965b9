//! FASTA reader.
//!
//! Handles single-line and multi-line sequences.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```
//!
//! The identifier is the header text up to the first whitespace; the rest of
//! the header is kept as the record description. Blank lines and legacy `;`
//! comment lines are skipped.

use thiserror::Error;

use super::{detect_format_from_content, mismatch_hint, FileFormat};
use crate::model::{Batch, Record, SourceFormat};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Empty sequence identifier at line {line}")]
    EmptyIdentifier { line: usize },

    #[error("Sequence data without a '>' header at line {line}; {}", mismatch_hint(.detected))]
    FormatMismatch {
        line: usize,
        detected: Option<FileFormat>,
    },
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Parses FASTA content from a string.
///
/// Records without residues are kept; the writers decide whether they are
/// acceptable. Whitespace-only content gives an empty batch.
///
/// # Examples
///
/// ```
/// use bioconvert::formats::fasta::parse_fasta_str;
///
/// let batch = parse_fasta_str(">seq1 first\nACGT\nAC\n").unwrap();
/// assert_eq!(batch.get(0).unwrap().residues, "ACGTAC");
/// ```
pub fn parse_fasta_str(content: &str) -> FastaResult<Batch> {
    let mut records = Vec::new();
    let mut current: Option<Record> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            // Save previous record if exists
            if let Some(record) = current.take() {
                records.push(record);
            }

            let mut parts = header.trim_start().splitn(2, char::is_whitespace);
            let id = parts.next().unwrap_or("");
            if id.is_empty() {
                return Err(FastaError::EmptyIdentifier { line: line_number });
            }

            let mut record = Record::new(id, String::new(), SourceFormat::Fasta);
            if let Some(description) = parts.next().map(str::trim).filter(|d| !d.is_empty()) {
                record = record.with_description(description);
            }
            current = Some(record);
        } else {
            let record = current.as_mut().ok_or_else(|| FastaError::FormatMismatch {
                line: line_number,
                detected: detect_format_from_content(content),
            })?;

            // Fast append: most FASTA lines don't have internal whitespace
            if line.bytes().all(|b| !b.is_ascii_whitespace()) {
                record.residues.push_str(line);
            } else {
                record
                    .residues
                    .extend(line.chars().filter(|c| !c.is_whitespace()));
            }
        }
    }

    // Don't forget the last record
    if let Some(record) = current {
        records.push(record);
    }

    Ok(Batch::new(records))
}
