//! Relaxed PHYLIP writer and reader.
//!
//! ## PHYLIP Format
//!
//! The first line contains the number of sequences and the sequence length,
//! followed by one line per sequence:
//! ```text
//! 3 10
//! Seq1   ACGTACGTAC
//! Seq2   TGCATGCATG
//! LongerName   AAAACCCCGG
//! ```
//!
//! ## Relaxed Names
//!
//! Strict PHYLIP cuts names to 10 characters, which can silently merge
//! distinct taxa. Relaxed PHYLIP keeps the full name and separates it from
//! the residues with whitespace, so names must not contain any.
//!
//! The writer pads every name to the longest one plus `NAME_PADDING` spaces.
//! The reader accepts sequential files (optionally with wrapped sequence
//! lines) and interleaved files whose blocks are separated by blank lines.

use thiserror::Error;

use super::{check_matrix, TargetFormat, WriteResult};
use crate::model::{Batch, Matrix, MatrixRow};

/// Spaces between the longest name and its residues.
pub const NAME_PADDING: usize = 3;

/// Serializes a batch as relaxed PHYLIP text.
pub fn write_phylip_string(batch: &Batch) -> WriteResult<String> {
    let nchar = check_matrix(batch, TargetFormat::Phylip)?;
    let width = batch.max_id_length() + NAME_PADDING;

    let mut out = String::with_capacity(batch.len() * (width + nchar + 1) + 32);
    out.push_str(&format!("{} {}\n", batch.len(), nchar));
    for record in batch {
        out.push_str(&format!("{:<width$}{}\n", record.id, record.residues, width = width));
    }

    Ok(out)
}

/// Errors that can occur during PHYLIP parsing.
#[derive(Error, Debug)]
pub enum PhylipError {
    #[error("Empty PHYLIP file")]
    EmptyFile,

    #[error("Invalid header: expected 'ntax nchar' (two integers), got '{0}'")]
    InvalidHeader(String),

    #[error("No sequence data found after header")]
    NoSequenceData,

    #[error("Expected {expected} sequences but found {found}")]
    SequenceCountMismatch { expected: usize, found: usize },

    #[error("Sequence '{name}' has length {found}, expected {expected}")]
    SequenceLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Result type for PHYLIP operations.
pub type PhylipResult<T> = Result<T, PhylipError>;

/// Parses relaxed PHYLIP content from a string.
pub fn parse_phylip_str(content: &str) -> PhylipResult<Matrix> {
    let mut lines = content.lines().skip_while(|line| line.trim().is_empty());

    let header = lines.next().ok_or(PhylipError::EmptyFile)?.trim();
    let (ntax, nchar) = parse_header(header)?;

    // Blocks of non-empty lines, separated by blank lines
    let mut blocks: Vec<Vec<&str>> = vec![Vec::new()];
    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if blocks.last().map_or(false, |b| !b.is_empty()) {
                blocks.push(Vec::new());
            }
        } else if let Some(block) = blocks.last_mut() {
            block.push(trimmed);
        }
    }
    blocks.retain(|b| !b.is_empty());

    if blocks.is_empty() {
        return Err(PhylipError::NoSequenceData);
    }

    let rows = if blocks[0].len() == ntax {
        parse_interleaved(&blocks, ntax)
    } else {
        parse_sequential(&blocks, nchar)
    };

    if rows.len() != ntax {
        return Err(PhylipError::SequenceCountMismatch {
            expected: ntax,
            found: rows.len(),
        });
    }

    for row in &rows {
        let found = row.residues.chars().count();
        if found != nchar {
            return Err(PhylipError::SequenceLengthMismatch {
                name: row.id.clone(),
                expected: nchar,
                found,
            });
        }
    }

    Ok(Matrix {
        datatype: None,
        rows,
    })
}

fn parse_header(header: &str) -> PhylipResult<(usize, usize)> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(PhylipError::InvalidHeader(header.to_string()));
    }

    let ntax = parts[0]
        .parse()
        .map_err(|_| PhylipError::InvalidHeader(header.to_string()))?;
    let nchar = parts[1]
        .parse()
        .map_err(|_| PhylipError::InvalidHeader(header.to_string()))?;
    Ok((ntax, nchar))
}

/// Splits a line into its name and the (whitespace-free) residues after it.
fn split_name_and_sequence(line: &str) -> MatrixRow {
    let mut parts = line.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let residues = parts.next().map(strip_whitespace).unwrap_or_default();
    MatrixRow::new(name, residues)
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// First block names every taxon once; later blocks continue them in order.
fn parse_interleaved(blocks: &[Vec<&str>], ntax: usize) -> Vec<MatrixRow> {
    let mut rows: Vec<MatrixRow> = blocks[0].iter().map(|l| split_name_and_sequence(l)).collect();

    for block in &blocks[1..] {
        for (i, line) in block.iter().enumerate() {
            rows[i % ntax].residues.push_str(&strip_whitespace(line));
        }
    }

    rows
}

/// A new taxon starts once the previous one holds `nchar` residues.
fn parse_sequential(blocks: &[Vec<&str>], nchar: usize) -> Vec<MatrixRow> {
    let mut rows: Vec<MatrixRow> = Vec::new();

    for line in blocks.iter().flatten() {
        match rows.last_mut() {
            Some(row) if row.residues.chars().count() < nchar => {
                row.residues.push_str(&strip_whitespace(line));
            }
            _ => rows.push(split_name_and_sequence(line)),
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::WriteErrorKind;
    use crate::model::{Record, SourceFormat};

    fn batch_of(rows: &[(&str, &str)]) -> Batch {
        Batch::new(
            rows.iter()
                .map(|(id, seq)| Record::new(*id, *seq, SourceFormat::Fasta))
                .collect(),
        )
    }

    #[test]
    fn test_write_simple_phylip() {
        let batch = batch_of(&[("seq1", "ACGT"), ("seq2", "ACGG")]);
        let text = write_phylip_string(&batch).unwrap();
        assert_eq!(text, "2 4\nseq1   ACGT\nseq2   ACGG\n");
    }

    #[test]
    fn test_write_keeps_long_names() {
        let batch = batch_of(&[("a_very_long_taxon_name", "ACGT"), ("short", "ACGA")]);
        let text = write_phylip_string(&batch).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "a_very_long_taxon_name   ACGT");
        assert_eq!(lines[2], "short                    ACGA");
    }

    #[test]
    fn test_write_does_not_need_molecule_type() {
        // PHYLIP has no datatype declaration
        let batch = batch_of(&[("seq1", "ACGT")]);
        assert!(write_phylip_string(&batch).is_ok());
    }

    #[test]
    fn test_write_errors() {
        let err = write_phylip_string(&Batch::default()).unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::EmptyBatch);

        let err = write_phylip_string(&batch_of(&[("a", "ACGT"), ("b", "ACG")])).unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::UnequalLength);

        let err = write_phylip_string(&batch_of(&[("a\tb", "ACGT")])).unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::InvalidIdentifier);
    }

    #[test]
    fn test_written_phylip_reads_back() {
        let batch = batch_of(&[("abcdefghijkl", "ACGTAC"), ("m", "TT-TTA")]);
        let text = write_phylip_string(&batch).unwrap();
        let matrix = parse_phylip_str(&text).unwrap();
        assert_eq!(
            matrix.rows,
            vec![
                MatrixRow::new("abcdefghijkl", "ACGTAC"),
                MatrixRow::new("m", "TT-TTA"),
            ]
        );
    }

    #[test]
    fn test_parse_sequential_simple() {
        let content = " 3 10
Seq1      ACGTACGTAC
Seq2      TGCATGCATG
Seq3      AAAACCCCGG
";
        let matrix = parse_phylip_str(content).unwrap();
        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.get(0).unwrap().id, "Seq1");
        assert_eq!(matrix.get(0).unwrap().residues, "ACGTACGTAC");
        assert_eq!(matrix.get(2).unwrap().id, "Seq3");
    }

    #[test]
    fn test_parse_sequential_multiline() {
        let content = " 2 20
Seq1      ACGTACGTAC
GGGGG GGGGG
Seq2      TGCATGCATG
CCCCCCCCCC
";
        let matrix = parse_phylip_str(content).unwrap();
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.get(0).unwrap().residues, "ACGTACGTACGGGGGGGGGG");
        assert_eq!(matrix.get(1).unwrap().residues, "TGCATGCATGCCCCCCCCCC");
    }

    #[test]
    fn test_parse_interleaved() {
        let content = " 3 20
Seq1      ACGTACGTAC
Seq2      TGCATGCATG
Seq3      AAAACCCCGG

GGGGGGGGGG
CCCCCCCCCC
TTTTTTTTTT
";
        let matrix = parse_phylip_str(content).unwrap();
        assert_eq!(matrix.row_count(), 3);
        assert_eq!(matrix.get(0).unwrap().residues, "ACGTACGTACGGGGGGGGGG");
        assert_eq!(matrix.get(1).unwrap().residues, "TGCATGCATGCCCCCCCCCC");
        assert_eq!(matrix.get(2).unwrap().residues, "AAAACCCCGGTTTTTTTTTT");
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(parse_phylip_str(""), Err(PhylipError::EmptyFile)));
        assert!(matches!(parse_phylip_str("2 4\n\n"), Err(PhylipError::NoSequenceData)));
    }

    #[test]
    fn test_invalid_header() {
        assert!(matches!(
            parse_phylip_str("invalid\nSeq1 ACGT\n"),
            Err(PhylipError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse_phylip_str("two 4\nSeq1 ACGT\n"),
            Err(PhylipError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_count_and_length_mismatch() {
        assert!(matches!(
            parse_phylip_str("3 4\nSeq1 ACGT\nSeq2 ACGT\n"),
            Err(PhylipError::SequenceCountMismatch { expected: 3, found: 2 })
        ));
        assert!(matches!(
            parse_phylip_str("1 5\nSeq1 ACGT\n"),
            Err(PhylipError::SequenceLengthMismatch { expected: 5, found: 4, .. })
        ));
    }
}
