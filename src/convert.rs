//! Conversion orchestration.
//!
//! One call turns raw input bytes into both output buffers:
//! decode -> parse -> annotate -> write NEXUS, write PHYLIP.
//!
//! Decoding and parsing failures end the call. The two writers run
//! independently, so a batch that NEXUS rejects can still produce PHYLIP and
//! the other way round. Nothing is shared between calls.

use thiserror::Error;

use crate::annotate::annotate;
use crate::formats::{self, ParseError, TargetFormat, WriteResult};
use crate::model::{MoleculeType, SourceFormat};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Failure category of a conversion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorKind {
    Undecodable,
    Parse,
    NoRecords,
}

/// Errors that end a conversion before any output is written.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Input is not valid UTF-8 text (invalid byte at offset {offset})")]
    Undecodable { offset: usize },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("No sequences found in the {format} input")]
    NoRecords { format: SourceFormat },
}

impl ConversionError {
    pub fn kind(&self) -> ConversionErrorKind {
        match self {
            ConversionError::Undecodable { .. } => ConversionErrorKind::Undecodable,
            ConversionError::Parse(_) => ConversionErrorKind::Parse,
            ConversionError::NoRecords { .. } => ConversionErrorKind::NoRecords,
        }
    }
}

/// Result type for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Outcome of a conversion whose input parsed.
///
/// Each output carries its own result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Number of records parsed from the input
    pub record_count: usize,
    pub nexus: WriteResult<Vec<u8>>,
    pub phylip: WriteResult<Vec<u8>>,
}

impl Conversion {
    /// Result for one of the two outputs.
    pub fn output(&self, format: TargetFormat) -> &WriteResult<Vec<u8>> {
        match format {
            TargetFormat::Nexus => &self.nexus,
            TargetFormat::Phylip => &self.phylip,
        }
    }

    /// True when both outputs were produced.
    pub fn is_complete(&self) -> bool {
        self.nexus.is_ok() && self.phylip.is_ok()
    }
}

/// Decodes input bytes as UTF-8, dropping a leading byte-order mark.
pub fn decode(raw: &[u8]) -> ConversionResult<&str> {
    let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
    std::str::from_utf8(raw).map_err(|e| ConversionError::Undecodable {
        offset: e.valid_up_to(),
    })
}

/// Converts raw input in `source_format` to NEXUS and relaxed PHYLIP.
///
/// # Examples
///
/// ```
/// use bioconvert::convert::convert;
/// use bioconvert::model::{MoleculeType, SourceFormat};
///
/// let conversion = convert(b">seq1\nACGT\n>seq2\nACGG\n", SourceFormat::Fasta, MoleculeType::Dna).unwrap();
/// assert_eq!(conversion.phylip.unwrap(), b"2 4\nseq1   ACGT\nseq2   ACGG\n");
/// ```
pub fn convert(
    raw: &[u8],
    source_format: SourceFormat,
    molecule_type: MoleculeType,
) -> ConversionResult<Conversion> {
    let text = decode(raw)?;
    let batch = formats::parse(text, source_format)?;

    if batch.is_empty() {
        return Err(ConversionError::NoRecords {
            format: source_format,
        });
    }

    let batch = annotate(batch, molecule_type);

    Ok(Conversion {
        record_count: batch.len(),
        nexus: formats::write(&batch, TargetFormat::Nexus),
        phylip: formats::write(&batch, TargetFormat::Phylip),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::WriteErrorKind;

    #[test]
    fn test_convert_simple_fasta() {
        let conversion = convert(b">seq1\nACGT\n>seq2\nACGG\n", SourceFormat::Fasta, MoleculeType::Dna)
            .unwrap();
        assert_eq!(conversion.record_count, 2);
        assert!(conversion.is_complete());

        let nexus = String::from_utf8(conversion.nexus.unwrap()).unwrap();
        assert!(nexus.contains("FORMAT DATATYPE=DNA"));
        assert!(nexus.lines().any(|l| l == "seq1 ACGT"));
        assert!(nexus.lines().any(|l| l == "seq2 ACGG"));

        let phylip = String::from_utf8(conversion.phylip.unwrap()).unwrap();
        let lines: Vec<&str> = phylip.lines().collect();
        assert_eq!(lines, vec!["2 4", "seq1   ACGT", "seq2   ACGG"]);
    }

    #[test]
    fn test_empty_input_is_no_records() {
        let err = convert(b"", SourceFormat::Fasta, MoleculeType::Dna).unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::NoRecords);

        let err = convert(b"\n\n", SourceFormat::GenBank, MoleculeType::Dna).unwrap_err();
        assert!(matches!(err, ConversionError::NoRecords { format: SourceFormat::GenBank }));
    }

    #[test]
    fn test_undecodable_input() {
        let err = convert(b">seq1\nAC\xFFGT\n", SourceFormat::Fasta, MoleculeType::Dna).unwrap_err();
        assert!(matches!(err, ConversionError::Undecodable { offset: 8 }));
    }

    #[test]
    fn test_byte_order_mark_is_dropped() {
        let conversion = convert(b"\xEF\xBB\xBF>seq1\nACGT\n", SourceFormat::Fasta, MoleculeType::Dna)
            .unwrap();
        assert!(conversion.is_complete());
    }

    #[test]
    fn test_unequal_lengths_fail_both_writers() {
        let conversion =
            convert(b">a\nACGT\n>b\nACGTA\n", SourceFormat::Fasta, MoleculeType::Dna).unwrap();
        assert_eq!(
            conversion.nexus.as_ref().unwrap_err().kind(),
            WriteErrorKind::UnequalLength
        );
        assert_eq!(
            conversion.phylip.as_ref().unwrap_err().kind(),
            WriteErrorKind::UnequalLength
        );
    }

    #[test]
    fn test_format_mismatch() {
        let genbank = b"LOCUS       AB000001   4 bp    DNA\nORIGIN\n        1 acgt\n//\n";
        let err = convert(genbank, SourceFormat::Fasta, MoleculeType::Dna).unwrap_err();
        assert_eq!(err.kind(), ConversionErrorKind::Parse);
        match err {
            ConversionError::Parse(e) => {
                assert!(e.is_format_mismatch());
                assert_eq!(e.format(), SourceFormat::Fasta);
                assert!(e.to_string().contains("format mismatch"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_output_accessor() {
        let conversion = convert(b">a\nACGT\n", SourceFormat::Fasta, MoleculeType::Rna).unwrap();
        let nexus = conversion.output(TargetFormat::Nexus).as_ref().unwrap();
        assert!(String::from_utf8_lossy(nexus).contains("DATATYPE=RNA"));
    }
}
