//! Sequence format readers and writers.
//!
//! Input formats (read into a `Batch`):
//! - FASTA
//! - GenBank flat file
//!
//! Output formats (written from an annotated `Batch`):
//! - NEXUS
//! - PHYLIP (relaxed)
//!
//! The source format is always declared by the caller. Content sniffing is
//! only used to explain a failed parse, never to pick another reader.

pub mod fasta;
pub mod genbank;
pub mod nexus;
pub mod phylip;

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use crate::model::{Batch, SourceFormat};

/// Any of the formats this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    GenBank,
    Nexus,
    Phylip,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Fasta => write!(f, "FASTA"),
            FileFormat::GenBank => write!(f, "GenBank"),
            FileFormat::Nexus => write!(f, "NEXUS"),
            FileFormat::Phylip => write!(f, "PHYLIP"),
        }
    }
}

impl From<SourceFormat> for FileFormat {
    fn from(format: SourceFormat) -> Self {
        match format {
            SourceFormat::Fasta => FileFormat::Fasta,
            SourceFormat::GenBank => FileFormat::GenBank,
        }
    }
}

/// File name, without extension, of converted outputs.
pub const DEFAULT_FILE_STEM: &str = "converted_sequences";

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetFormat {
    Nexus,
    Phylip,
}

impl TargetFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Nexus => "nex",
            TargetFormat::Phylip => "phy",
        }
    }

    /// `<stem>.<extension>` for this output.
    pub fn file_name(self, stem: &str) -> String {
        format!("{}.{}", stem, self.extension())
    }

    /// Default download name for this output.
    pub fn suggested_file_name(self) -> String {
        self.file_name(DEFAULT_FILE_STEM)
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetFormat::Nexus => write!(f, "NEXUS"),
            TargetFormat::Phylip => write!(f, "PHYLIP"),
        }
    }
}

impl From<TargetFormat> for FileFormat {
    fn from(format: TargetFormat) -> Self {
        match format {
            TargetFormat::Nexus => FileFormat::Nexus,
            TargetFormat::Phylip => FileFormat::Phylip,
        }
    }
}

/// Errors that can occur while reading a source format.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("FASTA error: {0}")]
    Fasta(#[from] fasta::FastaError),

    #[error("GenBank error: {0}")]
    GenBank(#[from] genbank::GenBankError),
}

impl ParseError {
    /// The format the input was declared to be in.
    pub fn format(&self) -> SourceFormat {
        match self {
            ParseError::Fasta(_) => SourceFormat::Fasta,
            ParseError::GenBank(_) => SourceFormat::GenBank,
        }
    }

    /// Why the input was rejected, without the format prefix.
    pub fn reason(&self) -> String {
        match self {
            ParseError::Fasta(e) => e.to_string(),
            ParseError::GenBank(e) => e.to_string(),
        }
    }

    /// True when the content does not look like the declared format at all.
    pub fn is_format_mismatch(&self) -> bool {
        matches!(
            self,
            ParseError::Fasta(fasta::FastaError::FormatMismatch { .. })
                | ParseError::GenBank(genbank::GenBankError::FormatMismatch { .. })
        )
    }
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Writer precondition that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteErrorKind {
    EmptyBatch,
    UnequalLength,
    EmptySequence,
    InvalidIdentifier,
    DuplicateIdentifier,
    InvalidResidue,
    MissingMoleculeType,
}

/// Errors that can occur while writing an output format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("{format} output needs at least one sequence")]
    EmptyBatch { format: TargetFormat },

    #[error(
        "{format} output needs aligned sequences: '{id}' has length {found}, expected {expected}"
    )]
    UnequalLength {
        format: TargetFormat,
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("{format} output needs non-empty sequences: '{id}' has no residues")]
    EmptySequence { format: TargetFormat, id: String },

    #[error("Identifier '{id}' cannot be written to {format}: {reason}")]
    InvalidIdentifier {
        format: TargetFormat,
        id: String,
        reason: &'static str,
    },

    #[error("Identifier '{id}' appears more than once; {format} rows must be unique")]
    DuplicateIdentifier { format: TargetFormat, id: String },

    #[error("Sequence '{id}' contains '{character}', which {format} cannot hold in a matrix row")]
    InvalidResidue {
        format: TargetFormat,
        id: String,
        character: char,
    },

    #[error("Sequence '{id}' has no molecule type; NEXUS output needs a declared DATATYPE")]
    MissingMoleculeType { id: String },
}

impl WriteError {
    pub fn kind(&self) -> WriteErrorKind {
        match self {
            WriteError::EmptyBatch { .. } => WriteErrorKind::EmptyBatch,
            WriteError::UnequalLength { .. } => WriteErrorKind::UnequalLength,
            WriteError::EmptySequence { .. } => WriteErrorKind::EmptySequence,
            WriteError::InvalidIdentifier { .. } => WriteErrorKind::InvalidIdentifier,
            WriteError::DuplicateIdentifier { .. } => WriteErrorKind::DuplicateIdentifier,
            WriteError::InvalidResidue { .. } => WriteErrorKind::InvalidResidue,
            WriteError::MissingMoleculeType { .. } => WriteErrorKind::MissingMoleculeType,
        }
    }

    /// The output format whose precondition was violated.
    pub fn format(&self) -> TargetFormat {
        match self {
            WriteError::EmptyBatch { format }
            | WriteError::UnequalLength { format, .. }
            | WriteError::EmptySequence { format, .. }
            | WriteError::InvalidIdentifier { format, .. }
            | WriteError::DuplicateIdentifier { format, .. }
            | WriteError::InvalidResidue { format, .. } => *format,
            WriteError::MissingMoleculeType { .. } => TargetFormat::Nexus,
        }
    }
}

/// Result type for writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Detects the file format by examining the content.
///
/// Looks at the first non-empty line only.
pub fn detect_format_from_content(content: &str) -> Option<FileFormat> {
    let trimmed = content.lines().map(str::trim).find(|line| !line.is_empty())?;

    // NEXUS: starts with #NEXUS (case-insensitive) - most specific
    if trimmed.to_uppercase().starts_with("#NEXUS") {
        return Some(FileFormat::Nexus);
    }

    if trimmed.starts_with('>') {
        return Some(FileFormat::Fasta);
    }

    if trimmed.split_whitespace().next() == Some("LOCUS") {
        return Some(FileFormat::GenBank);
    }

    // PHYLIP: first line is "ntax nchar" (two integers)
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() >= 2 && parts[0].parse::<usize>().is_ok() && parts[1].parse::<usize>().is_ok() {
        return Some(FileFormat::Phylip);
    }

    None
}

/// Describes a failed format match for error messages.
pub(crate) fn mismatch_hint(detected: &Option<FileFormat>) -> String {
    match detected {
        Some(format) => format!("content looks like {}, likely a format mismatch", format),
        None => "likely a format mismatch".to_string(),
    }
}

/// Parses `content` as the declared source format.
///
/// Whitespace-only content yields an empty batch.
pub fn parse(content: &str, format: SourceFormat) -> ParseResult<Batch> {
    match format {
        SourceFormat::Fasta => fasta::parse_fasta_str(content).map_err(ParseError::Fasta),
        SourceFormat::GenBank => genbank::parse_genbank_str(content).map_err(ParseError::GenBank),
    }
}

/// Serializes an annotated batch to the target format.
pub fn write(batch: &Batch, format: TargetFormat) -> WriteResult<Vec<u8>> {
    let text = match format {
        TargetFormat::Nexus => nexus::write_nexus_string(batch)?,
        TargetFormat::Phylip => phylip::write_phylip_string(batch)?,
    };
    Ok(text.into_bytes())
}

/// Checks the preconditions shared by the matrix writers and returns the
/// common sequence length.
pub(crate) fn check_matrix(batch: &Batch, format: TargetFormat) -> WriteResult<usize> {
    let first = batch.get(0).ok_or(WriteError::EmptyBatch { format })?;
    let expected = first.len();

    for record in batch {
        let found = record.len();
        if found != expected {
            return Err(WriteError::UnequalLength {
                format,
                id: record.id.clone(),
                expected,
                found,
            });
        }
    }

    if expected == 0 {
        return Err(WriteError::EmptySequence {
            format,
            id: first.id.clone(),
        });
    }

    let mut seen = HashSet::with_capacity(batch.len());
    for record in batch {
        if let Some(reason) = identifier_problem(&record.id) {
            return Err(WriteError::InvalidIdentifier {
                format,
                id: record.id.clone(),
                reason,
            });
        }
        if !seen.insert(record.id.as_str()) {
            return Err(WriteError::DuplicateIdentifier {
                format,
                id: record.id.clone(),
            });
        }
    }

    Ok(expected)
}

/// Row labels are whitespace-delimited in both output formats.
fn identifier_problem(id: &str) -> Option<&'static str> {
    if id.is_empty() {
        Some("identifier is empty")
    } else if id.chars().any(char::is_whitespace) {
        Some("identifier contains whitespace")
    } else if id.chars().any(char::is_control) {
        Some("identifier contains a control character")
    } else {
        None
    }
}
