//! GenBank flat-file reader.
//!
//! Only the parts needed for conversion are read: the identifier, the
//! definition line and the sequence block. Feature tables and references are
//! skipped.
//!
//! ## GenBank Format
//!
//! ```text
//! LOCUS       SCU49845     5028 bp    DNA             PLN       21-JUN-1999
//! DEFINITION  Saccharomyces cerevisiae TCP1-beta gene, partial cds, and Axl2p
//!             (AXL2) and Rev7p (REV7) genes, complete cds.
//! ACCESSION   U49845
//! VERSION     U49845.1  GI:1293613
//! FEATURES             Location/Qualifiers
//!      source          1..5028
//! ORIGIN
//!         1 gatcctccat atacaacggt atctccacct caggtttaga tctcaacaac ggaaccattg
//! //
//! ```
//!
//! Several records may follow each other in one input. The identifier is the
//! `VERSION` accession, falling back to `ACCESSION` and then to the `LOCUS`
//! name. Residues are uppercased.

use thiserror::Error;

use super::{detect_format_from_content, mismatch_hint, FileFormat};
use crate::model::{Batch, Record, SourceFormat};

/// Errors that can occur during GenBank parsing.
#[derive(Error, Debug)]
pub enum GenBankError {
    #[error("Expected a LOCUS line at line {line}; {}", mismatch_hint(.detected))]
    FormatMismatch {
        line: usize,
        detected: Option<FileFormat>,
    },

    #[error("Malformed LOCUS line at line {line}: missing locus name")]
    MalformedLocus { line: usize },

    #[error("Malformed section header at line {line}: '{text}'")]
    MalformedHeader { line: usize, text: String },

    #[error("Record '{locus}' has no ORIGIN sequence block")]
    MissingOrigin { locus: String },

    #[error("Invalid character '{character}' in sequence of '{locus}' at line {line}")]
    InvalidSequence {
        locus: String,
        line: usize,
        character: char,
    },

    #[error("Record '{locus}' is not terminated by '//'")]
    UnterminatedRecord { locus: String },
}

/// Result type for GenBank operations.
pub type GenBankResult<T> = Result<T, GenBankError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Origin,
}

/// A record being assembled, from its LOCUS line up to `//`.
#[derive(Debug)]
struct PendingRecord {
    locus: String,
    accession: Option<String>,
    version: Option<String>,
    definition: Option<String>,
    residues: String,
    section: Section,
    last_keyword: String,
}

impl PendingRecord {
    fn from_locus_line(rest: &str, line: usize) -> GenBankResult<Self> {
        let locus = rest
            .split_whitespace()
            .next()
            .ok_or(GenBankError::MalformedLocus { line })?;
        Ok(Self {
            locus: locus.to_string(),
            accession: None,
            version: None,
            definition: None,
            residues: String::new(),
            section: Section::Header,
            last_keyword: "LOCUS".to_string(),
        })
    }

    /// Consumes one non-blank line that is not a `//` terminator.
    fn feed(&mut self, line: &str, line_number: usize) -> GenBankResult<()> {
        if split_keyword(line).map(|(k, _)| k) == Some("LOCUS") {
            // A new record started before this one was closed
            return Err(self.unterminated());
        }

        match self.section {
            Section::Origin => self.feed_sequence(line, line_number),
            Section::Header => self.feed_header(line, line_number),
        }
    }

    fn feed_header(&mut self, line: &str, line_number: usize) -> GenBankResult<()> {
        if line.starts_with(char::is_whitespace) {
            // Continuation, sub-keyword or feature table line
            if self.last_keyword == "DEFINITION" {
                if let Some(definition) = self.definition.as_mut() {
                    definition.push(' ');
                    definition.push_str(line.trim());
                }
            }
            return Ok(());
        }

        let (keyword, rest) = split_keyword(line).ok_or_else(|| GenBankError::MalformedHeader {
            line: line_number,
            text: line.to_string(),
        })?;

        match keyword {
            "DEFINITION" => self.definition = Some(rest.to_string()),
            "ACCESSION" => self.accession = first_token(rest),
            "VERSION" => self.version = first_token(rest),
            "ORIGIN" => self.section = Section::Origin,
            _ => {}
        }
        self.last_keyword = keyword.to_string();
        Ok(())
    }

    fn feed_sequence(&mut self, line: &str, line_number: usize) -> GenBankResult<()> {
        for token in line.split_whitespace() {
            // Position numbers
            if token.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Some(bad) = token.chars().find(|&c| !is_residue_char(c)) {
                return Err(GenBankError::InvalidSequence {
                    locus: self.locus.clone(),
                    line: line_number,
                    character: bad,
                });
            }
            self.residues
                .extend(token.chars().map(|c| c.to_ascii_uppercase()));
        }
        Ok(())
    }

    fn unterminated(&self) -> GenBankError {
        match self.section {
            Section::Header => GenBankError::MissingOrigin {
                locus: self.locus.clone(),
            },
            Section::Origin => GenBankError::UnterminatedRecord {
                locus: self.locus.clone(),
            },
        }
    }

    fn finish(self) -> GenBankResult<Record> {
        if self.section != Section::Origin {
            return Err(GenBankError::MissingOrigin { locus: self.locus });
        }

        let id = self.version.or(self.accession).unwrap_or(self.locus);
        let mut record = Record::new(id, self.residues, SourceFormat::GenBank);
        if let Some(definition) = self.definition.filter(|d| !d.is_empty()) {
            record = record.with_description(definition);
        }
        Ok(record)
    }
}

/// Splits a column-0 line into its upper-case keyword and the remaining text.
///
/// Returns `None` if the first token is not a section keyword.
fn split_keyword(line: &str) -> Option<(&str, &str)> {
    let end = line.find(char::is_whitespace).unwrap_or(line.len());
    let keyword = &line[..end];
    let mut chars = keyword.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase()
        || !chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return None;
    }
    Some((keyword, line[end..].trim()))
}

fn first_token(text: &str) -> Option<String> {
    text.split_whitespace().next().map(str::to_string)
}

/// Checks if a character may appear in a GenBank sequence block.
fn is_residue_char(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '-' | '.' | '*' | '?' | '~')
}

/// Parses GenBank content from a string.
///
/// Whitespace-only content gives an empty batch.
pub fn parse_genbank_str(content: &str) -> GenBankResult<Batch> {
    let mut records = Vec::new();
    let mut current: Option<PendingRecord> = None;

    for (idx, line) in content.lines().enumerate() {
        let line_number = idx + 1;
        let line = line.trim_end();

        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("//") {
            match current.take() {
                Some(pending) => records.push(pending.finish()?),
                None => {
                    return Err(GenBankError::MalformedHeader {
                        line: line_number,
                        text: line.to_string(),
                    })
                }
            }
            continue;
        }

        match current.as_mut() {
            Some(pending) => pending.feed(line, line_number)?,
            None => match split_keyword(line) {
                Some(("LOCUS", rest)) => {
                    current = Some(PendingRecord::from_locus_line(rest, line_number)?);
                }
                _ if records.is_empty() => {
                    return Err(GenBankError::FormatMismatch {
                        line: line_number,
                        detected: detect_format_from_content(content),
                    });
                }
                _ => {
                    return Err(GenBankError::MalformedHeader {
                        line: line_number,
                        text: line.to_string(),
                    });
                }
            },
        }
    }

    if let Some(pending) = current {
        return Err(pending.unterminated());
    }

    Ok(Batch::new(records))
}
