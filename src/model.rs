//! Data model for sequence conversion.
//!
//! This module contains the in-memory representation shared by all readers
//! and writers:
//! - `Record`: one sequence with its identifier and provenance
//! - `Batch`: the ordered records produced by a single parse call
//! - `Matrix`: rows read back from a written NEXUS or PHYLIP file
//!
//! Records are created by a reader, stamped once with a molecule type by the
//! annotator, and only read by the writers.

use std::fmt;

/// Molecule type declared by the caller.
///
/// Never inferred from residue content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoleculeType {
    Dna,
    Protein,
    Rna,
}

impl MoleculeType {
    /// Token used in a NEXUS `FORMAT DATATYPE=` declaration.
    pub fn nexus_datatype(self) -> &'static str {
        match self {
            MoleculeType::Dna => "DNA",
            MoleculeType::Rna => "RNA",
            MoleculeType::Protein => "PROTEIN",
        }
    }

    /// Parses a NEXUS `DATATYPE` value (case insensitive).
    ///
    /// `NUCLEOTIDE` is read as DNA. Other NEXUS datatypes (`STANDARD`,
    /// `CONTINUOUS`, ...) have no molecule type and return `None`.
    pub fn from_nexus_datatype(token: &str) -> Option<Self> {
        match token.to_uppercase().as_str() {
            "DNA" | "NUCLEOTIDE" => Some(MoleculeType::Dna),
            "RNA" => Some(MoleculeType::Rna),
            "PROTEIN" => Some(MoleculeType::Protein),
            _ => None,
        }
    }
}

impl fmt::Display for MoleculeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoleculeType::Dna => write!(f, "DNA"),
            MoleculeType::Protein => write!(f, "Protein"),
            MoleculeType::Rna => write!(f, "RNA"),
        }
    }
}

/// Input formats a batch can be parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Fasta,
    GenBank,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Fasta => write!(f, "FASTA"),
            SourceFormat::GenBank => write!(f, "GenBank"),
        }
    }
}

/// A single sequence record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Row/taxon label used by both NEXUS and PHYLIP
    pub id: String,
    /// Residues with all whitespace and position numbers removed
    pub residues: String,
    /// Free text that came with the record (FASTA header remainder, GenBank DEFINITION)
    pub description: Option<String>,
    molecule_type: Option<MoleculeType>,
    source_format: SourceFormat,
}

impl Record {
    /// Creates a new, not yet annotated, record.
    pub fn new(
        id: impl Into<String>,
        residues: impl Into<String>,
        source_format: SourceFormat,
    ) -> Self {
        Self {
            id: id.into(),
            residues: residues.into(),
            description: None,
            molecule_type: None,
            source_format,
        }
    }

    /// Attaches a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the number of residues (characters, not bytes).
    pub fn len(&self) -> usize {
        self.residues.chars().count()
    }

    /// Returns true if the record has no residues.
    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// The declared molecule type, once annotated.
    pub fn molecule_type(&self) -> Option<MoleculeType> {
        self.molecule_type
    }

    /// Format the record was parsed from.
    pub fn source_format(&self) -> SourceFormat {
        self.source_format
    }

    pub(crate) fn set_molecule_type(&mut self, molecule_type: MoleculeType) {
        self.molecule_type = Some(molecule_type);
    }
}

/// Ordered records from one parse call.
///
/// Order is preserved into every writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    records: Vec<Record>,
}

impl Batch {
    /// Creates a batch from records in input order.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Gets a record by index.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Iterates over records in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    /// Returns the maximum identifier length, in characters.
    pub fn max_id_length(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.id.chars().count())
            .max()
            .unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One row of a character matrix read back from NEXUS or PHYLIP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub id: String,
    pub residues: String,
}

impl MatrixRow {
    pub fn new(id: impl Into<String>, residues: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            residues: residues.into(),
        }
    }
}

/// A character matrix read from a NEXUS or PHYLIP file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    /// Declared `DATATYPE` (NEXUS only)
    pub datatype: Option<MoleculeType>,
    pub rows: Vec<MatrixRow>,
}

impl Matrix {
    /// Returns the number of rows (taxa).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Gets a row by index.
    pub fn get(&self, index: usize) -> Option<&MatrixRow> {
        self.rows.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new_is_unannotated() {
        let record = Record::new("seq1", "ACGT", SourceFormat::Fasta);
        assert_eq!(record.len(), 4);
        assert!(!record.is_empty());
        assert_eq!(record.molecule_type(), None);
        assert_eq!(record.source_format(), SourceFormat::Fasta);
        assert_eq!(record.description, None);
    }

    #[test]
    fn test_record_len_counts_chars() {
        let record = Record::new("seq1", "AÇGT", SourceFormat::Fasta);
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_batch_preserves_order() {
        let batch = Batch::new(vec![
            Record::new("b", "AC", SourceFormat::Fasta),
            Record::new("a", "GT", SourceFormat::Fasta),
        ]);
        let ids: Vec<&str> = batch.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(batch.max_id_length(), 1);
    }

    #[test]
    fn test_nexus_datatype_tokens() {
        assert_eq!(MoleculeType::Dna.nexus_datatype(), "DNA");
        assert_eq!(MoleculeType::Rna.nexus_datatype(), "RNA");
        assert_eq!(MoleculeType::Protein.nexus_datatype(), "PROTEIN");
        assert_eq!(MoleculeType::from_nexus_datatype("protein"), Some(MoleculeType::Protein));
        assert_eq!(MoleculeType::from_nexus_datatype("Nucleotide"), Some(MoleculeType::Dna));
        assert_eq!(MoleculeType::from_nexus_datatype("STANDARD"), None);
    }
}
