use bioconvert::formats::nexus::parse_nexus_str;
use bioconvert::formats::phylip::parse_phylip_str;
use bioconvert::formats::{self, parse, TargetFormat, WriteErrorKind};
use bioconvert::model::{Batch, MatrixRow, MoleculeType, Record, SourceFormat};
use bioconvert::{convert, ConversionError, ConversionErrorKind};

const ALIGNED_FASTA: &str = "\
>Homo_sapiens mitochondrion
ACGTACGTAC
GGTTA-
>Pan_troglodytes_verus
ACGTACGAAC
GGTTAA
>Gorilla
ACGAACGTAC
GG-TAA
";

fn rows_of(batch: &Batch) -> Vec<MatrixRow> {
    batch
        .iter()
        .map(|r| MatrixRow::new(r.id.clone(), r.residues.clone()))
        .collect()
}

#[test]
fn test_fasta_round_trips_through_nexus() {
    let batch = parse(ALIGNED_FASTA, SourceFormat::Fasta).unwrap();
    let conversion = convert(ALIGNED_FASTA.as_bytes(), SourceFormat::Fasta, MoleculeType::Dna).unwrap();

    let nexus = String::from_utf8(conversion.nexus.unwrap()).unwrap();
    let matrix = parse_nexus_str(&nexus).unwrap();

    assert_eq!(matrix.datatype, Some(MoleculeType::Dna));
    assert_eq!(matrix.rows, rows_of(&batch));
}

#[test]
fn test_fasta_round_trips_through_phylip() {
    let batch = parse(ALIGNED_FASTA, SourceFormat::Fasta).unwrap();
    let conversion = convert(ALIGNED_FASTA.as_bytes(), SourceFormat::Fasta, MoleculeType::Dna).unwrap();

    let phylip = String::from_utf8(conversion.phylip.unwrap()).unwrap();
    assert!(phylip.starts_with("3 16\n"));

    let matrix = parse_phylip_str(&phylip).unwrap();
    assert_eq!(matrix.rows, rows_of(&batch));
}

#[test]
fn test_phylip_never_truncates_long_names() {
    let conversion = convert(ALIGNED_FASTA.as_bytes(), SourceFormat::Fasta, MoleculeType::Dna).unwrap();
    let phylip = String::from_utf8(conversion.phylip.unwrap()).unwrap();

    assert!(phylip.lines().any(|l| l.starts_with("Pan_troglodytes_verus ")));
    assert!(phylip.lines().any(|l| l.starts_with("Homo_sapiens ")));
}

#[test]
fn test_genbank_to_both_outputs() {
    let content = "\
LOCUS       SEQ1        12 bp    DNA     linear   PLN 01-JAN-2000
DEFINITION  First test sequence.
ACCESSION   AB000001
VERSION     AB000001.1
FEATURES             Location/Qualifiers
     source          1..12
ORIGIN
        1 acgtacgtac gt
//
LOCUS       SEQ2        12 bp    DNA     linear   PLN 01-JAN-2000
DEFINITION  Second test sequence.
ACCESSION   AB000002
VERSION     AB000002.3
ORIGIN
        1 acgtacgaac gt
//
";
    let conversion = convert(content.as_bytes(), SourceFormat::GenBank, MoleculeType::Dna).unwrap();
    assert_eq!(conversion.record_count, 2);

    let phylip = String::from_utf8(conversion.phylip.unwrap()).unwrap();
    assert_eq!(
        phylip,
        "2 12\nAB000001.1   ACGTACGTACGT\nAB000002.3   ACGTACGAACGT\n"
    );

    let nexus = String::from_utf8(conversion.nexus.unwrap()).unwrap();
    let matrix = parse_nexus_str(&nexus).unwrap();
    assert_eq!(matrix.get(1).unwrap().id, "AB000002.3");
}

#[test]
fn test_unequal_lengths_rejected_by_both_writers() {
    let batch = parse(">a\nACGT\n>b\nACGTA\n", SourceFormat::Fasta).unwrap();

    // Rejected even before annotation
    for format in [TargetFormat::Nexus, TargetFormat::Phylip] {
        let err = formats::write(&batch, format).unwrap_err();
        assert_eq!(err.kind(), WriteErrorKind::UnequalLength);
        assert_eq!(err.format(), format);
    }
}

#[test]
fn test_empty_sequence_rejected() {
    let conversion =
        convert(b">a\n>b\n", SourceFormat::Fasta, MoleculeType::Protein).unwrap();
    assert_eq!(
        conversion.nexus.unwrap_err().kind(),
        WriteErrorKind::EmptySequence
    );
    assert_eq!(
        conversion.phylip.unwrap_err().kind(),
        WriteErrorKind::EmptySequence
    );
}

#[test]
fn test_nexus_fails_without_annotation_but_phylip_does_not() {
    let batch = Batch::new(vec![Record::new("a", "ACGT", SourceFormat::Fasta)]);
    assert_eq!(
        formats::write(&batch, TargetFormat::Nexus).unwrap_err().kind(),
        WriteErrorKind::MissingMoleculeType
    );
    assert!(formats::write(&batch, TargetFormat::Phylip).is_ok());
}

#[test]
fn test_nexus_rejects_residues_that_break_the_matrix() {
    let conversion = convert(
        b">a\nAC;T\n>b\nAC[T\n>c\nACG]\n",
        SourceFormat::Fasta,
        MoleculeType::Dna,
    )
    .unwrap();

    let err = conversion.nexus.unwrap_err();
    assert_eq!(err.kind(), WriteErrorKind::InvalidResidue);
    assert!(err.to_string().contains("'a'"));

    // PHYLIP has no comment or terminator syntax, so every row survives
    let phylip = String::from_utf8(conversion.phylip.unwrap()).unwrap();
    let matrix = parse_phylip_str(&phylip).unwrap();
    assert_eq!(matrix.row_count(), 3);
    assert_eq!(matrix.get(2).unwrap().residues, "ACG]");
}

#[test]
fn test_wrong_format_tag_is_reported() {
    let err = convert(b">seq1\nACGT\n", SourceFormat::GenBank, MoleculeType::Dna).unwrap_err();
    assert_eq!(err.kind(), ConversionErrorKind::Parse);
    let ConversionError::Parse(parse_err) = err else {
        panic!("expected a parse error");
    };
    assert!(parse_err.is_format_mismatch());
    assert_eq!(parse_err.format(), SourceFormat::GenBank);
    assert!(parse_err.to_string().contains("FASTA"));
}

#[test]
fn test_duplicate_identifiers_rejected() {
    let conversion = convert(b">a\nACGT\n>a\nACGA\n", SourceFormat::Fasta, MoleculeType::Dna).unwrap();
    assert_eq!(
        conversion.phylip.unwrap_err().kind(),
        WriteErrorKind::DuplicateIdentifier
    );
}
