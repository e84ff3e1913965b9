//! Molecule-type annotation.
//!
//! Neither FASTA nor GenBank reliably carries a molecule type, but NEXUS
//! needs one in its `FORMAT DATATYPE=` declaration. The caller's declaration
//! is authoritative: residues are never inspected.

use crate::model::{Batch, MoleculeType};

/// Stamps every record of `batch` with `molecule_type`.
///
/// Takes the batch by value and hands it back, so an annotated batch has a
/// single owner. Any previous tag is overwritten, which makes the operation
/// idempotent.
pub fn annotate(mut batch: Batch, molecule_type: MoleculeType) -> Batch {
    for record in batch.records_mut() {
        record.set_molecule_type(molecule_type);
    }
    batch
}

/// Returns true if every record carries a molecule type.
pub fn is_annotated(batch: &Batch) -> bool {
    batch.iter().all(|r| r.molecule_type().is_some())
}
