//! # bioconvert - Sequence Format Converter
//!
//! Converts FASTA and GenBank sequence records to the matrix formats used by
//! phylogenetics tools: NEXUS and relaxed PHYLIP.
//!
//! ## Architecture
//!
//! - `model`: records, batches and the molecule-type tag
//! - `formats`: FASTA/GenBank readers, NEXUS/PHYLIP writers and readers
//! - `annotate`: stamps a batch with the caller's molecule type
//! - `convert`: one-call entry point from raw bytes to both outputs
//!
//! Every call works on its own batch held fully in memory; nothing is shared
//! between calls and the library never logs.

pub mod annotate;
pub mod convert;
pub mod formats;
pub mod model;

pub use convert::{convert, Conversion, ConversionError, ConversionErrorKind};
pub use formats::{ParseError, TargetFormat, WriteError, WriteErrorKind};
pub use model::{Batch, MoleculeType, Record, SourceFormat};
