//! bioconvert - FASTA/GenBank to NEXUS and relaxed PHYLIP
//!
//! ## Usage
//!
//! ```bash
//! bioconvert sequences.fasta                      # DNA, FASTA input
//! bioconvert -f genbank -m protein records.gb -o out/
//! cat sequences.fasta | bioconvert -m rna         # read standard input
//! ```
//!
//! Writes `<prefix>.nex` and `<prefix>.phy` (default prefix
//! `converted_sequences`). Each output is written on its own: if one cannot
//! be produced, the other is still written and the exit status is non-zero.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, error, info};

use bioconvert::convert::convert;
use bioconvert::formats::{TargetFormat, DEFAULT_FILE_STEM};
use bioconvert::model::{MoleculeType, SourceFormat};

/// Input format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// FASTA format
    Fasta,
    /// GenBank flat file
    Genbank,
}

impl From<FormatArg> for SourceFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fasta => SourceFormat::Fasta,
            FormatArg::Genbank => SourceFormat::GenBank,
        }
    }
}

/// Molecule type specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum MoleculeArg {
    Dna,
    Protein,
    Rna,
}

impl From<MoleculeArg> for MoleculeType {
    fn from(arg: MoleculeArg) -> Self {
        match arg {
            MoleculeArg::Dna => MoleculeType::Dna,
            MoleculeArg::Protein => MoleculeType::Protein,
            MoleculeArg::Rna => MoleculeType::Rna,
        }
    }
}

/// bioconvert - Convert FASTA or GenBank sequences to NEXUS and relaxed PHYLIP
///
/// Sequences must be aligned (all the same length). Set RUST_LOG=debug for
/// more detail.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input file; "-" or nothing reads standard input
    input: Option<PathBuf>,

    /// Format of the input
    #[arg(short = 'f', long = "from", value_enum, default_value = "fasta")]
    from: FormatArg,

    /// Molecule type written to the NEXUS DATATYPE declaration
    #[arg(short = 'm', long = "molecule", value_enum, default_value = "dna")]
    molecule: MoleculeArg,

    /// Directory the outputs are written to
    #[arg(short = 'o', long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// Output file name without extension
    #[arg(long = "prefix", default_value = DEFAULT_FILE_STEM)]
    prefix: String,
}

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    match input {
        Some(path) if path != Path::new("-") => {
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        _ => {
            let mut raw = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut raw)
                .context("Failed to read standard input")?;
            Ok(raw)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let source_format: SourceFormat = args.from.into();
    let molecule_type: MoleculeType = args.molecule.into();

    let raw = read_input(args.input.as_deref())?;
    debug!(
        "Read {} bytes, converting {} input as {}",
        raw.len(),
        source_format,
        molecule_type
    );

    let conversion = convert(&raw, source_format, molecule_type)?;
    info!("Loaded {} sequences", conversion.record_count);

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("Failed to create {}", args.out_dir.display()))?;

    let mut failed = 0;
    for format in [TargetFormat::Nexus, TargetFormat::Phylip] {
        match conversion.output(format) {
            Ok(buffer) => {
                let path = args.out_dir.join(format.file_name(&args.prefix));
                fs::write(&path, buffer)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {} output to {}", format, path.display());
            }
            Err(e) => {
                error!("{}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of 2 outputs could not be written", failed);
    }

    Ok(())
}
