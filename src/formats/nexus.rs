//! NEXUS writer and matrix reader.
//!
//! ## NEXUS Format
//!
//! The writer emits a TAXA block followed by a CHARACTERS block:
//! ```text
//! #NEXUS
//!
//! BEGIN TAXA;
//!   DIMENSIONS NTAX=2;
//!   TAXLABELS
//!     seq1
//!     seq2
//!   ;
//! END;
//!
//! BEGIN CHARACTERS;
//!   DIMENSIONS NCHAR=4;
//!   FORMAT DATATYPE=DNA MISSING=? GAP=-;
//!   MATRIX
//! seq1 ACGT
//! seq2 ACGG
//!   ;
//! END;
//! ```
//!
//! Labels containing NEXUS punctuation are single-quoted, with embedded
//! quotes doubled. Labels with whitespace are rejected, as are residues
//! containing `;`, brackets or quotes.
//!
//! The reader accepts DATA and CHARACTERS blocks with:
//! - DIMENSIONS command (NTAX, NCHAR)
//! - FORMAT command (DATATYPE, INTERLEAVE, MATCHCHAR)
//! - MATRIX command (sequential and interleaved)
//!
//! Commands are case insensitive, whitespace is flexible and taxon names may
//! be quoted.

use std::borrow::Cow;
use std::collections::HashMap;

use thiserror::Error;

use super::{check_matrix, TargetFormat, WriteError, WriteResult};
use crate::model::{Batch, Matrix, MatrixRow, MoleculeType};

/// Characters that force a label to be quoted.
const PUNCTUATION: &str = "()[]{}/\\,;:=*'\"`+-<>";

/// Characters that end a command, open a comment or start a token inside MATRIX.
const MATRIX_SPECIAL: &str = ";[]'\"";

/// Serializes an annotated batch as NEXUS text.
pub fn write_nexus_string(batch: &Batch) -> WriteResult<String> {
    let nchar = check_matrix(batch, TargetFormat::Nexus)?;

    let mut datatype = None;
    for record in batch {
        let molecule_type = record
            .molecule_type()
            .ok_or_else(|| WriteError::MissingMoleculeType { id: record.id.clone() })?;
        datatype.get_or_insert(molecule_type);
    }
    let datatype = datatype.unwrap_or(MoleculeType::Dna);

    for record in batch {
        if let Some(character) = record.residues.chars().find(|&c| MATRIX_SPECIAL.contains(c)) {
            return Err(WriteError::InvalidResidue {
                format: TargetFormat::Nexus,
                id: record.id.clone(),
                character,
            });
        }
    }

    let labels: Vec<Cow<'_, str>> = batch.iter().map(|r| quote_label(&r.id)).collect();

    let mut out = String::with_capacity(batch.len() * (nchar + 16) + 256);
    out.push_str("#NEXUS\n\n");
    out.push_str("BEGIN TAXA;\n");
    out.push_str(&format!("  DIMENSIONS NTAX={};\n", batch.len()));
    out.push_str("  TAXLABELS\n");
    for label in &labels {
        out.push_str(&format!("    {}\n", label));
    }
    out.push_str("  ;\nEND;\n\n");
    out.push_str("BEGIN CHARACTERS;\n");
    out.push_str(&format!("  DIMENSIONS NCHAR={};\n", nchar));
    out.push_str(&format!(
        "  FORMAT DATATYPE={} MISSING=? GAP=-;\n",
        datatype.nexus_datatype()
    ));
    out.push_str("  MATRIX\n");
    for (label, record) in labels.iter().zip(batch) {
        out.push_str(&format!("{} {}\n", label, record.residues));
    }
    out.push_str("  ;\nEND;\n");

    Ok(out)
}

/// Quotes a taxon label if it contains NEXUS punctuation.
fn quote_label(id: &str) -> Cow<'_, str> {
    if id.chars().any(|c| PUNCTUATION.contains(c)) {
        Cow::Owned(format!("'{}'", id.replace('\'', "''")))
    } else {
        Cow::Borrowed(id)
    }
}

/// Errors that can occur during NEXUS parsing.
#[derive(Error, Debug)]
pub enum NexusError {
    #[error("Not a NEXUS file (must start with #NEXUS)")]
    NotNexus,

    #[error("Empty NEXUS file")]
    EmptyFile,

    #[error("No DATA or CHARACTERS block found")]
    NoDataBlock,
}

/// Result type for NEXUS operations.
pub type NexusResult<T> = Result<T, NexusError>;

/// Parses NEXUS content from a string.
pub fn parse_nexus_str(content: &str) -> NexusResult<Matrix> {
    let lines: Vec<&str> = content.lines().collect();

    // Verify #NEXUS header
    let first_non_empty = lines
        .iter()
        .find(|line| !line.trim().is_empty())
        .ok_or(NexusError::EmptyFile)?;

    if !first_non_empty.trim().to_uppercase().starts_with("#NEXUS") {
        return Err(NexusError::NotNexus);
    }

    let block_content = find_data_block(&lines)?;
    parse_data_block(&block_content)
}

/// Finds and extracts the content of a DATA or CHARACTERS block.
fn find_data_block(lines: &[&str]) -> NexusResult<String> {
    let mut in_block = false;
    let mut block_lines: Vec<&str> = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        let upper = trimmed.to_uppercase();

        if !in_block {
            // Look for BEGIN DATA; or BEGIN CHARACTERS;
            if upper.starts_with("BEGIN")
                && (upper.contains("DATA") || upper.contains("CHARACTERS"))
            {
                in_block = true;
            }
        } else {
            if upper.starts_with("END") || upper.starts_with("ENDBLOCK") {
                break;
            }
            block_lines.push(trimmed);
        }
    }

    if !in_block {
        return Err(NexusError::NoDataBlock);
    }

    Ok(block_lines.join("\n"))
}

/// Parses the content of a DATA or CHARACTERS block.
fn parse_data_block(content: &str) -> NexusResult<Matrix> {
    // NEXUS commands end with ';', so multi-line commands are joined first
    let normalized = normalize_nexus_commands(content);

    let mut ntax: Option<usize> = None;
    let mut nchar: Option<usize> = None;
    let mut interleave = false;
    let mut matchchar: Option<char> = None;
    let mut datatype: Option<MoleculeType> = None;
    let mut matrix_content = String::new();
    let mut in_matrix = false;

    for line in normalized.lines() {
        let trimmed = line.trim();
        let upper = trimmed.to_uppercase();

        if trimmed.is_empty() {
            continue;
        }

        // Comments outside of the matrix
        if !in_matrix && trimmed.starts_with('[') {
            continue;
        }

        if in_matrix {
            matrix_content.push_str(trimmed.trim_end_matches(';'));
            matrix_content.push(' ');
        } else if upper.starts_with("DIMENSIONS") {
            if let Some(n) = extract_param(&upper, "NTAX") {
                ntax = n.parse().ok();
            }
            if let Some(n) = extract_param(&upper, "NCHAR") {
                nchar = n.parse().ok();
            }
        } else if upper.starts_with("FORMAT") {
            interleave = upper.contains("INTERLEAVE");
            if let Some(mc) = extract_param(trimmed, "MATCHCHAR") {
                matchchar = mc.chars().next();
            }
            if let Some(dt) = extract_param(&upper, "DATATYPE") {
                datatype = MoleculeType::from_nexus_datatype(dt);
            }
        } else if upper.starts_with("MATRIX") {
            in_matrix = true;
            let after = trimmed[6..].trim();
            if !after.is_empty() && after != ";" {
                matrix_content.push_str(after.trim_end_matches(';'));
                matrix_content.push(' ');
            }
        }
    }

    let rows = parse_matrix(
        &matrix_content,
        ntax.unwrap_or(0),
        nchar.unwrap_or(0),
        interleave,
        matchchar,
    );

    if rows.is_empty() {
        return Err(NexusError::NoDataBlock);
    }

    Ok(Matrix { datatype, rows })
}

/// Joins multi-line commands into single lines.
///
/// The MATRIX command keeps its line structure, including comments; its
/// terminating ';' is dropped.
fn normalize_nexus_commands(content: &str) -> String {
    let mut result = String::new();
    let mut current_command = String::new();
    let mut in_matrix = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() {
            if in_matrix {
                result.push('\n');
            }
            continue;
        }

        if in_matrix {
            let line_no_comments = remove_nexus_comments(trimmed);
            if line_no_comments.trim().ends_with(';') {
                let clean = line_no_comments.trim().trim_end_matches(';');
                if !clean.is_empty() {
                    result.push_str(clean);
                    result.push('\n');
                }
                in_matrix = false;
            } else {
                result.push_str(trimmed);
                result.push('\n');
            }
            continue;
        }

        let line_no_comments = remove_nexus_comments(trimmed);
        let line_no_comments = line_no_comments.trim();

        if line_no_comments.is_empty() {
            continue;
        }

        if line_no_comments.to_uppercase().starts_with("MATRIX") {
            // Flush any pending command
            if !current_command.is_empty() {
                result.push_str(&current_command);
                result.push('\n');
                current_command.clear();
            }
            in_matrix = !line_no_comments.ends_with(';');
            result.push_str(line_no_comments);
            result.push('\n');
        } else {
            if !current_command.is_empty() {
                current_command.push(' ');
            }
            current_command.push_str(line_no_comments);

            if line_no_comments.ends_with(';') {
                result.push_str(&current_command);
                result.push('\n');
                current_command.clear();
            }
        }
    }

    if !current_command.is_empty() {
        result.push_str(&current_command);
        result.push('\n');
    }

    result
}

/// Removes NEXUS comments (bracketed text) from a line.
fn remove_nexus_comments(line: &str) -> String {
    let mut result = String::new();
    let mut in_comment = false;

    for c in line.chars() {
        if c == '[' {
            in_comment = true;
        } else if c == ']' {
            in_comment = false;
        } else if !in_comment {
            result.push(c);
        }
    }

    result
}

/// Extracts a parameter value from a NEXUS command line.
///
/// `param` is matched case-insensitively; the value keeps its original case.
fn extract_param<'a>(line: &'a str, param: &str) -> Option<&'a str> {
    let idx = line.to_ascii_uppercase().find(param)?;
    let after = &line[idx + param.len()..];

    let eq_idx = after.find('=')?;
    let after_eq = after[eq_idx + 1..].trim_start();

    // Value ends at whitespace, ';', or end
    let end = after_eq
        .find(|c: char| c.is_whitespace() || c == ';')
        .unwrap_or(after_eq.len());

    let value = after_eq[..end].trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parses the MATRIX data into rows.
///
/// Tokens are separated by whitespace and comments. NTAX and NCHAR bound the
/// number of rows and the row length when they are known.
fn parse_matrix(
    content: &str,
    ntax: usize,
    nchar: usize,
    interleave: bool,
    matchchar: Option<char>,
) -> Vec<MatrixRow> {
    let tokens = tokenize_matrix(content);

    if tokens.is_empty() {
        return Vec::new();
    }

    let mut raw_rows = if interleave && ntax > 0 {
        parse_interleaved_tokens(&tokens, ntax, nchar)
    } else {
        parse_sequential_tokens(&tokens, ntax, nchar)
    };

    if let Some(mc) = matchchar {
        apply_matchchar(&mut raw_rows, mc);
    }

    raw_rows
        .into_iter()
        .map(|(name, data)| MatrixRow::new(name, data))
        .collect()
}

/// Replaces MATCHCHAR with the character of the first row at that position.
fn apply_matchchar(rows: &mut [(String, String)], matchchar: char) {
    if rows.len() < 2 {
        return;
    }

    let reference: Vec<char> = rows[0].1.chars().collect();

    for (_, data) in rows.iter_mut().skip(1) {
        *data = data
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if c == matchchar {
                    reference.get(i).copied().unwrap_or(c)
                } else {
                    c
                }
            })
            .collect();
    }
}

/// Tokenizes the matrix content: split by whitespace, remove comments.
///
/// Quoted tokens keep their quotes so that names can be told apart later.
fn tokenize_matrix(content: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current_token = String::new();
    let mut in_comment = false;
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    for c in content.chars() {
        if in_comment {
            if c == ']' {
                in_comment = false;
            }
            continue;
        }

        let quoted = in_single_quote || in_double_quote;

        if c == '[' && !quoted {
            if !current_token.is_empty() {
                tokens.push(std::mem::take(&mut current_token));
            }
            in_comment = true;
            continue;
        }

        if c == '\'' && !in_double_quote {
            in_single_quote = !in_single_quote;
            current_token.push(c);
            continue;
        }

        if c == '"' && !in_single_quote {
            in_double_quote = !in_double_quote;
            current_token.push(c);
            continue;
        }

        if c.is_whitespace() && !quoted {
            if !current_token.is_empty() {
                tokens.push(std::mem::take(&mut current_token));
            }
        } else if c != ';' || quoted {
            current_token.push(c);
        }
    }

    if !current_token.is_empty() {
        tokens.push(current_token);
    }

    tokens
}

/// Parses sequential tokens: `name1 data1 [data1...] name2 data2 ...`
fn parse_sequential_tokens(tokens: &[String], ntax: usize, nchar: usize) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = Vec::new();
    let mut i = 0;

    while i < tokens.len() && (ntax == 0 || rows.len() < ntax) {
        let name = unquote(&tokens[i]);
        i += 1;

        let mut data = String::new();
        let mut data_len = 0;

        while i < tokens.len() {
            if nchar > 0 && data_len >= nchar {
                break;
            }

            let token = &tokens[i];

            // Without NCHAR, fall back on what the next name looks like
            if nchar == 0 && data_len > 0 && looks_like_name(token) {
                break;
            }

            data.push_str(token);
            data_len += token.chars().count();
            i += 1;
        }

        rows.push((name, data));
    }

    rows
}

/// Parses interleaved tokens, where names repeat in each block:
/// `name1 part1 name2 part1 ... name1 part2 name2 part2 ...`
fn parse_interleaved_tokens(tokens: &[String], ntax: usize, nchar: usize) -> Vec<(String, String)> {
    let mut rows: Vec<(String, String)> = Vec::with_capacity(ntax);
    let mut name_to_idx: HashMap<String, usize> = HashMap::new();
    let mut i = 0;

    while i < tokens.len() {
        if nchar > 0
            && rows.len() == ntax
            && rows.iter().all(|(_, data)| data.chars().count() >= nchar)
        {
            break;
        }

        let token = unquote(&tokens[i]);
        i += 1;

        if let Some(&idx) = name_to_idx.get(&token) {
            if i < tokens.len() {
                rows[idx].1.push_str(&tokens[i]);
                i += 1;
            }
        } else if rows.len() < ntax {
            name_to_idx.insert(token.clone(), rows.len());
            let data = if i < tokens.len() {
                i += 1;
                tokens[i - 1].clone()
            } else {
                String::new()
            };
            rows.push((token, data));
        } else {
            // Not a known name: continuation data for the last row
            let idx = (rows.len() - 1) % ntax;
            rows[idx].1.push_str(&token);
        }
    }

    rows
}

/// Removes quotes from a name if present, undoubling embedded quotes.
fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        s[1..s.len() - 1].replace("''", "'")
    } else if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Heuristic to detect if a token looks like a name rather than data.
/// Only used when NCHAR is not available.
fn looks_like_name(token: &str) -> bool {
    if token.starts_with('\'') || token.starts_with('"') {
        return true;
    }

    // Letters mixed with digits ("seq1", "AelongD09")
    let has_letters = token.chars().any(|c| c.is_ascii_alphabetic());
    let has_digits = token.chars().any(|c| c.is_ascii_digit());
    if has_letters && has_digits {
        return true;
    }

    token.contains('_')
}
