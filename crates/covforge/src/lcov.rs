//! Structural checks on exported lcov text
//!
//! The exporter's output is only checked for shape before it is written:
//! records must open with `SF:` and close with `end_of_record`. Hit counts are
//! not read.

use crate::result::{CovError, CovResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Shape of an lcov report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcovSummary {
    /// Source files, one per `SF:` record, in report order
    pub source_files: Vec<PathBuf>,
    /// Number of `FN:` entries
    pub functions: usize,
    /// `FN:` names that still look compiler-mangled
    pub mangled_functions: usize,
}

impl LcovSummary {
    /// Validate `text` as lcov and summarise it
    pub fn parse(text: &str) -> CovResult<Self> {
        let mut summary = Self::default();
        let mut open: Option<usize> = None;

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            let lineno = idx + 1;
            if line.is_empty() || line.starts_with("TN:") {
                continue;
            }

            if let Some(path) = line.strip_prefix("SF:") {
                if let Some(start) = open {
                    return Err(invalid(format!(
                        "line {lineno}: SF record opened before record from line {start} ended"
                    )));
                }
                open = Some(lineno);
                summary.source_files.push(PathBuf::from(path));
            } else if line == "end_of_record" {
                if open.take().is_none() {
                    return Err(invalid(format!("line {lineno}: end_of_record outside a record")));
                }
            } else if open.is_none() {
                return Err(invalid(format!("line {lineno}: `{line}` outside a record")));
            } else if let Some(entry) = line.strip_prefix("FN:") {
                summary.functions += 1;
                let name = entry.split_once(',').map_or(entry, |(_, name)| name);
                if looks_mangled(name) {
                    summary.mangled_functions += 1;
                }
            }
        }

        if let Some(start) = open {
            return Err(invalid(format!("record from line {start} has no end_of_record")));
        }
        if summary.source_files.is_empty() {
            return Err(CovError::EmptyReport);
        }
        Ok(summary)
    }

    /// Number of `SF:` records
    #[must_use]
    pub fn records(&self) -> usize {
        self.source_files.len()
    }
}

fn invalid(message: String) -> CovError {
    CovError::InvalidReport { message }
}

/// Itanium (`_ZN...`) or v0 (`_R...`) Rust symbol
#[must_use]
pub fn looks_mangled(name: &str) -> bool {
    let name = name.trim();
    ["_ZN", "__ZN", "_R", "__R"].iter().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    })
}
