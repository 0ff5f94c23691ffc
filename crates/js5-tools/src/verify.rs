//! Cache verification
//!
//! Every file listed in a reference table is read back from the store and
//! compared with its entry. A file can be reported both corrupt and out of
//! date.

use crate::{load_table, table_types};
use js5_crypto::crc32_excluding_trailer;
use js5_store::{Channel, FileStore, Result};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// What is wrong with a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FindingKind {
    /// The store could not return the file
    Unreadable {
        /// Error reported by the store
        reason: String,
    },
    /// The file holds no container
    Missing,
    /// The CRC-32 differs from the table
    Corrupt {
        /// CRC recorded in the table
        expected: u32,
        /// CRC of the stored bytes
        actual: u32,
    },
    /// The version trailer differs from the table
    OutOfDate {
        /// Version recorded in the table
        expected: u32,
        /// Version in the stored trailer
        actual: u32,
    },
}

/// A problem found with one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Type of the file
    pub type_id: u8,
    /// File id
    pub file: u32,
    /// The problem
    #[serde(flatten)]
    pub kind: FindingKind,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ", self.type_id, self.file)?;
        match &self.kind {
            FindingKind::Unreadable { reason } => write!(f, "error ({reason})"),
            FindingKind::Missing => write!(f, "missing"),
            FindingKind::Corrupt { expected, actual } => {
                write!(f, "corrupt (crc {actual:08x}, expected {expected:08x})")
            }
            FindingKind::OutOfDate { expected, actual } => {
                write!(f, "out of date (version {actual}, expected {expected})")
            }
        }
    }
}

/// Outcome of a verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Reference tables examined
    pub tables: usize,
    /// Files examined
    pub files: usize,
    /// Problems found
    pub findings: Vec<Finding>,
}

impl VerifyReport {
    /// Whether no problems were found
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Check the stored bytes of one file against its table entry
pub(crate) fn check_file(stored: &[u8], crc: u32, version: u32) -> Vec<FindingKind> {
    if stored.len() <= 2 {
        return vec![FindingKind::Missing];
    }

    let mut problems = Vec::new();
    let actual = crc32_excluding_trailer(stored);
    if actual != crc {
        problems.push(FindingKind::Corrupt {
            expected: crc,
            actual,
        });
    }

    let trailer = u32::from(u16::from_be_bytes([
        stored[stored.len() - 2],
        stored[stored.len() - 1],
    ]));
    if trailer != version {
        problems.push(FindingKind::OutOfDate {
            expected: version,
            actual: trailer,
        });
    }
    problems
}

/// Verify every file listed in the store's reference tables
pub fn verify<C: Channel>(store: &FileStore<C>) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();

    for type_id in table_types(store)? {
        let Some((_, table)) = load_table(store, type_id)? else {
            continue;
        };
        report.tables += 1;

        for (file, entry) in table.entries().iter() {
            report.files += 1;
            let kinds = match store.read(type_id, file) {
                Ok(stored) => check_file(&stored, entry.crc, entry.version),
                Err(e) => vec![FindingKind::Unreadable {
                    reason: e.to_string(),
                }],
            };

            for kind in kinds {
                let finding = Finding {
                    type_id,
                    file,
                    kind,
                };
                warn!("{}", finding);
                report.findings.push(finding);
            }
        }
    }

    info!(
        "Verified {} files in {} tables, {} problems",
        report.files,
        report.tables,
        report.findings.len()
    );
    Ok(report)
}
