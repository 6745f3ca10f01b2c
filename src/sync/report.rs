// src/sync/report.rs

use serde::Serialize;
use std::fmt;

/// Outcome of reconciling one partition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub architecture: String,
    pub repository: String,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
    /// Packages present on both sides with an unchanged version
    pub unchanged: Vec<String>,
}

impl SyncReport {
    pub fn new(architecture: &str, repository: &str) -> Self {
        Self {
            architecture: architecture.to_string(),
            repository: repository.to_string(),
            ..Default::default()
        }
    }

    /// Number of package-level catalog writes the run performed
    pub fn mutations(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }

    pub fn is_noop(&self) -> bool {
        self.mutations() == 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: {} added, {} updated, {} removed, {} unchanged",
            self.repository,
            self.architecture,
            self.added.len(),
            self.updated.len(),
            self.removed.len(),
            self.unchanged.len()
        )
    }
}
