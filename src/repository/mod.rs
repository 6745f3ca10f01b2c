// src/repository/mod.rs

//! Repository database parsing
//!
//! This module turns a `<repo>.db.tar.gz` archive into typed package records:
//! - `archive`: streams package payloads out of the compressed tarball
//! - `record`: splits a payload into `%FIELD%` blocks
//! - `package`: builds a typed record from those blocks
//! - `dependency`: parses dependency strings for the catalog

pub mod archive;
pub mod dependency;
pub mod fields;
pub mod package;
pub mod record;

#[cfg(test)]
pub(crate) mod testutil;

pub use archive::{ArchiveReader, RawPayload};
pub use dependency::{DependencyPolicy, DependencySpec, resolve_dependencies};
pub use fields::{FIELD_SCHEMA, Field, FieldKind};
pub use package::{PackageRecord, PackageRecordBuilder, VersionSplit};
pub use record::{RecordFields, parse_record};

use crate::error::{Error, Result};
use std::path::Path;
use tracing::{debug, info};

/// File name suffixes of repository databases, stripped to get the repository name
pub const REPO_DB_SUFFIXES: [&str; 3] = [".db.tar.gz", ".db.tar.xz", ".db.tar.zst"];

/// Derive the repository name from an archive path, e.g. `/tmp/core.db.tar.gz` -> `core`
pub fn repository_name(path: &Path) -> Result<String> {
    let invalid = || Error::InvalidArchiveName(path.display().to_string());

    let filename = path.file_name().and_then(|name| name.to_str()).ok_or_else(invalid)?;

    let name = REPO_DB_SUFFIXES
        .iter()
        .find_map(|suffix| filename.rfind(suffix).map(|index| &filename[..index]))
        .ok_or_else(invalid)?;

    if name.is_empty() {
        return Err(invalid());
    }
    Ok(name.to_string())
}

/// Parse every package in a repository database archive
///
/// A missing archive is an error: an empty result would make the
/// reconciliation remove every package in the partition.
pub fn parse_repo(path: &Path, version_split: VersionSplit) -> Result<Vec<PackageRecord>> {
    info!("Starting repo parsing");

    let repo = repository_name(path)?;
    let mut reader = ArchiveReader::open(path)?;
    let builder = PackageRecordBuilder::new(repo).version_split(version_split);

    let mut packages = Vec::new();
    for payload in reader.payloads()? {
        let payload = payload?;
        let fields = parse_record(&payload.text);
        let record = builder.build(fields).map_err(|e| match e {
            Error::MalformedRecord(msg) => {
                Error::MalformedRecord(format!("{} (in {})", msg, payload.directory))
            }
            other => other,
        })?;
        debug!("Done parsing package {}", record.name);
        packages.push(record);
    }

    info!("Finished repo parsing: {} packages", packages.len());
    Ok(packages)
}
