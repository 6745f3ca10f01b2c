// src/driver.rs

//! One end-to-end sync run
//!
//! Validates the requested architecture, parses the archive, splits the
//! records into per-architecture partitions and reconciles each partition
//! under its advisory lock.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::lock::PartitionLock;
use crate::repository::{self, DependencyPolicy, PackageRecord, VersionSplit};
use crate::sync::{self, Deadline, SyncReport};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Settings of one sync run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Reconcile even when the archive holds no packages
    pub allow_empty: bool,
    pub dependency_policy: DependencyPolicy,
    pub version_split: VersionSplit,
    pub timeout: Option<Duration>,
    /// Partition lock files are created next to this path
    pub lock_base: PathBuf,
}

impl SyncOptions {
    /// Default settings, locking partitions next to `lock_base`
    pub fn new(lock_base: impl Into<PathBuf>) -> Self {
        Self {
            allow_empty: false,
            dependency_policy: DependencyPolicy::default(),
            version_split: VersionSplit::default(),
            timeout: None,
            lock_base: lock_base.into(),
        }
    }
}

/// Result of a sync run over all partitions it touched
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncSummary {
    pub repository: String,
    pub reports: Vec<SyncReport>,
    /// Packages whose declared architecture was unrecognized
    pub reassigned: Vec<String>,
}

/// How a run ended when it did not fail outright
#[derive(Debug)]
pub enum Outcome {
    Synced(SyncSummary),
    /// The request itself was invalid; nothing was read or written
    Usage(String),
}

/// Sync the archive at `archive` into the catalog, defaulting to `architecture`
pub fn run<C: Catalog + ?Sized>(
    catalog: &mut C,
    architecture: &str,
    archive: &Path,
    options: &SyncOptions,
) -> Result<Outcome> {
    let known: HashSet<String> = catalog
        .architectures()?
        .into_iter()
        .map(|arch| arch.name)
        .collect();

    if !known.contains(architecture) {
        let mut names: Vec<&str> = known.iter().map(String::as_str).collect();
        names.sort_unstable();
        return Ok(Outcome::Usage(format!(
            "{} is not a known architecture (known: {})",
            architecture,
            names.join(", ")
        )));
    }

    let deadline = options.timeout.map(Deadline::after);
    let repo = repository::repository_name(archive)?;
    let records = repository::parse_repo(archive, options.version_split)?;

    if let Some(deadline) = &deadline {
        deadline.check()?;
    }

    let mut summary = SyncSummary {
        repository: repo.clone(),
        ..Default::default()
    };

    let mut partitions: BTreeMap<String, Vec<PackageRecord>> = BTreeMap::new();
    if records.is_empty() {
        if !options.allow_empty {
            return Err(Error::EmptyBatch(archive.display().to_string()));
        }
        warn!("Archive holds no packages; emptying {}/{}", repo, architecture);
        partitions.insert(architecture.to_string(), Vec::new());
    }

    for mut record in records {
        let declared = record.arch.as_deref().filter(|arch| known.contains(*arch));
        let target = match declared {
            Some(arch) => arch.to_string(),
            None => {
                warn!(
                    "Package {} did not have a valid architecture, defaulting to {}",
                    record.name, architecture
                );
                summary.reassigned.push(record.name.clone());
                record.arch = Some(architecture.to_string());
                architecture.to_string()
            }
        };
        partitions.entry(target).or_default().push(record);
    }

    let _locks = partitions
        .keys()
        .map(|arch| PartitionLock::acquire(&options.lock_base, arch, &repo))
        .collect::<Result<Vec<_>>>()?;

    // Plan every partition before the first write so a rejected dependency
    // in one partition leaves all of them untouched
    let plans = partitions
        .iter()
        .map(|(arch, batch)| sync::plan(&*catalog, arch, &repo, batch, options.dependency_policy))
        .collect::<Result<Vec<_>>>()?;

    for plan in plans {
        let report = plan.apply(catalog, deadline.as_ref())?;
        info!("{}", report);
        summary.reports.push(report);
    }

    Ok(Outcome::Synced(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Partition, SqliteCatalog};
    use crate::db::schema;
    use crate::repository::testutil::{ArchiveEntry, write_archive};
    use rusqlite::Connection;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        dir: TempDir,
        catalog: SqliteCatalog,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempdir().unwrap();
            let conn = Connection::open(dir.path().join("catalog.db")).unwrap();
            conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
            schema::migrate(&conn).unwrap();

            let mut catalog = SqliteCatalog::from_connection(conn);
            catalog.add_architecture("x86_64").unwrap();
            catalog.add_architecture("i686").unwrap();
            catalog.add_architecture("any").unwrap();
            catalog.add_repository("core").unwrap();
            Self { dir, catalog }
        }

        fn options(&self) -> SyncOptions {
            SyncOptions::new(self.dir.path().join("catalog.db"))
        }

        fn archive(&self, packages: &[(&str, &str)]) -> PathBuf {
            let path = self.dir.path().join("core.db.tar.gz");
            let dirs: Vec<String> = packages.iter().map(|(dir, _)| dir.to_string()).collect();
            let descs: Vec<String> = packages.iter().map(|(dir, _)| format!("{}/desc", dir)).collect();
            let mut entries = Vec::new();
            for (i, (_, desc)) in packages.iter().enumerate() {
                entries.push(ArchiveEntry::Dir(&dirs[i]));
                entries.push(ArchiveEntry::File(&descs[i], desc));
            }
            write_archive(&path, &entries);
            path
        }

        fn names(&self, arch: &str) -> Vec<String> {
            let arch = self.catalog.find_architecture(arch).unwrap().unwrap();
            let repo = self.catalog.find_repository("core").unwrap().unwrap();
            self.catalog
                .packages(&Partition::new(&arch, &repo).unwrap())
                .unwrap()
                .into_iter()
                .map(|pkg| pkg.name)
                .collect()
        }
    }

    fn synced(outcome: Outcome) -> SyncSummary {
        match outcome {
            Outcome::Synced(summary) => summary,
            Outcome::Usage(msg) => panic!("unexpected usage error: {}", msg),
        }
    }

    #[test]
    fn test_unknown_architecture_is_usage_error() {
        let mut fx = Fixture::new();
        let path = fx.archive(&[("bash-4.1-1", "%NAME%\nbash\n\n%VERSION%\n4.1-1\n")]);
        let options = fx.options();

        for arch in ["ppc", "X86_64"] {
            match run(&mut fx.catalog, arch, &path, &options).unwrap() {
                Outcome::Usage(msg) => assert!(msg.contains(arch)),
                Outcome::Synced(_) => panic!("{} should be rejected", arch),
            }
        }
        assert!(fx.names("x86_64").is_empty());
    }

    #[test]
    fn test_records_split_by_declared_architecture() {
        let mut fx = Fixture::new();
        let path = fx.archive(&[
            ("bash-4.1-1", "%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%ARCH%\nx86_64\n"),
            ("tzdata-2010b-1", "%NAME%\ntzdata\n\n%VERSION%\n2010b-1\n\n%ARCH%\nany\n"),
            ("glibc-2.11-1", "%NAME%\nglibc\n\n%VERSION%\n2.11-1\n\n%ARCH%\ni686\n"),
        ]);
        let options = fx.options();

        let summary = synced(run(&mut fx.catalog, "x86_64", &path, &options).unwrap());

        assert_eq!(summary.repository, "core");
        let arches: Vec<&str> = summary.reports.iter().map(|r| r.architecture.as_str()).collect();
        assert_eq!(arches, vec!["any", "i686", "x86_64"]);
        assert_eq!(fx.names("any"), vec!["tzdata"]);
        assert_eq!(fx.names("i686"), vec!["glibc"]);
        assert_eq!(fx.names("x86_64"), vec!["bash"]);
        assert!(summary.reassigned.is_empty());
    }

    #[test]
    fn test_unrecognized_architecture_falls_back() {
        let mut fx = Fixture::new();
        let path = fx.archive(&[
            ("bash-4.1-1", "%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%ARCH%\nsparc\n"),
            ("zsh-4.3.10-4", "%NAME%\nzsh\n\n%VERSION%\n4.3.10-4\n"),
        ]);
        let options = fx.options();

        let summary = synced(run(&mut fx.catalog, "i686", &path, &options).unwrap());

        assert_eq!(summary.reassigned, vec!["bash", "zsh"]);
        assert_eq!(fx.names("i686"), vec!["bash", "zsh"]);
        assert!(fx.names("x86_64").is_empty());
    }

    #[test]
    fn test_malformed_dependency_leaves_every_partition_untouched() {
        let mut fx = Fixture::new();
        let path = fx.archive(&[
            ("tzdata-2010b-1", "%NAME%\ntzdata\n\n%VERSION%\n2010b-1\n\n%ARCH%\nany\n"),
            (
                "bash-4.1-1",
                "%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%ARCH%\nx86_64\n\n%DEPENDS%\nPython\n",
            ),
        ]);
        let options = fx.options();

        let result = run(&mut fx.catalog, "x86_64", &path, &options);

        assert!(matches!(result, Err(Error::MalformedDependency { .. })));
        assert!(fx.names("any").is_empty());
        assert!(fx.names("x86_64").is_empty());
    }

    #[test]
    fn test_lock_files_live_next_to_catalog() {
        let mut fx = Fixture::new();
        let path = fx.archive(&[("bash-4.1-1", "%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%ARCH%\nx86_64\n")]);
        let options = SyncOptions::new(fx.dir.path().join("catalog.db"));
        assert!(!options.allow_empty);
        assert_eq!(options.dependency_policy, DependencyPolicy::Strict);

        synced(run(&mut fx.catalog, "x86_64", &path, &options).unwrap());

        assert!(fx.dir.path().join("catalog.db.x86_64.core.lock").exists());
    }

    #[test]
    fn test_empty_archive_requires_confirmation() {
        let mut fx = Fixture::new();
        let full = fx.archive(&[("bash-4.1-1", "%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%ARCH%\nx86_64\n")]);
        let options = fx.options();
        synced(run(&mut fx.catalog, "x86_64", &full, &options).unwrap());

        let empty = fx.archive(&[]);
        let result = run(&mut fx.catalog, "x86_64", &empty, &options);
        assert!(matches!(result, Err(Error::EmptyBatch(_))));
        assert_eq!(fx.names("x86_64"), vec!["bash"]);

        let options = SyncOptions {
            allow_empty: true,
            ..fx.options()
        };
        let summary = synced(run(&mut fx.catalog, "x86_64", &empty, &options).unwrap());
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.reports[0].removed, vec!["bash"]);
        assert!(fx.names("x86_64").is_empty());
    }

    #[test]
    fn test_missing_archive_aborts() {
        let mut fx = Fixture::new();
        let path = fx.dir.path().join("core.db.tar.gz");
        let options = SyncOptions {
            allow_empty: true,
            ..fx.options()
        };

        let result = run(&mut fx.catalog, "x86_64", &path, &options);

        assert!(matches!(result, Err(Error::ArchiveNotFound(_))));
    }

    #[test]
    fn test_held_lock_fails_run() {
        let mut fx = Fixture::new();
        let path = fx.archive(&[("bash-4.1-1", "%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%ARCH%\nx86_64\n")]);
        let options = fx.options();
        let _held = PartitionLock::acquire(&options.lock_base, "x86_64", "core").unwrap();

        let result = run(&mut fx.catalog, "x86_64", &path, &options);

        assert!(matches!(result, Err(Error::PartitionLocked(_))));
        assert!(fx.names("x86_64").is_empty());
    }
}
