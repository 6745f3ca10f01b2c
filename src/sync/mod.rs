// src/sync/mod.rs

//! Partition reconciliation
//!
//! Converges one (architecture, repository) partition of the catalog to
//! exactly the set of packages in a sync batch:
//! - names only in the batch are created
//! - names only in the catalog are deleted
//! - names on both sides are updated when version+release changed, and left
//!   untouched otherwise
//!
//! The diff is computed over in-memory name sets, O(n) in partition size.
//! Every dependency list is parsed before the first write, so a malformed
//! dependency under the strict policy aborts with the catalog unchanged.

pub mod report;

pub use report::SyncReport;

use crate::catalog::{Catalog, Partition};
use crate::db::models::Package;
use crate::error::{Error, Result};
use crate::repository::{DependencyPolicy, DependencySpec, PackageRecord, resolve_dependencies};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Format of `last_update` timestamps written to the catalog
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Wall-clock limit for a sync run
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    /// A deadline `limit` from now
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.started.elapsed() >= self.limit {
            return Err(Error::Timeout(self.limit.as_secs()));
        }
        Ok(())
    }
}

/// Tunables of one reconciliation
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub dependency_policy: DependencyPolicy,
    pub deadline: Option<Deadline>,
}

enum Action<'a> {
    Add {
        record: &'a PackageRecord,
        depends: Vec<DependencySpec>,
    },
    Remove(Package),
    Update {
        package: Package,
        record: &'a PackageRecord,
        depends: Vec<DependencySpec>,
    },
}

/// Pending mutations of one partition, computed without touching the catalog
///
/// Every dependency list has already been resolved, so applying a plan can
/// only fail on the store or the deadline.
pub struct SyncPlan<'a> {
    partition: Partition,
    actions: Vec<Action<'a>>,
    report: SyncReport,
}

impl SyncPlan<'_> {
    /// Apply additions, then removals, then updates
    ///
    /// A catalog error aborts the rest of the plan; packages already written
    /// stay written.
    pub fn apply<C: Catalog + ?Sized>(
        self,
        catalog: &mut C,
        deadline: Option<&Deadline>,
    ) -> Result<SyncReport> {
        let SyncPlan {
            partition,
            actions,
            mut report,
        } = self;
        let now = Utc::now().format(TIMESTAMP_FORMAT).to_string();

        for action in actions {
            if let Some(deadline) = deadline {
                deadline.check()?;
            }

            match action {
                Action::Add { record, depends } => {
                    debug!("Adding package {}", record.name);
                    let mut package = Package::new(
                        partition.repository_id,
                        partition.architecture_id,
                        record.name.clone(),
                        record.version.clone(),
                        record.release.clone(),
                    );
                    package.url = record.url.clone();
                    package.description = record.description.clone();
                    package.last_update = now.clone();

                    catalog.create_package(&mut package, &depends, &record.files)?;
                    report.added.push(record.name.clone());
                }
                Action::Remove(package) => {
                    info!("Removing package {} from database", package.name);
                    let id = package.id.ok_or_else(|| {
                        Error::InitError(format!("Cannot delete package {} without ID", package.name))
                    })?;

                    catalog.delete_package(id)?;
                    report.removed.push(package.name);
                }
                Action::Update {
                    mut package,
                    record,
                    depends,
                } => {
                    info!(
                        "Updating package {} in database ({}-{} -> {}-{})",
                        record.name, package.version, package.release, record.version, record.release
                    );
                    package.version = record.version.clone();
                    package.release = record.release.clone();
                    package.description = record.description.clone();
                    package.needs_update = false;
                    package.last_update = now.clone();

                    catalog.update_package(&package, &depends, &record.files)?;
                    report.updated.push(record.name.clone());
                }
            }
        }

        info!("Finished updating partition: {}", report);
        Ok(report)
    }
}

/// Diff one partition of the catalog against `batch`
///
/// Both the architecture and the repository must already exist in the
/// catalog. Dependency lists are resolved for every package that will be
/// written, so a strict failure surfaces here, before any mutation.
pub fn plan<'a, C: Catalog + ?Sized>(
    catalog: &C,
    architecture: &str,
    repository: &str,
    batch: &'a [PackageRecord],
    policy: DependencyPolicy,
) -> Result<SyncPlan<'a>> {
    let repo = catalog
        .find_repository(repository)?
        .ok_or_else(|| Error::UnknownRepository(repository.to_string()))?;
    let arch = catalog
        .find_architecture(architecture)?
        .ok_or_else(|| Error::UnknownArchitecture(architecture.to_string()))?;
    let partition = Partition::new(&arch, &repo).ok_or_else(|| {
        Error::InitError(format!("Partition {}/{} has no stored id", repository, architecture))
    })?;

    info!("Updating partition {} with {} packages", partition, batch.len());

    let existing: HashMap<String, Package> = catalog
        .packages(&partition)?
        .into_iter()
        .map(|pkg| (pkg.name.clone(), pkg))
        .collect();

    let mut incoming = HashSet::with_capacity(batch.len());
    for record in batch {
        if !incoming.insert(record.name.as_str()) {
            return Err(Error::DuplicatePackage(record.name.clone()));
        }
    }

    let mut report = SyncReport::new(&partition.architecture, &partition.repository);

    let mut additions = Vec::new();
    let mut updates = Vec::new();
    for record in batch {
        match existing.get(&record.name) {
            None => additions.push(Action::Add {
                record,
                depends: resolve_dependencies(&record.name, &record.depends, policy)?,
            }),
            Some(stored) if stored.full_version() == record.full_version() => {
                report.unchanged.push(record.name.clone());
            }
            Some(stored) => updates.push(Action::Update {
                package: stored.clone(),
                record,
                depends: resolve_dependencies(&record.name, &record.depends, policy)?,
            }),
        }
    }

    let mut removals: Vec<Package> = existing
        .into_values()
        .filter(|pkg| !incoming.contains(pkg.name.as_str()))
        .collect();
    removals.sort_by(|a, b| a.name.cmp(&b.name));

    let actions = additions
        .into_iter()
        .chain(removals.into_iter().map(Action::Remove))
        .chain(updates)
        .collect();

    Ok(SyncPlan {
        partition,
        actions,
        report,
    })
}

/// Reconcile one partition of the catalog against `batch`
pub fn reconcile<C: Catalog + ?Sized>(
    catalog: &mut C,
    architecture: &str,
    repository: &str,
    batch: &[PackageRecord],
    options: &ReconcileOptions,
) -> Result<SyncReport> {
    plan(&*catalog, architecture, repository, batch, options.dependency_policy)?
        .apply(catalog, options.deadline.as_ref())
}
