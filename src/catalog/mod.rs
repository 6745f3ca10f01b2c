// src/catalog/mod.rs

//! Catalog collaborator interface
//!
//! The reconciliation engine reads and writes the package catalog only
//! through the [`Catalog`] trait. [`SqliteCatalog`] is the production
//! implementation over the `db` layer.

mod sqlite;

pub use sqlite::SqliteCatalog;

use crate::db::models::{Architecture, Package, Repository};
use crate::error::Result;
use crate::repository::DependencySpec;
use std::fmt;

/// The (architecture, repository) pair one reconciliation is scoped to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub architecture_id: i64,
    pub architecture: String,
    pub repository_id: i64,
    pub repository: String,
}

impl Partition {
    /// Build a partition from catalog rows; both must have been stored
    pub fn new(architecture: &Architecture, repository: &Repository) -> Option<Self> {
        Some(Self {
            architecture_id: architecture.id?,
            architecture: architecture.name.clone(),
            repository_id: repository.id?,
            repository: repository.name.clone(),
        })
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.repository, self.architecture)
    }
}

/// Query/mutation interface of the package catalog
///
/// Each mutating call is applied as one unit: a package row together with
/// its dependency and file rows either all change or none do.
pub trait Catalog {
    /// All architectures the catalog knows
    fn architectures(&self) -> Result<Vec<Architecture>>;

    /// Look up an architecture by name (case-insensitive)
    fn find_architecture(&self, name: &str) -> Result<Option<Architecture>>;

    /// Look up a repository by name (case-insensitive)
    fn find_repository(&self, name: &str) -> Result<Option<Repository>>;

    /// All package entries of one partition
    fn packages(&self, partition: &Partition) -> Result<Vec<Package>>;

    /// Store a new package with its dependencies and files, returning its id
    fn create_package(
        &mut self,
        package: &mut Package,
        depends: &[DependencySpec],
        files: &[String],
    ) -> Result<i64>;

    /// Overwrite a package's release fields and replace its dependencies and files
    fn update_package(
        &mut self,
        package: &Package,
        depends: &[DependencySpec],
        files: &[String],
    ) -> Result<()>;

    /// Delete a package together with its dependency and file rows
    fn delete_package(&mut self, package_id: i64) -> Result<()>;

    /// Replace a package's whole dependency list
    ///
    /// The sync engine replaces dependencies through `update_package`; this
    /// is for callers that fix up dependency rows without a release change.
    fn replace_dependencies(&mut self, package_id: i64, depends: &[DependencySpec]) -> Result<()>;
}
