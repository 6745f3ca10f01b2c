// src/catalog/sqlite.rs

//! SQLite-backed catalog

use super::{Catalog, Partition};
use crate::db;
use crate::db::models::{Architecture, Package, PackageDepend, PackageFile, Repository};
use crate::error::Result;
use crate::repository::DependencySpec;
use rusqlite::Connection;
use tracing::debug;

/// Catalog stored in a SQLite database
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open an existing, initialized catalog database
    pub fn open(db_path: &str) -> Result<Self> {
        Ok(Self {
            conn: db::open(db_path)?,
        })
    }

    /// Wrap a connection whose schema is already migrated
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Register a new architecture
    pub fn add_architecture(&mut self, name: &str) -> Result<Architecture> {
        let mut arch = Architecture::new(name.to_string());
        arch.insert(&self.conn)?;
        Ok(arch)
    }

    /// Register a new repository
    pub fn add_repository(&mut self, name: &str) -> Result<Repository> {
        let mut repo = Repository::new(name.to_string());
        repo.insert(&self.conn)?;
        Ok(repo)
    }

    /// Stored dependency rows of a package
    pub fn dependencies(&self, package_id: i64) -> Result<Vec<PackageDepend>> {
        PackageDepend::find_by_package(&self.conn, package_id)
    }

    /// Stored file rows of a package
    pub fn files(&self, package_id: i64) -> Result<Vec<PackageFile>> {
        PackageFile::find_by_package(&self.conn, package_id)
    }
}

fn insert_depends(conn: &Connection, package_id: i64, depends: &[DependencySpec]) -> Result<()> {
    for dep in depends {
        PackageDepend::new(package_id, dep.name.clone(), dep.constraint.clone()).insert(conn)?;
    }
    Ok(())
}

fn replace_depends(conn: &Connection, package_id: i64, depends: &[DependencySpec]) -> Result<()> {
    PackageDepend::delete_by_package(conn, package_id)?;
    insert_depends(conn, package_id, depends)
}

fn insert_files(conn: &Connection, package_id: i64, files: &[String]) -> Result<()> {
    for path in files {
        PackageFile::new(package_id, path.clone()).insert(conn)?;
    }
    Ok(())
}

impl Catalog for SqliteCatalog {
    fn architectures(&self) -> Result<Vec<Architecture>> {
        Architecture::list_all(&self.conn)
    }

    fn find_architecture(&self, name: &str) -> Result<Option<Architecture>> {
        Architecture::find_by_name(&self.conn, name)
    }

    fn find_repository(&self, name: &str) -> Result<Option<Repository>> {
        Repository::find_by_name(&self.conn, name)
    }

    fn packages(&self, partition: &Partition) -> Result<Vec<Package>> {
        Package::find_by_partition(&self.conn, partition.architecture_id, partition.repository_id)
    }

    fn create_package(
        &mut self,
        package: &mut Package,
        depends: &[DependencySpec],
        files: &[String],
    ) -> Result<i64> {
        db::transaction(&mut self.conn, |tx| {
            let id = package.insert(tx)?;
            insert_depends(tx, id, depends)?;
            insert_files(tx, id, files)?;
            debug!(
                "Stored package {} with {} dependencies and {} files",
                package.name,
                depends.len(),
                files.len()
            );
            Ok(id)
        })
    }

    fn update_package(
        &mut self,
        package: &Package,
        depends: &[DependencySpec],
        files: &[String],
    ) -> Result<()> {
        db::transaction(&mut self.conn, |tx| {
            package.update_release(tx)?;
            if let Some(id) = package.id {
                replace_depends(tx, id, depends)?;
                PackageFile::delete_by_package(tx, id)?;
                insert_files(tx, id, files)?;
            }
            Ok(())
        })
    }

    fn delete_package(&mut self, package_id: i64) -> Result<()> {
        // Dependency and file rows go with the package via ON DELETE CASCADE
        Package::delete(&self.conn, package_id)
    }

    fn replace_dependencies(&mut self, package_id: i64, depends: &[DependencySpec]) -> Result<()> {
        db::transaction(&mut self.conn, |tx| replace_depends(tx, package_id, depends))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use tempfile::NamedTempFile;

    fn create_test_catalog() -> (NamedTempFile, SqliteCatalog, Partition) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        schema::migrate(&conn).unwrap();

        let mut catalog = SqliteCatalog::from_connection(conn);
        let arch = catalog.add_architecture("x86_64").unwrap();
        let repo = catalog.add_repository("core").unwrap();
        let partition = Partition::new(&arch, &repo).unwrap();
        (temp_file, catalog, partition)
    }

    fn dep(name: &str, constraint: &str) -> DependencySpec {
        DependencySpec {
            name: name.to_string(),
            constraint: constraint.to_string(),
        }
    }

    fn new_package(partition: &Partition, name: &str) -> Package {
        let mut pkg = Package::new(
            partition.repository_id,
            partition.architecture_id,
            name.to_string(),
            "4.1".to_string(),
            "1".to_string(),
        );
        pkg.last_update = "2024-01-01 00:00:00".to_string();
        pkg
    }

    #[test]
    fn test_create_and_list() {
        let (_temp, mut catalog, partition) = create_test_catalog();

        let mut pkg = new_package(&partition, "bash");
        let id = catalog
            .create_package(&mut pkg, &[dep("glibc", ">=2.17")], &["usr/bin/bash".to_string()])
            .unwrap();

        let packages = catalog.packages(&partition).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].id, Some(id));

        let deps = catalog.dependencies(id).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].depname, "glibc");
        assert_eq!(deps[0].depvcmp, ">=2.17");

        assert_eq!(catalog.files(id).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_create_leaves_no_rows() {
        let (_temp, mut catalog, partition) = create_test_catalog();

        catalog
            .create_package(&mut new_package(&partition, "bash"), &[], &[])
            .unwrap();

        // Same name in the same partition violates the unique constraint
        let result = catalog.create_package(
            &mut new_package(&partition, "bash"),
            &[dep("glibc", "")],
            &[],
        );
        assert!(result.is_err());

        let depends: i64 = catalog
            .connection()
            .query_row("SELECT COUNT(*) FROM package_depends", [], |row| row.get(0))
            .unwrap();
        assert_eq!(depends, 0);
    }

    #[test]
    fn test_update_replaces_dependencies_wholesale() {
        let (_temp, mut catalog, partition) = create_test_catalog();

        let mut pkg = new_package(&partition, "bash");
        let id = catalog
            .create_package(&mut pkg, &[dep("glibc", ""), dep("readline", ">=6.0")], &[])
            .unwrap();

        pkg.version = "4.2".to_string();
        catalog
            .update_package(&pkg, &[dep("readline", ">=6.2")], &[])
            .unwrap();

        let deps = catalog.dependencies(id).unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].depname, "readline");
        assert_eq!(deps[0].depvcmp, ">=6.2");

        let stored = Package::find_by_id(catalog.connection(), id).unwrap().unwrap();
        assert_eq!(stored.version, "4.2");
    }

    #[test]
    fn test_delete_cascades() {
        let (_temp, mut catalog, partition) = create_test_catalog();

        let mut pkg = new_package(&partition, "bash");
        let id = catalog
            .create_package(&mut pkg, &[dep("glibc", "")], &["usr/bin/bash".to_string()])
            .unwrap();

        catalog.delete_package(id).unwrap();

        assert!(catalog.packages(&partition).unwrap().is_empty());
        assert!(catalog.dependencies(id).unwrap().is_empty());
        assert!(catalog.files(id).unwrap().is_empty());
    }

    #[test]
    fn test_replace_dependencies() {
        let (_temp, mut catalog, partition) = create_test_catalog();

        let mut pkg = new_package(&partition, "bash");
        let id = catalog.create_package(&mut pkg, &[dep("glibc", "")], &[]).unwrap();

        catalog.replace_dependencies(id, &[]).unwrap();
        assert!(catalog.dependencies(id).unwrap().is_empty());
    }
}
