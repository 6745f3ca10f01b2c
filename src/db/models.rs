// src/db/models.rs

//! Data models for catalog database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for creating, reading, updating, and deleting records.

use crate::error::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

/// Maintainer id recorded for packages nobody has adopted yet
pub const UNASSIGNED_MAINTAINER: i64 = 0;

/// An Architecture is one half of a partition key (e.g., "x86_64")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Architecture {
    pub id: Option<i64>,
    pub name: String,
}

impl Architecture {
    /// Create a new Architecture
    pub fn new(name: String) -> Self {
        Self { id: None, name }
    }

    /// Insert this architecture into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute("INSERT INTO architectures (name) VALUES (?1)", [&self.name])?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find an architecture by name (case-insensitive)
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM architectures WHERE name = ?1")?;

        let arch = stmt.query_row([name], Self::from_row).optional()?;

        Ok(arch)
    }

    /// List all architectures
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM architectures ORDER BY name")?;

        let arches = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(arches)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
        })
    }
}

/// A Repository is the other half of a partition key (e.g., "core", "testing")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub id: Option<i64>,
    pub name: String,
}

impl Repository {
    /// Create a new Repository
    pub fn new(name: String) -> Self {
        Self { id: None, name }
    }

    /// Insert this repository into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute("INSERT INTO repositories (name) VALUES (?1)", [&self.name])?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a repository by name (case-insensitive)
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare("SELECT id, name FROM repositories WHERE name = ?1")?;

        let repo = stmt.query_row([name], Self::from_row).optional()?;

        Ok(repo)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
        })
    }
}

/// A Package is one catalog entry within an (architecture, repository) partition
#[derive(Debug, Clone)]
pub struct Package {
    pub id: Option<i64>,
    pub repository_id: i64,
    pub architecture_id: i64,
    pub maintainer_id: i64,
    pub needs_update: bool,
    pub url: String,
    pub last_update: String,
    pub name: String,
    pub version: String,
    pub release: String,
    pub description: Option<String>,
}

const PACKAGE_COLUMNS: &str = "id, repository_id, architecture_id, maintainer_id, needs_update, url, \
     last_update, name, version, release, description";

impl Package {
    /// Create a new unassigned Package
    pub fn new(
        repository_id: i64,
        architecture_id: i64,
        name: String,
        version: String,
        release: String,
    ) -> Self {
        Self {
            id: None,
            repository_id,
            architecture_id,
            maintainer_id: UNASSIGNED_MAINTAINER,
            needs_update: false,
            url: String::new(),
            last_update: String::new(),
            name,
            version,
            release,
            description: None,
        }
    }

    /// Version and release concatenated, the value update gating compares
    pub fn full_version(&self) -> String {
        format!("{}{}", self.version, self.release)
    }

    /// Insert this package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO packages
             (repository_id, architecture_id, maintainer_id, needs_update, url, last_update,
              name, version, release, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &self.repository_id,
                &self.architecture_id,
                &self.maintainer_id,
                self.needs_update as i32,
                &self.url,
                &self.last_update,
                &self.name,
                &self.version,
                &self.release,
                &self.description,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a package by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM packages WHERE id = ?1",
            PACKAGE_COLUMNS
        ))?;

        let pkg = stmt.query_row([id], Self::from_row).optional()?;

        Ok(pkg)
    }

    /// List every package in one partition, ordered by name
    pub fn find_by_partition(
        conn: &Connection,
        architecture_id: i64,
        repository_id: i64,
    ) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM packages WHERE architecture_id = ?1 AND repository_id = ?2 ORDER BY name",
            PACKAGE_COLUMNS
        ))?;

        let pkgs = stmt
            .query_map([architecture_id, repository_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(pkgs)
    }

    /// Overwrite the release-bound fields of an existing package
    ///
    /// Only version, release, description, needs_update and last_update are
    /// written; maintainer and url are left as they are.
    pub fn update_release(&self, conn: &Connection) -> Result<()> {
        let id = self
            .id
            .ok_or_else(|| Error::InitError("Cannot update package without ID".to_string()))?;

        conn.execute(
            "UPDATE packages SET version = ?1, release = ?2, description = ?3,
             needs_update = ?4, last_update = ?5 WHERE id = ?6",
            params![
                &self.version,
                &self.release,
                &self.description,
                self.needs_update as i32,
                &self.last_update,
                id,
            ],
        )?;

        Ok(())
    }

    /// Delete a package by ID (dependency and file rows cascade)
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM packages WHERE id = ?1", [id])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            repository_id: row.get(1)?,
            architecture_id: row.get(2)?,
            maintainer_id: row.get(3)?,
            needs_update: row.get::<_, i32>(4)? != 0,
            url: row.get(5)?,
            last_update: row.get(6)?,
            name: row.get(7)?,
            version: row.get(8)?,
            release: row.get(9)?,
            description: row.get(10)?,
        })
    }
}

/// A dependency row owned by a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDepend {
    pub id: Option<i64>,
    pub package_id: i64,
    pub depname: String,
    pub depvcmp: String,
}

impl PackageDepend {
    /// Create a new PackageDepend
    pub fn new(package_id: i64, depname: String, depvcmp: String) -> Self {
        Self {
            id: None,
            package_id,
            depname,
            depvcmp,
        }
    }

    /// Insert this dependency into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO package_depends (package_id, depname, depvcmp) VALUES (?1, ?2, ?3)",
            params![&self.package_id, &self.depname, &self.depvcmp],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find all dependencies of a package, in insertion order
    pub fn find_by_package(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, package_id, depname, depvcmp FROM package_depends
             WHERE package_id = ?1 ORDER BY id",
        )?;

        let deps = stmt
            .query_map([package_id], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(deps)
    }

    /// Delete all dependencies of a package
    pub fn delete_by_package(conn: &Connection, package_id: i64) -> Result<()> {
        conn.execute("DELETE FROM package_depends WHERE package_id = ?1", [package_id])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            package_id: row.get(1)?,
            depname: row.get(2)?,
            depvcmp: row.get(3)?,
        })
    }
}

/// A file path shipped by a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub id: Option<i64>,
    pub package_id: i64,
    pub path: String,
}

impl PackageFile {
    /// Create a new PackageFile
    pub fn new(package_id: i64, path: String) -> Self {
        Self {
            id: None,
            package_id,
            path,
        }
    }

    /// Insert this file into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO package_files (package_id, path) VALUES (?1, ?2)",
            params![&self.package_id, &self.path],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find all files of a package, in insertion order
    pub fn find_by_package(conn: &Connection, package_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, package_id, path FROM package_files WHERE package_id = ?1 ORDER BY id",
        )?;

        let files = stmt
            .query_map([package_id], Self::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(files)
    }

    /// Delete all files of a package
    pub fn delete_by_package(conn: &Connection, package_id: i64) -> Result<()> {
        conn.execute("DELETE FROM package_files WHERE package_id = ?1", [package_id])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            package_id: row.get(1)?,
            path: row.get(2)?,
        })
    }
}
