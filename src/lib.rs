// src/lib.rs

//! reporead
//!
//! Reads an Arch Linux style repository database (`<repo>.db.tar.gz`) and
//! reconciles a package catalog against it.
//!
//! # Architecture
//!
//! - `repository`: archive streaming, `%FIELD%` record parsing, typed package records
//! - `catalog`: the catalog interface and its SQLite implementation over `db`
//! - `sync`: per-partition set reconciliation
//! - `driver`: one CLI run, from architecture validation to per-partition reports
//!
//! A partition is one (architecture, repository) pair; each run converges
//! every partition it touches to exactly the packages in the archive.

pub mod catalog;
pub mod db;
pub mod driver;
mod error;
pub mod lock;
pub mod repository;
pub mod sync;

pub use error::{Error, Result};
