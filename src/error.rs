// src/error.rs

use thiserror::Error;

/// Core error types for reporead
#[derive(Error, Debug)]
pub enum Error {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database initialization error
    #[error("Failed to initialize database: {0}")]
    InitError(String),

    /// Database not found
    #[error("Database not found at path: {0}")]
    DatabaseNotFound(String),

    /// Repository database archive does not exist
    #[error("Repository archive not found: {0}")]
    ArchiveNotFound(String),

    /// Archive could not be decompressed or traversed
    #[error("Archive error: {0}")]
    Archive(String),

    /// Archive file name does not carry a repository database suffix
    #[error("Cannot derive repository name from archive file name: {0}")]
    InvalidArchiveName(String),

    /// A package record is missing required fields or has unparseable values
    #[error("Malformed package record: {0}")]
    MalformedRecord(String),

    /// A dependency string does not match the expected shape
    #[error("Malformed dependency '{spec}' in package {package}")]
    MalformedDependency { package: String, spec: String },

    /// The same package name appears twice in one partition batch
    #[error("Package {0} appears more than once in the sync batch")]
    DuplicatePackage(String),

    /// Architecture is not registered in the catalog
    #[error("Unknown architecture: {0}")]
    UnknownArchitecture(String),

    /// Repository is not registered in the catalog
    #[error("Unknown repository: {0}")]
    UnknownRepository(String),

    /// Archive produced no packages and emptying the partition was not confirmed
    #[error("Archive {0} contains no packages; pass --allow-empty to empty the partition")]
    EmptyBatch(String),

    /// Another run holds the advisory lock for this partition
    #[error("Partition {0} is locked by another run")]
    PartitionLocked(String),

    /// The wall-clock watchdog expired mid-run
    #[error("Sync exceeded its time limit of {0} seconds")]
    Timeout(u64),
}

/// Result type alias using reporead's Error type
pub type Result<T> = std::result::Result<T, Error>;
