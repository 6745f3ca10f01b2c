// src/repository/archive.rs

//! Streaming reader for repository database archives
//!
//! A repository database is a compressed tarball with one directory per
//! package. Each directory holds a `desc` file and optionally a `depends`
//! file; their contents are concatenated into a single payload for the
//! record parser. Directories are expected to precede their member files,
//! which `repo-add` guarantees.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tar::{Archive, Entries};
use tracing::{debug, trace};
use xz2::read::XzDecoder;

/// Member files whose contents make up a package payload
const PAYLOAD_FILES: [&str; 2] = ["desc", "depends"];

const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const XZ_MAGIC: &[u8] = &[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xB5, 0x2F, 0xFD];

/// Compression formats a repository database may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    Gzip,
    Xz,
    Zstd,
}

impl Compression {
    fn detect(magic: &[u8]) -> Option<Self> {
        if magic.starts_with(GZIP_MAGIC) {
            Some(Compression::Gzip)
        } else if magic.starts_with(XZ_MAGIC) {
            Some(Compression::Xz)
        } else if magic.starts_with(ZSTD_MAGIC) {
            Some(Compression::Zstd)
        } else {
            None
        }
    }
}

/// Raw text of one package directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    /// Directory name inside the archive, e.g. `bash-4.1-1`
    pub directory: String,
    pub text: String,
}

/// An opened repository database archive
///
/// The underlying file is closed when the reader is dropped.
pub struct ArchiveReader {
    archive: Archive<Box<dyn Read>>,
}

impl ArchiveReader {
    /// Open an archive, detecting gzip, xz or zstd compression from its magic bytes
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ArchiveNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let compression = Compression::detect(reader.fill_buf()?).ok_or_else(|| {
            Error::Archive(format!(
                "{} is not a gzip, xz or zstd compressed archive",
                path.display()
            ))
        })?;
        debug!("Reading {:?} archive {}", compression, path.display());

        let decoder: Box<dyn Read> = match compression {
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
            Compression::Xz => Box::new(XzDecoder::new(reader)),
            Compression::Zstd => {
                let decoder = zstd::Decoder::with_buffer(reader).map_err(|e| {
                    Error::Archive(format!("Failed to create zstd decoder: {}", e))
                })?;
                Box::new(decoder)
            }
        };

        Ok(Self {
            archive: Archive::new(decoder),
        })
    }

    /// Iterate over package payloads in archive order
    ///
    /// The archive is read sequentially, so payloads can only be walked once.
    pub fn payloads(&mut self) -> Result<Payloads<'_>> {
        let entries = self
            .archive
            .entries()
            .map_err(|e| Error::Archive(format!("Failed to read archive entries: {}", e)))?;

        Ok(Payloads {
            entries,
            pending: None,
            finished: false,
        })
    }
}

/// Lazy iterator over the package payloads of an [`ArchiveReader`]
pub struct Payloads<'a> {
    entries: Entries<'a, Box<dyn Read>>,
    pending: Option<RawPayload>,
    finished: bool,
}

impl Payloads<'_> {
    /// Consume the next tar entry; returns a payload when one is complete
    fn step(&mut self) -> Result<Option<RawPayload>> {
        let Some(entry) = self.entries.next() else {
            self.finished = true;
            return Ok(self.pending.take());
        };
        let mut entry =
            entry.map_err(|e| Error::Archive(format!("Failed to read tarball entry: {}", e)))?;

        let path = entry
            .path()
            .map_err(|e| Error::Archive(format!("Invalid path in tarball: {}", e)))?
            .into_owned();
        let entry_type = entry.header().entry_type();

        if entry_type.is_dir() {
            let directory = path.to_string_lossy().trim_end_matches('/').to_string();
            trace!("Entering package directory {}", directory);
            let next = RawPayload {
                directory,
                text: String::new(),
            };
            return Ok(self.pending.replace(next));
        }

        if !entry_type.is_file() {
            return Ok(None);
        }

        let is_payload_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| PAYLOAD_FILES.contains(&name));
        if !is_payload_file {
            return Ok(None);
        }

        let Some(pending) = self.pending.as_mut() else {
            return Err(Error::Archive(format!(
                "{} precedes its package directory",
                path.display()
            )));
        };

        let mut content = Vec::new();
        entry
            .read_to_end(&mut content)
            .map_err(|e| Error::Archive(format!("Failed to read {}: {}", path.display(), e)))?;
        pending.text.push_str(&String::from_utf8_lossy(&content));
        pending.text.push('\n');

        Ok(None)
    }
}

impl Iterator for Payloads<'_> {
    type Item = Result<RawPayload>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            match self.step() {
                Ok(Some(payload)) => return Some(Ok(payload)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
