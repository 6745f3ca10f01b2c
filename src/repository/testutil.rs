// src/repository/testutil.rs

//! Helpers for building repository database archives in tests

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::path::Path;
use tar::{Builder, EntryType, Header};

pub enum ArchiveEntry<'a> {
    Dir(&'a str),
    File(&'a str, &'a str),
}

/// Write a gzip-compressed tarball with the given entries, in order
pub fn write_archive(path: &Path, entries: &[ArchiveEntry<'_>]) {
    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = Builder::new(encoder);

    for entry in entries {
        let mut header = Header::new_gnu();
        match entry {
            ArchiveEntry::Dir(name) => {
                header.set_entry_type(EntryType::Directory);
                header.set_mode(0o755);
                header.set_size(0);
                builder
                    .append_data(&mut header, format!("{}/", name), std::io::empty())
                    .unwrap();
            }
            ArchiveEntry::File(name, content) => {
                header.set_entry_type(EntryType::Regular);
                header.set_mode(0o644);
                header.set_size(content.len() as u64);
                builder
                    .append_data(&mut header, name, content.as_bytes())
                    .unwrap();
            }
        }
    }

    builder.into_inner().unwrap().finish().unwrap();
}
