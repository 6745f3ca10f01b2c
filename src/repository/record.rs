// src/repository/record.rs

//! Block parser for package `desc`/`depends` payloads
//!
//! A payload is a sequence of blocks, each a `%FIELD%` header line followed
//! by value lines and terminated by a blank line or end of input:
//!
//! ```text
//! %NAME%
//! bash
//!
//! %DEPENDS%
//! readline>=7.0
//! glibc
//! ```

use super::fields::Field;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Recognized fields of one package, each with its value lines in order
pub type RecordFields = BTreeMap<Field, Vec<String>>;

/// Parse a payload into its recognized fields
///
/// Headers outside the vocabulary are skipped together with their values.
/// A field that appears twice keeps the values of its last block.
pub fn parse_record(text: &str) -> RecordFields {
    let mut fields = RecordFields::new();
    let mut lines = text.lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        let Some(field) = header_field(line) else {
            if !line.is_empty() {
                trace!("Skipping line outside a known block: {}", line);
            }
            continue;
        };

        debug!("Parsing package block {}", field);
        let mut values = Vec::new();
        while let Some(value) = lines.next_if(|l| !l.is_empty()) {
            values.push(value.to_string());
        }
        fields.insert(field, values);
    }

    fields
}

/// Recognize a `%FIELD%` header line
fn header_field(line: &str) -> Option<Field> {
    let name = line.strip_prefix('%')?.strip_suffix('%')?;
    Field::from_header(name)
}
