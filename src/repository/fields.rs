// src/repository/fields.rs

//! Field vocabulary of the repository database `desc`/`depends` format
//!
//! Every header the record parser recognizes is listed in [`FIELD_SCHEMA`]
//! together with how the record builder interprets its values.

use std::fmt;

/// A recognized `%FIELD%` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Arch,
    Backup,
    BuildDate,
    Conflicts,
    CSize,
    Deltas,
    Depends,
    Desc,
    Filename,
    Files,
    Force,
    Groups,
    InstallDate,
    ISize,
    License,
    Md5Sum,
    Name,
    OptDepends,
    Packager,
    Provides,
    Reason,
    Replaces,
    Size,
    Url,
    Version,
}

/// How the builder turns a field's value lines into a record attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exactly one value, the package identity
    Identity,
    /// Value lines joined into one string
    Scalar,
    /// Value lines kept as an ordered list
    List,
    /// True when the header is present, values ignored
    Flag,
    /// First value parsed as an integer
    Integer,
    /// First value split into version and release
    Version,
}

/// One row of the field schema table
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub header: &'static str,
    pub kind: FieldKind,
    /// Value used when the header is absent, for scalars that have one
    pub default: Option<&'static str>,
}

const fn spec(field: Field, header: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        field,
        header,
        kind,
        default: None,
    }
}

/// The complete field vocabulary, in header order
pub static FIELD_SCHEMA: [FieldSpec; 25] = [
    spec(Field::Arch, "arch", FieldKind::Scalar),
    spec(Field::Backup, "backup", FieldKind::List),
    spec(Field::BuildDate, "builddate", FieldKind::Scalar),
    spec(Field::Conflicts, "conflicts", FieldKind::List),
    spec(Field::CSize, "csize", FieldKind::Scalar),
    spec(Field::Deltas, "deltas", FieldKind::List),
    spec(Field::Depends, "depends", FieldKind::List),
    spec(Field::Desc, "desc", FieldKind::Scalar),
    spec(Field::Filename, "filename", FieldKind::Scalar),
    spec(Field::Files, "files", FieldKind::List),
    spec(Field::Force, "force", FieldKind::Flag),
    spec(Field::Groups, "groups", FieldKind::List),
    spec(Field::InstallDate, "installdate", FieldKind::Scalar),
    spec(Field::ISize, "isize", FieldKind::Scalar),
    spec(Field::License, "license", FieldKind::Scalar),
    spec(Field::Md5Sum, "md5sum", FieldKind::Scalar),
    spec(Field::Name, "name", FieldKind::Identity),
    spec(Field::OptDepends, "optdepends", FieldKind::List),
    spec(Field::Packager, "packager", FieldKind::Scalar),
    spec(Field::Provides, "provides", FieldKind::List),
    spec(Field::Reason, "reason", FieldKind::Integer),
    spec(Field::Replaces, "replaces", FieldKind::List),
    spec(Field::Size, "size", FieldKind::Scalar),
    FieldSpec {
        field: Field::Url,
        header: "url",
        kind: FieldKind::Scalar,
        default: Some(""),
    },
    spec(Field::Version, "version", FieldKind::Version),
];

impl Field {
    /// Look up a header name (without the `%` delimiters), ignoring case
    pub fn from_header(name: &str) -> Option<Self> {
        FIELD_SCHEMA
            .iter()
            .find(|spec| spec.header.eq_ignore_ascii_case(name))
            .map(|spec| spec.field)
    }

    /// The schema row for this field
    pub fn spec(self) -> &'static FieldSpec {
        // FIELD_SCHEMA holds one row per variant, in declaration order
        &FIELD_SCHEMA[self as usize]
    }

    pub fn header(self) -> &'static str {
        self.spec().header
    }

    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}%", self.header().to_ascii_uppercase())
    }
}
