// src/repository/package.rs

//! Typed package records built from parsed field blocks

use super::fields::{FIELD_SCHEMA, Field, FieldKind};
use super::record::RecordFields;
use crate::error::{Error, Result};
use tracing::warn;

/// How a `%VERSION%` value is divided into version and release
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionSplit {
    /// Split on every hyphen and keep the first two segments.
    ///
    /// This matches how the catalog has always been populated, but it is
    /// wrong for upstream versions containing hyphens: `1.0-rc1-2` becomes
    /// version `1.0`, release `rc1`, and the trailing `2` is lost.
    #[default]
    FirstHyphen,
    /// Split on the last hyphen only: `1.0-rc1-2` becomes `1.0-rc1` / `2`
    LastHyphen,
}

impl VersionSplit {
    /// Split `value` into (version, release), or `None` if it has no hyphen
    pub fn split<'a>(&self, value: &'a str) -> Option<(&'a str, &'a str)> {
        match self {
            VersionSplit::FirstHyphen => {
                let mut parts = value.split('-');
                let version = parts.next()?;
                let release = parts.next()?;
                Some((version, release))
            }
            VersionSplit::LastHyphen => value.rsplit_once('-'),
        }
    }
}

/// One package as declared in a repository database archive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    pub release: String,
    pub description: Option<String>,
    pub url: String,
    /// Architecture exactly as declared; may be unknown to the catalog
    pub arch: Option<String>,
    pub filename: Option<String>,
    pub builddate: Option<String>,
    pub installdate: Option<String>,
    pub csize: Option<String>,
    pub isize: Option<String>,
    pub size: Option<String>,
    pub md5sum: Option<String>,
    /// All `%LICENSE%` lines joined; see `licenses` for the individual entries
    pub license: Option<String>,
    pub packager: Option<String>,
    pub force: bool,
    pub reason: Option<i64>,
    /// Raw dependency strings, parsed later by the reconciliation engine
    pub depends: Vec<String>,
    pub optdepends: Vec<String>,
    pub files: Vec<String>,
    pub groups: Vec<String>,
    pub licenses: Vec<String>,
    pub provides: Vec<String>,
    pub replaces: Vec<String>,
    pub conflicts: Vec<String>,
    pub backup: Vec<String>,
    pub deltas: Vec<String>,
    /// Repository the record was read from
    pub repo: String,
}

impl PackageRecord {
    /// Version and release concatenated, the value update gating compares
    pub fn full_version(&self) -> String {
        format!("{}{}", self.version, self.release)
    }

    fn set_scalar(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Arch => &mut self.arch,
            Field::BuildDate => &mut self.builddate,
            Field::CSize => &mut self.csize,
            Field::Desc => &mut self.description,
            Field::Filename => &mut self.filename,
            Field::InstallDate => &mut self.installdate,
            Field::ISize => &mut self.isize,
            Field::License => &mut self.license,
            Field::Md5Sum => &mut self.md5sum,
            Field::Packager => &mut self.packager,
            Field::Size => &mut self.size,
            Field::Url => {
                self.url = value;
                return;
            }
            _ => return,
        };
        *slot = Some(value);
    }

    fn set_list(&mut self, field: Field, values: Vec<String>) {
        let slot = match field {
            Field::Backup => &mut self.backup,
            Field::Conflicts => &mut self.conflicts,
            Field::Deltas => &mut self.deltas,
            Field::Depends => &mut self.depends,
            Field::Files => &mut self.files,
            Field::Groups => &mut self.groups,
            Field::OptDepends => &mut self.optdepends,
            Field::Provides => &mut self.provides,
            Field::Replaces => &mut self.replaces,
            _ => return,
        };
        *slot = values;
    }
}

/// Builds [`PackageRecord`]s for one repository
#[derive(Debug, Clone)]
pub struct PackageRecordBuilder {
    repo: String,
    version_split: VersionSplit,
}

impl PackageRecordBuilder {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            version_split: VersionSplit::default(),
        }
    }

    pub fn version_split(mut self, split: VersionSplit) -> Self {
        self.version_split = split;
        self
    }

    /// Turn one package's parsed fields into a typed record
    ///
    /// Fails if `%NAME%` is missing or has more than one value, if
    /// `%VERSION%` is missing or has no hyphen, or if `%REASON%` is not an
    /// integer.
    pub fn build(&self, mut fields: RecordFields) -> Result<PackageRecord> {
        let name = take_name(&mut fields)?;
        let mut record = PackageRecord {
            name,
            repo: self.repo.clone(),
            ..Default::default()
        };
        let mut version = None;

        for spec in FIELD_SCHEMA.iter() {
            let Some(values) = fields.remove(&spec.field) else {
                if let Some(default) = spec.default {
                    record.set_scalar(spec.field, default.to_string());
                }
                continue;
            };

            match spec.kind {
                FieldKind::Identity => {}
                FieldKind::Scalar => {
                    if values.is_empty() {
                        warn!("Package {} has no {}", record.name, spec.header);
                    }
                    if spec.field == Field::License {
                        record.licenses = values.clone();
                    }
                    record.set_scalar(spec.field, values.concat());
                }
                FieldKind::List => record.set_list(spec.field, values),
                FieldKind::Flag => record.force = true,
                FieldKind::Integer => {
                    let raw = values.first().map(String::as_str).unwrap_or_default();
                    let reason = raw.parse::<i64>().map_err(|_| {
                        Error::MalformedRecord(format!(
                            "package {} has non-integer {}: '{}'",
                            record.name, spec.field, raw
                        ))
                    })?;
                    record.reason = Some(reason);
                }
                FieldKind::Version => version = values.into_iter().next(),
            }
        }

        let version = version.ok_or_else(|| {
            Error::MalformedRecord(format!("package {} has no %VERSION%", record.name))
        })?;
        let (ver, rel) = self.version_split.split(&version).ok_or_else(|| {
            Error::MalformedRecord(format!(
                "package {} has version '{}' without a release",
                record.name, version
            ))
        })?;
        record.version = ver.to_string();
        record.release = rel.to_string();

        Ok(record)
    }
}

fn take_name(fields: &mut RecordFields) -> Result<String> {
    let values = fields
        .remove(&Field::Name)
        .ok_or_else(|| Error::MalformedRecord("missing %NAME% field".to_string()))?;

    let mut values = values.into_iter();
    match (values.next(), values.next()) {
        (Some(name), None) => Ok(name),
        (None, _) => Err(Error::MalformedRecord("empty %NAME% field".to_string())),
        (Some(name), Some(_)) => Err(Error::MalformedRecord(format!(
            "%NAME% has more than one value (first is {})",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::record::parse_record;

    fn build(text: &str) -> Result<PackageRecord> {
        PackageRecordBuilder::new("core").build(parse_record(text))
    }

    #[test]
    fn test_build_minimal_record() {
        let record =
            build("%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%ARCH%\nx86_64\n\n").unwrap();

        assert_eq!(record.name, "bash");
        assert_eq!(record.version, "4.1");
        assert_eq!(record.release, "1");
        assert_eq!(record.arch.as_deref(), Some("x86_64"));
        assert_eq!(record.repo, "core");
        assert_eq!(record.url, "");
        assert!(!record.force);
        assert!(record.description.is_none());
        assert!(record.depends.is_empty());
    }

    #[test]
    fn test_build_full_record() {
        let text = "%FILENAME%\nbash-4.1-1-x86_64.pkg.tar.gz\n\n\
                    %NAME%\nbash\n\n\
                    %VERSION%\n4.1-1\n\n\
                    %DESC%\nThe GNU Bourne Again shell\n\n\
                    %GROUPS%\nbase\n\n\
                    %CSIZE%\n573856\n\n\
                    %URL%\nhttp://www.gnu.org/software/bash/bash.html\n\n\
                    %LICENSE%\nGPL\n\n\
                    %ARCH%\nx86_64\n\n\
                    %PACKAGER%\nAllan McRae <allan@archlinux.org>\n\n\
                    %REASON%\n1\n\n\
                    %FORCE%\n\n\
                    %DEPENDS%\nreadline>=6.1\nglibc\n\n\
                    %PROVIDES%\nsh\n\n";

        let record = build(text).unwrap();

        assert_eq!(record.filename.as_deref(), Some("bash-4.1-1-x86_64.pkg.tar.gz"));
        assert_eq!(record.description.as_deref(), Some("The GNU Bourne Again shell"));
        assert_eq!(record.groups, vec!["base"]);
        assert_eq!(record.csize.as_deref(), Some("573856"));
        assert_eq!(record.url, "http://www.gnu.org/software/bash/bash.html");
        assert_eq!(record.license.as_deref(), Some("GPL"));
        assert_eq!(record.licenses, vec!["GPL"]);
        assert_eq!(record.packager.as_deref(), Some("Allan McRae <allan@archlinux.org>"));
        assert_eq!(record.reason, Some(1));
        assert!(record.force);
        assert_eq!(record.depends, vec!["readline>=6.1", "glibc"]);
        assert_eq!(record.provides, vec!["sh"]);
    }

    #[test]
    fn test_missing_name_is_fatal() {
        let result = build("%VERSION%\n4.1-1\n\n");
        assert!(matches!(result, Err(Error::MalformedRecord(_))));

        let result = build("%NAME%\n\n%VERSION%\n4.1-1\n\n");
        assert!(matches!(result, Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_multiple_names_is_fatal() {
        let result = build("%NAME%\nbash\nzsh\n\n%VERSION%\n4.1-1\n\n");
        assert!(matches!(result, Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_version_without_release_is_fatal() {
        let result = build("%NAME%\nbash\n\n%VERSION%\n4.1\n\n");
        assert!(matches!(result, Err(Error::MalformedRecord(_))));

        let result = build("%NAME%\nbash\n\n");
        assert!(matches!(result, Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_non_integer_reason_is_fatal() {
        let result = build("%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%REASON%\nexplicit\n\n");
        assert!(matches!(result, Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_empty_scalar_is_kept_as_empty_string() {
        let record = build("%NAME%\nbash\n\n%VERSION%\n4.1-1\n\n%PACKAGER%\n\n").unwrap();
        assert_eq!(record.packager.as_deref(), Some(""));
    }

    #[test]
    fn test_multiple_licenses() {
        let record =
            build("%NAME%\nzlib\n\n%VERSION%\n1.2.5-3\n\n%LICENSE%\nGPL\ncustom\n\n").unwrap();
        assert_eq!(record.license.as_deref(), Some("GPLcustom"));
        assert_eq!(record.licenses, vec!["GPL", "custom"]);
    }

    #[test]
    fn test_first_hyphen_split_keeps_second_segment() {
        let builder = PackageRecordBuilder::new("testing");
        let record = builder
            .build(parse_record("%NAME%\nfoo\n\n%VERSION%\n1.0-rc1-2\n\n"))
            .unwrap();

        assert_eq!(record.version, "1.0");
        assert_eq!(record.release, "rc1");
    }

    #[test]
    fn test_last_hyphen_split() {
        let builder = PackageRecordBuilder::new("testing").version_split(VersionSplit::LastHyphen);
        let record = builder
            .build(parse_record("%NAME%\nfoo\n\n%VERSION%\n1.0-rc1-2\n\n"))
            .unwrap();

        assert_eq!(record.version, "1.0-rc1");
        assert_eq!(record.release, "2");
    }

    #[test]
    fn test_split_policies_agree_on_single_hyphen() {
        for split in [VersionSplit::FirstHyphen, VersionSplit::LastHyphen] {
            assert_eq!(split.split("4.1-1"), Some(("4.1", "1")));
            assert_eq!(split.split("4.1"), None);
        }
    }
}
