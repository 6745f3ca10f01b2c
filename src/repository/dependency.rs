// src/repository/dependency.rs

//! Dependency string parsing
//!
//! A dependency string is a package name optionally followed by a version
//! comparison, e.g. `glibc>=2.17` or `readline`.

use crate::error::{Error, Result};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::warn;

/// Leading run of lowercase alphanumerics and hyphens, then the constraint
static DEPENDENCY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z0-9-]+)(.*)$").expect("dependency pattern is valid"));

/// A parsed dependency: package name plus version constraint (possibly empty)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencySpec {
    pub name: String,
    pub constraint: String,
}

impl DependencySpec {
    /// Split a dependency string, or `None` if it does not start with a valid name
    ///
    /// The split is purely lexical: `libstdc++` yields name `libstdc` with
    /// constraint `++`, and `python3.11` yields `python3` / `.11`.
    pub fn parse(spec: &str) -> Option<Self> {
        let caps = DEPENDENCY_PATTERN.captures(spec)?;
        Some(Self {
            name: caps[1].to_string(),
            constraint: caps[2].to_string(),
        })
    }
}

/// What to do with a dependency string that does not parse
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DependencyPolicy {
    /// Abort the whole run
    #[default]
    Strict,
    /// Log a warning and skip the entry
    Lenient,
}

/// Parse the dependency list of `package`, dropping self-dependencies
pub fn resolve_dependencies(
    package: &str,
    specs: &[String],
    policy: DependencyPolicy,
) -> Result<Vec<DependencySpec>> {
    let mut resolved = Vec::with_capacity(specs.len());

    for spec in specs {
        let Some(dep) = DependencySpec::parse(spec) else {
            match policy {
                DependencyPolicy::Strict => {
                    return Err(Error::MalformedDependency {
                        package: package.to_string(),
                        spec: spec.clone(),
                    });
                }
                DependencyPolicy::Lenient => {
                    warn!("Package {} has malformed dependency '{}', skipping", package, spec);
                    continue;
                }
            }
        };

        if dep.name == package {
            warn!("Package {} has a depend on itself", package);
            continue;
        }

        resolved.push(dep);
    }

    Ok(resolved)
}
