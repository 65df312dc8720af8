//! Host C runtime exclusion set.
//!
//! Symlinks pointing into the C runtime are deliberately left alone: libc is
//! never bundled, and applications must resolve it against the host's copy
//! at run time. The set of paths owned by the C runtime package is obtained
//! from the host package database, by default via `dpkg -L libc6`.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Set of absolute paths the relocator must never re-home.
///
/// Computed once per relocation run and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    paths: HashSet<PathBuf>,
}

impl ExclusionSet {
    /// Build a set from an explicit list of paths.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `target` is owned by the excluded package.
    #[must_use]
    pub fn contains(&self, target: &Path) -> bool {
        self.paths.contains(target)
    }

    /// Number of excluded paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the set excludes nothing.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Source of the exclusion set, queried once per relocation run.
///
/// The production implementation is [`DpkgExclusions`]; tests usually pass
/// a fixed [`ExclusionSet`] instead.
pub trait ExclusionProvider {
    /// Produce the set of paths to exclude.
    ///
    /// # Errors
    ///
    /// A failure here is a hard precondition failure for the relocation
    /// pass: it aborts before any filesystem mutation and is not retried.
    fn get(&self) -> Result<ExclusionSet>;
}

/// A fixed set is its own provider.
impl ExclusionProvider for ExclusionSet {
    fn get(&self) -> Result<ExclusionSet> {
        Ok(self.clone())
    }
}

/// Queries the host package database with `dpkg -L` for the file manifest
/// of a single package.
#[derive(Debug, Clone)]
pub struct DpkgExclusions {
    package: String,
}

impl DpkgExclusions {
    /// Exclusions for the host C runtime package (`libc6`).
    pub fn libc() -> Self {
        Self::for_package("libc6")
    }

    /// Exclusions for an arbitrary package.
    pub fn for_package(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }
}

impl ExclusionProvider for DpkgExclusions {
    fn get(&self) -> Result<ExclusionSet> {
        let output = Command::new("dpkg")
            .args(["-L"])
            .arg(&self.package)
            .output()
            .context("dpkg command not found - cannot query the host package database")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("dpkg -L {} failed: {}", self.package, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_dpkg_listing(&stdout))
    }
}

/// Parse `dpkg -L` output into an exclusion set.
///
/// Example output:
/// ```text
/// /.
/// /lib
/// /lib/x86_64-linux-gnu
/// /lib/x86_64-linux-gnu/libc.so.6
/// ```
///
/// Lines that are not absolute paths (blank lines, `diverted by ...` notes)
/// are ignored.
pub fn parse_dpkg_listing(output: &str) -> ExclusionSet {
    let paths = output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('/'))
        .map(PathBuf::from)
        .collect();
    ExclusionSet { paths }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dpkg_listing() {
        let output = "/.\n/lib\n/lib/x86_64-linux-gnu\n/lib/x86_64-linux-gnu/libc.so.6\n";
        let set = parse_dpkg_listing(output);
        assert!(set.contains(Path::new("/lib/x86_64-linux-gnu/libc.so.6")));
        assert!(set.contains(Path::new("/lib")));
        assert!(!set.contains(Path::new("/usr/lib/libfoo.so")));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_parse_dpkg_listing_skips_non_paths() {
        let output = "/lib/ld-linux.so.2\ndiverted by base-files to: /lib64\n\n";
        let set = parse_dpkg_listing(output);
        assert_eq!(set.len(), 1);
        assert!(set.contains(Path::new("/lib/ld-linux.so.2")));
    }

    #[test]
    fn test_parse_dpkg_listing_empty() {
        let set = parse_dpkg_listing("");
        assert!(set.is_empty());
    }

    #[test]
    fn test_fixed_set_is_its_own_provider() {
        let set = ExclusionSet::from_paths(["/lib/libc.so.6"]);
        let fetched = set.get().unwrap();
        assert!(fetched.contains(Path::new("/lib/libc.so.6")));
        assert_eq!(fetched, set);
    }
}
