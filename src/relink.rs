//! Symlink relocation: rewrite absolute symlinks as bundle-relative links.
//!
//! Every absolute symlink in the bundle either points at the host C runtime
//! (left alone, so it resolves against the host's libc at run time) or is
//! relocated: the target is copied into the bundle if it is not already
//! there, and the link is rewritten as a path relative to its own directory
//! so the bundle can move anywhere.
//!
//! Chains are followed a single hop only: relocation maps the link's
//! immediate target, and the copy step (`fs::copy`) dereferences the
//! source, so copying a symlink target materializes the final file's
//! content. Metadata is not preserved.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::exclusions::{ExclusionProvider, ExclusionSet};
use crate::logging::{Logger, PassTimer};
use crate::paths::{map_into_bundle, relative_from};
use crate::walk::visit_entries;

/// What one relocation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelinkSummary {
    /// Links rewritten to relative targets.
    pub relinked: usize,
    /// Files copied into the bundle from the host.
    pub copied_in: usize,
    /// Links left absolute because their target is owned by the C runtime.
    pub skipped_excluded: usize,
}

/// Relocate every absolute, non-excluded symlink under `bundle_root`.
///
/// The exclusion set is obtained once from `provider`; a provider failure
/// aborts the pass before any filesystem mutation. A dangling target (the
/// absolute target exists neither in the bundle nor on the host) is fatal:
/// it is surfaced, not skipped, since a missing mapped dependency would
/// break the bundle at run time.
///
/// Relative symlinks are already bundle-local and are left untouched, so a
/// second run over the same tree reports no further changes.
///
/// # Errors
///
/// Returns an error if the exclusion set cannot be obtained, if a link
/// target is dangling, or on any filesystem failure. An error aborts the
/// pass, possibly leaving the bundle partially relocated; the caller must
/// treat a failed run as a failed bundle build.
pub fn relink_symlinks(
    bundle_root: &Path,
    provider: &dyn ExclusionProvider,
    log: &dyn Logger,
) -> Result<RelinkSummary> {
    let exclusions = provider
        .get()
        .context("failed to obtain the C runtime exclusion set")?;

    let _timer = PassTimer::start("update symlinks", log);
    log.info(&format!("Updating symlinks in {}", bundle_root.display()));

    let mut summary = RelinkSummary::default();
    visit_entries(bundle_root, &mut |path| {
        if path.is_symlink() {
            relink_entry(bundle_root, path, &exclusions, log, &mut summary)?;
        }
        Ok(())
    })?;
    Ok(summary)
}

/// Classify one symlink and rewrite it if it is a relocation candidate.
fn relink_entry(
    bundle_root: &Path,
    link_path: &Path,
    exclusions: &ExclusionSet,
    log: &dyn Logger,
    summary: &mut RelinkSummary,
) -> Result<()> {
    let raw_target = fs::read_link(link_path)
        .with_context(|| format!("Failed to read symlink: {}", link_path.display()))?;

    // Relative links are bundle-local by construction.
    if !raw_target.is_absolute() {
        return Ok(());
    }

    if exclusions.contains(&raw_target) {
        log.info(&format!(
            "Skipping {}: target {} belongs to the host C runtime",
            link_path.display(),
            raw_target.display()
        ));
        summary.skipped_excluded += 1;
        return Ok(());
    }

    log.info(&format!(
        "Symlink: {} points to: {}",
        link_path.display(),
        raw_target.display()
    ));

    let mapped = map_into_bundle(bundle_root, &raw_target);

    // The link can occupy the exact spot where its target belongs in the
    // bundle. Relinking would then produce a link pointing at its own name,
    // so materialize the file instead.
    if mapped.as_path() == link_path {
        ensure_host_target(&raw_target, link_path)?;
        log.info(&format!(
            "Link occupies its own bundle location, replacing with a copy of {}",
            raw_target.display()
        ));
        fs::remove_file(link_path)
            .with_context(|| format!("Failed to remove symlink: {}", link_path.display()))?;
        copy_into_bundle(&raw_target, &mapped)?;
        summary.copied_in += 1;
        return Ok(());
    }

    if mapped.exists() || mapped.is_symlink() {
        log.info(&format!(
            "Linked file is already in bundle at {}, updating symlink",
            mapped.display()
        ));
    } else {
        ensure_host_target(&raw_target, link_path)?;
        log.info("Linked file is not in bundle, copying and updating symlink");
        if let Some(parent) = mapped.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        copy_into_bundle(&raw_target, &mapped)?;
        summary.copied_in += 1;
    }

    let link_dir = link_path
        .parent()
        .with_context(|| format!("Symlink has no parent directory: {}", link_path.display()))?;
    let relative = relative_from(&mapped, link_dir);
    log.info(&format!(
        "Relinking {} -> {}",
        link_path.display(),
        relative.display()
    ));

    // Remove-then-create for a single link is a critical section; the pass
    // is single-threaded, so nothing observes the gap.
    fs::remove_file(link_path)
        .with_context(|| format!("Failed to remove symlink: {}", link_path.display()))?;
    std::os::unix::fs::symlink(&relative, link_path).with_context(|| {
        format!(
            "Failed to create symlink {} -> {}",
            link_path.display(),
            relative.display()
        )
    })?;
    summary.relinked += 1;
    Ok(())
}

fn copy_into_bundle(source: &Path, dest: &Path) -> Result<()> {
    fs::copy(source, dest)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), dest.display()))?;
    Ok(())
}

/// A target that exists nowhere is fatal for the link.
fn ensure_host_target(raw_target: &Path, link_path: &Path) -> Result<()> {
    if !raw_target.exists() {
        bail!(
            "Symlink target does not exist on the host: {} (required by {})",
            raw_target.display(),
            link_path.display()
        );
    }
    Ok(())
}
