//! Shared tree-walk scaffolding for the two passes.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Visit every entry under `dir`, depth-first.
///
/// The callback sees files, directories and symlinks alike; a directory's
/// contents are visited after the directory itself. Symlinked directories
/// are passed to the callback but never descended into, so a link cycle
/// cannot hang the walk. Each directory listing is snapshotted before its
/// entries are processed, which keeps in-place symlink replacement from
/// racing the iteration.
pub(crate) fn visit_entries<F>(dir: &Path, visit: &mut F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;

    for entry in entries {
        let path = entry.path();
        visit(&path)?;
        if path.is_dir() && !path.is_symlink() {
            visit_entries(&path, visit)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    #[test]
    fn test_visits_nested_entries_once() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/file"), "x").unwrap();

        let mut seen = Vec::new();
        visit_entries(root, &mut |path| {
            seen.push(path.to_path_buf());
            Ok(())
        })
        .unwrap();

        assert!(seen.contains(&root.join("a")));
        assert!(seen.contains(&root.join("a/b")));
        assert!(seen.contains(&root.join("a/b/file")));
        assert_eq!(seen.len(), 3, "each entry visited exactly once: {seen:?}");
    }

    #[test]
    fn test_does_not_descend_through_symlinked_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/file"), "x").unwrap();
        symlink("..", root.join("sub/loop")).unwrap();

        let mut count = 0usize;
        visit_entries(root, &mut |_| {
            count += 1;
            Ok(())
        })
        .unwrap();

        // sub, sub/file, sub/loop - the cycle is not followed
        assert_eq!(count, 3);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let result = visit_entries(&temp.path().join("absent"), &mut |_| Ok(()));
        assert!(result.is_err());
    }
}
