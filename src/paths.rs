//! Bundle path arithmetic.
//!
//! Pure, lexical path math: nothing in this module touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Map an absolute host path to its location inside the bundle.
///
/// The leading separator of `target` is stripped and the remainder joined
/// under `bundle_root`: `/usr/lib/libfoo.so` inside bundle `/b` maps to
/// `/b/usr/lib/libfoo.so`.
#[must_use = "computed bundle path should be used"]
pub fn map_into_bundle(bundle_root: &Path, target: &Path) -> PathBuf {
    let relative = target.strip_prefix("/").unwrap_or(target);
    bundle_root.join(relative)
}

/// Compute the path of `target` relative to the directory `start`.
///
/// Both paths must be absolute. `.` and `..` segments are resolved
/// lexically; symlinks are not followed. `start` is treated as a directory,
/// so the result joined onto `start` points at `target`.
#[must_use = "computed relative path should be used"]
pub fn relative_from(target: &Path, start: &Path) -> PathBuf {
    let target = normalize_lexically(target);
    let start = normalize_lexically(start);

    let target_parts: Vec<Component> = target.components().collect();
    let start_parts: Vec<Component> = start.components().collect();

    let common = target_parts
        .iter()
        .zip(&start_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..start_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    relative
}

/// Resolve `.` and `..` components without touching the filesystem.
///
/// `..` at the root is dropped rather than rejected, matching how the
/// kernel resolves `/..`.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            _ => resolved.push(component.as_os_str()),
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_into_bundle_strips_leading_separator() {
        assert_eq!(
            map_into_bundle(Path::new("/b"), Path::new("/usr/lib/libfoo.so")),
            PathBuf::from("/b/usr/lib/libfoo.so")
        );
    }

    #[test]
    fn test_map_into_bundle_nested_bundle_root() {
        assert_eq!(
            map_into_bundle(
                Path::new("/tmp/bundle"),
                Path::new("/lib/x86_64-linux-gnu/libm.so.6")
            ),
            PathBuf::from("/tmp/bundle/lib/x86_64-linux-gnu/libm.so.6")
        );
    }

    #[test]
    fn test_relative_from_same_directory() {
        assert_eq!(
            relative_from(Path::new("/b/usr/lib/libfoo.so"), Path::new("/b/usr/lib")),
            PathBuf::from("libfoo.so")
        );
    }

    #[test]
    fn test_relative_from_sibling_directory() {
        assert_eq!(
            relative_from(Path::new("/b/usr/lib64/libbar.so"), Path::new("/b/usr/lib")),
            PathBuf::from("../lib64/libbar.so")
        );
    }

    #[test]
    fn test_relative_from_deeper_start() {
        assert_eq!(
            relative_from(Path::new("/b/lib/libz.so"), Path::new("/b/opt/app/bin")),
            PathBuf::from("../../../lib/libz.so")
        );
    }

    #[test]
    fn test_relative_from_root_start() {
        assert_eq!(
            relative_from(Path::new("/usr/lib/libfoo.so"), Path::new("/")),
            PathBuf::from("usr/lib/libfoo.so")
        );
    }

    #[test]
    fn test_relative_from_identical_paths() {
        assert_eq!(
            relative_from(Path::new("/b/usr"), Path::new("/b/usr")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_relative_from_resolves_dot_segments() {
        assert_eq!(
            relative_from(
                Path::new("/b/usr/./lib/../lib64/libssl.so"),
                Path::new("/b/usr/lib")
            ),
            PathBuf::from("../lib64/libssl.so")
        );
    }

    #[test]
    fn test_relative_joins_back_to_target() {
        let target = Path::new("/b/opt/app/lib/libapp.so");
        let start = Path::new("/b/usr/lib");
        let relative = relative_from(target, start);
        assert_eq!(normalize_lexically(&start.join(&relative)), target);
    }
}
