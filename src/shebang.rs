//! Shebang rewriting: point python scripts at `/usr/bin/env`.
//!
//! Bundled scripts carry interpreter directives fixed at build time
//! (`#!/usr/bin/python3`); inside a relocated bundle the interpreter lives
//! elsewhere, so the directive is rewritten to resolve the interpreter from
//! the environment's search path instead.
//!
//! `env` accepts no interpreter arguments, so a directive such as
//! `#!/usr/bin/python3 -u` is rewritten to a form that cannot execute
//! (`#!/usr/bin/env python3 -u`). Known limitation, kept for parity with
//! the established bundle format rather than silently fixed.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::logging::{Logger, PassTimer};
use crate::walk::visit_entries;

/// The versioned interpreter is checked first so `#!/usr/bin/python3` is
/// never downgraded to `#!/usr/bin/env python`.
const INTERPRETERS: [(&str, &str); 2] = [
    ("python3", "#!/usr/bin/env python3"),
    ("python", "#!/usr/bin/env python"),
];

/// Rewrite python interpreter directives under `root`.
///
/// Scans every regular, non-symlink file. A file whose bytes are not valid
/// UTF-8 is treated as binary and left untouched. At most the first line is
/// rewritten; everything after it is preserved byte for byte, and a file is
/// only written back when its content actually changes. Returns the number
/// of files whose first line matched.
///
/// # Errors
///
/// Returns an error on any filesystem failure. Undecodable files are not
/// errors.
pub fn rewrite_shebangs(root: &Path, log: &dyn Logger) -> Result<usize> {
    let _timer = PassTimer::start("update shebangs", log);
    log.info("Starting shebang update...");

    let mut matched = 0usize;
    visit_entries(root, &mut |path| {
        if path.is_file() && !path.is_symlink() {
            matched += rewrite_file(path, log)?;
        }
        Ok(())
    })?;
    Ok(matched)
}

/// Rewrite one file. Returns 1 if its first line matched, 0 otherwise.
fn rewrite_file(path: &Path, log: &dyn Logger) -> Result<usize> {
    let contents =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    // Binary file, not an error.
    let Ok(text) = std::str::from_utf8(&contents) else {
        return Ok(0);
    };

    let (first_line, rest) = match text.find('\n') {
        Some(index) => text.split_at(index),
        None => (text, ""),
    };

    let Some(replacement) = rewrite_shebang_line(first_line) else {
        return Ok(0);
    };

    log.info(&format!("Found shebang in {}", path.display()));
    if replacement != first_line {
        let new_contents = format!("{replacement}{rest}");
        fs::write(path, new_contents)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
    }
    Ok(1)
}

/// Rewrite a single interpreter directive line, if it matches.
///
/// Two ordered checks, versioned before unversioned. Anything after the
/// interpreter name survives verbatim - see the module docs for why that is
/// wrong for argument-carrying directives.
pub fn rewrite_shebang_line(line: &str) -> Option<String> {
    if !line.starts_with("#!") {
        return None;
    }
    for (interpreter, replacement) in INTERPRETERS {
        if let Some(index) = line.find(interpreter) {
            let rest = &line[index + interpreter.len()..];
            return Some(format!("{replacement}{rest}"));
        }
    }
    None
}
