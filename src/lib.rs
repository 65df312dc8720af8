//! Post-processing passes that make application bundles relocatable.
//!
//! After an application tree and its shared libraries are copied into a
//! self-contained bundle, absolute symlinks still point at the host
//! filesystem and script shebangs still name build-time interpreter paths.
//! [`relink_symlinks`] rewrites every absolute, non-excluded symlink as a
//! bundle-relative link, copying missing targets into the bundle, and
//! [`rewrite_shebangs`] switches python interpreter directives to the
//! `/usr/bin/env` form. Links into the host C runtime are deliberately
//! preserved - libc is never bundled and must resolve against the host.

mod exclusions;
mod logging;
mod paths;
mod relink;
mod shebang;
mod walk;

pub use exclusions::{parse_dpkg_listing, DpkgExclusions, ExclusionProvider, ExclusionSet};
pub use logging::{Logger, NullLogger, PassTimer, StderrLogger};
pub use paths::{map_into_bundle, relative_from};
pub use relink::{relink_symlinks, RelinkSummary};
pub use shebang::{rewrite_shebang_line, rewrite_shebangs};
