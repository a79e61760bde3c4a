//! Watch exclusions.
//!
//! Paths matching these globs never reach the debouncer: build artifacts,
//! version-control metadata, logs, and upload directories churn constantly
//! and must not trigger cache clears or reloads.

use std::path::Path;

use eyre::WrapErr as _;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

/// Compiled gitignore-style exclusion globs.
pub struct IgnoreRules {
    matcher: Gitignore,
}

impl IgnoreRules {
    /// Compile the configured glob lines.
    ///
    /// # Errors
    ///
    /// Returns an error when a glob line does not parse.
    pub fn new(globs: &[String]) -> eyre::Result<Self> {
        let mut builder = GitignoreBuilder::new("/");
        for glob in globs {
            builder
                .add_line(None, glob)
                .wrap_err(format!("Invalid ignore glob: {glob}"))?;
        }
        let matcher = builder.build().wrap_err("Failed to compile ignore globs")?;
        Ok(Self { matcher })
    }

    /// Whether `path` (or any of its parent directories) is excluded.
    pub fn is_ignored(&self, path: &Path) -> bool {
        self.matcher
            .matched_path_or_any_parents(path, false)
            .is_ignore()
    }
}
