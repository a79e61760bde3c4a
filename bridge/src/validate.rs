//! Request input validation.
//!
//! Validation runs before any subprocess is constructed: a value that fails
//! here never reaches the runner. Together with discrete-argv spawning this
//! is the injection defense, so the character classes are deliberately tight.

use std::sync::LazyLock;

use regex::Regex;

static SITE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid site name regex"));

static FILE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-./:~]+$").expect("valid file path regex"));

/// Checks a site name against the allowed character class.
///
/// # Errors
///
/// Returns the user-facing rejection message when the name is empty or
/// contains anything outside letters, digits, hyphen, underscore.
pub fn site_name(name: &str) -> Result<(), &'static str> {
    if SITE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err("Invalid site name. Use only letters, numbers, hyphens, and underscores.")
    }
}

/// Checks an import/export file path against the allowed character class.
///
/// # Errors
///
/// Returns the user-facing rejection message when the path is empty or
/// contains characters outside the constrained set.
pub fn file_path(path: &str) -> Result<(), &'static str> {
    if FILE_PATH_RE.is_match(path) {
        Ok(())
    } else {
        Err("Invalid file path")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_names_from_the_allowed_class() {
        for name in ["blog", "my-site", "my_site", "Site01", "a"] {
            assert!(site_name(name).is_ok(), "should accept {name:?}");
        }
    }

    #[test]
    fn rejects_names_outside_the_allowed_class() {
        for name in ["", "a b", "a;rm", "../x", "site!", "a\n", "$(id)"] {
            assert!(site_name(name).is_err(), "should reject {name:?}");
        }
    }

    #[test]
    fn accepts_constrained_file_paths() {
        for path in ["backup.sql", "./dumps/site.sql", "~/dumps/a-b_c.sql", "c:/x"] {
            assert!(file_path(path).is_ok(), "should accept {path:?}");
        }
    }

    #[test]
    fn rejects_file_paths_with_shell_metacharacters() {
        for path in ["", "a b.sql", "dump.sql;rm -rf /", "$(id).sql", "a|b"] {
            assert!(file_path(path).is_err(), "should reject {path:?}");
        }
    }
}
