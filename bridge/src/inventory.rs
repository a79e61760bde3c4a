//! On-disk site discovery and inventory reconciliation.
//!
//! The external tool's bookkeeping and the filesystem can disagree: a site
//! directory may exist that the tool does not report (half-created, or
//! created outside the tool). The reconciler merges the two views so every
//! directory-backed site shows up exactly once, without ever dropping a
//! record the tool did report.

use std::io;
use std::path::Path;

use tracing::warn;

use crate::parser::{SiteRecord, SiteStatus};

/// URL marker for sites discovered on disk but unreported by the tool.
pub const NOT_CONFIGURED: &str = "Not configured";

/// Scan `root` for site directories named `<prefix><name>`.
///
/// Returns the bare site names in lexicographic order so reconciliation output
/// is deterministic across platforms.
///
/// # Errors
///
/// Returns an error when `root` cannot be read at all; unreadable single
/// entries are skipped.
pub fn scan_site_dirs(root: &Path, prefix: &str) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.path().is_dir() {
            continue;
        }
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if let Some(site) = name.strip_prefix(prefix)
            && !site.is_empty()
        {
            names.push(site.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Merge the parsed inventory with on-disk site names.
///
/// Parsed records keep their original order and are never removed, even when
/// their directory is missing (a site may exist only in the tool's
/// bookkeeping mid-creation). Each on-disk site absent from the parsed list
/// is appended as a synthetic `Unknown` record with the
/// [`NOT_CONFIGURED`] URL marker.
pub fn reconcile(mut parsed: Vec<SiteRecord>, on_disk: &[String]) -> Vec<SiteRecord> {
    for site in on_disk {
        if parsed.iter().any(|record| &record.name == site) {
            continue;
        }
        parsed.push(SiteRecord {
            name: site.clone(),
            status: SiteStatus::Unknown,
            local_url: Some(NOT_CONFIGURED.to_string()),
            domain_url: None,
        });
    }
    parsed
}
