//! Parsing of the site-management tool's semi-structured output.
//!
//! Two inputs are handled here: the tool's human-oriented `list` output
//! (sites and, in newer tool versions, a second services section) and the
//! line-delimited JSON of `docker-compose ps --format json`. Both parsers are
//! best-effort: malformed input yields a smaller result, never an error, and
//! the caller keeps the raw text for passthrough display.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Lifecycle state of a managed site as reported by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SiteStatus {
    Running,
    Stopped,
    Created,
    Unknown,
}

impl SiteStatus {
    /// Map a status token from the listing; anything unrecognized is `Unknown`.
    pub fn parse(token: &str) -> Self {
        if token.eq_ignore_ascii_case("running") {
            Self::Running
        } else if token.eq_ignore_ascii_case("stopped") {
            Self::Stopped
        } else if token.eq_ignore_ascii_case("created") {
            Self::Created
        } else {
            Self::Unknown
        }
    }
}

/// One site row from the tool listing, or a reconciled on-disk entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteRecord {
    pub name: String,
    pub status: SiteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_url: Option<String>,
}

/// Scanner position within the tool listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Banner/preamble before the sites header; everything is ignored.
    BeforeHeader,
    /// Inside the sites table.
    Sites,
    /// Inside the services table (tool versions that print one).
    Services,
}

/// Classification of a single listing line.
#[derive(Debug, PartialEq, Eq)]
pub enum ParsedLine<'line> {
    /// A data row: at least name and status, optionally local/domain URL.
    Entry {
        name: &'line str,
        status: SiteStatus,
        local_url: Option<&'line str>,
        domain_url: Option<&'line str>,
    },
    /// A header line that starts (or switches) a table section.
    SectionBoundary(Section),
    /// Blank lines, rule lines, column-header repeats, preamble.
    Skipped,
}

/// Column-header repeat, e.g. `Site       Status   ...`.
static COLUMN_HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(Site|Service)\s+Status\b").expect("valid column header regex"));

fn is_rule_line(trimmed: &str) -> bool {
    trimmed
        .chars()
        .all(|c| matches!(c, '-' | '─' | '━' | '═' | '='))
}

/// Classify one raw line given the current scanner section.
pub fn classify_line<'line>(line: &'line str, section: Section) -> ParsedLine<'line> {
    // Header markers differ between tool generations: "WordPress Sites:" and
    // "WordPress Sites & Services". Both open the sites table.
    if line.contains("WordPress Sites") {
        return ParsedLine::SectionBoundary(Section::Sites);
    }

    let trimmed = line.trim();
    if trimmed.is_empty() || is_rule_line(trimmed) {
        return ParsedLine::Skipped;
    }

    if COLUMN_HEADER_RE.is_match(trimmed) {
        // The services column header doubles as the section switch.
        if trimmed.starts_with("Service") {
            return ParsedLine::SectionBoundary(Section::Services);
        }
        return ParsedLine::Skipped;
    }

    if section == Section::BeforeHeader {
        return ParsedLine::Skipped;
    }

    let mut tokens = trimmed.split_whitespace();
    let (Some(name), Some(status)) = (tokens.next(), tokens.next()) else {
        return ParsedLine::Skipped;
    };
    ParsedLine::Entry {
        name,
        status: SiteStatus::parse(status),
        local_url: tokens.next(),
        domain_url: tokens.next(),
    }
}

/// Structured view of one `list` invocation.
///
/// `raw` carries the unparsed text so callers can always fall back to showing
/// the tool's own output.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Listing {
    pub sites: Vec<SiteRecord>,
    /// Rows of the services section; same column layout as sites.
    pub services: Vec<SiteRecord>,
    pub raw: String,
}

/// Parse the tool's `list` output with a single forward scan.
pub fn parse_listing(raw: &str) -> Listing {
    let mut section = Section::BeforeHeader;
    let mut listing = Listing {
        raw: raw.to_string(),
        ..Listing::default()
    };

    for line in raw.lines() {
        match classify_line(line, section) {
            ParsedLine::SectionBoundary(next) => section = next,
            ParsedLine::Entry {
                name,
                status,
                local_url,
                domain_url,
            } => {
                let record = SiteRecord {
                    name: name.to_string(),
                    status,
                    local_url: local_url.map(str::to_string),
                    domain_url: domain_url.map(str::to_string),
                };
                match section {
                    Section::Sites => listing.sites.push(record),
                    Section::Services => listing.services.push(record),
                    // classify_line never yields entries before the header.
                    Section::BeforeHeader => {}
                }
            }
            ParsedLine::Skipped => {}
        }
    }

    listing
}

/// Convenience wrapper when only site rows matter.
pub fn parse_sites(raw: &str) -> Vec<SiteRecord> {
    parse_listing(raw).sites
}

/// Running state of one compose-managed container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceStatus {
    Running,
    Stopped,
    Unknown,
}

impl ServiceStatus {
    fn parse(state: &str) -> Self {
        if state.eq_ignore_ascii_case("running") {
            Self::Running
        } else if state.eq_ignore_ascii_case("exited") || state.eq_ignore_ascii_case("stopped") {
            Self::Stopped
        } else {
            Self::Unknown
        }
    }
}

/// One compose service with the full original object preserved under `raw`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    pub name: String,
    pub status: ServiceStatus,
    pub raw: Value,
}

/// Decode `docker-compose ps --format json` output: one object per line.
///
/// A line that fails to decode is dropped without aborting the scan; a single
/// malformed line must not blank the whole response.
pub fn parse_compose_services(raw: &str) -> Vec<ServiceRecord> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let value: Value = match serde_json::from_str(line) {
                Ok(v) => v,
                Err(e) => {
                    debug!(error = %e, "Dropping undecodable compose line");
                    return None;
                }
            };
            if !value.is_object() {
                debug!("Dropping non-object compose line");
                return None;
            }
            let name = value
                .get("Service")
                .and_then(Value::as_str)
                .or_else(|| value.get("Name").and_then(Value::as_str))
                .unwrap_or_default()
                .to_string();
            let status = value
                .get("State")
                .and_then(Value::as_str)
                .map_or(ServiceStatus::Unknown, ServiceStatus::parse);
            Some(ServiceRecord { name, status, raw: value })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_LISTING: &str =
        "WordPress Sites:\nSite       Status\n─────────────\nblog       Running\n";

    #[test]
    fn parses_the_minimal_listing() {
        let sites = parse_sites(SIMPLE_LISTING);
        assert_eq!(
            sites,
            vec![SiteRecord {
                name: "blog".to_string(),
                status: SiteStatus::Running,
                local_url: None,
                domain_url: None,
            }]
        );
    }

    #[test]
    fn parsing_is_idempotent() {
        assert_eq!(parse_sites(SIMPLE_LISTING), parse_sites(SIMPLE_LISTING));
    }

    #[test]
    fn ignores_preamble_before_the_header() {
        let raw = "Some banner\nnoise here\nWordPress Sites:\nblog Running\n";
        let sites = parse_sites(raw);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].name, "blog");
    }

    #[test]
    fn captures_optional_url_columns() {
        let raw = "WordPress Sites & Services\n\
                   Site       Status    Local URL               Domain URL\n\
                   ──────────────────────────────────────────────────────\n\
                   blog       Running   http://localhost:8101   https://blog.test\n\
                   shop       Stopped   http://localhost:8102   https://shop.test\n";
        let sites = parse_sites(raw);
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].local_url.as_deref(), Some("http://localhost:8101"));
        assert_eq!(sites[0].domain_url.as_deref(), Some("https://blog.test"));
        assert_eq!(sites[1].status, SiteStatus::Stopped);
    }

    #[test]
    fn a_second_header_switches_to_the_services_section() {
        let raw = "WordPress Sites & Services\n\
                   Site       Status\n\
                   blog       Running\n\
                   \n\
                   Service    Status\n\
                   ─────────────\n\
                   mysql      Running\n\
                   mailhog    Stopped\n";
        let listing = parse_listing(raw);
        assert_eq!(listing.sites.len(), 1);
        assert_eq!(listing.sites[0].name, "blog");
        assert_eq!(listing.services.len(), 2);
        assert_eq!(listing.services[0].name, "mysql");
        assert_eq!(listing.services[1].status, SiteStatus::Stopped);
    }

    #[test]
    fn unrecognized_status_tokens_become_unknown() {
        let raw = "WordPress Sites:\nblog Exploded\n";
        assert_eq!(parse_sites(raw)[0].status, SiteStatus::Unknown);
    }

    #[test]
    fn raw_text_is_preserved() {
        let listing = parse_listing(SIMPLE_LISTING);
        assert_eq!(listing.raw, SIMPLE_LISTING);
    }

    #[test]
    fn empty_input_yields_an_empty_listing() {
        let listing = parse_listing("");
        assert!(listing.sites.is_empty());
        assert!(listing.services.is_empty());
    }

    #[test]
    fn one_bad_compose_line_does_not_blank_the_result() {
        let raw = concat!(
            r#"{"Service":"db","State":"running"}"#,
            "\n",
            "{not json at all",
            "\n",
            r#"{"Service":"web","State":"exited"}"#,
            "\n",
        );
        let services = parse_compose_services(raw);
        assert_eq!(services.len(), 2);
        assert_eq!(services[0].name, "db");
        assert_eq!(services[0].status, ServiceStatus::Running);
        assert_eq!(services[1].status, ServiceStatus::Stopped);
    }

    #[test]
    fn compose_name_falls_back_to_the_name_field() {
        let raw = r#"{"Name":"wp_blog_db_1","State":"running"}"#;
        let services = parse_compose_services(raw);
        assert_eq!(services[0].name, "wp_blog_db_1");
    }

    #[test]
    fn compose_non_object_lines_are_dropped() {
        let services = parse_compose_services("[1,2,3]\n42\n\"str\"\n");
        assert!(services.is_empty());
    }

    #[test]
    fn compose_raw_object_is_preserved() {
        let raw = r#"{"Service":"db","State":"running","Ports":"3306/tcp"}"#;
        let services = parse_compose_services(raw);
        assert_eq!(
            services[0].raw.get("Ports").and_then(Value::as_str),
            Some("3306/tcp")
        );
    }
}
