/// Field normalization helpers used by every source.
///
/// This module contains:
/// - Date normalization (relative and absolute tokens)
/// - Slug helpers for the dedup key
/// - Regex-based salary / experience extraction
/// - Apply-link cleanup
///
/// IMPORTANT:
/// - Every function here is total. Absent or unparsable input
///   resolves to a documented default, never to an error.
/// - No source-specific selectors live here. Adapters decide
///   *what* text to hand over; this module decides what it means.
///
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::dedup::derive_key;
use crate::schema::{JobType, NormalizedPosting, RawPosting};

pub const DEFAULT_DESCRIPTION: &str = "Check company website for details";
pub const DEFAULT_IMAGE: &str = "/company-logos/default.png";
pub const NOT_DISCLOSED: &str = "Not disclosed";
pub const DEFAULT_EXPERIENCE: &str = "Fresher";
pub const DEFAULT_BATCH: &str = "N/A";

/// Query parameters that only carry click tracking.
/// Anything starting with `utm_` is dropped as well.
const TRACKING_PARAMS: [&str; 4] = ["refId", "trackingId", "trk", "trkInfo"];

static RELATIVE_DAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\+?\s+days?\b").expect("relative date pattern"));

static EXPERIENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+-\d+\s+years?\s+experience|fresher|entry level")
        .expect("experience pattern")
});

static SALARY_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)₹\d+(?:,\d+)*\s*-\s*₹\d+(?:,\d+)*(?:\s*(?:per|a)\s+year)?")
        .expect("salary pattern")
});

/// Turn a raw "date posted" token into a calendar date.
///
/// Accepted forms:
/// - "N day(s) ago" (also "30+ days ago") -> `now` minus N days
/// - RFC 3339 / RFC 2822 timestamps       -> their UTC date
/// - "YYYY-MM-DDTHH:MM:SS", "YYYY-MM-DD"
///
/// Anything else, including `None` and day counts that would
/// underflow the calendar, yields today's date.
///
pub fn normalize_date(raw: Option<&str>, now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();

    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return today;
    };

    if let Some(caps) = RELATIVE_DAYS.captures(raw) {
        return caps[1]
            .parse::<u64>()
            .ok()
            .and_then(|days| today.checked_sub_days(Days::new(days)))
            .unwrap_or(today);
    }

    parse_absolute(raw).unwrap_or(today)
}

fn parse_absolute(raw: &str) -> Option<NaiveDate> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(ts) = DateTime::parse_from_rfc2822(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(ts.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Company component of the dedup key.
///
/// Lowercases and removes every whitespace character, without
/// inserting separators:
/// - "Acme Corp"  -> "acmecorp"
///
pub fn slugify_company(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Generic slug used for the location and salary components.
///
/// Lowercase, trim, whitespace runs -> single '-', then drop
/// everything outside [A-Za-z0-9_-]:
/// - "  New Delhi, India " -> "new-delhi-india"
/// - "₹3,00,000 - ₹5,00,000" -> "300000---500000"
///
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// First experience hint found in the description, then the title.
pub fn extract_experience(description: &str, title: &str) -> String {
    [description, title]
        .into_iter()
        .find_map(|text| EXPERIENCE.find(text))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_EXPERIENCE.to_string())
}

/// First rupee range in `text`, e.g. "₹3,00,000 - ₹5,00,000 per year".
///
/// Returns the exact matched substring, including a trailing
/// "per year" / "a year" when present.
pub fn extract_salary_range(text: &str) -> Option<String> {
    SALARY_RANGE.find(text).map(|m| m.as_str().to_string())
}

/// How a source wants its apply links cleaned.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkPolicy {
    /// Base for resolving relative hrefs
    pub base: Option<&'static str>,

    /// Drop the whole query string, not only tracking parameters
    pub strip_all_query: bool,

    /// Upgrade plain http links; only for sources known to serve HTTPS
    pub force_https: bool,
}

/// Produce a stable absolute apply link.
///
/// Steps:
/// - resolve against `policy.base` when relative
/// - drop tracking parameters (or the whole query)
/// - drop the fragment
/// - collapse duplicate slashes in the path
/// - upgrade to https when the policy says so
///
/// Unparsable input falls back to the raw text cut at the first
/// '?' or '#'.
///
pub fn clean_link(raw: &str, policy: &LinkPolicy) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let parsed = match policy.base {
        Some(base) => Url::parse(base).and_then(|base| base.join(raw)),
        None => Url::parse(raw),
    };

    let Ok(mut url) = parsed else {
        return raw.split(['?', '#']).next().unwrap_or_default().to_string();
    };

    if policy.force_https && url.scheme() == "http" {
        let _ = url.set_scheme("https");
    }

    if policy.strip_all_query {
        url.set_query(None);
    } else {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(name, _)| !is_tracking_param(name))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(&kept);
        }
    }

    url.set_fragment(None);

    let path = collapse_slashes(url.path());
    url.set_path(&path);

    url.to_string()
}

fn is_tracking_param(name: &str) -> bool {
    TRACKING_PARAMS.contains(&name) || name.starts_with("utm_")
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Build the persisted record from one scraped element.
///
/// `now` is captured once per run so every posting of a run
/// resolves relative dates against the same instant.
pub fn normalize_posting(
    raw: &RawPosting,
    source: &str,
    policy: &LinkPolicy,
    now: DateTime<Utc>,
) -> NormalizedPosting {
    let description = non_empty(raw.description.as_deref());
    let salary = resolve_salary(raw.salary.as_deref(), description);

    let job_type = if description.is_some_and(|d| d.contains("Part-time")) {
        JobType::PartTime
    } else {
        JobType::FullTime
    };

    NormalizedPosting {
        company_slug: slugify_company(&raw.company),
        title: raw.title.trim().to_string(),
        description: description.unwrap_or(DEFAULT_DESCRIPTION).to_string(),
        apply_link: clean_link(&raw.link, policy),
        image_link: non_empty(raw.image.as_deref())
            .unwrap_or(DEFAULT_IMAGE)
            .to_string(),
        dedup_key: derive_key(&raw.company, &raw.location, salary.as_deref()),
        salary: salary.unwrap_or_else(|| NOT_DISCLOSED.to_string()),
        location: raw.location.trim().to_string(),
        job_type,
        experience: extract_experience(description.unwrap_or_default(), &raw.title),
        batch: DEFAULT_BATCH.to_string(),
        date_posted: normalize_date(raw.date_posted.as_deref(), now),
        source: source.to_string(),
    }
}

/// A dedicated salary element wins over the description.
fn resolve_salary(raw: Option<&str>, description: Option<&str>) -> Option<String> {
    match non_empty(raw) {
        Some(text) => Some(extract_salary_range(text).unwrap_or_else(|| text.to_string())),
        None => description.and_then(extract_salary_range),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
