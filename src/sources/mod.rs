//! Source adapter registry and shared scraping helpers
//!
//! This module provides:
//! - Central registration of all supported listing sources
//! - A factory resolving adapters from source configuration
//! - Small HTML helpers every adapter uses
//!
//! Site-specific selectors live in the adapter modules. The rest of
//! the application talks to sources only through `SourceAdapter`.

pub mod adapter;
mod linkedin;
mod naukri;

use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::random_range;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::config::SourceConfig;
use crate::fetch::HeaderSet;
use adapter::SourceAdapter;

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const USER_AGENTS: [&str; 4] = [
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];

static ENTRY_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)fresher|entry level|0-2 years").expect("entry level pattern"));

static SENIOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)senior|manager|lead|sr\.").expect("seniority pattern"));

/// Resolve the adapter for one configured source.
///
/// CONTRACT:
/// - `cfg.adapter` selects the implementation
/// - `cfg.name` becomes the adapter's `name()`
///
/// Unknown kinds are an error; the caller decides whether that
/// skips the source or aborts startup.
pub fn build_adapter(cfg: &SourceConfig) -> anyhow::Result<Arc<dyn SourceAdapter>> {
    match cfg.adapter.as_str() {
        "linkedin" => Ok(Arc::new(linkedin::LinkedInAdapter::new(cfg.clone())?)),
        "naukri" => Ok(Arc::new(naukri::NaukriAdapter::new(cfg.clone())?)),
        other => anyhow::bail!("unknown adapter kind '{other}'"),
    }
}

/// Headers for one request to `cfg`'s source.
///
/// Configured headers are sent as is. Without a configured
/// User-Agent a fixed browser one is added; with rotation on, a
/// random one replaces it.
pub(crate) fn request_headers(cfg: &SourceConfig) -> HeaderSet {
    let mut headers: HeaderSet = cfg
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let has_user_agent = |headers: &HeaderSet| {
        headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
    };

    if cfg.rotate_user_agent {
        headers.retain(|(name, _)| !name.eq_ignore_ascii_case("user-agent"));
        let agent = USER_AGENTS[random_range(0..USER_AGENTS.len())];
        headers.push(("User-Agent".to_string(), agent.to_string()));
    } else if !has_user_agent(&headers) {
        headers.push(("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()));
    }

    headers
}

/// Fresher relevance filter shared by sources that opt in.
pub(crate) fn is_entry_level(title: &str) -> bool {
    ENTRY_LEVEL.is_match(title) && !SENIOR.is_match(title)
}

pub(crate) fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {css:?}: {e:?}"))
}

/// Trimmed text of the first match, if non-empty.
pub(crate) fn first_text(el: &ElementRef<'_>, sel: &Selector) -> Option<String> {
    el.select(sel)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Attribute of the first match, if non-empty.
pub(crate) fn first_attr(el: &ElementRef<'_>, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .next()
        .and_then(|node| node.value().attr(attr))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) fn source_config(adapter: &str) -> SourceConfig {
    SourceConfig {
        name: format!("{adapter} test"),
        adapter: adapter.to_string(),
        enabled: true,
        url: None,
        pages: 1,
        keywords: String::new(),
        location: String::new(),
        fresher_only: false,
        headers: Default::default(),
        rotate_user_agent: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_known_kinds() {
        let linkedin = build_adapter(&source_config("linkedin")).unwrap();
        assert_eq!(linkedin.name(), "linkedin test");

        let naukri = build_adapter(&source_config("naukri")).unwrap();
        assert_eq!(naukri.page_count(), 1);

        assert!(build_adapter(&source_config("monster")).is_err());
    }

    #[test]
    fn fixed_headers_get_a_default_user_agent() {
        let mut cfg = source_config("naukri");
        cfg.headers.insert("Accept-Language".into(), "en-US".into());

        let headers = request_headers(&cfg);

        assert_eq!(headers.len(), 2);
        assert!(headers.contains(&("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())));
    }

    #[test]
    fn rotation_replaces_configured_user_agent() {
        let mut cfg = source_config("linkedin");
        cfg.headers.insert("user-agent".into(), "custom".into());
        cfg.rotate_user_agent = true;

        let headers = request_headers(&cfg);
        let agents: Vec<_> = headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("user-agent"))
            .collect();

        assert_eq!(agents.len(), 1);
        assert!(USER_AGENTS.contains(&agents[0].1.as_str()));
    }

    #[test]
    fn entry_level_filter() {
        assert!(is_entry_level("Software Developer - Fresher"));
        assert!(is_entry_level("Entry Level QA Tester"));
        assert!(!is_entry_level("Senior Developer (fresher mentoring)"));
        assert!(!is_entry_level("Backend Engineer"));
    }
}
