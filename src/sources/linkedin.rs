use log::debug;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::{
    config::SourceConfig,
    fetch::HeaderSet,
    normalize::LinkPolicy,
    schema::RawPosting,
};

use super::adapter::{FetchStrategy, ParseOutcome, SourceAdapter};
use super::{first_attr, first_text, is_entry_level, request_headers, selector};

const SEARCH_ENDPOINT: &str =
    "https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search";

/// Cards returned per page by the guest search API
const PAGE_SIZE: usize = 25;

/// LinkedIn guest job-search adapter
///
/// Endpoint:
/// https://www.linkedin.com/jobs-guest/jobs/api/seeMoreJobPostings/search
///
/// The endpoint returns an HTML fragment of `div.base-card` cards,
/// 25 per page, addressed with `start = page * 25`.
///
/// DESIGN:
/// - Pure page translation
/// - No fetching, no storage
pub struct LinkedInAdapter {
    cfg: SourceConfig,
    endpoint: Url,
    sel: Selectors,
}

struct Selectors {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    link: Selector,
    description: Selector,
    logo: Selector,
    time: Selector,
}

impl LinkedInAdapter {
    pub fn new(cfg: SourceConfig) -> anyhow::Result<Self> {
        let endpoint = Url::parse(cfg.url.as_deref().unwrap_or(SEARCH_ENDPOINT))?;

        let sel = Selectors {
            card: selector("div.base-card")?,
            title: selector(".base-search-card__title")?,
            company: selector(".base-search-card__subtitle")?,
            location: selector(".job-search-card__location")?,
            link: selector("a.base-card__full-link")?,
            description: selector(".job-search-card__description")?,
            logo: selector("img.artdeco-entity-image")?,
            time: selector("time")?,
        };

        Ok(Self { cfg, endpoint, sel })
    }

    /// One card -> one posting. `None` when title, company or link is missing.
    fn extract(&self, card: &ElementRef<'_>) -> Option<RawPosting> {
        let title = first_text(card, &self.sel.title)?;

        // Company names come wrapped in an anchor with newlines
        let company = first_text(card, &self.sel.company)?
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let image = card.select(&self.sel.logo).next().and_then(|img| {
            img.value()
                .attr("data-delayed-url")
                .or_else(|| img.value().attr("src"))
                .map(str::to_string)
        });

        Some(RawPosting {
            title,
            company,
            location: first_text(card, &self.sel.location).unwrap_or_default(),
            date_posted: first_attr(card, &self.sel.time, "datetime")
                .or_else(|| first_text(card, &self.sel.time)),
            salary: None,
            link: first_attr(card, &self.sel.link, "href")?,
            description: first_text(card, &self.sel.description),
            image,
        })
    }
}

impl SourceAdapter for LinkedInAdapter {
    fn name(&self) -> &str {
        &self.cfg.name
    }

    fn fetch_strategy(&self) -> FetchStrategy {
        FetchStrategy::Paginated {
            pages: self.cfg.pages,
            page_size: PAGE_SIZE,
        }
    }

    fn page_url(&self, page: usize) -> String {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("keywords", &self.cfg.keywords)
            .append_pair("location", &self.cfg.location)
            .append_pair("start", &(page * PAGE_SIZE).to_string());
        url.to_string()
    }

    fn headers(&self) -> HeaderSet {
        request_headers(&self.cfg)
    }

    fn link_policy(&self) -> LinkPolicy {
        LinkPolicy {
            base: Some("https://www.linkedin.com"),
            strip_all_query: true,
            force_https: true,
        }
    }

    fn parse(&self, body: &str) -> ParseOutcome {
        let document = Html::parse_document(body);
        let mut outcome = ParseOutcome::default();

        for card in document.select(&self.sel.card) {
            let Some(posting) = self.extract(&card) else {
                debug!("[{}] skipping card without title, company or link", self.cfg.name);
                outcome.skipped += 1;
                continue;
            };

            if self.cfg.fresher_only && !is_entry_level(&posting.title) {
                outcome.filtered += 1;
                continue;
            }

            outcome.postings.push(posting);
        }

        debug!(
            "[{}] parsed {} postings ({} skipped, {} filtered)",
            self.cfg.name,
            outcome.postings.len(),
            outcome.skipped,
            outcome.filtered
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::source_config;

    const FIXTURE: &str = r#"
<li>
  <div class="base-card">
    <a class="base-card__full-link" href="https://in.linkedin.com/jobs/view/software-developer-at-acme-101?refId=abc&amp;trackingId=xyz&amp;position=1"></a>
    <img class="artdeco-entity-image" data-delayed-url="https://media.licdn.com/acme.png">
    <h3 class="base-search-card__title">  Software Developer - Fresher </h3>
    <h4 class="base-search-card__subtitle"><a>
        Acme
        Corp
    </a></h4>
    <span class="job-search-card__location">Bengaluru, Karnataka, India</span>
    <time class="job-search-card__listdate" datetime="2026-03-05">5 days ago</time>
  </div>
</li>
<li>
  <div class="base-card">
    <a class="base-card__full-link" href="https://in.linkedin.com/jobs/view/qa-at-beta-102?refId=def"></a>
    <h3 class="base-search-card__title">Entry Level QA Tester</h3>
    <h4 class="base-search-card__subtitle">Beta Labs</h4>
    <span class="job-search-card__location">Pune, Maharashtra, India</span>
    <p class="job-search-card__description">Part-time, ₹3,00,000 - ₹5,00,000 per year</p>
  </div>
</li>
<li>
  <div class="base-card">
    <a class="base-card__full-link" href="https://in.linkedin.com/jobs/view/lead-at-gamma-103"></a>
    <h3 class="base-search-card__title">Lead Engineer</h3>
    <h4 class="base-search-card__subtitle">Gamma</h4>
    <span class="job-search-card__location">Remote</span>
  </div>
</li>
<li>
  <div class="base-card">
    <h3 class="base-search-card__title">Orphan Title</h3>
    <h4 class="base-search-card__subtitle">   </h4>
  </div>
</li>
"#;

    fn adapter(fresher_only: bool) -> LinkedInAdapter {
        let mut cfg = source_config("linkedin");
        cfg.pages = 3;
        cfg.keywords = "software developer".into();
        cfg.location = "India".into();
        cfg.fresher_only = fresher_only;
        LinkedInAdapter::new(cfg).unwrap()
    }

    #[test]
    fn paginates_in_steps_of_25() {
        let adapter = adapter(false);

        assert_eq!(adapter.page_count(), 3);
        let url = Url::parse(&adapter.page_url(2)).unwrap();
        let start = url
            .query_pairs()
            .find(|(name, _)| name == "start")
            .map(|(_, value)| value.into_owned());

        assert_eq!(start.as_deref(), Some("50"));
        assert!(url.as_str().starts_with(SEARCH_ENDPOINT));
    }

    #[test]
    fn parses_cards_and_skips_incomplete_ones() {
        let outcome = adapter(false).parse(FIXTURE);

        assert_eq!(outcome.postings.len(), 3);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.filtered, 0);

        let first = &outcome.postings[0];
        assert_eq!(first.title, "Software Developer - Fresher");
        assert_eq!(first.company, "Acme Corp");
        assert_eq!(first.location, "Bengaluru, Karnataka, India");
        assert_eq!(first.date_posted.as_deref(), Some("2026-03-05"));
        assert_eq!(first.image.as_deref(), Some("https://media.licdn.com/acme.png"));
        assert!(first.link.contains("trackingId=xyz"));

        let second = &outcome.postings[1];
        assert_eq!(second.date_posted, None);
        assert!(second.description.as_deref().unwrap().contains("₹3,00,000"));

        assert!(outcome.postings.iter().all(|p| !p.title.is_empty() && !p.company.is_empty()));
    }

    #[test]
    fn fresher_filter_excludes_senior_titles() {
        let outcome = adapter(true).parse(FIXTURE);

        let titles: Vec<_> = outcome.postings.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Software Developer - Fresher", "Entry Level QA Tester"]);
        assert_eq!(outcome.filtered, 1);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn cards_without_apply_link_are_skipped() {
        let body = r#"
<div class="base-card">
  <a class="base-card__full-link"></a>
  <h3 class="base-search-card__title">Graduate Engineer</h3>
  <h4 class="base-search-card__subtitle">Delta</h4>
</div>
<div class="base-card">
  <a class="base-card__full-link" href="https://in.linkedin.com/jobs/view/trainee-at-delta-104"></a>
  <h3 class="base-search-card__title">Trainee</h3>
  <h4 class="base-search-card__subtitle">Delta</h4>
</div>
"#;
        let outcome = adapter(false).parse(body);

        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.postings.len(), 1);
        assert_eq!(outcome.postings[0].title, "Trainee");
    }

    #[test]
    fn garbage_body_yields_nothing() {
        let outcome = adapter(false).parse("{\"not\": \"html\"}");
        assert!(outcome.postings.is_empty());
        assert_eq!(outcome.skipped, 0);
    }
}
