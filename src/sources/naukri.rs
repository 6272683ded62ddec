use log::debug;
use scraper::{ElementRef, Html, Selector};

use crate::{
    config::SourceConfig,
    fetch::HeaderSet,
    normalize::LinkPolicy,
    schema::RawPosting,
};

use super::adapter::{FetchStrategy, ParseOutcome, SourceAdapter};
use super::{first_attr, first_text, is_entry_level, request_headers, selector};

const LISTING_URL: &str = "https://www.naukri.com/fresher-software-developer-jobs-in-india";

/// Naukri listing-page adapter
///
/// One server-rendered listing page per run. Job tuples are
/// `article.jobTuple` on current markup, `div.jobTuple` on older.
///
/// Hrefs are often relative and carry search-context query
/// parameters, so the whole query string is dropped.
pub struct NaukriAdapter {
    cfg: SourceConfig,
    sel: Selectors,
}

struct Selectors {
    tuple: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    salary: Selector,
    date: Selector,
    description: Selector,
}

impl NaukriAdapter {
    pub fn new(cfg: SourceConfig) -> anyhow::Result<Self> {
        let sel = Selectors {
            tuple: selector("article.jobTuple, div.jobTuple")?,
            title: selector("a.title")?,
            company: selector("a.subTitle")?,
            location: selector(".location")?,
            salary: selector(".salary")?,
            date: selector(".date")?,
            description: selector(".job-description")?,
        };

        Ok(Self { cfg, sel })
    }

    fn extract(&self, tuple: &ElementRef<'_>) -> Option<RawPosting> {
        Some(RawPosting {
            title: first_text(tuple, &self.sel.title)?,
            company: first_text(tuple, &self.sel.company)?,
            location: first_text(tuple, &self.sel.location).unwrap_or_default(),
            date_posted: first_text(tuple, &self.sel.date),
            salary: first_text(tuple, &self.sel.salary),
            link: first_attr(tuple, &self.sel.title, "href")?,
            description: first_text(tuple, &self.sel.description),
            image: None,
        })
    }
}

impl SourceAdapter for NaukriAdapter {
    fn name(&self) -> &str {
        &self.cfg.name
    }

    fn fetch_strategy(&self) -> FetchStrategy {
        FetchStrategy::SinglePage
    }

    fn page_url(&self, _page: usize) -> String {
        self.cfg.url.clone().unwrap_or_else(|| LISTING_URL.to_string())
    }

    fn headers(&self) -> HeaderSet {
        request_headers(&self.cfg)
    }

    fn link_policy(&self) -> LinkPolicy {
        LinkPolicy {
            base: Some("https://www.naukri.com"),
            strip_all_query: true,
            force_https: true,
        }
    }

    fn parse(&self, body: &str) -> ParseOutcome {
        let document = Html::parse_document(body);
        let mut outcome = ParseOutcome::default();

        for tuple in document.select(&self.sel.tuple) {
            let Some(posting) = self.extract(&tuple) else {
                debug!("[{}] skipping tuple - missing title, company or link", self.cfg.name);
                outcome.skipped += 1;
                continue;
            };

            if self.cfg.fresher_only && !is_entry_level(&posting.title) {
                outcome.filtered += 1;
                continue;
            }

            outcome.postings.push(posting);
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::source_config;

    const FIXTURE: &str = r#"
<html><body>
  <article class="jobTuple">
    <a class="title" href="/job-listings-software-developer-acme-pune-0-to-1-years-110?src=jobsearchDesk&sid=1">Software Developer</a>
    <a class="subTitle">Acme Corp</a>
    <span class="location">Pune</span>
    <span class="salary">Not disclosed</span>
    <span class="date">3 Days Ago</span>
    <div class="job-description">Freshers welcome. 0-1 years experience.</div>
  </article>
  <div class="jobTuple">
    <a class="title" href="https://www.naukri.com/job-listings-trainee-beta-111">Graduate Trainee</a>
    <a class="subTitle">Beta</a>
  </div>
  <article class="jobTuple">
    <a class="title" href="/job-listings-nameless">Nameless Company Role</a>
  </article>
  <article class="jobTuple">
    <a class="subTitle">Untitled Inc</a>
  </article>
</body></html>
"#;

    fn adapter() -> NaukriAdapter {
        NaukriAdapter::new(source_config("naukri")).unwrap()
    }

    #[test]
    fn single_page_with_default_url() {
        let adapter = adapter();
        assert_eq!(adapter.fetch_strategy(), FetchStrategy::SinglePage);
        assert_eq!(adapter.page_count(), 1);
        assert_eq!(adapter.page_url(0), LISTING_URL);
    }

    #[test]
    fn parses_both_tuple_shapes() {
        let outcome = adapter().parse(FIXTURE);

        assert_eq!(outcome.postings.len(), 2);
        assert_eq!(outcome.skipped, 2);

        let first = &outcome.postings[0];
        assert_eq!(first.company, "Acme Corp");
        assert_eq!(first.salary.as_deref(), Some("Not disclosed"));
        assert_eq!(first.date_posted.as_deref(), Some("3 Days Ago"));
        assert!(first.link.starts_with("/job-listings-software-developer"));

        let second = &outcome.postings[1];
        assert_eq!(second.location, "");
        assert_eq!(second.salary, None);
        assert_eq!(second.description, None);
    }

    #[test]
    fn tuples_without_href_are_skipped() {
        let body = r#"
<article class="jobTuple">
  <a class="title">Support Trainee</a>
  <a class="subTitle">Epsilon</a>
</article>
"#;
        let outcome = adapter().parse(body);

        assert!(outcome.postings.is_empty());
        assert_eq!(outcome.skipped, 1);
    }
}
