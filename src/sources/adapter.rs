use std::fmt;

use crate::fetch::HeaderSet;
use crate::normalize::LinkPolicy;
use crate::schema::RawPosting;

/// How a source is paged.
///
/// IMPORTANT:
/// - The coordinator only ever asks for page indices in
///   `[0, page_count)`, in order.
/// - Adding a variant requires changes in `page_count` and in
///   every adapter's `page_url`.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Search API returning `page_size` cards per page
    Paginated { pages: usize, page_size: usize },

    /// One listing page, fetched once per run
    SinglePage,
}

impl FetchStrategy {
    pub fn page_count(&self) -> usize {
        match self {
            FetchStrategy::Paginated { pages, .. } => *pages,
            FetchStrategy::SinglePage => 1,
        }
    }
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::Paginated { pages, page_size } => {
                write!(f, "{pages} pages x {page_size}")
            }
            FetchStrategy::SinglePage => f.write_str("single page"),
        }
    }
}

/// Result of parsing one page body.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub postings: Vec<RawPosting>,

    /// Containers dropped for a missing title, company or link
    pub skipped: usize,

    /// Containers excluded by the source's relevance filter
    pub filtered: usize,
}

/// SourceAdapter is the seam between the generic coordinator and
/// one listing site.
///
/// Each implementation must:
/// - Describe how the source is paged and addressed
/// - Provide the headers sent with every request
/// - Turn a page body into RawPostings
///
/// DESIGN GOALS:
/// - Zero site-specific logic outside adapters
/// - Uniform output regardless of the site's markup
///
/// THREAD SAFETY:
/// - Must be Send + Sync; adapters are shared behind `Arc`
///
pub trait SourceAdapter: Send + Sync {
    /// Source label, stored on every posting.
    fn name(&self) -> &str;

    fn fetch_strategy(&self) -> FetchStrategy;

    fn page_count(&self) -> usize {
        self.fetch_strategy().page_count()
    }

    /// Absolute URL of page `page` (0-based).
    fn page_url(&self, page: usize) -> String;

    /// Headers for the next request. May differ between calls
    /// (user-agent rotation); correctness must not depend on it.
    fn headers(&self) -> HeaderSet;

    /// How apply links from this source are cleaned.
    fn link_policy(&self) -> LinkPolicy;

    /// Parse a page body.
    ///
    /// MUST:
    /// - Select posting containers with a structural selector
    /// - Skip (count, never fail) containers without title, company
    ///   or apply link
    /// - Exclude containers failing the relevance filter, if any
    /// - Never let one malformed container affect its siblings
    ///
    fn parse(&self, body: &str) -> ParseOutcome;
}
