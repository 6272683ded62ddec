use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------
// Raw posting
// ------------------------------------------------------------
//
// Output of an adapter's parse step. One value per listing
// element that carried both a title and a company.
//
// Lives only inside a single ingestion run. Every other field
// is whatever the page showed, untouched; the normalizer owns
// all defaulting and cleanup.
//
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPosting {
    pub title: String,

    /// Company display text
    pub company: String,

    /// Location display text (may be empty)
    pub location: String,

    /// Relative ("2 days ago") or absolute timestamp token
    pub date_posted: Option<String>,

    pub salary: Option<String>,

    /// Possibly relative, possibly carrying tracking parameters
    pub link: String,

    pub description: Option<String>,

    /// Company logo, when the source exposes one
    pub image: Option<String>,
}

// ------------------------------------------------------------
// Job type
// ------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,

    #[serde(rename = "Part-time")]
    PartTime,
}

// ------------------------------------------------------------
// Normalized posting
// ------------------------------------------------------------
//
// The persisted shape. Created once by the pipeline and never
// mutated after insert.
//
// IMPORTANT:
// - `dedup_key` is unique across the store.
// - `apply_link` and `dedup_key` are derived deterministically
//   from the same RawPosting, so re-scraping a listing always
//   reproduces the same key.
//
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    #[serde(alias = "companyname")]
    pub company_slug: String,
    pub title: String,
    pub description: String,

    /// Absolute URL without tracking parameters or fragment
    pub apply_link: String,

    pub image_link: String,

    /// Older exports call this column `url`
    #[serde(alias = "url")]
    pub dedup_key: String,

    /// Free text or "Not disclosed"
    pub salary: String,

    pub location: String,
    pub job_type: JobType,
    pub experience: String,
    pub batch: String,

    /// Serialized as YYYY-MM-DD
    pub date_posted: NaiveDate,

    /// Name of the source adapter that produced the posting
    #[serde(alias = "job_uploader")]
    pub source: String,
}

/// A posting as held by the store: the record plus its insert time.
///
/// `created_at` lets readers flag postings from the trailing week
/// as new.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPosting {
    #[serde(flatten)]
    pub posting: NormalizedPosting,

    pub created_at: DateTime<Utc>,
}
