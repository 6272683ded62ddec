use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::schema::{NormalizedPosting, StoredPosting};

use super::{InsertOutcome, PostingStore};

/// In-process store.
///
/// Used in demo mode (nothing survives a restart) and by tests.
/// Same insert-if-absent semantics as the Redis store.
#[derive(Default)]
pub struct MemoryStore {
    postings: Mutex<HashMap<String, StoredPosting>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored postings, newest first.
    #[cfg(test)]
    pub async fn snapshot(&self) -> Vec<StoredPosting> {
        let mut all: Vec<_> = self.postings.lock().await.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        all
    }
}

#[async_trait]
impl PostingStore for MemoryStore {
    async fn exists(&self, dedup_key: &str) -> Result<bool, StoreError> {
        Ok(self.postings.lock().await.contains_key(dedup_key))
    }

    async fn insert(&self, posting: &NormalizedPosting) -> Result<InsertOutcome, StoreError> {
        let mut postings = self.postings.lock().await;

        if postings.contains_key(&posting.dedup_key) {
            return Ok(InsertOutcome::Duplicate);
        }

        debug!("DEMO → stored {}", posting.dedup_key);

        postings.insert(
            posting.dedup_key.clone(),
            StoredPosting {
                posting: posting.clone(),
                created_at: Utc::now(),
            },
        );

        Ok(InsertOutcome::Inserted)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.postings.lock().await.len())
    }
}

#[cfg(test)]
pub(crate) fn sample_posting(dedup_key: &str) -> NormalizedPosting {
    use crate::schema::JobType;

    NormalizedPosting {
        company_slug: "acme".into(),
        title: "Developer".into(),
        description: "Check company website for details".into(),
        apply_link: "https://acme.test/jobs/1".into(),
        image_link: "/company-logos/default.png".into(),
        dedup_key: dedup_key.into(),
        salary: "Not disclosed".into(),
        location: "Pune".into(),
        job_type: JobType::FullTime,
        experience: "Fresher".into(),
        batch: "N/A".into(),
        date_posted: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        source: "test".into(),
    }
}
