use std::path::Path;

use anyhow::Context;
use log::warn;

use crate::schema::NormalizedPosting;

use super::{InsertOutcome, PostingStore};

/// Import a JSON array of postings, but only into an empty store.
///
/// Returns the number of postings inserted. Individual insert
/// failures are logged and skipped; an unreadable or malformed file
/// is an error for the caller to report.
pub async fn import_if_empty(store: &dyn PostingStore, path: &Path) -> anyhow::Result<usize> {
    if store.count().await? > 0 {
        return Ok(0);
    }

    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read seed file {}", path.display()))?;

    let postings: Vec<NormalizedPosting> =
        serde_json::from_str(&data).context("seed file is not a posting list")?;

    let mut imported = 0;
    for posting in &postings {
        match store.insert(posting).await {
            Ok(InsertOutcome::Inserted) => imported += 1,
            Ok(InsertOutcome::Duplicate) => {}
            Err(e) => warn!("[Seed] skipping {}: {}", posting.dedup_key, e),
        }
    }

    Ok(imported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::sample_posting;
    use crate::store::MemoryStore;

    fn write_seed(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.json", name, std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn imports_legacy_column_names_into_empty_store() {
        let path = write_seed(
            "seed-legacy",
            r#"[{
                "companyname": "acme",
                "title": "Developer",
                "description": "Check company website for details",
                "apply_link": "https://acme.test/jobs/1",
                "image_link": "/company-logos/default.png",
                "url": "acme-pune-not-disclosed",
                "salary": "Not disclosed",
                "location": "Pune",
                "job_type": "Full-time",
                "experience": "Fresher",
                "batch": "N/A",
                "date_posted": "2025-01-15",
                "job_uploader": "Admin"
            }]"#,
        );

        let store = MemoryStore::new();
        let imported = import_if_empty(&store, &path).await.unwrap();

        assert_eq!(imported, 1);
        assert!(store.exists("acme-pune-not-disclosed").await.unwrap());

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn populated_store_is_left_alone() {
        let store = MemoryStore::new();
        store.insert(&sample_posting("existing")).await.unwrap();

        // the file is never opened
        let imported = import_if_empty(&store, Path::new("/nonexistent/seed.json"))
            .await
            .unwrap();

        assert_eq!(imported, 0);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn malformed_seed_is_an_error() {
        let path = write_seed("seed-bad", "{ not json");
        let store = MemoryStore::new();

        assert!(import_if_empty(&store, &path).await.is_err());
        assert_eq!(store.count().await.unwrap(), 0);

        std::fs::remove_file(path).ok();
    }
}
