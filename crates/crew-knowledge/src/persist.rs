//! JSONL snapshot backend for the knowledge store
//!
//! One JSON object per line, soft-deleted entries included with their flag.
//! The format is an implementation detail of this crate; nothing outside it
//! should parse snapshot files directly.

use crate::store::StoredEntry;
use crew_core::{Error, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Load a snapshot, returning an empty log if the file does not exist
pub(crate) fn load(path: &Path) -> Result<Vec<StoredEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| Error::Storage(format!("failed to read {}: {e}", path.display())))?;

    let mut log = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let stored: StoredEntry = serde_json::from_str(line).map_err(|e| {
            Error::Storage(format!(
                "malformed entry at {}:{}: {e}",
                path.display(),
                line_no + 1
            ))
        })?;
        log.push(stored);
    }

    debug!(entries = log.len(), path = %path.display(), "loaded knowledge snapshot");
    Ok(log)
}

/// Write the full log as a JSONL snapshot
pub(crate) fn save(log: &[StoredEntry], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
    }

    let mut file = fs::File::create(path)
        .map_err(|e| Error::Storage(format!("failed to create {}: {e}", path.display())))?;

    for stored in log {
        let line = serde_json::to_string(stored)
            .map_err(|e| Error::Storage(format!("failed to serialize entry {}: {e}", stored.id)))?;
        writeln!(file, "{line}")
            .map_err(|e| Error::Storage(format!("failed to write {}: {e}", path.display())))?;
    }

    debug!(entries = log.len(), path = %path.display(), "wrote knowledge snapshot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::KnowledgeEntry;
    use crate::retention::RetentionPolicy;
    use crate::store::{KnowledgeStore, QueryFilter};
    use chrono::{Duration, Utc};
    use crew_core::Category;

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.jsonl");

        let store = KnowledgeStore::default();
        store
            .put(
                KnowledgeEntry::builder("AAPL", Category::Fundamental)
                    .source("detail")
                    .content("Gross margin expanded to 46%.")
                    .build(),
            )
            .await
            .unwrap();
        store
            .put(
                KnowledgeEntry::builder("AAPL", Category::MarketData)
                    .timestamp(Utc::now() - Duration::days(45))
                    .content("stale quote")
                    .build(),
            )
            .await
            .unwrap();
        store.prune(Utc::now()).await;
        store.persist(&path).await.unwrap();

        let reopened = KnowledgeStore::open(&path, RetentionPolicy::default()).unwrap();
        // The full log survives, the soft-deleted entry stays invisible
        assert_eq!(reopened.total_count().await, 2);
        let hits = reopened.query(QueryFilter::new().asset("AAPL")).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].content, "Gross margin expanded to 46%.");
    }

    #[tokio::test]
    async fn test_reopened_store_continues_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge.jsonl");

        let store = KnowledgeStore::default();
        let first = store
            .put(KnowledgeEntry::builder("SPY", Category::Report).content("a").build())
            .await
            .unwrap();
        store.persist(&path).await.unwrap();

        let reopened = KnowledgeStore::open(&path, RetentionPolicy::default()).unwrap();
        let second = reopened
            .put(KnowledgeEntry::builder("SPY", Category::Report).content("b").build())
            .await
            .unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = load(&dir.path().join("absent.jsonl")).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_load_rejects_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        fs::write(&path, "not json\n").unwrap();

        let err = load(&path).unwrap_err();
        assert!(err.to_string().contains("malformed entry"));
    }
}
