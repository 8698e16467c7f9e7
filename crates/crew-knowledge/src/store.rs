//! Append-only knowledge store with similarity lookup and retention pruning

use crate::entry::{EntryId, KnowledgeEntry};
use crate::retention::RetentionPolicy;
use chrono::{DateTime, Utc};
use crew_core::{Category, Result};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// One slot in the append-only log
///
/// Pruning flips `active` instead of removing the record, so the full log
/// stays available for audit while queries only see active entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct StoredEntry {
    pub(crate) id: EntryId,
    pub(crate) active: bool,
    pub(crate) entry: KnowledgeEntry,
}

/// Filter for knowledge store queries
///
/// All fields are optional and conjunctive: an entry must match every field
/// that is set.
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// Restrict to one asset
    pub asset_identifier: Option<String>,
    /// Restrict to one category
    pub category: Option<Category>,
    /// Only entries observed at or after this instant
    pub since: Option<DateTime<Utc>>,
    /// Free-text similarity query; entries sharing no term are dropped
    pub text_query: Option<String>,
}

impl QueryFilter {
    /// Create an empty filter (matches every active, fresh entry)
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one asset
    pub fn asset(mut self, asset_identifier: impl Into<String>) -> Self {
        self.asset_identifier = Some(asset_identifier.into());
        self
    }

    /// Restrict to one category
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Only entries observed at or after `since`
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Rank by similarity to this text
    pub fn text(mut self, text_query: impl Into<String>) -> Self {
        self.text_query = Some(text_query.into());
        self
    }
}

/// Thread-safe, append-only store of research knowledge
///
/// Writers only ever append, so concurrent `put` calls cannot conflict; the
/// only shared mutable state beyond the log is the atomic id counter.
/// Clones share the same log, mirroring how crews share one store.
///
/// # Example
///
/// ```no_run
/// use crew_knowledge::{KnowledgeEntry, KnowledgeStore, QueryFilter};
/// use crew_core::Category;
///
/// # async fn example() -> crew_core::Result<()> {
/// let store = KnowledgeStore::new(Default::default());
///
/// let entry = KnowledgeEntry::builder("NVDA", Category::MarketData)
///     .source("market_analysis")
///     .content("Data-center revenue beat estimates by 12%.")
///     .build();
/// store.put(entry).await?;
///
/// let hits = store
///     .query(QueryFilter::new().asset("NVDA").text("revenue estimates"))
///     .await;
/// assert_eq!(hits.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct KnowledgeStore {
    log: Arc<RwLock<Vec<StoredEntry>>>,
    next_id: Arc<AtomicU64>,
    retention: RetentionPolicy,
}

impl KnowledgeStore {
    /// Create an empty store with the given retention policy
    pub fn new(retention: RetentionPolicy) -> Self {
        Self {
            log: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            retention,
        }
    }

    /// Open a store from a JSONL snapshot, or empty if the file is absent
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: impl AsRef<Path>, retention: RetentionPolicy) -> Result<Self> {
        let log = crate::persist::load(path.as_ref())?;
        let next_id = log.iter().map(|s| s.id).max().unwrap_or(0) + 1;

        Ok(Self {
            log: Arc::new(RwLock::new(log)),
            next_id: Arc::new(AtomicU64::new(next_id)),
            retention,
        })
    }

    /// Write the full log (including soft-deleted entries) to a JSONL snapshot
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let log = self.log.read().await;
        crate::persist::save(&log, path.as_ref())
    }

    /// The store's retention policy
    pub fn retention(&self) -> &RetentionPolicy {
        &self.retention
    }

    /// Append an entry and return its assigned id
    ///
    /// # Errors
    ///
    /// `Error::Validation` if the entry's fields do not validate; nothing is
    /// stored in that case.
    pub async fn put(&self, entry: KnowledgeEntry) -> Result<EntryId> {
        entry.validate(Utc::now())?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        debug!(
            id,
            asset = %entry.asset_identifier,
            category = %entry.category,
            "storing knowledge entry"
        );

        let mut log = self.log.write().await;
        log.push(StoredEntry {
            id,
            active: true,
            entry,
        });
        Ok(id)
    }

    /// Retrieve entries matching a filter, ranked relevance-then-recency
    ///
    /// Excludes soft-deleted entries and any non-evergreen entry older than
    /// its category retention window at query time, whether or not a sweep
    /// has run yet. An empty result is an empty vec, never an error.
    /// Re-issuing the same query later observes entries stored since.
    pub async fn query(&self, filter: QueryFilter) -> Vec<KnowledgeEntry> {
        self.query_at(filter, Utc::now()).await
    }

    /// `query` with an explicit notion of "now"
    pub async fn query_at(&self, filter: QueryFilter, now: DateTime<Utc>) -> Vec<KnowledgeEntry> {
        let log = self.log.read().await;

        let mut hits: Vec<(usize, &StoredEntry)> = log
            .iter()
            .filter(|stored| stored.active)
            .filter(|stored| !self.retention.is_stale(&stored.entry, now))
            .filter(|stored| {
                filter
                    .asset_identifier
                    .as_deref()
                    .is_none_or(|asset| stored.entry.asset_identifier == asset)
            })
            .filter(|stored| {
                filter
                    .category
                    .is_none_or(|category| stored.entry.category == category)
            })
            .filter(|stored| {
                filter
                    .since
                    .is_none_or(|since| stored.entry.timestamp >= since)
            })
            .map(|stored| {
                let score = filter
                    .text_query
                    .as_deref()
                    .map_or(0, |q| crew_utils::overlap_score(q, &stored.entry.content));
                (score, stored)
            })
            .collect();

        // A similarity query drops entries sharing no term at all
        if filter.text_query.is_some() {
            hits.retain(|(score, _)| *score > 0);
        }

        hits.sort_by(|(score_a, a), (score_b, b)| {
            score_b
                .cmp(score_a)
                .then(b.entry.timestamp.cmp(&a.entry.timestamp))
        });

        hits.into_iter()
            .map(|(_, stored)| stored.entry.clone())
            .collect()
    }

    /// Soft-delete entries older than their category window
    ///
    /// Pruned entries stay in the log for audit but disappear from queries.
    /// Idempotent: a second sweep with no intervening `put` prunes nothing.
    ///
    /// # Returns
    ///
    /// The number of entries pruned by this sweep.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut log = self.log.write().await;
        let mut pruned = 0;

        for stored in log.iter_mut() {
            if stored.active && self.retention.is_stale(&stored.entry, now) {
                stored.active = false;
                pruned += 1;
            }
        }

        if pruned > 0 {
            debug!(pruned, "retention sweep completed");
        }
        pruned
    }

    /// Number of active (queryable) entries
    pub async fn active_count(&self) -> usize {
        self.log.read().await.iter().filter(|s| s.active).count()
    }

    /// Total entries in the log, including soft-deleted ones
    pub async fn total_count(&self) -> usize {
        self.log.read().await.len()
    }
}

impl Clone for KnowledgeStore {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            next_id: Arc::clone(&self.next_id),
            retention: self.retention.clone(),
        }
    }
}

impl Default for KnowledgeStore {
    fn default() -> Self {
        Self::new(RetentionPolicy::default())
    }
}
