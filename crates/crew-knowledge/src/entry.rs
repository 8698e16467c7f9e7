//! Knowledge entry value object

use chrono::{DateTime, Utc};
use crew_core::{Category, Error, Result};
use serde::{Deserialize, Serialize};

/// Monotonically increasing entry identifier, assigned by the store
pub type EntryId = u64;

/// One timestamped, categorized piece of research knowledge
///
/// Entries are immutable once stored. A newer finding about the same asset
/// supersedes older ones by timestamp; it does not overwrite them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    /// Asset the entry is about (ticker, pair, segment name)
    pub asset_identifier: String,

    /// When the underlying observation was made
    pub timestamp: DateTime<Utc>,

    /// Where the entry came from (task id, tool name, feed)
    pub source: String,

    /// Classification driving the retention window
    pub category: Category,

    /// The finding itself
    pub content: String,

    /// Author confidence in [0, 1]
    pub confidence: f64,

    /// Exempt from retention-based pruning
    pub evergreen: bool,
}

impl KnowledgeEntry {
    /// Create a new entry builder
    ///
    /// # Arguments
    ///
    /// * `asset_identifier` - Asset the entry is about
    /// * `category` - Knowledge category of the entry
    pub fn builder(
        asset_identifier: impl Into<String>,
        category: Category,
    ) -> KnowledgeEntryBuilder {
        KnowledgeEntryBuilder::new(asset_identifier, category)
    }

    /// Age of the entry relative to `now`
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.timestamp
    }

    /// Validate entry fields prior to storage
    ///
    /// # Errors
    ///
    /// `Error::Validation` when the asset identifier is empty, the timestamp
    /// lies in the future, or the confidence is outside [0, 1].
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if self.asset_identifier.trim().is_empty() {
            return Err(Error::Validation(
                "asset_identifier must not be empty".to_string(),
            ));
        }
        if self.timestamp > now {
            return Err(Error::Validation(format!(
                "timestamp {} is in the future",
                self.timestamp
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::Validation(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        Ok(())
    }
}

/// Builder for knowledge entries
#[derive(Debug)]
pub struct KnowledgeEntryBuilder {
    asset_identifier: String,
    timestamp: Option<DateTime<Utc>>,
    source: String,
    category: Category,
    content: String,
    confidence: f64,
    evergreen: bool,
}

impl KnowledgeEntryBuilder {
    /// Create a new builder
    pub fn new(asset_identifier: impl Into<String>, category: Category) -> Self {
        Self {
            asset_identifier: asset_identifier.into(),
            timestamp: None,
            source: String::new(),
            category,
            content: String::new(),
            confidence: 1.0,
            evergreen: false,
        }
    }

    /// Set the observation timestamp (defaults to now)
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the entry source
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the entry content
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the author confidence
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Mark the entry as exempt from retention pruning
    pub fn evergreen(mut self, evergreen: bool) -> Self {
        self.evergreen = evergreen;
        self
    }

    /// Build the entry
    ///
    /// Field validation happens on `put`, not here, so builders can be used
    /// to construct intentionally invalid entries in tests.
    pub fn build(self) -> KnowledgeEntry {
        KnowledgeEntry {
            asset_identifier: self.asset_identifier,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            source: self.source,
            category: self.category,
            content: self.content,
            confidence: self.confidence,
            evergreen: self.evergreen,
        }
    }
}
