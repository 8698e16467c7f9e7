//! Category-keyed retention windows

use crate::entry::KnowledgeEntry;
use chrono::{DateTime, Duration, Utc};
use crew_core::Category;

/// Retention windows per knowledge category
///
/// Market observations go stale in weeks; synthesized reports stay useful
/// for months. Evergreen entries ignore the windows entirely.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    /// Window for fast-moving market observations
    pub market_data: Duration,
    /// Window for company/asset fundamentals
    pub fundamental: Duration,
    /// Window for risk analysis
    pub risk: Duration,
    /// Window for strategy recommendations
    pub strategy: Duration,
    /// Window for synthesized reports
    pub report: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            market_data: Duration::days(30),
            fundamental: Duration::days(90),
            risk: Duration::days(90),
            strategy: Duration::days(90),
            report: Duration::days(180),
        }
    }
}

impl RetentionPolicy {
    /// The retention window for a category
    pub fn window(&self, category: Category) -> Duration {
        match category {
            Category::MarketData => self.market_data,
            Category::Fundamental => self.fundamental,
            Category::Risk => self.risk,
            Category::Strategy => self.strategy,
            Category::Report => self.report,
        }
    }

    /// Whether an entry has aged past its category window at `now`
    ///
    /// Evergreen entries are never stale.
    pub fn is_stale(&self, entry: &KnowledgeEntry, now: DateTime<Utc>) -> bool {
        !entry.evergreen && entry.age(now) > self.window(entry.category)
    }
}
