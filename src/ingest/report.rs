use serde::Serialize;

use crate::storage::{FeedWithSource, Source};

/// Outcome of ingesting one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedReport {
    pub feed_id: i64,
    pub feed_name: String,
    pub source_name: String,
    pub created: usize,
    pub skipped_duplicate: usize,
    pub skipped_invalid: usize,
    /// Items lost to a store error
    pub failed: usize,
    /// Feed-level failure (fetch or parse), when the feed contributed nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the guard refused to fetch the feed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<String>,
}

impl FeedReport {
    pub(crate) fn for_feed(unit: &FeedWithSource) -> Self {
        Self {
            feed_id: unit.feed.id,
            feed_name: unit.feed.name.clone(),
            source_name: unit.source.name.clone(),
            ..Self::default()
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of ingesting every active feed of one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source_id: i64,
    pub source_name: String,
    /// Articles created across all of the source's feeds
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_reason: Option<String>,
    pub feeds: Vec<FeedReport>,
}

impl SourceReport {
    pub(crate) fn new(source: &Source, feeds: Vec<FeedReport>) -> Self {
        Self {
            source_id: source.id,
            source_name: source.name.clone(),
            count: feeds.iter().map(|f| f.created).sum(),
            skipped_reason: None,
            feeds,
        }
    }

    pub(crate) fn skipped(source: &Source, reason: &str) -> Self {
        Self {
            skipped_reason: Some(reason.to_string()),
            ..Self::new(source, Vec::new())
        }
    }
}

/// `{name, count}` pair for one unit of an `ingest-all` run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitCount {
    pub name: String,
    pub count: usize,
}

/// Outcome of an `ingest-all` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub results: Vec<UnitCount>,
    pub total_created: usize,
    pub failed_feeds: usize,
    pub feeds: Vec<FeedReport>,
}

impl RunReport {
    pub(crate) fn from_feeds(feeds: Vec<FeedReport>) -> Self {
        Self {
            results: feeds
                .iter()
                .map(|f| UnitCount {
                    name: f.feed_name.clone(),
                    count: f.created,
                })
                .collect(),
            total_created: feeds.iter().map(|f| f.created).sum(),
            failed_feeds: feeds.iter().filter(|f| f.is_failed()).count(),
            feeds,
        }
    }
}
