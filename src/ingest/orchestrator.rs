use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;

use super::category::CategoryResolver;
use super::newsflash::is_newsflash;
use super::normalize::normalize;
use super::report::{FeedReport, RunReport, SourceReport};
use crate::feed::{FeedFetcher, RawEntry};
use crate::storage::{FeedWithSource, IngestStore, InsertOutcome};

/// Failures that reach the caller of an ingestion entry point.
///
/// Anything below the addressed unit (a feed inside a source, an item inside
/// a feed) is absorbed into the report instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Feed {0} not found")]
    FeedNotFound(i64),
    #[error("Source {0} not found")]
    SourceNotFound(i64),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// What happened to one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Created,
    Duplicate,
    Invalid,
}

/// Drives fetch → normalize → dedup → classify → write for feeds.
///
/// Feeds within one call are fetched concurrently, at most
/// `max_concurrency` at a time. Items within a feed are processed in
/// document order.
pub struct Ingestor<S, F> {
    store: Arc<S>,
    fetcher: Arc<F>,
    max_concurrency: usize,
}

impl<S, F> Ingestor<S, F>
where
    S: IngestStore,
    F: FeedFetcher,
{
    pub fn new(store: Arc<S>, fetcher: Arc<F>, max_concurrency: usize) -> Self {
        Self {
            store,
            fetcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Ingest one feed by ID.
    ///
    /// # Errors
    ///
    /// [`IngestError::FeedNotFound`] for an unknown ID. Fetch and parse
    /// failures are not errors here; they show up in [`FeedReport::error`].
    pub async fn ingest_feed(&self, feed_id: i64) -> Result<FeedReport, IngestError> {
        let unit = self
            .store
            .find_feed(feed_id)
            .await?
            .ok_or(IngestError::FeedNotFound(feed_id))?;
        Ok(self.run_feed(&unit).await)
    }

    /// Ingest every active feed of one source and sum their counts.
    pub async fn ingest_source(&self, source_id: i64) -> Result<SourceReport, IngestError> {
        let source = self
            .store
            .find_source(source_id)
            .await?
            .ok_or(IngestError::SourceNotFound(source_id))?;

        if !source.active {
            tracing::info!(source = %source.name, source_id, "Source inactive, skipping");
            return Ok(SourceReport::skipped(&source, "source inactive"));
        }

        let feeds = self.store.active_feeds_for_source(source_id).await?;
        let report = SourceReport::new(&source, self.run_many(feeds).await);
        tracing::info!(
            source = %report.source_name,
            feeds = report.feeds.len(),
            created = report.count,
            "Source ingested"
        );
        Ok(report)
    }

    /// Ingest every active feed of every active source.
    pub async fn ingest_all(&self) -> Result<RunReport, IngestError> {
        let feeds = self.store.active_feeds().await?;
        tracing::info!(feeds = feeds.len(), "Starting ingestion run");

        let report = RunReport::from_feeds(self.run_many(feeds).await);
        tracing::info!(
            created = report.total_created,
            failed_feeds = report.failed_feeds,
            "Ingestion run complete"
        );
        Ok(report)
    }

    /// Run feeds concurrently. Reports come back ordered by feed ID.
    async fn run_many(&self, feeds: Vec<FeedWithSource>) -> Vec<FeedReport> {
        let mut reports: Vec<FeedReport> = stream::iter(feeds)
            .map(|unit| async move { self.run_feed(&unit).await })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;
        reports.sort_by_key(|r| r.feed_id);
        reports
    }

    /// The primitive every entry point is built from. Never fails: problems
    /// are recorded on the returned report.
    async fn run_feed(&self, unit: &FeedWithSource) -> FeedReport {
        let mut report = FeedReport::for_feed(unit);

        if !unit.is_fetchable() {
            let reason = if unit.feed.active {
                "source inactive"
            } else {
                "feed inactive"
            };
            tracing::info!(feed = %unit.feed.name, feed_id = unit.feed.id, reason, "Skipping feed");
            report.skipped_reason = Some(reason.to_string());
            return report;
        }

        let entries = match self.fetcher.fetch(&unit.feed.url).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    feed = %unit.feed.name,
                    feed_id = unit.feed.id,
                    url = %unit.feed.url,
                    error = %e,
                    "Feed fetch failed"
                );
                report.error = Some(e.to_string());
                return report;
            }
        };

        for entry in &entries {
            match self.ingest_entry(unit, entry).await {
                Ok(ItemOutcome::Created) => report.created += 1,
                Ok(ItemOutcome::Duplicate) => report.skipped_duplicate += 1,
                Ok(ItemOutcome::Invalid) => report.skipped_invalid += 1,
                Err(e) => {
                    tracing::warn!(
                        feed_id = unit.feed.id,
                        link = entry.link.as_deref().unwrap_or(""),
                        error = %e,
                        "Failed to store entry"
                    );
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            feed = %unit.feed.name,
            feed_id = unit.feed.id,
            entries = entries.len(),
            created = report.created,
            duplicates = report.skipped_duplicate,
            invalid = report.skipped_invalid,
            failed = report.failed,
            "Feed ingested"
        );
        report
    }

    async fn ingest_entry(
        &self,
        unit: &FeedWithSource,
        entry: &RawEntry,
    ) -> anyhow::Result<ItemOutcome> {
        let now = Utc::now();

        let candidate = match normalize(entry, unit.feed.id, now) {
            Ok(candidate) => candidate,
            Err(reason) => {
                tracing::debug!(
                    feed_id = unit.feed.id,
                    reason = %reason,
                    "Skipping invalid entry"
                );
                return Ok(ItemOutcome::Invalid);
            }
        };

        if self.store.article_exists(&candidate.original_url).await? {
            return Ok(ItemOutcome::Duplicate);
        }

        let newsflash = is_newsflash(candidate.rss_published_at, now);
        let category_id = match unit.feed.category_id {
            Some(id) => Some(id),
            None => CategoryResolver::new(self.store.as_ref())
                .resolve(&candidate.tags, unit.source.id)
                .await
                .map(|c| c.id),
        };

        let article = candidate.into_new_article(category_id, newsflash, now);
        match self.store.create_article(&article).await? {
            InsertOutcome::Created(id) => {
                tracing::debug!(
                    article_id = id,
                    url = %article.original_url,
                    newsflash,
                    "Article created"
                );
                Ok(ItemOutcome::Created)
            }
            // Lost a race with a concurrent writer on the unique URL
            InsertOutcome::Duplicate => Ok(ItemOutcome::Duplicate),
        }
    }
}
