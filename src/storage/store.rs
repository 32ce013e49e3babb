use anyhow::Result;
use async_trait::async_trait;

use super::schema::Database;
use super::types::{Category, FeedWithSource, InsertOutcome, NewArticle, Source};

/// The narrow slice of the store that ingestion depends on.
///
/// [`Database`] is the production implementation; tests may substitute their
/// own to inject store failures.
#[async_trait]
pub trait IngestStore: Send + Sync {
    async fn find_feed(&self, feed_id: i64) -> Result<Option<FeedWithSource>>;

    async fn find_source(&self, source_id: i64) -> Result<Option<Source>>;

    /// Feeds that are active and belong to an active source
    async fn active_feeds(&self) -> Result<Vec<FeedWithSource>>;

    async fn active_feeds_for_source(&self, source_id: i64) -> Result<Vec<FeedWithSource>>;

    /// Dedup gate: does an article with this original URL already exist?
    async fn article_exists(&self, original_url: &str) -> Result<bool>;

    async fn create_article(&self, article: &NewArticle) -> Result<InsertOutcome>;

    async fn find_category_by_slug_fragment(&self, fragment: &str) -> Result<Option<Category>>;

    async fn source_has_category(&self, source_id: i64, category_id: i64) -> Result<bool>;
}

#[async_trait]
impl IngestStore for Database {
    async fn find_feed(&self, feed_id: i64) -> Result<Option<FeedWithSource>> {
        self.get_feed_with_source(feed_id).await
    }

    async fn find_source(&self, source_id: i64) -> Result<Option<Source>> {
        self.get_source(source_id).await
    }

    async fn active_feeds(&self) -> Result<Vec<FeedWithSource>> {
        self.get_active_feeds().await
    }

    async fn active_feeds_for_source(&self, source_id: i64) -> Result<Vec<FeedWithSource>> {
        self.get_active_feeds_for_source(source_id).await
    }

    async fn article_exists(&self, original_url: &str) -> Result<bool> {
        Database::article_exists(self, original_url).await
    }

    async fn create_article(&self, article: &NewArticle) -> Result<InsertOutcome> {
        self.insert_article(article).await
    }

    async fn find_category_by_slug_fragment(&self, fragment: &str) -> Result<Option<Category>> {
        Database::find_category_by_slug_fragment(self, fragment).await
    }

    async fn source_has_category(&self, source_id: i64, category_id: i64) -> Result<bool> {
        Database::source_has_category(self, source_id, category_id).await
    }
}
