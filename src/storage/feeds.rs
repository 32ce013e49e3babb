use anyhow::Result;

use super::schema::Database;
use super::types::{Feed, FeedSourceRow, FeedWithSource};

/// Column list shared by every feed/source join query
const FEED_SOURCE_COLUMNS: &str = r#"
    f.id AS feed_id,
    f.source_id AS feed_source_id,
    f.category_id AS feed_category_id,
    f.url AS feed_url,
    f.name AS feed_name,
    f.slug AS feed_slug,
    f.active AS feed_active,
    s.name AS source_name,
    s.slug AS source_slug,
    s.website_url AS source_website_url,
    s.logo_url AS source_logo_url,
    s.active AS source_active
"#;

impl Database {
    // ========================================================================
    // Feed Queries
    // ========================================================================

    /// Get all feeds ordered by ID, regardless of active state
    pub async fn list_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>(
            "SELECT id, source_id, category_id, url, name, slug, active FROM feeds ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    pub async fn find_feed_by_slug(&self, slug: &str) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>(
            "SELECT id, source_id, category_id, url, name, slug, active FROM feeds WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(feed)
    }

    /// Get a feed together with its owning source
    pub async fn get_feed_with_source(&self, feed_id: i64) -> Result<Option<FeedWithSource>> {
        let query = format!(
            "SELECT {} FROM feeds f JOIN sources s ON s.id = f.source_id WHERE f.id = ?",
            FEED_SOURCE_COLUMNS
        );
        let row = sqlx::query_as::<_, FeedSourceRow>(&query)
            .bind(feed_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(FeedSourceRow::into_feed_with_source))
    }

    /// Get every fetchable feed: the feed and its source are both active
    pub async fn get_active_feeds(&self) -> Result<Vec<FeedWithSource>> {
        let query = format!(
            "SELECT {} FROM feeds f JOIN sources s ON s.id = f.source_id \
             WHERE f.active = 1 AND s.active = 1 ORDER BY f.id",
            FEED_SOURCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, FeedSourceRow>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(FeedSourceRow::into_feed_with_source)
            .collect())
    }

    /// Get the fetchable feeds belonging to one source
    pub async fn get_active_feeds_for_source(
        &self,
        source_id: i64,
    ) -> Result<Vec<FeedWithSource>> {
        let query = format!(
            "SELECT {} FROM feeds f JOIN sources s ON s.id = f.source_id \
             WHERE f.source_id = ? AND f.active = 1 AND s.active = 1 ORDER BY f.id",
            FEED_SOURCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, FeedSourceRow>(&query)
            .bind(source_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(FeedSourceRow::into_feed_with_source)
            .collect())
    }

    /// Toggle whether a feed is fetched
    pub async fn set_feed_active(&self, feed_id: i64, active: bool) -> Result<()> {
        sqlx::query("UPDATE feeds SET active = ? WHERE id = ?")
            .bind(active)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
