use anyhow::Result;

use super::schema::Database;
use super::types::{is_unique_violation, Article, ArticleDbRow, InsertOutcome, NewArticle};

/// Maximum number of articles to return from any single query (OOM protection)
const MAX_ARTICLES: i64 = 2000;

impl Database {
    // ========================================================================
    // Article Writes
    // ========================================================================

    /// Whether an article with this original URL is already stored
    pub async fn article_exists(&self, original_url: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM articles WHERE original_url = ?")
            .bind(original_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Insert a new article.
    ///
    /// The UNIQUE constraint on `original_url` decides races between
    /// concurrent ingestions: the losing insert comes back as
    /// [`InsertOutcome::Duplicate`] rather than an error.
    pub async fn insert_article(&self, article: &NewArticle) -> Result<InsertOutcome> {
        let result: Result<Option<(i64,)>, sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO articles (
                feed_id, category_id, title, slug, content, excerpt, original_url,
                rss_published_at, fetched_at, is_newsflash
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(original_url) DO NOTHING
            RETURNING id
        "#,
        )
        .bind(article.feed_id)
        .bind(article.category_id)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.original_url)
        .bind(article.rss_published_at.timestamp())
        .bind(article.fetched_at.timestamp())
        .bind(article.is_newsflash)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some((id,))) => Ok(InsertOutcome::Created(id)),
            Ok(None) => Ok(InsertOutcome::Duplicate),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    // ========================================================================
    // Article Queries
    // ========================================================================

    /// Get articles for a feed, newest first, with optional pagination limit
    pub async fn get_articles_for_feed(
        &self,
        feed_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<Article>> {
        let limit = limit.unwrap_or(500).min(MAX_ARTICLES);
        let rows = sqlx::query_as::<_, ArticleDbRow>(
            r#"
            SELECT id, feed_id, category_id, title, slug, content, excerpt, original_url,
                   rss_published_at, fetched_at, is_newsflash, published_at
            FROM articles
            WHERE feed_id = ?
            ORDER BY rss_published_at DESC, id DESC
            LIMIT ?
        "#,
        )
        .bind(feed_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ArticleDbRow::into_article).collect())
    }

    /// Look up an article by its dedup key
    pub async fn get_article_by_url(&self, original_url: &str) -> Result<Option<Article>> {
        let row = sqlx::query_as::<_, ArticleDbRow>(
            r#"
            SELECT id, feed_id, category_id, title, slug, content, excerpt, original_url,
                   rss_published_at, fetched_at, is_newsflash, published_at
            FROM articles
            WHERE original_url = ?
        "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ArticleDbRow::into_article))
    }

    /// Total number of stored articles
    pub async fn count_articles(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
