use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a write lock on the database file
    #[error("Database is locked by another newsdesk process. Wait for it to finish and try again.")]
    Locked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::Locked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6) surface through these messages.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
}

/// True when a sqlx error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

// ============================================================================
// Catalog Records
// ============================================================================

/// A publisher (news outlet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub website_url: String,
    pub logo_url: Option<String>,
    pub active: bool,
}

/// A topic label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub display_order: i64,
}

/// One syndication endpoint, owned by exactly one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub source_id: i64,
    pub category_id: Option<i64>,
    pub url: String,
    pub name: String,
    pub slug: String,
    pub active: bool,
}

/// A feed joined with its owning source, the unit the orchestrator works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedWithSource {
    pub feed: Feed,
    pub source: Source,
}

impl FeedWithSource {
    /// A feed is fetchable only while both it and its source are active.
    pub fn is_fetchable(&self) -> bool {
        self.feed.active && self.source.active
    }
}

/// Flat row for the feed/source join (used by sqlx FromRow)
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FeedSourceRow {
    pub feed_id: i64,
    pub feed_source_id: i64,
    pub feed_category_id: Option<i64>,
    pub feed_url: String,
    pub feed_name: String,
    pub feed_slug: String,
    pub feed_active: bool,
    pub source_name: String,
    pub source_slug: String,
    pub source_website_url: String,
    pub source_logo_url: Option<String>,
    pub source_active: bool,
}

impl FeedSourceRow {
    pub(crate) fn into_feed_with_source(self) -> FeedWithSource {
        FeedWithSource {
            feed: Feed {
                id: self.feed_id,
                source_id: self.feed_source_id,
                category_id: self.feed_category_id,
                url: self.feed_url,
                name: self.feed_name,
                slug: self.feed_slug,
                active: self.feed_active,
            },
            source: Source {
                id: self.feed_source_id,
                name: self.source_name,
                slug: self.source_slug,
                website_url: self.source_website_url,
                logo_url: self.source_logo_url,
                active: self.source_active,
            },
        }
    }
}

// ============================================================================
// Articles
// ============================================================================

/// A persisted, deduplicated content item.
///
/// `published_at` belongs to the downstream editorial step; ingestion always
/// writes it as NULL.
#[derive(Debug, Clone, Serialize)]
pub struct Article {
    pub id: i64,
    pub feed_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub original_url: String,
    pub rss_published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub is_newsflash: bool,
    pub published_at: Option<DateTime<Utc>>,
}

/// Internal row type for Article queries; timestamps are stored as unix seconds.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ArticleDbRow {
    pub id: i64,
    pub feed_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub original_url: String,
    pub rss_published_at: i64,
    pub fetched_at: i64,
    pub is_newsflash: bool,
    pub published_at: Option<i64>,
}

impl ArticleDbRow {
    pub(crate) fn into_article(self) -> Article {
        Article {
            id: self.id,
            feed_id: self.feed_id,
            category_id: self.category_id,
            title: self.title,
            slug: self.slug,
            content: self.content,
            excerpt: self.excerpt,
            original_url: self.original_url,
            rss_published_at: from_timestamp(self.rss_published_at),
            fetched_at: from_timestamp(self.fetched_at),
            is_newsflash: self.is_newsflash,
            published_at: self.published_at.map(from_timestamp),
        }
    }
}

fn from_timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// An article ready to be written by ingestion.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub feed_id: i64,
    pub category_id: Option<i64>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub original_url: String,
    pub rss_published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub is_newsflash: bool,
}

/// Result of an article write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row written, carrying its new ID
    Created(i64),
    /// Another row already holds the same `original_url`
    Duplicate,
}

// ============================================================================
// Catalog Definitions
// ============================================================================

/// Desired catalog state, as read from a catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub categories: Vec<CatalogCategory>,
    pub sources: Vec<CatalogSource>,
    pub feeds: Vec<CatalogFeed>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CatalogCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CatalogSource {
    pub name: String,
    pub slug: String,
    pub website_url: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Slugs of the categories this source publishes under
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct CatalogFeed {
    /// Slug of the owning source
    pub source: String,
    /// Slug of the fixed category, if the feed carries one
    #[serde(default)]
    pub category: Option<String>,
    pub url: String,
    pub name: String,
    pub slug: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Row counts written by a catalog sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSyncSummary {
    pub categories: usize,
    pub sources: usize,
    pub feeds: usize,
}
