use anyhow::{bail, Context, Result};
use std::collections::HashMap;

use super::schema::Database;
use super::types::{Catalog, CatalogSyncSummary, Source};

impl Database {
    // ========================================================================
    // Catalog Sync
    // ========================================================================

    /// Upsert a catalog definition: categories, sources, source/category
    /// registrations and feeds, keyed by slug.
    ///
    /// Runs in a single transaction. A feed or source registration naming a
    /// slug that is neither in `catalog` nor already stored aborts the sync
    /// and rolls everything back.
    ///
    /// Rows absent from `catalog` are left untouched; deactivate them with
    /// `active = false` instead of deleting so their articles survive.
    pub async fn sync_catalog(&self, catalog: &Catalog) -> Result<CatalogSyncSummary> {
        let mut tx = self.pool.begin().await?;

        let mut category_ids: HashMap<String, i64> = HashMap::new();
        for category in &catalog.categories {
            let row: (i64,) = sqlx::query_as(
                r#"
                INSERT INTO categories (name, slug, display_order) VALUES (?, ?, ?)
                ON CONFLICT(slug) DO UPDATE SET
                    name = excluded.name,
                    display_order = excluded.display_order
                RETURNING id
            "#,
            )
            .bind(&category.name)
            .bind(&category.slug)
            .bind(category.order)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("Failed to upsert category '{}'", category.slug))?;
            category_ids.insert(category.slug.clone(), row.0);
        }

        let mut source_ids: HashMap<String, i64> = HashMap::new();
        for source in &catalog.sources {
            let row: (i64,) = sqlx::query_as(
                r#"
                INSERT INTO sources (name, slug, website_url, logo_url, active)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT(slug) DO UPDATE SET
                    name = excluded.name,
                    website_url = excluded.website_url,
                    logo_url = excluded.logo_url,
                    active = excluded.active
                RETURNING id
            "#,
            )
            .bind(&source.name)
            .bind(&source.slug)
            .bind(&source.website_url)
            .bind(&source.logo_url)
            .bind(source.active)
            .fetch_one(&mut *tx)
            .await
            .with_context(|| format!("Failed to upsert source '{}'", source.slug))?;
            let source_id = row.0;
            source_ids.insert(source.slug.clone(), source_id);

            for category_slug in &source.categories {
                let category_id = match category_ids.get(category_slug) {
                    Some(id) => *id,
                    None => lookup_id(&mut tx, "categories", category_slug)
                        .await?
                        .with_context(|| {
                            format!(
                                "Source '{}' references unknown category '{}'",
                                source.slug, category_slug
                            )
                        })?,
                };
                sqlx::query(
                    "INSERT OR IGNORE INTO source_categories (source_id, category_id) VALUES (?, ?)",
                )
                .bind(source_id)
                .bind(category_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        for feed in &catalog.feeds {
            let source_id = match source_ids.get(&feed.source) {
                Some(id) => *id,
                None => match lookup_id(&mut tx, "sources", &feed.source).await? {
                    Some(id) => id,
                    None => bail!(
                        "Feed '{}' references unknown source '{}'",
                        feed.slug,
                        feed.source
                    ),
                },
            };
            let category_id = match &feed.category {
                None => None,
                Some(slug) => match category_ids.get(slug) {
                    Some(id) => Some(*id),
                    None => match lookup_id(&mut tx, "categories", slug).await? {
                        Some(id) => Some(id),
                        None => bail!(
                            "Feed '{}' references unknown category '{}'",
                            feed.slug,
                            slug
                        ),
                    },
                },
            };

            // A feed keyed by URL under an old slug takes the new slug, so the
            // upsert below updates that row instead of tripping UNIQUE(url)
            sqlx::query(
                r#"
                UPDATE feeds SET slug = ?
                WHERE url = ? AND slug <> ?
                  AND NOT EXISTS (SELECT 1 FROM feeds WHERE slug = ?)
            "#,
            )
            .bind(&feed.slug)
            .bind(&feed.url)
            .bind(&feed.slug)
            .bind(&feed.slug)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to rename feed '{}'", feed.slug))?;

            sqlx::query(
                r#"
                INSERT INTO feeds (source_id, category_id, url, name, slug, active)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(slug) DO UPDATE SET
                    source_id = excluded.source_id,
                    category_id = excluded.category_id,
                    url = excluded.url,
                    name = excluded.name,
                    active = excluded.active
            "#,
            )
            .bind(source_id)
            .bind(category_id)
            .bind(&feed.url)
            .bind(&feed.name)
            .bind(&feed.slug)
            .bind(feed.active)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to upsert feed '{}'", feed.slug))?;
        }

        tx.commit().await?;

        let summary = CatalogSyncSummary {
            categories: catalog.categories.len(),
            sources: catalog.sources.len(),
            feeds: catalog.feeds.len(),
        };
        tracing::info!(
            categories = summary.categories,
            sources = summary.sources,
            feeds = summary.feeds,
            "Catalog synced"
        );
        Ok(summary)
    }

    // ========================================================================
    // Source Queries
    // ========================================================================

    /// Get all sources ordered by name
    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        let sources = sqlx::query_as::<_, Source>(
            "SELECT id, name, slug, website_url, logo_url, active FROM sources ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(sources)
    }

    pub async fn get_source(&self, source_id: i64) -> Result<Option<Source>> {
        let source = sqlx::query_as::<_, Source>(
            "SELECT id, name, slug, website_url, logo_url, active FROM sources WHERE id = ?",
        )
        .bind(source_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(source)
    }

    pub async fn find_source_by_slug(&self, slug: &str) -> Result<Option<Source>> {
        let source = sqlx::query_as::<_, Source>(
            "SELECT id, name, slug, website_url, logo_url, active FROM sources WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(source)
    }

    /// Toggle whether a source's feeds are fetched
    pub async fn set_source_active(&self, source_id: i64, active: bool) -> Result<()> {
        sqlx::query("UPDATE sources SET active = ? WHERE id = ?")
            .bind(active)
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Resolve a slug to an ID inside an open transaction.
///
/// `table` is always one of our own table names, never caller input.
async fn lookup_id(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    table: &'static str,
    slug: &str,
) -> Result<Option<i64>> {
    let query = format!("SELECT id FROM {} WHERE slug = ?", table);
    let row: Option<(i64,)> = sqlx::query_as(&query)
        .bind(slug)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|(id,)| id))
}

#[cfg(test)]
mod tests {
    use crate::storage::{Catalog, CatalogCategory, CatalogFeed, CatalogSource, Database};

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    fn test_catalog() -> Catalog {
        Catalog {
            categories: vec![CatalogCategory {
                name: "World".to_string(),
                slug: "world".to_string(),
                order: 1,
            }],
            sources: vec![CatalogSource {
                name: "Daily Planet".to_string(),
                slug: "daily-planet".to_string(),
                website_url: "https://planet.example.com".to_string(),
                logo_url: None,
                active: true,
                categories: vec!["world".to_string()],
            }],
            feeds: vec![CatalogFeed {
                source: "daily-planet".to_string(),
                category: Some("world".to_string()),
                url: "https://planet.example.com/world.xml".to_string(),
                name: "Daily Planet World".to_string(),
                slug: "daily-planet-world".to_string(),
                active: true,
            }],
        }
    }

    #[tokio::test]
    async fn test_sync_catalog_inserts_rows() {
        let db = test_db().await;

        let summary = db.sync_catalog(&test_catalog()).await.unwrap();
        assert_eq!(summary.categories, 1);
        assert_eq!(summary.sources, 1);
        assert_eq!(summary.feeds, 1);

        let sources = db.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].slug, "daily-planet");
        assert!(sources[0].active);

        let feeds = db.list_feeds().await.unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].source_id, sources[0].id);
        assert!(feeds[0].category_id.is_some());
    }

    #[tokio::test]
    async fn test_sync_catalog_is_idempotent_and_updates() {
        let db = test_db().await;
        db.sync_catalog(&test_catalog()).await.unwrap();

        let mut catalog = test_catalog();
        catalog.sources[0].name = "The Daily Planet".to_string();
        catalog.feeds[0].active = false;
        db.sync_catalog(&catalog).await.unwrap();

        let sources = db.list_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "The Daily Planet");

        let feeds = db.list_feeds().await.unwrap();
        assert_eq!(feeds.len(), 1);
        assert!(!feeds[0].active);
    }

    #[tokio::test]
    async fn test_sync_catalog_unknown_source_rolls_back() {
        let db = test_db().await;

        let mut catalog = test_catalog();
        catalog.feeds[0].source = "nobody".to_string();
        let err = db.sync_catalog(&catalog).await.unwrap_err();
        assert!(err.to_string().contains("unknown source 'nobody'"));

        // Nothing from the failed sync was committed
        assert!(db.list_sources().await.unwrap().is_empty());
        assert!(db.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sync_catalog_resolves_previously_stored_slugs() {
        let db = test_db().await;
        db.sync_catalog(&test_catalog()).await.unwrap();

        let extra = Catalog {
            categories: vec![],
            sources: vec![],
            feeds: vec![CatalogFeed {
                source: "daily-planet".to_string(),
                category: None,
                url: "https://planet.example.com/all.xml".to_string(),
                name: "Daily Planet All".to_string(),
                slug: "daily-planet-all".to_string(),
                active: true,
            }],
        };
        db.sync_catalog(&extra).await.unwrap();

        let feeds = db.list_feeds().await.unwrap();
        assert_eq!(feeds.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_catalog_renamed_feed_slug_keeps_row() {
        let db = test_db().await;
        db.sync_catalog(&test_catalog()).await.unwrap();
        let before = db.list_feeds().await.unwrap();

        let mut catalog = test_catalog();
        catalog.feeds[0].slug = "planet-world".to_string();
        catalog.feeds[0].name = "Planet World".to_string();
        let summary = db.sync_catalog(&catalog).await.unwrap();
        assert_eq!(summary.feeds, 1);

        let feeds = db.list_feeds().await.unwrap();
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].id, before[0].id);
        assert_eq!(feeds[0].slug, "planet-world");
        assert_eq!(feeds[0].name, "Planet World");
        assert_eq!(feeds[0].url, "https://planet.example.com/world.xml");
    }

    #[tokio::test]
    async fn test_set_source_active() {
        let db = test_db().await;
        db.sync_catalog(&test_catalog()).await.unwrap();
        let source = db
            .find_source_by_slug("daily-planet")
            .await
            .unwrap()
            .unwrap();

        db.set_source_active(source.id, false).await.unwrap();

        let source = db.get_source(source.id).await.unwrap().unwrap();
        assert!(!source.active);
    }
}
