use anyhow::Result;

use super::schema::Database;
use super::types::Category;

impl Database {
    // ========================================================================
    // Category Queries
    // ========================================================================

    /// Get all categories ordered by display order, then name
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, display_order FROM categories ORDER BY display_order, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, slug, display_order FROM categories WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    /// Find the first category whose slug contains `fragment`.
    ///
    /// Matching is a plain substring test (`instr`), so `%` and `_` in a feed
    /// tag carry no wildcard meaning. Ties resolve by display order, then ID.
    pub async fn find_category_by_slug_fragment(&self, fragment: &str) -> Result<Option<Category>> {
        if fragment.is_empty() {
            return Ok(None);
        }
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, slug, display_order
            FROM categories
            WHERE instr(slug, ?) > 0
            ORDER BY display_order, id
            LIMIT 1
        "#,
        )
        .bind(fragment)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    /// Whether a source is registered as publishing under a category
    pub async fn source_has_category(&self, source_id: i64, category_id: i64) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM source_categories WHERE source_id = ? AND category_id = ?",
        )
        .bind(source_id)
        .bind(category_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Catalog, CatalogCategory, CatalogSource, Database};

    async fn seeded_db() -> Database {
        let db = Database::open(":memory:").await.unwrap();
        db.sync_catalog(&Catalog {
            categories: vec![
                CatalogCategory {
                    name: "Technology".to_string(),
                    slug: "technology".to_string(),
                    order: 2,
                },
                CatalogCategory {
                    name: "Biotech".to_string(),
                    slug: "biotech".to_string(),
                    order: 1,
                },
                CatalogCategory {
                    name: "Sport".to_string(),
                    slug: "sport".to_string(),
                    order: 3,
                },
            ],
            sources: vec![CatalogSource {
                name: "Wire".to_string(),
                slug: "wire".to_string(),
                website_url: "https://wire.example.com".to_string(),
                logo_url: None,
                active: true,
                categories: vec!["sport".to_string()],
            }],
            feeds: vec![],
        })
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_list_categories_ordered_by_display_order() {
        let db = seeded_db().await;

        let slugs: Vec<_> = db
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, vec!["biotech", "technology", "sport"]);
    }

    #[tokio::test]
    async fn test_slug_fragment_prefers_lowest_display_order() {
        let db = seeded_db().await;

        let found = db.find_category_by_slug_fragment("tech").await.unwrap();
        assert_eq!(found.map(|c| c.slug), Some("biotech".to_string()));

        let found = db.find_category_by_slug_fragment("port").await.unwrap();
        assert_eq!(found.map(|c| c.slug), Some("sport".to_string()));
    }

    #[tokio::test]
    async fn test_slug_fragment_is_literal() {
        let db = seeded_db().await;

        assert!(db.find_category_by_slug_fragment("%").await.unwrap().is_none());
        assert!(db.find_category_by_slug_fragment("").await.unwrap().is_none());
        assert!(db
            .find_category_by_slug_fragment("politics")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_source_has_category() {
        let db = seeded_db().await;
        let source = db.find_source_by_slug("wire").await.unwrap().unwrap();
        let sport = db.find_category_by_slug("sport").await.unwrap().unwrap();
        let biotech = db.find_category_by_slug("biotech").await.unwrap().unwrap();

        assert!(db.source_has_category(source.id, sport.id).await.unwrap());
        assert!(!db.source_has_category(source.id, biotech.id).await.unwrap());
    }
}
