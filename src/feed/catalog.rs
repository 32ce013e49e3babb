use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

use crate::storage::Catalog;
use crate::util::validate_feed_url;

/// Maximum catalog file size (4 MB)
const MAX_CATALOG_SIZE: u64 = 4 * 1024 * 1024;

/// Errors that can occur while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in catalog file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Catalog file too large: {0} bytes (max 4 MB)")]
    TooLarge(u64),

    #[error("Duplicate {kind} slug '{slug}' in catalog")]
    DuplicateSlug { kind: &'static str, slug: String },
}

/// Load a catalog definition from a TOML file.
///
/// ```toml
/// [[categories]]
/// name = "World"
/// slug = "world"
/// order = 1
///
/// [[sources]]
/// name = "Daily Planet"
/// slug = "daily-planet"
/// website_url = "https://planet.example.com"
/// categories = ["world"]
///
/// [[feeds]]
/// source = "daily-planet"
/// category = "world"
/// name = "Daily Planet World"
/// slug = "daily-planet-world"
/// url = "https://planet.example.com/world.xml"
/// ```
pub async fn load(path: &Path) -> Result<Catalog, CatalogError> {
    let size = tokio::fs::metadata(path).await?.len();
    if size > MAX_CATALOG_SIZE {
        return Err(CatalogError::TooLarge(size));
    }
    let content = tokio::fs::read_to_string(path).await?;
    parse_catalog_content(&content)
}

/// Parse catalog TOML.
///
/// Feeds whose URL is not a public http(s) endpoint are dropped with a
/// warning. Duplicate slugs within one kind are rejected outright, since
/// the later row would silently overwrite the earlier one on sync.
pub fn parse_catalog_content(content: &str) -> Result<Catalog, CatalogError> {
    let mut catalog: Catalog = toml::from_str(content)?;

    check_unique("category", catalog.categories.iter().map(|c| &c.slug))?;
    check_unique("source", catalog.sources.iter().map(|s| &s.slug))?;
    check_unique("feed", catalog.feeds.iter().map(|f| &f.slug))?;

    catalog.feeds.retain(|feed| match validate_feed_url(&feed.url) {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                feed = %feed.slug,
                url = %feed.url,
                error = %e,
                "Skipping feed with invalid URL"
            );
            false
        }
    });

    Ok(catalog)
}

fn check_unique<'a>(
    kind: &'static str,
    slugs: impl Iterator<Item = &'a String>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for slug in slugs {
        if !seen.insert(slug.as_str()) {
            return Err(CatalogError::DuplicateSlug {
                kind,
                slug: slug.clone(),
            });
        }
    }
    Ok(())
}
