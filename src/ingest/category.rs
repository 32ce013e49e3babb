use crate::storage::{Category, IngestStore};

/// Best-effort topic assignment for articles from feeds without a fixed
/// category.
///
/// Takes the entry's first tag, lower-cased, and looks for a category whose
/// slug contains it. The match only counts if the article's source is
/// registered against that category. Every miss, including store errors, is
/// `None`.
pub struct CategoryResolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: IngestStore + ?Sized> CategoryResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, tags: &[String], source_id: i64) -> Option<Category> {
        let tag = tags.first()?.trim().to_lowercase();
        if tag.is_empty() {
            return None;
        }

        let category = match self.store.find_category_by_slug_fragment(&tag).await {
            Ok(found) => found?,
            Err(e) => {
                tracing::warn!(tag = %tag, error = %e, "Category lookup failed");
                return None;
            }
        };

        match self.store.source_has_category(source_id, category.id).await {
            Ok(true) => Some(category),
            Ok(false) => {
                tracing::debug!(
                    tag = %tag,
                    category = %category.slug,
                    source_id,
                    "Source not registered for matched category"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    category = %category.slug,
                    error = %e,
                    "Category registration check failed"
                );
                None
            }
        }
    }
}
