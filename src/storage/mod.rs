mod articles;
mod categories;
mod feeds;
mod schema;
mod sources;
mod store;
mod types;

pub use schema::Database;
pub use store::IngestStore;
pub use types::{
    Article, Catalog, CatalogCategory, CatalogFeed, CatalogSource, CatalogSyncSummary, Category,
    DatabaseError, Feed, FeedWithSource, InsertOutcome, NewArticle, Source,
};
