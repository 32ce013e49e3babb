//! Feed retrieval and catalog loading.
//!
//! - [`parser`] - RSS/Atom/JSON Feed parsing into [`RawEntry`] values via `feed-rs`
//! - [`fetcher`] - bounded HTTP retrieval behind the [`FeedFetcher`] trait
//! - [`catalog`] - TOML catalog files describing sources, categories and feeds

pub mod catalog;
mod fetcher;
mod parser;

pub use catalog::CatalogError;
pub use fetcher::{FeedFetcher, FetchError, HttpFetcher};
pub use parser::{parse_feed, RawEntry};
