//! The ingestion pipeline.
//!
//! Per entry: [`normalize`] → dedup check → [`is_newsflash`] →
//! [`CategoryResolver`] → store write. [`Ingestor`] runs that loop for one
//! feed, one source or every active feed, and returns a JSON-serializable
//! report. Failures stay at the level where they happen: a bad item is
//! counted and skipped, and a failed feed contributes zero.

mod category;
mod newsflash;
mod normalize;
mod orchestrator;
mod report;
mod slug;

pub use category::CategoryResolver;
pub use newsflash::{is_newsflash, NEWSFLASH_WINDOW_SECS};
pub use normalize::{normalize, Candidate, Rejection, EXCERPT_MAX_CHARS};
pub use orchestrator::{IngestError, Ingestor};
pub use report::{FeedReport, RunReport, SourceReport, UnitCount};
pub use slug::{generate_slug, MAX_SLUG_CHARS};
