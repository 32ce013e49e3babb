//! Feed ingestion engine.
//!
//! Fetches the syndication feeds listed in a catalog, turns their entries
//! into validated articles, drops anything already stored (keyed on the
//! article's original URL) and records what each run created.

pub mod config;
pub mod feed;
pub mod ingest;
pub mod storage;
pub mod util;
