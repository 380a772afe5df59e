//! # review-sentiment: review extraction and lexicon sentiment scoring
//!
//! Finds free-text user reviews in an HTML page whose structure is not known
//! in advance, scores each with a weighted word lexicon and aggregates the
//! scores into a summary report.
//!
//! ## Architecture
//!
//! - **[`config`]**: Configuration loading, validation, and defaults
//! - **[`error`]**: Library error type
//! - **[`sentiment`]**: Text normalization, the fixed lexicon, per-text scoring
//! - **[`page`]**: HTML snapshot model, page sources, content-settle watcher
//! - **[`extract`]**: Tiered review locator, deduplication, sampling
//! - **[`report`]**: Aggregation into the report shape and terminal rendering
//! - **[`analyzer`]**: End-to-end orchestration that always yields a report
//! - **[`protocol`]**: JSON-lines request handling (`analyzeReviews`, `getTabInfo`)

pub mod analyzer;
pub mod config;
pub mod error;
pub mod extract;
pub mod page;
pub mod protocol;
pub mod report;
pub mod sentiment;
