//! iPlayer Links Core Library
//!
//! This crate provides the crawling functionality behind iPlayer Links:
//! given a BBC iPlayer program page, it finds every series of the program
//! and collects direct links to all of their episodes.
//!
//! # Features
//! - Discover the series pages of a program
//! - Follow pagination within each series listing
//! - Crawl all series concurrently and group episodes by series
//! - Optionally include audio-described and sign-language episodes

pub mod client;
pub mod crawler;
pub mod error;
pub mod parser;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientConfig, IplayerClient, IPLAYER_BASE_URL};
pub use crawler::{
    aggregate_outcomes, normalize_program_url, validate_source_url, IplayerCrawler, SeriesOutcome,
};
pub use error::{IplayerError, Result};
pub use types::{
    AllEpisodes, CrawlOptions, CrawlReport, Episode, EpisodeVariant, SeriesFailure, SeriesUrlMap,
    ShowTitle, NO_SERIES,
};
