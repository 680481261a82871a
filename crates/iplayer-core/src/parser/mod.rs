//! HTML parsers for iPlayer pages
//!
//! This module contains the markup scanner and the parsers built on it:
//! - `scan`: Depth-first walk over a parsed document
//! - `series`: Parse a program's series navigation
//! - `episodes`: Parse one page of a series' episode listing

pub mod episodes;
pub mod scan;
pub mod series;

// Re-export main parsing functions
pub use episodes::{is_pagination_href, parse_episode_page, EpisodePage};
pub use scan::{scan, walk, ScanNode};
pub use series::parse_series_links;
