//! Data types for the iPlayer crawler
//!
//! This module contains the core data structures produced by a crawl.
//! Episodes serialize to JSON so front ends can print or save them.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::IplayerError;

/// Series name used when a program has no series navigation, or an
/// episode anchor carries no container tag.
pub const NO_SERIES: &str = "none";

/// Mapping from series display name to its page URL
pub type SeriesUrlMap = HashMap<String, String>;

/// Mapping from series name to the episodes scraped for it
pub type AllEpisodes = HashMap<String, Vec<Episode>>;

/// Show title shared by every episode scraped from one page family.
///
/// The cell is written once, by the first title heading found; clones
/// point at the same cell, so episodes recorded before the heading was
/// reached still report the final title.
#[derive(Clone, Default)]
pub struct ShowTitle(Arc<OnceLock<String>>);

impl ShowTitle {
    /// Create an empty title cell
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the title. Returns `false` if a title was already set.
    pub fn set(&self, title: impl Into<String>) -> bool {
        self.0.set(title.into()).is_ok()
    }

    /// The title, if one has been found
    pub fn get(&self) -> Option<&str> {
        self.0.get().map(String::as_str)
    }

    /// The title, or an empty string if none has been found
    pub fn as_str(&self) -> &str {
        self.get().unwrap_or_default()
    }

    /// Whether both handles refer to the same cell
    pub fn shares_cell(&self, other: &ShowTitle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<String> for ShowTitle {
    fn from(title: String) -> Self {
        let cell = ShowTitle::new();
        if !title.is_empty() {
            cell.set(title);
        }
        cell
    }
}

impl fmt::Debug for ShowTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShowTitle").field(&self.get()).finish()
    }
}

impl fmt::Display for ShowTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for ShowTitle {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for ShowTitle {}

impl Serialize for ShowTitle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ShowTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(ShowTitle::from)
    }
}

/// Which stream an episode link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeVariant {
    /// The regular broadcast
    Standard,
    /// Audio-described version (`/ad/` in the link)
    AudioDescribed,
    /// Sign-language version (`/sign/` in the link)
    SignLanguage,
}

impl EpisodeVariant {
    /// Classify an episode link by its href
    pub fn from_href(href: &str) -> Self {
        if href.contains("/ad/") {
            EpisodeVariant::AudioDescribed
        } else if href.contains("/sign/") {
            EpisodeVariant::SignLanguage
        } else {
            EpisodeVariant::Standard
        }
    }

    /// Whether this variant is wanted under the given options
    pub fn is_included(self, options: &CrawlOptions) -> bool {
        match self {
            EpisodeVariant::Standard => true,
            EpisodeVariant::AudioDescribed => options.include_audio_described,
            EpisodeVariant::SignLanguage => options.include_sign_language,
        }
    }
}

/// A single episode link found on a series page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Name of the program, shared across the series' page family
    pub show_title: ShowTitle,
    /// Accessible label of the episode link
    pub label: String,
    /// Series container name, or `"none"`
    pub series_name: String,
    /// Absolute URL of the episode page
    pub url: String,
    /// Link points at the audio-described stream
    pub is_audio_described: bool,
    /// Link points at the sign-language stream
    pub is_sign_language: bool,
}

impl Episode {
    /// The variant this episode was classified as
    pub fn variant(&self) -> EpisodeVariant {
        if self.is_audio_described {
            EpisodeVariant::AudioDescribed
        } else if self.is_sign_language {
            EpisodeVariant::SignLanguage
        } else {
            EpisodeVariant::Standard
        }
    }
}

/// Which optional episode variants a crawl collects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlOptions {
    /// Include audio-described episodes
    pub include_audio_described: bool,
    /// Include sign-language episodes
    pub include_sign_language: bool,
}

impl CrawlOptions {
    /// Create options with both variant flags
    pub fn new(include_audio_described: bool, include_sign_language: bool) -> Self {
        Self {
            include_audio_described,
            include_sign_language,
        }
    }
}

/// A series whose extraction failed during a partial-success crawl
#[derive(Debug, Serialize)]
pub struct SeriesFailure {
    /// Series name as discovered in the navigation
    pub series: String,
    /// Page the extraction started from
    pub url: String,
    /// Why it failed
    pub error: IplayerError,
}

/// Result of a crawl that keeps going past failed series
#[derive(Debug, Default, Serialize)]
pub struct CrawlReport {
    /// Episodes of every series that succeeded
    pub episodes: AllEpisodes,
    /// Series that could not be extracted
    pub failures: Vec<SeriesFailure>,
}

impl CrawlReport {
    /// Whether every series was extracted
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
