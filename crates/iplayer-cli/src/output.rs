//! Rendering of crawl results for the terminal or a file.

use iplayer_core::{AllEpisodes, Episode};

/// Series names in a stable order for printing.
fn sorted_series(all: &AllEpisodes) -> Vec<(&String, &Vec<Episode>)> {
    let mut series: Vec<_> = all.iter().collect();
    series.sort_by(|a, b| a.0.cmp(b.0));
    series
}

/// One episode URL per line, series by series.
pub fn render_links(all: &AllEpisodes) -> String {
    sorted_series(all)
        .into_iter()
        .flat_map(|(_, episodes)| episodes.iter().map(|e| e.url.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The whole mapping as pretty-printed JSON.
pub fn render_json(all: &AllEpisodes) -> serde_json::Result<String> {
    serde_json::to_string_pretty(all)
}

/// Total number of episodes across all series.
pub fn episode_count(all: &AllEpisodes) -> usize {
    all.values().map(Vec::len).sum()
}
