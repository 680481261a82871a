//! Episode list parser
//!
//! Parses one page of a series listing into episode records and the
//! pagination links that lead to the rest of the listing.

use scraper::Html;
use url::form_urlencoded;
use url::Url;

use crate::client::resolve_href;
use crate::error::{IplayerError, Result};
use crate::types::{CrawlOptions, Episode, EpisodeVariant, ShowTitle, NO_SERIES};

use super::scan::{class_contains, element_text, scan};

/// Path segment every episode link contains
pub const EPISODE_PATH_MARKER: &str = "/iplayer/episode/";

/// Query marker on links to another page of the same listing
pub const PAGE_MARKER: &str = "?page=";

/// Class marker on the heading holding the program name
pub const TITLE_MARKER: &str = "hero-header__title";

/// Container tag value of promotional links that look like episodes
const CONTEXTUAL_CTA: &str = "contextual-cta";

const HEADINGS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Everything found on one page of a series listing
#[derive(Debug, Default)]
pub struct EpisodePage {
    /// Episodes in document order
    pub episodes: Vec<Episode>,
    /// Absolute URLs of pagination links, in document order
    pub pagination: Vec<String>,
}

/// Whether an href points at another page of the same listing.
///
/// # Examples
/// ```
/// use iplayer_core::parser::is_pagination_href;
///
/// assert!(is_pagination_href("?page=2"));
/// assert!(is_pagination_href("/iplayer/episodes/b006q2x0?seriesId=m0001&page=2"));
/// assert!(!is_pagination_href("/iplayer/episode/b0074dlv"));
/// ```
pub fn is_pagination_href(href: &str) -> bool {
    href.contains(PAGE_MARKER) || href.contains("&page=")
}

/// Parse one page of a series listing.
///
/// The first title heading found is written into `show_title`; every
/// episode returned holds a handle to that same cell.
///
/// # Arguments
/// * `html` - Raw HTML content of the page
/// * `page_url` - URL the page was fetched from; pagination links resolve against it
/// * `base_url` - Authority episode links resolve against
/// * `options` - Which optional variants to keep
/// * `show_title` - Title cell shared by the series' page family
///
/// # Returns
/// * `Ok(EpisodePage)`, possibly empty
/// * `Err(IplayerError::ParseError)` if a link cannot be resolved
pub fn parse_episode_page(
    html: &str,
    page_url: &str,
    base_url: &str,
    options: &CrawlOptions,
    show_title: &ShowTitle,
) -> Result<EpisodePage> {
    let document = Html::parse_document(html);
    let mut page = EpisodePage::default();
    let mut failure = None;

    scan(&document, &mut |node| {
        if failure.is_some() {
            return;
        }
        let Some(element) = node.as_element() else {
            return;
        };
        let tag = element.value().name();

        if HEADINGS.contains(&tag) && class_contains(&element, TITLE_MARKER) {
            if show_title.get().is_none() {
                let title = element_text(&element);
                if !title.is_empty() {
                    show_title.set(title);
                }
            }
            return;
        }

        if tag != "a" {
            return;
        }
        let Some(href) = element.value().attr("href") else {
            return;
        };

        if href.contains(EPISODE_PATH_MARKER) {
            let label = element.value().attr("aria-label").unwrap_or_default();
            let series_name = element
                .value()
                .attr("data-bbc-container")
                .unwrap_or(NO_SERIES);
            if label.is_empty() || series_name == CONTEXTUAL_CTA {
                return;
            }

            let variant = EpisodeVariant::from_href(href);
            if !variant.is_included(options) {
                return;
            }

            match resolve_href(base_url, href) {
                Ok(url) => page.episodes.push(Episode {
                    show_title: show_title.clone(),
                    label: label.to_string(),
                    series_name: series_name.to_string(),
                    url,
                    is_audio_described: variant == EpisodeVariant::AudioDescribed,
                    is_sign_language: variant == EpisodeVariant::SignLanguage,
                }),
                Err(e) => failure = Some(e),
            }
        } else if is_pagination_href(href) {
            match resolve_page_href(page_url, href) {
                Ok(url) => page.pagination.push(url),
                Err(e) => failure = Some(e),
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(page),
    }
}

/// Resolve a pagination href against the page it was found on.
///
/// A query-only href (`?page=2`) updates the pairs it names and keeps the
/// rest of the current query, so a series listing stays on its series.
/// Any other href is joined as a normal link.
fn resolve_page_href(page_url: &str, href: &str) -> Result<String> {
    let Some(query) = href.strip_prefix('?') else {
        return resolve_href(page_url, href);
    };

    let mut url = Url::parse(page_url).map_err(|e| {
        IplayerError::ParseError(format!("cannot resolve {} against {}: {}", href, page_url, e))
    })?;
    let updates: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(key, _)| !updates.iter().any(|(updated, _)| updated == key))
        .collect();

    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .extend_pairs(updates);
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.bbc.co.uk";
    const PAGE: &str = "https://www.bbc.co.uk/iplayer/episodes/b006q2x0/doctor-who";

    fn parse(html: &str, options: CrawlOptions) -> (EpisodePage, ShowTitle) {
        let title = ShowTitle::new();
        let page = parse_episode_page(html, PAGE, BASE, &options, &title).unwrap();
        (page, title)
    }

    const VARIANTS_HTML: &str = r#"
        <html><body>
          <a href="/iplayer/episode/m0001/doctor-who-series-1-rose" aria-label="Rose" data-bbc-container="Series 1">Rose</a>
          <a href="/iplayer/episode/m0001/ad/doctor-who-series-1-rose" aria-label="Rose (AD)" data-bbc-container="Series 1">AD</a>
          <a href="/iplayer/episode/m0001/sign/doctor-who-series-1-rose" aria-label="Rose (Sign)" data-bbc-container="Series 1">Sign</a>
        </body></html>
    "#;

    #[test]
    fn test_parse_standard_episode() {
        let (page, _) = parse(VARIANTS_HTML, CrawlOptions::default());
        assert_eq!(page.episodes.len(), 1);
        let ep = &page.episodes[0];
        assert_eq!(ep.label, "Rose");
        assert_eq!(ep.series_name, "Series 1");
        assert_eq!(
            ep.url,
            "https://www.bbc.co.uk/iplayer/episode/m0001/doctor-who-series-1-rose"
        );
        assert!(!ep.is_audio_described);
        assert!(!ep.is_sign_language);
    }

    #[test]
    fn test_parse_variant_inclusion_law() {
        for (ad, sign) in [(false, false), (true, false), (false, true), (true, true)] {
            let (page, _) = parse(VARIANTS_HTML, CrawlOptions::new(ad, sign));
            let has_ad = page.episodes.iter().any(|e| e.is_audio_described);
            let has_sign = page.episodes.iter().any(|e| e.is_sign_language);
            let standard = page
                .episodes
                .iter()
                .filter(|e| e.variant() == EpisodeVariant::Standard)
                .count();
            assert_eq!(has_ad, ad);
            assert_eq!(has_sign, sign);
            assert_eq!(standard, 1);
        }
    }

    #[test]
    fn test_parse_skips_unlabelled_and_contextual_cta() {
        let html = r#"
            <html><body>
              <a href="/iplayer/episode/m0001/rose">No label</a>
              <a href="/iplayer/episode/m0001/rose" aria-label="">Empty label</a>
              <a href="/iplayer/episode/m0002/dalek" aria-label="Watch now" data-bbc-container="contextual-cta">CTA</a>
              <a href="/iplayer/episode/m0003/the-end-of-the-world" aria-label="The End of the World">Ok</a>
            </body></html>
        "#;
        let (page, _) = parse(html, CrawlOptions::default());
        assert_eq!(page.episodes.len(), 1);
        assert_eq!(page.episodes[0].label, "The End of the World");
        assert_eq!(page.episodes[0].series_name, NO_SERIES);
    }

    #[test]
    fn test_parse_document_order() {
        let html = r#"
            <html><body>
              <ul>
                <li><a href="/iplayer/episode/a" aria-label="First">1</a></li>
                <li><div><a href="/iplayer/episode/b" aria-label="Second">2</a></div></li>
              </ul>
              <a href="/iplayer/episode/c" aria-label="Third">3</a>
            </body></html>
        "#;
        let (page, _) = parse(html, CrawlOptions::default());
        let labels: Vec<_> = page.episodes.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_parse_title_after_episodes_is_shared() {
        let html = r#"
            <html><body>
              <a href="/iplayer/episode/a" aria-label="First">1</a>
              <h1 class="hero-header__title typo">Doctor Who</h1>
              <h2 class="hero-header__title">Not the title</h2>
              <a href="/iplayer/episode/b" aria-label="Second">2</a>
            </body></html>
        "#;
        let (page, title) = parse(html, CrawlOptions::default());
        assert_eq!(title.as_str(), "Doctor Who");
        for ep in &page.episodes {
            assert_eq!(ep.show_title.as_str(), "Doctor Who");
            assert!(ep.show_title.shares_cell(&title));
        }
    }

    #[test]
    fn test_parse_title_already_set_is_kept() {
        let title = ShowTitle::new();
        title.set("From Page One");
        let html = r#"<html><body><h1 class="hero-header__title">Other</h1></body></html>"#;
        parse_episode_page(html, PAGE, BASE, &CrawlOptions::default(), &title).unwrap();
        assert_eq!(title.as_str(), "From Page One");
    }

    #[test]
    fn test_parse_pagination_relative_to_page() {
        let html = r#"
            <html><body>
              <a href="?page=2">2</a>
              <a href="/iplayer/episodes/b006q2x0/doctor-who?seriesId=s1&amp;page=3">3</a>
            </body></html>
        "#;
        let title = ShowTitle::new();
        let page_url = format!("{}?page=1", PAGE);
        let page =
            parse_episode_page(html, &page_url, BASE, &CrawlOptions::default(), &title).unwrap();
        assert!(page.episodes.is_empty());
        assert_eq!(
            page.pagination,
            vec![
                format!("{}?page=2", PAGE),
                format!("{}?seriesId=s1&page=3", PAGE),
            ]
        );
    }

    #[test]
    fn test_parse_pagination_keeps_series_query() {
        let html = r#"<html><body><a href="?page=2">Next</a></body></html>"#;
        let title = ShowTitle::new();
        let page_url = format!("{}?seriesId=s2", PAGE);
        let page =
            parse_episode_page(html, &page_url, BASE, &CrawlOptions::default(), &title).unwrap();
        assert_eq!(page.pagination, vec![format!("{}?seriesId=s2&page=2", PAGE)]);
    }

    #[test]
    fn test_resolve_page_href_replaces_page_number() {
        let page_url = format!("{}?seriesId=s2&page=3", PAGE);
        assert_eq!(
            resolve_page_href(&page_url, "?page=4").unwrap(),
            format!("{}?seriesId=s2&page=4", PAGE)
        );
        assert_eq!(
            resolve_page_href(&page_url, "/iplayer/episodes/x?page=2").unwrap(),
            "https://www.bbc.co.uk/iplayer/episodes/x?page=2"
        );
    }

    #[test]
    fn test_parse_empty_page() {
        let (page, title) = parse("<html><body></body></html>", CrawlOptions::default());
        assert!(page.episodes.is_empty());
        assert!(page.pagination.is_empty());
        assert_eq!(title.get(), None);
    }
}
