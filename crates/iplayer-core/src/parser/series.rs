//! Series navigation parser
//!
//! Parses a program's landing page to find the pages of all its series.

use scraper::Html;

use crate::client::resolve_href;
use crate::error::{IplayerError, Result};
use crate::types::SeriesUrlMap;

use super::scan::{class_contains, element_text, scan};

/// Class marker on series navigation buttons and the current-series label
pub const SERIES_NAV_MARKER: &str = "series-nav__button";

/// Query marker on links that select another series of the same program
pub const SERIES_ID_MARKER: &str = "?seriesId=";

/// Parse the series navigation of a program page.
///
/// Anchors carrying the navigation marker and a `?seriesId=` href map
/// their label to the resolved href. A marked element that is not an
/// anchor is the series currently shown, which maps to `page_url` itself.
///
/// # Arguments
/// * `html` - Raw HTML content of the program page
/// * `page_url` - URL the page was fetched from
/// * `base_url` - Authority relative hrefs are resolved against
///
/// # Returns
/// * `Ok(SeriesUrlMap)`, empty when the program has no series navigation
/// * `Err(IplayerError::SeriesConflict)` if one name links to two pages
pub fn parse_series_links(html: &str, page_url: &str, base_url: &str) -> Result<SeriesUrlMap> {
    let document = Html::parse_document(html);
    let mut series = SeriesUrlMap::new();
    let mut failure = None;

    scan(&document, &mut |node| {
        if failure.is_some() {
            return;
        }
        let Some(element) = node.as_element() else {
            return;
        };
        if !class_contains(&element, SERIES_NAV_MARKER) {
            return;
        }

        let name = element_text(&element);
        if name.is_empty() {
            return;
        }

        let url = if element.value().name() == "a" {
            match element.value().attr("href") {
                Some(href) if href.contains(SERIES_ID_MARKER) => resolve_href(base_url, href),
                _ => return,
            }
        } else {
            Ok(page_url.to_string())
        };

        if let Err(e) = url.and_then(|url| insert_series(&mut series, name, url)) {
            failure = Some(e);
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(series),
    }
}

/// Record a series, rejecting a second, different URL for the same name.
fn insert_series(series: &mut SeriesUrlMap, name: String, url: String) -> Result<()> {
    match series.get(&name) {
        Some(existing) if *existing != url => Err(IplayerError::SeriesConflict {
            name,
            existing: existing.clone(),
            found: url,
        }),
        Some(_) => Ok(()),
        None => {
            series.insert(name, url);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.bbc.co.uk";
    const PAGE: &str = "https://www.bbc.co.uk/iplayer/episodes/b006mvsc/the-thick-of-it";

    #[test]
    fn test_parse_series_links_anchors_and_current() {
        let html = r#"
            <html><body>
              <nav>
                <span class="series-nav__button series-nav__button--selected"><span>Series 1</span></span>
                <a class="series-nav__button" href="/iplayer/episodes/b006mvsc/the-thick-of-it?seriesId=b00ds2xp"><span>Series 2</span></a>
                <a class="series-nav__button" href="/iplayer/episodes/b006mvsc/the-thick-of-it?seriesId=b00mw4x1"><span> Series 3 </span></a>
              </nav>
            </body></html>
        "#;

        let series = parse_series_links(html, PAGE, BASE).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series["Series 1"], PAGE);
        assert_eq!(
            series["Series 2"],
            "https://www.bbc.co.uk/iplayer/episodes/b006mvsc/the-thick-of-it?seriesId=b00ds2xp"
        );
        assert_eq!(
            series["Series 3"],
            "https://www.bbc.co.uk/iplayer/episodes/b006mvsc/the-thick-of-it?seriesId=b00mw4x1"
        );
    }

    #[test]
    fn test_parse_series_links_none_found() {
        let html = r#"<html><body><a href="/iplayer/episode/p01">Episode</a></body></html>"#;
        let series = parse_series_links(html, PAGE, BASE).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_parse_series_links_ignores_unmarked_and_non_series_hrefs() {
        let html = r#"
            <html><body>
              <a href="/iplayer/episodes/x?seriesId=1">Series 1</a>
              <a class="series-nav__button" href="/iplayer/episodes/x?page=2">Next</a>
              <a class="series-nav__button">No href</a>
            </body></html>
        "#;
        let series = parse_series_links(html, PAGE, BASE).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_parse_series_links_conflict_is_error() {
        let html = r#"
            <html><body>
              <a class="series-nav__button" href="/iplayer/episodes/x?seriesId=1">Series 1</a>
              <a class="series-nav__button" href="/iplayer/episodes/x?seriesId=2">Series 1</a>
            </body></html>
        "#;
        match parse_series_links(html, PAGE, BASE) {
            Err(IplayerError::SeriesConflict {
                name,
                existing,
                found,
            }) => {
                assert_eq!(name, "Series 1");
                assert_eq!(existing, "https://www.bbc.co.uk/iplayer/episodes/x?seriesId=1");
                assert_eq!(found, "https://www.bbc.co.uk/iplayer/episodes/x?seriesId=2");
            }
            other => panic!("Expected SeriesConflict, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_series_links_same_url_twice_is_fine() {
        let html = r#"
            <html><body>
              <a class="series-nav__button" href="/iplayer/episodes/x?seriesId=1">Series 1</a>
              <a class="series-nav__button" href="https://www.bbc.co.uk/iplayer/episodes/x?seriesId=1">Series 1</a>
            </body></html>
        "#;
        let series = parse_series_links(html, PAGE, BASE).unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_insert_series() {
        let mut series = SeriesUrlMap::new();
        insert_series(&mut series, "A".to_string(), "u1".to_string()).unwrap();
        insert_series(&mut series, "A".to_string(), "u1".to_string()).unwrap();
        assert!(insert_series(&mut series, "A".to_string(), "u2".to_string()).is_err());
        assert_eq!(series["A"], "u1");
    }
}
