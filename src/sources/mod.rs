//! Per-site scrapers. Each adapter translates one site's HTML into the
//! shared chapter model and knows how to pull a chapter's pages into an
//! archive. Sites are fixed; dispatch is an explicit first-match walk over
//! the known URL patterns.

pub mod batoto;
pub mod dynasty;
pub mod kissmanga;
pub mod truyentranhtuan;

use std::path::Path;

use reqwest::blocking::Client;
use scraper::{Html, Selector};

use crate::error::{Error, Result};
use crate::models::{Chapter, SeriesField};
use crate::report::Reporter;

pub trait Crawler {
    fn site_name(&self) -> &'static str;

    /// Whether this site attributes releases to scan groups.
    fn uses_groups(&self) -> bool {
        false
    }

    /// True when the adapter was built from a single-chapter URL rather
    /// than a series page.
    fn init_with_chapter(&self) -> bool;

    /// False when the initial page fetch failed; the URL is then skipped.
    fn has_page(&self) -> bool;

    /// Chapter listing in site order, newest release first.
    fn series_chapters(&self) -> Result<Vec<Chapter>>;

    fn series_info(&self, field: SeriesField) -> Result<String>;

    /// Download every page of `chapter` into `directory/file_name`,
    /// returning a warning per page that could not be fetched.
    fn download_chapter(
        &self,
        chapter: &Chapter,
        directory: &Path,
        file_name: &str,
        comicinfo: Option<&str>,
    ) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Site {
    Batoto,
    Dynasty,
    KissManga,
    TruyenTranhTuan,
}

fn match_site(url: &str) -> Option<Site> {
    let lowered = url.to_lowercase();
    if lowered.contains("bato.to/") {
        Some(Site::Batoto)
    } else if lowered.contains("dynasty-scans.com/") {
        Some(Site::Dynasty)
    } else if lowered.contains("kissmanga.com/manga/") {
        Some(Site::KissManga)
    } else if lowered.contains("truyentranhtuan.com/") {
        Some(Site::TruyenTranhTuan)
    } else {
        None
    }
}

/// First matching adapter for the URL, or `None` for unrecognized sites.
pub fn adapter_for_url(
    url: &str,
    client: &Client,
    download_server: Option<&str>,
    reporter: Reporter,
) -> Option<Box<dyn Crawler>> {
    match match_site(url)? {
        Site::Batoto => Some(Box::new(batoto::Batoto::new(
            url,
            client.clone(),
            download_server,
            reporter,
        ))),
        Site::Dynasty => Some(Box::new(dynasty::Dynasty::new(url, client.clone(), reporter))),
        Site::KissManga => Some(Box::new(kissmanga::KissManga::new(
            url,
            client.clone(),
            reporter,
        ))),
        Site::TruyenTranhTuan => Some(Box::new(truyentranhtuan::TruyenTranhTuan::new(
            url,
            client.clone(),
            reporter,
        ))),
    }
}

/// Text of the first element matching `css`, trimmed.
pub(crate) fn select_text(document: &Html, css: &str) -> Result<String> {
    let selector =
        Selector::parse(css).map_err(|_| Error::Parse(format!("bad selector: {css}")))?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .ok_or_else(|| Error::Parse(format!("no element matches {css}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_matches_known_sites() {
        assert_eq!(
            match_site("https://bato.to/series/12345/some-title"),
            Some(Site::Batoto)
        );
        assert_eq!(
            match_site("https://dynasty-scans.com/series/some_series"),
            Some(Site::Dynasty)
        );
        assert_eq!(
            match_site("https://kissmanga.com/manga/Some-Series"),
            Some(Site::KissManga)
        );
        assert_eq!(
            match_site("http://truyentranhtuan.com/some-series/"),
            Some(Site::TruyenTranhTuan)
        );
        assert_eq!(match_site("https://example.com/series/1"), None);
    }

    #[test]
    fn dispatch_ignores_case() {
        assert_eq!(
            match_site("https://KissManga.com/Manga/Some-Series"),
            Some(Site::KissManga)
        );
        assert_eq!(
            match_site("http://TruyenTranhTuan.com/series"),
            Some(Site::TruyenTranhTuan)
        );
    }

    #[test]
    fn select_text_trims_the_first_match() {
        let document = Html::parse_document(
            "<html><body><h1 itemprop=\"name\"> A Title </h1><h1>Other</h1></body></html>",
        );
        assert_eq!(
            select_text(&document, r#"h1[itemprop="name"]"#).unwrap(),
            "A Title"
        );
        assert!(select_text(&document, "h2.missing").is_err());
    }
}
