use std::path::Path;

use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::archive::ChapterArchive;
use crate::error::{Error, Result};
use crate::helpers::{chapter_number_from_text, image_extension};
use crate::http;
use crate::models::{Chapter, ChapterNumber, SeriesField};
use crate::report::{self, Reporter};

use super::Crawler;

const BASE_URL: &str = "https://dynasty-scans.com";

/// Reader page entry from the embedded `var pages = [...]` array.
#[derive(Deserialize, Debug)]
struct PageEntry {
    image: String,
}

pub struct Dynasty {
    client: Client,
    reporter: Reporter,
    url: String,
    page: Option<Html>,
    init_with_chapter: bool,
}

impl Dynasty {
    pub fn new(url: &str, client: Client, reporter: Reporter) -> Self {
        let init_with_chapter = url.contains("/chapters/");
        let page = match http::fetch_html(&client, url) {
            Ok(html) => Some(Html::parse_document(&html)),
            Err(error) => {
                log::error!("Initial fetch of {url} failed: {error}");
                None
            }
        };
        Self {
            client,
            reporter,
            url: url.to_string(),
            page,
            init_with_chapter,
        }
    }

    fn page(&self) -> Result<&Html> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::Parse(format!("no page loaded for {}", self.url)))
    }

    fn extract_pages(html: &str) -> Result<Vec<String>> {
        let re = Regex::new(r"(?s)var pages = (\[.*?\]);").unwrap();
        let captures = re
            .captures(html)
            .ok_or_else(|| Error::Parse("no pages array in reader".to_string()))?;
        let entries: Vec<PageEntry> = serde_json::from_str(&captures[1])?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                if entry.image.starts_with("http") {
                    entry.image
                } else {
                    format!("{}{}", BASE_URL, entry.image)
                }
            })
            .collect())
    }

    fn chapter_from_row(&self, row: scraper::ElementRef<'_>) -> Option<Chapter> {
        let name_selector = Selector::parse("a.name").unwrap();
        let group_selector = Selector::parse(r#"a[href^="/scanlators/"]"#).unwrap();

        let link = row.select(&name_selector).next()?;
        let href = link.value().attr("href")?;
        let name = link.text().collect::<String>().trim().to_string();
        let number = chapter_number_from_text(&name).unwrap_or_else(|| name.clone());
        let group = row
            .select(&group_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string());

        Some(Chapter {
            number: ChapterNumber::parse(&number),
            name: (!name.is_empty()).then_some(name),
            url: format!("{}{}", BASE_URL, href),
            group,
        })
    }
}

impl Crawler for Dynasty {
    fn site_name(&self) -> &'static str {
        "Dynasty"
    }

    fn uses_groups(&self) -> bool {
        true
    }

    fn init_with_chapter(&self) -> bool {
        self.init_with_chapter
    }

    fn has_page(&self) -> bool {
        self.page.is_some()
    }

    fn series_chapters(&self) -> Result<Vec<Chapter>> {
        let page = self.page()?;
        if self.init_with_chapter {
            let title = super::select_text(page, "#chapter-title b")?;
            let number = chapter_number_from_text(&title).unwrap_or_else(|| title.clone());
            return Ok(vec![Chapter {
                number: ChapterNumber::parse(&number),
                name: Some(title),
                url: self.url.clone(),
                group: None,
            }]);
        }

        let row_selector = Selector::parse("dl.chapter-list dd").unwrap();
        let mut chapters: Vec<Chapter> = page
            .select(&row_selector)
            .filter_map(|row| self.chapter_from_row(row))
            .collect();
        if chapters.is_empty() {
            return Err(Error::Parse(format!("no chapter list on {}", self.url)));
        }
        // The site lists oldest first; adapters report newest first
        chapters.reverse();
        Ok(chapters)
    }

    fn series_info(&self, field: SeriesField) -> Result<String> {
        let page = self.page()?;
        if self.init_with_chapter {
            return match field {
                SeriesField::Title => super::select_text(page, "#chapter-title b"),
                _ => Ok(String::new()),
            };
        }
        match field {
            SeriesField::Title => super::select_text(page, "h2.tag-title b"),
            SeriesField::Description => {
                Ok(super::select_text(page, "div.description").unwrap_or_default())
            }
            SeriesField::Author => {
                Ok(super::select_text(page, r#"h2.tag-title a[href*="/authors/"]"#)
                    .unwrap_or_default())
            }
        }
    }

    fn download_chapter(
        &self,
        chapter: &Chapter,
        directory: &Path,
        file_name: &str,
        comicinfo: Option<&str>,
    ) -> Result<Vec<String>> {
        log::debug!("Downloading chapter {}", chapter.url);
        let html = http::fetch_html(&self.client, &chapter.url)?;
        let images = Self::extract_pages(&html)?;

        let title = self.series_info(SeriesField::Title).unwrap_or_default();
        let mut archive = ChapterArchive::create(directory, file_name, comicinfo)?;
        let mut warnings = Vec::new();

        for image_url in &images {
            log::debug!("Downloading image {image_url}");
            let bytes = match self
                .client
                .get(image_url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.bytes())
            {
                Ok(bytes) => bytes,
                Err(error) => {
                    report::warn(&format!("Unable to download file ({error})."));
                    warnings.push(format!(
                        "Download of page {}, chapter {}, series \"{}\" failed.",
                        archive.page_count() + 1,
                        chapter.number,
                        title
                    ));
                    continue;
                }
            };
            archive.add_page(image_extension(image_url), &bytes)?;
        }
        archive.finish(&self.reporter)?;
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_pages_resolve_against_the_site_root() {
        let html = r#"<script>
            var pages = [{"image":"/system/releases/ch1/01.png","name":"01"},{"image":"https://cdn.example.com/02.png","name":"02"}];
        </script>"#;
        let pages = Dynasty::extract_pages(html).unwrap();
        assert_eq!(
            pages,
            [
                "https://dynasty-scans.com/system/releases/ch1/01.png",
                "https://cdn.example.com/02.png"
            ]
        );
    }

    #[test]
    fn missing_pages_array_is_a_parse_error() {
        assert!(Dynasty::extract_pages("<html></html>").is_err());
    }

    #[test]
    fn chapter_rows_carry_group_attribution() {
        let html = r#"<html><body><dl class="chapter-list">
            <dd>
                <a class="name" href="/chapters/some_series_ch10">Chapter 10</a>
                by <a href="/scanlators/good_group">Good Group</a>
            </dd>
            <dd>
                <a class="name" href="/chapters/some_series_ch10_5">Chapter 10.5</a>
                by <a href="/scanlators/other_group">Other Group</a>
            </dd>
        </dl></body></html>"#;
        let document = Html::parse_document(html);
        let dynasty = Dynasty {
            client: crate::http::build_client().unwrap(),
            reporter: Reporter::new(true),
            url: "https://dynasty-scans.com/series/some_series".to_string(),
            page: Some(document),
            init_with_chapter: false,
        };
        let chapters = dynasty.series_chapters().unwrap();
        // Newest first
        assert_eq!(chapters[0].number, ChapterNumber::Numeric(10.5));
        assert_eq!(chapters[0].group.as_deref(), Some("Other Group"));
        assert_eq!(chapters[1].number, ChapterNumber::Numeric(10.0));
        assert_eq!(chapters[1].group.as_deref(), Some("Good Group"));
        assert_eq!(
            chapters[1].url,
            "https://dynasty-scans.com/chapters/some_series_ch10"
        );
    }
}
