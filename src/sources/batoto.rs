use std::path::Path;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::Url;
use scraper::{Html, Selector};

use crate::archive::ChapterArchive;
use crate::error::{Error, Result};
use crate::helpers::{chapter_number_from_text, image_extension};
use crate::http;
use crate::models::{Chapter, ChapterNumber, SeriesField};
use crate::report::{self, Reporter};

use super::Crawler;

pub struct Batoto {
    client: Client,
    reporter: Reporter,
    url: String,
    page: Option<Html>,
    init_with_chapter: bool,
    /// Image host override; every page URL is rewritten onto this server.
    server: Option<String>,
}

impl Batoto {
    pub fn new(url: &str, client: Client, server: Option<&str>, reporter: Reporter) -> Self {
        let chapter_re = Regex::new(r"(?i)bato\.to/chapter/(\d+)").unwrap();
        let init_with_chapter = chapter_re.is_match(url);
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
            server: server.map(str::to_string),
        }
    }

    fn page(&self) -> Result<&Html> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::Parse(format!("no page loaded for {}", self.url)))
    }

    /// The reader embeds every page URL as a JSON string array.
    fn chapter_images(html: &str) -> Result<Vec<String>> {
        let re = Regex::new(r"const imgHttps = (\[[^\]]*\]);").unwrap();
        let captures = re
            .captures(html)
            .ok_or_else(|| Error::Parse("no image list in reader".to_string()))?;
        Ok(serde_json::from_str(&captures[1])?)
    }

    fn apply_server(&self, image_url: &str) -> String {
        let Some(server) = &self.server else {
            return image_url.to_string();
        };
        let host = server
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        match Url::parse(image_url) {
            Ok(mut url) => {
                if url.set_host(Some(host)).is_ok() {
                    url.to_string()
                } else {
                    image_url.to_string()
                }
            }
            Err(_) => image_url.to_string(),
        }
    }

    fn chapter_from_row(&self, row: scraper::ElementRef<'_>) -> Option<Chapter> {
        let link_selector = Selector::parse("a.chapt").unwrap();
        let group_selector = Selector::parse(r#"div.extra a[href*="/group/"]"#).unwrap();

        let link = row.select(&link_selector).next()?;
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
            url: if href.starts_with("http") {
                href.to_string()
            } else {
                format!("https://bato.to{href}")
            },
            group,
        })
    }
}

impl Crawler for Batoto {
    fn site_name(&self) -> &'static str {
        "Batoto"
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
            // The chapter page titles itself "<series> - Chapter <n>"
            let title = super::select_text(page, "title")?;
            let number = chapter_number_from_text(&title).unwrap_or_else(|| "0".to_string());
            return Ok(vec![Chapter {
                number: ChapterNumber::parse(&number),
                name: Some(format!("Chapter {number}")),
                url: self.url.clone(),
                group: None,
            }]);
        }

        let row_selector = Selector::parse("div.episode-list div.item").unwrap();
        let chapters: Vec<Chapter> = page
            .select(&row_selector)
            .filter_map(|row| self.chapter_from_row(row))
            .collect();
        if chapters.is_empty() {
            return Err(Error::Parse(format!("no chapter list on {}", self.url)));
        }
        Ok(chapters)
    }

    fn series_info(&self, field: SeriesField) -> Result<String> {
        let page = self.page()?;
        if self.init_with_chapter {
            return match field {
                SeriesField::Title => super::select_text(page, "h3.nav-title a"),
                _ => Ok(String::new()),
            };
        }
        match field {
            SeriesField::Title => super::select_text(page, "h3.item-title a"),
            SeriesField::Description => {
                Ok(super::select_text(page, "div.limit-html").unwrap_or_default())
            }
            SeriesField::Author => {
                Ok(super::select_text(page, r#"div.attr-item a[href*="author"]"#)
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
        let images = Self::chapter_images(&html)?;

        let title = self.series_info(SeriesField::Title).unwrap_or_default();
        let mut archive = ChapterArchive::create(directory, file_name, comicinfo)?;
        let mut warnings = Vec::new();

        for image_url in &images {
            let image_url = self.apply_server(image_url);
            log::debug!("Downloading image {image_url}");
            let bytes = match self
                .client
                .get(&image_url)
                .header("Referer", "https://bato.to/")
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
            archive.add_page(image_extension(&image_url), &bytes)?;
        }
        archive.finish(&self.reporter)?;
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batoto(server: Option<&str>) -> Batoto {
        Batoto {
            client: crate::http::build_client().unwrap(),
            reporter: Reporter::new(true),
            url: "https://bato.to/series/100/some-title".to_string(),
            page: None,
            init_with_chapter: false,
            server: server.map(str::to_string),
        }
    }

    #[test]
    fn reader_image_list_parses_as_json() {
        let html = r#"<script>
            const imgHttps = ["https://img1.bato.to/ch/001.webp","https://img1.bato.to/ch/002.webp"];
        </script>"#;
        let images = Batoto::chapter_images(html).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0], "https://img1.bato.to/ch/001.webp");
    }

    #[test]
    fn server_override_rewrites_the_image_host() {
        let plain = batoto(None);
        assert_eq!(
            plain.apply_server("https://img1.bato.to/ch/001.webp"),
            "https://img1.bato.to/ch/001.webp"
        );

        let overridden = batoto(Some("https://img4.bato.to/"));
        assert_eq!(
            overridden.apply_server("https://img1.bato.to/ch/001.webp"),
            "https://img4.bato.to/ch/001.webp"
        );
    }

    #[test]
    fn episode_rows_carry_groups_and_numbers() {
        let html = r#"<html><body><div class="episode-list">
            <div class="item">
                <a class="chapt" href="/chapter/200"><b>Chapter 11</b></a>
                <div class="extra"><a href="/group/77/team-a">Team A</a></div>
            </div>
            <div class="item">
                <a class="chapt" href="/chapter/199"><b>Chapter 10.5</b></a>
                <div class="extra"><a href="/group/88/team-b">Team B</a></div>
            </div>
        </div></body></html>"#;
        let mut adapter = batoto(None);
        adapter.page = Some(Html::parse_document(html));
        let chapters = adapter.series_chapters().unwrap();
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].number, ChapterNumber::Numeric(11.0));
        assert_eq!(chapters[0].group.as_deref(), Some("Team A"));
        assert_eq!(chapters[0].url, "https://bato.to/chapter/200");
        assert_eq!(chapters[1].number, ChapterNumber::Numeric(10.5));
    }
}
