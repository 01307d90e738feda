use std::path::Path;

use regex::Regex;
use reqwest::blocking::Client;
use scraper::{Html, Selector};

use crate::archive::ChapterArchive;
use crate::error::{Error, Result};
use crate::helpers::{chapter_number_from_text, image_extension};
use crate::http;
use crate::models::{Chapter, ChapterNumber, SeriesField};
use crate::report::{self, Reporter};

use super::Crawler;

pub struct KissManga {
    client: Client,
    reporter: Reporter,
    url: String,
    page: Option<Html>,
    init_with_chapter: bool,
    chapter_number: String,
}

impl KissManga {
    pub fn new(url: &str, client: Client, reporter: Reporter) -> Self {
        let chapter_re = Regex::new(r"(?i)(.*kissmanga\.com/manga/[^/?]+)/(.+)").unwrap();
        // Chapter URLs are fetched through their series page, which carries
        // the metadata and the full listing.
        let (init_with_chapter, fetch_url, chapter_number) = match chapter_re.captures(url) {
            Some(captures) => (
                true,
                captures[1].to_string(),
                chapter_number_from_text(&captures[2]).unwrap_or_else(|| "0".to_string()),
            ),
            None => (false, url.to_string(), String::new()),
        };
        let page = match http::fetch_html(&client, &fetch_url) {
            Ok(html) => Some(Html::parse_document(&html)),
            Err(error) => {
                log::error!("Initial fetch of {fetch_url} failed: {error}");
                None
            }
        };
        Self {
            client,
            reporter,
            url: url.to_string(),
            page,
            init_with_chapter,
            chapter_number,
        }
    }

    fn page(&self) -> Result<&Html> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::Parse(format!("no page loaded for {}", self.url)))
    }

    /// Reader scripts push one image URL per page into `lstImages`.
    fn chapter_images(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let script_selector = Selector::parse("script").unwrap();
        let push_re = Regex::new(r#"lstImages\.push\("(.*?)"\);"#).unwrap();

        for script in document.select(&script_selector) {
            let text: String = script.text().collect();
            if !text.contains("lstImages") {
                continue;
            }
            let images: Vec<String> = push_re
                .captures_iter(&text)
                .map(|captures| captures[1].to_string())
                .collect();
            if !images.is_empty() {
                return images;
            }
        }
        Vec::new()
    }
}

impl Crawler for KissManga {
    fn site_name(&self) -> &'static str {
        "KissManga"
    }

    fn init_with_chapter(&self) -> bool {
        self.init_with_chapter
    }

    fn has_page(&self) -> bool {
        self.page.is_some()
    }

    fn series_chapters(&self) -> Result<Vec<Chapter>> {
        if self.init_with_chapter {
            return Ok(vec![Chapter {
                number: ChapterNumber::parse(&self.chapter_number),
                name: Some(format!("Chapter {}", self.chapter_number)),
                url: self.url.clone(),
                group: None,
            }]);
        }

        let page = self.page()?;
        let link_selector = Selector::parse("table.listing td a").unwrap();
        let chapters: Vec<Chapter> = page
            .select(&link_selector)
            .filter_map(|link| {
                let href = link.value().attr("href")?;
                let name = link.text().collect::<String>().trim().to_string();
                let number = chapter_number_from_text(&name)?;
                Some(Chapter {
                    number: ChapterNumber::parse(&number),
                    name: (!name.is_empty()).then_some(name),
                    url: if href.starts_with("http") {
                        href.to_string()
                    } else {
                        format!("https://kissmanga.com{href}")
                    },
                    group: None,
                })
            })
            .collect();
        if chapters.is_empty() {
            return Err(Error::Parse(format!("no chapter list on {}", self.url)));
        }
        Ok(chapters)
    }

    fn series_info(&self, field: SeriesField) -> Result<String> {
        let page = self.page()?;
        match field {
            SeriesField::Title => super::select_text(page, "a.bigChar"),
            SeriesField::Description => {
                Ok(super::select_text(page, "div.barContent p").unwrap_or_default())
            }
            SeriesField::Author => {
                Ok(super::select_text(page, r#"a[href*="/AuthorArtist/"]"#).unwrap_or_default())
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
        let images = Self::chapter_images(&html);

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
