use std::path::Path;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use scraper::{ElementRef, Html, Selector};

use crate::archive::ChapterArchive;
use crate::error::{Error, Result};
use crate::helpers::image_extension;
use crate::http;
use crate::models::{Chapter, ChapterNumber, SeriesField};
use crate::report::{self, Reporter};

use super::Crawler;

pub struct TruyenTranhTuan {
    client: Client,
    reporter: Reporter,
    url: String,
    page: Option<Html>,
    init_with_chapter: bool,
    chapter_number: String,
}

impl TruyenTranhTuan {
    pub fn new(url: &str, client: Client, reporter: Reporter) -> Self {
        let chapter_re = Regex::new(r"(?i)truyentranhtuan\.com/(.+)-chuong-(\d+)").unwrap();
        let (init_with_chapter, chapter_number) = match chapter_re.captures(url) {
            Some(captures) => (true, captures[2].to_string()),
            None => (false, String::new()),
        };
        // A chapter page carries enough series metadata, so either URL kind
        // is fetched as-is.
        let page = match Self::fetch(&client, url) {
            Ok(html) => Some(Html::parse_document(&html)),
            Err(error) => {
                log::error!("Initial fetch of {url} failed: {error}");
                None
            }
        };
        if init_with_chapter {
            log::debug!("Adapter initialized with chapter");
        } else {
            log::debug!("Adapter initialized with series");
        }
        Self {
            client,
            reporter,
            url: url.to_string(),
            page,
            init_with_chapter,
            chapter_number,
        }
    }

    fn fetch(client: &Client, url: &str) -> Result<String> {
        // Some series sit behind an adult-confirmation cookie
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("vns_Adult=yes"));
        http::fetch_html_with_headers(client, url, headers)
    }

    fn page(&self) -> Result<&Html> {
        self.page
            .as_ref()
            .ok_or_else(|| Error::Parse(format!("no page loaded for {}", self.url)))
    }

    fn chapter_info(&self, link: ElementRef<'_>) -> Option<Chapter> {
        let href = link.value().attr("href")?.to_string();
        let number_re = Regex::new(r"(?i)(\w+)-chuong-(\w+)").unwrap();
        let number = number_re.captures(&href)?[2].to_string();
        let name = link.text().collect::<String>().trim().to_string();
        log::debug!("Chapter {number} at {href}");
        Some(Chapter {
            number: ChapterNumber::parse(&number),
            name: (!name.is_empty()).then_some(name),
            url: href,
            group: None,
        })
    }

    /// Image URLs are published through one of two script variables; the
    /// short variant lists pages out of order and is re-sorted by the
    /// numeric suffix of each filename.
    fn chapter_images(html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let script_selector = Selector::parse("script").unwrap();
        let short_re = Regex::new(r#"var slides_page_path = \["(.+)"\];"#).unwrap();
        let full_re = Regex::new(r#"var slides_page_url_path = \["(.+)"\];"#).unwrap();

        for script in document.select(&script_selector) {
            let text: String = script.text().collect();
            let (joined, needs_sort) = if let Some(captures) = short_re.captures(&text) {
                (captures[1].to_string(), true)
            } else if let Some(captures) = full_re.captures(&text) {
                (captures[1].to_string(), false)
            } else {
                continue;
            };

            let mut images: Vec<String> = joined
                .split("\",\"")
                .filter(|url| !url.is_empty())
                .map(str::to_string)
                .collect();
            if needs_sort {
                images.sort_by_key(|url| image_index(url));
            }
            return images;
        }
        Vec::new()
    }
}

fn image_index(url: &str) -> u32 {
    Regex::new(r"-(\d+)\.[A-Za-z]+$")
        .unwrap()
        .captures(url)
        .and_then(|captures| captures[1].parse().ok())
        .unwrap_or(0)
}

impl Crawler for TruyenTranhTuan {
    fn site_name(&self) -> &'static str {
        "TruyenTranhTuan"
    }

    fn init_with_chapter(&self) -> bool {
        self.init_with_chapter
    }

    fn has_page(&self) -> bool {
        self.page.is_some()
    }

    fn series_chapters(&self) -> Result<Vec<Chapter>> {
        if self.init_with_chapter {
            log::debug!("Fetching single chapter");
            return Ok(vec![Chapter {
                number: ChapterNumber::parse(&self.chapter_number),
                name: Some(format!("Chapter {}", self.chapter_number)),
                url: self.url.clone(),
                group: None,
            }]);
        }

        log::debug!("Fetching series chapters");
        let page = self.page()?;
        let row_selector = Selector::parse("#manga-chapter span.chapter-name a").unwrap();
        let chapters: Vec<Chapter> = page
            .select(&row_selector)
            .filter_map(|link| self.chapter_info(link))
            .collect();
        if chapters.is_empty() {
            return Err(Error::Parse(format!("no chapter list on {}", self.url)));
        }
        Ok(chapters)
    }

    fn series_info(&self, field: SeriesField) -> Result<String> {
        let page = self.page()?;
        match field {
            SeriesField::Title => {
                if self.init_with_chapter {
                    super::select_text(page, "a.mangaName")
                } else {
                    super::select_text(page, r#"h1[itemprop="name"]"#)
                }
            }
            SeriesField::Description => {
                if self.init_with_chapter {
                    Ok(String::new())
                } else {
                    Ok(super::select_text(page, "#manga-summary p").unwrap_or_default())
                }
            }
            SeriesField::Author => {
                Ok(super::select_text(page, r#"a[href*="/danh-sach-truyen/"]"#).unwrap_or_default())
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
        let html = Self::fetch(&self.client, &chapter.url)?;
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
