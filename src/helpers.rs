//! Shared helpers: filename cleaning, archive naming, chapter number
//! extraction and ComicInfo.xml generation.

use regex::Regex;

use crate::models::ChapterNumber;

/// Strip characters that are unsafe in filenames. With `underscore` set,
/// whitespace runs collapse to a single underscore.
pub fn clean_filename(name: &str, underscore: bool) -> String {
    let stripped = Regex::new(r"[/:;|]").unwrap().replace_all(name, "");
    let cleaned = if underscore {
        Regex::new(r"\s+")
            .unwrap()
            .replace_all(&stripped, "_")
            .into_owned()
    } else {
        stripped.into_owned()
    };
    cleaned.replace("__", "_")
}

/// Archive name for one chapter: numeric chapter numbers are zero-padded to
/// four digits (`Title_c0010.5.cbz`), textual ones kept as-is.
pub fn output_name(clean_title: &str, number: &ChapterNumber, extension: &str) -> String {
    match number {
        ChapterNumber::Numeric(_) => {
            let rendered = number.to_string();
            match rendered.split_once('.') {
                Some((whole, fraction)) => {
                    format!("{clean_title}_c{whole:0>4}.{fraction}.{extension}")
                }
                None => format!("{clean_title}_c{rendered:0>4}.{extension}"),
            }
        }
        ChapterNumber::Text(raw) => {
            format!("{}_{}.{}", clean_title, clean_filename(raw, true), extension)
        }
    }
}

const COUNT_WORDS: [&str; 10] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

/// Release counts below ten are spelled out in resolution reports.
pub fn release_count(count: usize) -> String {
    match COUNT_WORDS.get(count) {
        Some(word) => (*word).to_string(),
        None => count.to_string(),
    }
}

/// First decimal number found in a string.
pub fn extract_number(s: &str) -> Option<String> {
    let re = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
    re.captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Chapter number from a listing label like "Vol.2 Chapter 10.5 - Title".
/// Prefers the number after a chapter marker so volume numbers don't win.
pub fn chapter_number_from_text(text: &str) -> Option<String> {
    let re = Regex::new(r"(?i)ch(?:apter)?[.\s-]*(\d+(?:\.\d+)?)").unwrap();
    if let Some(captures) = re.captures(text) {
        return Some(captures[1].to_string());
    }
    extract_number(text)
}

/// File extension of an image URL, defaulting to jpg for unrecognized tails.
pub fn image_extension(url: &str) -> &str {
    url.rsplit('.')
        .next()
        .filter(|tail| tail.len() <= 4 && tail.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("jpg")
}

pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// ComicInfo.xml embedded in cbz archives.
pub fn build_comicinfo(
    series: &str,
    number: &str,
    summary: Option<&str>,
    writer: Option<&str>,
) -> String {
    let mut lines = vec![
        r#"<?xml version="1.0"?>"#.to_string(),
        r#"<ComicInfo xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">"#.to_string(),
        format!("  <Series>{}</Series>", xml_escape(series)),
        format!("  <Number>{}</Number>", xml_escape(number)),
    ];
    if let Some(summary) = summary {
        lines.push(format!("  <Summary>{}</Summary>", xml_escape(summary)));
    }
    if let Some(writer) = writer {
        lines.push(format!("  <Writer>{}</Writer>", xml_escape(writer)));
    }
    lines.push("</ComicInfo>".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_unsafe_filename_characters() {
        assert_eq!(clean_filename("One/Two: Three|", true), "OneTwo_Three");
        assert_eq!(clean_filename("One/Two: Three|", false), "OneTwo Three");
        assert_eq!(clean_filename("a  b", true), "a_b");
    }

    #[test]
    fn numeric_output_names_are_zero_padded() {
        let title = "Some_Title";
        assert_eq!(
            output_name(title, &ChapterNumber::Numeric(10.0), "zip"),
            "Some_Title_c0010.zip"
        );
        assert_eq!(
            output_name(title, &ChapterNumber::Numeric(10.5), "cbz"),
            "Some_Title_c0010.5.cbz"
        );
        assert_eq!(
            output_name(title, &ChapterNumber::Text("extra b".into()), "zip"),
            "Some_Title_extra_b.zip"
        );
    }

    #[test]
    fn small_release_counts_are_words() {
        assert_eq!(release_count(2), "Two");
        assert_eq!(release_count(9), "Nine");
        assert_eq!(release_count(12), "12");
    }

    #[test]
    fn chapter_numbers_prefer_the_chapter_marker() {
        assert_eq!(
            chapter_number_from_text("Vol.001 Ch.005: Prologue").as_deref(),
            Some("005")
        );
        assert_eq!(
            chapter_number_from_text("Chapter 10.5").as_deref(),
            Some("10.5")
        );
        assert_eq!(chapter_number_from_text("Special 3").as_deref(), Some("3"));
        assert_eq!(chapter_number_from_text("Omake"), None);
    }

    #[test]
    fn image_extension_falls_back_to_jpg() {
        assert_eq!(image_extension("https://cdn.example.com/p/001.png"), "png");
        assert_eq!(image_extension("https://cdn.example.com/p/001"), "jpg");
    }

    #[test]
    fn comicinfo_escapes_markup() {
        let xml = build_comicinfo("A & B", "10", Some("<spoiler>"), None);
        assert!(xml.contains("<Series>A &amp; B</Series>"));
        assert!(xml.contains("<Summary>&lt;spoiler&gt;</Summary>"));
        assert!(!xml.contains("<Writer>"));
    }
}
