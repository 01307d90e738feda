use std::io;
use std::path::PathBuf;

use anyhow::Context;
use log::LevelFilter;

use mangacrawler::config::Config;
use mangacrawler::dedup::resolve_duplicates;
use mangacrawler::error::{Error, Result};
use mangacrawler::filter;
use mangacrawler::helpers::{build_comicinfo, clean_filename, output_name};
use mangacrawler::http;
use mangacrawler::models::{ResolutionPolicy, SeriesField};
use mangacrawler::report::{self, Reporter};
use mangacrawler::sources;

fn main() -> anyhow::Result<()> {
    let config = Config::load();
    init_logging(config.debug);
    log::debug!("Configuration: {config:?}");

    let reporter = Reporter::new(config.quiet);
    let client = http::build_client().context("failed to build HTTP client")?;

    let mut warnings: Vec<String> = Vec::new();
    for url in &config.urls {
        match process_url(url, &config, &client, reporter, &mut warnings) {
            Ok(()) => {}
            Err(Error::UnknownSite(_)) => reporter.info("Invalid input."),
            Err(error) => log::error!("Processing {url} failed: {error}"),
        }
    }

    if !warnings.is_empty() {
        println!("\nFollowing warnings were encountered during runtime:");
        for warning in &warnings {
            println!("{warning}");
        }
    }
    Ok(())
}

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn process_url(
    url: &str,
    config: &Config,
    client: &reqwest::blocking::Client,
    reporter: Reporter,
    warnings: &mut Vec<String>,
) -> Result<()> {
    let manga = sources::adapter_for_url(url, client, config.download_server.as_deref(), reporter)
        .ok_or_else(|| Error::UnknownSite(url.to_string()))?;
    log::debug!("URL match: {}", manga.site_name());

    // Initial fetch failed, skip this URL without aborting the run
    if !manga.has_page() {
        return Ok(());
    }

    if !manga.uses_groups() && matches!(config.policy, ResolutionPolicy::PreferredGroup(_)) {
        report::warn(&format!(
            "Unable to use '--prefer-group' with {}.",
            manga.site_name()
        ));
    }

    let mut chapters = manga.series_chapters()?;
    // Adapters list newest first; everything downstream works oldest first
    chapters.reverse();

    if chapters.len() > 1 {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        chapters = resolve_duplicates(
            chapters,
            &config.policy,
            manga.uses_groups(),
            &reporter,
            &mut input,
        );
    }

    if let Some(start) = &config.chapter_start {
        filter::apply_start(&mut chapters, start, &reporter);
    }
    if let Some(end) = &config.chapter_end {
        filter::apply_end(&mut chapters, end, &reporter);
    }
    if let Some(limit) = config.limit {
        // A single-chapter URL is downloaded regardless of the cap
        if !manga.init_with_chapter() {
            filter::apply_limit(&mut chapters, limit);
        }
    }

    let title = manga.series_info(SeriesField::Title)?;
    let download_dir = resolve_download_dir(config.download_directory.as_deref(), &title)?;
    log::debug!("Download directory {}", download_dir.display());

    let description = manga.series_info(SeriesField::Description).unwrap_or_default();
    let author = manga.series_info(SeriesField::Author).unwrap_or_default();
    let clean_title = clean_filename(&title, true);

    for chapter in &chapters {
        match &chapter.name {
            Some(name) => reporter.info(&format!("Chapter {} - {}", chapter.number, name)),
            None => reporter.info(&format!("Chapter {}", chapter.number)),
        }

        let file_name = output_name(&clean_title, &chapter.number, &config.file_extension);
        let comicinfo = (config.file_extension == "cbz").then(|| {
            build_comicinfo(
                &title,
                &chapter.number.to_string(),
                (!description.is_empty()).then_some(description.as_str()),
                (!author.is_empty()).then_some(author.as_str()),
            )
        });
        warnings.extend(manga.download_chapter(
            chapter,
            &download_dir,
            &file_name,
            comicinfo.as_deref(),
        )?);
    }
    Ok(())
}

/// Resolve the `-d` template, substituting the series title and creating
/// the directory when needed. Without a template everything lands in the
/// current directory.
fn resolve_download_dir(template: Option<&str>, title: &str) -> Result<PathBuf> {
    match template {
        Some(template) => {
            let resolved = template
                .replace("%title_", &clean_filename(title, true))
                .replace("%title", &clean_filename(title, false));
            let path = PathBuf::from(resolved);
            std::fs::create_dir_all(&path)?;
            Ok(path)
        }
        None => Ok(std::env::current_dir()?),
    }
}
