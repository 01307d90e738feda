//! Runtime configuration: a line-based config file merged with the command
//! line, command-line flags taking precedence.

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::models::ResolutionPolicy;
use crate::report;

const CONFIG_FILE: &str = "mangacrawler.conf";

#[derive(Parser, Debug)]
#[command(
    name = "mangacrawler",
    about = "Download manga chapters from supported sites into zip/cbz archives",
    version,
    // Config-file tokens are spliced before argv; later occurrences win
    args_override_self = true
)]
struct Cli {
    /// Package chapters as .cbz instead of .zip
    #[arg(long)]
    cbz: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Download directory; %title and %title_ expand to the series title
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    download_directory: Option<String>,

    /// Stop downloading after this chapter number
    #[arg(short = 'e', long = "end", value_name = "CHAPTER")]
    chapter_end: Option<String>,

    /// Resolve duplicate releases with a prompt
    #[arg(long)]
    interactive: bool,

    /// Download at most this many chapters
    #[arg(short = 'm', long = "max", value_name = "N")]
    limit: Option<usize>,

    /// Prefer this scan group when releases collide
    #[arg(long = "prefer-group", value_name = "GROUP")]
    prefer_group: Option<String>,

    /// Suppress progress output (warnings still print)
    #[arg(short, long)]
    quiet: bool,

    /// Image server override (Batoto only)
    #[arg(long, value_name = "SERVER")]
    server: Option<String>,

    /// Start downloading at this chapter number
    #[arg(short = 's', long = "start", value_name = "CHAPTER")]
    chapter_start: Option<String>,

    /// Series or chapter URLs; prompted for when omitted
    urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub chapter_end: Option<String>,
    pub chapter_start: Option<String>,
    pub debug: bool,
    pub download_directory: Option<String>,
    pub download_server: Option<String>,
    pub file_extension: String,
    pub limit: Option<usize>,
    pub policy: ResolutionPolicy,
    pub quiet: bool,
    pub urls: Vec<String>,
}

impl Config {
    /// Parse the config file and command line. File tokens are spliced in
    /// front of argv, so anything given on the command line wins.
    pub fn load() -> Self {
        let file_tokens = config_file_path()
            .map(|path| read_config_tokens(&path))
            .unwrap_or_default();
        let mut arguments: Vec<String> = vec!["mangacrawler".to_string()];
        arguments.extend(file_tokens);
        arguments.extend(std::env::args().skip(1));

        let mut config = Config::from_cli(Cli::parse_from(&arguments));
        if config.urls.is_empty() {
            config.urls = prompt_for_url();
        }
        config
    }

    fn from_cli(cli: Cli) -> Self {
        let policy = if cli.interactive {
            ResolutionPolicy::Interactive
        } else if let Some(group) = cli.prefer_group {
            ResolutionPolicy::PreferredGroup(group)
        } else {
            ResolutionPolicy::NoPreference
        };
        Config {
            chapter_end: cli.chapter_end,
            chapter_start: cli.chapter_start,
            debug: cli.debug,
            download_directory: cli.download_directory.map(expand_home),
            download_server: cli.server,
            file_extension: if cli.cbz { "cbz" } else { "zip" }.to_string(),
            limit: cli.limit,
            policy,
            quiet: cli.quiet,
            urls: cli.urls,
        }
    }
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
}

fn read_config_tokens(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(contents) => parse_config_lines(&contents),
        Err(_) => Vec::new(),
    }
}

/// Lines starting with `#` are comments; everything else is split into
/// whitespace-separated tokens treated as command-line arguments.
fn parse_config_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter(|line| !line.starts_with('#'))
        .flat_map(str::split_whitespace)
        .map(str::to_string)
        .collect()
}

fn expand_home(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).display().to_string();
        }
    }
    path
}

fn prompt_for_url() -> Vec<String> {
    report::prompt();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_ok() {
        let url = line.trim();
        if !url.is_empty() {
            return vec![url.to_string()];
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_lines_skip_comments_and_split_tokens() {
        let contents = "# mangacrawler defaults\n--cbz\n-d ~/manga/%title_\n\n# done\n";
        assert_eq!(
            parse_config_lines(contents),
            ["--cbz", "-d", "~/manga/%title_"]
        );
    }

    #[test]
    fn command_line_flags_take_precedence_over_file_tokens() {
        // File tokens first, argv last, clap keeps the last occurrence
        let cli = Cli::parse_from([
            "mangacrawler",
            "-s",
            "1",
            "-s",
            "5",
            "https://example.com/series",
        ]);
        let config = Config::from_cli(cli);
        assert_eq!(config.chapter_start.as_deref(), Some("5"));
    }

    #[test]
    fn interactive_wins_over_group_preference() {
        let cli = Cli::parse_from([
            "mangacrawler",
            "--interactive",
            "--prefer-group",
            "SomeGroup",
            "https://example.com/series",
        ]);
        let config = Config::from_cli(cli);
        assert_eq!(config.policy, ResolutionPolicy::Interactive);
    }

    #[test]
    fn group_preference_is_carried_into_the_policy() {
        let cli = Cli::parse_from([
            "mangacrawler",
            "--prefer-group",
            "SomeGroup",
            "https://example.com/series",
        ]);
        let config = Config::from_cli(cli);
        assert_eq!(
            config.policy,
            ResolutionPolicy::PreferredGroup("SomeGroup".to_string())
        );
    }

    #[test]
    fn cbz_flag_switches_the_archive_extension() {
        let plain = Config::from_cli(Cli::parse_from(["mangacrawler", "u"]));
        assert_eq!(plain.file_extension, "zip");
        let cbz = Config::from_cli(Cli::parse_from(["mangacrawler", "--cbz", "u"]));
        assert_eq!(cbz.file_extension, "cbz");
    }
}
