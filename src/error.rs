use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed page data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Parse(String),

    #[error("no scraper matches {0}")]
    UnknownSite(String),
}
