use std::fmt;

/// Chapter identifier as parsed from a site listing. Most sites number
/// chapters with plain decimals (possibly fractional, "10.5"); a few produce
/// slugs that never parse as numbers, which are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterNumber {
    Numeric(f64),
    Text(String),
}

impl ChapterNumber {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(number) => ChapterNumber::Numeric(number),
            Err(_) => ChapterNumber::Text(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for ChapterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers render without a trailing fraction
            ChapterNumber::Numeric(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            ChapterNumber::Numeric(n) => write!(f, "{}", n),
            ChapterNumber::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chapter {
    pub number: ChapterNumber,
    pub name: Option<String>,
    pub url: String,
    /// Scan group credited with the release. `Some` only on sites that
    /// attribute releases to groups.
    pub group: Option<String>,
}

/// How competing releases of the same chapter number are reduced to one.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionPolicy {
    Interactive,
    PreferredGroup(String),
    NoPreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesField {
    Title,
    Description,
    Author,
}
