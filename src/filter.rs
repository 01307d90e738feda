//! Start/end/limit trimming of a deduplicated, oldest-first chapter list.

use crate::models::Chapter;
use crate::report::Reporter;

/// Drop everything before the first chapter whose number matches `start`.
/// No match leaves the list unchanged with a fallback notice.
pub fn apply_start(chapters: &mut Vec<Chapter>, start: &str, reporter: &Reporter) {
    if chapters.len() < 2 {
        return;
    }
    match chapters
        .iter()
        .position(|chapter| chapter.number.to_string() == start)
    {
        Some(found) => {
            reporter.info(&format!(
                "Starting download at chapter {}.",
                chapters[found].number
            ));
            chapters.drain(..found);
        }
        None => reporter.info(&format!(
            "Defined start chapter not found. Starting at chapter {}.",
            chapters[0].number
        )),
    }
}

/// Drop everything after the first chapter whose number matches `end`.
pub fn apply_end(chapters: &mut Vec<Chapter>, end: &str, reporter: &Reporter) {
    if chapters.len() < 2 {
        return;
    }
    match chapters
        .iter()
        .position(|chapter| chapter.number.to_string() == end)
    {
        Some(found) => {
            reporter.info(&format!(
                "Ending download at chapter {}.",
                chapters[found].number
            ));
            chapters.truncate(found + 1);
        }
        None => reporter.info(&format!(
            "Defined end chapter not found. Ending at chapter {}.",
            chapters[chapters.len() - 1].number
        )),
    }
}

/// Cap the list at `limit` chapters counted from the front.
pub fn apply_limit(chapters: &mut Vec<Chapter>, limit: usize) {
    if chapters.len() > limit {
        log::debug!("Limiting download to {limit} chapters");
        chapters.truncate(limit);
    }
}
