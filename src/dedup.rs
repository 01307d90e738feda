//! Duplicate release resolution.
//!
//! Competing scan groups frequently release the same chapter number; before
//! anything is downloaded, each set of duplicates has to be reduced to
//! exactly one surviving release according to the configured policy.

use std::io::BufRead;

use crate::helpers::release_count;
use crate::models::{Chapter, ResolutionPolicy};
use crate::report::{self, Reporter};

/// Collapse every run of chapters sharing a chapter number into a single
/// survivor. The list is scanned by original index and removals never
/// restart the scan; survivors keep their original order.
///
/// `input` feeds the interactive policy and is only read when that policy
/// is active.
pub fn resolve_duplicates(
    chapters: Vec<Chapter>,
    policy: &ResolutionPolicy,
    uses_groups: bool,
    reporter: &Reporter,
    input: &mut dyn BufRead,
) -> Vec<Chapter> {
    log::debug!("Searching duplicate chapters");
    let mut removed = vec![false; chapters.len()];

    for index in 0..chapters.len() {
        if removed[index] {
            continue;
        }
        let mut duplicates = vec![index];
        for later in index + 1..chapters.len() {
            if !removed[later] && chapters[later].number == chapters[index].number {
                duplicates.push(later);
            }
        }
        if duplicates.len() < 2 {
            continue;
        }

        announce(&chapters, &duplicates, uses_groups, reporter);
        let keep = match policy {
            ResolutionPolicy::Interactive => {
                pick_interactive(&chapters, &duplicates, uses_groups, reporter, input)
            }
            ResolutionPolicy::PreferredGroup(group) if uses_groups => {
                pick_preferred(&chapters, &duplicates, group, reporter)
            }
            ResolutionPolicy::PreferredGroup(_) => {
                // Site has no group attribution to match against
                log::debug!("Group preference unusable here, keeping the first release");
                pick_first(&chapters, &duplicates, uses_groups, reporter)
            }
            ResolutionPolicy::NoPreference => {
                pick_first(&chapters, &duplicates, uses_groups, reporter)
            }
        };
        for &candidate in &duplicates {
            if candidate != keep {
                removed[candidate] = true;
            }
        }
    }
    log::debug!("Duplicate chapter search finished");

    chapters
        .into_iter()
        .zip(removed)
        .filter_map(|(chapter, gone)| (!gone).then_some(chapter))
        .collect()
}

fn group_name(chapter: &Chapter) -> &str {
    chapter.group.as_deref().unwrap_or("unknown")
}

fn announce(chapters: &[Chapter], duplicates: &[usize], uses_groups: bool, reporter: &Reporter) {
    let count = release_count(duplicates.len());
    let number = &chapters[duplicates[0]].number;
    if uses_groups {
        let groups: Vec<&str> = duplicates
            .iter()
            .map(|&index| group_name(&chapters[index]))
            .collect();
        reporter.info(&format!(
            "{} releases for chapter {}: {}.",
            count,
            number,
            groups.join(", ")
        ));
    } else {
        reporter.info(&format!("{} releases for chapter {}", count, number));
    }
}

fn pick_first(
    chapters: &[Chapter],
    duplicates: &[usize],
    uses_groups: bool,
    reporter: &Reporter,
) -> usize {
    let keep = duplicates[0];
    if uses_groups {
        reporter.info(&format!(
            "No preference set. Picking {} for chapter {}.",
            group_name(&chapters[keep]),
            chapters[keep].number
        ));
    } else {
        reporter.info("No preference set. Picking first release.");
    }
    keep
}

fn pick_preferred(
    chapters: &[Chapter],
    duplicates: &[usize],
    preferred: &str,
    reporter: &Reporter,
) -> usize {
    if let Some(&keep) = duplicates
        .iter()
        .find(|&&index| chapters[index].group.as_deref() == Some(preferred))
    {
        reporter.info(&format!(
            "Preference: {}. Picking {} for chapter {}.",
            preferred,
            group_name(&chapters[keep]),
            chapters[keep].number
        ));
        return keep;
    }

    // Preferred group never released this chapter, take the latest release
    let keep = duplicates[duplicates.len() - 1];
    reporter.info(&format!(
        "Preference: {}. Not found. Picking {} for chapter {}.",
        preferred,
        group_name(&chapters[keep]),
        chapters[keep].number
    ));
    keep
}

fn pick_interactive(
    chapters: &[Chapter],
    duplicates: &[usize],
    uses_groups: bool,
    reporter: &Reporter,
    input: &mut dyn BufRead,
) -> usize {
    for (position, &candidate) in duplicates.iter().enumerate() {
        if uses_groups {
            println!("{}. {}", position + 1, group_name(&chapters[candidate]));
        } else {
            println!("{}. Release {}", position + 1, position + 1);
        }
    }

    loop {
        report::prompt();
        let mut line = String::new();
        match input.read_line(&mut line) {
            // Input closed mid-prompt, nothing more will arrive
            Ok(0) => {
                log::warn!("Input closed during release selection, keeping the first release");
                return duplicates[0];
            }
            Ok(_) => {}
            Err(error) => {
                log::warn!("Failed to read selection ({error}), keeping the first release");
                return duplicates[0];
            }
        }

        let choice = match line.trim().parse::<usize>() {
            Ok(n) if (1..=duplicates.len()).contains(&n) => n,
            _ => {
                println!("Invalid input.");
                continue;
            }
        };
        let keep = duplicates[choice - 1];
        if uses_groups {
            reporter.info(&format!(
                "Picking {} for chapter {}.",
                group_name(&chapters[keep]),
                chapters[keep].number
            ));
        } else {
            reporter.info(&format!(
                "Picking release {} for chapter {}.",
                choice, chapters[keep].number
            ));
        }
        return keep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChapterNumber;
    use std::io::Cursor;

    fn chapter(number: &str, group: Option<&str>) -> Chapter {
        Chapter {
            number: ChapterNumber::parse(number),
            name: None,
            url: format!("https://example.com/{number}"),
            group: group.map(str::to_string),
        }
    }

    fn quiet() -> Reporter {
        Reporter::new(true)
    }

    fn no_input() -> Cursor<Vec<u8>> {
        Cursor::new(Vec::new())
    }

    #[test]
    fn no_preference_keeps_the_earliest_release() {
        let chapters = vec![
            chapter("9", Some("A")),
            chapter("10", Some("A")),
            chapter("10", Some("B")),
            chapter("10", Some("C")),
            chapter("11", Some("B")),
        ];
        let resolved = resolve_duplicates(
            chapters,
            &ResolutionPolicy::NoPreference,
            true,
            &quiet(),
            &mut no_input(),
        );
        let numbers: Vec<String> = resolved.iter().map(|c| c.number.to_string()).collect();
        assert_eq!(numbers, ["9", "10", "11"]);
        assert_eq!(resolved[1].group.as_deref(), Some("A"));
    }

    #[test]
    fn preferred_group_wins_regardless_of_position() {
        let chapters = vec![
            chapter("10", Some("A")),
            chapter("10", Some("B")),
            chapter("10", Some("C")),
        ];
        let resolved = resolve_duplicates(
            chapters,
            &ResolutionPolicy::PreferredGroup("C".to_string()),
            true,
            &quiet(),
            &mut no_input(),
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].group.as_deref(), Some("C"));
    }

    #[test]
    fn missing_preferred_group_falls_back_to_the_last_release() {
        let chapters = vec![
            chapter("10", Some("A")),
            chapter("10", Some("B")),
            chapter("11", Some("A")),
        ];
        let resolved = resolve_duplicates(
            chapters,
            &ResolutionPolicy::PreferredGroup("Z".to_string()),
            true,
            &quiet(),
            &mut no_input(),
        );
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].group.as_deref(), Some("B"));
    }

    #[test]
    fn preference_degrades_to_first_release_without_group_support() {
        let chapters = vec![chapter("10", None), chapter("10", None)];
        let resolved = resolve_duplicates(
            chapters,
            &ResolutionPolicy::PreferredGroup("A".to_string()),
            false,
            &quiet(),
            &mut no_input(),
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].url, "https://example.com/10");
    }

    #[test]
    fn interactive_reprompts_on_invalid_input() {
        let chapters = vec![chapter("10", Some("A")), chapter("10", Some("B"))];
        let mut input = Cursor::new(b"abc\n1\n".to_vec());
        let resolved = resolve_duplicates(
            chapters,
            &ResolutionPolicy::Interactive,
            true,
            &quiet(),
            &mut input,
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].group.as_deref(), Some("A"));
    }

    #[test]
    fn interactive_selection_is_one_based_and_range_checked() {
        let chapters = vec![
            chapter("10", Some("A")),
            chapter("10", Some("B")),
            chapter("10", Some("C")),
        ];
        // "0" and "4" are out of range, "2" finally selects group B
        let mut input = Cursor::new(b"0\n4\n2\n".to_vec());
        let resolved = resolve_duplicates(
            chapters,
            &ResolutionPolicy::Interactive,
            true,
            &quiet(),
            &mut input,
        );
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].group.as_deref(), Some("B"));
    }

    #[test]
    fn distinct_numbers_are_left_untouched() {
        let chapters = vec![
            chapter("1", None),
            chapter("2", None),
            chapter("2.5", None),
            chapter("3", None),
        ];
        let resolved = resolve_duplicates(
            chapters,
            &ResolutionPolicy::NoPreference,
            false,
            &quiet(),
            &mut no_input(),
        );
        assert_eq!(resolved.len(), 4);
    }

    #[test]
    fn multiple_duplicate_sets_resolve_independently() {
        let chapters = vec![
            chapter("1", Some("A")),
            chapter("1", Some("B")),
            chapter("2", Some("B")),
            chapter("2", Some("A")),
        ];
        let resolved = resolve_duplicates(
            chapters,
            &ResolutionPolicy::PreferredGroup("B".to_string()),
            true,
            &quiet(),
            &mut no_input(),
        );
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].group.as_deref(), Some("B"));
        assert_eq!(resolved[1].group.as_deref(), Some("B"));
    }
}
