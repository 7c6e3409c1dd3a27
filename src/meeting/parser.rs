//! Plain-text meeting notes parser

use super::models::*;
use regex::Regex;
use std::sync::LazyLock;

/// Number of lines after the title scanned for metadata
const METADATA_LINES: usize = 10;

static FIRST_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(\d+)").ok());
static BRACKETED: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\[([^\]]*)\]").ok());

/// Parse meeting notes text into sections, groups and items.
///
/// Expected layout:
///
/// ```text
/// Meeting Notes: Weekly Sync
/// **Date:** 2024-03-01
/// **Attendees:** 5
/// ---
/// ### 1. Updates
/// #### Engineering
/// - Shipped the importer
///   - behind a flag
/// Meeting Adjourned at: 11:00
/// ```
///
/// Lines before the first `###` heading of the body are ignored. Without a
/// `---` separator the body starts right after the title line.
pub fn parse_meeting_notes(text: &str) -> MeetingNotes {
    let lines: Vec<&str> = text.lines().collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return MeetingNotes::default();
    };

    let title = lines[first]
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_start_matches("Meeting Notes:")
        .trim()
        .to_string();

    let separator = lines
        .iter()
        .skip(first + 1)
        .position(|l| l.trim() == "---")
        .map(|i| i + first + 1);

    let header_end = separator.unwrap_or(lines.len().min(first + 1 + METADATA_LINES));
    let mut metadata = parse_metadata(&lines[first + 1..header_end]);
    metadata.end_time = lines.iter().find_map(|l| value_after(l, "Meeting Adjourned at:"));

    let body_start = separator.map(|i| i + 1).unwrap_or(first + 1);
    let sections = split_sections(&lines[body_start..])
        .into_iter()
        .map(|(heading, body)| parse_section(heading, body))
        .collect();

    MeetingNotes {
        title,
        metadata,
        sections,
    }
}

fn parse_metadata(lines: &[&str]) -> MeetingMetadata {
    let mut metadata = MeetingMetadata::default();
    for line in lines.iter().take(METADATA_LINES) {
        if let Some(date) = value_after(line, "Date:") {
            metadata.date = Some(date);
        } else if let Some(topic) = value_after(line, "Topic:") {
            metadata.topic = Some(topic);
        } else if let Some(attendees) = value_after(line, "Attendees:") {
            metadata.attendees_count = Some(first_number(&attendees).unwrap_or(0));
        } else if let Some(facilitator) = value_after(line, "Facilitator:") {
            metadata.facilitator = Some(bracketed(&facilitator).unwrap_or(facilitator));
        } else if line.contains("Meeting Adjourned at:") {
            continue;
        } else if let Some(time) = value_after(line, "Time:") {
            metadata.time = Some(time);
        }
    }
    metadata
}

/// Text after `key`, without surrounding whitespace or bold markers
fn value_after(line: &str, key: &str) -> Option<String> {
    let (_, rest) = line.split_once(key)?;
    let value = rest.trim().trim_matches('*').trim();
    Some(value.to_string())
}

fn first_number(text: &str) -> Option<u32> {
    let re = FIRST_NUMBER.as_ref()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn bracketed(text: &str) -> Option<String> {
    let re = BRACKETED.as_ref()?;
    Some(re.captures(text)?.get(1)?.as_str().trim().to_string())
}

/// Group body lines under their `### ` headings
fn split_sections<'a>(lines: &[&'a str]) -> Vec<(&'a str, Vec<&'a str>)> {
    let mut sections: Vec<(&str, Vec<&str>)> = Vec::new();
    for &line in lines {
        if let Some(heading) = line.trim_start().strip_prefix("### ") {
            sections.push((heading, Vec::new()));
        } else if let Some((_, body)) = sections.last_mut() {
            body.push(line);
        }
    }
    sections
}

fn parse_section(heading: &str, body: Vec<&str>) -> MeetingSection {
    let title = heading
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ' ')
        .trim_matches('*')
        .trim()
        .to_string();

    let mut content: Vec<MeetingSubsection> = Vec::new();
    for raw in body {
        let line = raw.trim();
        if line.is_empty() || line == "---" || line.contains("Meeting Adjourned at:") {
            continue;
        }

        if line.starts_with("####") || (line.len() > 4 && line.starts_with("**") && line.ends_with("**")) {
            content.push(MeetingSubsection {
                subtitle: line.trim_matches(|c| c == '#' || c == '*' || c == ' ').to_string(),
                items: Vec::new(),
            });
            continue;
        }

        let indented = raw.len() - raw.trim_start().len() >= 2;
        if let Some(text) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            let text = text.trim().to_string();
            if indented {
                if let Some(item) = content.last_mut().and_then(|s| s.items.last_mut()) {
                    item.subitems.push(text);
                    continue;
                }
            }
            current_group(&mut content).items.push(MeetingItem {
                text,
                subitems: Vec::new(),
            });
        } else if let Some(item) = content.last_mut().and_then(|s| s.items.last_mut()) {
            item.text.push(' ');
            item.text.push_str(line);
        }
    }

    MeetingSection { title, content }
}

/// Last group of the section, creating an untitled one if needed
fn current_group(content: &mut Vec<MeetingSubsection>) -> &mut MeetingSubsection {
    if content.is_empty() {
        content.push(MeetingSubsection::default());
    }
    let last = content.len() - 1;
    &mut content[last]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Meeting Notes: Weekly Product Sync
**Date:** 2024-03-01
**Topic:** Q2 planning
Time: 10:00 - 11:00
Attendees: [7 people]
Facilitator: [Dana Lee]
---
### 1. **Updates**
#### Engineering
- Importer shipped
  - behind a feature flag
  - rollout next week
- Search latency down
  by 30%
**Design**
- New onboarding flow

### 2. Action Items
- Write migration guide
Meeting Adjourned at: 11:05
";

    #[test]
    fn test_title_and_metadata() {
        let notes = parse_meeting_notes(SAMPLE);
        assert_eq!(notes.title, "Weekly Product Sync");
        assert_eq!(notes.metadata.date.as_deref(), Some("2024-03-01"));
        assert_eq!(notes.metadata.topic.as_deref(), Some("Q2 planning"));
        assert_eq!(notes.metadata.time.as_deref(), Some("10:00 - 11:00"));
        assert_eq!(notes.metadata.attendees_count, Some(7));
        assert_eq!(notes.metadata.facilitator.as_deref(), Some("Dana Lee"));
        assert_eq!(notes.metadata.end_time.as_deref(), Some("11:05"));
    }

    #[test]
    fn test_sections_groups_and_items() {
        let notes = parse_meeting_notes(SAMPLE);
        assert_eq!(notes.sections.len(), 2);

        let updates = &notes.sections[0];
        assert_eq!(updates.title, "Updates");
        assert_eq!(updates.content.len(), 2);
        assert_eq!(updates.content[0].subtitle, "Engineering");
        assert_eq!(updates.content[1].subtitle, "Design");

        let engineering = &updates.content[0].items;
        assert_eq!(engineering.len(), 2);
        assert_eq!(engineering[0].text, "Importer shipped");
        assert_eq!(
            engineering[0].subitems,
            vec!["behind a feature flag", "rollout next week"]
        );
        assert_eq!(engineering[1].text, "Search latency down by 30%");
        assert_eq!(updates.content[1].items[0].text, "New onboarding flow");
    }

    #[test]
    fn test_items_without_group_get_untitled_group() {
        let notes = parse_meeting_notes(SAMPLE);
        let actions = &notes.sections[1];
        assert_eq!(actions.title, "Action Items");
        assert_eq!(actions.content.len(), 1);
        assert_eq!(actions.content[0].subtitle, "");
        assert_eq!(actions.content[0].items.len(), 1);
    }

    #[test]
    fn test_plain_attendee_count_and_missing_separator() {
        let notes = parse_meeting_notes("Standup\nAttendees: 4\n### Notes\n- all good\n");
        assert_eq!(notes.title, "Standup");
        assert_eq!(notes.metadata.attendees_count, Some(4));
        assert_eq!(notes.sections.len(), 1);
        assert_eq!(notes.sections[0].content[0].items[0].text, "all good");
    }

    #[test]
    fn test_empty_input() {
        let notes = parse_meeting_notes("  \n\n");
        assert_eq!(notes, MeetingNotes::default());
        assert!(notes.metadata.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let value = serde_json::to_value(parse_meeting_notes(SAMPLE)).unwrap();
        assert_eq!(value["metadata"]["attendees_count"], 7);
        assert_eq!(value["sections"][0]["content"][0]["items"][0]["subitems"][1], "rollout next week");
        assert!(value["sections"][1]["content"][0]["items"][0].get("subitems").is_none());
    }
}
