//! Markdown rendering of structured meeting notes

use super::models::*;
use tokio::task::JoinHandle;

/// Render meeting notes as markdown
pub fn format_markdown(notes: &MeetingNotes) -> String {
    let mut lines: Vec<String> = Vec::new();

    let title = if notes.title.is_empty() {
        "Meeting Notes"
    } else {
        notes.title.as_str()
    };
    lines.push(format!("# {}", title));
    lines.push(String::new());

    let meta = &notes.metadata;
    if !meta.is_empty() {
        lines.push("## 📅 Meeting Details".to_string());
        lines.push(String::new());
        let fields = [
            ("Date", meta.date.clone()),
            ("Topic", meta.topic.clone()),
            ("Time", meta.time.clone()),
            ("Attendees", meta.attendees_count.map(|n| n.to_string())),
            ("Facilitator", meta.facilitator.clone()),
            ("Adjourned", meta.end_time.clone()),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                lines.push(format!("**{}:** {}", label, value));
            }
        }
        lines.push(String::new());
    }

    for section in &notes.sections {
        lines.push(format!("## 📝 {}", section.title));
        lines.push(String::new());
        for group in &section.content {
            if !group.subtitle.is_empty() {
                lines.push(format!("### {}", group.subtitle));
            }
            for item in &group.items {
                lines.push(format!("- {}", item.text));
                for sub in &item.subitems {
                    lines.push(format!("  - {}", sub));
                }
            }
            lines.push(String::new());
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Render on the blocking pool. The caller may await or drop the handle.
pub fn render_in_background(notes: MeetingNotes) -> JoinHandle<String> {
    tokio::task::spawn_blocking(move || format_markdown(&notes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meeting::parse_meeting_notes;

    #[test]
    fn test_format_full_notes() {
        let notes = MeetingNotes {
            title: "Weekly Sync".into(),
            metadata: MeetingMetadata {
                date: Some("2024-03-01".into()),
                attendees_count: Some(5),
                ..MeetingMetadata::default()
            },
            sections: vec![MeetingSection {
                title: "Updates".into(),
                content: vec![MeetingSubsection {
                    subtitle: "Engineering".into(),
                    items: vec![MeetingItem {
                        text: "Importer shipped".into(),
                        subitems: vec!["behind a flag".into()],
                    }],
                }],
            }],
        };

        let md = format_markdown(&notes);
        let expected = "# Weekly Sync\n\n\
                        ## 📅 Meeting Details\n\n\
                        **Date:** 2024-03-01\n\
                        **Attendees:** 5\n\n\
                        ## 📝 Updates\n\n\
                        ### Engineering\n\
                        - Importer shipped\n  \
                        - behind a flag";
        assert_eq!(md, expected);
    }

    #[test]
    fn test_untitled_notes_without_metadata() {
        let md = format_markdown(&MeetingNotes::default());
        assert_eq!(md, "# Meeting Notes");
    }

    #[test]
    fn test_parse_then_render_keeps_content() {
        let notes = parse_meeting_notes(
            "Meeting Notes: Retro\nDate: 2024-04-02\n---\n### Went well\n- Fast reviews\n",
        );
        let md = format_markdown(&notes);
        assert!(md.starts_with("# Retro"));
        assert!(md.contains("**Date:** 2024-04-02"));
        assert!(md.contains("## 📝 Went well"));
        assert!(md.contains("- Fast reviews"));
    }

    #[tokio::test]
    async fn test_render_in_background() {
        let notes = MeetingNotes {
            title: "Async".into(),
            ..MeetingNotes::default()
        };
        assert_eq!(render_in_background(notes).await.unwrap(), "# Async");
    }
}
