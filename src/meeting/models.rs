//! Structured meeting notes

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeetingNotes {
    pub title: String,
    #[serde(default)]
    pub metadata: MeetingMetadata,
    #[serde(default)]
    pub sections: Vec<MeetingSection>,
}

/// Header fields; absent ones are omitted from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeetingMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendees_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilitator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl MeetingMetadata {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// A `###` section
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeetingSection {
    pub title: String,
    #[serde(default)]
    pub content: Vec<MeetingSubsection>,
}

/// A `####` or `**bold**` group inside a section.
///
/// Items appearing before the first group land in one with an empty subtitle.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeetingSubsection {
    pub subtitle: String,
    #[serde(default)]
    pub items: Vec<MeetingItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MeetingItem {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subitems: Vec<String>,
}
