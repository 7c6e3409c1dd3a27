//! Meeting notes: plain-text parser and markdown renderer
//!
//! `parse_meeting_notes` turns the text format agents paste in (a
//! `Meeting Notes:` title line, `Key: value` metadata, a `---` separator and
//! `###` sections) into `MeetingNotes`; `format_markdown` renders that
//! structure back into the markdown stored remotely.

mod markdown;
mod models;
mod parser;

pub use markdown::{format_markdown, render_in_background};
pub use models::*;
pub use parser::parse_meeting_notes;
