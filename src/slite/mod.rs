//! Slite HTTP client and the note-service abstraction used by `NoteManager`

pub mod client;
mod impl_note_api;
pub mod models;
pub mod traits;

pub use client::{SliteClient, DEFAULT_BASE_URL};
pub use models::*;
pub use traits::NoteApi;

#[cfg(test)]
pub(crate) mod mock;
