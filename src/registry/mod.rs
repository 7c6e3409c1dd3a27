//! Local registry of notes and folders
//!
//! The remote service has no list API, so every note and folder created
//! through this crate is mirrored in a JSON document on disk together with
//! the folder hierarchy. `RegistryStore` only performs local mutations;
//! sequencing them after remote confirmation is `NoteManager`'s job.

pub mod models;
pub mod store;

pub use models::*;
pub use store::RegistryStore;
