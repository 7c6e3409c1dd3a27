//! Note and folder operations
//!
//! `NoteManager` sequences every mutation remote-first: the remote service
//! must confirm before the local registry changes, and the registry is saved
//! before the operation reports success.

pub mod deferred;
pub mod manager;
pub mod models;

pub use deferred::DeferredAction;
pub use manager::NoteManager;
pub use models::*;
