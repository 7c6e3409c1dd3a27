//! Change events for notes and folders
//!
//! This module provides:
//! - `CrudEvent`: typed events emitted after every confirmed mutation
//! - `EventEmitter`: the sink trait `NoteManager` emits into
//! - `EventBus`: broadcast channel fanning events out to subscribers

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{CrudAction, CrudEvent, EntityType, EventEmitter};
