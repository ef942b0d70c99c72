//! Domain model for Quill writing projects
//!
//! Entities the assistant reads and edits (characters, locations, timeline
//! events, chapters, worldbuilding documents, style guide entries and the
//! outline grid), the drafts and patches used to create and update them, and
//! plain-text helpers shared by the prompt builder and the tools.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod entity;
pub mod snapshot;
pub mod text;

pub use entity::*;
pub use snapshot::ProjectSnapshot;
