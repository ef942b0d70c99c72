//! Prompt assembly for Quill
//!
//! [`build_messages`] turns a task, the user's turn and the project context
//! into the ordered message list sent to a provider. The [`serialize`] module
//! renders domain entities to the compact tagged text used inside it.

#![allow(clippy::must_use_candidate)]

pub mod builder;
pub mod context;
pub mod serialize;
pub mod tasks;

pub use builder::{ACKNOWLEDGEMENT, BuildOptions, CurrentDocument, DEFAULT_PREAMBLE, PostInstructions, build_messages};
pub use context::{ContextBundle, ContextScope};
pub use tasks::{GENERIC_TASK, TaskId, task_instructions};
