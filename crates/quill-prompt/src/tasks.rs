use strum::{Display, EnumIter, EnumString};

/// Instructions used for task ids outside the catalog
pub const GENERIC_TASK: &str = "Follow the user's instructions.";

/// Writing tasks with built-in instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum TaskId {
    Continue,
    Rewrite,
    Expand,
    Shorten,
    Describe,
    Brainstorm,
    Dialogue,
    Summarize,
    Feedback,
    Chat,
}

impl TaskId {
    /// Instructions placed in the `<task>` block
    pub const fn instructions(self) -> &'static str {
        match self {
            Self::Continue => {
                "Continue the story from where the current text ends. Match the established voice, tense and \
                 point of view. Output only the new prose."
            }
            Self::Rewrite => {
                "Rewrite the selected text according to the user's direction while preserving its meaning and \
                 the story's voice. Output only the rewritten passage."
            }
            Self::Expand => {
                "Expand the selected text with more sensory detail, interiority and pacing, keeping every \
                 existing story beat. Output only the expanded passage."
            }
            Self::Shorten => {
                "Tighten the selected text, cutting redundancy while keeping its essential beats and voice. \
                 Output only the shortened passage."
            }
            Self::Describe => {
                "Write a vivid description of what the user names, drawing on the project's characters, \
                 locations and worldbuilding."
            }
            Self::Brainstorm => {
                "Brainstorm a varied list of ideas for the user's request that fit the project's world and \
                 characters. Keep each idea to a sentence or two."
            }
            Self::Dialogue => {
                "Write dialogue for the scene the user describes. Keep each character's voice consistent with \
                 their profile."
            }
            Self::Summarize => "Summarize the given text concisely, keeping plot-relevant events and character changes.",
            Self::Feedback => {
                "Give constructive editorial feedback on the text: what works, what does not, and concrete \
                 suggestions. Do not rewrite it."
            }
            Self::Chat => {
                "Answer the author's questions about their project. Use the project context and tools to look \
                 things up instead of guessing."
            }
        }
    }
}

/// Instructions for a task id; unknown ids get [`GENERIC_TASK`]
pub fn task_instructions(task_id: &str) -> &'static str {
    task_id.parse::<TaskId>().map_or_else(
        |_| {
            tracing::debug!(task = task_id, "unknown task id, using generic instructions");
            GENERIC_TASK
        },
        TaskId::instructions,
    )
}
