use serde::{Deserialize, Serialize};

use super::task::Task;

/// Emoji assigned to lists that never picked one
pub const DEFAULT_EMOJI: &str = "📌";

/// A named container of root-level tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    pub name: String,
    #[serde(default = "default_emoji")]
    pub emoji: String,
    /// Live root-level tasks, in display order
    #[serde(default)]
    pub tasks: Vec<Task>,
}

fn default_emoji() -> String {
    DEFAULT_EMOJI.to_string()
}

impl List {
    pub fn new(id: String, name: String, emoji: String) -> Self {
        List {
            id,
            name,
            emoji,
            tasks: Vec::new(),
        }
    }

    /// Position of a root-level task in this list
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }
}
