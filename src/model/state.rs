use serde::{Deserialize, Serialize};

use super::list::List;
use super::task::Task;

/// The whole application state, persisted as one JSON blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Lists in display order (append-only)
    #[serde(default)]
    pub lists: Vec<List>,
    /// Selected list. May point at a list that no longer exists.
    #[serde(default)]
    pub current_list_id: Option<String>,
    /// Completed root tasks, newest first
    #[serde(default)]
    pub archived: Vec<Task>,
    /// Showing the archive instead of a list
    #[serde(default)]
    pub viewing_archived: bool,
}

impl AppState {
    /// The state handed out on first launch: a single empty list, selected.
    pub fn seeded(list: List) -> Self {
        AppState {
            current_list_id: Some(list.id.clone()),
            lists: vec![list],
            archived: Vec::new(),
            viewing_archived: false,
        }
    }

    pub fn find_list(&self, list_id: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn find_list_mut(&mut self, list_id: &str) -> Option<&mut List> {
        self.lists.iter_mut().find(|l| l.id == list_id)
    }

    /// The selected list, if the selection still resolves
    pub fn current_list(&self) -> Option<&List> {
        self.current_list_id
            .as_deref()
            .and_then(|id| self.find_list(id))
    }

    /// Index of an archive entry
    pub fn archive_position(&self, task_id: &str) -> Option<usize> {
        self.archived.iter().position(|t| t.id == task_id)
    }

    /// The list whose live tasks include this root task id
    pub fn owning_list_id(&self, task_id: &str) -> Option<&str> {
        self.lists
            .iter()
            .find(|l| l.position(task_id).is_some())
            .map(|l| l.id.as_str())
    }
}
