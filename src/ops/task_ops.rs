use chrono::NaiveDate;

use crate::model::state::AppState;
use crate::model::task::Task;
use crate::ops::archive_ops::{self, Completion};
use crate::ops::id_gen::{IdKind, new_id};
use crate::ops::task_tree;

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("list not found: {0}")]
    ListNotFound(String),
    #[error("no list selected")]
    NoListSelected,
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    #[error("tasks cannot be reordered while viewing the archive")]
    ArchiveView,
    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// Where a task currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskLocation {
    /// Root task in a list's live sequence
    Live { list_id: String, index: usize },
    /// Root task in the archive
    Archived { index: usize },
    /// Nested below another task, in a list or in the archive
    Subtask { parent_id: String },
}

/// Find where a task id lives. Live roots win over archive entries, which win over subtasks.
pub fn locate(state: &AppState, task_id: &str) -> Option<TaskLocation> {
    for list in &state.lists {
        if let Some(index) = list.position(task_id) {
            return Some(TaskLocation::Live {
                list_id: list.id.clone(),
                index,
            });
        }
    }
    if let Some(index) = state.archive_position(task_id) {
        return Some(TaskLocation::Archived { index });
    }
    let parent = state
        .lists
        .iter()
        .find_map(|l| task_tree::find_parent_of(&l.tasks, task_id))
        .or_else(|| task_tree::find_parent_of(&state.archived, task_id))?;
    Some(TaskLocation::Subtask {
        parent_id: parent.id.clone(),
    })
}

/// Find a task by id anywhere: live lists first, then the archive.
pub fn find_task<'a>(state: &'a AppState, task_id: &str) -> Option<&'a Task> {
    state
        .lists
        .iter()
        .find_map(|l| task_tree::find_in_forest(&l.tasks, task_id))
        .or_else(|| task_tree::find_in_forest(&state.archived, task_id))
}

pub fn find_task_mut<'a>(state: &'a mut AppState, task_id: &str) -> Option<&'a mut Task> {
    for list in state.lists.iter_mut() {
        if let Some(t) = task_tree::find_in_forest_mut(&mut list.tasks, task_id) {
            return Some(t);
        }
    }
    task_tree::find_in_forest_mut(&mut state.archived, task_id)
}

// ---------------------------------------------------------------------------
// Create / edit / delete
// ---------------------------------------------------------------------------

/// Prepend a new open task to a list. Blank text is ignored (`Ok(None)`).
pub fn add_task(state: &mut AppState, list_id: &str, text: &str) -> Result<Option<String>, TaskError> {
    let list = state
        .find_list_mut(list_id)
        .ok_or_else(|| TaskError::ListNotFound(list_id.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let id = new_id(IdKind::Task);
    list.tasks.insert(
        0,
        Task::new_root(id.clone(), text.to_string(), list_id.to_string()),
    );
    Ok(Some(id))
}

/// Append a subtask under any task (live or archived). Blank text is ignored.
pub fn add_subtask(
    state: &mut AppState,
    parent_id: &str,
    text: &str,
) -> Result<Option<String>, TaskError> {
    let parent =
        find_task_mut(state, parent_id).ok_or_else(|| TaskError::NotFound(parent_id.to_string()))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(task_tree::append_subtask(parent, text.to_string())))
}

/// Result of editing a task's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated,
    /// The text was blank, so the task was removed instead
    Deleted(Task),
}

/// Replace a task's text. Blank text deletes the task.
pub fn edit_task_text(
    state: &mut AppState,
    task_id: &str,
    new_text: &str,
) -> Result<EditOutcome, TaskError> {
    let trimmed = new_text.trim();
    if trimmed.is_empty() {
        return remove_task(state, task_id).map(EditOutcome::Deleted);
    }
    let task =
        find_task_mut(state, task_id).ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    task.text = trimmed.to_string();
    Ok(EditOutcome::Updated)
}

/// Remove a task.
///
/// A subtask leaves its parent only. A root task leaves its list and the
/// archive, wherever copies of it exist.
pub fn remove_task(state: &mut AppState, task_id: &str) -> Result<Task, TaskError> {
    let location = locate(state, task_id).ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    match location {
        TaskLocation::Live { list_id, index } => {
            let list = state
                .find_list_mut(&list_id)
                .ok_or_else(|| TaskError::ListNotFound(list_id.clone()))?;
            let task = list.tasks.remove(index);
            state.archived.retain(|t| t.id != task.id);
            Ok(task)
        }
        TaskLocation::Archived { index } => {
            let task = state.archived.remove(index);
            for list in state.lists.iter_mut() {
                list.tasks.retain(|t| t.id != task.id);
            }
            Ok(task)
        }
        TaskLocation::Subtask { .. } => state
            .lists
            .iter_mut()
            .find_map(|l| task_tree::remove_subtask(&mut l.tasks, task_id))
            .or_else(|| task_tree::remove_subtask(&mut state.archived, task_id))
            .ok_or_else(|| TaskError::NotFound(task_id.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Flip a task's `done` flag.
///
/// Root tasks move between their list and the archive. Subtasks only flip.
pub fn toggle_done(state: &mut AppState, task_id: &str) -> Result<Completion, TaskError> {
    let location = locate(state, task_id).ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    match location {
        TaskLocation::Live { list_id, index } => {
            let list = state
                .find_list_mut(&list_id)
                .ok_or_else(|| TaskError::ListNotFound(list_id.clone()))?;
            if list.tasks[index].done {
                // Done but still live (blob from an older build): reopen in place
                list.tasks[index].done = false;
                return Ok(Completion::Flipped { done: false });
            }
            Ok(archive_ops::archive_task(state, &list_id, index))
        }
        TaskLocation::Archived { index } => {
            if state.archived[index].done {
                Ok(archive_ops::restore_task(state, index))
            } else {
                state.archived[index].done = true;
                Ok(Completion::Flipped { done: true })
            }
        }
        TaskLocation::Subtask { .. } => {
            let task = find_task_mut(state, task_id)
                .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
            task.done = !task.done;
            Ok(Completion::Flipped { done: task.done })
        }
    }
}

// ---------------------------------------------------------------------------
// Due dates
// ---------------------------------------------------------------------------

/// Set or clear a task's due date.
pub fn set_due_date(
    state: &mut AppState,
    task_id: &str,
    due: Option<NaiveDate>,
) -> Result<(), TaskError> {
    let task =
        find_task_mut(state, task_id).ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    task.due_date = due;
    Ok(())
}

// ---------------------------------------------------------------------------
// Ordering and copies
// ---------------------------------------------------------------------------

/// Move the task at `from` to `to` within one list.
pub fn reorder_tasks(
    state: &mut AppState,
    list_id: &str,
    from: usize,
    to: usize,
) -> Result<(), TaskError> {
    if state.viewing_archived {
        return Err(TaskError::ArchiveView);
    }
    let list = state
        .find_list_mut(list_id)
        .ok_or_else(|| TaskError::ListNotFound(list_id.to_string()))?;
    let len = list.tasks.len();
    if from >= len || to >= len {
        return Err(TaskError::InvalidPosition(format!(
            "{} → {} (list has {} tasks)",
            from, to, len
        )));
    }
    let task = list.tasks.remove(from);
    list.tasks.insert(to, task);
    Ok(())
}

/// Deep-copy a root task of `list_id` and put the copy at the top of the same list.
/// Returns the copy's id.
pub fn duplicate_task(state: &mut AppState, list_id: &str, task_id: &str) -> Result<String, TaskError> {
    let list = state
        .find_list_mut(list_id)
        .ok_or_else(|| TaskError::ListNotFound(list_id.to_string()))?;
    let idx = list
        .position(task_id)
        .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
    let mut copy = task_tree::clone_subtree(&list.tasks[idx]);
    copy.list_id = Some(list_id.to_string());
    let id = copy.id.clone();
    list.tasks.insert(0, copy);
    Ok(id)
}

/// Drop done root tasks still sitting in a list. Completion normally archives
/// them already, so this only repairs state written by older builds.
pub fn clear_completed(state: &mut AppState, list_id: &str) -> Result<Vec<Task>, TaskError> {
    let list = state
        .find_list_mut(list_id)
        .ok_or_else(|| TaskError::ListNotFound(list_id.to_string()))?;
    let (done, open): (Vec<Task>, Vec<Task>) =
        std::mem::take(&mut list.tasks).into_iter().partition(|t| t.done);
    list.tasks = open;
    Ok(done)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
