use std::collections::HashMap;

use serde::Serialize;

use crate::model::state::AppState;
use crate::model::task::Task;
use crate::ops::task_tree::for_each_task;

/// Structured result from `tasky check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A broken invariant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// The same id is used by more than one entity
    #[serde(rename = "duplicate_id")]
    DuplicateId { id: String, count: usize },
    /// A root task is both live and archived
    #[serde(rename = "live_and_archived")]
    LiveAndArchived { task_id: String, list_id: String },
    /// A live root task is marked done
    #[serde(rename = "done_but_live")]
    DoneButLive { task_id: String, list_id: String },
    /// An archive entry is not marked done
    #[serde(rename = "open_in_archive")]
    OpenInArchive { task_id: String },
    /// A live root task points at a different list than the one holding it
    #[serde(rename = "list_id_mismatch")]
    ListIdMismatch {
        task_id: String,
        list_id: String,
        found: Option<String>,
    },
    /// An archive entry has no origin list recorded
    #[serde(rename = "archive_without_origin")]
    ArchiveWithoutOrigin { task_id: String },
    /// A task's text is blank
    #[serde(rename = "blank_text")]
    BlankText { task_id: String },
}

/// Something odd but harmless
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Subtasks should not carry a list id
    #[serde(rename = "subtask_with_list_id")]
    SubtaskWithListId { task_id: String },
    /// The selected list no longer exists
    #[serde(rename = "dangling_selection")]
    DanglingSelection { list_id: String },
    /// An archive entry's origin list was deleted; reopening it will discard it
    #[serde(rename = "orphaned_archive_entry")]
    OrphanedArchiveEntry { task_id: String, list_id: String },
}

/// Validate the state. Read-only.
///
/// Checks performed:
/// 1. Ids are unique across lists, tasks, subtasks and the archive
/// 2. Each root task lives in exactly one of {its list, the archive}
/// 3. `done` agrees with where a root task lives
/// 4. `listId` is set on roots (matching the holding list) and absent below
/// 5. No blank text
pub fn check_state(state: &AppState) -> CheckResult {
    let mut result = CheckResult::default();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for list in &state.lists {
        *counts.entry(list.id.as_str()).or_default() += 1;
        count_ids(&list.tasks, &mut counts);
    }
    count_ids(&state.archived, &mut counts);

    // Live and archived copies of one root are reported once, as LiveAndArchived
    let archived_ids: Vec<&str> = state.archived.iter().map(|t| t.id.as_str()).collect();

    for list in &state.lists {
        for task in &list.tasks {
            if archived_ids.contains(&task.id.as_str()) {
                result.errors.push(CheckError::LiveAndArchived {
                    task_id: task.id.clone(),
                    list_id: list.id.clone(),
                });
                if let Some(c) = counts.get_mut(task.id.as_str()) {
                    *c = c.saturating_sub(1);
                }
            }
            if task.done {
                result.errors.push(CheckError::DoneButLive {
                    task_id: task.id.clone(),
                    list_id: list.id.clone(),
                });
            }
            if task.list_id.as_deref() != Some(list.id.as_str()) {
                result.errors.push(CheckError::ListIdMismatch {
                    task_id: task.id.clone(),
                    list_id: list.id.clone(),
                    found: task.list_id.clone(),
                });
            }
            check_subtasks(task, &mut result);
        }
    }

    for entry in &state.archived {
        if !entry.done {
            result.errors.push(CheckError::OpenInArchive {
                task_id: entry.id.clone(),
            });
        }
        match entry.list_id.as_deref() {
            None => result.errors.push(CheckError::ArchiveWithoutOrigin {
                task_id: entry.id.clone(),
            }),
            Some(origin) if state.find_list(origin).is_none() => {
                result.warnings.push(CheckWarning::OrphanedArchiveEntry {
                    task_id: entry.id.clone(),
                    list_id: origin.to_string(),
                })
            }
            Some(_) => {}
        }
        check_subtasks(entry, &mut result);
    }

    let mut duplicates: Vec<(&str, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
    duplicates.sort();
    for (id, count) in duplicates {
        result.errors.push(CheckError::DuplicateId {
            id: id.to_string(),
            count,
        });
    }

    for_each_root_and_sub(state, &mut |task| {
        if task.text.trim().is_empty() {
            result.errors.push(CheckError::BlankText {
                task_id: task.id.clone(),
            });
        }
    });

    if let Some(current) = &state.current_list_id
        && state.find_list(current).is_none()
    {
        result.warnings.push(CheckWarning::DanglingSelection {
            list_id: current.clone(),
        });
    }

    result.valid = result.errors.is_empty();
    result
}

fn count_ids<'a>(tasks: &'a [Task], counts: &mut HashMap<&'a str, usize>) {
    for_each_task(tasks, &mut |t, _| {
        *counts.entry(t.id.as_str()).or_default() += 1;
    });
}

fn check_subtasks(root: &Task, result: &mut CheckResult) {
    for_each_task(&root.subtasks, &mut |t, _| {
        if t.list_id.is_some() {
            result.warnings.push(CheckWarning::SubtaskWithListId {
                task_id: t.id.clone(),
            });
        }
    });
}

fn for_each_root_and_sub(state: &AppState, f: &mut dyn FnMut(&Task)) {
    for list in &state.lists {
        for_each_task(&list.tasks, &mut |t, _| f(t));
    }
    for_each_task(&state.archived, &mut |t, _| f(t));
}
