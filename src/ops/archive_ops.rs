//! Moves between a list's live tasks and the archive.

use crate::model::state::AppState;
use crate::model::task::Task;

/// What a completion toggle ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Live root task marked done and moved to the archive
    Archived,
    /// Archived task reopened and put back at the top of its list
    Restored { list_id: String },
    /// Archived task reopened but its list is gone, so it was dropped
    Discarded(Task),
    /// Flag flipped in place (subtasks, or root tasks in an inconsistent spot)
    Flipped { done: bool },
    /// Archival skipped: the archive already holds this id
    Skipped,
}

/// Live → Archived for the root task at `index` in `list_id`.
///
/// The archive copy is stamped with the owning list's id and prepended.
pub fn archive_task(state: &mut AppState, list_id: &str, index: usize) -> Completion {
    let Some(list) = state.lists.iter_mut().find(|l| l.id == list_id) else {
        return Completion::Skipped;
    };
    let Some(task_id) = list.tasks.get(index).map(|t| t.id.clone()) else {
        return Completion::Skipped;
    };
    if state.archived.iter().any(|t| t.id == task_id) {
        return Completion::Skipped;
    }
    let mut task = list.tasks.remove(index);
    task.done = true;
    task.list_id = Some(list_id.to_string());
    state.archived.insert(0, task);
    Completion::Archived
}

/// Archived → Live for the archive entry at `index`.
///
/// The entry always leaves the archive. It goes back to the top of its
/// original list if that list still exists, otherwise it is discarded.
pub fn restore_task(state: &mut AppState, index: usize) -> Completion {
    if index >= state.archived.len() {
        return Completion::Skipped;
    }
    let mut task = state.archived.remove(index);
    task.done = false;
    let origin = task.list_id.clone();
    match origin
        .as_deref()
        .and_then(|id| state.lists.iter_mut().find(|l| l.id == id))
    {
        Some(list) => {
            let list_id = list.id.clone();
            list.tasks.insert(0, task);
            Completion::Restored { list_id }
        }
        None => Completion::Discarded(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::list::{DEFAULT_EMOJI, List};

    fn state_with_milk() -> AppState {
        let mut list = List::new("l_mis".into(), "Mis tareas".into(), DEFAULT_EMOJI.into());
        list.tasks
            .push(Task::new_root("t_milk".into(), "Buy milk".into(), "l_mis".into()));
        list.tasks
            .push(Task::new_root("t_bread".into(), "Buy bread".into(), "l_mis".into()));
        AppState::seeded(list)
    }

    #[test]
    fn archive_moves_task_to_front_of_archive() {
        let mut state = state_with_milk();
        state.archived.push(Task::new_root("t_old".into(), "Old".into(), "l_mis".into()));
        assert_eq!(archive_task(&mut state, "l_mis", 0), Completion::Archived);

        assert_eq!(state.lists[0].tasks.len(), 1);
        assert_eq!(state.lists[0].tasks[0].id, "t_bread");
        let entry = &state.archived[0];
        assert_eq!(entry.id, "t_milk");
        assert!(entry.done);
        assert_eq!(entry.list_id.as_deref(), Some("l_mis"));
    }

    #[test]
    fn archive_stamps_owning_list_even_if_task_lacked_it() {
        let mut state = state_with_milk();
        state.lists[0].tasks[0].list_id = None;
        archive_task(&mut state, "l_mis", 0);
        assert_eq!(state.archived[0].list_id.as_deref(), Some("l_mis"));
    }

    #[test]
    fn archive_is_skipped_when_id_already_archived() {
        let mut state = state_with_milk();
        let mut stale = state.lists[0].tasks[0].clone();
        stale.done = true;
        state.archived.push(stale);
        let before = state.clone();
        assert_eq!(archive_task(&mut state, "l_mis", 0), Completion::Skipped);
        assert_eq!(state, before);
    }

    #[test]
    fn restore_returns_task_to_top_of_origin() {
        let mut state = state_with_milk();
        archive_task(&mut state, "l_mis", 1);
        assert_eq!(
            restore_task(&mut state, 0),
            Completion::Restored {
                list_id: "l_mis".into()
            }
        );
        assert!(state.archived.is_empty());
        assert_eq!(state.lists[0].tasks[0].id, "t_bread");
        assert!(!state.lists[0].tasks[0].done);
    }

    #[test]
    fn restore_discards_when_origin_list_is_gone() {
        let mut state = state_with_milk();
        archive_task(&mut state, "l_mis", 0);
        state.lists.clear();
        match restore_task(&mut state, 0) {
            Completion::Discarded(task) => assert_eq!(task.id, "t_milk"),
            other => panic!("expected discard, got {:?}", other),
        }
        assert!(state.archived.is_empty());
    }

    #[test]
    fn out_of_range_indices_are_skipped() {
        let mut state = state_with_milk();
        assert_eq!(archive_task(&mut state, "l_mis", 9), Completion::Skipped);
        assert_eq!(archive_task(&mut state, "l_nope", 0), Completion::Skipped);
        assert_eq!(restore_task(&mut state, 0), Completion::Skipped);
    }
}
