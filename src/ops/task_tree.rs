//! Recursive helpers over task trees.
//!
//! A "forest" is any slice of root tasks: a list's `tasks` or the archive.

use crate::model::task::Task;
use crate::ops::id_gen::{IdKind, new_id};

/// Find a task anywhere below `task` (the root itself is not a match).
pub fn find_descendant<'a>(task: &'a Task, id: &str) -> Option<&'a Task> {
    find_in_forest(&task.subtasks, id)
}

pub fn find_descendant_mut<'a>(task: &'a mut Task, id: &str) -> Option<&'a mut Task> {
    find_in_forest_mut(&mut task.subtasks, id)
}

/// Find a task by id in a forest, roots included.
pub fn find_in_forest<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    for task in tasks {
        if task.id == id {
            return Some(task);
        }
        if let Some(t) = find_in_forest(&task.subtasks, id) {
            return Some(t);
        }
    }
    None
}

pub fn find_in_forest_mut<'a>(tasks: &'a mut [Task], id: &str) -> Option<&'a mut Task> {
    for task in tasks.iter_mut() {
        if task.id == id {
            return Some(task);
        }
        if let Some(t) = find_in_forest_mut(&mut task.subtasks, id) {
            return Some(t);
        }
    }
    None
}

/// The task whose `subtasks` directly contains `subtask_id`, at any depth.
pub fn find_parent_of<'a>(tasks: &'a [Task], subtask_id: &str) -> Option<&'a Task> {
    for task in tasks {
        if task.subtasks.iter().any(|s| s.id == subtask_id) {
            return Some(task);
        }
        if let Some(p) = find_parent_of(&task.subtasks, subtask_id) {
            return Some(p);
        }
    }
    None
}

pub fn find_parent_of_mut<'a>(tasks: &'a mut [Task], subtask_id: &str) -> Option<&'a mut Task> {
    for task in tasks.iter_mut() {
        if task.subtasks.iter().any(|s| s.id == subtask_id) {
            return Some(task);
        }
        if let Some(p) = find_parent_of_mut(&mut task.subtasks, subtask_id) {
            return Some(p);
        }
    }
    None
}

/// Detach a subtask from whichever parent holds it.
pub fn remove_subtask(tasks: &mut [Task], subtask_id: &str) -> Option<Task> {
    let parent = find_parent_of_mut(tasks, subtask_id)?;
    let idx = parent.subtasks.iter().position(|s| s.id == subtask_id)?;
    Some(parent.subtasks.remove(idx))
}

/// Deep copy with a fresh id and `done = false` at every node.
///
/// Text and shape are kept. `listId` survives on the copy's root only; due
/// dates are not carried over.
pub fn clone_subtree(task: &Task) -> Task {
    let mut copy = clone_node(task, IdKind::Task);
    copy.list_id = task.list_id.clone();
    copy
}

fn clone_node(task: &Task, kind: IdKind) -> Task {
    Task {
        id: new_id(kind),
        text: task.text.clone(),
        done: false,
        due_date: None,
        subtasks: task
            .subtasks
            .iter()
            .map(|s| clone_node(s, IdKind::Subtask))
            .collect(),
        list_id: None,
    }
}

/// Append a new open child. Returns the child's id.
pub fn append_subtask(task: &mut Task, text: String) -> String {
    let id = new_id(IdKind::Subtask);
    task.subtasks.push(Task::new_subtask(id.clone(), text));
    id
}

/// Visit every node of a forest, depth-first, parents before children.
pub fn for_each_task<'a>(tasks: &'a [Task], f: &mut dyn FnMut(&'a Task, usize)) {
    walk(tasks, 0, f);
}

fn walk<'a>(tasks: &'a [Task], depth: usize, f: &mut dyn FnMut(&'a Task, usize)) {
    for task in tasks {
        f(task, depth);
        walk(&task.subtasks, depth + 1, f);
    }
}

/// Every id in a tree, root included
pub fn collect_ids(task: &Task) -> Vec<String> {
    let mut ids = Vec::new();
    for_each_task(std::slice::from_ref(task), &mut |t, _| ids.push(t.id.clone()));
    ids
}
