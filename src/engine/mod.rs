//! The mutation engine: owns the state, applies one operation at a time, then
//! saves the full snapshot and asks the renderer to redraw.

use std::path::PathBuf;

use crate::io::recovery::log_deletion;
use crate::io::store::{StateStore, StoreError};
use crate::model::config::DefaultsConfig;
use crate::model::list::List;
use crate::model::state::AppState;
use crate::model::task::parse_due_date;
use crate::ops::archive_ops::Completion;
use crate::ops::id_gen::{IdKind, new_id};
use crate::ops::list_ops::{self, ListError};
use crate::ops::task_ops::{self, EditOutcome, TaskError};

/// Questions and notices for the person driving the engine.
pub trait Prompter {
    /// Yes/no question. `false` cancels the operation.
    fn confirm(&mut self, message: &str) -> bool;
    /// Free-text question. `None` means cancelled, which is not the same as
    /// an empty answer.
    fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String>;
    fn notify(&mut self, message: &str);
}

/// Draws the current state. Called after every successful mutation.
pub trait Renderer {
    fn render(&mut self, state: &AppState);
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    List(#[from] ListError),
}

pub struct Engine<S, P, R> {
    state: AppState,
    store: S,
    prompter: P,
    renderer: R,
    defaults: DefaultsConfig,
    recovery_dir: Option<PathBuf>,
    unsaved: bool,
    /// Set when the stored state could not be read
    saves_blocked: bool,
}

impl<S: StateStore, P: Prompter, R: Renderer> Engine<S, P, R> {
    /// Load the stored state. With nothing stored, seed one empty list and save
    /// it. A blob that cannot be decoded (already backed up by the store) is
    /// replaced the same way. When the store cannot be read at all, the seeded
    /// state lives in memory only and saving stays disabled, so the file is
    /// never overwritten.
    pub fn start(mut store: S, prompter: P, renderer: R, defaults: DefaultsConfig) -> Self {
        let mut saves_blocked = false;
        let loaded = match store.load() {
            Ok(state) => state,
            Err(e @ StoreError::Parse { .. }) => {
                eprintln!("warning: starting from a fresh state: {}", e);
                None
            }
            Err(e) => {
                eprintln!("warning: {}; changes will not be saved", e);
                saves_blocked = true;
                None
            }
        };
        let needs_seed = loaded.is_none() && !saves_blocked;
        let state = loaded.unwrap_or_else(|| {
            AppState::seeded(List::new(
                new_id(IdKind::List),
                defaults.seed_list_name(),
                defaults.list_emoji(),
            ))
        });
        let mut engine = Engine {
            state,
            store,
            prompter,
            renderer,
            defaults,
            recovery_dir: None,
            unsaved: saves_blocked,
            saves_blocked,
        };
        if needs_seed {
            engine.save();
        }
        engine
    }

    /// Record deleted tasks and lists in the recovery log under `dir`.
    pub fn with_recovery_log(mut self, dir: impl Into<PathBuf>) -> Self {
        self.recovery_dir = Some(dir.into());
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn prompter_mut(&mut self) -> &mut P {
        &mut self.prompter
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// True when the last save failed. The in-memory state stays authoritative.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    pub fn render(&mut self) {
        self.renderer.render(&self.state);
    }

    fn save(&mut self) {
        if self.saves_blocked {
            eprintln!("warning: changes not saved: stored state could not be read");
            self.unsaved = true;
            return;
        }
        match self.store.save(&self.state) {
            Ok(()) => self.unsaved = false,
            Err(e) => {
                eprintln!("warning: changes not saved: {}", e);
                self.unsaved = true;
            }
        }
    }

    fn commit(&mut self) {
        self.save();
        self.render();
    }

    fn log_deleted(&self, kind: &str, id: &str, snapshot: &impl serde::Serialize) {
        if let Some(dir) = &self.recovery_dir {
            log_deletion(dir, kind, id, snapshot);
        }
    }

    fn require_list(&self, list_id: &str) -> Result<&List, ListError> {
        self.state
            .find_list(list_id)
            .ok_or_else(|| ListError::NotFound(list_id.to_string()))
    }

    fn require_task_text(&self, task_id: &str) -> Result<String, TaskError> {
        task_ops::find_task(&self.state, task_id)
            .map(|t| t.text.clone())
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
    }

    fn current_list_id(&self) -> Result<String, TaskError> {
        self.state
            .current_list()
            .map(|l| l.id.clone())
            .ok_or(TaskError::NoListSelected)
    }

    // -----------------------------------------------------------------------
    // Lists
    // -----------------------------------------------------------------------

    /// Create a list and switch to it. With no name the user is prompted;
    /// cancelling the prompt changes nothing.
    pub fn create_list(&mut self, name: Option<&str>) -> Option<String> {
        let name = match name {
            Some(n) => n.to_string(),
            None => self
                .prompter
                .prompt("List name", Some(&self.defaults.new_list_prompt))?,
        };
        let id = list_ops::create_list(&mut self.state, &name, &self.defaults);
        self.commit();
        Some(id)
    }

    /// Returns whether the name changed. Blank or cancelled input keeps it.
    pub fn rename_list(&mut self, list_id: &str, new_name: Option<&str>) -> Result<bool, EngineError> {
        let current = self.require_list(list_id)?.name.clone();
        let new_name = match new_name {
            Some(n) => n.to_string(),
            None => match self.prompter.prompt("New list name", Some(&current)) {
                Some(n) => n,
                None => return Ok(false),
            },
        };
        let changed = list_ops::rename_list(&mut self.state, list_id, &new_name)?;
        if changed {
            self.commit();
        }
        Ok(changed)
    }

    /// Delete a list and its live tasks after confirmation. Returns false when declined.
    pub fn delete_list(&mut self, list_id: &str) -> Result<bool, EngineError> {
        let list = self.require_list(list_id)?;
        let question = format!(
            "Delete list \"{}\" and its {} task(s)?",
            list.name,
            list.tasks.len()
        );
        if !self.prompter.confirm(&question) {
            return Ok(false);
        }
        let removed = list_ops::delete_list(&mut self.state, list_id)?;
        self.log_deleted("list", &removed.id, &removed);
        self.commit();
        Ok(true)
    }

    pub fn set_list_emoji(&mut self, list_id: &str, emoji: &str) -> Result<(), EngineError> {
        list_ops::set_list_emoji(&mut self.state, list_id, emoji)?;
        self.commit();
        Ok(())
    }

    pub fn select_list(&mut self, list_id: &str) -> Result<(), EngineError> {
        list_ops::select_list(&mut self.state, list_id)?;
        self.commit();
        Ok(())
    }

    pub fn view_archive(&mut self) {
        list_ops::view_archive(&mut self.state);
        self.commit();
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Add a task at the top of `list_id`, or of the current list when `None`.
    /// Without a current list the user is told so and nothing changes.
    pub fn add_task(&mut self, list_id: Option<&str>, text: &str) -> Result<Option<String>, EngineError> {
        let list_id = match list_id {
            Some(id) => id.to_string(),
            None => match self.current_list_id() {
                Ok(id) => id,
                Err(_) => {
                    self.prompter.notify("Create or select a list first.");
                    return Ok(None);
                }
            },
        };
        let id = task_ops::add_task(&mut self.state, &list_id, text)?;
        if id.is_some() {
            self.commit();
        }
        Ok(id)
    }

    /// Append a subtask. With no text the user is prompted; cancelled or
    /// blank input adds nothing.
    pub fn add_subtask(&mut self, parent_id: &str, text: Option<&str>) -> Result<Option<String>, EngineError> {
        self.require_task_text(parent_id)?;
        let text = match text {
            Some(t) => t.to_string(),
            None => match self.prompter.prompt("Subtask", None) {
                Some(t) => t,
                None => return Ok(None),
            },
        };
        let id = task_ops::add_subtask(&mut self.state, parent_id, &text)?;
        if id.is_some() {
            self.commit();
        }
        Ok(id)
    }

    /// Replace a task's text. Blank text deletes the task, without asking.
    pub fn edit_task_text(&mut self, task_id: &str, new_text: &str) -> Result<EditOutcome, EngineError> {
        let outcome = task_ops::edit_task_text(&mut self.state, task_id, new_text)?;
        if let EditOutcome::Deleted(task) = &outcome {
            self.log_deleted("task", &task.id, task);
        }
        self.commit();
        Ok(outcome)
    }

    pub fn toggle_done(&mut self, task_id: &str) -> Result<Completion, EngineError> {
        let outcome = task_ops::toggle_done(&mut self.state, task_id)?;
        if outcome == Completion::Skipped {
            return Ok(outcome);
        }
        if let Completion::Discarded(task) = &outcome {
            self.prompter
                .notify("The task's list no longer exists, so it was removed.");
            self.log_deleted("task", &task.id, task);
        }
        self.commit();
        Ok(outcome)
    }

    /// Delete a task after confirmation. Returns false when declined.
    pub fn delete_task(&mut self, task_id: &str) -> Result<bool, EngineError> {
        let text = self.require_task_text(task_id)?;
        if !self.prompter.confirm(&format!("Delete \"{}\"?", text)) {
            return Ok(false);
        }
        let removed = task_ops::remove_task(&mut self.state, task_id)?;
        self.log_deleted("task", &removed.id, &removed);
        self.commit();
        Ok(true)
    }

    /// Set the due date from `YYYY-MM-DD`; blank input clears it.
    pub fn set_due_date(&mut self, task_id: &str, input: &str) -> Result<(), EngineError> {
        let due = parse_due_date(input).map_err(|_| TaskError::InvalidDate(input.trim().to_string()))?;
        task_ops::set_due_date(&mut self.state, task_id, due)?;
        self.commit();
        Ok(())
    }

    /// Move a task within the current list.
    pub fn reorder_tasks(&mut self, from: usize, to: usize) -> Result<(), EngineError> {
        if self.state.viewing_archived {
            return Err(TaskError::ArchiveView.into());
        }
        let list_id = self.current_list_id()?;
        task_ops::reorder_tasks(&mut self.state, &list_id, from, to)?;
        self.commit();
        Ok(())
    }

    pub fn duplicate_task(&mut self, list_id: &str, task_id: &str) -> Result<String, EngineError> {
        let id = task_ops::duplicate_task(&mut self.state, list_id, task_id)?;
        self.commit();
        Ok(id)
    }

    /// Drop done tasks left in a list. Returns how many were removed.
    pub fn clear_completed(&mut self, list_id: &str) -> Result<usize, EngineError> {
        let removed = task_ops::clear_completed(&mut self.state, list_id)?;
        for task in &removed {
            self.log_deleted("task", &task.id, task);
        }
        if !removed.is_empty() {
            self.commit();
        }
        Ok(removed.len())
    }
}
