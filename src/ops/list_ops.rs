use crate::model::config::DefaultsConfig;
use crate::model::list::List;
use crate::model::state::AppState;
use crate::ops::id_gen::{IdKind, new_id};
use crate::util::unicode::is_single_glyph;

/// Error type for list operations
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error("list not found: {0}")]
    NotFound(String),
    #[error("emoji must be a single glyph, got {0:?}")]
    InvalidEmoji(String),
}

/// Append a new list and switch to it. Blank names fall back to the configured label.
/// Returns the new list's id.
pub fn create_list(state: &mut AppState, name: &str, defaults: &DefaultsConfig) -> String {
    let trimmed = name.trim();
    let name = if trimmed.is_empty() {
        defaults.fallback_name()
    } else {
        trimmed.to_string()
    };
    let id = new_id(IdKind::List);
    state
        .lists
        .push(List::new(id.clone(), name, defaults.list_emoji()));
    state.current_list_id = Some(id.clone());
    state.viewing_archived = false;
    id
}

/// Rename a list. Blank input keeps the old name; returns whether the name changed.
pub fn rename_list(state: &mut AppState, list_id: &str, new_name: &str) -> Result<bool, ListError> {
    let list = state
        .find_list_mut(list_id)
        .ok_or_else(|| ListError::NotFound(list_id.to_string()))?;
    let trimmed = new_name.trim();
    if trimmed.is_empty() || trimmed == list.name {
        return Ok(false);
    }
    list.name = trimmed.to_string();
    Ok(true)
}

/// Remove a list and its live tasks. Archived copies are left alone.
/// If it was selected, the first remaining list (or nothing) becomes current.
pub fn delete_list(state: &mut AppState, list_id: &str) -> Result<List, ListError> {
    let idx = state
        .lists
        .iter()
        .position(|l| l.id == list_id)
        .ok_or_else(|| ListError::NotFound(list_id.to_string()))?;
    let removed = state.lists.remove(idx);
    if state.current_list_id.as_deref() == Some(list_id) {
        state.current_list_id = state.lists.first().map(|l| l.id.clone());
    }
    Ok(removed)
}

pub fn set_list_emoji(state: &mut AppState, list_id: &str, emoji: &str) -> Result<(), ListError> {
    let emoji = emoji.trim();
    if !is_single_glyph(emoji) {
        return Err(ListError::InvalidEmoji(emoji.to_string()));
    }
    let list = state
        .find_list_mut(list_id)
        .ok_or_else(|| ListError::NotFound(list_id.to_string()))?;
    list.emoji = emoji.to_string();
    Ok(())
}

/// Show a list (leaves archive view).
pub fn select_list(state: &mut AppState, list_id: &str) -> Result<(), ListError> {
    if state.find_list(list_id).is_none() {
        return Err(ListError::NotFound(list_id.to_string()));
    }
    state.current_list_id = Some(list_id.to_string());
    state.viewing_archived = false;
    Ok(())
}

/// Show the archive. The list selection is kept for when the user comes back.
pub fn view_archive(state: &mut AppState) {
    state.viewing_archived = true;
}

/// Resolve a user-supplied list reference: an exact id first, then an exact name.
pub fn resolve_list<'a>(state: &'a AppState, reference: &str) -> Option<&'a List> {
    state
        .find_list(reference)
        .or_else(|| state.lists.iter().find(|l| l.name == reference))
}
