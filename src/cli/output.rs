use chrono::NaiveDate;
use serde::Serialize;

use crate::engine::Renderer;
use crate::io::recovery::RecoveryEntry;
use crate::model::config::UiConfig;
use crate::model::list::List;
use crate::model::state::AppState;
use crate::model::task::{DATE_FORMAT, DueStatus, Task};
use crate::ops::check::{CheckError, CheckResult, CheckWarning};
use crate::util::unicode::{fit_to_width, truncate_to_width};

/// Sidebar column for list names
const NAME_CELLS: usize = 20;
/// Longest task text printed before truncation
const TEXT_CELLS: usize = 60;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub text: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_status: Option<DueStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct ListSummaryJson {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub tasks: usize,
    pub current: bool,
}

#[derive(Serialize)]
pub struct ViewJson {
    pub lists: Vec<ListSummaryJson>,
    pub archived_count: usize,
    pub viewing_archived: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_list_id: Option<String>,
    pub tasks: Vec<TaskJson>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task, today: NaiveDate) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        text: task.text.clone(),
        done: task.done,
        due_date: task.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
        due_status: task.due_date.map(|d| DueStatus::classify(d, today)),
        list_id: task.list_id.clone(),
        subtasks: task.subtasks.iter().map(|t| task_to_json(t, today)).collect(),
    }
}

pub fn lists_to_json(state: &AppState) -> Vec<ListSummaryJson> {
    state
        .lists
        .iter()
        .map(|l| ListSummaryJson {
            id: l.id.clone(),
            name: l.name.clone(),
            emoji: l.emoji.clone(),
            tasks: l.tasks.len(),
            current: is_current(state, l),
        })
        .collect()
}

pub fn view_to_json(state: &AppState, today: NaiveDate) -> ViewJson {
    ViewJson {
        lists: lists_to_json(state),
        archived_count: state.archived.len(),
        viewing_archived: state.viewing_archived,
        current_list_id: state.current_list_id.clone(),
        tasks: visible_tasks(state)
            .iter()
            .map(|t| task_to_json(t, today))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn is_current(state: &AppState, list: &List) -> bool {
    !state.viewing_archived && state.current_list_id.as_deref() == Some(list.id.as_str())
}

/// The archive while viewing it, else the current list's live tasks.
fn visible_tasks(state: &AppState) -> &[Task] {
    if state.viewing_archived {
        &state.archived
    } else {
        state.current_list().map(|l| l.tasks.as_slice()).unwrap_or(&[])
    }
}

/// One sidebar row per list plus the archive row.
pub fn format_sidebar(state: &AppState, ui: &UiConfig) -> Vec<String> {
    let mut lines: Vec<String> = state
        .lists
        .iter()
        .map(|list| {
            let marker = if is_current(state, list) { '*' } else { ' ' };
            let mut line = format!(
                "{} {} {} {:>3}",
                marker,
                list.emoji,
                fit_to_width(&list.name, NAME_CELLS),
                list.tasks.len()
            );
            if ui.show_ids {
                line.push_str(&format!("  {}", list.id));
            }
            line
        })
        .collect();
    let marker = if state.viewing_archived { '*' } else { ' ' };
    lines.push(format!(
        "{} ✓ {} {:>3}",
        marker,
        fit_to_width("Archive", NAME_CELLS),
        state.archived.len()
    ));
    lines
}

/// `[ ] text` with optional id and due badge.
pub fn format_task_line(task: &Task, ui: &UiConfig, today: NaiveDate) -> String {
    let check = if task.done { 'x' } else { ' ' };
    let mut line = format!("[{}] {}", check, truncate_to_width(&task.text, TEXT_CELLS));
    if ui.show_ids {
        line.push_str(&format!("  {}", task.id));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due.format(DATE_FORMAT)));
        if ui.due_badges {
            line.push(' ');
            line.push_str(DueStatus::classify(due, today).marker());
        }
    }
    line
}

pub fn format_task_tree(task: &Task, indent: usize, ui: &UiConfig, today: NaiveDate) -> Vec<String> {
    let mut lines = vec![format!(
        "{}{}",
        "    ".repeat(indent),
        format_task_line(task, ui, today)
    )];
    for sub in &task.subtasks {
        lines.extend(format_task_tree(sub, indent + 1, ui, today));
    }
    lines
}

/// Sidebar, then the live list or the archive.
pub fn format_view(state: &AppState, ui: &UiConfig, today: NaiveDate) -> Vec<String> {
    let mut lines = format_sidebar(state, ui);
    lines.push(String::new());

    if state.viewing_archived {
        lines.push("== ✓ Archive ==".to_string());
        for task in &state.archived {
            let mut tree = format_task_tree(task, 0, ui, today);
            let origin = task
                .list_id
                .as_deref()
                .and_then(|id| state.find_list(id))
                .map(|l| l.name.as_str())
                .unwrap_or("(deleted list)");
            tree[0].push_str(&format!("  <- {}", origin));
            lines.extend(tree);
        }
        if state.archived.is_empty() {
            lines.push("(nothing archived)".to_string());
        }
        return lines;
    }

    match state.current_list() {
        None => lines.push("No list selected. Create one with `tasky list new`.".to_string()),
        Some(list) => {
            lines.push(format!("== {} {} ==", list.emoji, list.name));
            for task in &list.tasks {
                lines.extend(format_task_tree(task, 0, ui, today));
            }
            if list.tasks.is_empty() {
                lines.push("(no tasks)".to_string());
            }
        }
    }
    lines
}

pub fn format_check(result: &CheckResult) -> Vec<String> {
    let mut lines = Vec::new();
    if !result.errors.is_empty() {
        lines.push("Errors:".to_string());
        for err in &result.errors {
            let text = match err {
                CheckError::DuplicateId { id, count } => format!("{} is used {} times", id, count),
                CheckError::LiveAndArchived { task_id, list_id } => {
                    format!("{} is both in {} and in the archive", task_id, list_id)
                }
                CheckError::DoneButLive { task_id, list_id } => {
                    format!("{} is done but still in {}", task_id, list_id)
                }
                CheckError::OpenInArchive { task_id } => {
                    format!("{} is archived but not done", task_id)
                }
                CheckError::ListIdMismatch {
                    task_id,
                    list_id,
                    found,
                } => format!(
                    "{} sits in {} but points at {}",
                    task_id,
                    list_id,
                    found.as_deref().unwrap_or("no list")
                ),
                CheckError::ArchiveWithoutOrigin { task_id } => {
                    format!("archived {} has no origin list", task_id)
                }
                CheckError::BlankText { task_id } => format!("{} has blank text", task_id),
            };
            lines.push(format!("  {}", text));
        }
    }
    if !result.warnings.is_empty() {
        lines.push("Warnings:".to_string());
        for warning in &result.warnings {
            let text = match warning {
                CheckWarning::SubtaskWithListId { task_id } => {
                    format!("subtask {} carries a list id", task_id)
                }
                CheckWarning::DanglingSelection { list_id } => {
                    format!("selected list {} no longer exists", list_id)
                }
                CheckWarning::OrphanedArchiveEntry { task_id, list_id } => {
                    format!("archived {} belongs to deleted list {}", task_id, list_id)
                }
            };
            lines.push(format!("  {}", text));
        }
    }
    if result.valid {
        lines.push("✓ state is valid".to_string());
    } else {
        lines.push("✗ state has errors".to_string());
    }
    lines
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {}: {}",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
        entry.category,
        entry.description
    )];
    for (key, value) in &entry.fields {
        lines.push(format!("  {}: {}", key, value));
    }
    for body_line in entry.body.lines() {
        lines.push(format!("  | {}", body_line));
    }
    lines
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Prints the whole view to stdout, as text or JSON.
pub struct TextRenderer {
    pub ui: UiConfig,
    pub json: bool,
    pub today: NaiveDate,
}

impl TextRenderer {
    pub fn new(ui: UiConfig, json: bool) -> Self {
        TextRenderer {
            ui,
            json,
            today: chrono::Local::now().date_naive(),
        }
    }
}

impl Renderer for TextRenderer {
    fn render(&mut self, state: &AppState) {
        if self.json {
            match serde_json::to_string_pretty(&view_to_json(state, self.today)) {
                Ok(text) => println!("{}", text),
                Err(e) => eprintln!("warning: could not render JSON: {}", e),
            }
        } else {
            for line in format_view(state, &self.ui, self.today) {
                println!("{}", line);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::list::DEFAULT_EMOJI;
    use insta::assert_snapshot;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn sample() -> AppState {
        let mut mis = List::new("l_mis".into(), "Mis tareas".into(), DEFAULT_EMOJI.into());
        let mut milk = Task::new_root("t_milk".into(), "Buy milk".into(), "l_mis".into());
        milk.due_date = NaiveDate::from_ymd_opt(2025, 6, 11);
        let mut call = Task::new_subtask("st_call".into(), "Call supplier".into());
        call.done = true;
        milk.subtasks.push(call);
        mis.tasks.push(milk);
        mis.tasks
            .push(Task::new_root("t_dog".into(), "Walk dog".into(), "l_mis".into()));
        let work = List::new("l_work".into(), "Work".into(), "💼".into());
        let mut report = Task::new_root("t_rep".into(), "Send report".into(), "l_gone".into());
        report.done = true;
        let mut state = AppState::seeded(mis);
        state.lists.push(work);
        state.archived.push(report);
        state
    }

    fn render(state: &AppState, ui: &UiConfig) -> String {
        format_view(state, ui, today()).join("\n")
    }

    #[test]
    fn live_list_view() {
        assert_snapshot!(render(&sample(), &UiConfig::default()), @r"
        * 📌 Mis tareas             2  l_mis
          💼 Work                   0  l_work
          ✓ Archive                1

        == 📌 Mis tareas ==
        [ ] Buy milk  t_milk  due 2025-06-11 !!
            [x] Call supplier  st_call
        [ ] Walk dog  t_dog
        ");
    }

    #[test]
    fn archive_view_without_ids() {
        let mut state = sample();
        state.viewing_archived = true;
        let ui = UiConfig {
            show_ids: false,
            due_badges: false,
        };
        assert_snapshot!(render(&state, &ui), @r"
          📌 Mis tareas             2
          💼 Work                   0
        * ✓ Archive                1

        == ✓ Archive ==
        [x] Send report  <- (deleted list)
        ");
    }

    #[test]
    fn no_list_selected() {
        let state = AppState::default();
        let lines = format_view(&state, &UiConfig::default(), today());
        assert_eq!(lines.last().unwrap(), "No list selected. Create one with `tasky list new`.");
    }

    #[test]
    fn due_badge_uses_urgency() {
        let mut task = Task::new_root("t_1".into(), "Pay rent".into(), "l_1".into());
        let ui = UiConfig::default();
        task.due_date = NaiveDate::from_ymd_opt(2025, 6, 30);
        assert!(format_task_line(&task, &ui, today()).ends_with("due 2025-06-30 ·"));
        task.due_date = NaiveDate::from_ymd_opt(2025, 6, 1);
        assert!(format_task_line(&task, &ui, today()).ends_with("due 2025-06-01 !!!"));
    }

    #[test]
    fn json_view_shape() {
        let json = serde_json::to_value(view_to_json(&sample(), today())).unwrap();
        assert_eq!(json["archived_count"], 1);
        assert_eq!(json["lists"][0]["current"], true);
        assert_eq!(json["tasks"][0]["due_status"], "imminent");
        assert_eq!(json["tasks"][0]["subtasks"][0]["done"], true);
        assert!(json["tasks"][1].get("due_date").is_none());
    }

    #[test]
    fn check_output() {
        let result = CheckResult {
            valid: false,
            errors: vec![CheckError::OpenInArchive {
                task_id: "t_1".into(),
            }],
            warnings: vec![CheckWarning::DanglingSelection {
                list_id: "l_x".into(),
            }],
        };
        assert_eq!(
            format_check(&result),
            vec![
                "Errors:",
                "  t_1 is archived but not done",
                "Warnings:",
                "  selected list l_x no longer exists",
                "✗ state has errors",
            ]
        );
        assert_eq!(format_check(&CheckResult { valid: true, ..Default::default() }), vec!["✓ state is valid"]);
    }
}
