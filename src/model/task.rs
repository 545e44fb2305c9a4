use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Calendar format used for `dueDate` in the state blob and on the command line
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A task and, recursively, its subtasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Stable for the task's lifetime (`t_…` for root tasks, `st_…` for subtasks)
    pub id: String,
    /// Display text, never empty once written
    pub text: String,
    #[serde(default)]
    pub done: bool,
    /// Optional due date; blank or unparseable values in the blob decode as unset
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "due_date_format"
    )]
    pub due_date: Option<NaiveDate>,
    /// Ordered children, depth unbounded
    #[serde(default, deserialize_with = "vec_or_null")]
    pub subtasks: Vec<Task>,
    /// Owning list. Only root-level tasks and archive entries carry this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
}

impl Task {
    /// A fresh root-level task owned by `list_id`
    pub fn new_root(id: String, text: String, list_id: String) -> Self {
        Task {
            id,
            text,
            done: false,
            due_date: None,
            subtasks: Vec::new(),
            list_id: Some(list_id),
        }
    }

    /// A fresh subtask (no list ownership)
    pub fn new_subtask(id: String, text: String) -> Self {
        Task {
            id,
            text,
            done: false,
            due_date: None,
            subtasks: Vec::new(),
            list_id: None,
        }
    }

    /// Depth of the tree rooted here (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self.subtasks.iter().map(Task::depth).max().unwrap_or(0)
    }

    /// Number of nodes in the tree rooted here, including this one
    pub fn node_count(&self) -> usize {
        1 + self.subtasks.iter().map(Task::node_count).sum::<usize>()
    }
}

/// How close a due date is, relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DueStatus {
    /// More than five days out
    Later,
    /// Three to five days out
    Soon,
    /// One or two days out
    Imminent,
    /// Due today or already past
    Overdue,
}

impl DueStatus {
    pub fn classify(due: NaiveDate, today: NaiveDate) -> DueStatus {
        match (due - today).num_days() {
            d if d > 5 => DueStatus::Later,
            3..=5 => DueStatus::Soon,
            1..=2 => DueStatus::Imminent,
            _ => DueStatus::Overdue,
        }
    }

    /// Marker printed next to the date in text output
    pub fn marker(self) -> &'static str {
        match self {
            DueStatus::Later => "·",
            DueStatus::Soon => "!",
            DueStatus::Imminent => "!!",
            DueStatus::Overdue => "!!!",
        }
    }
}

/// Parse user input for a due date. Blank input means "unset".
pub fn parse_due_date(input: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map(Some)
}

fn vec_or_null<'de, D>(deserializer: D) -> Result<Vec<Task>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Task>>::deserialize(deserializer)?.unwrap_or_default())
}

mod due_date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DATE_FORMAT;

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format(DATE_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| super::parse_due_date(&s).ok().flatten()))
    }
}
