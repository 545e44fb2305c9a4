use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tasky", about = concat!("tasky v", env!("CARGO_PKG_VERSION"), " - lists, subtasks and an archive for finished work"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current list or the archive (default)
    Show,
    /// List all lists
    Lists,
    /// Create, rename, delete or select lists
    List(ListCmd),
    /// Switch to the archive view
    Archive,
    /// Add a task at the top of a list
    Add(AddArgs),
    /// Add a subtask
    Sub(SubArgs),
    /// Change a task's text (empty text deletes it)
    Edit(EditArgs),
    /// Toggle a task done / not done
    Done(IdArg),
    /// Delete a task
    Rm(IdArg),
    /// Set or clear a task's due date
    Due(DueArgs),
    /// Move a task within the current list
    Mv(MvArgs),
    /// Duplicate a task with all its subtasks
    Dup(IdArg),
    /// Remove done tasks left in a list
    Clear(ClearArgs),
    /// Validate the stored state
    Check,
    /// Read or change settings
    Config(ConfigCmd),
    /// View or prune the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListCmd {
    #[command(subcommand)]
    pub action: ListAction,
}

#[derive(Subcommand)]
pub enum ListAction {
    /// Create a list and switch to it (prompts when NAME is omitted)
    New(ListNewArgs),
    /// Rename a list (prompts when NAME is omitted)
    Rename(ListRenameArgs),
    /// Delete a list and its live tasks
    Rm(ListRefArg),
    /// Set a list's emoji
    Emoji(ListEmojiArgs),
    /// Switch to a list
    Use(ListRefArg),
}

#[derive(Args)]
pub struct ListNewArgs {
    /// List name
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ListRenameArgs {
    /// List id or exact name
    pub list: String,
    /// New name
    pub name: Option<String>,
}

#[derive(Args)]
pub struct ListRefArg {
    /// List id or exact name
    pub list: String,
}

#[derive(Args)]
pub struct ListEmojiArgs {
    /// List id or exact name
    pub list: String,
    /// A single emoji
    pub emoji: String,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    /// Task id
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Task text
    pub text: String,
    /// Target list (default: the current list)
    #[arg(long)]
    pub list: Option<String>,
}

#[derive(Args)]
pub struct SubArgs {
    /// Parent task id
    pub id: String,
    /// Subtask text (prompts when omitted)
    pub text: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task id
    pub id: String,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct DueArgs {
    /// Task id
    pub id: String,
    /// Date as YYYY-MM-DD (omit to clear)
    pub date: Option<String>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Current position (0-based)
    pub from: usize,
    /// New position (0-based)
    pub to: usize,
}

#[derive(Args)]
pub struct ClearArgs {
    /// List id or exact name (default: the current list)
    pub list: Option<String>,
}

// ---------------------------------------------------------------------------
// Config / recovery
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a setting (effective value, defaults included)
    Get(ConfigGetArgs),
    /// Change a setting in config.toml
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigGetArgs {
    /// Key such as defaults.emoji or ui.show_ids
    pub key: String,
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Key such as defaults.emoji or ui.show_ids
    pub key: String,
    pub value: String,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this many days
    #[arg(long, default_value_t = crate::io::recovery::PRUNE_AGE_DAYS)]
    pub days: i64,
    /// Remove every entry
    #[arg(long)]
    pub all: bool,
}
