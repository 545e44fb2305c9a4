use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::cli::prompt::StdinPrompter;
use crate::engine::Engine;
use crate::io::config_io;
use crate::io::lock::{DEFAULT_LOCK_TIMEOUT, DataLock};
use crate::io::paths::resolve_data_dir;
use crate::io::recovery;
use crate::io::store::{JsonFileStore, StateStore};
use crate::model::state::AppState;
use crate::ops::archive_ops::Completion;
use crate::ops::check;
use crate::ops::list_ops;
use crate::ops::task_ops::EditOutcome;

type CliResult = Result<(), Box<dyn std::error::Error>>;
type CliEngine = Engine<JsonFileStore, StdinPrompter, TextRenderer>;

/// Flags shared by every command
struct Context {
    data_dir: PathBuf,
    json: bool,
    yes: bool,
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CliResult {
    let ctx = Context {
        data_dir: resolve_data_dir(cli.data_dir.as_deref().map(Path::new)),
        json: cli.json,
        yes: cli.yes,
    };

    match cli.command.unwrap_or(Commands::Show) {
        // Read commands
        Commands::Show => cmd_show(&ctx),
        Commands::Lists => cmd_lists(&ctx),
        Commands::Check => cmd_check(&ctx),
        Commands::Recovery(args) => cmd_recovery(&ctx, args),

        // Write commands
        Commands::List(cmd) => cmd_list(&ctx, cmd.action),
        Commands::Archive => with_engine(&ctx, |engine| {
            engine.view_archive();
            Ok(())
        }),
        Commands::Add(args) => cmd_add(&ctx, args),
        Commands::Sub(args) => cmd_sub(&ctx, args),
        Commands::Edit(args) => cmd_edit(&ctx, args),
        Commands::Done(args) => cmd_done(&ctx, args),
        Commands::Rm(args) => cmd_rm(&ctx, args),
        Commands::Due(args) => with_engine(&ctx, |engine| {
            engine.set_due_date(&args.id, args.date.as_deref().unwrap_or(""))?;
            Ok(())
        }),
        Commands::Mv(args) => with_engine(&ctx, |engine| {
            engine.reorder_tasks(args.from, args.to)?;
            Ok(())
        }),
        Commands::Dup(args) => cmd_dup(&ctx, args),
        Commands::Clear(args) => cmd_clear(&ctx, args),
        Commands::Config(cmd) => cmd_config(&ctx, cmd.action),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Lock the data directory, start an engine on it and run `f`. The lock is
/// held until `f` returns.
fn with_engine(ctx: &Context, f: impl FnOnce(&mut CliEngine) -> CliResult) -> CliResult {
    let _lock = DataLock::acquire(&ctx.data_dir, DEFAULT_LOCK_TIMEOUT)?;
    let config = config_io::load_config(&ctx.data_dir)?;
    let mut engine = Engine::start(
        JsonFileStore::new(&ctx.data_dir),
        StdinPrompter::new(ctx.yes),
        TextRenderer::new(config.ui, ctx.json),
        config.defaults,
    )
    .with_recovery_log(&ctx.data_dir);
    f(&mut engine)
}

/// List id for a user-supplied id or exact name.
fn resolve_list_id(state: &AppState, reference: &str) -> Result<String, String> {
    list_ops::resolve_list(state, reference)
        .map(|l| l.id.clone())
        .ok_or_else(|| format!("list not found: {}", reference))
}

fn current_list_id(state: &AppState) -> Result<String, String> {
    state
        .current_list()
        .map(|l| l.id.clone())
        .ok_or_else(|| "no list selected (try `tasky list use <LIST>`)".to_string())
}

fn cancelled() {
    eprintln!("cancelled");
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_show(ctx: &Context) -> CliResult {
    with_engine(ctx, |engine| {
        engine.render();
        Ok(())
    })
}

fn cmd_lists(ctx: &Context) -> CliResult {
    with_engine(ctx, |engine| {
        if ctx.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&lists_to_json(engine.state()))?
            );
        } else {
            for line in format_sidebar(engine.state(), &engine.renderer().ui) {
                println!("{}", line);
            }
        }
        Ok(())
    })
}

fn cmd_check(ctx: &Context) -> CliResult {
    // Read-only: an empty data dir is checked as an empty state, not seeded
    let state = JsonFileStore::new(&ctx.data_dir)
        .load()?
        .unwrap_or_default();
    let result = check::check_state(&state);

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in format_check(&result) {
            println!("{}", line);
        }
    }
    if !result.valid {
        return Err(format!("{} integrity error(s)", result.errors.len()).into());
    }
    Ok(())
}

fn cmd_recovery(ctx: &Context, args: RecoveryCmd) -> CliResult {
    if let Some(RecoveryAction::Prune(prune)) = args.action {
        let _lock = DataLock::acquire(&ctx.data_dir, DEFAULT_LOCK_TIMEOUT)?;
        let cutoff = if prune.all {
            chrono::DateTime::<Utc>::MAX_UTC
        } else {
            Utc::now() - chrono::Duration::days(prune.days)
        };
        let removed = recovery::prune_recovery(&ctx.data_dir, cutoff)?;
        println!("pruned {} recovery entr{}", removed, if removed == 1 { "y" } else { "ies" });
        return Ok(());
    }

    let entries = recovery::read_recovery_entries(&ctx.data_dir, Some(args.limit.unwrap_or(10)));
    if ctx.json {
        let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else if entries.is_empty() {
        println!("recovery log is empty");
    } else {
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                println!();
            }
            for line in format_recovery_entry(entry) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, action: ListAction) -> CliResult {
    with_engine(ctx, |engine| {
        match action {
            ListAction::New(args) => {
                if engine.create_list(args.name.as_deref()).is_none() {
                    cancelled();
                }
            }
            ListAction::Rename(args) => {
                let id = resolve_list_id(engine.state(), &args.list)?;
                if !engine.rename_list(&id, args.name.as_deref())? {
                    eprintln!("name unchanged");
                }
            }
            ListAction::Rm(args) => {
                let id = resolve_list_id(engine.state(), &args.list)?;
                if !engine.delete_list(&id)? {
                    cancelled();
                }
            }
            ListAction::Emoji(args) => {
                let id = resolve_list_id(engine.state(), &args.list)?;
                engine.set_list_emoji(&id, &args.emoji)?;
            }
            ListAction::Use(args) => {
                let id = resolve_list_id(engine.state(), &args.list)?;
                engine.select_list(&id)?;
            }
        }
        Ok(())
    })
}

fn cmd_add(ctx: &Context, args: AddArgs) -> CliResult {
    with_engine(ctx, |engine| {
        let list_id = match &args.list {
            Some(reference) => Some(resolve_list_id(engine.state(), reference)?),
            None => None,
        };
        if engine.add_task(list_id.as_deref(), &args.text)?.is_none() && args.text.trim().is_empty() {
            eprintln!("nothing to add: text is blank");
        }
        Ok(())
    })
}

fn cmd_sub(ctx: &Context, args: SubArgs) -> CliResult {
    with_engine(ctx, |engine| {
        if engine.add_subtask(&args.id, args.text.as_deref())?.is_none() {
            cancelled();
        }
        Ok(())
    })
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CliResult {
    with_engine(ctx, |engine| {
        if let EditOutcome::Deleted(task) = engine.edit_task_text(&args.id, &args.text)? {
            eprintln!("empty text: deleted {}", task.id);
        }
        Ok(())
    })
}

fn cmd_done(ctx: &Context, args: IdArg) -> CliResult {
    with_engine(ctx, |engine| {
        if engine.toggle_done(&args.id)? == Completion::Skipped {
            eprintln!("{} is already archived", args.id);
        }
        Ok(())
    })
}

fn cmd_rm(ctx: &Context, args: IdArg) -> CliResult {
    with_engine(ctx, |engine| {
        if !engine.delete_task(&args.id)? {
            cancelled();
        }
        Ok(())
    })
}

fn cmd_dup(ctx: &Context, args: IdArg) -> CliResult {
    with_engine(ctx, |engine| {
        let list_id = engine
            .state()
            .owning_list_id(&args.id)
            .map(str::to_string)
            .ok_or_else(|| format!("{} is not a live top-level task", args.id))?;
        engine.duplicate_task(&list_id, &args.id)?;
        Ok(())
    })
}

fn cmd_clear(ctx: &Context, args: ClearArgs) -> CliResult {
    with_engine(ctx, |engine| {
        let list_id = match &args.list {
            Some(reference) => resolve_list_id(engine.state(), reference)?,
            None => current_list_id(engine.state())?,
        };
        let removed = engine.clear_completed(&list_id)?;
        if removed == 0 {
            eprintln!("no completed tasks to clear");
        }
        Ok(())
    })
}

fn cmd_config(ctx: &Context, action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get(args) => {
            let config = config_io::load_config(&ctx.data_dir)?;
            let value = config_io::get_value(&config, &args.key)?;
            if ctx.json {
                println!("{}", serde_json::json!({ "key": args.key, "value": value }));
            } else {
                println!("{}", value);
            }
        }
        ConfigAction::Set(args) => {
            let _lock = DataLock::acquire(&ctx.data_dir, DEFAULT_LOCK_TIMEOUT)?;
            let mut doc = config_io::read_config_doc(&ctx.data_dir)?;
            config_io::set_value(&mut doc, &args.key, &args.value)?;
            config_io::write_config(&ctx.data_dir, &doc)?;
        }
    }
    Ok(())
}
