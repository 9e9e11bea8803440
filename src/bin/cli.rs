// CLI binary — panicking on unrecoverable errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use stackdeck::actions::{builtin_registry, starter_definitions};
use stackdeck::catalog::{save_catalog, Catalog};
use stackdeck::host::{HostSession, SimHost};
use stackdeck::rows::{IndexFeedback, RowStack};
use stackdeck::runner::{run_stack, RunStatus};
use stackdeck::settings::{self, AppSettings};
use stackdeck::stacks;
use stackdeck::state::AppState;

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "stackdeck-cli", about = "Stackdeck headless CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory override
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Action catalog management
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Saved stack management
    Stacks {
        #[command(subcommand)]
        action: StackAction,
    },
    /// Save a stack from row specs (NAME or NAME=VALUE, values ;-separated)
    Save {
        name: String,
        /// One row per flag, in display order
        #[arg(long = "row", value_name = "NAME[=VALUE]")]
        rows: Vec<String>,
    },
    /// Run a saved stack against the simulated host
    Run {
        stack: String,
        /// Restore the pre-run session snapshot after the run
        #[arg(long)]
        restore_session: bool,
    },
    /// List registered handler keys
    Keys,
    /// Exercise the jump-to-index control against the catalog
    Index {
        /// Raw index input, as the user would type it
        value: String,
    },
    /// Settings management
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List catalog actions in position order
    List,
    /// Show one action definition
    Show { name: String },
    /// Write a starter catalog binding the builtin handler keys
    Seed,
}

#[derive(Subcommand)]
enum StackAction {
    /// List saved stacks in document order
    List,
    /// Show a stack's entries
    Show { name: String },
    /// Clone a stack under a new name
    Duplicate { source: String, new_name: String },
    /// Delete a stack (no-op if absent)
    Delete { name: String },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show the loaded settings
    Show,
    /// Initialize settings pointing at a data directory
    Init { data_dir: String },
}

// ── State initialization ─────────────────────────────────────────

fn dirs_config_dir() -> PathBuf {
    // <config_dir>/com.stackdeck.app
    let base = if cfg!(target_os = "windows") {
        std::env::var("APPDATA").map_or_else(
            |_| PathBuf::from("C:\\Users\\Default\\AppData\\Roaming"),
            PathBuf::from,
        )
    } else if cfg!(target_os = "macos") {
        dirs_home().join("Library/Application Support")
    } else {
        std::env::var("XDG_CONFIG_HOME").map_or_else(|_| dirs_home().join(".config"), PathBuf::from)
    };
    base.join(stackdeck::paths::APP_ID)
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

fn resolve_data_dir(data_dir_override: Option<&str>) -> (PathBuf, Option<AppSettings>) {
    let loaded = settings::load_settings(&dirs_config_dir());
    if let Some(dd) = data_dir_override {
        let data_path = PathBuf::from(dd);
        std::fs::create_dir_all(&data_path).ok();
        return (data_path, loaded);
    }
    match loaded {
        Some(s) => (s.data_dir.clone(), Some(s)),
        None => {
            eprintln!("[Stackdeck] no settings found; run `settings init` or pass --data-dir");
            process::exit(1);
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("[Stackdeck] {message}");
    process::exit(1);
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    if let Commands::Settings { action } = &cli.command {
        run_settings(action, cli.json);
        return;
    }

    let (data_dir, loaded_settings) = resolve_data_dir(cli.data_dir.as_deref());
    let state = AppState::open(&data_dir);
    *state.settings.lock() = loaded_settings;

    match cli.command {
        Commands::Catalog { action } => run_catalog(&state, &action, cli.json),
        Commands::Stacks { action } => run_stacks(&state, &action, cli.json),
        Commands::Save { name, rows } => run_save(&state, &name, &rows),
        Commands::Run {
            stack,
            restore_session,
        } => run_run(&state, &stack, restore_session, cli.json),
        Commands::Keys => {
            let keys = builtin_registry().keys();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&keys).unwrap());
            } else {
                for key in keys {
                    println!("{key}");
                }
            }
        }
        Commands::Index { value } => run_index(&state, &value),
        Commands::Settings { .. } => {}
    }
}

// ── Subcommand handlers ──────────────────────────────────────────

fn run_settings(action: &SettingsAction, json: bool) {
    let config_dir = dirs_config_dir();
    match action {
        SettingsAction::Show => match settings::load_settings(&config_dir) {
            Some(s) => {
                if json {
                    println!("{}", serde_json::to_string_pretty(&s).unwrap());
                } else {
                    println!("data_dir: {}", s.data_dir.display());
                }
            }
            None => fail("no settings found"),
        },
        SettingsAction::Init { data_dir } => {
            let data_path = PathBuf::from(data_dir);
            std::fs::create_dir_all(&data_path)
                .unwrap_or_else(|e| fail(&format!("cannot create data dir: {e}")));
            let s = AppSettings::new(data_path);
            settings::save_settings(&config_dir, &s)
                .unwrap_or_else(|e| fail(&format!("cannot save settings: {e}")));
            eprintln!("[Stackdeck] settings written to {}", config_dir.display());
        }
    }
}

fn run_catalog(state: &AppState, action: &CatalogAction, json: bool) {
    match action {
        CatalogAction::List => state.with_catalog(|catalog| {
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.defs()).unwrap());
            } else {
                for (position, def) in catalog.defs().iter().enumerate() {
                    println!(
                        "{position:3}  {:<24} key={:<20} inputs={}",
                        def.name,
                        def.definition_key,
                        def.inputs.len()
                    );
                }
            }
        }),
        CatalogAction::Show { name } => state.with_catalog(|catalog| {
            let Some((position, def)) = catalog.find(name) else {
                fail(&format!("No function definition found for '{name}'"));
            };
            if json {
                println!("{}", serde_json::to_string_pretty(def).unwrap());
            } else {
                println!("position:    {position}");
                println!("name:        {}", def.name);
                println!("key:         {}", def.definition_key);
                println!("description: {}", def.description);
                for (slot, input) in def.inputs.iter().enumerate() {
                    println!(
                        "input {slot}:     type={} default='{}' options='{}'",
                        input.kind.as_str(),
                        input.default_value,
                        input.options
                    );
                }
            }
        }),
        CatalogAction::Seed => {
            let path = state.catalog_path();
            save_catalog(&path, &starter_definitions())
                .unwrap_or_else(|e| fail(&format!("cannot write catalog: {e}")));
            eprintln!("[Stackdeck] starter catalog written to {}", path.display());
        }
    }
}

fn run_stacks(state: &AppState, action: &StackAction, json: bool) {
    let path = state.stacks_path();
    match action {
        StackAction::List => {
            let names = stacks::list_stacks(&path)
                .unwrap_or_else(|e| fail(&format!("cannot list stacks: {e}")));
            if json {
                println!("{}", serde_json::to_string_pretty(&names).unwrap());
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
        StackAction::Show { name } => {
            let entries = stacks::restore_stack(&path, name)
                .unwrap_or_else(|e| fail(&e.to_string()));
            if json {
                println!("{}", serde_json::to_string_pretty(&entries).unwrap());
            } else {
                for entry in &entries {
                    println!("{:3}  {:<24} value='{}'", entry.index, entry.name, entry.value);
                }
            }
        }
        StackAction::Duplicate { source, new_name } => {
            stacks::duplicate_stack(&path, source, new_name)
                .unwrap_or_else(|e| fail(&e.to_string()));
            eprintln!("[Stackdeck] duplicated '{source}' as '{new_name}'");
        }
        StackAction::Delete { name } => {
            stacks::delete_stack(&path, name).unwrap_or_else(|e| fail(&e.to_string()));
            eprintln!("[Stackdeck] deleted '{name}' (if present)");
        }
    }
}

/// Build rows from `NAME[=VALUE]` specs and save them as a named stack.
fn run_save(state: &AppState, stack_name: &str, row_specs: &[String]) {
    let catalog = state.with_catalog(Catalog::clone);
    let mut rows = RowStack::new();
    for spec in row_specs {
        let (name, value) = match spec.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (spec.as_str(), None),
        };
        let position = rows.add_row(&catalog);
        rows.select(position, name, &catalog);
        if let Some(value) = value {
            for (slot, part) in value.split(';').enumerate() {
                rows.set_value(position, slot, part);
            }
        }
    }
    let entries = rows.entries(&catalog);
    stacks::save_stack(&state.stacks_path(), stack_name, &entries)
        .unwrap_or_else(|e| fail(&e.to_string()));
    eprintln!(
        "[Stackdeck] saved stack '{stack_name}' with {} rows",
        entries.len()
    );
}

fn run_run(state: &AppState, stack_name: &str, restore_session: bool, json: bool) {
    let catalog = state.with_catalog(Catalog::clone);
    let entries = stacks::restore_stack(&state.stacks_path(), stack_name)
        .unwrap_or_else(|e| fail(&e.to_string()));

    let registry = builtin_registry();
    let mut host = SimHost::new();

    let report = state.with_rows_mut(|rows| {
        rows.load_entries(&entries, &catalog);
        run_stack(rows, &catalog, &registry, &mut host)
    });
    state.set_output(&report.message);

    if restore_session {
        if let Err(e) = report.snapshot.restore(&mut host) {
            eprintln!("[Stackdeck] session restore failed: {e}");
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report).unwrap());
    } else {
        let status = match report.status {
            RunStatus::Success => "Success",
            RunStatus::Warning => "Warning",
            RunStatus::Failed => "Failed",
        };
        println!("status: {status}");
        println!("{}", report.message);
        println!(
            "host: take='{}' frame={} layers_active={}",
            host.current_take().1,
            host.current_frame(),
            host.active_layer()
        );
        if !host.saved_files.is_empty() {
            println!("saved files: {}", host.saved_files.join(", "));
        }
    }

    if report.status == RunStatus::Failed {
        process::exit(1);
    }
}

fn run_index(state: &AppState, value: &str) {
    let catalog = state.with_catalog(Catalog::clone);
    let feedback = state.with_rows_mut(|rows| {
        let position = rows.add_row(&catalog);
        rows.set_index(position, value, &catalog)
    });
    match feedback {
        IndexFeedback::Selected(index) => println!("selected index {index}"),
        IndexFeedback::Clamped { index, message } => {
            println!("{message}");
            println!("selected index {index}");
        }
        IndexFeedback::Ignored => println!("ignored"),
    }
}
