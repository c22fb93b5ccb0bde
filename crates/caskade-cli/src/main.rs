//! Caskade - install queue runner
//!
//! Usage:
//!   caskade list               # Show the queue
//!   caskade add formula git    # Queue a package
//!   caskade run                # Execute the queue

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use caskade_core::config::{self, QueueFile, SettingsStore};
use caskade_core::exec::{
    DEFAULT_EVENT_CAPACITY, EventSink, ExecEvent, InstallSession, RunReport, RunSettings, Runner,
};
use caskade_core::manager::{Homebrew, InstalledQuery, InstalledSet};
use caskade_core::queue::{self, InstallItem, ItemKind, NewItem};
use caskade_core::types::{InstallAction, ItemStatus, LogStream};

#[derive(Parser)]
#[command(name = "caskade")]
#[command(about = "Install queue runner", long_about = None)]
struct Cli {
    /// Queue file to operate on
    #[arg(long, short, global = true, default_value = "caskade.json")]
    file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the queue
    List {
        /// Output format
        #[arg(short = 'o', long, default_value = "table")]
        format: OutputFormat,
    },

    /// Add a package or script to the queue
    Add {
        /// Item kind (formula, cask, mas, winget, chocolatey, apt, dnf,
        /// pacman, script)
        kind: String,
        /// Package name, or display name for scripts
        name: String,
        /// Script command, repeatable (scripts only)
        #[arg(long = "command", value_name = "CMD")]
        commands: Vec<String>,
        /// Description shown next to the item
        #[arg(long)]
        description: Option<String>,
    },

    /// Remove an item by id
    #[command(alias = "rm")]
    Remove {
        /// Item id, e.g. formula:git
        id: String,
    },

    /// Move an item to a new 1-based position
    Move {
        /// Item id, e.g. formula:git
        id: String,
        /// Target position; out-of-range values are clamped
        position: i64,
    },

    /// Execute the queue
    Run {
        /// Force reinstall even when a package is already present
        #[arg(long)]
        reinstall: bool,
        /// Stop at the first failed item
        #[arg(long)]
        fail_fast: bool,
        /// Substitution value for script variables (KEY=VALUE)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },

    /// Show or update persistent settings
    Config {
        /// Keep going past failed items
        #[arg(long)]
        continue_on_error: Option<bool>,
        /// Skip packages that are already installed
        #[arg(long)]
        skip_already_installed: Option<bool>,
        /// Accepted for compatibility; execution stays sequential
        #[arg(long)]
        parallel_installs: Option<bool>,
    },
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caskade=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::List { format } => run_list(&cli.file, format),
        Commands::Add {
            kind,
            name,
            commands,
            description,
        } => run_add(&cli.file, &kind, name, commands, description),
        Commands::Remove { id } => run_remove(&cli.file, &id),
        Commands::Move { id, position } => run_move(&cli.file, &id, position),
        Commands::Run {
            reinstall,
            fail_fast,
            set,
        } => run_queue_command(&cli.file, reinstall, fail_fast, set),
        Commands::Config {
            continue_on_error,
            skip_already_installed,
            parallel_installs,
        } => run_config(continue_on_error, skip_already_installed, parallel_installs),
    }
}

fn load_queue(path: &Path) -> Result<QueueFile> {
    if path.exists() {
        config::load_queue_file(path)
    } else {
        Ok(QueueFile::default())
    }
}

fn parse_kind(kind: &str, commands: Vec<String>) -> Result<ItemKind> {
    Ok(match kind.to_lowercase().as_str() {
        "formula" => ItemKind::Formula,
        "cask" => ItemKind::Cask { extensions: vec![] },
        "mas" => ItemKind::Mas,
        "winget" => ItemKind::Winget,
        "chocolatey" | "choco" => ItemKind::Chocolatey,
        "apt" => ItemKind::Apt,
        "dnf" => ItemKind::Dnf,
        "pacman" => ItemKind::Pacman,
        "script" => ItemKind::Script {
            commands,
            prompt_for_input: Default::default(),
        },
        _ => anyhow::bail!(
            "Unknown item kind: {kind}. Use formula, cask, mas, winget, chocolatey, apt, dnf, pacman, or script"
        ),
    })
}

fn run_list(file: &Path, format: OutputFormat) -> Result<()> {
    let queue_file = load_queue(file)?;
    let items = queue::reindex(queue_file.items);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        OutputFormat::Table => {
            if items.is_empty() {
                println!("Queue is empty.");
                return Ok(());
            }
            for item in &items {
                println!(
                    "{:>3}. {} {}  {}",
                    item.position.unwrap_or_default(),
                    status_glyph(item.status),
                    item.id,
                    style(&item.description).dim(),
                );
            }
        }
    }
    Ok(())
}

fn run_add(
    file: &Path,
    kind: &str,
    name: String,
    commands: Vec<String>,
    description: Option<String>,
) -> Result<()> {
    if !commands.is_empty() && kind != "script" {
        anyhow::bail!("--command only applies to script items");
    }
    let mut queue_file = load_queue(file)?;
    let kind = parse_kind(kind, commands)?;
    let mut params = NewItem::new(kind, name);
    if let Some(description) = description {
        params = params.with_description(description);
    }

    let outcome = queue::add(std::mem::take(&mut queue_file.items), params);
    queue_file.items = outcome.queue;
    for id in &outcome.duplicates {
        println!("{} {id} is already queued", style("!").yellow());
    }
    for id in &outcome.added {
        println!("{} queued {id}", style("+").green());
    }
    if !outcome.added.is_empty() {
        config::save_queue_file(file, &queue_file)?;
    }
    Ok(())
}

fn run_remove(file: &Path, id: &str) -> Result<()> {
    let mut queue_file = config::load_queue_file(file)?;
    let before = queue_file.items.len();
    queue_file.items = queue::remove(std::mem::take(&mut queue_file.items), id);
    if queue_file.items.len() == before {
        anyhow::bail!("No queued item with id {id}");
    }
    config::save_queue_file(file, &queue_file)?;
    println!("{} removed {id}", style("-").yellow());
    Ok(())
}

fn run_move(file: &Path, id: &str, position: i64) -> Result<()> {
    let mut queue_file = config::load_queue_file(file)?;
    if !queue::is_duplicate(&queue_file.items, id) {
        anyhow::bail!("No queued item with id {id}");
    }
    queue_file.items = queue::move_item(std::mem::take(&mut queue_file.items), id, position);
    config::save_queue_file(file, &queue_file)?;
    println!("Moved {id} to position {position}");
    Ok(())
}

fn run_config(
    continue_on_error: Option<bool>,
    skip_already_installed: Option<bool>,
    parallel_installs: Option<bool>,
) -> Result<()> {
    let store = SettingsStore::from_default_dir()?;
    let mut settings = store.load()?;

    let changed =
        continue_on_error.is_some() || skip_already_installed.is_some() || parallel_installs.is_some();
    if let Some(value) = continue_on_error {
        settings.continue_on_error = value;
    }
    if let Some(value) = skip_already_installed {
        settings.skip_already_installed = value;
    }
    if let Some(value) = parallel_installs {
        settings.parallel_installs = value;
    }
    if changed {
        store.save(&settings)?;
    }

    println!("continue_on_error = {}", settings.continue_on_error);
    println!("skip_already_installed = {}", settings.skip_already_installed);
    println!("parallel_installs = {}", settings.parallel_installs);
    Ok(())
}

fn run_queue_command(file: &Path, reinstall: bool, fail_fast: bool, set: Vec<String>) -> Result<()> {
    let queue_file = config::load_queue_file(file)?;

    let mut values = queue_file.values.clone();
    for pair in &set {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid value (expected KEY=VALUE): {pair}"))?;
        values.insert(key.to_string(), value.to_string());
    }

    // Queue-file settings win; otherwise fall back to the persistent store.
    let base_settings = match queue_file.settings.clone() {
        Some(settings) => settings,
        None => SettingsStore::from_default_dir()?.load()?,
    };
    let mut settings = RunSettings::from(base_settings);
    if fail_fast {
        settings.continue_on_error = false;
    }
    let action = if reinstall {
        InstallAction::Reinstall
    } else {
        InstallAction::Install
    };

    let items = queue::reindex(queue_file.items);
    if items.is_empty() {
        println!("Queue is empty.");
        return Ok(());
    }

    // Block on async execution from the sync CLI entry point.
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {e}"))?;
    let report = runtime.block_on(execute(items, values, settings, action))?;

    print_summary(&report);
    if report.failed > 0 {
        anyhow::bail!("{} item(s) failed", report.failed);
    }
    Ok(())
}

async fn execute(
    items: Vec<InstallItem>,
    values: HashMap<String, String>,
    settings: RunSettings,
    action: InstallAction,
) -> Result<RunReport> {
    let session = InstallSession::new();
    let (events, mut rx) = EventSink::channel(DEFAULT_EVENT_CAPACITY);

    let ctrlc_session = session.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling...");
            ctrlc_session.cancel();
        }
    });

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            render_event(event);
        }
    });

    let mut runner = Runner::new(session, settings, events);
    let installed: Box<dyn InstalledQuery> = match Homebrew::discover() {
        Ok(brew) => {
            runner = runner.with_env(brew.enhanced_env());
            Box::new(brew)
        }
        Err(err) => {
            tracing::warn!("{err:#}");
            Box::new(InstalledSet::default())
        }
    };

    let (_items, report) = runner.run(items, &values, installed.as_ref(), action).await;
    printer.await.ok();
    Ok(report)
}

fn render_event(event: ExecEvent) {
    match event {
        ExecEvent::Status {
            item_id,
            status,
            message,
        } => match status {
            ItemStatus::Installing => println!("{} {item_id}", style("→").cyan()),
            ItemStatus::Success => println!("{} {item_id}", style("✓").green()),
            ItemStatus::AlreadyInstalled => {
                println!("{} {item_id} already installed", style("=").green());
            }
            ItemStatus::Failed => println!(
                "{} {item_id}: {}",
                style("✗").red(),
                message.unwrap_or_default()
            ),
            ItemStatus::Skipped => println!(
                "{} {item_id} {}",
                style("-").yellow(),
                message.unwrap_or_default()
            ),
            ItemStatus::Pending | ItemStatus::Checking => {}
        },
        ExecEvent::Log { line, stream, .. } => match stream {
            LogStream::Stdout => println!("    {line}"),
            LogStream::Stderr => println!("    {}", style(format!("[stderr] {line}")).dim()),
        },
        ExecEvent::Finished { .. } => {}
    }
}

fn print_summary(report: &RunReport) {
    println!(
        "\n{} succeeded, {} failed, {} skipped, {} already installed ({:.1}s)",
        report.succeeded,
        report.failed,
        report.skipped,
        report.already_installed,
        report.duration.as_secs_f32()
    );
}

fn status_glyph(status: ItemStatus) -> console::StyledObject<&'static str> {
    match status {
        ItemStatus::Pending => style("·").dim(),
        ItemStatus::Checking => style("?").cyan(),
        ItemStatus::Installing => style("→").cyan(),
        ItemStatus::Success => style("✓").green(),
        ItemStatus::Failed => style("✗").red(),
        ItemStatus::Skipped => style("-").yellow(),
        ItemStatus::AlreadyInstalled => style("=").green(),
    }
}
