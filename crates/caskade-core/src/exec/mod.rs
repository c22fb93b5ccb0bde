//! Queue execution: items run in position order, one supervised child at a
//! time.
//!
//! The executor never throws per-item errors at the caller; every failure
//! lands in the item's status and log, and the run continues or halts per
//! `continue_on_error`.

pub mod error;
pub mod events;
mod process;
pub mod session;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::manager::{self, InstalledQuery, InstalledSet};
use crate::queue::item::{InstallItem, ItemKind};
use crate::types::{InstallAction, ItemStatus};
use crate::vars;

pub use error::ExecError;
pub use events::{DEFAULT_EVENT_CAPACITY, EventSink, ExecEvent};
pub use session::InstallSession;

use process::ProcessOutcome;

/// Run-level settings.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Keep going past a failed item (default) or abort the rest.
    pub continue_on_error: bool,
    /// Pre-check the installed set and skip items already present.
    pub skip_already_installed: bool,
    /// Accepted for config compatibility; execution is strictly sequential
    /// regardless.
    pub parallel_installs: bool,
    /// How long a terminated child gets before the forceful kill.
    pub kill_grace: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            skip_already_installed: true,
            parallel_installs: false,
            kill_grace: Duration::from_secs(5),
        }
    }
}

impl From<Settings> for RunSettings {
    fn from(settings: Settings) -> Self {
        Self {
            continue_on_error: settings.continue_on_error,
            skip_already_installed: settings.skip_already_installed,
            parallel_installs: settings.parallel_installs,
            ..Self::default()
        }
    }
}

/// Summary of one queue run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub already_installed: usize,
    pub duration: Duration,
}

enum ItemOutcome {
    Success,
    Failed(String),
    Cancelled,
}

/// Drives one queue through child-process execution.
///
/// A runner performs a single run and is consumed by it; construct a fresh
/// one for the next run, sharing the session if the same controller should
/// govern both.
pub struct Runner {
    session: InstallSession,
    settings: RunSettings,
    events: EventSink,
    env: HashMap<String, String>,
}

impl Runner {
    pub fn new(session: InstallSession, settings: RunSettings, events: EventSink) -> Self {
        Self {
            session,
            settings,
            events,
            env: HashMap::new(),
        }
    }

    /// Extra environment for spawned children - typically the enhanced PATH
    /// so GUI-launched runs see CLI tools.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Execute `queue` in array order. Returns the queue with final
    /// statuses and logs, plus a summary report.
    pub async fn run(
        self,
        mut queue: Vec<InstallItem>,
        values: &HashMap<String, String>,
        installed: &dyn InstalledQuery,
        action: InstallAction,
    ) -> (Vec<InstallItem>, RunReport) {
        let started = Instant::now();
        self.session.set_running(true);

        let preinstalled = self.query_installed(installed, action).await;
        if !preinstalled.is_empty() {
            self.mark_preinstalled(&mut queue, &preinstalled, action).await;
        }

        let mut aborted = false;
        for index in 0..queue.len() {
            if aborted {
                break;
            }
            if self.session.is_cancelled() {
                self.skip_remaining(&mut queue[index..]).await;
                break;
            }

            let item = &mut queue[index];
            if !runnable(item, action) {
                continue;
            }

            let outcome = match item.kind.clone() {
                ItemKind::Script { commands, .. } => {
                    self.run_script(item, &commands, values).await
                }
                _ => self.run_package(item, values, action).await,
            };

            match outcome {
                ItemOutcome::Success => {
                    item.status = ItemStatus::Success;
                    self.events.status(&item.id, ItemStatus::Success, None).await;
                }
                ItemOutcome::Failed(message) => {
                    item.status = ItemStatus::Failed;
                    item.push_log(format!("Error: {message}"));
                    self.events
                        .status(&item.id, ItemStatus::Failed, Some(message))
                        .await;
                    if !self.settings.continue_on_error {
                        aborted = true;
                    }
                }
                ItemOutcome::Cancelled => {
                    item.status = ItemStatus::Skipped;
                    item.push_log("cancelled");
                    self.events
                        .status(&item.id, ItemStatus::Skipped, Some("cancelled".to_string()))
                        .await;
                }
            }
        }

        let report = RunReport {
            total: queue.len(),
            succeeded: count(&queue, ItemStatus::Success),
            failed: count(&queue, ItemStatus::Failed),
            skipped: count(&queue, ItemStatus::Skipped),
            already_installed: count(&queue, ItemStatus::AlreadyInstalled),
            duration: started.elapsed(),
        };
        self.events.finished(report.clone()).await;
        self.session.set_running(false);
        (queue, report)
    }

    async fn query_installed(
        &self,
        installed: &dyn InstalledQuery,
        action: InstallAction,
    ) -> InstalledSet {
        if !self.settings.skip_already_installed || action == InstallAction::Reinstall {
            return InstalledSet::default();
        }
        match installed.installed().await {
            Ok(set) => set,
            Err(err) => {
                // Non-fatal: proceed as if nothing were installed.
                warn!("installed-package query failed: {err:#}");
                InstalledSet::default()
            }
        }
    }

    /// Mark every runnable package item that is already present as
    /// `already_installed` before anything executes; those items are never
    /// spawned.
    async fn mark_preinstalled(
        &self,
        queue: &mut [InstallItem],
        preinstalled: &InstalledSet,
        action: InstallAction,
    ) {
        for item in queue {
            if item.kind.is_script() || !runnable(item, action) {
                continue;
            }
            item.status = ItemStatus::Checking;
            self.events
                .status(&item.id, ItemStatus::Checking, None)
                .await;
            if preinstalled.contains(&item.kind, &item.name) {
                item.status = ItemStatus::AlreadyInstalled;
                item.push_log("already installed");
                self.events
                    .status(&item.id, ItemStatus::AlreadyInstalled, None)
                    .await;
            } else {
                item.status = ItemStatus::Pending;
            }
        }
    }

    async fn skip_remaining(&self, items: &mut [InstallItem]) {
        for item in items {
            if item.status.is_terminal() {
                continue;
            }
            item.status = ItemStatus::Skipped;
            item.push_log("cancelled");
            self.events
                .status(&item.id, ItemStatus::Skipped, Some("cancelled".to_string()))
                .await;
        }
    }

    async fn run_package(
        &self,
        item: &mut InstallItem,
        values: &HashMap<String, String>,
        action: InstallAction,
    ) -> ItemOutcome {
        let name = item.name.trim().to_string();
        if !manager::is_valid_package_name(&name) {
            return ItemOutcome::Failed(ExecError::InvalidName { name }.to_string());
        }
        let Some(plan) = manager::command_plan(&item.kind, &name, action) else {
            return ItemOutcome::Failed(format!("{} is not a package kind", item.kind.tag()));
        };
        let Some(program) = manager::resolve_binary(&plan.program) else {
            return ItemOutcome::Failed(
                ExecError::ManagerNotFound {
                    manager: plan.program,
                }
                .to_string(),
            );
        };

        item.status = ItemStatus::Installing;
        self.events
            .status(&item.id, ItemStatus::Installing, None)
            .await;
        debug!(item = %item.id, program = %program.display(), "spawning package install");

        let mut command = Command::new(&program);
        command.args(&plan.args);
        command.envs(&self.env);
        match process::run_streamed(
            command,
            item,
            &self.session,
            &self.events,
            self.settings.kill_grace,
        )
        .await
        {
            Ok(ProcessOutcome::Exited(status)) if status.success() => {
                if item.post_install.is_empty() {
                    return ItemOutcome::Success;
                }
                let commands = item.post_install.clone();
                self.run_shell_sequence(item, &commands, values).await
            }
            Ok(ProcessOutcome::Exited(status)) => {
                ItemOutcome::Failed(process::describe_exit(&status))
            }
            Ok(ProcessOutcome::Cancelled) => ItemOutcome::Cancelled,
            Err(err) => ItemOutcome::Failed(err.to_string()),
        }
    }

    /// Scripts require at least one command; commands run sequentially and
    /// the first failure fails the whole script.
    async fn run_script(
        &self,
        item: &mut InstallItem,
        commands: &[String],
        values: &HashMap<String, String>,
    ) -> ItemOutcome {
        if commands.is_empty() {
            return ItemOutcome::Failed(ExecError::NoCommands.to_string());
        }
        item.status = ItemStatus::Installing;
        self.events
            .status(&item.id, ItemStatus::Installing, None)
            .await;
        self.run_shell_sequence(item, commands, values).await
    }

    async fn run_shell_sequence(
        &self,
        item: &mut InstallItem,
        commands: &[String],
        values: &HashMap<String, String>,
    ) -> ItemOutcome {
        for raw in commands {
            // Cancellation is only checked between commands; a command
            // already running is signalled, not cut off mid-output.
            if self.session.is_cancelled() {
                return ItemOutcome::Cancelled;
            }
            let line = vars::substitute(raw, values);
            let mut command = process::shell_command(&line);
            command.envs(&self.env);
            match process::run_streamed(
                command,
                item,
                &self.session,
                &self.events,
                self.settings.kill_grace,
            )
            .await
            {
                Ok(ProcessOutcome::Exited(status)) if status.success() => {}
                Ok(ProcessOutcome::Exited(status)) => {
                    return ItemOutcome::Failed(format!(
                        "`{line}` {}",
                        process::describe_exit(&status)
                    ));
                }
                Ok(ProcessOutcome::Cancelled) => return ItemOutcome::Cancelled,
                Err(err) => return ItemOutcome::Failed(err.to_string()),
            }
        }
        ItemOutcome::Success
    }
}

/// Pending items run; `already_installed` items run again under a
/// reinstall action; other terminal statuses stay as they are. `checking`
/// and `installing` can only be left over from an interrupted run and are
/// treated as pending.
fn runnable(item: &InstallItem, action: InstallAction) -> bool {
    match item.status {
        ItemStatus::Pending | ItemStatus::Checking | ItemStatus::Installing => true,
        ItemStatus::AlreadyInstalled => action == InstallAction::Reinstall,
        ItemStatus::Success | ItemStatus::Failed | ItemStatus::Skipped => false,
    }
}

fn count(queue: &[InstallItem], status: ItemStatus) -> usize {
    queue.iter().filter(|item| item.status == status).count()
}
