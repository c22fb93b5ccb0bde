//! Package-manager glue: argv planning, name validation, and the
//! installed-packages collaborator interface.

mod homebrew;

pub use homebrew::Homebrew;

use std::collections::HashSet;
use std::path::PathBuf;

use crate::queue::item::ItemKind;
use crate::types::InstallAction;

/// Program plus args for one package install. Spawned directly - package
/// installs never go through a shell.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandPlan {
    pub program: String,
    pub args: Vec<String>,
}

/// Build the manager invocation for a package item, or `None` for scripts.
pub fn command_plan(kind: &ItemKind, name: &str, action: InstallAction) -> Option<CommandPlan> {
    let reinstall = action == InstallAction::Reinstall;
    let plan = match kind {
        ItemKind::Formula => CommandPlan {
            program: "brew".to_string(),
            args: vec![brew_verb(reinstall).to_string(), name.to_string()],
        },
        ItemKind::Cask { .. } => CommandPlan {
            program: "brew".to_string(),
            args: vec![
                brew_verb(reinstall).to_string(),
                "--cask".to_string(),
                name.to_string(),
            ],
        },
        // mas has no reinstall verb; install is idempotent per app id.
        ItemKind::Mas => CommandPlan {
            program: "mas".to_string(),
            args: vec!["install".to_string(), name.to_string()],
        },
        ItemKind::Winget => {
            let mut args = vec![
                "install".to_string(),
                "--id".to_string(),
                name.to_string(),
                "--silent".to_string(),
                "--accept-package-agreements".to_string(),
                "--accept-source-agreements".to_string(),
            ];
            if reinstall {
                args.push("--force".to_string());
            }
            CommandPlan {
                program: "winget".to_string(),
                args,
            }
        }
        ItemKind::Chocolatey => {
            let mut args = vec!["install".to_string(), name.to_string(), "-y".to_string()];
            if reinstall {
                args.push("--force".to_string());
            }
            CommandPlan {
                program: "choco".to_string(),
                args,
            }
        }
        ItemKind::Apt => {
            let mut args = vec!["install".to_string(), "-y".to_string()];
            if reinstall {
                args.push("--reinstall".to_string());
            }
            args.push(name.to_string());
            CommandPlan {
                program: "apt-get".to_string(),
                args,
            }
        }
        ItemKind::Dnf => CommandPlan {
            program: "dnf".to_string(),
            args: vec![
                if reinstall { "reinstall" } else { "install" }.to_string(),
                "-y".to_string(),
                name.to_string(),
            ],
        },
        // pacman -S already reinstalls a present package.
        ItemKind::Pacman => CommandPlan {
            program: "pacman".to_string(),
            args: vec![
                "-S".to_string(),
                "--noconfirm".to_string(),
                name.to_string(),
            ],
        },
        ItemKind::Script { .. } => return None,
    };
    Some(plan)
}

fn brew_verb(reinstall: bool) -> &'static str {
    if reinstall { "reinstall" } else { "install" }
}

/// Allow-list check applied before anything is spawned.
///
/// Package names across the supported managers are ascii alphanumerics plus
/// a small punctuation set; `@ . _ + - /` covers versioned formulae
/// (`python@3.12`) and tap-qualified names (`homebrew/cask/firefox`).
/// Anything else is rejected without touching the process table.
pub fn is_valid_package_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '_' | '+' | '-' | '/'))
}

/// Locate a manager binary on PATH, falling back to Homebrew's standard
/// prefixes for `brew` itself (GUI-launched processes often miss them).
pub fn resolve_binary(program: &str) -> Option<PathBuf> {
    if let Ok(path) = which::which(program) {
        return Some(path);
    }
    if program == "brew" {
        return Homebrew::discover().ok().map(|brew| brew.binary().to_path_buf());
    }
    None
}

/// Names reported installed by the underlying manager, split the way
/// Homebrew-style managers report them.
#[derive(Debug, Clone, Default)]
pub struct InstalledSet {
    pub formulae: HashSet<String>,
    pub casks: HashSet<String>,
}

impl InstalledSet {
    pub fn insert_formula(&mut self, name: impl Into<String>) {
        self.formulae.insert(normalize(&name.into()));
    }

    pub fn insert_cask(&mut self, name: impl Into<String>) {
        self.casks.insert(normalize(&name.into()));
    }

    /// Whether `name` is already installed for the given item kind. Casks
    /// match the cask set; other package kinds match either set; scripts
    /// never match.
    pub fn contains(&self, kind: &ItemKind, name: &str) -> bool {
        let needle = normalize(name);
        match kind {
            ItemKind::Script { .. } => false,
            ItemKind::Cask { .. } => self.casks.contains(&needle),
            _ => self.formulae.contains(&needle) || self.casks.contains(&needle),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.formulae.is_empty() && self.casks.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// The "list installed packages" collaborator consumed by the executor.
#[async_trait::async_trait]
pub trait InstalledQuery: Send + Sync {
    async fn installed(&self) -> anyhow::Result<InstalledSet>;
}

/// A canned set doubles as a query; useful for tests and for callers that
/// already resolved the installed set elsewhere.
#[async_trait::async_trait]
impl InstalledQuery for InstalledSet {
    async fn installed(&self) -> anyhow::Result<InstalledSet> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_plan_formula_install() {
        let plan = command_plan(&ItemKind::Formula, "git", InstallAction::Install).unwrap();
        assert_eq!(plan.program, "brew");
        assert_eq!(plan.args, vec!["install", "git"]);
    }

    #[test]
    fn test_command_plan_cask_reinstall() {
        let kind = ItemKind::Cask { extensions: vec![] };
        let plan = command_plan(&kind, "firefox", InstallAction::Reinstall).unwrap();
        assert_eq!(plan.args, vec!["reinstall", "--cask", "firefox"]);
    }

    #[test]
    fn test_command_plan_apt_reinstall_flag_precedes_name() {
        let plan = command_plan(&ItemKind::Apt, "jq", InstallAction::Reinstall).unwrap();
        assert_eq!(plan.program, "apt-get");
        assert_eq!(plan.args, vec!["install", "-y", "--reinstall", "jq"]);
    }

    #[test]
    fn test_command_plan_none_for_scripts() {
        let kind = ItemKind::Script {
            commands: vec![],
            prompt_for_input: Default::default(),
        };
        assert!(command_plan(&kind, "setup", InstallAction::Install).is_none());
    }

    #[test]
    fn test_valid_package_names() {
        assert!(is_valid_package_name("git"));
        assert!(is_valid_package_name("python@3.12"));
        assert!(is_valid_package_name("homebrew/cask/firefox"));
        assert!(is_valid_package_name("libc++"));
    }

    #[test]
    fn test_invalid_package_names() {
        assert!(!is_valid_package_name(""));
        assert!(!is_valid_package_name("bad name"));
        assert!(!is_valid_package_name("rm;-rf"));
        assert!(!is_valid_package_name("$(true)"));
    }

    #[test]
    fn test_installed_set_matches_kind_against_the_right_bucket() {
        let mut set = InstalledSet::default();
        set.insert_formula("git");
        set.insert_cask("Firefox");

        assert!(set.contains(&ItemKind::Formula, "git"));
        assert!(set.contains(&ItemKind::Cask { extensions: vec![] }, "firefox"));
        assert!(!set.contains(&ItemKind::Cask { extensions: vec![] }, "git"));
        // Trimmed, case-insensitive lookups.
        assert!(set.contains(&ItemKind::Formula, "  GIT "));
    }

    #[test]
    fn test_installed_set_never_matches_scripts() {
        let mut set = InstalledSet::default();
        set.insert_formula("setup");

        let kind = ItemKind::Script {
            commands: vec![],
            prompt_for_input: Default::default(),
        };
        assert!(!set.contains(&kind, "setup"));
    }
}
