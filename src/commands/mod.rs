//! Command registry (C6, spec.md §4.6).
//!
//! Grounded on the teacher's `TuiApp::new` command registration pattern
//! (`src/tui/app.rs`, a flat list of `{id, name, description, category}`
//! entries), generalized into a full registry with alias resolution and an
//! execution context, since spec.md requires argument parsing and
//! execution rather than just a palette entry.

use std::collections::HashMap;

use crate::domain::View;
use crate::state::{AppState, ModalRequest, Msg};
use crate::status::StatusLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Cluster,
    Namespace,
    Project,
    App,
    Theme,
    Sort,
    AppSet,
    None,
}

/// What a command produces. Async commands dispatch a completion `Msg`
/// later rather than blocking (spec.md §4.6 "Execution contract").
#[derive(Debug, Clone)]
pub enum CommandOutcome {
    /// Synchronous state mutation(s) to dispatch immediately.
    Dispatch(Vec<Msg>),
    /// The command needs to run async I/O; the caller is responsible for
    /// spawning it and feeding the result back as a later `Msg`.
    Deferred(String),
    /// User-visible warning; state is not mutated.
    Warning(String),
}

pub struct ExecutionContext<'a> {
    pub state: &'a AppState,
    pub status: &'a mut StatusLog,
}

pub struct Command {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub takes_arg: bool,
    pub arg_type: ArgType,
    pub execute: fn(&mut ExecutionContext, &[String]) -> CommandOutcome,
}

pub struct CommandRegistry {
    commands: Vec<Command>,
    /// Every alias (including the lowercased canonical name) to its index
    /// into `commands`.
    alias_map: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let commands = default_commands();
        let mut alias_map = HashMap::new();
        for (idx, cmd) in commands.iter().enumerate() {
            alias_map.insert(cmd.canonical.to_lowercase(), idx);
            for alias in cmd.aliases {
                alias_map.insert(alias.to_lowercase(), idx);
            }
        }
        Self { commands, alias_map }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn resolve(&self, token: &str) -> Option<&Command> {
        self.alias_map.get(&token.to_lowercase()).map(|&idx| &self.commands[idx])
    }

    /// All aliases (including canonical names), for the autocomplete
    /// engine's command-position candidates.
    pub fn all_aliases(&self) -> Vec<String> {
        self.alias_map.keys().cloned().collect()
    }

    /// Parses a `:`-prefixed command buffer and runs it.
    pub fn parse_and_execute(&self, buffer: &str, ctx: &mut ExecutionContext) -> CommandOutcome {
        let Some(rest) = buffer.strip_prefix(':') else {
            return CommandOutcome::Warning("command must begin with ':'".to_string());
        };
        let parts: Vec<&str> = rest.split_whitespace().collect();
        let Some(&cmd_token) = parts.first() else {
            return CommandOutcome::Warning("empty command".to_string());
        };
        let Some(cmd) = self.resolve(cmd_token) else {
            return CommandOutcome::Warning(format!("unknown command: {cmd_token}"));
        };
        let args: Vec<String> = parts[1..].iter().map(|s| s.to_string()).collect();
        (cmd.execute)(ctx, &args)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn default_commands() -> Vec<Command> {
    vec![
        Command {
            canonical: "cluster",
            aliases: &["clusters", "cls"],
            description: "Set scope to a single cluster",
            takes_arg: true,
            arg_type: ArgType::Cluster,
            execute: |_ctx, args| match args.first() {
                Some(name) => CommandOutcome::Dispatch(vec![Msg::DrillDown(name.clone())]),
                None => CommandOutcome::Warning("cluster requires an argument".to_string()),
            },
        },
        Command {
            canonical: "namespace",
            aliases: &["ns", "namespaces"],
            description: "Set scope to a single namespace",
            takes_arg: true,
            arg_type: ArgType::Namespace,
            execute: |_ctx, args| match args.first() {
                Some(name) => CommandOutcome::Dispatch(vec![Msg::DrillDown(name.clone())]),
                None => CommandOutcome::Warning("namespace requires an argument".to_string()),
            },
        },
        Command {
            canonical: "project",
            aliases: &["proj", "projects"],
            description: "Set scope to a single project",
            takes_arg: true,
            arg_type: ArgType::Project,
            execute: |_ctx, args| match args.first() {
                Some(name) => CommandOutcome::Dispatch(vec![Msg::DrillDown(name.clone())]),
                None => CommandOutcome::Warning("project requires an argument".to_string()),
            },
        },
        Command {
            canonical: "app",
            aliases: &["apps"],
            description: "Set scope to a single app",
            takes_arg: true,
            arg_type: ArgType::App,
            execute: |_ctx, args| match args.first() {
                Some(name) => CommandOutcome::Dispatch(vec![Msg::DrillDown(name.clone())]),
                None => CommandOutcome::Warning("app requires an argument".to_string()),
            },
        },
        Command {
            canonical: "all",
            aliases: &["clear"],
            description: "Clear every scope and selection; return to clusters",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |_ctx, _args| CommandOutcome::Dispatch(vec![Msg::ResetAll]),
        },
        Command {
            canonical: "up",
            aliases: &[],
            description: "Navigate up one level",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |_ctx, _args| CommandOutcome::Dispatch(vec![Msg::NavigateUp]),
        },
        Command {
            canonical: "sync",
            aliases: &[],
            description: "Open the confirm-sync modal for the current selection",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |ctx, _args| {
                // sync allows acting on the cursor app when selection is empty
                // (spec.md §9 open question, resolved here).
                let target = sync_target(ctx.state);
                match target {
                    Some(target) => CommandOutcome::Dispatch(vec![Msg::OpenModal(ModalRequest::ConfirmSync {
                        target,
                        prune: false,
                        watch: true,
                    })]),
                    None => CommandOutcome::Warning("no application to sync".to_string()),
                }
            },
        },
        Command {
            canonical: "diff",
            aliases: &[],
            description: "Show diff for the cursor app",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |ctx, _args| {
                if ctx.state.selected_apps.len() > 1 {
                    return CommandOutcome::Warning("diff requires at most one selected app".to_string());
                }
                match cursor_app_name(ctx.state) {
                    Some(name) => CommandOutcome::Deferred(format!("diff:{name}")),
                    None => CommandOutcome::Warning("no application under cursor".to_string()),
                }
            },
        },
        Command {
            canonical: "rollback",
            aliases: &[],
            description: "Open rollback view for the cursor app",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |ctx, _args| {
                // rollback requires exactly one target.
                let candidates = if ctx.state.selected_apps.is_empty() {
                    cursor_app_name(ctx.state).into_iter().collect::<Vec<_>>()
                } else {
                    ctx.state.selected_apps.iter().cloned().collect()
                };
                match candidates.as_slice() {
                    [only] => CommandOutcome::Dispatch(vec![Msg::OpenModal(ModalRequest::Rollback { app_name: only.clone() })]),
                    _ => CommandOutcome::Warning("rollback requires exactly one target".to_string()),
                }
            },
        },
        Command {
            canonical: "resources",
            aliases: &["res"],
            description: "Open resources view for selected or cursor app(s)",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |ctx, _args| {
                let target = sync_target(ctx.state);
                match target {
                    Some(app_name) => CommandOutcome::Dispatch(vec![Msg::OpenModal(ModalRequest::Resources { app_name })]),
                    None => CommandOutcome::Warning("no application to inspect".to_string()),
                }
            },
        },
        Command {
            canonical: "delete",
            aliases: &[],
            description: "Open confirm-delete modal",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |ctx, _args| {
                let target = sync_target(ctx.state);
                match target {
                    Some(target) => CommandOutcome::Dispatch(vec![Msg::OpenModal(ModalRequest::ConfirmDelete { target })]),
                    None => CommandOutcome::Warning("no application to delete".to_string()),
                }
            },
        },
        Command {
            canonical: "logs",
            aliases: &[],
            description: "Open the external log pager",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |ctx, _args| match cursor_app_name(ctx.state) {
                Some(name) => CommandOutcome::Deferred(format!("logs:{name}")),
                None => CommandOutcome::Warning("no application under cursor".to_string()),
            },
        },
        Command {
            canonical: "theme",
            aliases: &[],
            description: "Apply a theme",
            takes_arg: true,
            arg_type: ArgType::Theme,
            execute: |_ctx, args| match args.first() {
                Some(name) => CommandOutcome::Deferred(format!("theme:{name}")),
                None => CommandOutcome::Warning("theme requires an argument".to_string()),
            },
        },
        Command {
            canonical: "sort",
            aliases: &[],
            description: "Set the sort field and direction",
            takes_arg: true,
            arg_type: ArgType::Sort,
            execute: |_ctx, args| match (args.first(), args.get(1)) {
                (Some(field), Some(dir)) => CommandOutcome::Deferred(format!("sort:{field}:{dir}")),
                _ => CommandOutcome::Warning("sort requires <field> <asc|desc>".to_string()),
            },
        },
        Command {
            canonical: "quit",
            aliases: &["q"],
            description: "Clean shutdown",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |_ctx, _args| CommandOutcome::Dispatch(vec![Msg::System(crate::state::SystemEvent::Quit)]),
        },
        Command {
            canonical: "help",
            aliases: &["h", "?"],
            description: "Open help modal",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |_ctx, _args| CommandOutcome::Dispatch(vec![Msg::SetMode(crate::domain::Mode::Help)]),
        },
        Command {
            canonical: "upgrade",
            aliases: &[],
            description: "Check for and apply a self-upgrade",
            takes_arg: false,
            arg_type: ArgType::None,
            execute: |_ctx, _args| CommandOutcome::Deferred("upgrade".to_string()),
        },
    ]
}

fn cursor_app_name(state: &AppState) -> Option<String> {
    if state.navigation.view != View::Apps {
        return None;
    }
    crate::state::selectors::visible(state)
        .get(state.navigation.selected_idx)
        .map(|row| row.label.clone())
}

/// `sync` allows acting on the cursor app when selection is empty (spec.md
/// §9 open question, resolved per-command). When exactly one app is
/// selected or under the cursor, returns it; with multiple selected apps
/// the caller fans out per-app, so this helper only covers the
/// single-target modal path.
fn sync_target(state: &AppState) -> Option<String> {
    if !state.selected_apps.is_empty() {
        return state.selected_apps.iter().next().cloned();
    }
    cursor_app_name(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_resolution_is_case_insensitive() {
        let registry = CommandRegistry::new();
        assert_eq!(registry.resolve("CLS").unwrap().canonical, "cluster");
        assert_eq!(registry.resolve("q").unwrap().canonical, "quit");
    }

    #[test]
    fn unknown_command_does_not_panic() {
        let registry = CommandRegistry::new();
        assert!(registry.resolve("bogus").is_none());
    }

    #[test]
    fn diff_refuses_multi_selection() {
        let registry = CommandRegistry::new();
        let mut state = AppState::default();
        state.selected_apps.insert("a".to_string());
        state.selected_apps.insert("b".to_string());
        let mut log = StatusLog::new(10);
        let mut ctx = ExecutionContext { state: &state, status: &mut log };
        let outcome = registry.parse_and_execute(":diff", &mut ctx);
        assert!(matches!(outcome, CommandOutcome::Warning(_)));
    }
}
