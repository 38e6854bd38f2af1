//! Command-line interface for jb
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::Config;
use crate::creator;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind, EventSink};
use crate::output::OutputOptions;
use crate::store::{AuthSignal, GatedStore, RestStore};

mod board;
mod contact;
mod due;
mod task;

/// jb - Join board client
///
/// Manage tasks, subtasks and contacts of a Join Kanban board stored in a
/// Firebase Realtime Database.
#[derive(Parser, Debug)]
#[command(name = "jb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to ./.join.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database root URL
    #[arg(long, global = true, env = "JOIN_STORE_URL")]
    pub store_url: Option<String>,

    /// Database auth token
    #[arg(long, global = true, env = "JOIN_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Contact id of the current user (assigned to tasks you create)
    #[arg(long = "as", global = true, env = "JOIN_CONTACT_ID")]
    pub creator: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write change events as JSON lines to a file, or `-` for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Task management
    #[command(subcommand)]
    Task(TaskCommands),

    /// Show the board, one column per state
    Board {
        /// Only tasks whose title or description contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Contact management
    #[command(subcommand)]
    Contact(ContactCommands),

    /// Task categories
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Due-date helpers
    #[command(subcommand)]
    Due(DueCommands),
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task with its subtasks and assignments
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Due date (dd/mm/yyyy, must not be in the past)
        #[arg(long)]
        due: String,

        /// Priority: urgent, medium, low (default from config)
        #[arg(short, long)]
        priority: Option<String>,

        /// Category id or name
        #[arg(short, long)]
        category: String,

        /// Column: todo, inprogress, awaiting, done (default from config)
        #[arg(long)]
        state: Option<String>,

        /// Subtask title (repeatable, kept in order)
        #[arg(long = "subtask")]
        subtasks: Vec<String>,

        /// Contact id to assign (repeatable)
        #[arg(long = "contact")]
        contacts: Vec<String>,
    },

    /// Show one task with subtasks and contacts
    Show {
        /// Task id
        id: String,
    },

    /// Edit a task; only what changed is written
    Edit {
        /// Task id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Due date (dd/mm/yyyy)
        #[arg(long)]
        due: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        /// Category id or name
        #[arg(short, long)]
        category: Option<String>,

        #[arg(long)]
        state: Option<String>,

        /// Contact id to assign (repeatable)
        #[arg(long = "add-contact")]
        add_contacts: Vec<String>,

        /// Contact id to unassign (repeatable)
        #[arg(long = "remove-contact")]
        remove_contacts: Vec<String>,

        /// New subtask title (repeatable)
        #[arg(long = "add-subtask")]
        add_subtasks: Vec<String>,

        /// Subtask id to remove (repeatable)
        #[arg(long = "remove-subtask")]
        remove_subtasks: Vec<String>,
    },

    /// Delete a task, its subtasks and its assignments
    Rm {
        /// Task id
        id: String,
    },

    /// Move a task to another column
    Mv {
        /// Task id
        id: String,

        /// Target column: todo, inprogress, awaiting, done
        state: String,
    },

    /// Tick a subtask
    Check {
        /// Subtask id
        id: String,

        /// Untick instead
        #[arg(long)]
        undo: bool,
    },
}

/// Contact subcommands
#[derive(Subcommand, Debug)]
pub enum ContactCommands {
    /// Create a contact
    Add {
        /// Full name ("First Last")
        name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// List contacts alphabetically
    Ls,

    /// Update a contact
    Edit {
        /// Contact id
        id: String,

        /// Full name ("First Last")
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete a contact and unassign it from every task
    Rm {
        /// Contact id
        id: String,
    },
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories
    Ls,
}

/// Due-date subcommands
#[derive(Subcommand, Debug)]
pub enum DueCommands {
    /// Validate a due date the way the task form does
    Check {
        /// Value as typed, e.g. 15062030 or 15/06/2030
        value: String,
    },
}

/// Flags shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Globals {
    pub config: Option<PathBuf>,
    pub store_url: Option<String>,
    pub auth_token: Option<String>,
    pub creator: Option<String>,
    pub json: bool,
    pub quiet: bool,
    pub events: Option<String>,
}

impl Globals {
    /// Output options; events on stdout take over the stream.
    fn output(&self, events_to_stdout: bool) -> OutputOptions {
        OutputOptions {
            json: self.json && !events_to_stdout,
            quiet: self.quiet || events_to_stdout,
        }
    }

    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(&std::env::current_dir()?),
        };
        if let Some(url) = &self.store_url {
            config.store.base_url = Some(url.clone());
        }
        if let Some(token) = &self.auth_token {
            config.store.auth_token = Some(token.clone());
        }
        Ok(config)
    }
}

/// Everything a store-backed command needs.
pub(crate) struct Context {
    pub store: GatedStore<RestStore>,
    pub config: Config,
    pub creator: Option<String>,
    pub output: OutputOptions,
    events: Option<EventSink>,
}

impl Context {
    pub fn open(globals: &Globals) -> Result<Self> {
        let config = globals.load_config()?;
        let destination = EventDestination::parse(globals.events.as_deref());
        let events = destination.as_ref().map(|dest| dest.open()).transpose()?;
        let events_to_stdout = matches!(destination, Some(EventDestination::Stdout));

        let rest = RestStore::from_config(&config.store)?;
        let (signal, gate) = AuthSignal::new();
        let store = GatedStore::new(rest, gate);
        // Credentials are fixed for the whole run; the session is up once
        // the client exists.
        signal.ready();

        let creator = creator::resolve_creator(globals.creator.as_deref(), &config);
        Ok(Self {
            store,
            config,
            creator,
            output: globals.output(events_to_stdout),
            events,
        })
    }

    /// Emit a change event. Returns a warning when the sink fails.
    pub fn emit<T: Serialize>(&mut self, kind: EventKind, data: T) -> Option<String> {
        let sink = self.events.as_mut()?;
        let event = match Event::new(kind, self.creator.clone()).with_data(data) {
            Ok(event) => event,
            Err(err) => return Some(format!("event output failed: {err}")),
        };
        sink.emit(&event)
            .err()
            .map(|err| format!("event output failed: {err}"))
    }
}

impl Cli {
    fn globals(&self) -> Globals {
        Globals {
            config: self.config.clone(),
            store_url: self.store_url.clone(),
            auth_token: self.auth_token.clone(),
            creator: self.creator.clone(),
            json: self.json,
            quiet: self.quiet,
            events: self.events.clone(),
        }
    }

    /// Execute the CLI command on a single-threaded runtime.
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.dispatch())
    }

    async fn dispatch(self) -> Result<()> {
        let globals = self.globals();
        match self.command {
            Commands::Task(cmd) => match cmd {
                TaskCommands::Add {
                    title,
                    description,
                    due,
                    priority,
                    category,
                    state,
                    subtasks,
                    contacts,
                } => {
                    task::run_add(task::AddOptions {
                        title,
                        description,
                        due,
                        priority,
                        category,
                        state,
                        subtasks,
                        contacts,
                        globals,
                    })
                    .await
                }
                TaskCommands::Show { id } => {
                    task::run_show(task::ShowOptions { id, globals }).await
                }
                TaskCommands::Edit {
                    id,
                    title,
                    description,
                    due,
                    priority,
                    category,
                    state,
                    add_contacts,
                    remove_contacts,
                    add_subtasks,
                    remove_subtasks,
                } => {
                    task::run_edit(task::EditOptions {
                        id,
                        title,
                        description,
                        due,
                        priority,
                        category,
                        state,
                        add_contacts,
                        remove_contacts,
                        add_subtasks,
                        remove_subtasks,
                        globals,
                    })
                    .await
                }
                TaskCommands::Rm { id } => task::run_rm(task::RmOptions { id, globals }).await,
                TaskCommands::Mv { id, state } => {
                    task::run_mv(task::MvOptions { id, state, globals }).await
                }
                TaskCommands::Check { id, undo } => {
                    task::run_check(task::CheckOptions { id, undo, globals }).await
                }
            },
            Commands::Board { search } => {
                board::run_board(board::BoardOptions { search, globals }).await
            }
            Commands::Contact(cmd) => match cmd {
                ContactCommands::Add { name, email, phone } => {
                    contact::run_add(contact::AddOptions {
                        name,
                        email,
                        phone,
                        globals,
                    })
                    .await
                }
                ContactCommands::Ls => contact::run_ls(globals).await,
                ContactCommands::Edit {
                    id,
                    name,
                    email,
                    phone,
                } => {
                    contact::run_edit(contact::EditOptions {
                        id,
                        name,
                        email,
                        phone,
                        globals,
                    })
                    .await
                }
                ContactCommands::Rm { id } => {
                    contact::run_rm(contact::RmOptions { id, globals }).await
                }
            },
            Commands::Category(CategoryCommands::Ls) => board::run_categories(globals).await,
            Commands::Due(DueCommands::Check { value }) => {
                due::run_check(due::CheckOptions { value, globals })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeatable_flags_collect_in_order() {
        let cli = Cli::try_parse_from([
            "jb", "task", "add", "Ship", "--due", "01/01/2031", "--category", "tech",
            "--subtask", "one", "--subtask", "two", "--contact", "c1",
        ])
        .expect("parse");
        match cli.command {
            Commands::Task(TaskCommands::Add {
                subtasks, contacts, ..
            }) => {
                assert_eq!(subtasks, vec!["one", "two"]);
                assert_eq!(contacts, vec!["c1"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn flag_values_override_config() {
        let globals = Globals {
            config: Some(PathBuf::from("/definitely/missing.toml")),
            ..Globals::default()
        };
        assert!(globals.load_config().is_err());

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "[store]\nbase_url = \"https://a.example\"").expect("write");
        let globals = Globals {
            config: Some(path),
            store_url: Some("https://b.example".to_string()),
            auth_token: Some("tok".to_string()),
            ..Globals::default()
        };
        let config = globals.load_config().expect("config");
        assert_eq!(config.store.base_url.as_deref(), Some("https://b.example"));
        assert_eq!(config.store.auth_token.as_deref(), Some("tok"));
    }
}
