//! join-board - Join Kanban task relationship & validation core
//!
//! Tasks, subtasks and contacts live in a Firebase Realtime Database as flat
//! tables. Relations are plain join rows (`taskSubtask`,
//! `taskContactAssigned`) that this crate keeps consistent by hand.
//!
//! # Core Concepts
//!
//! - **Creation**: a task is written together with its subtasks, links and
//!   contact assignments
//! - **Reconciliation**: an edit writes only the rows that differ
//! - **Cascade**: deleting a task removes every dependent join row first
//! - **Due dates**: a keystroke-driven `dd/mm/yyyy` state machine
//!
//! # Module Organization
//!
//! - `store`: Document store trait, REST and in-memory backends, auth gate
//! - `model`: Typed records and table names
//! - `create`: Task creation plan and persistence
//! - `edit`: Edit diff and minimal-write persistence
//! - `cascade`: Task deletion
//! - `due_date`: Due-date formatting and validation
//! - `board`: Resolved task snapshots, columns, moves
//! - `contacts`: Contact lifecycle and alphabetical grouping
//! - `session`: Add/edit form state
//! - `creator`: Creator contact resolution
//! - `config`: Configuration loading from `.join.toml`
//! - `error`: Error types and result aliases
//! - `events`: JSONL change events
//! - `output`: CLI output envelopes
//! - `cli`: Command-line interface using clap

pub mod board;
pub mod cascade;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod create;
pub mod creator;
pub mod due_date;
pub mod edit;
pub mod error;
pub mod events;
pub mod model;
pub mod output;
pub mod session;
pub mod store;

pub use error::{Error, Result};
