//! jb due command implementations.

use serde::Serialize;

use crate::due_date::{DueDateField, DueDateState};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};

use super::Globals;

pub struct CheckOptions {
    pub value: String,
    pub globals: Globals,
}

#[derive(Serialize)]
struct DueCheckOutput<'a> {
    input: &'a str,
    value: &'a str,
    valid: bool,
    state: DueDateState,
}

/// Feed the value through the form field as if typed, then blur it.
pub fn run_check(options: CheckOptions) -> Result<()> {
    let mut field = DueDateField::new();
    field.input(options.value.trim());
    let outcome = field.blur();
    if !outcome.valid {
        let detail = match field.state() {
            DueDateState::Error(err) => format!("{} ({err})", field.value()),
            _ => field.value().to_string(),
        };
        return Err(Error::InvalidDueDate(detail));
    }

    let output = DueCheckOutput {
        input: &options.value,
        value: &outcome.value,
        valid: outcome.valid,
        state: field.state(),
    };
    let mut human = HumanOutput::new("Due date valid");
    human.push_summary("Value", outcome.value.clone());
    if outcome.value != options.value.trim() {
        human.push_summary("Typed", options.value.clone());
    }

    emit_success(options.globals.output(false), "due check", &output, Some(&human))
}
