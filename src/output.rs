//! Shared output formatting for jb CLI commands.
//!
//! `--json` wraps every result in a versioned envelope; otherwise a short
//! human summary is printed unless `--quiet` is set.

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "join.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

/// JSON envelope shared by success and error results.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "no_lines")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_lines")]
    next_steps: &'a [String],
}

fn no_lines(items: &&[String]) -> bool {
    items.is_empty()
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = match human {
            Some(h) => (h.warnings.as_slice(), h.next_steps.as_slice()),
            None => (&[][..], &[][..]),
        };
        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data: Some(data),
            error: None,
            warnings,
            next_steps,
        };
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else if let Some(human) = human.filter(|_| !options.quiet) {
        println!("{}", format_human(human));
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if !json {
        eprintln!("error: {err}");
        for step in &next_steps {
            eprintln!("  try: {step}");
        }
        return Ok(());
    }

    let payload: Envelope<'_, ()> = Envelope {
        schema_version: SCHEMA_VERSION,
        command,
        status: "error",
        data: None,
        error: Some(ErrorBody {
            message: err.to_string(),
            code: err.exit_code(),
            kind: error_kind(err),
            details: err.details(),
        }),
        warnings: &[],
        next_steps: &next_steps,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Render a result as a card: the header, aligned `Key  value` rows, the
/// indented detail lines, then warnings and suggested commands.
pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    let width = output
        .summary
        .iter()
        .map(|(key, _)| key.chars().count())
        .max()
        .unwrap_or(0);
    for (key, value) in &output.summary {
        if value.is_empty() {
            lines.push(format!("  {key}"));
        } else {
            lines.push(format!("  {key:<width$}  {value}"));
        }
    }

    if !output.details.is_empty() {
        lines.push(String::new());
        lines.extend(output.details.iter().map(|line| format!("  {line}")));
    }

    if !output.warnings.is_empty() || !output.next_steps.is_empty() {
        lines.push(String::new());
    }
    lines.extend(output.warnings.iter().map(|w| format!("warning: {w}")));
    lines.extend(output.next_steps.iter().map(|step| format!("next: {step}")));

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

/// Command name for the error envelope, e.g. `task add`. Global flag values
/// are skipped.
pub fn infer_command_name<I>(args: I) -> String
where
    I: IntoIterator<Item = String>,
{
    let mut words = positional_args(args.into_iter());
    let command = match words.next() {
        Some(cmd) => cmd,
        None => return "jb".to_string(),
    };

    if matches!(command.as_str(), "task" | "contact" | "category" | "due") {
        if let Some(sub) = words.next() {
            return format!("{command} {sub}");
        }
    }
    command
}

const VALUE_FLAGS: [&str; 5] = ["--config", "--store-url", "--auth-token", "--as", "--events"];

fn positional_args(args: impl Iterator<Item = String>) -> impl Iterator<Item = String> {
    let mut skip_next = false;
    args.filter(move |arg| {
        if skip_next {
            skip_next = false;
            return false;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            return false;
        }
        !arg.starts_with('-')
    })
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "access_denied",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::TaskNotFound(_) => vec!["jb board".to_string()],
        Error::ContactNotFound(_) => vec!["jb contact ls".to_string()],
        Error::InvalidDueDate(_) => vec!["jb due check <dd/mm/yyyy>".to_string()],
        Error::InvalidConfig(_) => {
            vec!["fix .join.toml or pass --store-url then retry".to_string()]
        }
        Error::PermissionDenied(_) | Error::AuthClosed => {
            vec!["check --auth-token / JOIN_AUTH_TOKEN".to_string()]
        }
        Error::PartialWrite { .. } => {
            vec!["inspect the task with jb task show <id>; completed writes were kept".to_string()]
        }
        _ => Vec::new(),
    }
}
