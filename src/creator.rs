//! Creator identity.
//!
//! The contact id assigned to every task the current user creates.
//! Resolution order:
//! 1) CLI --as (explicit)
//! 2) JOIN_CONTACT_ID environment variable
//! 3) Config value (user.contact_id)
//! 4) None: the task is created without a creator assignment

use crate::config::Config;

pub const CREATOR_ENV: &str = "JOIN_CONTACT_ID";

/// Resolve the creator using CLI, environment, and config.
pub fn resolve_creator(cli_creator: Option<&str>, config: &Config) -> Option<String> {
    let env_creator = std::env::var(CREATOR_ENV).ok();
    resolve_creator_from(cli_creator, env_creator.as_deref(), config)
}

/// Same as [`resolve_creator`] with the environment value passed in.
pub fn resolve_creator_from(
    cli_creator: Option<&str>,
    env_creator: Option<&str>,
    config: &Config,
) -> Option<String> {
    non_empty(cli_creator)
        .or_else(|| non_empty(env_creator))
        .or_else(|| non_empty(config.user.contact_id.as_deref()))
        .map(str::to_string)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.map(str::trim).filter(|value| !value.is_empty())
}
