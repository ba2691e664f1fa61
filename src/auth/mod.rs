//! Authentication for GitHub and GitLab
//!
//! Supports CLI-based auth (gh) and environment variables.

use crate::error::{Error, Result};
use crate::types::Platform;
use std::process::Command;
use tracing::debug;

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from CLI tool (gh)
    Cli,
    /// Token from environment variable
    EnvVar,
}

/// A resolved API token
#[derive(Debug, Clone)]
pub struct Token {
    /// Token value
    pub value: String,
    /// Where it came from
    pub source: AuthSource,
}

/// Resolve a token for `platform`
pub fn get_token(platform: Platform) -> Result<Token> {
    match platform {
        Platform::GitHub => get_github_token(),
        Platform::GitLab => get_gitlab_token(),
    }
}

fn env_token(vars: &[&str]) -> Option<Token> {
    vars.iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.trim().is_empty())
        .map(|value| Token {
            value: value.trim().to_string(),
            source: AuthSource::EnvVar,
        })
}

/// GitHub token from `GITHUB_TOKEN`/`GH_TOKEN`, falling back to `gh auth token`
pub fn get_github_token() -> Result<Token> {
    if let Some(token) = env_token(&["GITHUB_TOKEN", "GH_TOKEN"]) {
        debug!("using GitHub token from environment");
        return Ok(token);
    }

    let output = Command::new("gh").args(["auth", "token"]).output();
    match output {
        Ok(out) if out.status.success() => {
            let value = String::from_utf8_lossy(&out.stdout).trim().to_string();
            if value.is_empty() {
                return Err(Error::Auth("gh returned an empty token".to_string()));
            }
            debug!("using GitHub token from gh CLI");
            Ok(Token {
                value,
                source: AuthSource::Cli,
            })
        }
        _ => Err(Error::Auth(
            "no GitHub token: set GITHUB_TOKEN or run 'gh auth login'".to_string(),
        )),
    }
}

/// GitLab token from `GITLAB_TOKEN`
pub fn get_gitlab_token() -> Result<Token> {
    env_token(&["GITLAB_TOKEN"])
        .ok_or_else(|| Error::Auth("no GitLab token: set GITLAB_TOKEN".to_string()))
}
