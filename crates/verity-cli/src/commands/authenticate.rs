//! authenticate command - check a username and password against the directory

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;
use tracing::warn;
use verity_auth::LdapAuthProvider;

#[derive(Serialize)]
struct AuthenticateResult {
    authenticated: bool,
    username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn execute(ctx: &CommandContext, username: &str, password: &str) -> Result<ExitCode> {
    let provider = LdapAuthProvider::new(&ctx.config)?;

    match provider.authenticate(username, password).await {
        Ok(user) => {
            if ctx.is_json() {
                ctx.print_json(&AuthenticateResult {
                    authenticated: true,
                    username: username.to_string(),
                    dn: Some(user.dn().to_string()),
                    error: None,
                })?;
            } else {
                println!("{} {}", "Authenticated:".green().bold(), user.dn());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_authentication_failure() => {
            // The detailed reason stays in the log; callers only see the generic message
            warn!("Authentication failed for '{}': {}", username, e);
            report_failure(ctx, username, &e.public_message())?;
            Ok(ExitCode::from(1))
        }
        Err(e) => {
            report_failure(ctx, username, &e.to_string())?;
            Ok(ExitCode::from(2))
        }
    }
}

fn report_failure(ctx: &CommandContext, username: &str, message: &str) -> Result<()> {
    if ctx.is_json() {
        ctx.print_json(&AuthenticateResult {
            authenticated: false,
            username: username.to_string(),
            dn: None,
            error: Some(message.to_string()),
        })
    } else {
        eprintln!("{} {}", "Error:".red().bold(), message);
        Ok(())
    }
}
