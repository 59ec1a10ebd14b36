//! check-config command - validate and display the effective configuration

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;
use verity_auth::{encoding_from_config, LdapDirectory};
use verity_core::VerityConfig;

#[derive(Serialize)]
struct ConfigSummary {
    server_url: String,
    start_tls: bool,
    bind_dn: Option<String>,
    base_dn: String,
    password_attribute: String,
    encoding: &'static str,
    user_dn_patterns: Vec<String>,
    user_search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    connection: Option<String>,
}

impl ConfigSummary {
    fn from_config(config: &VerityConfig) -> Self {
        Self {
            server_url: config.ldap.server_url.clone(),
            start_tls: config.ldap.start_tls,
            bind_dn: (!config.ldap.bind_dn.is_empty()).then(|| config.ldap.bind_dn.clone()),
            base_dn: config.ldap.base_dn.clone(),
            password_attribute: config.auth.password_attribute.clone(),
            encoding: encoding_from_config(&config.auth.encoding).name(),
            user_dn_patterns: config.auth.user_dn_patterns.clone(),
            user_search: config.auth.user_search.as_ref().map(|search| {
                format!(
                    "{} under '{}' ({})",
                    search.search_filter,
                    search.search_base,
                    if search.search_subtree { "subtree" } else { "one level" }
                )
            }),
            connection: None,
        }
    }
}

pub async fn execute(ctx: &CommandContext, connect: bool) -> Result<ExitCode> {
    let mut summary = ConfigSummary::from_config(&ctx.config);

    if let Err(e) = ctx.config.validate() {
        if ctx.is_json() {
            ctx.print_json(&serde_json::json!({ "valid": false, "error": e.to_string() }))?;
        } else {
            eprintln!("{} {}", "Invalid configuration:".red().bold(), e);
        }
        return Ok(ExitCode::from(1));
    }

    let mut exit = ExitCode::SUCCESS;
    if connect {
        let directory = LdapDirectory::new(ctx.config.ldap.clone());
        summary.connection = Some(match directory.test_connection().await {
            Ok(()) => "ok".to_string(),
            Err(e) => {
                exit = ExitCode::from(2);
                e.to_string()
            }
        });
    }

    if ctx.is_json() {
        ctx.print_json(&summary)?;
    } else {
        print_summary(&summary);
    }

    Ok(exit)
}

fn print_summary(summary: &ConfigSummary) {
    println!("{}", "Configuration is valid".green().bold());
    println!("  Server:             {}", summary.server_url);
    println!("  StartTLS:           {}", summary.start_tls);
    println!(
        "  Bind DN:            {}",
        summary.bind_dn.as_deref().unwrap_or("(anonymous)")
    );
    println!("  Base DN:            {}", summary.base_dn);
    println!("  Password attribute: {}", summary.password_attribute);
    println!("  Encoding:           {}", summary.encoding);

    if summary.user_dn_patterns.is_empty() {
        println!("  DN patterns:        (none)");
    } else {
        for pattern in &summary.user_dn_patterns {
            println!("  DN pattern:         {}", pattern.cyan());
        }
    }
    if let Some(search) = &summary.user_search {
        println!("  User search:        {}", search.cyan());
    }

    if let Some(connection) = &summary.connection {
        if connection == "ok" {
            println!("  Connection:         {}", "ok".green());
        } else {
            println!("  Connection:         {}", connection.red());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_hides_secrets() {
        let mut config = VerityConfig::default();
        config.ldap.bind_dn = "cn=admin,dc=example,dc=com".to_string();
        config.ldap.bind_password = "hunter2".to_string();
        config.auth.user_dn_patterns = vec!["uid={0},ou=people".to_string()];

        let json = serde_json::to_string(&ConfigSummary::from_config(&config)).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("cn=admin,dc=example,dc=com"));
    }

    #[test]
    fn test_summary_anonymous_bind() {
        let summary = ConfigSummary::from_config(&VerityConfig::default());
        assert!(summary.bind_dn.is_none());
        assert_eq!(summary.password_attribute, "userPassword");
    }
}
