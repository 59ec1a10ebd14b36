//! Verity - directory password-compare authentication
//!
//! Authenticates users against an LDAP directory with a remote compare of
//! the stored password attribute.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use verity_core::config::{EncodingScheme, HashAlgorithmName, LoggingConfig};
use verity_core::VerityConfig;

#[derive(Parser)]
#[command(name = "verity")]
#[command(author = "Verity Team")]
#[command(version = verity_core::VERSION)]
#[command(about = "Directory password-compare authentication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// LDAP server URL
    #[arg(long, env = "VERITY_LDAP_URL", global = true)]
    ldap_url: Option<String>,

    /// Service account DN
    #[arg(long, env = "VERITY_BIND_DN", global = true)]
    bind_dn: Option<String>,

    /// Service account password
    #[arg(long, env = "VERITY_BIND_PASSWORD", hide_env_values = true, global = true)]
    bind_password: Option<String>,

    /// Root DN appended to user DN patterns
    #[arg(long, env = "VERITY_BASE_DN", global = true)]
    base_dn: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VERITY_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate a user with a directory compare
    Authenticate {
        /// Username to resolve
        #[arg(short, long)]
        username: String,

        /// Password to check
        #[arg(short, long, env = "VERITY_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Encode a password the way the directory stores it
    Hash {
        /// Encoding scheme
        #[arg(long, value_enum, default_value = "salted")]
        scheme: SchemeArg,

        /// Digest algorithm
        #[arg(long, value_enum, default_value = "sha1")]
        algorithm: AlgorithmArg,

        /// Salt length in bytes for the salted scheme
        #[arg(long, default_value_t = 8)]
        salt_length: usize,

        /// Emit a lowercase scheme tag
        #[arg(long)]
        lowercase: bool,

        /// Password to encode
        password: String,
    },

    /// Validate configuration and print the effective settings
    CheckConfig {
        /// Also open and bind a connection to the server
        #[arg(long)]
        connect: bool,
    },

    /// Show version information
    Version,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemeArg {
    Salted,
    Digest,
    Plaintext,
}

impl From<SchemeArg> for EncodingScheme {
    fn from(scheme: SchemeArg) -> Self {
        match scheme {
            SchemeArg::Salted => EncodingScheme::Salted,
            SchemeArg::Digest => EncodingScheme::Digest,
            SchemeArg::Plaintext => EncodingScheme::Plaintext,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    Sha1,
    Sha256,
    Sha512,
    Md5,
}

impl From<AlgorithmArg> for HashAlgorithmName {
    fn from(algorithm: AlgorithmArg) -> Self {
        match algorithm {
            AlgorithmArg::Sha1 => HashAlgorithmName::Sha1,
            AlgorithmArg::Sha256 => HashAlgorithmName::Sha256,
            AlgorithmArg::Sha512 => HashAlgorithmName::Sha512,
            AlgorithmArg::Md5 => HashAlgorithmName::Md5,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Load or create config
    let mut config = if let Some(config_path) = &cli.config {
        VerityConfig::from_file(config_path)?
    } else {
        VerityConfig::from_env()
    };

    // Override with CLI args
    if let Some(url) = cli.ldap_url {
        config.ldap.server_url = url;
    }
    if let Some(bind_dn) = cli.bind_dn {
        config.ldap.bind_dn = bind_dn;
    }
    if let Some(bind_password) = cli.bind_password {
        config.ldap.bind_password = bind_password;
    }
    if let Some(base_dn) = cli.base_dn {
        config.ldap.base_dn = base_dn;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging);
    debug!("Using LDAP server {}", config.ldap.server_url);

    let ctx = CommandContext {
        config,
        output_format: cli.output,
    };

    match cli.command {
        Commands::Authenticate { username, password } => {
            commands::authenticate::execute(&ctx, &username, &password).await
        }
        Commands::Hash {
            scheme,
            algorithm,
            salt_length,
            lowercase,
            password,
        } => commands::hash::execute(
            &ctx,
            scheme.into(),
            algorithm.into(),
            salt_length,
            lowercase,
            &password,
        ),
        Commands::CheckConfig { connect } => commands::check_config::execute(&ctx, connect).await,
        Commands::Version => {
            println!("verity {}", verity_core::VERSION);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs go to stderr so command output on stdout stays parseable
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hash_command() {
        let cli = Cli::parse_from([
            "verity",
            "hash",
            "--scheme",
            "digest",
            "--algorithm",
            "sha256",
            "secret",
        ]);

        match cli.command {
            Commands::Hash {
                scheme,
                algorithm,
                salt_length,
                password,
                ..
            } => {
                assert_eq!(EncodingScheme::from(scheme), EncodingScheme::Digest);
                assert_eq!(HashAlgorithmName::from(algorithm), HashAlgorithmName::Sha256);
                assert_eq!(salt_length, 8);
                assert_eq!(password, "secret");
            }
            _ => panic!("expected hash command"),
        }
    }

    #[test]
    fn test_parse_authenticate_command() {
        let cli = Cli::parse_from([
            "verity",
            "--output",
            "json",
            "authenticate",
            "-u",
            "bob",
            "-p",
            "pw",
        ]);

        assert!(matches!(cli.output, OutputFormat::Json));
        assert!(matches!(
            cli.command,
            Commands::Authenticate { ref username, ref password } if username == "bob" && password == "pw"
        ));
    }
}
