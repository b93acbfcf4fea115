//! Jingle CLI - Command-line interface
//!
//! Usage:
//!   jingle hash <password>
//!   jingle verify <password> <stored-hex>
//!   jingle config [--file <path>]

use anyhow::Context;
use clap::{Parser, Subcommand};
use jingle_auth::PasswordHasher;
use jingle_core::config::AppConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jingle")]
#[command(about = "Jingle account tooling")]
#[command(version)]
struct Cli {
    /// Configuration file; environment variables still override it
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password the way the server stores it
    Hash {
        /// Password to hash
        password: String,
    },
    /// Check a password against a stored hash
    Verify {
        password: String,
        /// Stored credential bytes as hex
        stored: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.file.as_ref())?;
    let hasher = PasswordHasher::new(config.auth.salt_scheme);

    match cli.command {
        Commands::Hash { password } => {
            let stored = hasher.hash_for_storage(&password)?;
            println!("{}", hex::encode(stored));
        }
        Commands::Verify { password, stored } => {
            let stored = hex::decode(stored.trim()).context("stored hash is not valid hex")?;
            if hasher.verify(&password, &stored)? {
                println!("match");
            } else {
                println!("no match");
                std::process::exit(1);
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(file: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match file {
        Some(path) => AppConfig::from_file(path.clone())?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    tracing::debug!(salt_scheme = %config.auth.salt_scheme, "Configuration loaded");
    Ok(config)
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
    fn test_parse_hash() {
        let cli = Cli::try_parse_from(["jingle", "hash", "longenoughpw"]).unwrap();
        assert!(matches!(cli.command, Commands::Hash { password } if password == "longenoughpw"));
        assert!(cli.file.is_none());
    }

    #[test]
    fn test_parse_config_with_file() {
        let cli = Cli::try_parse_from(["jingle", "config", "--file", "jingle.toml"]).unwrap();
        assert!(matches!(cli.command, Commands::Config));
        assert_eq!(cli.file, Some(PathBuf::from("jingle.toml")));
    }

    #[test]
    fn test_hash_matches_known_vector() {
        let stored = PasswordHasher::default()
            .hash_for_storage("longenoughpw")
            .unwrap();
        assert_eq!(hex::encode(stored), "a206ebfaa596bce4bc324ebdac08b878");
    }
}
