//! duastore CLI
//!
//! Command-line tools for managing a duastore content directory.
//!
//! # Commands
//!
//! - `open` - List every record of a collection
//! - `set` / `set-all` - Upsert records from JSON
//! - `updates` - List records changed after a watermark
//! - `grant` / `check` - Manage the admin allow-list
//! - `issue-token` / `verify` - Work with signed identity tokens

mod commands;

use clap::{Parser, Subcommand};
use duastore_core::BatchPolicy;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// duastore command-line content tools.
#[derive(Parser)]
#[command(name = "duastore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the content directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every record of a collection (tags, duas, themes)
    Open {
        /// Collection name
        collection: String,
    },

    /// Upsert one record
    Set {
        /// Collection name
        collection: String,

        /// Record as a JSON object, `id` optional
        json: String,
    },

    /// Upsert many records
    SetAll {
        /// Collection name
        collection: String,

        /// Records as a JSON array
        json: String,

        /// Insert records without an id instead of skipping them
        #[arg(long)]
        insert_unidentified: bool,
    },

    /// List records changed after a watermark
    Updates {
        /// Watermark (epoch millis); omit for everything
        #[arg(short, long)]
        since: Option<u64>,
    },

    /// Add an email to the admin allow-list
    Grant {
        /// Email to authorize
        email: String,
    },

    /// Check whether an email is on the admin allow-list
    Check {
        /// Email to check
        email: String,
    },

    /// Issue a signed identity token
    IssueToken {
        /// Email the token is issued for
        email: String,

        /// Signing secret
        #[arg(long)]
        secret: String,

        /// Extra claims as a JSON object
        #[arg(long)]
        claims: Option<String>,
    },

    /// Verify an identity token against the allow-list
    Verify {
        /// The token
        token: String,

        /// Signing secret
        #[arg(long)]
        secret: String,

        /// Token lifetime in seconds
        #[arg(long, default_value = "3600")]
        expiry: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Open { collection } => {
            let path = cli.path.ok_or("Content path required for open")?;
            let records = commands::records::open(&path, &collection).await?;
            commands::print_json(&records)?;
        }
        Commands::Set { collection, json } => {
            let path = cli.path.ok_or("Content path required for set")?;
            let record = commands::records::set(&path, &collection, &json).await?;
            commands::print_json(&record)?;
        }
        Commands::SetAll {
            collection,
            json,
            insert_unidentified,
        } => {
            let path = cli.path.ok_or("Content path required for set-all")?;
            let policy = if insert_unidentified {
                BatchPolicy::InsertUnidentified
            } else {
                BatchPolicy::SkipUnidentified
            };
            let outcomes = commands::records::set_all(&path, &collection, &json, policy).await?;
            commands::print_json(&outcomes)?;
        }
        Commands::Updates { since } => {
            let path = cli.path.ok_or("Content path required for updates")?;
            let updates = commands::records::updates(&path, since).await?;
            commands::print_json(&updates)?;
        }
        Commands::Grant { email } => {
            let path = cli.path.ok_or("Content path required for grant")?;
            if commands::admin::grant(&path, &email).await? {
                println!("✓ Granted {email}");
            } else {
                println!("{email} is already authorized");
            }
        }
        Commands::Check { email } => {
            let path = cli.path.ok_or("Content path required for check")?;
            let decision = commands::admin::check(&path, &email).await?;
            commands::print_json(&decision)?;
        }
        Commands::IssueToken {
            email,
            secret,
            claims,
        } => {
            let token = commands::token::issue(&secret, &email, claims.as_deref())?;
            println!("{token}");
        }
        Commands::Verify {
            token,
            secret,
            expiry,
        } => {
            let path = cli.path.ok_or("Content path required for verify")?;
            let decision = commands::token::verify(
                &path,
                &secret,
                &token,
                Duration::from_secs(expiry),
            )
            .await?;
            commands::print_json(&decision)?;
        }
    }

    Ok(())
}
