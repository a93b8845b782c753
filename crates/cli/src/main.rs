//! DigiMart CLI - catalog seeding and role management.
//!
//! # Usage
//!
//! ```bash
//! # Load the demo catalog
//! dm-cli seed products crates/cli/seed/products.yaml
//!
//! # Check a catalog file without writing anything
//! dm-cli seed products catalog.yaml --dry-run
//!
//! # Grant or revoke a role
//! dm-cli roles grant --user-id 6f1c... --role admin
//! dm-cli roles revoke --user-id 6f1c... --role admin
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL` - Project URL
//! - `SUPABASE_SERVICE_ROLE_KEY` - Service-role key, bypasses row-level security

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use digimart_core::{AppRole, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "dm-cli")]
#[command(author, version, about = "DigiMart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the hosted database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage user roles
    Roles {
        #[command(subcommand)]
        action: RoleAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert catalog products from a YAML file
    Products {
        /// Path to the YAML catalog
        file: PathBuf,

        /// Validate the file without inserting anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Grant a role to a user
    Grant {
        /// Auth user id
        #[arg(short, long)]
        user_id: UserId,

        /// Role (`admin`, `moderator`, `user`)
        #[arg(short, long)]
        role: AppRole,
    },
    /// Revoke a role from a user
    Revoke {
        /// Auth user id
        #[arg(short, long)]
        user_id: UserId,

        /// Role (`admin`, `moderator`, `user`)
        #[arg(short, long)]
        role: AppRole,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, dry_run } => {
                commands::seed::products(&file, dry_run).await?;
            }
        },
        Commands::Roles { action } => match action {
            RoleAction::Grant { user_id, role } => commands::roles::grant(user_id, role).await?,
            RoleAction::Revoke { user_id, role } => commands::roles::revoke(user_id, role).await?,
        },
    }
    Ok(())
}
