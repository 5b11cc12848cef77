//! The Joy Junction CLI - database migrations and fixture seeding.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront database migrations
//! jj-cli migrate
//!
//! # Load fixture content (blogs, hero-slides, testimonials, offers or all)
//! jj-cli seed all
//! ```
//!
//! Both commands read `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) from the
//! environment or a `.env` file.
//!
//! Seeding writes straight to the database, so a running storefront keeps
//! serving cached content until it is revalidated.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use joy_junction_storefront::seed::SeedTarget;

mod commands;

#[derive(Parser)]
#[command(name = "jj-cli")]
#[command(author, version, about = "The Joy Junction CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Upsert built-in fixture content
    Seed {
        /// What to seed: blogs, hero-slides, testimonials, offers or all
        #[arg(value_parser = parse_target)]
        target: SeedTarget,
    },
}

fn parse_target(raw: &str) -> Result<SeedTarget, String> {
    raw.parse().map_err(|e| format!("{e}"))
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { target } => commands::seed::fixtures(target).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_seed_target_argument() {
        let cli = Cli::try_parse_from(["jj-cli", "seed", "hero-slides"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Seed {
                target: SeedTarget::HeroSlides
            })
        ));

        assert!(Cli::try_parse_from(["jj-cli", "seed", "users"]).is_err());
    }
}
