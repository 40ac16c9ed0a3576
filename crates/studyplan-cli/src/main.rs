mod config;
mod history_cmd;
mod page;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use studyplan_core::completion::OpenAiClient;
use studyplan_core::history::PgHistoryStore;
use studyplan_core::plan::PlanGenerator;
use studyplan_db::config::DbConfig;
use studyplan_db::pool;

use config::AppConfig;
use serve_cmd::AppState;

#[derive(Parser)]
#[command(name = "studyplan", about = "LLM-generated study plans from a syllabus and deadlines")]
struct Cli {
    /// Database URL (overrides STUDYPLAN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a studyplan config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database if needed and apply migrations
    DbInit,
    /// Run the web server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 5000)]
        port: u16,
    },
    /// Print stored study plans, newest first
    History {
        /// Only show the most recent N entries
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        limit: Option<i64>,
    },
}

/// Execute the `studyplan init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let secret_key = config::generate_secret_key();

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        openai: config::OpenAiSection::default(),
        server: config::ServerSection {
            secret_key: secret_key.clone(),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  server.secret_key = {}...{}", &secret_key[..8], &secret_key[56..]);
    println!("  openai.api_key = (empty; fill it in or set {})", config::OPENAI_KEY_ENV);
    println!();
    println!("Next: run `studyplan db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `studyplan db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = AppConfig::resolve(cli_db_url)?;

    println!("Initializing studyplan database...");
    if pool::ensure_database_exists(&resolved.db_config).await? {
        println!("  created database");
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let status = pool::status(&db_pool).await?;
    println!(
        "  migrations: {}/{} applied",
        status.applied_migrations, status.known_migrations
    );
    println!("  history:    {} study plan(s)", status.history_entries);

    db_pool.close().await;
    println!("studyplan db-init complete.");
    Ok(())
}

/// Execute the `studyplan serve` command.
async fn cmd_serve(cli_db_url: Option<&str>, bind: &str, port: u16) -> anyhow::Result<()> {
    let resolved = AppConfig::resolve(cli_db_url)?;
    let api_key = resolved.require_openai_key()?;
    if resolved.uses_placeholder_secret() {
        tracing::warn!(
            "no secret key configured; set {} or run `studyplan init`",
            config::SECRET_KEY_ENV
        );
    }

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let state = AppState {
        store: Arc::new(PgHistoryStore::new(db_pool.clone())),
        generator: Arc::new(PlanGenerator::new(Arc::new(OpenAiClient::new(api_key)))),
    };

    let result = serve_cmd::run_serve(state, bind, port).await;
    db_pool.close().await;
    result
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Serve { bind, port } => {
            cmd_serve(cli.database_url.as_deref(), &bind, port).await?;
        }
        Commands::History { limit } => {
            let resolved = AppConfig::resolve(cli.database_url.as_deref())?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = history_cmd::run_history(&db_pool, limit).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["studyplan", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { bind, port } => {
                assert_eq!(bind, "127.0.0.1");
                assert_eq!(port, 5000);
            }
            _ => panic!("expected serve"),
        }
        assert!(cli.database_url.is_none());
    }

    #[test]
    fn global_database_url_after_subcommand() {
        let cli = Cli::try_parse_from([
            "studyplan",
            "history",
            "--limit",
            "3",
            "--database-url",
            "postgresql://h:5432/db",
        ])
        .unwrap();
        assert_eq!(cli.database_url.as_deref(), Some("postgresql://h:5432/db"));
        assert!(matches!(cli.command, Commands::History { limit: Some(3) }));
    }

    #[test]
    fn history_limit_must_be_positive() {
        assert!(Cli::try_parse_from(["studyplan", "history", "--limit", "0"]).is_err());
    }
}
