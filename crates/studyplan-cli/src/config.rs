//! Configuration file management for studyplan.
//!
//! Provides a TOML config file at `~/.config/studyplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use studyplan_db::config::DbConfig;

pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const SECRET_KEY_ENV: &str = "STUDYPLAN_SECRET_KEY";

/// Used when no secret key is configured anywhere.
pub const PLACEHOLDER_SECRET_KEY: &str = "your_secret_key";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub openai: OpenAiSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: DbConfig::DEFAULT_URL.to_string(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct OpenAiSection {
    /// Left empty by `studyplan init`; fill in or set `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub secret_key: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the studyplan config directory.
///
/// XDG layout on every platform: `$XDG_CONFIG_HOME/studyplan` or
/// `~/.config/studyplan`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("studyplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("studyplan")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(config, &config_path())
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config_to(config: &ConfigFile, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

/// Generate a random secret key: 32 random bytes, hex-encoded (64 chars).
pub fn generate_secret_key() -> String {
    use rand::Rng;
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, built once at startup and passed by
/// reference to whatever needs it.
#[derive(Debug)]
pub struct AppConfig {
    pub db_config: DbConfig,
    pub openai_api_key: Option<String>,
    /// Server signing key. Banners render inline, so nothing signs with it
    /// yet; `serve` only checks it for the placeholder.
    pub secret_key: String,
}

impl AppConfig {
    /// Resolve configuration from the default config file location.
    ///
    /// - DB URL: `cli_db_url` > `STUDYPLAN_DATABASE_URL` > `[database] url` > default
    /// - OpenAI key: `OPENAI_API_KEY` > `[openai] api_key` > none
    /// - secret key: `STUDYPLAN_SECRET_KEY` > `[server] secret_key` > placeholder
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        Self::resolve_with(cli_db_url, load_config().ok())
    }

    pub fn resolve_with(cli_db_url: Option<&str>, file_config: Option<ConfigFile>) -> Result<Self> {
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DbConfig::ENV_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let openai_api_key = non_empty_env(OPENAI_KEY_ENV).or_else(|| {
            file_config
                .as_ref()
                .map(|c| c.openai.api_key.trim().to_string())
                .filter(|k| !k.is_empty())
        });

        let secret_key = non_empty_env(SECRET_KEY_ENV)
            .or_else(|| {
                file_config
                    .as_ref()
                    .map(|c| c.server.secret_key.trim().to_string())
                    .filter(|k| !k.is_empty())
            })
            .unwrap_or_else(|| PLACEHOLDER_SECRET_KEY.to_string());

        Ok(Self {
            db_config: DbConfig::new(db_url),
            openai_api_key,
            secret_key,
        })
    }

    /// The OpenAI key, or an error explaining where to put it.
    pub fn require_openai_key(&self) -> Result<&str> {
        match self.openai_api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!(
                "OpenAI API key not found; set {OPENAI_KEY_ENV} or fill in [openai] api_key in {}",
                config_path().display()
            ),
        }
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.secret_key == PLACEHOLDER_SECRET_KEY
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
