//! Runtime settings, read from the environment (and `.env`, if present).

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::bail;

pub const DEV_SECRET: &str = "town-chronicle-dev-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
    Local,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Backend::Sqlite),
            "local" => Ok(Backend::Local),
            other => bail!("unknown CHRONICLE_BACKEND '{other}' (expected sqlite or local)"),
        }
    }
}

/// Deployment profile. Only development may run on the built-in secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
}

impl FromStr for Profile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Profile::Development),
            "prod" | "production" => Ok(Profile::Production),
            other => bail!("unknown CHRONICLE_ENV '{other}' (expected development or production)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub profile: Profile,
    pub bind: String,
    pub backend: Backend,
    pub database_url: String,
    pub local_path: PathBuf,
    pub auth_secret: String,
    pub lexicon_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let profile: Profile = get("CHRONICLE_ENV", "development").parse()?;

        let auth_secret = match lookup("CHRONICLE_AUTH_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ if profile == Profile::Production => {
                bail!("CHRONICLE_AUTH_SECRET must be set when CHRONICLE_ENV is production")
            }
            _ => {
                log::warn!("CHRONICLE_AUTH_SECRET not set, using the development secret");
                DEV_SECRET.to_string()
            }
        };

        Ok(Self {
            profile,
            bind: get("CHRONICLE_BIND", "127.0.0.1:8080"),
            backend: get("CHRONICLE_BACKEND", "sqlite").parse()?,
            database_url: get("DATABASE_URL", "sqlite:town_chronicle.db"),
            local_path: PathBuf::from(get("CHRONICLE_LOCAL_PATH", "./data/chronicle.json")),
            auth_secret,
            lexicon_path: lookup("CHRONICLE_LEXICON").map(PathBuf::from),
        })
    }
}
