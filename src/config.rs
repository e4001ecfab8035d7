use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings, read from the environment (and `.env` when present)
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub session_file: PathBuf,
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("directory-desk/", env!("CARGO_PKG_VERSION")).to_string(),
            session_file: PathBuf::from(".directory-session.json"),
            page_size: 12,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DIRECTORY_API_URL") {
            config.api_url = url;
        }
        if let Some(secs) = lookup("DIRECTORY_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("DIRECTORY_TIMEOUT_SECS must be a whole number, got {:?}", secs))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(agent) = lookup("DIRECTORY_USER_AGENT") {
            config.user_agent = agent;
        }
        if let Some(path) = lookup("DIRECTORY_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Some(size) = lookup("DIRECTORY_PAGE_SIZE") {
            config.page_size = size
                .trim()
                .parse()
                .with_context(|| format!("DIRECTORY_PAGE_SIZE must be a whole number, got {:?}", size))?;
            anyhow::ensure!(config.page_size > 0, "DIRECTORY_PAGE_SIZE must be at least 1");
        }

        Ok(config)
    }
}
