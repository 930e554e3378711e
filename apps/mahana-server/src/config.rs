use anyhow::{anyhow, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env_string(
            "MAHANA_DATABASE_URL",
            Some("postgresql://localhost/mahana".to_string()),
        )?;
        Ok(Self { database_url })
    }
}

fn env_string(key: &str, default: Option<String>) -> Result<String> {
    match env::var(key) {
        Ok(value) => Ok(value.trim().to_string()),
        Err(_) => default.ok_or_else(|| anyhow!("missing env var {key}")),
    }
}
