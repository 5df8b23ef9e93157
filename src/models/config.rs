use std::collections::HashMap;
use std::fs;

use anyhow::{bail, Result};
use serde::Deserialize;

pub const DEFAULT_REGION: &str = "KR";
pub const DEFAULT_MAX_RESULTS: u8 = 30;
const DEFAULT_USERNAME: &str = "admin";
const DEFAULT_PASSWORD: &str = "changeme";

const CONFIG_FILE: &str = "config.json";

/// Login-gate policy, decided once at startup. Open mode is the fallback when
/// either credential resolves to an empty string.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMode {
    Gated { username: String, password: String },
    Open,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub region: String,
    pub max_results: u8,
    pub auth: AuthMode,
}

/// Optional overrides read from config.json. Every field may be omitted;
/// missing ones fall back to environment variables, then to the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub region: Option<String>,
    // Accepts either a JSON number or a string
    pub max_results: Option<serde_json::Value>,
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Config {
    /// Loads configuration with precedence config.json > environment >
    /// built-in default. A missing API key is fatal.
    pub fn load() -> Result<Config> {
        let file = match fs::read_to_string(CONFIG_FILE) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(_) => FileConfig::default(),
        };
        let env: HashMap<String, String> = std::env::vars().collect();
        Config::resolve(file, &env)
    }

    fn resolve(file: FileConfig, env: &HashMap<String, String>) -> Result<Config> {
        let api_key = file
            .api_key
            .or_else(|| env.get("YOUTUBE_API_KEY").cloned())
            .unwrap_or_default();
        if api_key.is_empty() {
            bail!(
                "YOUTUBE_API_KEY is not set.\n\n\
                 Put it in config.json:\n\
                 {{\n  \"api_key\": \"YOUR_YOUTUBE_DATA_API_KEY\",\n  \"region\": \"KR\",\n  \"max_results\": \"30\",\n  \"auth_username\": \"admin\",\n  \"auth_password\": \"changeme\"\n}}\n\n\
                 or export it as an environment variable:\n\
                 YOUTUBE_API_KEY=YOUR_YOUTUBE_DATA_API_KEY"
            );
        }

        let region = file
            .region
            .or_else(|| env.get("YOUTUBE_REGION").cloned())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        // A value that does not parse falls back to the default
        let max_results = file
            .max_results
            .and_then(value_to_string)
            .or_else(|| env.get("MAX_RESULTS").cloned())
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_RESULTS);

        let username = file
            .auth_username
            .or_else(|| env.get("AUTH_USERNAME").cloned())
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string());
        let password = file
            .auth_password
            .or_else(|| env.get("AUTH_PASSWORD").cloned())
            .unwrap_or_else(|| DEFAULT_PASSWORD.to_string());

        // Empty credentials disable the gate entirely
        let auth = if username.is_empty() || password.is_empty() {
            AuthMode::Open
        } else {
            AuthMode::Gated { username, password }
        };

        Ok(Config {
            api_key,
            region,
            max_results,
            auth,
        })
    }
}
