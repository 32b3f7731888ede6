//! Configuration types and loading
//!
//! Client identity and endpoints come only from the environment:
//! `CLIENT_ID`, `CLIENT_SECRET`, `AUTH_URL`, `TOKEN_URL`. Each is required.
//!
//! Listener and HTTP client tuning may come from an optional TOML file with
//! a `[server]` table. Precedence: env vars > config file > defaults.
//! The client secret is never read from TOML.

use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "authcode-client.toml";

/// Root configuration, built once at startup and never mutated.
#[derive(Debug)]
pub struct Config {
    pub client: ClientConfig,
    pub server: ServerConfig,
}

/// OAuth client identity and authorization server endpoints
#[derive(Debug)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub auth_url: String,
    pub token_url: String,
    /// `http://localhost:<port>/callback`
    pub callback_uri: String,
}

/// Listener and outbound HTTP settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            timeout_secs: default_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    #[serde(default)]
    server: ServerConfig,
}

fn default_port() -> u16 {
    authcode::DEFAULT_PORT
}

fn default_timeout() -> u64 {
    30
}

fn default_max_connections() -> usize {
    1000
}

/// Where to look for the optional config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPath {
    pub path: PathBuf,
    /// Set when the path was named explicitly, so a missing file is an error.
    pub required: bool,
}

impl Config {
    /// Build configuration from the environment and the optional TOML file.
    ///
    /// `env` looks up a variable by name; `main` passes `std::env::var`.
    pub fn load(
        config_path: &ConfigPath,
        env: impl Fn(&str) -> Option<String>,
    ) -> common::Result<Self> {
        let client_id = required(&env, "CLIENT_ID")?;
        let client_secret = Secret::new(required(&env, "CLIENT_SECRET")?);
        let auth_url = required(&env, "AUTH_URL")?;
        let token_url = required(&env, "TOKEN_URL")?;

        validate_endpoint("AUTH_URL", &auth_url)?;
        validate_endpoint("TOKEN_URL", &token_url)?;

        let mut server = load_file(&config_path.path, config_path.required)?;

        if let Some(port) = env("PORT") {
            server.port = parse_env("PORT", &port)?;
        }
        if let Some(timeout) = env("TOKEN_TIMEOUT_SECS") {
            server.timeout_secs = parse_env("TOKEN_TIMEOUT_SECS", &timeout)?;
        }

        if server.port == 0 {
            return Err(common::Error::Config(
                "port must be greater than 0".into(),
            ));
        }
        if server.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        if server.max_connections == 0 {
            return Err(common::Error::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(Config {
            client: ClientConfig {
                client_id,
                client_secret,
                auth_url,
                token_url,
                callback_uri: authcode::callback_uri(server.port),
            },
            server,
        })
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(
        cli_path: Option<&str>,
        env: impl Fn(&str) -> Option<String>,
    ) -> ConfigPath {
        if let Some(p) = cli_path {
            return ConfigPath {
                path: PathBuf::from(p),
                required: true,
            };
        }
        if let Some(p) = env("CONFIG_PATH") {
            return ConfigPath {
                path: PathBuf::from(p),
                required: true,
            };
        }
        ConfigPath {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            required: false,
        }
    }
}

/// Blank values count as missing.
fn required(env: &impl Fn(&str) -> Option<String>, key: &'static str) -> common::Result<String> {
    env(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(common::Error::MissingEnv(key))
}

fn validate_endpoint(key: &str, url: &str) -> common::Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(common::Error::Config(format!(
            "{key} must start with http:// or https://, got: {url}"
        )))
    }
}

fn load_file(path: &Path, required: bool) -> common::Result<ServerConfig> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str::<FileConfig>(&contents)?.server),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            Ok(ServerConfig::default())
        }
        Err(e) => Err(common::Error::Config(format!(
            "failed to read config file {}: {e}",
            path.display()
        ))),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> common::Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| common::Error::Config(format!("{key} is invalid ({value:?}): {e}")))
}
