//! Configuration file handling.
//!
//! The configuration file is stored at `$CMMS_BUDGET_HOME/config.json` and holds the URL of the
//! backend API and, optionally, the location of the API token file.

use crate::{utils, Result};
use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "cmms-budget";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const API_TOKEN: &str = "api_token";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$CMMS_BUDGET_HOME` and from there it loads `$CMMS_BUDGET_HOME/config.json`.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the home directory, its `.secrets` subdirectory and an initial `config.json` that
    /// points at `api_url`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g.
    ///   `$HOME/cmms-budget`
    /// - `api_url` - The base URL of the backend API, e.g. `https://cmms.example.com/api/`
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not an http(s) URL or if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str) -> Result<Self> {
        let api_url = parse_api_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            api_url,
        })
    }

    /// This will
    /// - validate that the home directory exists and that the config file exists
    /// - load and validate the config file
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The home directory is missing, run 'budget init' first")?;
        let _ = utils::read_dir(&root)
            .await
            .context("The home directory is not readable")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)?;

        Ok(Self {
            secrets: root.join(SECRETS),
            root,
            config_path,
            config_file,
            api_url,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The base URL of the backend, always ending with `/`.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Returns the stored `token_path` if it is absolute, otherwise resolves it against the home
    /// directory.
    pub fn token_path(&self) -> PathBuf {
        let p = self.config_file.token_path();
        if p.is_absolute() {
            return p;
        }
        self.root.join(p)
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "cmms-budget",
///   "config_version": 1,
///   "api_url": "https://cmms.example.com/api/",
///   "token_path": ".secrets/api_token"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "cmms-budget"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the backend API
    api_url: String,

    /// Path to a file holding the API bearer token (optional, relative to the home directory or
    /// absolute). Defaults to $CMMS_BUDGET_HOME/.secrets/api_token if not specified
    #[serde(skip_serializing_if = "Option::is_none")]
    token_path: Option<PathBuf>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            token_path: None,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or names another app
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: ConfigFile = utils::deserialize(path.as_ref()).await?;
        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        ensure!(
            config.config_version == CONFIG_VERSION,
            "Unsupported config_version {}, expected {}",
            config.config_version,
            CONFIG_VERSION
        );
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(path, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the token path, defaulting to `.secrets/api_token`.
    fn token_path(&self) -> PathBuf {
        self.token_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(SECRETS).join(API_TOKEN))
    }
}

/// Parses the backend base URL, making sure it ends with `/` so endpoint paths join onto it.
fn parse_api_url(url: &str) -> Result<Url> {
    let mut parsed =
        Url::parse(url.trim()).with_context(|| format!("Invalid API URL '{url}'"))?;
    ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        "The API URL must use http or https, got '{url}'"
    );
    if !parsed.path().ends_with('/') {
        let path = format!("{}/", parsed.path());
        parsed.set_path(&path);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("budget_home");
        let config = Config::create(&home, "https://cmms.example.com/api")
            .await
            .unwrap();
        assert_eq!(config.api_url().as_str(), "https://cmms.example.com/api/");
        assert!(config.secrets().is_dir());
        assert!(config.config_path().is_file());
        assert_eq!(config.token_path(), config.root().join(".secrets/api_token"));

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.api_url(), config.api_url());
        assert_eq!(loaded.root(), config.root());
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
    }

    #[tokio::test]
    async fn test_config_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("The config file is missing"));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "wrong_app",
            "config_version": 1,
            "api_url": "https://cmms.example.com/api/"
        }"#;
        utils::write(&path, json).await.unwrap();
        let err = ConfigFile::load(&path).await.unwrap_err();
        assert!(err.to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_absolute_token_path() {
        let dir = TempDir::new().unwrap();
        let token = dir.path().join("elsewhere").join("token");
        let json = serde_json::json!({
            "app_name": "cmms-budget",
            "config_version": 1,
            "api_url": "http://localhost:8000/api/",
            "token_path": token,
        });
        utils::write(dir.path().join("config.json"), json.to_string())
            .await
            .unwrap();
        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.token_path(), token);
    }

    #[test]
    fn test_config_file_serialization_omits_none_fields() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("token_path"));
    }

    #[test]
    fn test_parse_api_url() {
        assert_eq!(
            parse_api_url("https://cmms.example.com/api/v1")
                .unwrap()
                .as_str(),
            "https://cmms.example.com/api/v1/"
        );
        assert_eq!(
            parse_api_url("http://localhost:8000").unwrap().as_str(),
            "http://localhost:8000/"
        );
        assert!(parse_api_url("ftp://example.com/").is_err());
        assert!(parse_api_url("not a url").is_err());
    }
}
