use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its `.secrets` subdirectory and an initial `config.json` file
/// pointing at `api_url`.
///
/// # Arguments
/// - `budget_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/cmms-budget`
/// - `api_url` - The base URL of the backend API, e.g. `https://cmms.example.com/api/`
///
/// # Errors
/// - Returns an error if the URL is invalid or any file operations fail.
pub async fn init(budget_home: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(budget_home, api_url)
        .await
        .context("Unable to create the home directory and config")?;
    Ok(format!(
        "Successfully created the budget home at {} using the API at {}",
        config.root().display(),
        config.api_url()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("home");
        let out = init(&home, "http://localhost:8000/api").await.unwrap();
        assert!(out.message().contains("http://localhost:8000/api/"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.api_url().as_str(), "http://localhost:8000/api/");
    }

    #[tokio::test]
    async fn test_init_bad_url() {
        let dir = TempDir::new().unwrap();
        assert!(init(dir.path(), "cmms.example.com").await.is_err());
    }
}
