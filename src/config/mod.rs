use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend root; `/signup` hangs off it
    pub api_url: String,

    /// Client collection endpoint, defaults to `{api_url}/clients`
    pub api_url_form: Option<String>,

    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    #[serde(default = "default_image_fetch_timeout")]
    pub image_fetch_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Stills written by the camera daemon, one per facing mode
    pub capture_user_path: Option<PathBuf>,
    pub capture_environment_path: Option<PathBuf>,

    #[serde(default = "default_report_title")]
    pub report_title: String,

    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_image_fetch_timeout() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_report_title() -> String {
    "Client Report".to_string()
}

fn default_log_file() -> PathBuf {
    PathBuf::from("client-intake.log")
}

impl Config {
    /// Load configuration from environment variables, after reading `.env` if present
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars).context("API_URL must be set (see .env)")?;
        Ok(config)
    }

    pub fn clients_url(&self) -> String {
        match &self.api_url_form {
            Some(url) if !url.trim().is_empty() => url.clone(),
            _ => format!("{}/clients", self.api_url.trim_end_matches('/')),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.image_fetch_timeout_secs)
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_fill_everything_but_the_api_url() {
        let config = Config::from_vars(vars(&[("API_URL", "https://api.example.com/")])).unwrap();
        assert_eq!(config.clients_url(), "https://api.example.com/clients");
        assert_eq!(config.reports_dir, PathBuf::from("reports"));
        assert_eq!(config.image_fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.report_title, "Client Report");
        assert!(config.capture_user_path.is_none());
    }

    #[test]
    fn explicit_form_url_wins() {
        let config = Config::from_vars(vars(&[
            ("API_URL", "https://api.example.com"),
            ("API_URL_FORM", "https://forms.example.com/v2/clients"),
            ("IMAGE_FETCH_TIMEOUT_SECS", "2"),
            ("CAPTURE_ENVIRONMENT_PATH", "/run/camera/back.jpg"),
        ]))
        .unwrap();
        assert_eq!(config.clients_url(), "https://forms.example.com/v2/clients");
        assert_eq!(config.image_fetch_timeout_secs, 2);
        assert_eq!(config.capture_environment_path, Some(PathBuf::from("/run/camera/back.jpg")));
    }

    #[test]
    fn missing_api_url_is_an_error() {
        assert!(Config::from_vars(vars(&[("REPORTS_DIR", "out")])).is_err());
    }
}
