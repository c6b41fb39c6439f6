use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::captions::TrackPreference;
use crate::channel::youtube::API_BASE_URL;
use crate::cli::Cli;
use crate::output::DEFAULT_OUTPUT_FILE;
use crate::utils::is_valid_channel_id;
use crate::CollectorError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// YouTube access settings
    pub youtube: YoutubeConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    /// Data API v3 key
    pub api_key: Option<String>,

    /// Channel to collect
    pub channel_id: Option<String>,

    /// Caption languages, most preferred first
    pub languages: Vec<String>,

    /// Videos requested per listing call
    pub page_size: u32,

    /// Timeout for each remote call
    pub request_timeout_secs: u64,

    /// Data API endpoint
    pub api_base_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the combined transcripts are written
    pub output_path: PathBuf,

    /// Maximum concurrent transcript fetches
    pub max_concurrent_fetches: usize,

    /// yt-dlp executable
    pub yt_dlp_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube: YoutubeConfig::default(),
            app: AppConfig::default(),
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            channel_id: None,
            languages: vec!["en".to_string()],
            page_size: 50,
            request_timeout_secs: 30,
            api_base_url: API_BASE_URL.to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            max_concurrent_fetches: 4,
            yt_dlp_path: "yt-dlp".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or fall back to defaults
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::config_path().filter(|path| path.exists()),
        };

        match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                let content = fs_err::read_to_string(&path).context("Failed to read config file")?;
                Self::from_yaml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse a YAML configuration document
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Get configuration file path
    fn config_path() -> Option<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir().map(|dir| dir.join("channel-transcripts").join("config.yaml"))
    }

    /// Layer command line flags and environment variables over the file settings
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(key) = &cli.api_key {
            self.youtube.api_key = Some(key.clone());
        }
        if let Some(channel_id) = &cli.channel_id {
            self.youtube.channel_id = Some(channel_id.clone());
        }
        if let Some(output) = &cli.output {
            self.app.output_path = output.clone();
        }
        if !cli.languages.is_empty() {
            self.youtube.languages = cli.languages.clone();
        }
        if let Some(concurrency) = cli.concurrency {
            self.app.max_concurrent_fetches = concurrency;
        }
        if let Some(base_url) = &cli.api_base_url {
            self.youtube.api_base_url = base_url.clone();
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let key = self.youtube.api_key.as_deref().map(str::trim).unwrap_or("");
        if key.is_empty() {
            return Err(CollectorError::Auth(
                "no API key configured (use --api-key, YOUTUBE_API_KEY or youtube.api_key)".to_string(),
            )
            .into());
        }

        let channel_id = self.youtube.channel_id.as_deref().map(str::trim).unwrap_or("");
        if channel_id.is_empty() {
            return Err(CollectorError::NotFound(
                "no channel ID configured (use --channel-id, YOUTUBE_CHANNEL_ID or youtube.channel_id)"
                    .to_string(),
            )
            .into());
        }
        if !is_valid_channel_id(channel_id) {
            return Err(CollectorError::NotFound(format!(
                "'{}' is not a channel ID (expected \"UC\" followed by 22 characters)",
                channel_id
            ))
            .into());
        }

        if self.youtube.languages.iter().all(|lang| lang.trim().is_empty()) {
            anyhow::bail!("At least one caption language must be configured");
        }
        if self.youtube.request_timeout_secs == 0 {
            anyhow::bail!("Request timeout must be at least one second");
        }

        Ok(())
    }

    pub fn api_key(&self) -> &str {
        self.youtube.api_key.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn channel_id(&self) -> &str {
        self.youtube.channel_id.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.youtube.request_timeout_secs)
    }

    /// Caption track preference list derived from the configured languages
    pub fn track_preferences(&self) -> Vec<TrackPreference> {
        let languages: Vec<String> = self
            .youtube
            .languages
            .iter()
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect();
        TrackPreference::default_order(&languages)
    }

    /// One-line description for logs, without the key
    pub fn describe(&self) -> String {
        format!(
            "channel={} output={} languages={} page_size={} concurrency={} timeout={}s",
            self.channel_id(),
            self.app.output_path.display(),
            self.youtube.languages.join(","),
            self.youtube.page_size,
            self.app.max_concurrent_fetches,
            self.youtube.request_timeout_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captions::TrackKind;

    const CHANNEL: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";

    fn configured() -> Config {
        let mut config = Config::default();
        config.youtube.api_key = Some("key".to_string());
        config.youtube.channel_id = Some(CHANNEL.to_string());
        config
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.app.output_path, PathBuf::from("all_transcripts.txt"));
        assert_eq!(config.youtube.languages, vec!["en"]);
        assert_eq!(config.youtube.page_size, 50);
        assert_eq!(config.app.max_concurrent_fetches, 4);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "youtube:\n  api_key: abc\n  channel_id: UC_x5XG1OV2P6uZZ5FSM9Ttw\n  languages: [de, en]\napp:\n  output_path: out/channel.txt\n",
        )
        .unwrap();

        assert_eq!(config.api_key(), "abc");
        assert_eq!(config.youtube.languages, vec!["de", "en"]);
        assert_eq!(config.app.output_path, PathBuf::from("out/channel.txt"));
        assert_eq!(config.youtube.request_timeout_secs, 30);
        assert_eq!(config.app.yt_dlp_path, "yt-dlp");
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(Config::from_yaml("youtube:\n  page_size: lots\n").is_err());
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut config = configured();
        let cli = Cli {
            api_key: Some("from-cli".to_string()),
            output: Some(PathBuf::from("cli.txt")),
            languages: vec!["fr".to_string()],
            concurrency: Some(2),
            ..Default::default()
        };

        config.apply_cli(&cli);

        assert_eq!(config.api_key(), "from-cli");
        assert_eq!(config.channel_id(), CHANNEL);
        assert_eq!(config.app.output_path, PathBuf::from("cli.txt"));
        assert_eq!(config.youtube.languages, vec!["fr"]);
        assert_eq!(config.app.max_concurrent_fetches, 2);
    }

    #[test]
    fn missing_key_is_auth_error() {
        let mut config = configured();
        config.youtube.api_key = Some("  ".to_string());

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CollectorError>(),
            Some(CollectorError::Auth(_))
        ));
    }

    #[test]
    fn malformed_channel_is_not_found() {
        let mut config = configured();
        config.youtube.channel_id = Some("@somechannel".to_string());

        let err = config.validate().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CollectorError>(),
            Some(CollectorError::NotFound(_))
        ));
    }

    #[test]
    fn complete_config_validates() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn preferences_follow_languages() {
        let mut config = configured();
        config.youtube.languages = vec!["es".to_string(), " ".to_string()];

        let prefs = config.track_preferences();
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs[0], TrackPreference::new(TrackKind::Manual, "es"));
        assert_eq!(prefs[1], TrackPreference::new(TrackKind::AutoGenerated, "es"));
    }

    #[test]
    fn description_hides_key() {
        let mut config = configured();
        config.youtube.api_key = Some("super-secret".to_string());
        assert!(!config.describe().contains("super-secret"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/channel-transcripts.yaml"))).is_err());
    }
}
