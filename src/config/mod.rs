use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::extractors::AudioFormat;
use crate::normalize::DEFAULT_TARGET_LEVEL;

/// Environment variable holding the catalog token
pub const TOKEN_ENV: &str = "CLIPPER_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote catalog settings
    pub catalog: CatalogConfig,

    /// Object storage settings
    pub storage: StorageConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// URL of the shared catalog document
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket clips are uploaded to
    pub bucket: String,

    /// Bucket region
    pub region: String,

    /// Custom S3-compatible endpoint (Backblaze B2, MinIO, ...)
    pub endpoint: Option<String>,

    /// Prefix of public clip links; derived from bucket and region when absent
    pub public_url_base: Option<String>,

    /// Optional key prefix
    pub key_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Local clip store document
    pub clips_path: PathBuf,

    /// Directory for raw downloads
    pub download_dir: PathBuf,

    /// Directory for normalized clips
    pub normalized_dir: PathBuf,

    /// Loudness target in dB (RMS)
    pub target_level: f64,

    /// Audio format for downloads and uploads
    pub audio_format: AudioFormat,

    /// yt-dlp executable
    pub yt_dlp_path: String,

    /// ffmpeg-normalize executable
    pub ffmpeg_normalize_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig {
                url: "https://category.rushia.moe".to_string(),
            },
            storage: StorageConfig {
                bucket: "RushiaBtn".to_string(),
                region: "us-west-002".to_string(),
                endpoint: Some("https://s3.us-west-002.backblazeb2.com".to_string()),
                public_url_base: Some("https://f002.backblazeb2.com/file/RushiaBtn".to_string()),
                key_prefix: None,
            },
            app: AppConfig {
                clips_path: PathBuf::from("clips.json"),
                download_dir: PathBuf::from("storage"),
                normalized_dir: PathBuf::from("normalized"),
                target_level: DEFAULT_TARGET_LEVEL,
                audio_format: AudioFormat::Mp3,
                yt_dlp_path: "yt-dlp".to_string(),
                ffmpeg_normalize_path: "ffmpeg-normalize".to_string(),
            },
        }
    }
}

impl StorageConfig {
    /// Prefix of public clip links
    pub fn public_base(&self) -> String {
        match &self.public_url_base {
            Some(base) => base.clone(),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("clipper").join("config.yaml"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.bucket.is_empty() {
            anyhow::bail!("Storage bucket must be configured");
        }

        crate::utils::validate_and_normalize_url(&self.catalog.url)
            .context("Invalid catalog URL")?;

        if let Some(endpoint) = &self.storage.endpoint {
            crate::utils::validate_and_normalize_url(endpoint)
                .context("Invalid storage endpoint")?;
        }

        if !self.app.target_level.is_finite() || self.app.target_level > 0.0 {
            anyhow::bail!("Target level must be a negative dB value, got {}", self.app.target_level);
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Catalog URL: {}", self.catalog.url);
        println!("  Bucket: {} ({})", self.storage.bucket, self.storage.region);
        if let Some(endpoint) = &self.storage.endpoint {
            println!("  Endpoint: {}", endpoint);
        }
        println!("  Public URL base: {}", self.storage.public_base());
        println!("  Clip store: {}", self.app.clips_path.display());
        println!("  Target level: {} dB", self.app.target_level);
        println!("  Audio format: {}", self.app.audio_format.as_str());
    }
}
