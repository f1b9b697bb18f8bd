use anyhow::Result;
use std::path::Path;
use url::Url;

use crate::catalog::NameMap;

/// Validate a URL and return normalized version
pub fn validate_and_normalize_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|_| anyhow::anyhow!("Invalid URL format: {}", url))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("URL must use HTTP or HTTPS protocol");
    }

    Ok(parsed.to_string())
}

/// Parse `locale:name` pairs into a name map.
///
/// Only the first `:` separates; names may contain further colons.
pub fn parse_names<S: AsRef<str>>(pairs: &[S]) -> Result<NameMap> {
    let mut names = NameMap::new();

    for pair in pairs {
        let pair = pair.as_ref();
        let (locale, name) = pair
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("Expected `locale:name`, got `{}`", pair))?;

        if locale.is_empty() || name.is_empty() {
            anyhow::bail!("Expected `locale:name`, got `{}`", pair);
        }
        names.insert(locale.to_string(), name.to_string());
    }

    if names.is_empty() {
        anyhow::bail!("At least one `locale:name` pair is required");
    }

    Ok(names)
}

/// Check if a file exists and is readable
pub fn check_file_accessible(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("Path is not a file: {}", path.display());
    }

    std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("Cannot access file {}: {}", path.display(), e))?;

    Ok(())
}

/// Check if the current environment has required tools
pub async fn check_dependencies(yt_dlp: &str, ffmpeg_normalize: &str) -> Vec<String> {
    let mut missing = Vec::new();

    if !check_command_available(yt_dlp).await {
        missing.push(format!("{} - required to download clips", yt_dlp));
    }

    if !check_command_available("ffmpeg").await {
        missing.push("ffmpeg - required to cut and encode audio".to_string());
    }

    if !check_command_available(ffmpeg_normalize).await {
        missing.push(format!("{} - required to normalize loudness", ffmpeg_normalize));
    }

    missing
}

/// Check if a command is available in PATH
pub async fn check_command_available(command: &str) -> bool {
    use tokio::process::Command;

    Command::new(command)
        .arg("--version")
        .output()
        .await
        .map(|output| output.status.success())
        .unwrap_or(false)
}
