use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::extractors::AudioFormat;

/// Default loudness target, RMS based
pub const DEFAULT_TARGET_LEVEL: f64 = -16.0;

/// Brings an audio file to a fixed loudness level
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Normalizer: Send + Sync {
    /// Normalize `input` to `target_level` dB, returning the path of the new file
    async fn normalize(&self, input: &Path, target_level: f64) -> anyhow::Result<PathBuf>;
}

/// Normalizer that shells out to `ffmpeg-normalize`
pub struct FfmpegNormalizer {
    binary: String,
    output_dir: PathBuf,
    format: AudioFormat,
}

impl FfmpegNormalizer {
    pub fn new(binary: impl Into<String>, output_dir: impl Into<PathBuf>, format: AudioFormat) -> Self {
        Self {
            binary: binary.into(),
            output_dir: output_dir.into(),
            format,
        }
    }

    /// The output keeps the input's stem and takes the configured format
    fn output_path(&self, input: &Path) -> anyhow::Result<PathBuf> {
        let stem = input
            .file_stem()
            .with_context(|| format!("Input has no file name: {}", input.display()))?;
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(self.format.as_str());
        Ok(self.output_dir.join(name))
    }

    fn build_args(&self, input: &Path, output: &Path, target_level: f64) -> Vec<String> {
        vec![
            input.to_string_lossy().into_owned(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
            "--normalization-type=rms".to_string(),
            format!("--target-level={}", target_level),
            format!("--audio-codec={}", self.format.ffmpeg_codec()),
            "--force".to_string(),
        ]
    }
}

#[async_trait]
impl Normalizer for FfmpegNormalizer {
    async fn normalize(&self, input: &Path, target_level: f64) -> anyhow::Result<PathBuf> {
        crate::utils::check_file_accessible(input)?;
        fs_err::create_dir_all(&self.output_dir)?;

        let output_path = self.output_path(input)?;
        tracing::debug!(
            "Normalizing {} -> {} at {} dB",
            input.display(),
            output_path.display(),
            target_level
        );

        let output = Command::new(&self.binary)
            .args(self.build_args(input, &output_path, target_level))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg-normalize failed: {}", error.trim());
        }

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_keeps_stem() {
        let normalizer = FfmpegNormalizer::new("ffmpeg-normalize", "normalized", AudioFormat::Mp3);
        let out = normalizer.output_path(Path::new("storage/66e985.mp3")).unwrap();
        assert_eq!(out, PathBuf::from("normalized/66e985.mp3"));
    }

    #[test]
    fn test_build_args() {
        let normalizer = FfmpegNormalizer::new("ffmpeg-normalize", "normalized", AudioFormat::Mp3);
        let args = normalizer.build_args(
            Path::new("storage/a.mp3"),
            Path::new("normalized/a.mp3"),
            DEFAULT_TARGET_LEVEL,
        );
        assert_eq!(args[0], "storage/a.mp3");
        assert!(args.contains(&"--target-level=-16".to_string()));
        assert!(args.contains(&"--normalization-type=rms".to_string()));
        assert!(args.contains(&"--audio-codec=libmp3lame".to_string()));
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_running() {
        let dir = tempfile::TempDir::new().unwrap();
        let normalizer = FfmpegNormalizer::new("ffmpeg-normalize", dir.path().join("out"), AudioFormat::Mp3);
        let result = normalizer.normalize(&dir.path().join("missing.mp3"), -16.0).await;
        assert!(result.is_err());
        assert!(!dir.path().join("out").exists());
    }
}
