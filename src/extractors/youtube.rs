use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioFormat, MediaExtractor};
use crate::clip::TimeRange;

/// Extractor backed by yt-dlp, works for YouTube and every other site yt-dlp knows
pub struct YtDlpExtractor {
    yt_dlp_path: String,
    output_dir: PathBuf,
    format: AudioFormat,
}

impl YtDlpExtractor {
    pub fn new(yt_dlp_path: impl Into<String>, output_dir: impl Into<PathBuf>, format: AudioFormat) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            output_dir: output_dir.into(),
            format,
        }
    }

    /// Arguments for one yt-dlp run; the `%(ext)s` template resolves to `format`
    fn build_args(&self, url: &str, range: &TimeRange, output_template: &Path) -> Vec<String> {
        let mut postprocessor = String::from("ExtractAudio:");
        postprocessor.push_str(&range.ffmpeg_args().join(" "));

        vec![
            "--format".to_string(),
            "bestaudio".to_string(),
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            self.format.as_str().to_string(),
            "--audio-quality".to_string(),
            "192K".to_string(),
            "--postprocessor-args".to_string(),
            postprocessor,
            "--prefer-ffmpeg".to_string(),
            "--no-playlist".to_string(),
            "--force-overwrites".to_string(),
            "--output".to_string(),
            output_template.to_string_lossy().into_owned(),
            url.to_string(),
        ]
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract(&self, url: &str, range: &TimeRange, name: &str) -> anyhow::Result<PathBuf> {
        fs_err::create_dir_all(&self.output_dir)?;

        let template = self.output_dir.join(format!("{}.%(ext)s", name));
        let output_path = self.output_dir.join(format!("{}.{}", name, self.format.as_str()));

        tracing::debug!("Running yt-dlp for {} [{:?}]", url, range);

        let output = Command::new(&self.yt_dlp_path)
            .args(self.build_args(url, range, &template))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        crate::utils::check_file_accessible(&output_path)
            .context("yt-dlp finished but produced no audio file")?;

        Ok(output_path)
    }

    fn platform_name(&self) -> &'static str {
        "yt-dlp"
    }
}
