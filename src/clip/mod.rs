use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::{ClipperError, Result};

/// Default start offset when none is given
pub const DEFAULT_START: &str = "0:0:0";

/// One requested audio excerpt and its progress through the lifecycle.
///
/// `url`, `start` and `end` are fixed at creation. The remaining fields are filled in
/// strictly in lifecycle order by the manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    /// Source URL of the video
    pub url: String,

    /// Start of the excerpt (`h:mm:ss`)
    pub start: String,

    /// End of the excerpt, `None` means until the end of the source
    #[serde(default)]
    pub end: Option<String>,

    /// Short identifier, unique within the local store
    pub uid: String,

    /// Local path of the extracted audio
    #[serde(default)]
    pub download_path: Option<PathBuf>,

    /// Local path of the loudness-normalized audio
    #[serde(default)]
    pub normalized_path: Option<PathBuf>,

    /// Public URL returned by object storage
    #[serde(default)]
    pub file_url: Option<String>,

    /// Whether the clip has been published to the catalog
    #[serde(default)]
    pub published: bool,
}

/// Lifecycle stage of a clip, derived from which fields are set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClipStatus {
    Pending,
    Generated,
    Uploaded,
    Published,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::Pending => "PENDING",
            ClipStatus::Generated => "GENERATED",
            ClipStatus::Uploaded => "UPLOADED",
            ClipStatus::Published => "PUBLISHED",
        }
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time range of a clip, in the form the extraction tools take it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: Option<String>,
}

impl TimeRange {
    /// ffmpeg seek arguments, `-ss start [-to end]`
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec!["-ss".to_string(), self.start.clone()];
        if let Some(end) = &self.end {
            args.push("-to".to_string());
            args.push(end.clone());
        }
        args
    }
}

impl Clip {
    /// Create a pending clip, validating both time bounds
    pub fn new(uid: impl Into<String>, url: impl Into<String>, start: &str, end: Option<&str>) -> Result<Self> {
        if !is_valid_time(start) {
            return Err(ClipperError::Validation(format!(
                "Invalid start time `{}` (expected `h[h]:m[m]:s[s]`)",
                start
            )));
        }
        if let Some(end) = end {
            if !is_valid_time(end) {
                return Err(ClipperError::Validation(format!(
                    "Invalid end time `{}` (expected `h[h]:m[m]:s[s]`)",
                    end
                )));
            }
        }

        Ok(Self {
            url: url.into(),
            start: start.to_string(),
            end: end.map(str::to_string),
            uid: uid.into(),
            download_path: None,
            normalized_path: None,
            file_url: None,
            published: false,
        })
    }

    /// Current lifecycle stage
    pub fn status(&self) -> ClipStatus {
        if self.published {
            ClipStatus::Published
        } else if self.file_url.is_some() {
            ClipStatus::Uploaded
        } else if self.normalized_path.is_some() || self.download_path.is_some() {
            ClipStatus::Generated
        } else {
            ClipStatus::Pending
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start.clone(),
            end: self.end.clone(),
        }
    }

    /// Object name used for storage, e.g. `1a2b3c.mp3`
    pub fn full_name(&self, extension: &str) -> String {
        format!("{}.{}", self.uid, extension)
    }

    /// Check that the progress fields were filled in lifecycle order.
    ///
    /// Records loaded from disk may have been edited by hand, so the store runs this
    /// on every loaded clip.
    pub fn check_consistency(&self) -> Result<()> {
        let times_valid = is_valid_time(&self.start) && self.end.as_deref().map_or(true, is_valid_time);
        if !times_valid {
            return Err(ClipperError::Storage(format!("clip #{} has a malformed time range", self.uid)));
        }
        if self.normalized_path.is_some() && self.download_path.is_none() {
            return Err(ClipperError::Storage(format!(
                "clip #{} has a normalized path but no download path",
                self.uid
            )));
        }
        if self.file_url.is_some() && self.normalized_path.is_none() {
            return Err(ClipperError::Storage(format!(
                "clip #{} has a file url but no normalized path",
                self.uid
            )));
        }
        if self.published && self.file_url.is_none() {
            return Err(ClipperError::Storage(format!(
                "clip #{} is published but has no file url",
                self.uid
            )));
        }
        Ok(())
    }
}

/// Validate a `h[h]:m[m]:s[s]` timestamp.
///
/// Hours may be empty or any number of digits; minutes and seconds are one or two
/// digits in `0..=59`.
pub fn is_valid_time(value: &str) -> bool {
    let parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 3 {
        return false;
    }

    let hours = parts[0];
    if !hours.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    parts[1..].iter().all(|part| is_sexagesimal(part))
}

fn is_sexagesimal(part: &str) -> bool {
    if part.is_empty() || part.len() > 2 || !part.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    part.parse::<u8>().map(|v| v <= 59).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Clip {
        Clip::new("abc123", "https://example.com/v", "0:01:00", Some("0:01:30")).unwrap()
    }

    #[test]
    fn test_valid_times() {
        for t in ["0:0:0", "0:01:00", "00:13:48", "12:59:59", ":5:9", "100:00:00", "1:7:05"] {
            assert!(is_valid_time(t), "{} should be valid", t);
        }
    }

    #[test]
    fn test_invalid_times() {
        for t in ["1:60:00", "1:00:60", "abc", "", "1:00", "1:00:00:00", "a:00:00", "1:000:00", "1::00", "-1:00:00", "1:00:5a"] {
            assert!(!is_valid_time(t), "{} should be invalid", t);
        }
    }

    #[test]
    fn test_new_rejects_bad_start_and_end() {
        let err = Clip::new("x", "https://example.com/v", "1:60:00", None).unwrap_err();
        assert!(matches!(err, ClipperError::Validation(_)));

        let err = Clip::new("x", "https://example.com/v", "0:00:00", Some("abc")).unwrap_err();
        assert!(matches!(err, ClipperError::Validation(_)));
    }

    #[test]
    fn test_open_ended_clip() {
        let clip = Clip::new("x", "https://example.com/v", DEFAULT_START, None).unwrap();
        assert_eq!(clip.end, None);
        assert_eq!(clip.status(), ClipStatus::Pending);
    }

    #[test]
    fn test_status_follows_fields() {
        let mut clip = sample();
        assert_eq!(clip.status(), ClipStatus::Pending);

        clip.download_path = Some("storage/abc123.mp3".into());
        assert_eq!(clip.status(), ClipStatus::Generated);

        clip.normalized_path = Some("normalized/abc123.mp3".into());
        assert_eq!(clip.status(), ClipStatus::Generated);

        clip.file_url = Some("https://cdn.example/abc123.mp3".into());
        assert_eq!(clip.status(), ClipStatus::Uploaded);

        clip.published = true;
        assert_eq!(clip.status(), ClipStatus::Published);
        assert!(clip.check_consistency().is_ok());
    }

    #[test]
    fn test_consistency_rejects_out_of_order_fields() {
        let mut clip = sample();
        clip.published = true;
        assert!(matches!(clip.check_consistency(), Err(ClipperError::Storage(_))));

        let mut clip = sample();
        clip.file_url = Some("https://cdn.example/x.mp3".into());
        assert!(clip.check_consistency().is_err());
    }

    #[test]
    fn test_json_shape_uses_null_for_missing_fields() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["uid"], "abc123");
        assert_eq!(value["end"], "0:01:30");
        assert!(value["download_path"].is_null());
        assert!(value["file_url"].is_null());
        assert_eq!(value["published"], false);
    }

    #[test]
    fn test_range_ffmpeg_args() {
        assert_eq!(sample().range().ffmpeg_args(), vec!["-ss", "0:01:00", "-to", "0:01:30"]);

        let open = Clip::new("x", "https://example.com/v", "0:00:05", None).unwrap();
        assert_eq!(open.range().ffmpeg_args(), vec!["-ss", "0:00:05"]);
    }

    #[test]
    fn test_full_name() {
        assert_eq!(sample().full_name("mp3"), "abc123.mp3");
    }
}
