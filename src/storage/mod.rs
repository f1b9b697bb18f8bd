use async_trait::async_trait;
use std::path::Path;

pub mod s3;

pub use s3::S3Storage;

/// Object storage that serves uploaded clips publicly
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload `local_path` as `destination` and return its public URL
    async fn upload(&self, local_path: &Path, destination: &str) -> anyhow::Result<String>;
}

/// Join a public base URL, an optional key prefix and an object name
pub fn public_url(base: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base.trim_end_matches('/'), encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("https://f002.backblazeb2.com/file/RushiaBtn/", "66e985.mp3"),
            "https://f002.backblazeb2.com/file/RushiaBtn/66e985.mp3"
        );
        assert_eq!(
            public_url("https://cdn.example", "clips/a b.mp3"),
            "https://cdn.example/clips/a%20b.mp3"
        );
    }
}
