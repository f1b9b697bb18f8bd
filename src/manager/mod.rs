//! Clip lifecycle orchestration.
//!
//! A clip moves `PENDING -> GENERATED -> UPLOADED -> PUBLISHED`. The stage is always
//! derived from the clip's fields; [`Transition`] lists which stages each operation may
//! start from. Fields are only written after the delegated tool succeeds, so a failed
//! operation leaves the clip where it was and can simply be run again.

use std::path::PathBuf;

use crate::catalog::{CatalogClient, CatalogDocument, NameMap};
use crate::clip::{Clip, ClipStatus};
use crate::config::Config;
use crate::extractors::{AudioFormat, MediaExtractor, YtDlpExtractor};
use crate::normalize::{FfmpegNormalizer, Normalizer, DEFAULT_TARGET_LEVEL};
use crate::storage::{ObjectStorage, S3Storage};
use crate::store::{gen_uid, ClipStore};
use crate::{ClipperError, Result};

/// Lifecycle operations that advance a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Download,
    Normalize,
    Upload,
    Publish,
}

impl Transition {
    /// Stages this operation may start from
    pub fn allowed_from(self) -> &'static [ClipStatus] {
        match self {
            Transition::Download => &[ClipStatus::Pending],
            Transition::Normalize => &[ClipStatus::Generated],
            Transition::Upload => &[ClipStatus::Generated],
            Transition::Publish => &[ClipStatus::Uploaded, ClipStatus::Published],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Transition::Download => "download",
            Transition::Normalize => "normalize",
            Transition::Upload => "upload",
            Transition::Publish => "publish",
        }
    }

    /// Fail with `Validation` unless `clip` is in a state this operation accepts
    pub fn check(self, clip: &Clip) -> Result<()> {
        let status = clip.status();
        if !self.allowed_from().contains(&status) {
            return Err(ClipperError::Validation(format!(
                "Cannot {} clip #{} while it is {}",
                self.name(),
                clip.uid,
                status
            )));
        }

        let missing = match self {
            Transition::Normalize if clip.download_path.is_none() => Some("download path"),
            Transition::Upload if clip.normalized_path.is_none() => Some("normalized path"),
            Transition::Publish if clip.file_url.is_none() => Some("file url"),
            _ => None,
        };
        if let Some(field) = missing {
            return Err(ClipperError::Validation(format!(
                "Cannot {} clip #{}: no {} yet",
                self.name(),
                clip.uid,
                field
            )));
        }

        Ok(())
    }
}

/// Owns the local store and the catalog client and drives clips through their lifecycle
pub struct ClipManager {
    store: ClipStore,
    catalog: CatalogClient,
    extractor: Box<dyn MediaExtractor>,
    normalizer: Box<dyn Normalizer>,
    storage: Box<dyn ObjectStorage>,
    target_level: f64,
    audio_format: AudioFormat,
    id_generator: Box<dyn FnMut() -> String + Send>,
}

impl ClipManager {
    pub fn new(
        store: ClipStore,
        catalog: CatalogClient,
        extractor: Box<dyn MediaExtractor>,
        normalizer: Box<dyn Normalizer>,
        storage: Box<dyn ObjectStorage>,
    ) -> Self {
        Self {
            store,
            catalog,
            extractor,
            normalizer,
            storage,
            target_level: DEFAULT_TARGET_LEVEL,
            audio_format: AudioFormat::default(),
            id_generator: Box::new(gen_uid),
        }
    }

    /// Wire up the real tools, the S3 bucket and the HTTP catalog from `config`
    ///
    /// The catalog is only contacted by commands that read or change it, so local
    /// commands work without a token.
    pub async fn from_config(config: &Config, token: Option<&str>) -> Result<Self> {
        let store = ClipStore::load(&config.app.clips_path)?;
        let catalog = CatalogClient::http(&config.catalog.url, token.unwrap_or_default())?;

        let extractor = YtDlpExtractor::new(
            config.app.yt_dlp_path.clone(),
            config.app.download_dir.clone(),
            config.app.audio_format,
        );
        let normalizer = FfmpegNormalizer::new(
            config.app.ffmpeg_normalize_path.clone(),
            config.app.normalized_dir.clone(),
            config.app.audio_format,
        );
        let storage = S3Storage::new(&config.storage).await;

        Ok(Self::new(
            store,
            catalog,
            Box::new(extractor),
            Box::new(normalizer),
            Box::new(storage),
        )
        .with_target_level(config.app.target_level)
        .with_audio_format(config.app.audio_format))
    }

    pub fn with_target_level(mut self, target_level: f64) -> Self {
        self.target_level = target_level;
        self
    }

    pub fn with_audio_format(mut self, audio_format: AudioFormat) -> Self {
        self.audio_format = audio_format;
        self
    }

    /// Replace the random uid source
    pub fn with_id_generator<F>(mut self, generator: F) -> Self
    where
        F: FnMut() -> String + Send + 'static,
    {
        self.id_generator = Box::new(generator);
        self
    }

    /// Create a pending clip under a fresh uid and persist it
    pub async fn new_clip(&mut self, url: &str, start: &str, end: Option<&str>) -> Result<String> {
        // validate the time range before drawing an id
        Clip::new("", url, start, end)?;

        let generator = &mut self.id_generator;
        let uid = self.store.fresh_uid(|| generator())?;
        let clip = Clip::new(uid.clone(), url, start, end)?;

        self.store.put(clip);
        self.store.save()?;

        tracing::info!("Created clip #{} for {} [{} - {}]", uid, url, start, end.unwrap_or("end"));
        Ok(uid)
    }

    /// Extract the clip's time range from its source
    pub async fn download(&mut self, uid: &str) -> Result<PathBuf> {
        let clip = self.store.get(uid)?.clone();
        Transition::Download.check(&clip)?;

        tracing::info!("Downloading clip #{} with {}", uid, self.extractor.platform_name());
        let path = self
            .extractor
            .extract(&clip.url, &clip.range(), &clip.uid)
            .await
            .map_err(ClipperError::ExternalTool)?;

        self.store.get_mut(uid)?.download_path = Some(path.clone());
        self.store.save()?;

        tracing::info!("Clip #{} downloaded to {}", uid, path.display());
        Ok(path)
    }

    /// Normalize the downloaded audio to the target loudness
    pub async fn normalize(&mut self, uid: &str) -> Result<PathBuf> {
        let clip = self.store.get(uid)?.clone();
        Transition::Normalize.check(&clip)?;
        let input = clip.download_path.unwrap_or_default();

        tracing::info!("Normalizing clip #{} to {} dB", uid, self.target_level);
        let path = self
            .normalizer
            .normalize(&input, self.target_level)
            .await
            .map_err(ClipperError::ExternalTool)?;

        self.store.get_mut(uid)?.normalized_path = Some(path.clone());
        self.store.save()?;

        Ok(path)
    }

    /// Upload the normalized audio, keyed by the clip's uid
    pub async fn upload(&mut self, uid: &str) -> Result<String> {
        let clip = self.store.get(uid)?.clone();
        Transition::Upload.check(&clip)?;
        let destination = clip.full_name(self.audio_format.as_str());
        let local = clip.normalized_path.unwrap_or_default();

        let file_url = self
            .storage
            .upload(&local, &destination)
            .await
            .map_err(|e| ClipperError::Remote(format!("{:#}", e)))?;

        self.store.get_mut(uid)?.file_url = Some(file_url.clone());
        self.store.save()?;

        tracing::info!("Clip #{} available at {}", uid, file_url);
        Ok(file_url)
    }

    /// Publish an uploaded clip to the catalog under `category`
    pub async fn publish(&mut self, uid: &str, category: &str, names: NameMap) -> Result<()> {
        let clip = self.store.get(uid)?.clone();
        Transition::Publish.check(&clip)?;

        self.catalog.fetch().await?;
        self.catalog.add_clip(&clip, category, names).await?;

        self.store.get_mut(uid)?.published = true;
        self.store.save()?;

        tracing::info!("Clip #{} published in {}", uid, category);
        Ok(())
    }

    /// Create a clip and run download, normalize and upload, stopping at the first failure
    pub async fn generate(&mut self, url: &str, start: &str, end: Option<&str>) -> Result<String> {
        let uid = self.new_clip(url, start, end).await?;

        if let Err(e) = self.advance(&uid).await {
            tracing::warn!("Clip #{} stopped at {}: {}", uid, self.status(&uid)?, e);
            return Err(e);
        }

        Ok(uid)
    }

    async fn advance(&mut self, uid: &str) -> Result<()> {
        self.download(uid).await?;
        self.normalize(uid).await?;
        self.upload(uid).await?;
        Ok(())
    }

    /// Add or rename a category in the catalog
    pub async fn add_category(&mut self, id: &str, names: NameMap) -> Result<()> {
        // start from the remote document so the upload does not drop other entries
        self.catalog.fetch().await?;
        self.catalog.add_category(id, names).await
    }

    /// Current remote catalog
    pub async fn catalog(&mut self) -> Result<&CatalogDocument> {
        self.catalog.fetch().await?;
        Ok(self.catalog.document())
    }

    pub fn info(&self, uid: &str) -> Result<&Clip> {
        self.store.get(uid)
    }

    pub fn status(&self, uid: &str) -> Result<ClipStatus> {
        Ok(self.store.get(uid)?.status())
    }

    /// All clips ordered by uid
    pub fn list(&self) -> Vec<&Clip> {
        self.store.clips().collect()
    }

    /// Persist local progress before the process exits
    pub fn shutdown(self) -> Result<()> {
        tracing::info!("Saving {} clips to {}", self.store.len(), self.store.path().display());
        self.store.save()
    }
}
