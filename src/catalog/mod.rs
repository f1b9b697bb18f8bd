use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod http;

pub use http::HttpCatalogBackend;

use crate::clip::Clip;
use crate::{ClipperError, Result};

/// Localized names keyed by locale, e.g. `{"en": "Scary Scream"}`
pub type NameMap = BTreeMap<String, String>;

/// The shared catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub categories: BTreeMap<String, NameMap>,

    #[serde(default)]
    pub clips: BTreeMap<String, PublishedClip>,

    /// Keys written by other tools, carried through unchanged
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Catalog entry for a published clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedClip {
    pub name: NameMap,
    pub category: String,
    pub url: String,
    /// Unix timestamp in seconds; other writers may store fractions
    pub publish_time: serde_json::Number,

    /// Per-entry keys written by other tools
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Transport for the whole catalog document.
///
/// The catalog has no partial updates: callers fetch the document, change it and
/// push it back. Two writers racing each other lose one side's changes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Check that the backend accepts our credentials
    async fn authorize(&self) -> Result<()>;

    /// Download the current document
    async fn fetch(&self) -> Result<CatalogDocument>;

    /// Replace the remote document
    async fn push(&self, document: &CatalogDocument) -> Result<()>;
}

/// Working copy of the catalog plus the backend it syncs with
pub struct CatalogClient {
    backend: Box<dyn CatalogBackend>,
    document: CatalogDocument,
    authorized: bool,
}

impl CatalogClient {
    /// Wrap `backend` without contacting it; the token is checked on first fetch or push
    pub fn new(backend: Box<dyn CatalogBackend>) -> Self {
        Self {
            backend,
            document: CatalogDocument::default(),
            authorized: false,
        }
    }

    /// Authorize against the backend right away; the working copy starts empty
    pub async fn connect(backend: Box<dyn CatalogBackend>) -> Result<Self> {
        let mut client = Self::new(backend);
        client.authorize().await?;
        Ok(client)
    }

    /// Lazily connected client for the HTTP catalog at `url`
    pub fn http(url: &str, token: &str) -> Result<Self> {
        let backend = HttpCatalogBackend::new(url, token)?;
        Ok(Self::new(Box::new(backend)))
    }

    async fn authorize(&mut self) -> Result<()> {
        if !self.authorized {
            self.backend.authorize().await?;
            self.authorized = true;
        }
        Ok(())
    }

    /// Replace the working copy with the remote document
    pub async fn fetch(&mut self) -> Result<()> {
        self.authorize().await?;
        self.document = self.backend.fetch().await?;
        tracing::debug!(
            "Fetched catalog: {} categories, {} clips",
            self.document.categories.len(),
            self.document.clips.len()
        );
        Ok(())
    }

    /// Upload the whole working copy
    pub async fn push(&mut self) -> Result<()> {
        self.authorize().await?;
        self.backend.push(&self.document).await
    }

    pub fn document(&self) -> &CatalogDocument {
        &self.document
    }

    pub fn has_category(&self, id: &str) -> bool {
        self.document.categories.contains_key(id)
    }

    /// Insert or rename a category, then upload
    pub async fn add_category(&mut self, id: &str, names: NameMap) -> Result<()> {
        let previous = self.document.categories.insert(id.to_string(), names);
        if let Err(e) = self.push().await {
            match previous {
                Some(previous) => self.document.categories.insert(id.to_string(), previous),
                None => self.document.categories.remove(id),
            };
            return Err(e);
        }
        tracing::info!("Category {} saved to catalog", id);
        Ok(())
    }

    /// Add a published clip entry, then upload.
    ///
    /// The category must already exist in the working copy, and the clip must have a
    /// public URL.
    pub async fn add_clip(&mut self, clip: &Clip, category: &str, names: NameMap) -> Result<()> {
        if !self.has_category(category) {
            return Err(ClipperError::Validation(format!(
                "Unable to find category `{}`, create it with `category add` first",
                category
            )));
        }
        let url = clip.file_url.clone().ok_or_else(|| {
            ClipperError::Validation(format!("Clip #{} has not been uploaded", clip.uid))
        })?;

        let entry = PublishedClip {
            name: names,
            category: category.to_string(),
            url,
            publish_time: chrono::Utc::now().timestamp().into(),
            extra: Default::default(),
        };

        let previous = self.document.clips.insert(clip.uid.clone(), entry);
        if let Err(e) = self.push().await {
            // keep the working copy in step with the remote document
            match previous {
                Some(previous) => self.document.clips.insert(clip.uid.clone(), previous),
                None => self.document.clips.remove(&clip.uid),
            };
            return Err(e);
        }

        Ok(())
    }
}
