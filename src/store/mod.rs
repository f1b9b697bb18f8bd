use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::clip::Clip;
use crate::{ClipperError, Result};

/// Length of generated clip identifiers
pub const UID_LEN: usize = 6;

/// How many identifiers to draw before giving up on a free one
pub const MAX_UID_ATTEMPTS: usize = 32;

/// Durable `uid -> Clip` mapping backed by a single JSON document.
///
/// Mutations live in memory until [`ClipStore::save`] rewrites the whole document.
#[derive(Debug)]
pub struct ClipStore {
    path: PathBuf,
    clips: BTreeMap<String, Clip>,
}

impl ClipStore {
    /// Load the store from `path`, creating an empty document if it does not exist.
    ///
    /// A document that cannot be parsed is an error; it is never replaced.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            tracing::info!("Creating empty clip store at {}", path.display());
            let store = Self {
                path,
                clips: BTreeMap::new(),
            };
            store.save()?;
            return Ok(store);
        }

        let content = fs_err::read_to_string(&path)
            .map_err(|e| ClipperError::Storage(format!("Failed to read {}: {}", path.display(), e)))?;

        let clips: BTreeMap<String, Clip> = if content.trim().is_empty() {
            BTreeMap::new()
        } else {
            serde_json::from_str(&content)
                .map_err(|e| ClipperError::Storage(format!("Malformed clip store {}: {}", path.display(), e)))?
        };

        for (key, clip) in &clips {
            if key != &clip.uid {
                return Err(ClipperError::Storage(format!(
                    "Entry `{}` holds clip #{} in {}",
                    key,
                    clip.uid,
                    path.display()
                )));
            }
            clip.check_consistency()?;
        }

        tracing::debug!("Loaded {} clips from {}", clips.len(), path.display());
        Ok(Self { path, clips })
    }

    /// Location of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, uid: &str) -> Result<&Clip> {
        self.clips
            .get(uid)
            .ok_or_else(|| ClipperError::NotFound(uid.to_string()))
    }

    pub fn get_mut(&mut self, uid: &str) -> Result<&mut Clip> {
        self.clips
            .get_mut(uid)
            .ok_or_else(|| ClipperError::NotFound(uid.to_string()))
    }

    /// Insert or replace a clip by its uid
    pub fn put(&mut self, clip: Clip) {
        self.clips.insert(clip.uid.clone(), clip);
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.clips.contains_key(uid)
    }

    /// All clips, ordered by uid
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.clips.values()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Draw identifiers from `generate` until one is not taken.
    pub fn fresh_uid<F>(&self, mut generate: F) -> Result<String>
    where
        F: FnMut() -> String,
    {
        for attempt in 1..=MAX_UID_ATTEMPTS {
            let uid = generate();
            if !self.contains(&uid) {
                return Ok(uid);
            }
            tracing::warn!("Clip id {} already taken (attempt {})", uid, attempt);
        }

        Err(ClipperError::Validation(format!(
            "Could not find a free clip id after {} attempts",
            MAX_UID_ATTEMPTS
        )))
    }

    /// Serialize every clip and atomically replace the backing document
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs_err::create_dir_all(&dir)?;

        let content = serde_json::to_vec_pretty(&self.clips)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| ClipperError::Storage(format!("Failed to replace {}: {}", self.path.display(), e)))?;

        tracing::debug!("Saved {} clips to {}", self.clips.len(), self.path.display());
        Ok(())
    }
}

/// Generate a short random clip identifier
pub fn gen_uid() -> String {
    Uuid::new_v4().simple().to_string()[..UID_LEN].to_string()
}
