//! Artifact storage layout.
//!
//! Three parallel directories under one public root:
//!
//! ```text
//! public/
//! └── uploads/
//!     ├── 20250301142233_9f2c4a1b7e0d.jpg    # main image
//!     ├── thumbs/
//!     │   └── 20250301142233_9f2c4a1b7e0d.jpg  # thumbnail, same name
//!     └── webp/
//!         └── 20250301142233_9f2c4a1b7e0d.webp # WebP variant, same stem
//! ```
//!
//! Paths handed to the artwork store are *relative* to the root and always
//! use `/`, so they can be dropped straight into `src` attributes. Filenames
//! are generated here and never derived from the client-supplied name.

use crate::config::StorageConfig;
use crate::imaging::OutputFormat;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Random bytes in a generated filename (hex-encoded to twice as many chars).
const RANDOM_BYTES: usize = 6;
/// Attempts before giving up on finding an unused filename.
const MAX_ALLOCATION_ATTEMPTS: usize = 8;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("path {0:?} is not inside the public root")]
    OutsideRoot(String),
    #[error("could not allocate a unique filename in {0}")]
    Exhausted(String),
}

/// Relative paths for one artifact set, before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub original: String,
    pub thumbnail: String,
    pub webp: String,
}

#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    originals: String,
    thumbnails: String,
    webp: String,
}

impl StorageLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        originals: &str,
        thumbnails: &str,
        webp: &str,
    ) -> Self {
        Self {
            root: root.into(),
            originals: trim_dir(originals),
            thumbnails: trim_dir(thumbnails),
            webp: trim_dir(webp),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(
            &config.root,
            &config.originals,
            &config.thumbnails,
            &config.webp,
        )
    }

    /// Same layout, different public root.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directories in creation order: originals, thumbnails, webp.
    pub fn directories(&self) -> [PathBuf; 3] {
        [
            self.root.join(&self.originals),
            self.root.join(&self.thumbnails),
            self.root.join(&self.webp),
        ]
    }

    /// Create the artifact directories if they are missing.
    ///
    /// Idempotent; the WebP directory is only created when it will be used.
    /// On failure returns the directory that could not be created.
    pub fn ensure_directories(&self, include_webp: bool) -> Result<(), (PathBuf, io::Error)> {
        let [originals, thumbnails, webp] = self.directories();
        let mut wanted = vec![originals, thumbnails];
        if include_webp {
            wanted.push(webp);
        }
        for dir in wanted {
            if dir.is_dir() {
                continue;
            }
            fs::create_dir_all(&dir).map_err(|e| (dir.clone(), e))?;
            debug!(dir = %dir.display(), "created directory");
        }
        Ok(())
    }

    /// Pick a fresh `YYYYmmddHHMMSS_<hex>.<ext>` name not yet used by a
    /// main image, and derive the thumbnail and WebP paths from it.
    pub fn allocate(&self, format: OutputFormat) -> Result<ArtifactNames, StorageError> {
        for _ in 0..MAX_ALLOCATION_ATTEMPTS {
            let stem = generate_stem();
            let names = self.names_for(&stem, format);
            let taken = [&names.original, &names.thumbnail, &names.webp]
                .iter()
                .any(|rel| self.root.join(rel).exists());
            if !taken {
                return Ok(names);
            }
            debug!(stem, "generated filename already taken, retrying");
        }
        Err(StorageError::Exhausted(self.originals.clone()))
    }

    fn names_for(&self, stem: &str, format: OutputFormat) -> ArtifactNames {
        let file_name = format!("{stem}.{}", format.extension());
        ArtifactNames {
            original: format!("{}/{file_name}", self.originals),
            thumbnail: format!("{}/{file_name}", self.thumbnails),
            webp: format!("{}/{stem}.{}", self.webp, OutputFormat::WebP.extension()),
        }
    }

    /// Map a stored relative path to a filesystem path under the root.
    ///
    /// Absolute paths and anything containing `..` are refused, so a
    /// tampered database row can never point a delete outside the root.
    pub fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative);
        let inside = !relative.is_empty()
            && path
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !inside {
            return Err(StorageError::OutsideRoot(relative.to_string()));
        }
        Ok(self.root.join(path))
    }

    /// Delete up to three artifacts. Missing files are fine.
    ///
    /// Returns `false` if any file that exists could not be removed, or if a
    /// path points outside the root. Every path is attempted regardless.
    pub fn delete_artifacts(&self, original: &str, thumbnail: &str, webp: Option<&str>) -> bool {
        let mut ok = true;
        for relative in [Some(original), Some(thumbnail), webp].into_iter().flatten() {
            if relative.is_empty() {
                continue;
            }
            let path = match self.resolve(relative) {
                Ok(path) => path,
                Err(e) => {
                    warn!(error = %e, "refusing to delete artifact");
                    ok = false;
                    continue;
                }
            };
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "deleted artifact"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to delete artifact");
                    ok = false;
                }
            }
        }
        ok
    }
}

/// Write `bytes` to a file that must not already exist.
pub fn write_new(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn generate_stem() -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d%H%M%S");
    let suffix: [u8; RANDOM_BYTES] = rand::random();
    format!("{timestamp}_{}", hex::encode(suffix))
}

fn trim_dir(dir: &str) -> String {
    dir.trim_matches('/').to_string()
}
