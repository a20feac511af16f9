// src/cache/store.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join_all;
use tokio::fs;
use tracing::{debug, warn};

use crate::cache::digest::{Digest, path_digest};
use crate::errors::Result;

/// Default cache directory name, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".hashbuild";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Content-addressed store of task outputs.
///
/// Layout on disk:
///
/// `<dir>/<task digest hex>/<hex digest of the output path>`
///
/// Output paths are resolved against `root` when copying.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
    dir: PathBuf,
}

impl CacheStore {
    /// Open (and create if needed) the cache directory. A relative `dir` is
    /// taken relative to `root`.
    pub fn open(root: impl Into<PathBuf>, dir: impl AsRef<Path>) -> Result<Self> {
        let root = root.into();
        let dir = root.join(dir.as_ref());
        std::fs::create_dir_all(&dir)?;
        debug!(dir = ?dir, "opened cache directory");
        Ok(Self { root, dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Directory holding the outputs cached under `key`.
    pub fn entry_dir(&self, key: &Digest) -> PathBuf {
        self.dir.join(key.to_hex())
    }

    /// Location of the cached copy of `output` under `key`.
    pub fn cached_path(&self, key: &Digest, output: &Path) -> PathBuf {
        self.entry_dir(key).join(path_digest(output).to_hex())
    }

    /// Copy every cached output for `key` back into place.
    ///
    /// Returns, per output, whether a cached copy existed and was restored.
    pub async fn restore(&self, key: &Digest, outputs: &[PathBuf]) -> Vec<bool> {
        join_all(outputs.iter().map(|output| self.restore_one(key, output))).await
    }

    /// Copy every produced output into the entry for `key`.
    ///
    /// Returns, per output, whether the output existed to be saved.
    pub async fn save(&self, key: &Digest, outputs: &[PathBuf]) -> Vec<bool> {
        let entry = self.entry_dir(key);
        if let Err(err) = fs::create_dir_all(&entry).await {
            warn!(entry = ?entry, error = %err, "could not create cache entry");
            return join_all(outputs.iter().map(|output| self.produced(output))).await;
        }
        join_all(outputs.iter().map(|output| self.save_one(key, output))).await
    }

    async fn restore_one(&self, key: &Digest, output: &Path) -> bool {
        let cached = self.cached_path(key, output);
        if !fs::try_exists(&cached).await.unwrap_or(false) {
            return false;
        }

        let target = self.root.join(output);
        if let Some(parent) = target.parent() {
            if let Err(err) = fs::create_dir_all(parent).await {
                warn!(output = ?output, error = %err, "could not create output directory");
                return false;
            }
        }

        match fs::copy(&cached, &target).await {
            Ok(_) => {
                debug!(output = ?output, key = %key, "restored output from cache");
                true
            }
            Err(err) => {
                warn!(output = ?output, error = %err, "failed to restore cached output");
                false
            }
        }
    }

    async fn produced(&self, output: &Path) -> bool {
        fs::try_exists(self.root.join(output)).await.unwrap_or(false)
    }

    async fn save_one(&self, key: &Digest, output: &Path) -> bool {
        if !self.produced(output).await {
            return false;
        }

        let source = self.root.join(output);
        let cached = self.cached_path(key, output);
        match place_atomically(&source, &cached).await {
            Ok(()) => {
                debug!(output = ?output, key = %key, "saved output to cache");
                true
            }
            Err(err) => {
                // The output was produced; only caching it failed.
                warn!(output = ?output, error = %err, "failed to save output to cache");
                true
            }
        }
    }
}

/// Copy `source` next to `target` under a unique name, then rename it over
/// `target`, so a concurrent reader never sees a partial file.
async fn place_atomically(source: &Path, target: &Path) -> std::io::Result<()> {
    let tmp = target.with_extension(format!(
        "tmp-{}-{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    fs::copy(source, &tmp).await?;
    if let Err(err) = fs::rename(&tmp, target).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(err);
    }
    Ok(())
}
