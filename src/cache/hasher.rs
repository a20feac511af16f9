// src/cache/hasher.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use blake3::Hasher;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::cache::digest::{Digest, FileDigest};

const READ_BUF_SIZE: usize = 8192;

/// Memoizing content hasher shared by every task of a drain.
///
/// Each path maps to a single-resolution cell: the first caller streams the
/// file through BLAKE3, later or concurrent callers await the same result.
/// The map lock is only held to fetch the cell, never across a read.
#[derive(Debug)]
pub struct ContentHasher {
    root: PathBuf,
    memo: Mutex<HashMap<PathBuf, Arc<OnceCell<FileDigest>>>>,
}

impl ContentHasher {
    /// Paths passed to [`digest_of`](Self::digest_of) are resolved against
    /// `root`; the memo is keyed by the path as given.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Digest of the current contents of `path`, or `Absent` if it cannot be
    /// read.
    pub async fn digest_of(&self, path: &Path) -> FileDigest {
        let cell = {
            let mut memo = self.lock();
            Arc::clone(memo.entry(path.to_path_buf()).or_default())
        };

        *cell
            .get_or_init(|| async {
                let full = self.root.join(path);
                match hash_file(&full).await {
                    Ok(digest) => {
                        debug!(path = ?path, digest = %digest, "hashed file");
                        FileDigest::Present(digest)
                    }
                    Err(err) => {
                        debug!(path = ?path, error = %err, "file unreadable; using absent digest");
                        FileDigest::Absent
                    }
                }
            })
            .await
    }

    /// Forget the memoized digest for `path` (e.g. after a task rewrote it).
    pub fn invalidate(&self, path: &Path) {
        if self.lock().remove(path).is_some() {
            debug!(path = ?path, "invalidated memoized digest");
        }
    }

    /// Forget every memoized digest.
    pub fn reset(&self) {
        self.lock().clear();
    }

    /// Number of paths currently memoized (including in-flight ones).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<OnceCell<FileDigest>>>> {
        self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Stream a file through BLAKE3.
pub async fn hash_file(path: &Path) -> std::io::Result<Digest> {
    let mut file = File::open(path).await?;
    let mut hasher = Hasher::new();
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Digest::from(hasher.finalize()))
}
