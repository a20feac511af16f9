// src/cache/digest.rs

use std::fmt;
use std::path::Path;

use blake3::Hasher;

use crate::errors::{Error, Result};
use crate::task::TaskDescriptor;

/// Prefix fed into every task digest; bump it when the layout below changes.
const TASK_DIGEST_DOMAIN: &[u8] = b"hashbuild/task/v1";

/// Fixed-size BLAKE3 fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(blake3::Hash);

impl Digest {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Lowercase hex encoding, used for cache directory and file names.
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }
}

impl From<blake3::Hash> for Digest {
    fn from(hash: blake3::Hash) -> Self {
        Self(hash)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Digest of a file's current contents.
///
/// `Absent` stands in for any file that could not be read, so a missing
/// input changes the task digest instead of failing the hashing phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileDigest {
    Present(Digest),
    Absent,
}

impl FileDigest {
    pub fn is_absent(&self) -> bool {
        matches!(self, FileDigest::Absent)
    }
}

/// Digest of an output *path* (not its content); names the cached copy of
/// that output inside a cache entry.
pub fn path_digest(path: &Path) -> Digest {
    Digest::of_bytes(path.as_os_str().as_encoded_bytes())
}

/// Compute the cache key for `task` given the digests of its reads.
///
/// Covers, in order: the task name, the serialized options, the serialized
/// plugin list, then each read path with its content digest. `inputs` must
/// line up with `task.reads()`.
pub fn task_digest(task: &TaskDescriptor, inputs: &[FileDigest]) -> Result<Digest> {
    debug_assert_eq!(task.reads().len(), inputs.len());

    let mut hasher = Hasher::new();
    hasher.update(TASK_DIGEST_DOMAIN);

    update_field(&mut hasher, task.name().as_bytes());

    let options = serde_json::to_vec(task.options()).map_err(Error::from)?;
    update_field(&mut hasher, &options);

    let plugins = serde_json::to_vec(task.plugins()).map_err(Error::from)?;
    update_field(&mut hasher, &plugins);

    for (path, digest) in task.reads().iter().zip(inputs) {
        update_field(&mut hasher, path.as_os_str().as_encoded_bytes());
        match digest {
            FileDigest::Present(d) => {
                hasher.update(&[1]);
                hasher.update(d.as_bytes());
            }
            FileDigest::Absent => {
                hasher.update(&[0]);
            }
        }
    }

    Ok(Digest::from(hasher.finalize()))
}

// Length-prefixed so that ("ab", "c") and ("a", "bc") hash differently.
fn update_field(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
