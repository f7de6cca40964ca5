//! Content fingerprints for de-duplicating coverage files that were copied
//! to several places under different names.

use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::model::FileWithContentHash;

/// SHA-256 over the whole file.
pub fn fingerprint(path: &Path) -> Result<FileWithContentHash> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&hasher.finalize());
    Ok(FileWithContentHash {
        path: path.to_path_buf(),
        hash,
    })
}

/// Keep one file per distinct content. Input order does not matter: paths are
/// sorted first and the first path of each fingerprint is kept. Files that
/// cannot be read are skipped.
pub fn dedupe(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut sorted = files.to_vec();
    sorted.sort();
    dedupe_in_order(&sorted)
}

/// Like [`dedupe`], but the first occurrence in `files` wins and the
/// surviving paths keep their relative order.
pub fn dedupe_in_order(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen: HashSet<FileWithContentHash> = HashSet::new();
    let mut kept: Vec<PathBuf> = Vec::new();
    for path in files {
        if kept.contains(path) {
            continue;
        }
        let entry = match fingerprint(path) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping coverage file {}: {}", path.display(), e);
                continue;
            }
        };
        if let Some(original) = seen.get(&entry) {
            debug!(
                "{} has the same content as {} ({}), ignoring it",
                path.display(),
                original.path.display(),
                entry.hex()
            );
            continue;
        }
        kept.push(path.clone());
        seen.insert(entry);
    }
    kept
}
