//! Local scan service: finds similar images with perceptual hashing.
//!
//! # Pipeline
//!
//! 1. Resolve the folder (as given, then relative to the working directory
//!    and its parent) and list the image files directly inside it, sorted by
//!    name.
//! 2. Compute a perceptual hash for every image in parallel. Images that
//!    cannot be decoded are skipped with a warning.
//! 3. Compare every pair of hashes and merge images whose similarity reaches
//!    the threshold (union-find).
//! 4. Split each merged group into chunks of at most `max_group_size` files.
//!    The first file of a chunk is its original; every other file becomes a
//!    pair against it.
//!
//! Similarity is the normalized Hamming agreement of two hashes, rescaled so
//! that unrelated images (which agree on about half their bits) score near 0:
//! `max(0, 1 - 2 * distance / bits)`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image_hasher::{HashAlg, HasherConfig, ImageHash};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use super::{candidate_paths, ScanService, ServiceError};
use crate::duplicates::DuplicatePair;

/// Default number of files per original before a group is split.
pub const DEFAULT_MAX_GROUP_SIZE: usize = 5;

/// Default image extensions considered by a scan.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Supported perceptual hashing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PerceptualAlgorithm {
    /// pHash (Perceptual Hash) - DCT-based, most resilient to transformations.
    #[default]
    Phash,
    /// dHash (Difference Hash) - Gradient-based, very fast and effective.
    Dhash,
    /// aHash (Average Hash) - Mean-based, fast but less resilient.
    Ahash,
}

impl std::fmt::Display for PerceptualAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phash => write!(f, "pHash"),
            Self::Dhash => write!(f, "dHash"),
            Self::Ahash => write!(f, "aHash"),
        }
    }
}

/// Errors that can occur during perceptual hashing.
#[derive(Debug, Error)]
pub enum PerceptualError {
    /// Failed to open or decode the image.
    #[error("Failed to load image {0}: {1}")]
    LoadError(String, #[source] image::ImageError),
}

/// Computes perceptual hashes for images.
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
    algorithm: PerceptualAlgorithm,
}

impl PerceptualHasher {
    /// Create a new `PerceptualHasher` with the given algorithm.
    pub fn new(algorithm: PerceptualAlgorithm) -> Self {
        let config = match algorithm {
            PerceptualAlgorithm::Phash => HasherConfig::new().hash_alg(HashAlg::Median).preproc_dct(),
            PerceptualAlgorithm::Dhash => HasherConfig::new().hash_alg(HashAlg::Gradient),
            PerceptualAlgorithm::Ahash => HasherConfig::new().hash_alg(HashAlg::Mean),
        };

        Self {
            hasher: config.to_hasher(),
            algorithm,
        }
    }

    /// Compute the perceptual hash for an image at the given path.
    pub fn compute_hash<P: AsRef<Path>>(&self, path: P) -> Result<ImageHash, PerceptualError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|e| PerceptualError::LoadError(path.display().to_string(), e))?;

        Ok(self.hasher.hash_image(&img))
    }

    /// Get the algorithm used by this hasher.
    pub fn algorithm(&self) -> PerceptualAlgorithm {
        self.algorithm
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new(PerceptualAlgorithm::Phash)
    }
}

/// Similarity of two perceptual hashes in `[0, 1]`.
#[must_use]
pub fn hash_similarity(a: &ImageHash, b: &ImageHash) -> f64 {
    let bits = (a.as_bytes().len() * 8).max(1) as f64;
    let distance = f64::from(a.dist(b));
    (1.0 - 2.0 * distance / bits).clamp(0.0, 1.0)
}

/// Settings for the local scan service.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Hashing algorithm.
    pub algorithm: PerceptualAlgorithm,
    /// Largest number of files sharing one original (must be at least 2).
    pub max_group_size: usize,
    /// Lowercase file extensions to consider.
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            algorithm: PerceptualAlgorithm::default(),
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl ScanConfig {
    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}

/// Minimal disjoint-set over indices with path compression.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut node = x;
        while self.parent[node] != root {
            let next = self.parent[node];
            self.parent[node] = root;
            node = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) {
        let (rx, ry) = (self.find(x), self.find(y));
        if rx != ry {
            self.parent[rx] = ry;
        }
    }
}

/// Locate `folder`, trying each candidate location in turn.
fn resolve_folder(folder: &Path) -> Result<PathBuf, ServiceError> {
    let candidates = candidate_paths(folder);
    for candidate in &candidates {
        log::trace!("Trying folder: {}", candidate.display());
        if candidate.is_dir() {
            log::debug!("Resolved folder {} -> {}", folder.display(), candidate.display());
            return Ok(candidate.clone());
        }
    }
    Err(ServiceError::Rejected(format!(
        "Could not find folder '{}'",
        folder.display()
    )))
}

/// Image files directly inside `folder`, sorted by path.
fn list_images(folder: &Path, config: &ScanConfig) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && config.accepts(entry.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Find similar image pairs in `folder` (blocking).
///
/// # Errors
///
/// Returns [`ServiceError::Rejected`] if the folder cannot be found or is
/// empty.
pub fn find_similar_pairs(
    folder: &Path,
    threshold: f64,
    config: &ScanConfig,
) -> Result<Vec<DuplicatePair>, ServiceError> {
    let root = resolve_folder(folder)?;

    let is_empty = fs::read_dir(&root)
        .map_err(|e| ServiceError::Rejected(format!("Cannot read folder '{}': {e}", root.display())))?
        .next()
        .is_none();
    if is_empty {
        return Err(ServiceError::Rejected(format!(
            "Folder '{}' is empty",
            root.display()
        )));
    }

    let files = list_images(&root, config);
    log::info!("Hashing {} image(s) in {}", files.len(), root.display());

    let algorithm = config.algorithm;
    let hashed: Vec<(PathBuf, ImageHash)> = files
        .par_iter()
        .map_init(
            || PerceptualHasher::new(algorithm),
            |hasher, path| match hasher.compute_hash(path) {
                Ok(hash) => Some((path.clone(), hash)),
                Err(e) => {
                    log::warn!("Skipping image: {}", e);
                    None
                }
            },
        )
        .flatten()
        .collect();

    let n = hashed.len();
    let edges: Vec<(usize, usize)> = (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            let hashed = &hashed;
            ((i + 1)..n).filter_map(move |j| {
                let score = hash_similarity(&hashed[i].1, &hashed[j].1);
                log::trace!(
                    "Comparing {} vs {}: {:.2}",
                    hashed[i].0.display(),
                    hashed[j].0.display(),
                    score
                );
                (score >= threshold).then_some((i, j))
            })
        })
        .collect();

    let mut sets = UnionFind::new(n);
    for (i, j) in edges {
        sets.union(i, j);
    }

    // Groups keep the order of their first member; members stay sorted.
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    for index in 0..n {
        let root = sets.find(index);
        let slot = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(index);
    }

    let chunk_size = config.max_group_size.max(2);
    let mut pairs = Vec::new();
    for members in groups.iter().filter(|members| members.len() > 1) {
        for chunk in members.chunks(chunk_size) {
            let Some((&first, rest)) = chunk.split_first() else {
                continue;
            };
            for &other in rest {
                pairs.push(DuplicatePair::new(
                    hashed[first].0.clone(),
                    hashed[other].0.clone(),
                    hash_similarity(&hashed[first].1, &hashed[other].1),
                ));
            }
        }
    }

    log::info!(
        "Scan of {} found {} similar pair(s) at threshold {:.2}",
        root.display(),
        pairs.len(),
        threshold
    );

    Ok(pairs)
}

/// [`ScanService`] that hashes images on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalScanService {
    config: ScanConfig,
}

impl LocalScanService {
    /// Create a service with the given settings.
    #[must_use]
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ScanService for LocalScanService {
    async fn scan(&self, folder: &Path, threshold: f64) -> Result<Vec<DuplicatePair>, ServiceError> {
        let folder = folder.to_path_buf();
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || find_similar_pairs(&folder, threshold, &config))
            .await
            .map_err(|e| ServiceError::Unavailable(format!("scan worker failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_perceptual_algorithms_display() {
        assert_eq!(PerceptualAlgorithm::Phash.to_string(), "pHash");
        assert_eq!(PerceptualAlgorithm::Dhash.to_string(), "dHash");
        assert_eq!(PerceptualAlgorithm::Ahash.to_string(), "aHash");
    }

    #[test]
    fn test_perceptual_hasher_new() {
        let hasher = PerceptualHasher::new(PerceptualAlgorithm::Dhash);
        assert_eq!(hasher.algorithm(), PerceptualAlgorithm::Dhash);
        assert_eq!(PerceptualHasher::default().algorithm(), PerceptualAlgorithm::Phash);
    }

    #[test]
    fn test_invalid_image() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("invalid.png");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not an image").unwrap();

        let hasher = PerceptualHasher::default();
        assert!(hasher.compute_hash(&file_path).is_err());
    }

    #[test]
    fn test_hash_similarity_bounds() {
        let h1 = ImageHash::<Box<[u8]>>::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let h2 = ImageHash::<Box<[u8]>>::from_bytes(&[0, 0, 0, 0, 0, 0, 0, 1]).unwrap();
        let h3 = ImageHash::<Box<[u8]>>::from_bytes(&[255; 8]).unwrap();

        assert_eq!(hash_similarity(&h1, &h1), 1.0);
        assert!((hash_similarity(&h1, &h2) - (1.0 - 2.0 / 64.0)).abs() < 1e-9);
        assert_eq!(hash_similarity(&h1, &h3), 0.0);
    }

    #[test]
    fn test_union_find() {
        let mut sets = UnionFind::new(4);
        sets.union(0, 1);
        sets.union(2, 1);
        assert_eq!(sets.find(0), sets.find(2));
        assert_ne!(sets.find(0), sets.find(3));
    }

    #[test]
    fn test_config_accepts_extensions_case_insensitively() {
        let config = ScanConfig::default();
        assert!(config.accepts(Path::new("a.JPG")));
        assert!(config.accepts(Path::new("b.png")));
        assert!(!config.accepts(Path::new("c.gif")));
        assert!(!config.accepts(Path::new("noext")));
    }

    #[test]
    fn test_missing_folder_rejected() {
        let result = find_similar_pairs(
            Path::new("/definitely/not/a/folder/xyz"),
            0.5,
            &ScanConfig::default(),
        );
        assert_eq!(
            result,
            Err(ServiceError::Rejected(
                "Could not find folder '/definitely/not/a/folder/xyz'".to_string()
            ))
        );
    }

    #[test]
    fn test_empty_folder_rejected() {
        let dir = tempdir().unwrap();
        let result = find_similar_pairs(dir.path(), 0.5, &ScanConfig::default());
        match result {
            Err(ServiceError::Rejected(message)) => assert!(message.ends_with("is empty")),
            other => panic!("Expected empty-folder rejection, got {other:?}"),
        }
    }
}
