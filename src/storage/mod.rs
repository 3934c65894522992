// src/storage/mod.rs
//! `.npy` persistence for capture and synthetic IMF tensors
//!
//! Layout:
//! - capture tensors at `{imf_root}/{subject}/{activity}/{index}.npy`
//! - synthetic tensors at `{synthetic_root}/{activity}/{subject}_{src}-{dst}.npy`

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use ndarray::Array3;
use ndarray_npy::{read_npy, write_npy};
use tracing::{debug, info, warn};

use crate::capture::{CaptureKey, SyntheticKey};
use crate::config::{constants::paths::TENSOR_EXTENSION, StorageSettings};
use crate::error::{CsiErrorBuilder, CsiResult};
use crate::processing::{CaptureImfTensor, SyntheticImfTensor};

/// Captures of one subject and activity, ordered by capture index
pub type CaptureGroups = BTreeMap<(String, String), Vec<CaptureKey>>;

/// Filesystem store for decomposed tensors
#[derive(Debug, Clone)]
pub struct TensorStore {
    imf_root: PathBuf,
    synthetic_root: PathBuf,
    verify_writes: bool,
}

impl TensorStore {
    pub fn new(imf_root: impl Into<PathBuf>, synthetic_root: impl Into<PathBuf>) -> Self {
        Self {
            imf_root: imf_root.into(),
            synthetic_root: synthetic_root.into(),
            verify_writes: true,
        }
    }

    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(&settings.imf_root, &settings.synthetic_root).with_verification(settings.verify_writes)
    }

    /// Reload each tensor after writing and check its shape
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify_writes = verify;
        self
    }

    pub fn imf_root(&self) -> &Path {
        &self.imf_root
    }

    pub fn synthetic_root(&self) -> &Path {
        &self.synthetic_root
    }

    pub fn capture_path(&self, key: &CaptureKey) -> PathBuf {
        self.imf_root
            .join(&key.subject)
            .join(&key.activity)
            .join(format!("{}.{}", key.index, TENSOR_EXTENSION))
    }

    pub fn synthetic_path(&self, key: &SyntheticKey) -> PathBuf {
        self.synthetic_root.join(&key.activity).join(format!(
            "{}_{}-{}.{}",
            key.subject, key.source_index, key.dest_index, TENSOR_EXTENSION
        ))
    }

    /// Write a capture tensor, replacing any earlier one with the same key
    pub fn save_capture(&self, tensor: &CaptureImfTensor) -> CsiResult<PathBuf> {
        let path = self.capture_path(&tensor.key);
        self.write_tensor(&path, &tensor.data)?;
        Ok(path)
    }

    /// Write a synthetic tensor, replacing any earlier one with the same key
    pub fn save_synthetic(&self, tensor: &SyntheticImfTensor) -> CsiResult<PathBuf> {
        let path = self.synthetic_path(&tensor.key);
        self.write_tensor(&path, &tensor.data)?;
        Ok(path)
    }

    pub fn load_capture(&self, key: &CaptureKey) -> CsiResult<CaptureImfTensor> {
        let data = load_tensor(&self.capture_path(key))?;
        Ok(CaptureImfTensor::new(key.clone(), data))
    }

    pub fn load_synthetic(&self, key: &SyntheticKey) -> CsiResult<SyntheticImfTensor> {
        let data = load_tensor(&self.synthetic_path(key))?;
        Ok(SyntheticImfTensor { key: key.clone(), data })
    }

    /// Every persisted capture, grouped by `(subject, activity)` and ordered by numeric
    /// index. Files whose stem is not an index are ignored.
    pub fn list_capture_groups(&self) -> CsiResult<CaptureGroups> {
        let mut groups = CaptureGroups::new();
        if !self.imf_root.is_dir() {
            return Ok(groups);
        }

        for subject_dir in sorted_dirs(&self.imf_root)? {
            let subject = file_name(&subject_dir);
            for activity_dir in sorted_dirs(&subject_dir)? {
                let activity = file_name(&activity_dir);
                let mut keys = Vec::new();

                for entry in read_dir(&activity_dir)? {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some(TENSOR_EXTENSION) {
                        continue;
                    }
                    match path.file_stem().and_then(|s| s.to_str()).map(str::parse::<usize>) {
                        Some(Ok(index)) => keys.push(CaptureKey::new(subject.clone(), activity.clone(), index)),
                        _ => warn!(path = %path.display(), "ignoring tensor without a numeric index"),
                    }
                }

                if !keys.is_empty() {
                    keys.sort_by_key(|k| k.index);
                    groups.insert((subject.clone(), activity), keys);
                }
            }
        }

        debug!(groups = groups.len(), root = %self.imf_root.display(), "listed capture groups");
        Ok(groups)
    }

    fn write_tensor(&self, path: &Path, data: &Array3<f64>) -> CsiResult<()> {
        let shown = path.display().to_string();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CsiErrorBuilder::new("tensor_store", "create_dir").io(&parent.display().to_string(), &e.to_string()))?;
        }

        write_npy(path, data)
            .map_err(|e| CsiErrorBuilder::new("tensor_store", "write").persistence(&shown, &e.to_string()))?;

        if self.verify_writes {
            let reloaded = load_tensor(path)?;
            if reloaded.dim() != data.dim() {
                return Err(CsiErrorBuilder::new("tensor_store", "verify").persistence(
                    &shown,
                    &format!("reloaded shape {:?} differs from written {:?}", reloaded.dim(), data.dim()),
                ));
            }
            let max = reloaded.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min = reloaded.iter().copied().fold(f64::INFINITY, f64::min);
            info!(path = %shown, shape = ?reloaded.dim(), max, min, "verified tensor");
        } else {
            debug!(path = %shown, shape = ?data.dim(), "wrote tensor");
        }
        Ok(())
    }
}

/// Read a 3-D f64 tensor
pub fn load_tensor(path: &Path) -> CsiResult<Array3<f64>> {
    read_npy::<_, Array3<f64>>(path).map_err(|e| {
        CsiErrorBuilder::new("tensor_store", "read").persistence(&path.display().to_string(), &e.to_string())
    })
}

fn read_dir(dir: &Path) -> CsiResult<Vec<fs::DirEntry>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| CsiErrorBuilder::new("tensor_store", "read_dir").io(&dir.display().to_string(), &e.to_string()))?;
    Ok(entries.filter_map(Result::ok).collect())
}

fn sorted_dirs(dir: &Path) -> CsiResult<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = read_dir(dir)?
        .into_iter()
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
