// src/pipeline/corpus.rs
//! Raw corpus discovery: `{raw_root}/{activity}/{subject}/{file}`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::capture::CaptureKey;
use crate::error::{CsiErrorBuilder, CsiResult};

/// Capture files by activity, then subject, each list sorted by file name
pub type CorpusIndex = BTreeMap<String, BTreeMap<String, Vec<PathBuf>>>;

/// One raw capture file and the key it will be stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusEntry {
    pub key: CaptureKey,
    pub path: PathBuf,
}

/// Walk `raw_root`. Empty allow-lists admit everything.
pub fn discover(raw_root: &Path, activities: &[String], subjects: &[String]) -> CsiResult<CorpusIndex> {
    let mut index = CorpusIndex::new();

    for activity_dir in subdirectories(raw_root)? {
        let activity = dir_name(&activity_dir);
        if !activities.is_empty() && !activities.contains(&activity) {
            continue;
        }

        let mut by_subject = BTreeMap::new();
        for subject_dir in subdirectories(&activity_dir)? {
            let subject = dir_name(&subject_dir);
            if !subjects.is_empty() && !subjects.contains(&subject) {
                continue;
            }

            let mut files: Vec<PathBuf> = entries(&subject_dir)?.into_iter().filter(|p| p.is_file()).collect();
            files.sort();
            debug!(%activity, %subject, files = files.len(), "discovered captures");
            by_subject.insert(subject, files);
        }
        index.insert(activity, by_subject);
    }

    Ok(index)
}

/// Flatten an index into entries; a capture's index is its position in the sorted file list
pub fn entries_of(index: &CorpusIndex) -> Vec<CorpusEntry> {
    index
        .iter()
        .flat_map(|(activity, subjects)| {
            subjects.iter().flat_map(move |(subject, files)| {
                files.iter().enumerate().map(move |(i, path)| CorpusEntry {
                    key: CaptureKey::new(subject.clone(), activity.clone(), i),
                    path: path.clone(),
                })
            })
        })
        .collect()
}

fn entries(dir: &Path) -> CsiResult<Vec<PathBuf>> {
    let read = std::fs::read_dir(dir)
        .map_err(|e| CsiErrorBuilder::new("corpus", "read_dir").io(&dir.display().to_string(), &e.to_string()))?;
    Ok(read.filter_map(Result::ok).map(|e| e.path()).collect())
}

fn subdirectories(dir: &Path) -> CsiResult<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = entries(dir)?.into_iter().filter(|p| p.is_dir()).collect();
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
