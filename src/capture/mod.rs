// src/capture/mod.rs
//! Raw CSI captures and the keys that identify them

pub mod reader;

pub use reader::CaptureReader;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One pre-recorded CSI capture.
///
/// `samples` has one row per sample and `2·S` columns alternating imaginary and real
/// parts per subcarrier. The reader never produces an odd column count, but captures
/// built by hand may; the amplitude extractor rejects them.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCapture {
    pub samples: Array2<f64>,
    pub sampling_rate_hz: f64,
    /// Where the capture came from, used in error messages
    pub origin: String,
}

impl RawCapture {
    pub fn new(samples: Array2<f64>, sampling_rate_hz: f64, origin: impl Into<String>) -> Self {
        Self {
            samples,
            sampling_rate_hz,
            origin: origin.into(),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.nrows()
    }

    pub fn component_count(&self) -> usize {
        self.samples.ncols()
    }

    /// Capture duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sampling_rate_hz > 0.0 {
            self.sample_count() as f64 / self.sampling_rate_hz
        } else {
            0.0
        }
    }
}

/// Identity of a real capture: subject, activity and zero-based position in the
/// subject's sorted file list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaptureKey {
    pub subject: String,
    pub activity: String,
    pub index: usize,
}

impl CaptureKey {
    pub fn new(subject: impl Into<String>, activity: impl Into<String>, index: usize) -> Self {
        Self {
            subject: subject.into(),
            activity: activity.into(),
            index,
        }
    }

    /// Stable textual identity, `"{subject}/{activity}/{index}"`
    pub fn identity(&self) -> String {
        format!("{}/{}/{}", self.subject, self.activity, self.index)
    }
}

impl fmt::Display for CaptureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

/// Identity of a synthetic capture built from two captures of one subject and activity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SyntheticKey {
    pub activity: String,
    pub subject: String,
    pub source_index: usize,
    pub dest_index: usize,
}

impl SyntheticKey {
    pub fn new(activity: impl Into<String>, subject: impl Into<String>, source_index: usize, dest_index: usize) -> Self {
        Self {
            activity: activity.into(),
            subject: subject.into(),
            source_index,
            dest_index,
        }
    }

    /// Key for the pair `(source, dest)`; both must share subject and activity
    pub fn for_pair(source: &CaptureKey, dest: &CaptureKey) -> Self {
        Self::new(source.activity.clone(), source.subject.clone(), source.index, dest.index)
    }
}

impl fmt::Display for SyntheticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}_{}-{}",
            self.activity, self.subject, self.source_index, self.dest_index
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_capture_dimensions() {
        let capture = RawCapture::new(Array2::zeros((100, 128)), 50.0, "mem");
        assert_eq!(capture.sample_count(), 100);
        assert_eq!(capture.component_count(), 128);
        assert_eq!(capture.duration_secs(), 2.0);
    }

    #[test]
    fn test_capture_key_identity() {
        let key = CaptureKey::new("S03", "WA", 4);
        assert_eq!(key.identity(), "S03/WA/4");
        assert_eq!(key.to_string(), "S03/WA/4");
    }

    #[test]
    fn test_synthetic_key_for_pair() {
        let a = CaptureKey::new("S01", "FA", 0);
        let b = CaptureKey::new("S01", "FA", 3);
        let key = SyntheticKey::for_pair(&a, &b);
        assert_eq!(key, SyntheticKey::new("FA", "S01", 0, 3));
        assert_eq!(key.to_string(), "FA/S01_0-3");
    }

    #[test]
    fn test_capture_keys_order_by_subject_then_activity_then_index() {
        let mut keys = vec![
            CaptureKey::new("S02", "WA", 0),
            CaptureKey::new("S01", "WA", 10),
            CaptureKey::new("S01", "WA", 2),
        ];
        keys.sort();
        assert_eq!(keys[0].index, 2);
        assert_eq!(keys[1].index, 10);
        assert_eq!(keys[2].subject, "S02");
    }
}
