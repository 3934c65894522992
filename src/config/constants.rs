// src/config/constants.rs
//! System-wide configuration constants

/// Raw capture layout and truncation
pub mod capture {
    /// Sampling rate of the collection firmware
    pub const DEFAULT_SAMPLING_RATE_HZ: f64 = 50.0;
    pub const MIN_SAMPLING_RATE_HZ: f64 = 0.1;
    pub const MAX_SAMPLING_RATE_HZ: f64 = 100_000.0;

    /// Every capture is cut to this many samples so tensor shapes agree
    pub const DEFAULT_TRUNCATE_SAMPLES: usize = 850;
    pub const MIN_TRUNCATE_SAMPLES: usize = 16;
    pub const MAX_TRUNCATE_SAMPLES: usize = 1_000_000;

    /// Subcarrier slots reported per sample (HT20, 64 slots)
    pub const SUBCARRIER_SLOTS: usize = 64;

    /// Guard, DC and unused slots that never carry channel information
    pub const DEFAULT_NULL_SUBCARRIERS: &[usize] = &[0, 27, 28, 29, 30, 31, 32, 33, 34, 35, 36, 37];

    /// Usable subcarriers once the null slots are removed
    pub const USABLE_SUBCARRIERS: usize = SUBCARRIER_SLOTS - DEFAULT_NULL_SUBCARRIERS.len();

    pub const DEFAULT_DELIMITER: char = ',';

    /// Leading columns (timestamp) dropped from every row
    pub const DEFAULT_TIMESTAMP_COLUMNS: usize = 1;
    pub const MAX_TIMESTAMP_COLUMNS: usize = 16;
}

/// Ensemble empirical mode decomposition
pub mod decomposition {
    /// IMF levels extracted per subcarrier; the residual is stored as one extra level
    pub const DEFAULT_IMF_LEVELS: usize = 7;
    pub const MIN_IMF_LEVELS: usize = 1;
    pub const MAX_IMF_LEVELS: usize = 32;

    pub const DEFAULT_ENSEMBLE_TRIALS: usize = 100;
    pub const MIN_ENSEMBLE_TRIALS: usize = 1;
    pub const MAX_ENSEMBLE_TRIALS: usize = 10_000;

    pub const DEFAULT_NOISE_SEED: u64 = 5;

    /// Added noise standard deviation relative to the trace standard deviation
    pub const DEFAULT_NOISE_WIDTH: f64 = 0.05;
    pub const MIN_NOISE_WIDTH: f64 = 0.0;
    pub const MAX_NOISE_WIDTH: f64 = 1.0;

    pub const DEFAULT_MAX_SIFT_ITERATIONS: usize = 1000;
    pub const MIN_SIFT_ITERATIONS: usize = 1;
    pub const MAX_SIFT_ITERATIONS: usize = 100_000;

    /// Cauchy-type stopping threshold on the normalized squared difference
    pub const DEFAULT_SIFT_THRESHOLD: f64 = 0.2;
    pub const MIN_SIFT_THRESHOLD: f64 = 1e-9;
    pub const MAX_SIFT_THRESHOLD: f64 = 10.0;

    /// Minimum extrema of each kind needed to build an envelope
    pub const MIN_EXTREMA_PER_ENVELOPE: usize = 2;

    /// Energy below which a residual is treated as exhausted
    pub const RESIDUAL_ENERGY_EPSILON: f64 = 1e-20;
}

/// Variance-based subcarrier selection
pub mod selection {
    pub const DEFAULT_TOP_K: usize = 10;
    pub const DEFAULT_NORMALIZE_FLOOR: f64 = 0.0;
    pub const DEFAULT_NORMALIZE_CEIL: f64 = 1.0;
}

/// Worker pool sizing
pub mod runtime {
    /// Zero lets rayon pick one worker per logical CPU
    pub const DEFAULT_WORKER_THREADS: usize = 0;
    pub const MAX_WORKER_THREADS: usize = 1024;
}

/// Configuration and artifact paths
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/csi-imf/config.toml";
    pub const USER_CONFIG_DIR: &str = ".config/csi-imf";
    pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";

    pub const DEFAULT_RAW_ROOT: &str = "Datasets/RAW";
    pub const DEFAULT_IMF_ROOT: &str = "imfs_per_subject";
    pub const DEFAULT_SYNTHETIC_ROOT: &str = "synthetic_samples";

    pub const TENSOR_EXTENSION: &str = "npy";

    /// Environment variables with this prefix override configuration values
    pub const ENV_PREFIX: &str = "CSI_IMF_";
}
