// src/config/loader.rs
//! Layered configuration loader: defaults ← TOML files ← environment

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{constants::paths, schema_validator::SchemaValidator, PipelineConfig};
use crate::error::{CsiError, CsiErrorBuilder};

/// Configuration loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    paths_required: bool,
    schema_validator: SchemaValidator,
    current_config: PipelineConfig,
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileNotFound(String),
    ParseError(String),
    ValidationError(Vec<crate::config::schema_validator::ValidationError>),
    ConsistencyError(Vec<String>),
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Configuration file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Configuration parse error: {}", msg),
            ConfigError::ValidationError(errors) => {
                write!(f, "Configuration validation errors: ")?;
                for error in errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
            ConfigError::ConsistencyError(errors) => {
                write!(f, "Configuration consistency errors: ")?;
                for error in errors {
                    write!(f, "\n  {}", error)?;
                }
                Ok(())
            }
            ConfigError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for CsiError {
    fn from(err: ConfigError) -> Self {
        CsiErrorBuilder::new("config_loader", "load").configuration(&err.to_string())
    }
}

impl ConfigLoader {
    /// Create loader over the standard search paths; missing files are skipped
    pub fn new() -> Self {
        Self {
            config_paths: Self::discover_config_paths(),
            paths_required: false,
            schema_validator: SchemaValidator::new(),
            current_config: PipelineConfig::default(),
        }
    }

    /// Create loader over explicit paths; every path must exist
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            paths_required: true,
            schema_validator: SchemaValidator::new(),
            current_config: PipelineConfig::default(),
        }
    }

    /// Load pipeline configuration with validation
    pub fn load(&mut self) -> Result<PipelineConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        self.current_config = config.clone();
        Ok(config)
    }

    /// Get current configuration
    pub fn current_config(&self) -> &PipelineConfig {
        &self.current_config
    }

    /// Validate a configuration file without loading it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let toml_value: toml::Value = toml::from_str(&content)?;

        self.schema_validator
            .validate_config(&toml_value)
            .map_err(ConfigError::ValidationError)?;

        self.schema_validator
            .validate_dependencies(&toml_value)
            .map_err(ConfigError::ValidationError)?;

        Ok(())
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let toml_content = toml::to_string_pretty(&self.current_config)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_and_merge_configs(&self) -> Result<PipelineConfig, ConfigError> {
        let mut merged_config = toml::Value::Table(toml::value::Table::new());

        let default_config = toml::Value::try_from(&PipelineConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        merge_toml_values(&mut merged_config, default_config);

        for config_path in &self.config_paths {
            match self.load_config_file(config_path) {
                Ok(file_config) => {
                    info!(path = %config_path.display(), "loaded configuration file");
                    merge_toml_values(&mut merged_config, file_config);
                }
                Err(ConfigError::FileNotFound(_)) if !self.paths_required => continue,
                Err(e) => return Err(e),
            }
        }

        apply_overrides(&mut merged_config, std::env::vars());

        self.schema_validator
            .validate_config(&merged_config)
            .map_err(ConfigError::ValidationError)?;

        self.schema_validator
            .validate_dependencies(&merged_config)
            .map_err(ConfigError::ValidationError)?;

        let config: PipelineConfig = merged_config
            .try_into()
            .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

        config
            .validate_consistency()
            .map_err(ConfigError::ConsistencyError)?;

        Ok(config)
    }

    fn load_config_file<P: AsRef<Path>>(&self, path: P) -> Result<toml::Value, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut search_paths = Vec::new();

        search_paths.push(PathBuf::from(paths::SYSTEM_CONFIG_PATH));

        if let Some(home_dir) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            search_paths.push(PathBuf::from(home_dir).join(paths::USER_CONFIG_DIR).join("config.toml"));
        }

        // Local configurations, later entries take precedence
        search_paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        search_paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));

        search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

/// Apply `CSI_IMF_<SECTION>_<FIELD>` overrides, e.g. `CSI_IMF_DECOMPOSITION_ENSEMBLE_TRIALS`
fn apply_overrides<I>(config: &mut toml::Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };
        let rest = rest.to_lowercase();
        let Some((section, field)) = rest.split_once('_') else {
            continue;
        };

        debug!(%key, "applying environment override");
        if let toml::Value::Table(root) = config {
            let table = root
                .entry(section.to_string())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
            if let toml::Value::Table(table) = table {
                let as_list = matches!(table.get(field), Some(toml::Value::Array(_)));
                table.insert(field.to_string(), parse_env_value(&value, as_list));
            }
        }
    }
}

/// Comma lists become arrays. A field that is already an array always gets one,
/// even from a single value; an empty value clears it.
fn parse_env_value(value: &str, as_list: bool) -> toml::Value {
    let parts: Vec<&str> = value.split(',').map(str::trim).filter(|p| !p.is_empty()).collect();
    if as_list {
        return toml::Value::Array(parts.into_iter().map(parse_scalar).collect());
    }

    let raw_parts = value.split(',').count();
    if raw_parts > 1 && parts.len() == raw_parts {
        return toml::Value::Array(parts.into_iter().map(parse_scalar).collect());
    }
    parse_scalar(value)
}

fn parse_scalar(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_load_default_config() {
        let mut loader = ConfigLoader::with_paths(Vec::new());
        let config = loader.load().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[decomposition]
imf_levels = 5
ensemble_trials = 10

[capture]
truncate_samples = 400
"#
        )
        .unwrap();

        let mut loader = ConfigLoader::with_paths(vec![temp_file.path().to_path_buf()]);
        let config = loader.load().unwrap();

        assert_eq!(config.decomposition.imf_levels, 5);
        assert_eq!(config.decomposition.ensemble_trials, 10);
        assert_eq!(config.capture.truncate_samples, 400);
        assert_eq!(config.capture.sampling_rate_hz, 50.0);
    }

    #[test]
    #[serial]
    fn test_missing_explicit_file_is_error() {
        let mut loader = ConfigLoader::with_paths(vec![PathBuf::from("/nonexistent/csi-imf.toml")]);
        assert!(matches!(loader.load(), Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_config_file_validation() {
        let loader = ConfigLoader::new();

        let mut valid = NamedTempFile::new().unwrap();
        writeln!(valid, "[decomposition]\nimf_levels = 7\nseed_policy = \"fixed\"").unwrap();
        assert!(loader.validate_config_file(valid.path()).is_ok());

        let mut invalid = NamedTempFile::new().unwrap();
        writeln!(invalid, "[decomposition]\nensemble_trials = 0").unwrap();
        assert!(loader.validate_config_file(invalid.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        std::env::set_var("CSI_IMF_DECOMPOSITION_ENSEMBLE_TRIALS", "25");
        std::env::set_var("CSI_IMF_BATCH_ACTIVITIES", "WA,FA");

        let mut loader = ConfigLoader::with_paths(Vec::new());
        let result = loader.load();

        std::env::remove_var("CSI_IMF_DECOMPOSITION_ENSEMBLE_TRIALS");
        std::env::remove_var("CSI_IMF_BATCH_ACTIVITIES");

        let config = result.unwrap();
        assert_eq!(config.decomposition.ensemble_trials, 25);
        assert_eq!(config.batch.activities, vec!["WA".to_string(), "FA".to_string()]);
    }

    #[test]
    #[serial]
    fn test_environment_override_out_of_range_rejected() {
        std::env::set_var("CSI_IMF_DECOMPOSITION_IMF_LEVELS", "0");
        let result = ConfigLoader::with_paths(Vec::new()).load();
        std::env::remove_var("CSI_IMF_DECOMPOSITION_IMF_LEVELS");

        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_parse_env_value() {
        assert_eq!(parse_env_value("12", false), toml::Value::Integer(12));
        assert_eq!(parse_env_value("0.5", false), toml::Value::Float(0.5));
        assert_eq!(parse_env_value("true", false), toml::Value::Boolean(true));
        assert_eq!(parse_env_value(",", false), toml::Value::String(",".to_string()));
        assert_eq!(
            parse_env_value("0,27", false),
            toml::Value::Array(vec![toml::Value::Integer(0), toml::Value::Integer(27)])
        );
        assert_eq!(
            parse_env_value("WA", true),
            toml::Value::Array(vec![toml::Value::String("WA".to_string())])
        );
        assert_eq!(parse_env_value("", true), toml::Value::Array(Vec::new()));
    }

    #[test]
    #[serial]
    fn test_single_value_list_override() {
        std::env::set_var("CSI_IMF_BATCH_ACTIVITIES", "WA");
        std::env::set_var("CSI_IMF_CAPTURE_NULL_SUBCARRIERS", "0");

        let result = ConfigLoader::with_paths(Vec::new()).load();

        std::env::remove_var("CSI_IMF_BATCH_ACTIVITIES");
        std::env::remove_var("CSI_IMF_CAPTURE_NULL_SUBCARRIERS");

        let config = result.unwrap();
        assert_eq!(config.batch.activities, vec!["WA".to_string()]);
        assert_eq!(config.capture.null_subcarriers, vec![0]);
    }

    #[test]
    #[serial]
    fn test_config_export() {
        let mut loader = ConfigLoader::with_paths(Vec::new());
        loader.load().unwrap();
        let temp_file = NamedTempFile::new().unwrap();

        assert!(loader.export_config(temp_file.path()).is_ok());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("[decomposition]"));
        assert!(content.contains("imf_levels = 7"));
    }
}
