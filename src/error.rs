// src/error.rs
//! Unified error handling for the CSI → IMF pipeline
//!
//! Every component reports failures through [`CsiError`]. Errors are scoped to the
//! unit that raised them (a capture, a subcarrier or a synthetic pair) so the batch
//! driver can record them and keep going with the rest of the corpus.

use serde::Serialize;
use std::collections::HashMap;
use std::error::Error;
use std::time::SystemTime;
use thiserror::Error;

use crate::utils::validation::ValidationError;

/// Unified error type for the whole pipeline
#[derive(Debug, Clone, Error)]
pub enum CsiError {
    /// Raw capture could not be interpreted (odd component count, ragged rows, bad numbers)
    #[error("[CAPTURE] Malformed capture {origin}: {reason} ({})", .context.operation)]
    MalformedCapture {
        origin: String,
        reason: String,
        context: ErrorContext,
    },

    /// Capture is shorter than the configured truncation length
    #[error("[CAPTURE] Insufficient samples in {origin}: need {required}, have {available} ({})", .context.operation)]
    InsufficientSamples {
        origin: String,
        required: usize,
        available: usize,
        context: ErrorContext,
    },

    /// Tensors fed to the recombiner disagree in shape or level count
    #[error("[RECOMBINE] Shape mismatch: source {source_shape:?}, dest {dest_shape:?}, expected {expected_levels} mode levels ({})", .context.operation)]
    ShapeMismatch {
        source_shape: Vec<usize>,
        dest_shape: Vec<usize>,
        expected_levels: usize,
        context: ErrorContext,
    },

    /// Caller supplied an argument outside the operation's preconditions
    #[error("[PARAM] Invalid parameter '{parameter}': {reason} ({})", .context.operation)]
    InvalidParameter {
        parameter: String,
        reason: String,
        context: ErrorContext,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("[CONFIG] Configuration error in {component}: {reason}")]
    Configuration {
        component: String,
        reason: String,
        context: ErrorContext,
    },

    /// Filesystem access failed
    #[error("[IO] {path}: {reason} ({})", .context.operation)]
    Io {
        path: String,
        reason: String,
        context: ErrorContext,
    },

    /// Tensor artifact could not be written, read back or verified
    #[error("[STORE] Persistence error for {path}: {reason} ({})", .context.operation)]
    Persistence {
        path: String,
        reason: String,
        context: ErrorContext,
    },

    /// Failure in a supporting subsystem (thread pool, report serialization)
    #[error("[SYSTEM] {subsystem} error: {reason} ({})", .context.operation)]
    System {
        subsystem: String,
        reason: String,
        context: ErrorContext,
    },
}

/// Error context for debugging and run reports
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    pub thread_id: Option<String>,
    pub component: String,
    pub operation: String,
    pub file: Option<&'static str>,
    pub line: Option<u32>,
    pub additional_info: HashMap<String, String>,
}

impl ErrorContext {
    /// Create a new error context
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            thread_id: Self::current_thread_id(),
            component: component.to_string(),
            operation: operation.to_string(),
            file: None,
            line: None,
            additional_info: HashMap::new(),
        }
    }

    /// Create error context with file and line information
    pub fn with_location(component: &str, operation: &str, file: &'static str, line: u32) -> Self {
        let mut context = Self::new(component, operation);
        context.file = Some(file);
        context.line = Some(line);
        context
    }

    /// Add additional information to the context
    pub fn add_info<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.additional_info.insert(key.into(), value.into());
        self
    }

    fn current_thread_id() -> Option<String> {
        std::thread::current().name().map(|s| s.to_string())
    }
}

/// Macro for creating error context with file and line info
#[macro_export]
macro_rules! error_context {
    ($component:expr, $operation:expr) => {
        $crate::error::ErrorContext::with_location($component, $operation, file!(), line!())
    };
}

impl CsiError {
    /// Context attached to this error
    pub fn context(&self) -> &ErrorContext {
        match self {
            CsiError::MalformedCapture { context, .. }
            | CsiError::InsufficientSamples { context, .. }
            | CsiError::ShapeMismatch { context, .. }
            | CsiError::InvalidParameter { context, .. }
            | CsiError::Configuration { context, .. }
            | CsiError::Io { context, .. }
            | CsiError::Persistence { context, .. }
            | CsiError::System { context, .. } => context,
        }
    }

    /// Short machine-readable category, used as the key in run reports
    pub fn category(&self) -> &'static str {
        match self {
            CsiError::MalformedCapture { .. } => "malformed_capture",
            CsiError::InsufficientSamples { .. } => "insufficient_samples",
            CsiError::ShapeMismatch { .. } => "shape_mismatch",
            CsiError::InvalidParameter { .. } => "invalid_parameter",
            CsiError::Configuration { .. } => "configuration",
            CsiError::Io { .. } => "io",
            CsiError::Persistence { .. } => "persistence",
            CsiError::System { .. } => "system",
        }
    }

    /// Whether the batch driver may skip the failing unit and continue.
    ///
    /// Configuration errors invalidate every unit of a run and abort it.
    pub fn is_unit_scoped(&self) -> bool {
        !matches!(self, CsiError::Configuration { .. })
    }
}

impl From<ValidationError> for CsiError {
    fn from(err: ValidationError) -> Self {
        CsiError::InvalidParameter {
            parameter: err.field().to_string(),
            reason: err.to_string(),
            context: error_context!("validation", "parameter_check"),
        }
    }
}

/// Result type alias for pipeline operations
pub type CsiResult<T> = Result<T, CsiError>;

/// Error builder for convenient error construction
pub struct CsiErrorBuilder {
    component: String,
    operation: String,
}

impl CsiErrorBuilder {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext::new(&self.component, &self.operation)
    }

    pub fn malformed_capture(self, origin: &str, reason: &str) -> CsiError {
        CsiError::MalformedCapture {
            origin: origin.to_string(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn insufficient_samples(self, origin: &str, required: usize, available: usize) -> CsiError {
        CsiError::InsufficientSamples {
            origin: origin.to_string(),
            required,
            available,
            context: self.context(),
        }
    }

    pub fn shape_mismatch(self, source_shape: &[usize], dest_shape: &[usize], expected_levels: usize) -> CsiError {
        CsiError::ShapeMismatch {
            source_shape: source_shape.to_vec(),
            dest_shape: dest_shape.to_vec(),
            expected_levels,
            context: self.context(),
        }
    }

    pub fn invalid_parameter(self, parameter: &str, reason: &str) -> CsiError {
        CsiError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn configuration(self, reason: &str) -> CsiError {
        let context = self.context();
        CsiError::Configuration {
            component: self.component,
            reason: reason.to_string(),
            context,
        }
    }

    pub fn io(self, path: &str, reason: &str) -> CsiError {
        CsiError::Io {
            path: path.to_string(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }

    pub fn persistence(self, path: &str, reason: &str) -> CsiError {
        CsiError::Persistence {
            path: path.to_string(),
            reason: reason.to_string(),
            context: self.context(),
        }
    }
}

/// Convenience trait for mapping foreign errors into [`CsiError::System`]
pub trait IntoCsiError<T> {
    fn csi_err(self, component: &str, operation: &str) -> CsiResult<T>;
}

impl<T, E> IntoCsiError<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn csi_err(self, component: &str, operation: &str) -> CsiResult<T> {
        self.map_err(|err| CsiError::System {
            subsystem: component.to_string(),
            reason: err.to_string(),
            context: ErrorContext::new(component, operation),
        })
    }
}
