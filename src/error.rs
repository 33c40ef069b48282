//! Structured Error Handling for it2fls
//!
//! Provides a unified error type with:
//! - Error codes for programmatic handling
//! - Structured error payloads (JSON-friendly)
//! - Context preservation through error chains
//!
//! # Error Categories
//!
//! - `Configuration` - Malformed membership parameters, duplicate labels, empty rule
//!   bases. Raised while building an engine, never during inference.
//! - `Inference` - Per-call failures such as `NoRuleFired`. The engine is unaffected
//!   and the next call starts clean.
//! - `Input` - Crisp measurement problems. Out-of-range values are clamped and only
//!   reported; non-finite values are rejected.
//! - `Config` - Configuration file discovery and syntax
//!
//! # Example
//!
//! ```rust,ignore
//! use it2fls::error::{FlsError, ErrorCode};
//!
//! fn check_step(step: f64) -> Result<(), FlsError> {
//!     if step <= 0.0 {
//!         return Err(FlsError::configuration("universe step must be positive")
//!             .with_code(ErrorCode::InvalidUniverse)
//!             .with_context("step", step.to_string()));
//!     }
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error Codes
// ============================================================================

/// Unique error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    /// Generic configuration error
    ConfigurationError = 1000,
    /// Universe range/step is unusable
    InvalidUniverse = 1001,
    /// Shape parameters are malformed (unordered, non-finite, sigma <= 0)
    InvalidShape = 1002,
    /// Lower membership curve rises above the upper curve
    FootprintViolation = 1003,
    /// Two labels with the same name on one variable
    DuplicateLabel = 1004,
    /// Two variables with the same name in one engine
    DuplicateVariable = 1005,
    /// Rule references a variable the engine does not know
    UnknownVariable = 1006,
    /// Rule references a label the variable does not define
    UnknownLabel = 1007,
    /// No rule concludes on the output variable
    EmptyRuleBase = 1008,
    /// Rule has no antecedent clauses
    EmptyClauses = 1009,
    /// Engine has no consequent variable
    MissingOutput = 1010,

    // Inference errors (2xxx)
    /// Every firing strength was zero for this call
    NoRuleFired = 2001,

    // Input errors (3xxx)
    /// Crisp input outside the universe (clamped, reported only)
    OutOfRangeInput = 3001,
    /// Crisp input is NaN or infinite
    InvalidInput = 3002,

    // Config file errors (7xxx)
    /// Config file not found
    ConfigNotFound = 7001,
    /// Invalid config syntax
    InvalidConfigSyntax = 7002,

    // Internal errors (9xxx)
    /// Internal error
    InternalError = 9000,
}

/// Broad grouping of error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Configuration,
    Inference,
    Input,
    Config,
    Internal,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a short description of the error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ConfigurationError => "Configuration error",
            ErrorCode::InvalidUniverse => "Invalid universe",
            ErrorCode::InvalidShape => "Invalid membership shape",
            ErrorCode::FootprintViolation => "Lower membership exceeds upper membership",
            ErrorCode::DuplicateLabel => "Duplicate label",
            ErrorCode::DuplicateVariable => "Duplicate variable",
            ErrorCode::UnknownVariable => "Unknown variable",
            ErrorCode::UnknownLabel => "Unknown label",
            ErrorCode::EmptyRuleBase => "No rule concludes on the output variable",
            ErrorCode::EmptyClauses => "Rule has no clauses",
            ErrorCode::MissingOutput => "Missing output variable",

            ErrorCode::NoRuleFired => "No rule fired",

            ErrorCode::OutOfRangeInput => "Input outside universe",
            ErrorCode::InvalidInput => "Invalid input value",

            ErrorCode::ConfigNotFound => "Configuration file not found",
            ErrorCode::InvalidConfigSyntax => "Invalid configuration syntax",

            ErrorCode::InternalError => "Internal error",
        }
    }

    /// Get the category this code belongs to
    pub fn category(&self) -> ErrorCategory {
        match self.code() / 1000 {
            1 => ErrorCategory::Configuration,
            2 => ErrorCategory::Inference,
            3 => ErrorCategory::Input,
            7 => ErrorCategory::Config,
            _ => ErrorCategory::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ============================================================================
// Error Context
// ============================================================================

/// Additional context information for an error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Key-value pairs of context information
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub fields: HashMap<String, String>,
    /// Source location (file:line)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Stack of error causes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

impl ErrorContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// The main error type for it2fls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlsError {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Additional context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ErrorContext>,
    /// Hint for resolving the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl FlsError {
    /// Create a new error with a code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            hint: None,
        }
    }

    // ========================================================================
    // Factory methods for common error types
    // ========================================================================

    /// Create a generic configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, message)
    }

    /// Create an invalid shape error
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidShape, message)
    }

    /// Create a footprint violation for a label at a sample point
    pub fn footprint(label: &str, x: f64, lower: f64, upper: f64) -> Self {
        Self::new(
            ErrorCode::FootprintViolation,
            format!(
                "label '{}': lower membership {:.6} exceeds upper {:.6} at x = {}",
                label, lower, upper, x
            ),
        )
        .with_context("label", label)
        .with_context("x", x.to_string())
        .with_hint("Check that the lower parameter tuple lies inside the upper one")
    }

    /// Create a duplicate label error
    pub fn duplicate_label(variable: &str, label: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateLabel,
            format!("variable '{}' already defines label '{}'", variable, label),
        )
        .with_context("variable", variable)
        .with_context("label", label)
    }

    /// Create an unknown variable error
    pub fn unknown_variable(name: &str) -> Self {
        Self::new(ErrorCode::UnknownVariable, format!("unknown variable '{}'", name))
            .with_context("variable", name)
    }

    /// Create an unknown label error
    pub fn unknown_label(variable: &str, label: &str) -> Self {
        Self::new(
            ErrorCode::UnknownLabel,
            format!("variable '{}' has no label '{}'", variable, label),
        )
        .with_context("variable", variable)
        .with_context("label", label)
    }

    /// Create a no-rule-fired error
    pub fn no_rule_fired(rules: usize) -> Self {
        Self::new(
            ErrorCode::NoRuleFired,
            format!("none of the {} rules fired for this input", rules),
        )
        .with_hint("The caller decides the fallback; no baseline score is assumed")
    }

    /// Create an invalid input error
    pub fn invalid_input(variable: &str, value: f64) -> Self {
        Self::new(
            ErrorCode::InvalidInput,
            format!("input '{}' is not a finite number ({})", variable, value),
        )
        .with_context("variable", variable)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    // ========================================================================
    // Builder methods
    // ========================================================================

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.fields.insert(key.into(), value.into());
        self
    }

    /// Add a cause to the error chain
    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.causes.push(cause.into());
        self
    }

    /// Add source location
    pub fn at(mut self, location: impl Into<String>) -> Self {
        let ctx = self.context.get_or_insert_with(ErrorContext::new);
        ctx.location = Some(location.into());
        self
    }

    /// Add a hint for resolving the error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Get the category of this error
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Whether this error was raised while building an engine
    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// Whether this error reports that no rule fired
    pub fn is_no_rule_fired(&self) -> bool {
        self.code == ErrorCode::NoRuleFired
    }

    /// Look up a context field
    pub fn context_field(&self, key: &str) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|c| c.fields.get(key))
            .map(String::as_str)
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":"INTERNAL_ERROR","message":"{}"}}"#, self.message)
        })
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

impl fmt::Display for FlsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)?;

        if let Some(ref ctx) = self.context {
            if let Some(ref loc) = ctx.location {
                write!(f, " at {}", loc)?;
            }
            if !ctx.causes.is_empty() {
                write!(f, "\nCaused by:")?;
                for cause in &ctx.causes {
                    write!(f, "\n  - {}", cause)?;
                }
            }
        }

        if let Some(ref hint) = self.hint {
            write!(f, "\nHint: {}", hint)?;
        }

        Ok(())
    }
}

impl std::error::Error for FlsError {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<std::io::Error> for FlsError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::ConfigNotFound,
            _ => ErrorCode::InternalError,
        };
        FlsError::new(code, err.to_string())
    }
}

impl From<serde_json::Error> for FlsError {
    fn from(err: serde_json::Error) -> Self {
        FlsError::new(ErrorCode::InvalidConfigSyntax, err.to_string())
            .with_context("format", "JSON")
    }
}

impl From<toml::de::Error> for FlsError {
    fn from(err: toml::de::Error) -> Self {
        FlsError::new(ErrorCode::InvalidConfigSyntax, err.to_string())
            .with_context("format", "TOML")
    }
}

// ============================================================================
// Result type alias
// ============================================================================

/// A Result type using FlsError
pub type FlsResult<T> = Result<T, FlsError>;

// ============================================================================
// Macros for convenient error creation
// ============================================================================

/// Create an FlsError with context from the current location
#[macro_export]
macro_rules! fls_error {
    ($code:expr, $msg:expr) => {
        $crate::error::FlsError::new($code, $msg)
            .at(format!("{}:{}", file!(), line!()))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        $crate::error::FlsError::new($code, format!($fmt, $($arg)*))
            .at(format!("{}:{}", file!(), line!()))
    };
}

/// Bail out early with an error
#[macro_export]
macro_rules! fls_bail {
    ($code:expr, $msg:expr) => {
        return Err($crate::fls_error!($code, $msg))
    };
    ($code:expr, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::fls_error!($code, $fmt, $($arg)*))
    };
}

/// Ensure a condition holds, or return an error
#[macro_export]
macro_rules! fls_ensure {
    ($cond:expr, $code:expr, $msg:expr) => {
        if !$cond {
            $crate::fls_bail!($code, $msg);
        }
    };
    ($cond:expr, $code:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::fls_bail!($code, $fmt, $($arg)*);
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
