//! Configuration System for it2fls
//!
//! Provides a flexible configuration system supporting:
//! - TOML protocol files (variables, labels, rule table)
//! - Environment variable overrides
//! - Multiple config file locations
//! - The bundled MEWS protocol
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./it2fls.toml` - Project-local configuration
//! 2. `~/.config/it2fls/config.toml` - User configuration (XDG)
//! 3. `~/.it2fls/config.toml` - User configuration (legacy)
//! 4. `/etc/it2fls/config.toml` - System-wide configuration
//!
//! # Environment Variables
//!
//! - `IT2FLS_TYPE_REDUCTION` - Type reduction (centroid-of-bounds, mean-of-means)
//! - `IT2FLS_LOG_LEVEL` - Logging verbosity (quiet, normal, verbose, debug)
//! - `IT2FLS_BATCH_WORKERS` - Batch worker threads (0 = auto)
//!
//! # Example Configuration
//!
//! ```toml
//! [general]
//! protocol = "fever"
//! log_level = "normal"
//!
//! [engine]
//! type_reduction = "centroid-of-bounds"
//!
//! [[variables]]
//! name = "Temp"
//! universe = { start = 35.0, stop = 40.0, step = 0.1 }
//!
//! [[variables.labels]]
//! name = "Normal"
//! shape = "trapezoid"
//! params = [35.0, 35.0, 37.5, 38.5]
//! uncertainty = 0.1
//!
//! [[variables.labels]]
//! name = "Fever"
//! shape = "trapezoid"
//! lower = [37.8, 38.8, 40.0, 40.0]
//! upper = [37.3, 38.3, 40.0, 40.0]
//!
//! [[variables]]
//! name = "Risk"
//! role = "consequent"
//! universe = { start = 0.0, stop = 10.0, step = 0.1 }
//! # ...
//!
//! [[rules]]
//! connective = "and"
//! when = [{ variable = "Temp", label = "Fever" }]
//! then = { variable = "Risk", label = "High" }
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::{BatchConfig, InferenceEngine, TypeReduction};
use crate::error::{ErrorCode, FlsError, FlsResult};
use crate::fuzzy::{Clause, Connective, FuzzyVariable, IntervalMembership, Role, Rule, Shape, Universe};

/// The bundled MEWS protocol
pub const MEWS_PROTOCOL: &str = include_str!("../../protocols/mews.toml");

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FlsConfig {
    /// General settings
    pub general: GeneralConfig,
    /// Inference settings
    pub engine: EngineConfig,
    /// Input and output variables
    pub variables: Vec<VariableConfig>,
    /// Rule table, in evaluation order
    pub rules: Vec<RuleConfig>,
}

/// General configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Logging level
    pub log_level: LogLevel,
    /// Protocol name (informational)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

/// Inference configuration options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Type reduction policy
    pub type_reduction: TypeReduction,
    /// Batch worker threads (0 = auto-detect)
    pub batch_workers: usize,
}

impl EngineConfig {
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::default().with_workers(self.batch_workers)
    }
}

/// A linguistic variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    pub name: String,
    #[serde(default)]
    pub role: Role,
    pub universe: UniverseConfig,
    #[serde(default)]
    pub labels: Vec<LabelConfig>,
}

/// `start..=stop` sampled every `step`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniverseConfig {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

/// A label, either parameter-shifted (`params` + `uncertainty`) or
/// dual-parameter (`lower` + `upper`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub name: String,
    #[serde(default)]
    pub shape: ShapeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<Vec<f64>>,
}

/// A rule table entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub connective: Connective,
    pub when: Vec<Clause>,
    pub then: Clause,
}

// ============================================================================
// Enums
// ============================================================================

/// Membership shape family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    #[serde(alias = "trapmf", alias = "trap")]
    Trapezoid,
    #[serde(alias = "trimf", alias = "tri")]
    Triangle,
    #[serde(alias = "gaussmf", alias = "gauss")]
    Gaussian,
}

impl ShapeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Trapezoid => "trapezoid",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Gaussian => "gaussian",
        }
    }
}

/// Log level options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Verbose => "verbose",
            LogLevel::Debug => "debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quiet" | "q" | "0" => Some(LogLevel::Quiet),
            "normal" | "n" | "1" => Some(LogLevel::Normal),
            "verbose" | "v" | "2" => Some(LogLevel::Verbose),
            "debug" | "d" | "3" => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Maximum level a host subscriber should record
    pub fn as_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Quiet => tracing::Level::ERROR,
            LogLevel::Normal => tracing::Level::INFO,
            LogLevel::Verbose => tracing::Level::DEBUG,
            LogLevel::Debug => tracing::Level::TRACE,
        }
    }
}

// ============================================================================
// Engine construction
// ============================================================================

impl LabelConfig {
    /// Interval membership described by this entry
    pub fn membership(&self) -> FlsResult<IntervalMembership> {
        let kind = self.shape.as_str();
        let build = || match (&self.params, &self.lower, &self.upper) {
            (Some(params), None, None) => {
                IntervalMembership::shifted(Shape::from_params(kind, params)?, self.uncertainty.unwrap_or(0.0))
            }
            (None, Some(lower), Some(upper)) if self.uncertainty.is_none() => IntervalMembership::dual(
                Shape::from_params(kind, lower)?,
                Shape::from_params(kind, upper)?,
            ),
            _ => Err(FlsError::configuration(format!(
                "label '{}' must give either params (with optional uncertainty) or lower and upper",
                self.name
            ))),
        };
        build().map_err(|e| e.with_context("label", self.name.clone()))
    }
}

impl VariableConfig {
    pub fn build(&self) -> FlsResult<FuzzyVariable> {
        let tag = |e: FlsError| e.with_context("variable", self.name.clone());
        let u = &self.universe;
        let universe = Universe::new(u.start, u.stop, u.step).map_err(tag)?;

        let mut variable = FuzzyVariable::new(self.name.clone(), self.role, universe);
        for label in &self.labels {
            let membership = label.membership().map_err(tag)?;
            variable.add_label(label.name.clone(), membership)?;
        }
        Ok(variable)
    }
}

impl RuleConfig {
    pub fn build(&self) -> Rule {
        let rule = Rule::new(self.connective, self.when.clone(), self.then.clone());
        match &self.name {
            Some(name) => rule.with_name(name.clone()),
            None => rule,
        }
    }
}

// ============================================================================
// Configuration Loading
// ============================================================================

impl FlsConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled MEWS protocol
    pub fn mews() -> Result<Self, ConfigError> {
        toml::from_str(MEWS_PROTOCOL)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<bundled mews>"), e.to_string()))
    }

    /// Engine for the bundled MEWS protocol
    pub fn mews_engine() -> FlsResult<InferenceEngine> {
        Self::mews()?.build_engine()
    }

    /// Load configuration from default locations
    ///
    /// Searches for config files in order:
    /// 1. ./it2fls.toml
    /// 2. ~/.config/it2fls/config.toml
    /// 3. ~/.it2fls/config.toml
    /// 4. /etc/it2fls/config.toml
    ///
    /// Then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for path in Self::config_paths() {
            if path.exists() {
                config = Self::load_from_file(&path)?;
                break;
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Load configuration from a TOML string
    pub fn load_from_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Get the list of config file search paths
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // Project-local
        paths.push(PathBuf::from("./it2fls.toml"));

        // XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("it2fls").join("config.toml"));
        }

        // Legacy home directory
        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".it2fls").join("config.toml"));
        }

        // System-wide (Unix only)
        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/it2fls/config.toml"));

        paths
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the environment in production)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // IT2FLS_TYPE_REDUCTION
        if let Some(val) = lookup("IT2FLS_TYPE_REDUCTION") {
            if let Some(reduction) = TypeReduction::from_str(&val) {
                self.engine.type_reduction = reduction;
            }
        }

        // IT2FLS_LOG_LEVEL
        if let Some(val) = lookup("IT2FLS_LOG_LEVEL") {
            if let Some(level) = LogLevel::from_str(&val) {
                self.general.log_level = level;
            }
        }

        // IT2FLS_BATCH_WORKERS
        if let Some(val) = lookup("IT2FLS_BATCH_WORKERS") {
            if let Ok(workers) = val.parse::<usize>() {
                self.engine.batch_workers = workers;
            }
        }
    }

    /// Validate the configuration and build an engine
    pub fn build_engine(&self) -> FlsResult<InferenceEngine> {
        let variables = self
            .variables
            .iter()
            .map(VariableConfig::build)
            .collect::<FlsResult<Vec<_>>>()?;

        InferenceEngine::builder()
            .variables(variables)
            .rules(self.rules.iter().map(RuleConfig::build))
            .type_reduction(self.engine.type_reduction)
            .build()
    }

    pub fn variable(&self, name: &str) -> Option<&VariableConfig> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Write configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_toml()?;
        fs::write(path, content)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))
    }

    /// Starter configuration file content (the MEWS protocol)
    pub fn default_config_content() -> &'static str {
        MEWS_PROTOCOL
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration file errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// IO error reading/writing config file
    IoError(PathBuf, String),
    /// Parse error in config file
    ParseError(PathBuf, String),
    /// Serialization error
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(f, "IO error reading {}: {}", path.display(), msg)
            }
            ConfigError::ParseError(path, msg) => {
                write!(f, "Parse error in {}: {}", path.display(), msg)
            }
            ConfigError::SerializeError(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for FlsError {
    fn from(err: ConfigError) -> Self {
        let message = err.to_string();
        match err {
            ConfigError::IoError(path, _) => FlsError::new(ErrorCode::ConfigNotFound, message)
                .with_context("path", path.display().to_string()),
            ConfigError::ParseError(path, _) => FlsError::new(ErrorCode::InvalidConfigSyntax, message)
                .with_context("path", path.display().to_string())
                .with_context("format", "TOML"),
            ConfigError::SerializeError(_) => FlsError::new(ErrorCode::InternalError, message),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
