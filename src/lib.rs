//! IT2FLS - Interval Type-2 Fuzzy Logic System
//!
//! Maps a panel of crisp vital-sign measurements to a clinical risk score
//! using interval type-2 fuzzy sets, Mamdani min/max inference and interval
//! centroid type reduction.
//!
//! # Architecture
//!
//! - [`fuzzy`] - universes, interval membership functions, linguistic variables, rules
//! - [`engine`] - the inference pipeline, type reduction and batch execution
//! - [`report`] - inference results, rule traces and plotting data
//! - [`config`] - TOML protocols, file discovery, the bundled MEWS protocol
//! - [`error`] - structured errors with codes, context and hints
//!
//! # Features
//!
//! - Trapezoid, triangle and Gaussian shapes
//! - Parameter-shift and dual-parameter footprints of uncertainty
//! - AND/OR rules with interval firing strengths, partial panels supported
//! - Centroid-of-bounds and mean-of-means type reduction
//! - Out-of-range inputs clamped to the universe edge and reported
//! - Parallel batch inference over a shared immutable engine
//!
//! # Example
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use it2fls::FlsConfig;
//!
//! let engine = FlsConfig::mews_engine()?;
//!
//! let mut panel = HashMap::new();
//! panel.insert("SBP".to_string(), 110.0);
//! panel.insert("HR".to_string(), 70.0);
//! panel.insert("SPO2".to_string(), 96.0);
//! panel.insert("Temp".to_string(), 37.5);
//! panel.insert("BS".to_string(), 90.0);
//!
//! let result = engine.infer(&panel)?;
//! assert_eq!(result.risk_group.as_deref(), Some("NRM"));
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod config;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod report;

// Re-export building blocks
pub use fuzzy::{
    Universe, Edge,
    Interval, Shape, IntervalMembership, IntervalSet,
    Role, LinguisticLabel, FuzzyVariable, Fuzzified, ClampNotice,
    Connective, Clause, Rule, RuleBase, Firing,
};

// Re-export engine types
pub use engine::{InferenceEngine, EngineBuilder, Panel, TypeReduction, BatchConfig};

// Re-export result types
pub use report::{RiskResult, RuleActivation, CurveSeries, CurvePoint};

// Re-export configuration types
pub use config::{
    FlsConfig, ConfigError,
    GeneralConfig, EngineConfig, VariableConfig, UniverseConfig, LabelConfig, RuleConfig,
    ShapeKind, LogLevel,
};

// Re-export error types
pub use error::{FlsError, FlsResult, ErrorCode, ErrorCategory, ErrorContext};
