//! Configuration types for the state machine compiler.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from a
//! TOML file by the command line front end.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration root.
//! - [`CompilerConfig`] - Controls the output mode and warning policy.
//!
//! # Example
//!
//! ```
//! # use smc::config::AppConfig;
//! let config = AppConfig::default();
//! assert!(config.compiler().optimize());
//! assert!(!config.compiler().deny_warnings());
//! ```

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Compiler configuration section.
    #[serde(default)]
    compiler: CompilerConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the given compiler section.
    pub fn new(compiler: CompilerConfig) -> Self {
        Self { compiler }
    }

    /// Returns the compiler configuration.
    pub fn compiler(&self) -> &CompilerConfig {
        &self.compiler
    }
}

/// Compiler pipeline settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Flatten the resolved machine into transition tables.
    optimize: bool,

    /// Report semantic warnings as errors.
    deny_warnings: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            optimize: true,
            deny_warnings: false,
        }
    }
}

impl CompilerConfig {
    /// Creates a new [`CompilerConfig`].
    ///
    /// # Arguments
    ///
    /// * `optimize` - Produce the optimized machine instead of the semantic one.
    /// * `deny_warnings` - Fail compilation on semantic warnings.
    pub fn new(optimize: bool, deny_warnings: bool) -> Self {
        Self {
            optimize,
            deny_warnings,
        }
    }

    /// Whether the optimized machine is produced.
    pub fn optimize(&self) -> bool {
        self.optimize
    }

    /// Whether semantic warnings fail compilation.
    pub fn deny_warnings(&self) -> bool {
        self.deny_warnings
    }

    /// Returns a copy with the output mode replaced.
    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}
