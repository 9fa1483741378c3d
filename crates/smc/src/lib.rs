//! SMC - A compiler for hierarchical finite state machine descriptions.
//!
//! Parsing, semantic analysis, inheritance resolution and optimization of
//! the state machine language, driven by an [`AppConfig`].

pub mod config;

mod error;
pub mod optimizer;

pub use smc_core::{identifier, optimized, semantic};
pub use smc_parser::{Diagnostic, ErrorCode, FsmSyntax, ParseError, Severity};

pub use error::SmcError;

use std::fmt;

use log::{debug, info, trace, warn};

use config::AppConfig;
use optimized::OptimizedStateMachine;
use semantic::SemanticStateMachine;

/// Compiler for state machine sources.
///
/// # Examples
///
/// ```rust
/// use smc::{Compiler, config::AppConfig};
///
/// let source = "FSM: f Initial: s { s e - - }";
///
/// let compiler = Compiler::new(AppConfig::default());
/// let machine = compiler.analyze(source).expect("Failed to analyze");
/// let optimized = compiler.optimize(&machine);
/// assert_eq!(optimized.states().len(), 1);
/// ```
#[derive(Default)]
pub struct Compiler {
    config: AppConfig,
}

impl Compiler {
    /// Create a new compiler with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration this compiler runs with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse source code into a syntax tree.
    ///
    /// # Errors
    ///
    /// Returns `SmcError::Parse` carrying every lexical and syntax error of
    /// the source.
    pub fn parse(&self, source: &str) -> Result<FsmSyntax, SmcError> {
        info!("Parsing state machine");

        let syntax = smc_parser::parse(source);
        if let Err(err) = smc_parser::check_syntax(&syntax) {
            info!("{}", summary(err.error_count(), "syntax error"));
            return Err(SmcError::new_parse_error(err, source));
        }

        debug!("State machine parsed successfully");
        trace!(syntax:? = syntax; "Parsed syntax");
        Ok(syntax)
    }

    /// Parse and analyze source code into a single-inheritance semantic
    /// state machine.
    ///
    /// # Errors
    ///
    /// Returns `SmcError::Parse` for syntax errors and for semantic errors.
    /// Warnings are errors too when the configuration denies them.
    pub fn analyze(&self, source: &str) -> Result<SemanticStateMachine, SmcError> {
        self.analyze_with_warnings(source)
            .map(|(machine, _warnings)| machine)
    }

    /// Flatten a resolved semantic machine into transition tables.
    pub fn optimize(&self, machine: &SemanticStateMachine) -> OptimizedStateMachine {
        info!("Optimizing state machine");
        let optimized = optimizer::optimize(machine);
        info!(states = optimized.states().len(); "State machine optimized");
        optimized
    }

    /// Run the whole pipeline over `source`.
    ///
    /// The configuration decides whether the result holds the optimized or
    /// the semantic machine.
    ///
    /// # Errors
    ///
    /// Same as [`Compiler::analyze`].
    pub fn compile(&self, source: &str) -> Result<Compiled, SmcError> {
        let (machine, warnings) = self.analyze_with_warnings(source)?;
        let machine = if self.config.compiler().optimize() {
            CompiledMachine::Optimized(self.optimize(&machine))
        } else {
            CompiledMachine::Semantic(machine)
        };
        Ok(Compiled { machine, warnings })
    }

    fn analyze_with_warnings(
        &self,
        source: &str,
    ) -> Result<(SemanticStateMachine, Vec<Diagnostic>), SmcError> {
        let syntax = self.parse(source)?;

        info!("Analyzing state machine");
        let mut machine = smc_parser::analyze(&syntax);
        if !machine.has_errors() {
            smc_parser::resolve_inheritance(&mut machine);
        }

        let deny_warnings = self.config.compiler().deny_warnings();
        let warnings = smc_parser::check_semantics(&machine, deny_warnings).map_err(|err| {
            info!("{}", summary(err.error_count(), "semantic error"));
            SmcError::new_parse_error(err, source)
        })?;

        if !warnings.is_empty() {
            warn!("{}", summary(warnings.len(), "semantic warning"));
        }
        debug!(states = machine.states().len(); "State machine analyzed successfully");
        Ok((machine, warnings))
    }
}

/// One-line count of the problems a phase reported.
fn summary(count: usize, problem: &str) -> String {
    format!("Compiled with {count} {problem}(s).")
}

/// The machine a compilation produced.
#[derive(Debug)]
pub enum CompiledMachine {
    Optimized(OptimizedStateMachine),
    Semantic(SemanticStateMachine),
}

/// Output of [`Compiler::compile`]: the machine plus the semantic warnings
/// found on the way.
#[derive(Debug)]
pub struct Compiled {
    machine: CompiledMachine,
    warnings: Vec<Diagnostic>,
}

impl Compiled {
    pub fn machine(&self) -> &CompiledMachine {
        &self.machine
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn into_machine(self) -> CompiledMachine {
        self.machine
    }
}

impl fmt::Display for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.machine {
            CompiledMachine::Optimized(machine) => write!(f, "{machine}"),
            CompiledMachine::Semantic(machine) => write!(f, "{machine}"),
        }
    }
}
