//! # route-lint-core
//!
//! Core framework for linting PHP sources over a flat token stream.
//!
//! This crate provides the foundational pieces for token-driven rules:
//!
//! - [`TokenStream`] and [`Token`] with precomputed bracket pairs
//! - [`navigation`] helpers for statement boundaries, method lookup and
//!   argument location
//! - [`Rule`] trait for rules triggered on specific [`TokenKind`]s
//! - [`Analyzer`] for orchestrating lint execution
//! - [`Violation`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use route_lint_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./routes")
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod rule;
pub mod tokens;
mod types;

/// Utility modules for rule implementations.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use context::FileContext;
pub use rule::{check_stream, Rule, RuleBox};
pub use tokens::navigation::{self, NavigationError};
pub use tokens::{Token, TokenKind, TokenStream};
pub use types::{LintResult, Location, Severity, Suggestion, Violation, ViolationDiagnostic};
pub use utils::allowance::AllowCheck;
