//! # route-lint-rules
//!
//! Built-in lint rules for route-lint.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | RL001 | `no-closure-route-handler` | Forbids closures as `Route::<verb>` handlers |
//!
//! ## Usage
//!
//! ```ignore
//! use route_lint_core::Analyzer;
//! use route_lint_rules::NoClosureRouteHandler;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./routes")
//!     .rule(NoClosureRouteHandler::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod no_closure_route_handler;
mod registry;

pub use no_closure_route_handler::{Abort, CallSite, NoClosureRouteHandler, Outcome};
pub use registry::{all_rules, rule_by_name};

/// Re-export core types for convenience.
pub use route_lint_core::{Rule, Severity, Violation};
