//! Rule trait for defining lint rules.

use crate::context::FileContext;
use crate::tokens::{TokenKind, TokenStream};
use crate::types::{Severity, Violation};

/// A per-file lint rule driven by token triggers.
///
/// A rule registers interest in one or more [`TokenKind`]s. The analyzer
/// calls [`Rule::check`] once for every token of those kinds, passing the
/// whole file's stream and the trigger's index. Each call is independent
/// and may report at most one violation.
///
/// # Example
///
/// ```ignore
/// use route_lint_core::{FileContext, Rule, TokenKind, TokenStream, Violation};
///
/// pub struct NoEval;
///
/// impl Rule for NoEval {
///     fn name(&self) -> &'static str { "no-eval" }
///     fn code(&self) -> &'static str { "RL900" }
///     fn triggers(&self) -> &'static [TokenKind] { &[TokenKind::Identifier] }
///
///     fn check(&self, ctx: &FileContext, stream: &TokenStream, index: usize) -> Option<Violation> {
///         (stream[index].content == "eval").then(|| /* build violation */ todo!())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "no-closure-route-handler").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "RL001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for violations from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Whether this rule requires a reason when using allow directives.
    ///
    /// By default, rules with `Severity::Error` require a reason.
    fn requires_allow_reason(&self) -> bool {
        self.default_severity() == Severity::Error
    }

    /// Token kinds this rule is invoked on.
    fn triggers(&self) -> &'static [TokenKind];

    /// Checks one trigger token.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Context about the file being checked
    /// * `stream` - The file's token stream
    /// * `index` - Index of the trigger token in `stream`
    fn check(&self, ctx: &FileContext, stream: &TokenStream, index: usize) -> Option<Violation>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

/// Runs `rule` on every trigger token of `stream`.
#[must_use]
pub fn check_stream(rule: &dyn Rule, ctx: &FileContext, stream: &TokenStream) -> Vec<Violation> {
    let triggers = rule.triggers();
    stream
        .iter()
        .filter(|t| triggers.contains(&t.kind))
        .filter_map(|t| rule.check(ctx, stream, t.index))
        .collect()
}
