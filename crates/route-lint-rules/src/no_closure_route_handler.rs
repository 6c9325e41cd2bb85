//! Rule to forbid anonymous functions as route handlers.
//!
//! # Rationale
//!
//! Routes whose handler is a closure cannot be serialized by
//! `php artisan route:cache`, keep business logic out of controllers, and
//! are invisible to controller-level middleware and authorization. This
//! rule flags `Route::<verb>(...)` calls whose handler argument is a
//! closure literal.
//!
//! # Detection
//!
//! The rule is triggered on every `::` token and proceeds in stages, any
//! of which may abort silently:
//!
//! 1. the token before `::` must be a monitored receiver (`Route`),
//! 2. an allow-listed verb method must be called before the statement ends,
//! 3. the method name must be followed by a paired `(`,
//! 4. the handler argument must exist: position 3 for `match`, whose first
//!    argument lists HTTP verbs, position 2 for every other verb,
//! 5. the handler must start with a closure literal.
//!
//! Ambiguous shapes never produce a violation.
//!
//! # Configuration
//!
//! - `allow_in_tests`: Skip test files (default: true)
//! - `include_arrow_functions`: Also flag `fn () => ...` handlers (default: false)
//! - `receivers`: Receiver names to monitor (default: `["Route"]`)
//!
//! # Suppression
//!
//! - `// route-lint: allow(no-closure-route-handler) reason="..."` comment

use route_lint_core::navigation::{find_argument, find_method, statement_boundary};
use route_lint_core::utils::allowance::check_allow_with_reason;
use route_lint_core::{
    FileContext, Location, NavigationError, Rule, RuleConfig, Severity, Suggestion, TokenKind,
    TokenStream, Violation,
};
use tracing::{trace, warn};

/// Rule code for no-closure-route-handler.
pub const CODE: &str = "RL001";

/// Rule name for no-closure-route-handler.
pub const NAME: &str = "no-closure-route-handler";

/// Finding kind reported with every violation of this rule.
pub const SUBCODE: &str = "Found";

/// Message reported with every violation of this rule.
pub const MESSAGE: &str = "Closure route handler is forbidden";

/// Route-defining methods on the router facade.
pub const ROUTE_METHODS: &[&str] = &[
    "get", "post", "put", "patch", "delete", "options", "any", "match",
];

/// Methods whose handler is not the second argument.
const HANDLER_POSITIONS: &[(&str, usize)] = &[("match", 3)];

const DEFAULT_HANDLER_POSITION: usize = 2;

const DEFAULT_RECEIVER: &str = "Route";

/// 1-based position of the handler argument for a route method.
#[must_use]
pub fn handler_position(method: &str) -> usize {
    HANDLER_POSITIONS
        .iter()
        .find(|(name, _)| *name == method)
        .map_or(DEFAULT_HANDLER_POSITION, |(_, position)| *position)
}

/// The route call being inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    /// Receiver token (e.g. `Route`).
    pub receiver: usize,
    /// Method name token (e.g. `get`).
    pub method: usize,
    /// The call's `(`.
    pub open_paren: usize,
    /// The call's `)`.
    pub close_paren: usize,
}

/// Why evaluation stopped without reaching a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abort {
    /// The token before `::` is not a monitored receiver.
    NotTargetReceiver,
    /// No allow-listed method is called before the statement ends.
    NoMatchingMethod,
    /// The method name is not followed by a paired `(`.
    NotAFunctionCall,
    /// The call has no argument at the handler position.
    InsufficientArguments {
        /// Number of arguments present.
        found: usize,
        /// Handler position requested.
        requested: usize,
    },
}

/// Result of evaluating one `::` trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler is a closure literal.
    Flagged {
        /// The route call.
        call: CallSite,
        /// The closure keyword token.
        anchor: usize,
    },
    /// The handler is something other than a closure.
    Clean {
        /// The route call.
        call: CallSite,
        /// First token of the handler argument.
        handler: usize,
    },
    /// The trigger is not a route call the rule can judge.
    Aborted(Abort),
}

/// Forbids closures as route handlers.
#[derive(Debug, Clone)]
pub struct NoClosureRouteHandler {
    /// Skip test files.
    pub allow_in_tests: bool,
    /// Also flag arrow functions.
    pub include_arrow_functions: bool,
    /// Receiver names to monitor.
    pub receivers: Vec<String>,
    /// Custom severity.
    pub severity: Severity,
}

impl Default for NoClosureRouteHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl NoClosureRouteHandler {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allow_in_tests: true,
            include_arrow_functions: false,
            receivers: vec![DEFAULT_RECEIVER.to_string()],
            severity: Severity::Error,
        }
    }

    /// Creates the rule from its `[rules.no-closure-route-handler]` block.
    #[must_use]
    pub fn from_config(config: Option<&RuleConfig>) -> Self {
        let rule = Self::new();
        let Some(config) = config else {
            return rule;
        };

        let receivers = config.get_str_array("receivers");
        Self {
            allow_in_tests: config.get_bool("allow_in_tests", rule.allow_in_tests),
            include_arrow_functions: config
                .get_bool("include_arrow_functions", rule.include_arrow_functions),
            receivers: if receivers.is_empty() {
                rule.receivers
            } else {
                receivers
            },
            severity: config.severity.unwrap_or(rule.severity),
        }
    }

    /// Sets whether to skip test files.
    #[must_use]
    pub fn allow_in_tests(mut self, allow: bool) -> Self {
        self.allow_in_tests = allow;
        self
    }

    /// Sets whether arrow functions are flagged too.
    #[must_use]
    pub fn include_arrow_functions(mut self, include: bool) -> Self {
        self.include_arrow_functions = include;
        self
    }

    /// Adds a receiver name to monitor.
    #[must_use]
    pub fn receiver(mut self, name: impl Into<String>) -> Self {
        self.receivers.push(name.into());
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Evaluates the `::` token at `trigger`.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::MalformedBracket`] if the stream holds an
    /// unpaired opener inside the call. Every other failed precondition is
    /// reported as [`Outcome::Aborted`].
    pub fn evaluate(&self, stream: &TokenStream, trigger: usize) -> Result<Outcome, NavigationError> {
        let Some(receiver) = stream
            .prev_non_trivial(trigger)
            .filter(|&r| self.receivers.iter().any(|name| *name == stream[r].content))
        else {
            return Ok(Outcome::Aborted(Abort::NotTargetReceiver));
        };

        let end = statement_boundary(stream, trigger);
        let Some(method) = find_method(stream, trigger, end, ROUTE_METHODS) else {
            return Ok(Outcome::Aborted(Abort::NoMatchingMethod));
        };

        let Some((open_paren, close_paren)) = stream
            .next_non_trivial(method + 1)
            .filter(|&p| stream[p].kind == TokenKind::OpenParen)
            .and_then(|p| stream.matched_closer(p).map(|c| (p, c)))
        else {
            return Ok(Outcome::Aborted(Abort::NotAFunctionCall));
        };

        let call = CallSite {
            receiver,
            method,
            open_paren,
            close_paren,
        };

        let position = handler_position(&stream[method].content);
        let handler = match find_argument(stream, open_paren, position) {
            Ok(handler) => handler,
            Err(NavigationError::InsufficientArguments { found, requested }) => {
                return Ok(Outcome::Aborted(Abort::InsufficientArguments {
                    found,
                    requested,
                }));
            }
            Err(e) => return Err(e),
        };

        Ok(match self.closure_at(stream, handler) {
            Some(anchor) => Outcome::Flagged { call, anchor },
            None => Outcome::Clean { call, handler },
        })
    }

    /// Returns the closure keyword if the argument starting at `start` is a
    /// flagged closure literal, looking past a `static` modifier.
    fn closure_at(&self, stream: &TokenStream, start: usize) -> Option<usize> {
        let token = &stream[start];
        let keyword = if token.kind == TokenKind::Identifier
            && token.content.eq_ignore_ascii_case("static")
        {
            stream.next_non_trivial(start + 1)?
        } else {
            start
        };

        match stream[keyword].kind {
            TokenKind::Closure => Some(keyword),
            TokenKind::ArrowFunction if self.include_arrow_functions => Some(keyword),
            _ => None,
        }
    }

    /// Builds the violation for a flagged closure, honoring allow directives
    /// next to the receiver or the closure.
    fn report(
        &self,
        ctx: &FileContext,
        stream: &TokenStream,
        call: CallSite,
        anchor: usize,
    ) -> Option<Violation> {
        let token = &stream[anchor];
        let location = Location::of_token(ctx.relative_path.clone(), token);

        let lines = [stream[call.receiver].line, token.line];
        let allow_check = check_allow_with_reason(stream, &lines, &[NAME, CODE]);
        if allow_check.is_allowed() {
            if self.requires_allow_reason() && allow_check.reason().is_none() {
                return Some(
                    Violation::new(
                        CODE,
                        NAME,
                        Severity::Warning,
                        location,
                        format!("Allow directive for '{NAME}' is missing required reason"),
                    )
                    .with_subcode("MissingReason")
                    .with_token(anchor)
                    .with_suggestion(Suggestion::new(
                        "Add reason=\"...\" to explain why this exception is necessary",
                    )),
                );
            }
            return None;
        }

        Some(
            Violation::new(CODE, NAME, self.severity, location, MESSAGE)
                .with_subcode(SUBCODE)
                .with_token(anchor)
                .with_suggestion(Suggestion::new(
                    "Move the handler into a controller action, e.g. [UserController::class, 'show']",
                )),
        )
    }
}

impl Rule for NoClosureRouteHandler {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Forbids closures as route handlers"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn triggers(&self) -> &'static [TokenKind] {
        &[TokenKind::DoubleColon]
    }

    fn check(&self, ctx: &FileContext, stream: &TokenStream, index: usize) -> Option<Violation> {
        if self.allow_in_tests && ctx.is_test {
            return None;
        }

        match self.evaluate(stream, index) {
            Ok(Outcome::Flagged { call, anchor }) => self.report(ctx, stream, call, anchor),
            Ok(Outcome::Clean { .. }) => None,
            Ok(Outcome::Aborted(reason)) => {
                trace!(
                    "{}: trigger {} at {}:{} aborted: {:?}",
                    NAME,
                    index,
                    ctx.relative_path.display(),
                    stream[index].line,
                    reason
                );
                None
            }
            Err(e) => {
                warn!(
                    "{}: skipping call at {}:{}: {}",
                    NAME,
                    ctx.relative_path.display(),
                    stream[index].line,
                    e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use route_lint_core::check_stream;
    use std::path::{Path, PathBuf};

    fn check_with(rule: &NoClosureRouteHandler, path: &str, code: &str) -> Vec<Violation> {
        let stream = TokenStream::from_source(code);
        let ctx = FileContext {
            path: Path::new(path),
            content: code,
            is_test: path.starts_with("tests/"),
            relative_path: PathBuf::from(path),
        };
        check_stream(rule, &ctx, &stream)
    }

    fn check_code(code: &str) -> Vec<Violation> {
        check_with(&NoClosureRouteHandler::new(), "routes/web.php", code)
    }

    fn evaluate(code: &str) -> (TokenStream, Result<Outcome, NavigationError>) {
        let stream = TokenStream::from_source(code);
        let trigger = stream
            .iter()
            .find(|t| t.kind == TokenKind::DoubleColon)
            .map(|t| t.index)
            .unwrap();
        let outcome = NoClosureRouteHandler::new().evaluate(&stream, trigger);
        (stream, outcome)
    }

    #[test]
    fn test_handler_positions() {
        assert_eq!(handler_position("get"), 2);
        assert_eq!(handler_position("any"), 2);
        assert_eq!(handler_position("match"), 3);
    }

    #[test]
    fn test_detects_closure_handler() {
        let code = "<?php\n\nRoute::get('/x', function () {\n    return view('x');\n});\n";
        let violations = check_code(code);
        assert_eq!(violations.len(), 1);

        let v = &violations[0];
        assert_eq!(v.code, CODE);
        assert_eq!(v.subcode.as_deref(), Some(SUBCODE));
        assert_eq!(v.message, MESSAGE);
        assert_eq!(v.severity, Severity::Error);
        assert_eq!((v.location.line, v.location.column), (3, 18));
        assert_eq!(v.location.length, "function".len());
        assert_eq!(&code[v.location.offset..v.location.offset + 8], "function");
    }

    #[test]
    fn test_rendered_violation() {
        let violations = check_code("<?php\n\nRoute::post('/x', function () {});\n");
        insta::assert_snapshot!(violations[0].format().trim_end(), @r"
        RL001.Found no-closure-route-handler at routes/web.php:3:19
          error: Closure route handler is forbidden
          = help: Move the handler into a controller action, e.g. [UserController::class, 'show']
        ");
    }

    #[test]
    fn test_anchor_is_closure_token() {
        let (stream, outcome) = evaluate("<?php Route::get('/x', function () {});");
        let Ok(Outcome::Flagged { call, anchor }) = outcome else {
            panic!("expected flagged outcome, got {outcome:?}");
        };
        assert_eq!(stream[anchor].kind, TokenKind::Closure);
        assert_eq!(stream[call.receiver].content, "Route");
        assert_eq!(stream[call.method].content, "get");
        assert_eq!(stream[call.open_paren].kind, TokenKind::OpenParen);
        assert_eq!(stream.matched_closer(call.open_paren), Some(call.close_paren));
    }

    #[test]
    fn test_allows_controller_string() {
        assert!(check_code("<?php Route::get('/x', 'Controller@action');").is_empty());
    }

    #[test]
    fn test_allows_controller_array() {
        let (stream, outcome) =
            evaluate("<?php Route::get('/x', [UserController::class, 'show']);");
        let Ok(Outcome::Clean { handler, .. }) = outcome else {
            panic!("expected clean outcome, got {outcome:?}");
        };
        assert_eq!(stream[handler].kind, TokenKind::OpenShortArray);
    }

    #[test]
    fn test_all_verbs_are_checked() {
        for verb in ["get", "post", "put", "patch", "delete", "options", "any"] {
            let code = format!("<?php Route::{verb}('/x', function () {{}});");
            assert_eq!(check_code(&code).len(), 1, "verb {verb}");
        }
    }

    #[test]
    fn test_match_uses_third_argument() {
        let flagged = check_code("<?php Route::match(['get', 'post'], '/x', function () {});");
        assert_eq!(flagged.len(), 1);

        let clean = check_code("<?php Route::match(['get', 'post'], '/x', 'Controller@action');");
        assert!(clean.is_empty());
    }

    #[test]
    fn test_match_does_not_flag_second_argument() {
        let (_, outcome) = evaluate("<?php Route::match(['get'], function () {});");
        assert_eq!(
            outcome,
            Ok(Outcome::Aborted(Abort::InsufficientArguments {
                found: 2,
                requested: 3
            }))
        );
    }

    #[test]
    fn test_other_receiver_ignored() {
        let (_, outcome) = evaluate("<?php OtherClass::get('/x', function () {});");
        assert_eq!(outcome, Ok(Outcome::Aborted(Abort::NotTargetReceiver)));
        assert!(check_code("<?php OtherClass::get('/x', function () {});").is_empty());
    }

    #[test]
    fn test_method_not_in_allow_list() {
        let (_, outcome) = evaluate("<?php Route::resource('/x', Controller::class);");
        assert_eq!(outcome, Ok(Outcome::Aborted(Abort::NoMatchingMethod)));
        assert!(check_code("<?php Route::resource('/x', Controller::class);").is_empty());
    }

    #[test]
    fn test_array_handler_with_internal_comma() {
        let (stream, outcome) =
            evaluate("<?php Route::get('/x', ['middleware' => 'auth', 'handler']);");
        let Ok(Outcome::Clean { call, handler }) = outcome else {
            panic!("expected clean outcome, got {outcome:?}");
        };
        assert_eq!(stream[handler].kind, TokenKind::OpenShortArray);
        assert_eq!(handler, stream.next_non_trivial(call.open_paren + 4).unwrap());
    }

    #[test]
    fn test_missing_handler_aborts_silently() {
        let (_, outcome) = evaluate("<?php Route::get('/x');");
        assert_eq!(
            outcome,
            Ok(Outcome::Aborted(Abort::InsufficientArguments {
                found: 1,
                requested: 2
            }))
        );
        assert!(check_code("<?php Route::get('/x');").is_empty());
    }

    #[test]
    fn test_unclosed_call_is_not_a_function_call() {
        let (_, outcome) = evaluate("<?php Route::get('/x', function () {}");
        assert_eq!(outcome, Ok(Outcome::Aborted(Abort::NotAFunctionCall)));
        assert!(check_code("<?php Route::get('/x', function () {}").is_empty());
    }

    #[test]
    fn test_malformed_nested_bracket_is_contract_violation() {
        let code = "<?php Route::match([, '/x', function () {});";
        let (stream, outcome) = evaluate(code);
        let array = stream
            .iter()
            .find(|t| t.content == "[")
            .map(|t| t.index)
            .unwrap();
        assert_eq!(outcome, Err(NavigationError::MalformedBracket { index: array }));
        assert!(check_code(code).is_empty());
    }

    #[test]
    fn test_chained_route_definition() {
        let violations = check_code(
            "<?php Route::middleware('auth')->get('/x', function () {})->name('x');",
        );
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_nested_group_reports_once() {
        let violations = check_code(
            "<?php
Route::prefix('admin')->group(function () {
    Route::get('/users', function () {});
    Route::post('/users', [UserController::class, 'store']);
});
",
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.line, 3);
    }

    #[test]
    fn test_fully_qualified_receiver() {
        let violations =
            check_code("<?php \\Illuminate\\Support\\Facades\\Route::get('/x', function () {});");
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn test_static_closure() {
        let violations = check_code("<?php Route::get('/x', static function () {});");
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].location.column, 31);
    }

    #[test]
    fn test_arrow_functions_opt_in() {
        let code = "<?php Route::get('/x', fn () => view('x'));";
        assert!(check_code(code).is_empty());

        let rule = NoClosureRouteHandler::new().include_arrow_functions(true);
        assert_eq!(check_with(&rule, "routes/web.php", code).len(), 1);
    }

    #[test]
    fn test_closure_in_other_argument_ignored() {
        assert!(check_code("<?php Route::get(function () {}, 'Controller@action');").is_empty());
    }

    #[test]
    fn test_skips_test_files_by_default() {
        let code = "<?php Route::get('/x', function () {});";
        let rule = NoClosureRouteHandler::new();
        assert!(check_with(&rule, "tests/Feature/RoutesTest.php", code).is_empty());

        let strict = NoClosureRouteHandler::new().allow_in_tests(false);
        assert_eq!(
            check_with(&strict, "tests/Feature/RoutesTest.php", code).len(),
            1
        );
    }

    #[test]
    fn test_custom_receiver() {
        let code = "<?php Router::get('/x', function () {});";
        assert!(check_code(code).is_empty());

        let rule = NoClosureRouteHandler::new().receiver("Router");
        assert_eq!(check_with(&rule, "routes/web.php", code).len(), 1);
    }

    #[test]
    fn test_from_config() {
        let config = route_lint_core::Config::parse(
            r#"
[rules.no-closure-route-handler]
severity = "warning"
include_arrow_functions = true
receivers = ["Router"]
"#,
        )
        .unwrap();
        let rule = NoClosureRouteHandler::from_config(config.rule(NAME));
        assert_eq!(rule.severity, Severity::Warning);
        assert!(rule.include_arrow_functions);
        assert!(rule.allow_in_tests);
        assert_eq!(rule.receivers, vec!["Router"]);

        let defaults = NoClosureRouteHandler::from_config(None);
        assert_eq!(defaults.receivers, vec!["Route"]);
    }

    #[test]
    fn test_allows_with_reason() {
        let violations = check_code(
            "<?php
// route-lint: allow(no-closure-route-handler) reason=\"health probe\"
Route::get('/up', function () {});
",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_inline_html_does_not_hide_routes() {
        let violations = check_code(
            "<p>Don't cache me</p>\n<?php Route::get('/x', function () {}); ?>\n<p>It's done</p>\n",
        );
        assert_eq!(violations.len(), 1);
        assert_eq!((violations[0].location.line, violations[0].location.column), (2, 24));
    }

    #[test]
    fn test_allow_with_comment_markers_in_strings() {
        let violations = check_code(
            "<?php
Route::get('/r', function () { return redirect('https://x.io'); }); // route-lint: allow(RL001) reason=\"legacy\"
Route::get('/docs#top', function () {}); # route-lint: allow(RL001) reason=\"legacy\"
",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_allow_above_multi_line_call() {
        let violations = check_code(
            "<?php
// route-lint: allow(no-closure-route-handler) reason=\"health probe\"
Route::get('/up',
    function () {
        return 'ok';
    });
",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_allow_above_closure_line() {
        let violations = check_code(
            "<?php
Route::get('/up',
    // route-lint: allow(RL001) reason=\"health probe\"
    function () {});
",
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn test_allow_without_reason_warns() {
        let violations = check_code(
            "<?php
Route::get('/up', function () {}); // route-lint: allow(RL001)
",
        );
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].severity, Severity::Warning);
        assert_eq!(violations[0].subcode.as_deref(), Some("MissingReason"));
        assert!(violations[0].message.contains("missing required reason"));
    }
}
