//! Rule registry used by the CLI.

use crate::no_closure_route_handler::{self, NoClosureRouteHandler};
use route_lint_core::{Config, RuleBox};

/// Builds one rule by name or code, configured from `config`.
///
/// Returns `None` for unknown names.
#[must_use]
pub fn rule_by_name(name: &str, config: &Config) -> Option<RuleBox> {
    match name {
        no_closure_route_handler::NAME | no_closure_route_handler::CODE => Some(Box::new(
            NoClosureRouteHandler::from_config(config.rule(no_closure_route_handler::NAME)),
        )),
        _ => None,
    }
}

/// Returns every built-in rule, configured from `config`.
#[must_use]
pub fn all_rules(config: &Config) -> Vec<RuleBox> {
    vec![Box::new(NoClosureRouteHandler::from_config(
        config.rule(no_closure_route_handler::NAME),
    ))]
}
