//! Comment-based allowance directives.
//!
//! Supports directives like:
//! ```text
//! // route-lint: allow(no-closure-route-handler) reason="health check probe"
//! # route-lint: allow(all)
//! /* route-lint: allow(RL001) */
//! ```
//!
//! Directives are read from comment tokens only, so `//` or `#` inside a
//! string literal never starts one. A directive applies to the lines its
//! comment spans and to the line after it.

use std::collections::HashSet;

use crate::tokens::{TokenKind, TokenStream};

const DIRECTIVE_PREFIX: &str = "route-lint:";

/// Result of checking for allow directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowCheck {
    /// Rule is not allowed.
    Denied,
    /// Rule is allowed with optional reason.
    Allowed {
        /// The reason provided (if any).
        reason: Option<String>,
    },
}

impl AllowCheck {
    /// Returns true if allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns the reason if allowed.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allowed { reason } => reason.as_deref(),
            Self::Denied => None,
        }
    }
}

/// Parsed allowance directive.
#[derive(Debug, Clone)]
struct AllowDirective {
    rules: HashSet<String>,
    reason: Option<String>,
}

/// Checks `stream` for an allowance comment covering any of `lines`.
///
/// `names` are the identifiers the rule answers to, typically its name and
/// its code. The special name `all` matches every rule.
///
/// # Arguments
///
/// * `stream` - Token stream of the file
/// * `lines` - Line numbers to check (1-indexed), e.g. the start of the
///   statement and the flagged token
/// * `names` - Names of the rule to check for
#[must_use]
pub fn check_allow_with_reason(stream: &TokenStream, lines: &[usize], names: &[&str]) -> AllowCheck {
    for comment in stream.iter().filter(|t| t.kind == TokenKind::Comment) {
        let last_line = comment.line + comment.content.matches('\n').count();
        if !lines
            .iter()
            .any(|&line| (comment.line..=last_line + 1).contains(&line))
        {
            continue;
        }

        if let Some(directive) = parse_allow_directive(&comment.content) {
            let covered = directive.rules.contains("all")
                || names.iter().any(|name| directive.rules.contains(*name));
            if covered {
                return AllowCheck::Allowed {
                    reason: directive.reason,
                };
            }
        }
    }

    AllowCheck::Denied
}

/// Parses an allowance directive from the text of one comment token.
fn parse_allow_directive(comment: &str) -> Option<AllowDirective> {
    let body = if let Some(block) = comment.strip_prefix("/*") {
        block.trim_end_matches("*/").trim_start_matches('*')
    } else {
        comment
            .strip_prefix("//")
            .or_else(|| comment.strip_prefix('#'))?
    };

    let directive = body.trim().strip_prefix(DIRECTIVE_PREFIX)?.trim();
    let allow_content = directive.strip_prefix("allow(")?.trim();

    let paren_end = allow_content.find(')')?;
    let rules: HashSet<String> = allow_content[..paren_end]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if rules.is_empty() {
        return None;
    }

    let rest = allow_content[paren_end + 1..].trim();
    let reason = rest
        .strip_prefix("reason=")
        .map(str::trim)
        .and_then(|r| r.strip_prefix('"'))
        .and_then(|r| r.find('"').map(|end| r[..end].to_string()));

    Some(AllowDirective { rules, reason })
}
