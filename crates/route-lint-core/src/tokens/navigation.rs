//! Token-stream navigation for call-shaped rules.
//!
//! These helpers answer three questions about a flat [`TokenStream`]
//! without building a tree:
//!
//! - where does the statement containing a token end
//!   ([`statement_boundary`]),
//! - which allow-listed method does a call chain invoke ([`find_method`]),
//! - where does the Nth argument of a call start ([`find_argument`]).
//!
//! All of them jump over nested bracket groups through the precomputed
//! pair links, so separators inside arrays, nested calls or closure bodies
//! are never mistaken for separators of the call being inspected.

use thiserror::Error;

use super::brackets::{is_closer, is_opener};
use super::{TokenKind, TokenStream};

/// Errors raised while locating call arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NavigationError {
    /// The call has fewer arguments than requested.
    #[error("call has {found} argument(s), argument {requested} was requested")]
    InsufficientArguments {
        /// Number of arguments seen before the call closed.
        found: usize,
        /// 1-based position that was requested.
        requested: usize,
    },

    /// An opener has no matching closer.
    #[error("bracket at token {index} has no matching closer")]
    MalformedBracket {
        /// Index of the unpaired opener.
        index: usize,
    },
}

/// Returns the index of the token that ends the statement containing
/// `start`.
///
/// The statement ends at a `;` or `?>`, or at a `,` or closer belonging to
/// an enclosing group. When none is found the last index of the stream is
/// returned.
#[must_use]
pub fn statement_boundary(stream: &TokenStream, start: usize) -> usize {
    let last = stream.len().saturating_sub(1);
    let mut cursor = start;

    while let Some(token) = stream.get(cursor) {
        match token.kind {
            TokenKind::Semicolon | TokenKind::CloseTag => return cursor,
            TokenKind::Comma if cursor > start => return cursor,
            kind if is_closer(kind) && cursor > start => return cursor,
            kind if is_opener(kind) => match token.matched {
                Some(closer) => cursor = closer + 1,
                None => return last,
            },
            _ => cursor += 1,
        }
    }

    last
}

/// Finds the first call to an allow-listed method in `(start, end]`.
///
/// A candidate is an identifier whose next significant token is `(`.
/// Candidates outside `allow` are skipped. Bracket groups are jumped, so
/// only calls at the chain's own nesting level are considered.
#[must_use]
pub fn find_method(stream: &TokenStream, start: usize, end: usize, allow: &[&str]) -> Option<usize> {
    let mut cursor = start + 1;

    while cursor <= end {
        let token = stream.get(cursor)?;

        if token.kind == TokenKind::Identifier && allow.contains(&token.content.as_str()) {
            let next = stream.next_non_trivial(cursor + 1);
            if next.is_some_and(|n| stream[n].kind == TokenKind::OpenParen) {
                return Some(cursor);
            }
        }

        match token.matched {
            Some(closer) if is_opener(token.kind) => cursor = closer + 1,
            _ => cursor += 1,
        }
    }

    None
}

/// Returns the first significant token of argument `position` (1-based)
/// of the call whose `(` is at `open`.
///
/// # Errors
///
/// - [`NavigationError::MalformedBracket`] if `open`, or a group nested
///   before the requested argument, has no matching closer.
/// - [`NavigationError::InsufficientArguments`] if the call closes before
///   the requested argument starts.
pub fn find_argument(
    stream: &TokenStream,
    open: usize,
    position: usize,
) -> Result<usize, NavigationError> {
    let closer = stream
        .matched_closer(open)
        .ok_or(NavigationError::MalformedBracket { index: open })?;

    let mut cursor = open + 1;
    let mut remaining = position.saturating_sub(1);

    while cursor < closer && remaining > 0 {
        let token = &stream[cursor];
        if is_opener(token.kind) {
            let nested = token
                .matched
                .ok_or(NavigationError::MalformedBracket { index: cursor })?;
            cursor = nested + 1;
            continue;
        }
        if token.kind == TokenKind::Comma {
            remaining -= 1;
        }
        cursor += 1;
    }

    if remaining != 0 {
        return Err(NavigationError::InsufficientArguments {
            found: position - remaining,
            requested: position,
        });
    }

    match stream.next_non_trivial(cursor) {
        Some(start) if start < closer => Ok(start),
        _ => Err(NavigationError::InsufficientArguments {
            found: position.saturating_sub(1),
            requested: position,
        }),
    }
}
