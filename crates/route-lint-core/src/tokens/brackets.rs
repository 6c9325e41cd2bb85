//! Bracket table and pair resolution.
//!
//! The set of bracket kinds is closed: parentheses, braces, index brackets
//! and short-array brackets. Everything that needs to know whether a token
//! opens or closes a group goes through [`closer_for`].

use super::{Token, TokenKind};

/// Returns the closer kind for an opener kind, or `None` if `kind` is not
/// an opener.
#[must_use]
pub const fn closer_for(kind: TokenKind) -> Option<TokenKind> {
    match kind {
        TokenKind::OpenParen => Some(TokenKind::CloseParen),
        TokenKind::OpenBrace => Some(TokenKind::CloseBrace),
        TokenKind::OpenBracket => Some(TokenKind::CloseBracket),
        TokenKind::OpenShortArray => Some(TokenKind::CloseShortArray),
        _ => None,
    }
}

/// Returns true if `kind` opens a bracket group.
#[must_use]
pub const fn is_opener(kind: TokenKind) -> bool {
    closer_for(kind).is_some()
}

/// Returns true if `kind` closes a bracket group.
#[must_use]
pub const fn is_closer(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::CloseParen
            | TokenKind::CloseBrace
            | TokenKind::CloseBracket
            | TokenKind::CloseShortArray
    )
}

/// Whether a closer of kind `found` may close an opener of kind `opener`.
///
/// The lexer cannot tell an index `]` from an array `]`, so a raw
/// `CloseBracket` is accepted by both square-bracket openers.
fn closes(opener: TokenKind, found: TokenKind) -> bool {
    match closer_for(opener) {
        Some(TokenKind::CloseShortArray) => {
            matches!(found, TokenKind::CloseBracket | TokenKind::CloseShortArray)
        }
        Some(expected) => expected == found,
        None => false,
    }
}

/// Resolves bracket pairs in place.
///
/// Openers skipped over by a mismatched closer are left unpaired, and a
/// closer with no open counterpart is ignored.
pub(crate) fn pair(tokens: &mut [Token]) {
    let mut stack: Vec<usize> = Vec::new();

    for i in 0..tokens.len() {
        let kind = tokens[i].kind;
        if is_opener(kind) {
            stack.push(i);
            continue;
        }
        if !is_closer(kind) {
            continue;
        }

        let Some(depth) = stack.iter().rposition(|&open| closes(tokens[open].kind, kind)) else {
            continue;
        };

        let open = stack[depth];
        stack.truncate(depth);
        tokens[open].matched = Some(i);
        if tokens[open].kind == TokenKind::OpenShortArray {
            tokens[i].kind = TokenKind::CloseShortArray;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TokenStream;

    fn index_of(stream: &TokenStream, content: &str, nth: usize) -> usize {
        stream
            .iter()
            .filter(|t| t.content == content)
            .nth(nth)
            .map(|t| t.index)
            .unwrap()
    }

    #[test]
    fn test_closer_table() {
        assert_eq!(closer_for(TokenKind::OpenParen), Some(TokenKind::CloseParen));
        assert_eq!(closer_for(TokenKind::OpenBrace), Some(TokenKind::CloseBrace));
        assert_eq!(
            closer_for(TokenKind::OpenBracket),
            Some(TokenKind::CloseBracket)
        );
        assert_eq!(
            closer_for(TokenKind::OpenShortArray),
            Some(TokenKind::CloseShortArray)
        );
        assert_eq!(closer_for(TokenKind::CloseParen), None);
        assert_eq!(closer_for(TokenKind::Comma), None);
    }

    #[test]
    fn test_opener_and_closer_sets_are_disjoint() {
        for kind in [
            TokenKind::OpenParen,
            TokenKind::OpenBrace,
            TokenKind::OpenBracket,
            TokenKind::OpenShortArray,
        ] {
            assert!(is_opener(kind));
            assert!(!is_closer(kind));
            assert!(is_closer(closer_for(kind).unwrap()));
        }
    }

    #[test]
    fn test_nested_pairs() {
        let stream = TokenStream::from_source("<?php f([1, (2)], {3});");
        let outer = index_of(&stream, "(", 0);
        let inner = index_of(&stream, "(", 1);
        assert_eq!(stream.matched_closer(outer), Some(index_of(&stream, ")", 1)));
        assert_eq!(stream.matched_closer(inner), Some(index_of(&stream, ")", 0)));

        let array = index_of(&stream, "[", 0);
        let close = stream.matched_closer(array).unwrap();
        assert_eq!(stream[array].kind, TokenKind::OpenShortArray);
        assert_eq!(stream[close].kind, TokenKind::CloseShortArray);
    }

    #[test]
    fn test_index_access_keeps_close_bracket() {
        let stream = TokenStream::from_source("<?php $a[0];");
        let open = index_of(&stream, "[", 0);
        let close = stream.matched_closer(open).unwrap();
        assert_eq!(stream[open].kind, TokenKind::OpenBracket);
        assert_eq!(stream[close].kind, TokenKind::CloseBracket);
    }

    #[test]
    fn test_unclosed_opener_is_unpaired() {
        let stream = TokenStream::from_source("<?php f([1, 2);");
        let paren = index_of(&stream, "(", 0);
        let array = index_of(&stream, "[", 0);
        assert_eq!(stream.matched_closer(paren), Some(index_of(&stream, ")", 0)));
        assert_eq!(stream.matched_closer(array), None);
    }

    #[test]
    fn test_stray_closer_is_ignored() {
        let stream = TokenStream::from_source("<?php ) f(1);");
        let paren = index_of(&stream, "(", 0);
        assert_eq!(stream.matched_closer(paren), Some(index_of(&stream, ")", 1)));
    }
}
