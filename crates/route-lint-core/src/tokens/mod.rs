//! Flat token model for PHP sources.
//!
//! Rules never see a parse tree. They walk a [`TokenStream`]: an ordered,
//! read-only sequence of [`Token`]s in which every bracket opener carries
//! the index of its matching closer. The stream is built once per file and
//! shared by every rule invocation for that file.

pub mod brackets;
mod lexer;
pub mod navigation;

use serde::{Deserialize, Serialize};
use std::ops::Index;

pub use brackets::{closer_for, is_closer, is_opener};
pub use lexer::tokenize;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenKind {
    /// `<?php` or `<?=`.
    OpenTag,
    /// `?>`.
    CloseTag,
    /// Text outside PHP tags.
    InlineHtml,
    /// Spaces, tabs, and newlines.
    Whitespace,
    /// Line or block comment.
    Comment,
    /// Bare name: keywords, class names, function and method names.
    Identifier,
    /// `$name`.
    Variable,
    /// Single- or double-quoted string.
    StringLiteral,
    /// Heredoc or nowdoc body including its labels.
    Heredoc,
    /// Integer or float literal.
    Number,
    /// `(`.
    OpenParen,
    /// `)`.
    CloseParen,
    /// `{`.
    OpenBrace,
    /// `}`.
    CloseBrace,
    /// `[` used for index access.
    OpenBracket,
    /// `]` closing an index access.
    CloseBracket,
    /// `[` opening an array literal.
    OpenShortArray,
    /// `]` closing an array literal.
    CloseShortArray,
    /// `,`.
    Comma,
    /// `;`.
    Semicolon,
    /// `::`, the static member access operator.
    DoubleColon,
    /// `->`.
    ObjectOperator,
    /// `=>`.
    DoubleArrow,
    /// `function` keyword opening an anonymous function.
    Closure,
    /// `fn` keyword opening an arrow function.
    ArrowFunction,
    /// `function` keyword of a named function or method.
    Function,
    /// Anything else (operators, stray characters).
    Other,
}

impl TokenKind {
    /// Returns true for whitespace, comments and inline HTML.
    #[must_use]
    pub fn is_trivia(self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment | Self::InlineHtml)
    }
}

/// A single lexical token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Position in the stream (0-indexed).
    pub index: usize,
    /// Token kind.
    pub kind: TokenKind,
    /// Raw source text.
    pub content: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in characters).
    pub column: usize,
    /// Byte offset of the first character.
    pub offset: usize,
    /// Index of the matching closer. Only ever set on opener kinds.
    pub matched: Option<usize>,
}

impl Token {
    /// Creates an unpositioned token. Index, position and pairing are
    /// assigned when the token is placed into a [`TokenStream`].
    #[must_use]
    pub fn new(kind: TokenKind, content: impl Into<String>) -> Self {
        Self {
            index: 0,
            kind,
            content: content.into(),
            line: 1,
            column: 1,
            offset: 0,
            matched: None,
        }
    }

    /// Byte length of the token's source text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the token has no source text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Ordered token sequence for one file.
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Lexes PHP source into a fully classified and paired stream.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        Self::from_tokens(tokenize(source))
    }

    /// Builds a stream from tokens, re-indexing them and resolving
    /// bracket pairs.
    #[must_use]
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        for (index, token) in tokens.iter_mut().enumerate() {
            token.index = index;
            token.matched = None;
        }
        brackets::pair(&mut tokens);
        Self { tokens }
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the stream holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Returns the token at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Iterates over all tokens in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Index of the matching closer of the opener at `index`.
    #[must_use]
    pub fn matched_closer(&self, index: usize) -> Option<usize> {
        self.tokens.get(index).and_then(|t| t.matched)
    }

    /// First non-trivia token at or after `from`.
    #[must_use]
    pub fn next_non_trivial(&self, from: usize) -> Option<usize> {
        self.tokens
            .iter()
            .skip(from)
            .find(|t| !t.kind.is_trivia())
            .map(|t| t.index)
    }

    /// Last non-trivia token strictly before `before`.
    #[must_use]
    pub fn prev_non_trivial(&self, before: usize) -> Option<usize> {
        self.tokens
            .get(..before.min(self.tokens.len()))?
            .iter()
            .rev()
            .find(|t| !t.kind.is_trivia())
            .map(|t| t.index)
    }

    /// First token in `start..=end` whose kind is one of `kinds`.
    #[must_use]
    pub fn find_next(&self, kinds: &[TokenKind], start: usize, end: usize) -> Option<usize> {
        if start > end {
            return None;
        }
        self.tokens
            .get(start..=end.min(self.tokens.len().saturating_sub(1)))?
            .iter()
            .find(|t| kinds.contains(&t.kind))
            .map(|t| t.index)
    }
}

impl Index<usize> for TokenStream {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
