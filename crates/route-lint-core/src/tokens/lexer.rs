//! PHP tokenizer.
//!
//! Text outside `<?php ... ?>` becomes a single [`TokenKind::InlineHtml`]
//! token per run. Code inside the tags is lexed with `logos`, then the
//! tokenizer runs a contextual pass that the
//! regular grammar cannot express: telling anonymous `function` from named
//! functions, and array-literal `[` from index-access `[`. Lexing never
//! fails; unknown characters become [`TokenKind::Other`].

use logos::Logos;

use super::{Token, TokenKind};

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Raw {
    #[token("<?php", ignore(ascii_case))]
    #[token("<?=")]
    OpenTag,

    #[token("?>")]
    CloseTag,

    #[regex(r"\s+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    #[regex(r"#[^\n]*")]
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    Comment,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*")]
    Variable,

    #[regex(r"'([^'\\]|\\(.|\n))*'")]
    #[regex(r#""([^"\\]|\\(.|\n))*""#)]
    StringLiteral,

    #[token("<<<", heredoc)]
    Heredoc,

    #[regex(r"[0-9][0-9_]*(\.[0-9]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]+")]
    Number,

    #[token("(")]
    OpenParen,
    #[token(")")]
    CloseParen,
    #[token("{")]
    OpenBrace,
    #[token("}")]
    CloseBrace,
    #[token("[")]
    OpenBracket,
    #[token("]")]
    CloseBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("::")]
    DoubleColon,
    #[token("->")]
    #[token("?->")]
    ObjectOperator,
    #[token("=>")]
    DoubleArrow,

    #[regex(r"[^\sA-Za-z0-9_]", priority = 1)]
    Punct,
}

impl Raw {
    fn kind(self) -> TokenKind {
        match self {
            Self::OpenTag => TokenKind::OpenTag,
            Self::CloseTag => TokenKind::CloseTag,
            Self::Whitespace => TokenKind::Whitespace,
            Self::Comment => TokenKind::Comment,
            Self::Identifier => TokenKind::Identifier,
            Self::Variable => TokenKind::Variable,
            Self::StringLiteral => TokenKind::StringLiteral,
            Self::Heredoc => TokenKind::Heredoc,
            Self::Number => TokenKind::Number,
            Self::OpenParen => TokenKind::OpenParen,
            Self::CloseParen => TokenKind::CloseParen,
            Self::OpenBrace => TokenKind::OpenBrace,
            Self::CloseBrace => TokenKind::CloseBrace,
            Self::OpenBracket => TokenKind::OpenBracket,
            Self::CloseBracket => TokenKind::CloseBracket,
            Self::Comma => TokenKind::Comma,
            Self::Semicolon => TokenKind::Semicolon,
            Self::DoubleColon => TokenKind::DoubleColon,
            Self::ObjectOperator => TokenKind::ObjectOperator,
            Self::DoubleArrow => TokenKind::DoubleArrow,
            Self::Punct => TokenKind::Other,
        }
    }
}

/// Consumes a heredoc or nowdoc body after `<<<`.
///
/// The closing label may be indented (PHP 7.3+) and must not be followed
/// by an identifier character.
fn heredoc(lex: &mut logos::Lexer<Raw>) -> bool {
    let rest = lex.remainder();
    let header_len = rest.find('\n').unwrap_or(rest.len());
    let label = rest[..header_len]
        .trim()
        .trim_matches(|c| c == '\'' || c == '"');
    if label.is_empty() || !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }

    let mut pos = header_len;
    while pos < rest.len() {
        let line_start = pos + 1;
        let line_end = rest[line_start..]
            .find('\n')
            .map_or(rest.len(), |n| line_start + n);
        let line = rest[line_start..line_end].trim_start();
        if let Some(after) = line.strip_prefix(label) {
            let ends_label = after
                .chars()
                .next()
                .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'));
            if ends_label {
                let label_end = line_end - after.len();
                lex.bump(label_end);
                return true;
            }
        }
        pos = line_end;
    }

    false
}

/// Identifiers after which `[` still starts an array literal.
const KEYWORDS_BEFORE_ARRAY: &[&str] = &[
    "return", "yield", "echo", "print", "case", "throw", "else", "and", "or", "xor", "as", "in",
    "use", "new", "clone", "include", "require",
];

/// Tokenizes PHP source. Tokens are indexed and positioned but not yet
/// bracket-paired; use [`super::TokenStream::from_source`] for a ready
/// stream.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut cursor = Cursor::default();
    let mut pos = 0;

    while pos < source.len() {
        let rest = &source[pos..];
        let code_start = find_open_tag(rest).unwrap_or(rest.len());
        if code_start > 0 {
            cursor.push(TokenKind::InlineHtml, &rest[..code_start], pos);
            pos += code_start;
            continue;
        }

        let mut lex = Raw::lexer(rest);
        let mut consumed = rest.len();
        while let Some(result) = lex.next() {
            let kind = result.map_or(TokenKind::Other, Raw::kind);
            cursor.push(kind, lex.slice(), pos + lex.span().start);
            if kind == TokenKind::CloseTag {
                consumed = lex.span().end;
                break;
            }
        }
        pos += consumed;
    }

    let mut tokens = cursor.tokens;
    classify(&mut tokens);
    tokens
}

/// Byte offset of the first `<?php` or `<?=` in `text`.
fn find_open_tag(text: &str) -> Option<usize> {
    text.match_indices("<?").map(|(at, _)| at).find(|&at| {
        let tail = &text[at + 2..];
        tail.starts_with('=')
            || tail
                .get(..3)
                .is_some_and(|word| word.eq_ignore_ascii_case("php"))
    })
}

/// Accumulates tokens while tracking line and column.
struct Cursor {
    tokens: Vec<Token>,
    line: usize,
    column: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            line: 1,
            column: 1,
        }
    }
}

impl Cursor {
    fn push(&mut self, kind: TokenKind, content: &str, offset: usize) {
        self.tokens.push(Token {
            index: self.tokens.len(),
            kind,
            content: content.to_string(),
            line: self.line,
            column: self.column,
            offset,
            matched: None,
        });

        for c in content.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }
}

/// Applies the context-dependent kinds.
fn classify(tokens: &mut [Token]) {
    let mut prev: Option<usize> = None;

    for i in 0..tokens.len() {
        match tokens[i].kind {
            TokenKind::Identifier => {
                let word = tokens[i].content.to_ascii_lowercase();
                if word == "function" || word == "fn" {
                    let opens_params = next_is_paren(tokens, i + 1);
                    tokens[i].kind = match (word.as_str(), opens_params) {
                        ("function", true) => TokenKind::Closure,
                        ("function", false) => TokenKind::Function,
                        (_, true) => TokenKind::ArrowFunction,
                        (_, false) => TokenKind::Identifier,
                    };
                }
            }
            TokenKind::OpenBracket => {
                if !prev.is_some_and(|p| ends_value(&tokens[p])) {
                    tokens[i].kind = TokenKind::OpenShortArray;
                }
            }
            _ => {}
        }

        if !tokens[i].kind.is_trivia() {
            prev = Some(i);
        }
    }
}

/// Whether the next significant token from `from` is `(`, looking past a
/// by-reference `&`.
fn next_is_paren(tokens: &[Token], from: usize) -> bool {
    let mut significant = tokens[from.min(tokens.len())..]
        .iter()
        .filter(|t| !t.kind.is_trivia());
    match significant.next() {
        Some(t) if t.kind == TokenKind::OpenParen => true,
        Some(t) if t.content == "&" => significant
            .next()
            .is_some_and(|t| t.kind == TokenKind::OpenParen),
        _ => false,
    }
}

/// Whether a `[` after `token` indexes into a value.
fn ends_value(token: &Token) -> bool {
    match token.kind {
        TokenKind::Variable
        | TokenKind::StringLiteral
        | TokenKind::CloseParen
        | TokenKind::CloseBracket
        | TokenKind::CloseBrace => true,
        TokenKind::Identifier => !KEYWORDS_BEFORE_ARRAY
            .iter()
            .any(|k| token.content.eq_ignore_ascii_case(k)),
        _ => false,
    }
}
