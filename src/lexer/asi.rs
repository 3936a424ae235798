//! Automatic semicolon insertion.
//!
//! The lexer keeps every `\n` as a `NewLine` token. This pass turns the ones
//! that end a statement into `SEMICOLON("auto")` and drops the rest:
//!
//! - the previous token must be able to end a statement (a closing `)`, `]`
//!   or `}`, a literal, an identifier, `null`, or `return`/`break`/`continue`)
//! - no `(` or `[` group may be open
//! - consecutive newlines collapse, since a semicolon cannot end a statement

use tracing::trace;

use super::tokens::{Token, TokenKind};

pub fn insert_semicolons(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut depth: usize = 0;

    for token in tokens {
        match token.kind {
            TokenKind::NewLine => {
                if depth == 0 && result.last().is_some_and(ends_statement) {
                    trace!(line = token.span.line_number, "inserted semicolon");
                    result.push(Token::auto_semicolon(token.span));
                }
                continue;
            }
            TokenKind::Open | TokenKind::Start => depth += 1,
            TokenKind::Close | TokenKind::Stop => depth = depth.saturating_sub(1),
            _ => {}
        }

        result.push(token);
    }

    result
}

/// Drops every newline marker, for sources that terminate statements
/// explicitly.
pub fn strip_newlines(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .filter(|token| !token.is(TokenKind::NewLine))
        .collect()
}

fn ends_statement(token: &Token) -> bool {
    match token.kind {
        TokenKind::Close
        | TokenKind::End
        | TokenKind::Stop
        | TokenKind::Identifier
        | TokenKind::Null => true,
        TokenKind::Expression => matches!(token.value.as_str(), "return" | "break" | "continue"),
        kind => kind.is_literal(),
    }
}
