use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
};

/// Read position over a token vector. Reads past the end yield a synthetic
/// EOF token so lookahead never fails.
pub struct TokenCursor {
    tokens: Vec<Token>,
    cursor: usize,
    eof: Token,
}

impl TokenCursor {
    pub fn new(tokens: Vec<Token>) -> Self {
        let eof_span = tokens
            .last()
            .map(|token| token.span)
            .unwrap_or_default();

        TokenCursor {
            tokens,
            cursor: 0,
            eof: Token::eof(eof_span),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn at(&self, index: usize) -> &Token {
        self.tokens.get(index).unwrap_or(&self.eof)
    }

    pub fn peek(&self) -> &Token {
        self.at(self.cursor)
    }

    /// The token `offset` positions after the current one.
    pub fn peek_ahead(&self, offset: usize) -> &Token {
        self.at(self.cursor + offset)
    }

    pub fn get(&mut self) -> Token {
        let token = self.peek().clone();
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
        token
    }

    pub fn is_at_end(&self) -> bool {
        self.peek().is(TokenKind::EOF)
    }

    /// Checks that the current token's kind is one of `kinds` without
    /// consuming it.
    pub fn peek_any(&self, kinds: &[TokenKind]) -> Result<&Token, Error> {
        let token = self.peek();
        if token.is_any(kinds) {
            return Ok(token);
        }

        let expected = kinds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(unexpected(expected, token))
    }

    /// Consumes the current token if its kind is one of `kinds`.
    pub fn get_any(&mut self, kinds: &[TokenKind]) -> Result<Token, Error> {
        self.peek_any(kinds)?;
        Ok(self.get())
    }

    /// Consumes the current token if it has both `kind` and `value`.
    pub fn get_value(&mut self, kind: TokenKind, value: &str) -> Result<Token, Error> {
        if self.peek().is_value(kind, value) {
            return Ok(self.get());
        }
        Err(unexpected(format!("`{}`", value), self.peek()))
    }
}

/// Builds the error for a token that does not fit, telling a premature end
/// of input apart from malformed input.
pub fn unexpected(expected: String, found: &Token) -> Error {
    if found.is(TokenKind::EOF) {
        return Error::at(
            ErrorImpl::UnexpectedEof {
                expected: expected.clone(),
            },
            found,
            format!("expected {} here", expected),
        );
    }

    Error::at(
        ErrorImpl::UnexpectedToken {
            expected: expected.clone(),
            found: found.to_string(),
        },
        found,
        format!("expected {}", expected),
    )
}
