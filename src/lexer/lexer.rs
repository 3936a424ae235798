use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, trace};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Span, MK_TOKEN,
};

use super::{
    asi::insert_semicolons,
    tokens::{Token, TokenKind, RESERVED_LOOKUP},
};

lazy_static! {
    static ref DECIMAL_NUMBER: Regex =
        Regex::new(r"^[0-9][0-9_]*(\.[0-9_]*)?$").expect("decimal number pattern is valid");
}

/// Hand-written scanner producing one token per call to [`Lexer::next_token`].
///
/// Newlines are kept as `NewLine` tokens so that [`insert_semicolons`] can
/// decide which of them end a statement. Lexical errors never abort the
/// scan: the diagnostic is stored and an `Unexpected` token is returned.
pub struct Lexer {
    chars: Vec<(usize, char)>,
    source_len: usize,
    cursor: usize,
    line_index: usize,
    line_number: usize,
    token_begin: usize,
    token_line_index: usize,
    token_line_number: usize,
    diagnostics: Vec<Error>,
    finished: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.char_indices().collect(),
            source_len: source.len(),
            cursor: 0,
            line_index: 0,
            line_number: 1,
            token_begin: 0,
            token_line_index: 0,
            token_line_number: 1,
            diagnostics: Vec::new(),
            finished: false,
        }
    }

    /// Whether scanning should continue after `token`.
    pub fn has_next(token: &Token) -> bool {
        token.has_next()
    }

    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Scans the next token from the source.
    pub fn next_token(&mut self) -> Token {
        loop {
            while is_whitespace(self.peek()) {
                self.mark();
                if self.advance() == '\n' {
                    return self.make_token(TokenKind::NewLine, String::new());
                }
            }

            if self.peek() == '/' && self.at(1) == '/' {
                while self.has(self.cursor) && self.peek() != '\n' {
                    self.advance();
                }
                continue;
            }

            if self.peek() == '/' && self.at(1) == '*' {
                self.skip(2);
                while self.has(self.cursor) {
                    if self.peek() == '*' && self.at(1) == '/' {
                        self.skip(2);
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }

        self.mark();

        if !self.has(self.cursor) {
            return self.make_token(TokenKind::EOF, String::new());
        }

        let current = self.peek();
        if is_identifier_start(current) {
            self.next_identifier()
        } else if current == '@' {
            self.next_annotation()
        } else if is_operator(current) {
            self.advance();
            self.make_token(TokenKind::Operator, current.to_string())
        } else if let Some(kind) = separator_kind(current) {
            self.advance();
            self.make_token(kind, current.to_string())
        } else if current.is_ascii_digit() {
            self.next_number()
        } else if current == '"' {
            self.next_string_or_char(true)
        } else if current == '\'' {
            self.next_string_or_char(false)
        } else {
            self.advance();
            self.lex_error(ErrorImpl::UnexpectedCharacter { character: current })
        }
    }

    fn next_identifier(&mut self) -> Token {
        // `u123` is an unsigned literal, not an identifier
        if self.peek() == 'u' && self.at(1).is_ascii_digit() {
            self.advance();
            let number = self.next_number();
            if number.is(TokenKind::Unexpected) {
                return number;
            }

            return match number.kind.to_unsigned() {
                Some(kind) => self.make_token(kind, number.value),
                None if matches!(number.kind, TokenKind::Hexadecimal | TokenKind::Binary) => {
                    self.lex_error(ErrorImpl::InvalidUnsignedLiteral {
                        literal: number.value,
                    })
                }
                None => self.lex_error(ErrorImpl::UnsignedFloatingLiteral {
                    literal: number.value,
                }),
            };
        }

        let begin = self.cursor;
        while is_identifier_part(self.peek()) {
            self.advance();
        }

        let word = self.range(begin, self.cursor);
        let kind = RESERVED_LOOKUP
            .get(word.as_str())
            .copied()
            .unwrap_or(TokenKind::Identifier);

        self.make_token(kind, word)
    }

    fn next_annotation(&mut self) -> Token {
        self.skip(1);
        if !is_identifier_start(self.peek()) {
            return self.lex_error(ErrorImpl::UnexpectedCharacter { character: '@' });
        }

        let token = self.next_identifier();
        if !token.is(TokenKind::Identifier) {
            return token;
        }

        self.make_token(TokenKind::Annotation, token.value)
    }

    fn next_number(&mut self) -> Token {
        let begin = self.cursor;

        if self.peek() == '0' && self.at(1) == 'x' {
            self.skip(2);
            while self.peek().is_ascii_hexdigit() {
                self.advance();
            }
            let value = self.range(begin, self.cursor);
            return self.make_token(TokenKind::Hexadecimal, value);
        }

        if self.peek() == '0' && self.at(1) == 'b' {
            self.skip(2);
            while matches!(self.peek(), '0' | '1') {
                self.advance();
            }
            let value = self.range(begin, self.cursor);
            return self.make_token(TokenKind::Binary, value);
        }

        let mut integer = true;
        while is_number_content(self.peek().to_ascii_uppercase()) {
            if self.peek() == '.' {
                if !integer {
                    self.skip_number_content();
                    let literal = self.range(begin, self.cursor);
                    return self.lex_error(ErrorImpl::MultipleDecimalPoints { literal });
                }
                integer = false;
            }

            if let Some(kind) = suffix_kind(self.peek().to_ascii_uppercase()) {
                let value = self.range(begin, self.cursor);
                self.skip(1);

                let integer_only = matches!(
                    kind,
                    TokenKind::Byte | TokenKind::Short | TokenKind::Int | TokenKind::Long
                );
                if !integer && integer_only {
                    self.skip_number_content();
                    return self.lex_error(ErrorImpl::CannotHaveDecimalPoint {
                        literal: self.range(begin, self.cursor),
                        type_: kind.to_string().to_lowercase(),
                    });
                }

                return self.checked_number(kind, value);
            }

            self.skip(1);
        }

        let value = self.range(begin, self.cursor);
        let kind = if integer {
            TokenKind::Int
        } else {
            TokenKind::Double
        };
        self.checked_number(kind, value)
    }

    fn checked_number(&mut self, kind: TokenKind, value: String) -> Token {
        if !DECIMAL_NUMBER.is_match(&value) {
            return self.lex_error(ErrorImpl::MalformedNumber { literal: value });
        }

        self.make_token(kind, value)
    }

    fn skip_number_content(&mut self) {
        while is_number_content(self.peek().to_ascii_uppercase()) {
            self.advance();
        }
    }

    fn next_string_or_char(&mut self, string: bool) -> Token {
        let quote = if string { '"' } else { '\'' };
        let mut content = String::new();
        let mut escape_next = false;
        let mut invalid_escape: Option<Error> = None;

        self.skip(1);

        while self.has(self.cursor) {
            let current = self.peek();

            if escape_next {
                match current {
                    'n' => content.push('\n'),
                    'r' => content.push('\r'),
                    't' => content.push('\t'),
                    '\\' => content.push('\\'),
                    c if c == quote => content.push(c),
                    other => {
                        if invalid_escape.is_none() {
                            let offset = self.offset(self.cursor);
                            invalid_escape = Some(Error::new(
                                ErrorImpl::InvalidEscapeSequence { sequence: other },
                                Span::new(
                                    offset - 1,
                                    offset + other.len_utf8(),
                                    self.line_index.saturating_sub(1),
                                    self.line_number,
                                ),
                            ));
                        }
                    }
                }
                escape_next = false;
            } else if current == '\\' {
                escape_next = true;
            } else if current == quote {
                self.skip(1);

                if let Some(error) = invalid_escape {
                    self.diagnostics.push(error);
                    let text = self.range(self.token_index(), self.cursor);
                    return self.make_token(TokenKind::Unexpected, text);
                }

                let kind = if string {
                    TokenKind::String
                } else {
                    TokenKind::Character
                };
                return self.make_token(kind, content);
            } else {
                content.push(current);
            }

            self.advance();
        }

        if let Some(error) = invalid_escape {
            self.diagnostics.push(error);
        }
        self.lex_error(ErrorImpl::MissingStringTerminator { quote })
    }

    /// Records `error` for the current token and returns an `Unexpected`
    /// token holding the offending text.
    fn lex_error(&mut self, error: ErrorImpl) -> Token {
        let token = self.make_token(
            TokenKind::Unexpected,
            self.range(self.token_index(), self.cursor),
        );
        trace!(token = %token, "lexical error");
        self.diagnostics.push(Error::new(error, token.span));
        token
    }

    fn make_token(&self, kind: TokenKind, value: String) -> Token {
        MK_TOKEN!(
            kind,
            value,
            Span::new(
                self.token_begin,
                self.offset(self.cursor),
                self.token_line_index,
                self.token_line_number,
            )
        )
    }

    fn mark(&mut self) {
        self.token_begin = self.offset(self.cursor);
        self.token_line_index = self.line_index;
        self.token_line_number = self.line_number;
    }

    fn token_index(&self) -> usize {
        self.chars
            .iter()
            .position(|(offset, _)| *offset >= self.token_begin)
            .unwrap_or(self.chars.len())
    }

    fn offset(&self, index: usize) -> usize {
        self.chars
            .get(index)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.source_len)
    }

    fn range(&self, begin: usize, end: usize) -> String {
        self.chars[begin.min(self.chars.len())..end.min(self.chars.len())]
            .iter()
            .map(|(_, c)| *c)
            .collect()
    }

    fn has(&self, index: usize) -> bool {
        index < self.chars.len()
    }

    fn at(&self, ahead: usize) -> char {
        self.chars
            .get(self.cursor + ahead)
            .map(|(_, c)| *c)
            .unwrap_or('\0')
    }

    fn peek(&self) -> char {
        self.at(0)
    }

    fn advance(&mut self) -> char {
        let current = self.peek();
        if !self.has(self.cursor) {
            return current;
        }

        self.cursor += 1;
        if current == '\n' {
            self.line_index = 0;
            self.line_number += 1;
        } else {
            self.line_index += 1;
        }
        current
    }

    fn skip(&mut self, amount: usize) {
        for _ in 0..amount {
            self.advance();
        }
    }
}

impl Iterator for Lexer {
    type Item = Token;

    /// Yields tokens up to and including `EOF`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }

        let token = self.next_token();
        if token.is(TokenKind::EOF) {
            self.finished = true;
        }
        Some(token)
    }
}

/// Scans the whole source without semicolon insertion.
///
/// # Arguments
///
/// * `source` - The source text
/// * `stop_on_first_error` - Stop at the first `Unexpected` token instead of
///   collecting every lexical diagnostic
///
/// # Returns
///
/// The raw token stream (including `NewLine` tokens) and the lexical
/// diagnostics.
pub fn scan(source: &str, stop_on_first_error: bool) -> (Vec<Token>, Vec<Error>) {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let terminal = !Lexer::has_next(&token);
        let eof = token.is(TokenKind::EOF);
        tokens.push(token);

        if eof || (terminal && stop_on_first_error) {
            break;
        }
    }

    debug!(
        tokens = tokens.len(),
        errors = lexer.diagnostics().len(),
        "scanned source"
    );
    (tokens, lexer.take_diagnostics())
}

/// Tokenizes the source and applies automatic semicolon insertion, failing
/// on the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, Error> {
    let (tokens, mut diagnostics) = scan(source, true);
    if !diagnostics.is_empty() {
        return Err(diagnostics.remove(0));
    }

    Ok(insert_semicolons(tokens))
}

/// Tokenizes the whole source, collecting every lexical diagnostic.
pub fn tokenize_all(source: &str) -> (Vec<Token>, Vec<Error>) {
    let (tokens, diagnostics) = scan(source, false);
    (insert_semicolons(tokens), diagnostics)
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_operator(c: char) -> bool {
    matches!(
        c,
        '.' | '=' | '+' | '-' | '*' | '/' | '<' | '>' | '?' | '!' | '^' | '&' | '~' | '$' | '|' | '%'
    )
}

fn separator_kind(c: char) -> Option<TokenKind> {
    match c {
        ';' => Some(TokenKind::Semicolon),
        ':' => Some(TokenKind::Colon),
        ',' => Some(TokenKind::Comma),
        '{' => Some(TokenKind::Begin),
        '}' => Some(TokenKind::End),
        '(' => Some(TokenKind::Open),
        ')' => Some(TokenKind::Close),
        '[' => Some(TokenKind::Start),
        ']' => Some(TokenKind::Stop),
        _ => None,
    }
}

fn suffix_kind(c: char) -> Option<TokenKind> {
    match c {
        'B' => Some(TokenKind::Byte),
        'S' => Some(TokenKind::Short),
        'I' => Some(TokenKind::Int),
        'L' => Some(TokenKind::Long),
        'F' => Some(TokenKind::Float),
        'D' => Some(TokenKind::Double),
        _ => None,
    }
}

fn is_number_content(c: char) -> bool {
    matches!(c, '.' | '_') || c.is_ascii_hexdigit() || suffix_kind(c).is_some()
}
