use std::fmt::Display;

use thiserror::Error;
use tracing::{error, warn};

use crate::{lexer::tokens::Token, Span};

/// How bad a diagnostic is. Only `Error` blocks code generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// A source-anchored note attached to a diagnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub token: Token,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    span: Span,
    annotations: Vec<Annotation>,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, span: Span) -> Self {
        Error {
            internal_error: error_impl,
            span,
            annotations: Vec::new(),
        }
    }

    /// Creates an error anchored at `token`, carrying the token itself as the
    /// first annotation.
    pub fn at(error_impl: ErrorImpl, token: &Token, message: impl Into<String>) -> Self {
        Error::new(error_impl, token.span).with_annotation(token, message)
    }

    pub fn with_annotation(mut self, token: &Token, message: impl Into<String>) -> Self {
        self.annotations.push(Annotation {
            token: token.clone(),
            message: message.into(),
        });
        self
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }

    pub fn get_internal_error(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn code(&self) -> u32 {
        match &self.internal_error {
            ErrorImpl::UnexpectedCharacter { .. }
            | ErrorImpl::MalformedNumber { .. }
            | ErrorImpl::UnsignedFloatingLiteral { .. } => 101,
            ErrorImpl::InvalidEscapeSequence { .. } => 102,
            ErrorImpl::MissingStringTerminator { .. } => 103,
            ErrorImpl::InvalidUnsignedLiteral { .. } => 104,
            ErrorImpl::MultipleDecimalPoints { .. } => 105,
            ErrorImpl::CannotHaveDecimalPoint { .. } => 106,
            ErrorImpl::UnexpectedToken { .. } => 201,
            ErrorImpl::UnexpectedEof { .. } => 202,
            ErrorImpl::InvalidStatement { .. } => 203,
            ErrorImpl::InvalidValue { .. } => 204,
            ErrorImpl::NumberParseError { .. } => 205,
            ErrorImpl::UnknownOperator { .. } => 206,
            ErrorImpl::MissingAlgorithm { .. } => 207,
            ErrorImpl::UnknownVariable { .. } => 301,
            ErrorImpl::UnknownMethod { .. } => 302,
            ErrorImpl::ImmutableAssign { .. } => 303,
            ErrorImpl::InvalidOperands { .. } => 304,
            ErrorImpl::VoidValue { .. } => 305,
            ErrorImpl::MixedTupleMemberNames => 306,
            ErrorImpl::UnsupportedOperator { .. } => 307,
            ErrorImpl::MismatchedTypes { .. } => 308,
            ErrorImpl::UnresolvedNode { .. } => 401,
            ErrorImpl::Backend { .. } => 402,
        }
    }

    pub fn severity(&self) -> Severity {
        match &self.internal_error {
            ErrorImpl::MixedTupleMemberNames => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn is_lexical(&self) -> bool {
        (101..200).contains(&self.code())
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnexpectedCharacter { .. } => "UnexpectedCharacter",
            ErrorImpl::MalformedNumber { .. } => "MalformedNumber",
            ErrorImpl::UnsignedFloatingLiteral { .. } => "UnsignedFloatingLiteral",
            ErrorImpl::InvalidEscapeSequence { .. } => "InvalidEscapeSequence",
            ErrorImpl::MissingStringTerminator { .. } => "MissingStringTerminator",
            ErrorImpl::InvalidUnsignedLiteral { .. } => "InvalidUnsignedLiteral",
            ErrorImpl::MultipleDecimalPoints { .. } => "MultipleDecimalPoints",
            ErrorImpl::CannotHaveDecimalPoint { .. } => "CannotHaveDecimalPoint",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedEof { .. } => "UnexpectedEof",
            ErrorImpl::InvalidStatement { .. } => "InvalidStatement",
            ErrorImpl::InvalidValue { .. } => "InvalidValue",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnknownOperator { .. } => "UnknownOperator",
            ErrorImpl::MissingAlgorithm { .. } => "MissingAlgorithm",
            ErrorImpl::UnknownVariable { .. } => "UnknownVariable",
            ErrorImpl::UnknownMethod { .. } => "UnknownMethod",
            ErrorImpl::ImmutableAssign { .. } => "ImmutableAssign",
            ErrorImpl::InvalidOperands { .. } => "InvalidOperands",
            ErrorImpl::VoidValue { .. } => "VoidValue",
            ErrorImpl::MixedTupleMemberNames => "MixedTupleMemberNames",
            ErrorImpl::UnsupportedOperator { .. } => "UnsupportedOperator",
            ErrorImpl::MismatchedTypes { .. } => "MismatchedTypes",
            ErrorImpl::UnresolvedNode { .. } => "UnresolvedNode",
            ErrorImpl::Backend { .. } => "Backend",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnexpectedCharacter { .. } => ErrorTip::None,
            ErrorImpl::MalformedNumber { literal } => ErrorTip::Suggestion(format!(
                "`{}` is not a number, only `B`, `S`, `I`, `L`, `F` and `D` may follow the digits",
                literal
            )),
            ErrorImpl::UnsignedFloatingLiteral { .. } => ErrorTip::Suggestion(String::from(
                "Only `byte`, `short`, `int` and `long` literals can be unsigned",
            )),
            ErrorImpl::InvalidEscapeSequence { .. } => ErrorTip::Suggestion(String::from(
                "Supported escapes are `\\n`, `\\r`, `\\t`, `\\\\` and the escaped quote",
            )),
            ErrorImpl::MissingStringTerminator { quote } => {
                ErrorTip::Suggestion(format!("Add a closing `{}`", quote))
            }
            ErrorImpl::InvalidUnsignedLiteral { .. } => ErrorTip::Suggestion(String::from(
                "Hexadecimal and binary literals cannot take the `u` prefix",
            )),
            ErrorImpl::MultipleDecimalPoints { .. } => ErrorTip::None,
            ErrorImpl::CannotHaveDecimalPoint { type_, .. } => ErrorTip::Suggestion(format!(
                "Use the `F` or `D` suffix instead of `{}` for floating-point data",
                type_
            )),
            ErrorImpl::UnexpectedToken { expected, .. } => {
                ErrorTip::Suggestion(format!("Expected {}, did you miss a semicolon?", expected))
            }
            ErrorImpl::UnexpectedEof { expected } => {
                ErrorTip::Suggestion(format!("Input ended while expecting {}", expected))
            }
            ErrorImpl::InvalidStatement { .. } => ErrorTip::Suggestion(String::from(
                "Statements start with `let`, `mut`, `return`, an assignment or a call",
            )),
            ErrorImpl::InvalidValue { .. } => ErrorTip::None,
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnknownOperator { .. } => ErrorTip::None,
            ErrorImpl::MissingAlgorithm { .. } => ErrorTip::None,
            ErrorImpl::UnknownVariable { name } => {
                ErrorTip::Suggestion(format!("Declare `{}` before using it", name))
            }
            ErrorImpl::UnknownMethod { .. } => ErrorTip::Suggestion(String::from(
                "Check the argument types against the declared overloads",
            )),
            ErrorImpl::ImmutableAssign { name } => ErrorTip::Suggestion(format!(
                "Consider changing `let` to `mut` to make `{}` mutable",
                name
            )),
            ErrorImpl::InvalidOperands { .. } => ErrorTip::Suggestion(String::from(
                "Both operands must be non-array values of a primitive type",
            )),
            ErrorImpl::VoidValue { .. } => ErrorTip::None,
            ErrorImpl::MixedTupleMemberNames => ErrorTip::Suggestion(String::from(
                "Name every tuple member or none of them",
            )),
            ErrorImpl::UnsupportedOperator { .. } => ErrorTip::Suggestion(String::from(
                "Only `+`, `-`, `*` and `/` can be lowered at the moment",
            )),
            ErrorImpl::MismatchedTypes { expected, .. } => ErrorTip::Suggestion(format!(
                "Only arithmetic values convert implicitly, provide a `{}` here",
                expected
            )),
            ErrorImpl::UnresolvedNode { .. } => ErrorTip::None,
            ErrorImpl::Backend { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "error[E{}]: {}", self.code(), self.internal_error)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unexpected character: `{character}`")]
    UnexpectedCharacter { character: char },
    #[error("malformed number literal: `{literal}`")]
    MalformedNumber { literal: String },
    #[error("invalid unsigned number literal: `{literal}`")]
    UnsignedFloatingLiteral { literal: String },
    #[error("invalid escape sequence: `\\{sequence}`")]
    InvalidEscapeSequence { sequence: char },
    #[error("missing trailing `{quote}` symbol to terminate the literal")]
    MissingStringTerminator { quote: char },
    #[error("invalid unsigned literal: `{literal}`")]
    InvalidUnsignedLiteral { literal: String },
    #[error("floating point number cannot have multiple dot symbols: `{literal}`")]
    MultipleDecimalPoints { literal: String },
    #[error("`{type_}` type cannot have floating-point data: `{literal}`")]
    CannotHaveDecimalPoint { literal: String, type_: String },
    #[error("unexpected token: expected {expected}, found {found:?}")]
    UnexpectedToken { expected: String, found: String },
    #[error("unexpected end of file: expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("invalid statement starting with {token:?}")]
    InvalidStatement { token: String },
    #[error("invalid value {token:?}")]
    InvalidValue { token: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unknown operator {operator:?}")]
    UnknownOperator { operator: String },
    #[error("no parser algorithm produces `{production}`")]
    MissingAlgorithm { production: String },
    #[error("no such variable `{name}`")]
    UnknownVariable { name: String },
    #[error("No such method `{signature}`")]
    UnknownMethod { signature: String },
    #[error("cannot assign twice to immutable variable `{name}`")]
    ImmutableAssign { name: String },
    #[error("cannot apply `{operator}` to `{left}` and `{right}`")]
    InvalidOperands {
        operator: String,
        left: String,
        right: String,
    },
    #[error("`{name}` does not produce a value")]
    VoidValue { name: String },
    #[error("tuple members must be either all named or all unnamed")]
    MixedTupleMemberNames,
    #[error("operator `{operator}` is not supported here")]
    UnsupportedOperator { operator: String },
    #[error("mismatched types: expected `{expected}`, found `{found}`")]
    MismatchedTypes { expected: String, found: String },
    #[error("cannot generate code for unresolved {kind}")]
    UnresolvedNode { kind: String },
    #[error("code generation failed: {message}")]
    Backend { message: String },
}

/// Accumulates diagnostics for one compilation.
///
/// Every reported diagnostic is also logged, as a warning or an error
/// depending on its severity.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn report(&mut self, diagnostic: Error) {
        match diagnostic.severity() {
            Severity::Error => error!(
                code = diagnostic.code(),
                line = diagnostic.get_span().line_number,
                "{}",
                diagnostic
            ),
            Severity::Warning => warn!(
                code = diagnostic.code(),
                line = diagnostic.get_span().line_number,
                "{}",
                diagnostic
            ),
        }
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Error>) {
        for diagnostic in diagnostics {
            self.report(diagnostic);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|diagnostic| diagnostic.severity() == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.entries
            .iter()
            .filter(|diagnostic| diagnostic.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Error> {
        self.entries
            .iter()
            .filter(|diagnostic| diagnostic.severity() == Severity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.entries.iter()
    }

    pub fn codes(&self) -> Vec<u32> {
        self.entries.iter().map(Error::code).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.entries
    }
}
