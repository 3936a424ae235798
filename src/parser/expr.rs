use crate::{
    ast::{
        ast::{Node, Resolution, Value},
        expressions::{BinaryOperation, ConstantLiteral, MethodCall, NameAccess},
        operators::Operator,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    MK_TOKEN,
};

use super::{lookups::Parsed, parser::Parser};

/// Tokens allowed right after a literal.
const LITERAL_FOLLOWERS: [TokenKind; 8] = [
    TokenKind::Semicolon,
    TokenKind::Colon,
    TokenKind::Close,
    TokenKind::Comma,
    TokenKind::Stop,
    TokenKind::End,
    TokenKind::Operator,
    TokenKind::EOF,
];

/// A literal or an access, optionally followed by an operator and another
/// value. Chains associate to the right and have no precedence.
pub fn parse_value(parser: &mut Parser) -> Result<Parsed, Error> {
    let left = if parser.peek().is_literal() {
        parser.next_literal()?
    } else if parser.peek().is(TokenKind::Identifier) {
        parser.next_access()?
    } else {
        return Err(invalid_value(parser.peek()));
    };

    if !parser.peek().is(TokenKind::Operator) {
        return Ok(Parsed::Node(left));
    }

    let (operator, operator_token) = parser.next_operator()?;
    let right = parser.next_value()?;

    Ok(Parsed::Node(parser.alloc(Node::Value(
        Value::BinaryOperation(BinaryOperation {
            left,
            operator,
            operator_token,
            right,
            value_type: Resolution::Unresolved,
        }),
    ))))
}

pub fn parse_literal(parser: &mut Parser) -> Result<Parsed, Error> {
    let token = parser.cursor_mut().get_any(&TokenKind::LITERALS)?;

    if !parser.peek().is_any(&LITERAL_FOLLOWERS) {
        return Err(invalid_value(parser.peek()));
    }

    let literal = ConstantLiteral::new(token)?;
    Ok(Parsed::Node(
        parser.alloc(Node::Value(Value::Literal(literal))),
    ))
}

/// `name(arguments)` or a plain `name`.
pub fn parse_access(parser: &mut Parser) -> Result<Parsed, Error> {
    let name = parser.cursor_mut().get_any(&[TokenKind::Identifier])?;

    if parser.peek().is(TokenKind::Open) {
        let arguments = parser.next_argument_list()?;
        return Ok(Parsed::Node(parser.alloc(Node::Value(Value::MethodCall(
            MethodCall {
                name,
                arguments,
                method: Resolution::Unresolved,
            },
        )))));
    }

    Ok(Parsed::Node(parser.alloc(Node::Value(Value::NameAccess(
        NameAccess {
            name,
            variable: Resolution::Unresolved,
        },
    )))))
}

pub fn parse_argument_list(parser: &mut Parser) -> Result<Parsed, Error> {
    parser.cursor_mut().get_any(&[TokenKind::Open])?;

    let mut arguments = Vec::new();
    while !parser.peek().is(TokenKind::Close) {
        arguments.push(parser.next_value()?);

        let separator = parser
            .cursor()
            .peek_any(&[TokenKind::Comma, TokenKind::Close])?;
        if separator.is(TokenKind::Comma) {
            parser.get();
        } else {
            break;
        }
    }

    parser.cursor_mut().get_any(&[TokenKind::Close])?;
    Ok(Parsed::Arguments(arguments))
}

/// Composes adjacent single-character operator tokens into the longest
/// known operator. `=++` reads as `=` and leaves `++` for the next call.
pub fn parse_operator(parser: &mut Parser) -> Result<Parsed, Error> {
    let first = parser
        .cursor_mut()
        .get_any(&[TokenKind::Operator, TokenKind::Colon])?;

    let mut symbol = first.value.clone();
    let mut span = first.span;

    loop {
        let next = parser.peek();
        if !next.is_any(&[TokenKind::Operator, TokenKind::Colon]) || next.span.begin != span.end {
            break;
        }

        let candidate = format!("{}{}", symbol, next.value);
        if Operator::from_symbol(&candidate).is_none() {
            break;
        }

        symbol = candidate;
        span = span.to(&parser.get().span);
    }

    match Operator::from_symbol(&symbol) {
        Some(operator) => Ok(Parsed::Operator(
            operator,
            MK_TOKEN!(TokenKind::Operator, symbol, span),
        )),
        None => Err(Error::at(
            ErrorImpl::UnknownOperator { operator: symbol },
            &first,
            "unknown operator",
        )),
    }
}

fn invalid_value(token: &Token) -> Error {
    Error::at(
        ErrorImpl::InvalidValue {
            token: token.to_string(),
        },
        token,
        "a value cannot continue here",
    )
}
