use tracing::debug;

use crate::{
    ast::{
        ast::{Node, Resolution, Stmt, Value},
        expressions::LocalAssign,
        statements::{LocalDeclaration, Method, MethodParameter, Package, ReturnValue, Scope},
        types::Types,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
};

use super::{lookups::Parsed, parser::Parser};

/// Tokens that may follow the last token of a statement.
const STATEMENT_END: [TokenKind; 3] = [TokenKind::Semicolon, TokenKind::End, TokenKind::EOF];

/// A sequence of methods up to EOF.
///
/// A method that fails to parse is recorded, replaced by an error node, and
/// skipped up to the end of its body so the remaining methods still parse.
pub fn parse_package(parser: &mut Parser) -> Result<Parsed, Error> {
    let mut methods = Vec::new();

    loop {
        skip_semicolons(parser);
        if parser.cursor().is_at_end() {
            break;
        }

        let start = parser.peek().clone();
        match parser.next_method() {
            Ok(method) => methods.push(method),
            Err(error) => {
                let at_end = matches!(error.get_internal_error(), ErrorImpl::UnexpectedEof { .. });
                parser.recover(error);
                methods.push(parser.alloc(Node::Error(start)));
                if at_end {
                    break;
                }
                synchronize(parser);
            }
        }
    }

    debug!(methods = methods.len(), "parsed package");
    let package = Package::new(parser.package_name(), methods);
    Ok(Parsed::Node(parser.alloc(Node::Package(package))))
}

/// `type name(type name, ...) { ... }`
pub fn parse_method(parser: &mut Parser) -> Result<Parsed, Error> {
    let return_type = parser.next_anonymous_type()?;
    let name = parser.cursor_mut().get_any(&[TokenKind::Identifier])?;

    parser.cursor_mut().get_any(&[TokenKind::Open])?;
    let mut parameters = Vec::new();
    while !parser.peek().is(TokenKind::Close) {
        let type_ = parser.next_anonymous_type()?;
        let name = parser.cursor_mut().get_any(&[TokenKind::Identifier])?;
        parameters.push(MethodParameter { type_, name });

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

    let body = parser.next_scope()?;

    Ok(Parsed::Node(parser.alloc(Node::Method(Method {
        return_type,
        name,
        parameters,
        body,
    }))))
}

pub fn parse_scope(parser: &mut Parser) -> Result<Parsed, Error> {
    parser.cursor_mut().get_any(&[TokenKind::Begin])?;

    let mut statements = Vec::new();
    loop {
        skip_semicolons(parser);
        if parser.peek().is(TokenKind::End) {
            break;
        }

        let statement = parser.next_statement()?;
        if !parser.node(statement).has_next() {
            break;
        }
        statements.push(statement);
    }

    parser.cursor_mut().get_any(&[TokenKind::End])?;
    Ok(Parsed::Node(
        parser.alloc(Node::Stmt(Stmt::Scope(Scope { statements }))),
    ))
}

pub fn parse_statement(parser: &mut Parser) -> Result<Parsed, Error> {
    skip_semicolons(parser);

    let token = parser.peek();
    if token.is(TokenKind::EOF) {
        return Ok(Parsed::Node(parser.alloc(Node::Eof)));
    }

    let statement = if token.is_value(TokenKind::Type, "let") {
        parser.next_immutable_local()?
    } else if token.is_value(TokenKind::Type, "mut") {
        parser.next_mutable_local()?
    } else if token.is_value(TokenKind::Expression, "return") {
        parser.next_return()?
    } else if is_assignment_ahead(parser) {
        parser.next_local_assign()?
    } else if is_call_ahead(parser) {
        let call = parser.next_access()?;
        end_statement(parser)?;
        call
    } else {
        let token = token.clone();
        return Err(Error::at(
            ErrorImpl::InvalidStatement {
                token: token.to_string(),
            },
            &token,
            "not the start of a statement",
        ));
    };

    Ok(Parsed::Node(statement))
}

pub fn parse_immutable_local(parser: &mut Parser) -> Result<Parsed, Error> {
    let keyword = parser.cursor_mut().get_value(TokenKind::Type, "let")?;
    let local = parse_local(parser, keyword)?;
    Ok(Parsed::Node(
        parser.alloc(Node::Stmt(Stmt::ImmutableLocal(local))),
    ))
}

pub fn parse_mutable_local(parser: &mut Parser) -> Result<Parsed, Error> {
    let keyword = parser.cursor_mut().get_value(TokenKind::Type, "mut")?;
    let local = parse_local(parser, keyword)?;
    Ok(Parsed::Node(
        parser.alloc(Node::Stmt(Stmt::MutableLocal(local))),
    ))
}

/// `name = value` after a local declaration keyword.
fn parse_local(parser: &mut Parser, keyword: Token) -> Result<LocalDeclaration, Error> {
    let name = parser.cursor_mut().get_any(&[TokenKind::Identifier])?;
    parser.cursor_mut().get_value(TokenKind::Operator, "=")?;
    let value = parser.next_value()?;
    end_statement(parser)?;

    Ok(LocalDeclaration {
        keyword,
        name,
        declared_type: Types::INFERRED,
        value,
        resolved_type: Resolution::Unresolved,
    })
}

pub fn parse_local_assign(parser: &mut Parser) -> Result<Parsed, Error> {
    let name = parser.cursor_mut().get_any(&[TokenKind::Identifier])?;
    let operator = parser.cursor_mut().get_value(TokenKind::Operator, "=")?;
    let value = parser.next_value()?;
    end_statement(parser)?;

    Ok(Parsed::Node(parser.alloc(Node::Value(Value::LocalAssign(
        LocalAssign {
            name,
            operator,
            value,
            variable: Resolution::Unresolved,
        },
    )))))
}

/// `return value` or a bare `return` in a void method.
pub fn parse_return(parser: &mut Parser) -> Result<Parsed, Error> {
    let keyword = parser
        .cursor_mut()
        .get_value(TokenKind::Expression, "return")?;

    let value = if parser.peek().is_any(&STATEMENT_END) {
        None
    } else {
        Some(parser.next_value()?)
    };
    end_statement(parser)?;

    Ok(Parsed::Node(parser.alloc(Node::Stmt(Stmt::Return(
        ReturnValue { keyword, value },
    )))))
}

/// `name(`, a call made for its effect.
fn is_call_ahead(parser: &Parser) -> bool {
    let cursor = parser.cursor();
    cursor.peek().is(TokenKind::Identifier) && cursor.peek_ahead(1).is(TokenKind::Open)
}

/// `name =` but not `name ==`.
fn is_assignment_ahead(parser: &Parser) -> bool {
    let cursor = parser.cursor();
    cursor.peek().is(TokenKind::Identifier)
        && cursor.peek_ahead(1).is_value(TokenKind::Operator, "=")
        && !cursor.peek_ahead(2).is_value(TokenKind::Operator, "=")
}

/// A statement ends at a semicolon, which is consumed, or right before the
/// brace closing its scope.
fn end_statement(parser: &mut Parser) -> Result<(), Error> {
    let terminated = parser.cursor().peek_any(&STATEMENT_END)?.is(TokenKind::Semicolon);
    if terminated {
        parser.get();
    }
    Ok(())
}

fn skip_semicolons(parser: &mut Parser) {
    while parser.peek().is(TokenKind::Semicolon) {
        parser.get();
    }
}

/// Skips to just past the `}` that closes the current method body.
fn synchronize(parser: &mut Parser) {
    let mut depth = 0usize;

    while !parser.cursor().is_at_end() {
        let token = parser.get();
        if token.is(TokenKind::Begin) {
            depth += 1;
        } else if token.is(TokenKind::End) {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                break;
            }
        }
    }
}
