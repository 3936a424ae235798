use crate::{
    ast::types::{
        AnonymousType, Array, Dimension, PrimitiveType, Referencing, ScalarType, TupleType,
        TypeName,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
};

use super::{cursor::unexpected, lookups::Parsed, parser::Parser};

/// `mut`, `ref` followed by any number of `*`, or nothing.
pub fn parse_referencing(parser: &mut Parser) -> Result<Parsed, Error> {
    if parser.peek().is_value(TokenKind::Type, "mut") {
        parser.get();
        return Ok(Parsed::Referencing(Referencing::Mut));
    }

    if parser.peek().is_value(TokenKind::Type, "ref") {
        parser.get();
        let mut depth = 1;
        while parser.peek().is_value(TokenKind::Operator, "*") {
            parser.get();
            depth += 1;
        }
        return Ok(Parsed::Referencing(Referencing::Ref(depth)));
    }

    Ok(Parsed::Referencing(Referencing::None))
}

pub fn parse_type_name(parser: &mut Parser) -> Result<Parsed, Error> {
    let token = parser
        .cursor_mut()
        .get_any(&[TokenKind::Type, TokenKind::Identifier])?;

    if token.is(TokenKind::Type) {
        return match PrimitiveType::from_name(&token.value) {
            Some(primitive) => Ok(Parsed::TypeName(TypeName::Primitive(primitive))),
            // `let`, `mut`, `ref` and `deref` are type keywords but not types
            None => Err(unexpected(String::from("a type name"), &token)),
        };
    }

    let mut path = vec![token.value];
    while parser.peek().is_value(TokenKind::Operator, ".")
        && parser.cursor().peek_ahead(1).is(TokenKind::Identifier)
    {
        parser.get();
        path.push(parser.get().value);
    }

    if path.len() == 1 {
        Ok(Parsed::TypeName(TypeName::Single(path.remove(0))))
    } else {
        Ok(Parsed::TypeName(TypeName::Complex(path)))
    }
}

/// Zero or more `[size]` pairs.
pub fn parse_array(parser: &mut Parser) -> Result<Parsed, Error> {
    let mut dimensions = Vec::new();

    while parser.peek().is(TokenKind::Start) {
        parser.get();

        let dimension = if parser.peek().is(TokenKind::Int) {
            let size = parser.get();
            let value = size.value.replace('_', "").parse::<u64>().map_err(|_| {
                Error::at(
                    ErrorImpl::NumberParseError {
                        token: size.value.clone(),
                    },
                    &size,
                    "array size",
                )
            })?;
            Dimension::Constant(value)
        } else if parser.peek().is(TokenKind::Identifier) {
            Dimension::Dynamic(parser.get().value)
        } else {
            Dimension::Inferred
        };

        parser.cursor_mut().get_any(&[TokenKind::Stop])?;
        dimensions.push(dimension);
    }

    Ok(Parsed::Array(Array::new(dimensions)))
}

pub fn parse_anonymous_type(parser: &mut Parser) -> Result<Parsed, Error> {
    if is_tuple_ahead(parser) {
        let tuple = parser.next_tuple_type()?;
        return Ok(Parsed::Type(AnonymousType::Tuple(tuple)));
    }

    let scalar = parser.next_scalar_type()?;
    Ok(Parsed::Type(AnonymousType::Scalar(scalar)))
}

pub fn parse_scalar_type(parser: &mut Parser) -> Result<Parsed, Error> {
    let referencing = parser.next_referencing()?;
    let name = parser.next_type_name()?;
    let array = parser.next_array()?;

    Ok(Parsed::Type(AnonymousType::Scalar(ScalarType {
        referencing,
        name,
        array,
        member_name: None,
    })))
}

/// `(member, member)` where every member may carry a name.
pub fn parse_tuple_type(parser: &mut Parser) -> Result<Parsed, Error> {
    let referencing = parser.next_referencing()?;
    parser.cursor_mut().get_any(&[TokenKind::Open])?;

    let mut members = Vec::new();
    while !parser.peek().is(TokenKind::Close) {
        let mut member = parser.next_anonymous_type()?;
        if parser.peek().is(TokenKind::Identifier) {
            member = member.with_member_name(parser.get());
        }
        members.push(member);

        if parser.peek().is(TokenKind::Comma) {
            parser.get();
        } else {
            break;
        }
    }

    parser.cursor_mut().get_any(&[TokenKind::Close])?;
    let array = parser.next_array()?;

    Ok(Parsed::Type(AnonymousType::Tuple(TupleType {
        referencing,
        members,
        array,
        member_name: None,
    })))
}

/// Looks past any referencing keywords for the `(` that opens a tuple.
fn is_tuple_ahead(parser: &Parser) -> bool {
    let cursor = parser.cursor();
    let mut offset = 0;

    if cursor.peek_ahead(offset).is_value(TokenKind::Type, "mut") {
        offset += 1;
    } else if cursor.peek_ahead(offset).is_value(TokenKind::Type, "ref") {
        offset += 1;
        while cursor.peek_ahead(offset).is_value(TokenKind::Operator, "*") {
            offset += 1;
        }
    }

    cursor.peek_ahead(offset).is(TokenKind::Open)
}
