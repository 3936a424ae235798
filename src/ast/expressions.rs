use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
};

use super::{
    ast::{NodeId, Resolution, Variable},
    operators::Operator,
    types::{AnonymousType, Types},
};

/// Decoded value of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    Char(char),
    String(String),
    Integer(u64),
    Float(f64),
}

#[derive(Debug, Clone)]
pub struct ConstantLiteral {
    pub token: Token,
    pub constant: Constant,
    pub value_type: Resolution<AnonymousType>,
}

impl ConstantLiteral {
    /// Decodes the constant held by `token`.
    ///
    /// # Arguments
    ///
    /// * `token` - A literal token as produced by the lexer
    ///
    /// # Returns
    ///
    /// The literal, or a `NumberParseError` when the digits do not fit the
    /// literal's type
    pub fn new(token: Token) -> Result<Self, Error> {
        let constant = decode(&token)?;
        Ok(ConstantLiteral {
            token,
            constant,
            value_type: Resolution::Unresolved,
        })
    }

    /// The type this literal has before any context is applied.
    pub fn literal_type(&self) -> AnonymousType {
        Types::of_literal(self.token.kind).unwrap_or(Types::INFERRED)
    }
}

fn decode(token: &Token) -> Result<Constant, Error> {
    let number_error = || {
        Error::at(
            ErrorImpl::NumberParseError {
                token: token.value.clone(),
            },
            token,
            "this literal",
        )
    };

    let digits = token.value.replace('_', "");
    match token.kind {
        TokenKind::Bool => Ok(Constant::Bool(token.value == "true")),
        TokenKind::String => Ok(Constant::String(token.value.clone())),
        TokenKind::Character => {
            let mut chars = token.value.chars();
            match (chars.next(), chars.next()) {
                (Some(character), None) => Ok(Constant::Char(character)),
                _ => Err(Error::at(
                    ErrorImpl::InvalidValue {
                        token: token.value.clone(),
                    },
                    token,
                    "a character literal holds exactly one character",
                )),
            }
        }
        TokenKind::Float | TokenKind::Double => digits
            .parse::<f64>()
            .map(Constant::Float)
            .map_err(|_| number_error()),
        TokenKind::Hexadecimal | TokenKind::Binary => {
            let radix = if token.kind == TokenKind::Hexadecimal { 16 } else { 2 };
            let value = u64::from_str_radix(digits.get(2..).unwrap_or_default(), radix)
                .map_err(|_| number_error())?;
            // the bits are reinterpreted as an `int`
            if value > u32::MAX as u64 {
                return Err(number_error());
            }
            Ok(Constant::Integer(value))
        }
        _ => {
            let value = digits.parse::<u64>().map_err(|_| number_error())?;
            let limit = Types::of_literal(token.kind)
                .and_then(|type_| type_.primitive())
                .and_then(|primitive| primitive.max_constant())
                .unwrap_or(i32::MAX as u64);
            if value > limit {
                return Err(number_error());
            }
            Ok(Constant::Integer(value))
        }
    }
}

#[derive(Debug, Clone)]
pub struct NameAccess {
    pub name: Token,
    pub variable: Resolution<Variable>,
}

#[derive(Debug, Clone)]
pub struct MethodCall {
    pub name: Token,
    pub arguments: Vec<NodeId>,
    /// The `Method` node of the chosen overload.
    pub method: Resolution<NodeId>,
}

#[derive(Debug, Clone)]
pub struct BinaryOperation {
    pub left: NodeId,
    pub operator: Operator,
    pub operator_token: Token,
    pub right: NodeId,
    pub value_type: Resolution<AnonymousType>,
}

#[derive(Debug, Clone)]
pub struct LocalAssign {
    pub name: Token,
    pub operator: Token,
    pub value: NodeId,
    pub variable: Resolution<Variable>,
}
