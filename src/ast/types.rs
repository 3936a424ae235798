//! Structural type system.
//!
//! Types are plain values compared structurally:
//!
//! - `Referencing` describes value, `mut` and `ref` pointer semantics
//! - `TypeName` is a primitive, a single name or a qualified path
//! - `Array` is a list of dimensions
//! - `AnonymousType` is either a scalar or a tuple of anonymous types
//!
//! Member names never take part in matching.

use std::fmt::Display;

use crate::lexer::tokens::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Referencing {
    None,
    Mut,
    /// A pointer, `ref` is depth 1 and every extra `*` adds one.
    Ref(u32),
}

impl Referencing {
    pub fn is_mutable(&self) -> bool {
        !matches!(self, Referencing::None)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Referencing::Ref(_))
    }

    pub fn depth(&self) -> u32 {
        match self {
            Referencing::Ref(depth) => *depth,
            _ => 0,
        }
    }

    pub fn matches(&self, other: &Referencing) -> bool {
        self.is_mutable() == other.is_mutable()
            && self.is_pointer() == other.is_pointer()
            && self.depth() == other.depth()
    }
}

impl Display for Referencing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Referencing::None => Ok(()),
            Referencing::Mut => write!(f, "mut"),
            Referencing::Ref(depth) => {
                write!(f, "ref{}", "*".repeat(depth.saturating_sub(1) as usize))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Char,
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    Void,
    String,
    Unknown,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<PrimitiveType> {
        let primitive = match name {
            "bool" => PrimitiveType::Bool,
            "char" => PrimitiveType::Char,
            "byte" => PrimitiveType::Byte,
            "ubyte" => PrimitiveType::UByte,
            "short" => PrimitiveType::Short,
            "ushort" => PrimitiveType::UShort,
            "int" => PrimitiveType::Int,
            "uint" => PrimitiveType::UInt,
            "long" => PrimitiveType::Long,
            "ulong" => PrimitiveType::ULong,
            "float" => PrimitiveType::Float,
            "double" => PrimitiveType::Double,
            "void" => PrimitiveType::Void,
            "string" => PrimitiveType::String,
            _ => return None,
        };
        Some(primitive)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::Byte => "byte",
            PrimitiveType::UByte => "ubyte",
            PrimitiveType::Short => "short",
            PrimitiveType::UShort => "ushort",
            PrimitiveType::Int => "int",
            PrimitiveType::UInt => "uint",
            PrimitiveType::Long => "long",
            PrimitiveType::ULong => "ulong",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Void => "void",
            PrimitiveType::String => "string",
            PrimitiveType::Unknown => "<no type>",
        }
    }

    /// Rank used to pick the result type of a binary operation. `void` and
    /// `string` have no rank; the unknown type ranks below everything.
    pub fn precedence(&self) -> Option<i32> {
        match self {
            PrimitiveType::Bool => Some(0),
            PrimitiveType::Char => Some(1),
            PrimitiveType::Byte | PrimitiveType::UByte => Some(2),
            PrimitiveType::Short | PrimitiveType::UShort => Some(3),
            PrimitiveType::Int | PrimitiveType::UInt => Some(4),
            PrimitiveType::Long | PrimitiveType::ULong => Some(5),
            PrimitiveType::Float => Some(6),
            PrimitiveType::Double => Some(7),
            PrimitiveType::Unknown => Some(-1),
            PrimitiveType::Void | PrimitiveType::String => None,
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, PrimitiveType::Float | PrimitiveType::Double)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            PrimitiveType::UByte | PrimitiveType::UShort | PrimitiveType::UInt | PrimitiveType::ULong
        )
    }

    /// Whether values of this type can take part in arithmetic.
    pub fn is_arithmetic(&self) -> bool {
        matches!(self.precedence(), Some(rank) if rank >= 0)
    }

    pub fn bits(&self) -> u32 {
        match self {
            PrimitiveType::Bool => 1,
            PrimitiveType::Char | PrimitiveType::Byte | PrimitiveType::UByte => 8,
            PrimitiveType::Short | PrimitiveType::UShort => 16,
            PrimitiveType::Int | PrimitiveType::UInt | PrimitiveType::Float => 32,
            PrimitiveType::Long | PrimitiveType::ULong | PrimitiveType::Double => 64,
            PrimitiveType::Void | PrimitiveType::String | PrimitiveType::Unknown => 0,
        }
    }

    /// Largest integer constant a literal of this type may hold.
    pub fn max_constant(&self) -> Option<u64> {
        match self {
            PrimitiveType::Byte => Some(i8::MAX as u64),
            PrimitiveType::UByte => Some(u8::MAX as u64),
            PrimitiveType::Short => Some(i16::MAX as u64),
            PrimitiveType::UShort => Some(u16::MAX as u64),
            PrimitiveType::Int => Some(i32::MAX as u64),
            PrimitiveType::UInt => Some(u32::MAX as u64),
            PrimitiveType::Long => Some(i64::MAX as u64),
            PrimitiveType::ULong => Some(u64::MAX),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeName {
    Primitive(PrimitiveType),
    Single(String),
    /// A qualified name such as `a.b.C`.
    Complex(Vec<String>),
}

impl TypeName {
    pub fn matches(&self, other: &TypeName) -> bool {
        self == other
    }
}

impl Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeName::Primitive(primitive) => write!(f, "{}", primitive.name()),
            TypeName::Single(name) => write!(f, "{}", name),
            TypeName::Complex(path) => write!(f, "{}", path.join(".")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    Constant(u64),
    /// Sized by a name known only at runtime.
    Dynamic(String),
    Inferred,
}

impl Dimension {
    pub fn matches(&self, other: &Dimension) -> bool {
        match (self, other) {
            (Dimension::Constant(left), Dimension::Constant(right)) => left == right,
            (Dimension::Dynamic(_), Dimension::Dynamic(_)) => true,
            (Dimension::Inferred, Dimension::Inferred) => true,
            _ => false,
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Constant(size) => write!(f, "[{}]", size),
            Dimension::Dynamic(name) => write!(f, "[{}]", name),
            Dimension::Inferred => write!(f, "[]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Array {
    pub dimensions: Vec<Dimension>,
}

impl Array {
    pub const NONE: Array = Array {
        dimensions: Vec::new(),
    };

    pub fn new(dimensions: Vec<Dimension>) -> Self {
        Array { dimensions }
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    pub fn matches(&self, other: &Array) -> bool {
        self.dimensions.len() == other.dimensions.len()
            && self
                .dimensions
                .iter()
                .zip(&other.dimensions)
                .all(|(left, right)| left.matches(right))
    }
}

impl Display for Array {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for dimension in &self.dimensions {
            write!(f, "{}", dimension)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    pub referencing: Referencing,
    pub name: TypeName,
    pub array: Array,
    pub member_name: Option<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleType {
    pub referencing: Referencing,
    pub members: Vec<AnonymousType>,
    pub array: Array,
    pub member_name: Option<Token>,
}

impl TupleType {
    /// Members must be either all named or all unnamed, at every nesting
    /// level.
    pub fn has_consistent_member_names(&self) -> bool {
        let named = self
            .members
            .iter()
            .filter(|member| member.member_name().is_some())
            .count();

        (named == 0 || named == self.members.len())
            && self
                .members
                .iter()
                .all(AnonymousType::has_consistent_member_names)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnonymousType {
    Scalar(ScalarType),
    Tuple(TupleType),
}

const fn primitive(primitive: PrimitiveType, referencing: Referencing) -> AnonymousType {
    AnonymousType::Scalar(ScalarType {
        referencing,
        name: TypeName::Primitive(primitive),
        array: Array::NONE,
        member_name: None,
    })
}

/// Well known types.
pub struct Types;

impl Types {
    pub const INFERRED: AnonymousType = primitive(PrimitiveType::Unknown, Referencing::None);
    pub const VOID: AnonymousType = primitive(PrimitiveType::Void, Referencing::None);
    pub const BOOL: AnonymousType = primitive(PrimitiveType::Bool, Referencing::None);
    pub const CHAR: AnonymousType = primitive(PrimitiveType::Char, Referencing::None);
    pub const BYTE: AnonymousType = primitive(PrimitiveType::Byte, Referencing::None);
    pub const UBYTE: AnonymousType = primitive(PrimitiveType::UByte, Referencing::None);
    pub const SHORT: AnonymousType = primitive(PrimitiveType::Short, Referencing::None);
    pub const USHORT: AnonymousType = primitive(PrimitiveType::UShort, Referencing::None);
    pub const INT: AnonymousType = primitive(PrimitiveType::Int, Referencing::None);
    pub const UINT: AnonymousType = primitive(PrimitiveType::UInt, Referencing::None);
    pub const LONG: AnonymousType = primitive(PrimitiveType::Long, Referencing::None);
    pub const ULONG: AnonymousType = primitive(PrimitiveType::ULong, Referencing::None);
    pub const FLOAT: AnonymousType = primitive(PrimitiveType::Float, Referencing::None);
    pub const DOUBLE: AnonymousType = primitive(PrimitiveType::Double, Referencing::None);
    pub const STRING: AnonymousType = primitive(PrimitiveType::String, Referencing::None);

    pub const VOID_PTR: AnonymousType = primitive(PrimitiveType::Void, Referencing::Ref(1));
    pub const BOOL_PTR: AnonymousType = primitive(PrimitiveType::Bool, Referencing::Ref(1));
    pub const CHAR_PTR: AnonymousType = primitive(PrimitiveType::Char, Referencing::Ref(1));
    pub const BYTE_PTR: AnonymousType = primitive(PrimitiveType::Byte, Referencing::Ref(1));
    pub const SHORT_PTR: AnonymousType = primitive(PrimitiveType::Short, Referencing::Ref(1));
    pub const INT_PTR: AnonymousType = primitive(PrimitiveType::Int, Referencing::Ref(1));
    pub const LONG_PTR: AnonymousType = primitive(PrimitiveType::Long, Referencing::Ref(1));
    pub const FLOAT_PTR: AnonymousType = primitive(PrimitiveType::Float, Referencing::Ref(1));
    pub const DOUBLE_PTR: AnonymousType = primitive(PrimitiveType::Double, Referencing::Ref(1));

    pub fn primitive(primitive_type: PrimitiveType) -> AnonymousType {
        primitive(primitive_type, Referencing::None)
    }

    /// Type of a literal token, `None` for kinds that hold no constant.
    pub fn of_literal(kind: TokenKind) -> Option<AnonymousType> {
        let literal = match kind {
            TokenKind::Bool => Types::BOOL,
            TokenKind::Character => Types::CHAR,
            TokenKind::String => Types::STRING,
            TokenKind::Byte => Types::BYTE,
            TokenKind::UByte => Types::UBYTE,
            TokenKind::Short => Types::SHORT,
            TokenKind::UShort => Types::USHORT,
            TokenKind::Int | TokenKind::Hexadecimal | TokenKind::Binary => Types::INT,
            TokenKind::UInt => Types::UINT,
            TokenKind::Long => Types::LONG,
            TokenKind::ULong => Types::ULONG,
            TokenKind::Float => Types::FLOAT,
            TokenKind::Double => Types::DOUBLE,
            _ => return None,
        };
        Some(literal)
    }

    /// Result type of an arithmetic operation: the operand whose primitive
    /// ranks higher, the left one on ties.
    pub fn binary_result(left: &AnonymousType, right: &AnonymousType) -> Option<AnonymousType> {
        let left_primitive = left.primitive().filter(PrimitiveType::is_arithmetic)?;
        let right_primitive = right.primitive().filter(PrimitiveType::is_arithmetic)?;

        if right_primitive.precedence() > left_primitive.precedence() {
            Some(Types::primitive(right_primitive))
        } else {
            Some(Types::primitive(left_primitive))
        }
    }
}

impl AnonymousType {
    pub fn referencing(&self) -> Referencing {
        match self {
            AnonymousType::Scalar(scalar) => scalar.referencing,
            AnonymousType::Tuple(tuple) => tuple.referencing,
        }
    }

    pub fn array(&self) -> &Array {
        match self {
            AnonymousType::Scalar(scalar) => &scalar.array,
            AnonymousType::Tuple(tuple) => &tuple.array,
        }
    }

    pub fn member_name(&self) -> Option<&Token> {
        match self {
            AnonymousType::Scalar(scalar) => scalar.member_name.as_ref(),
            AnonymousType::Tuple(tuple) => tuple.member_name.as_ref(),
        }
    }

    pub fn with_referencing(mut self, referencing: Referencing) -> Self {
        match &mut self {
            AnonymousType::Scalar(scalar) => scalar.referencing = referencing,
            AnonymousType::Tuple(tuple) => tuple.referencing = referencing,
        }
        self
    }

    pub fn with_member_name(mut self, name: Token) -> Self {
        match &mut self {
            AnonymousType::Scalar(scalar) => scalar.member_name = Some(name),
            AnonymousType::Tuple(tuple) => tuple.member_name = Some(name),
        }
        self
    }

    /// The type of a value read out of storage of this type: `mut` is
    /// dropped, pointers stay pointers.
    pub fn as_value(&self) -> AnonymousType {
        match self.referencing() {
            Referencing::Mut => self.clone().with_referencing(Referencing::None),
            _ => self.clone(),
        }
    }

    /// The primitive behind a plain, non-array scalar.
    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self {
            AnonymousType::Scalar(ScalarType {
                referencing,
                name: TypeName::Primitive(primitive),
                array,
                ..
            }) if !referencing.is_pointer() && array.is_empty() => Some(*primitive),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        self.primitive() == Some(PrimitiveType::Void)
    }

    pub fn is_inferred(&self) -> bool {
        self.primitive() == Some(PrimitiveType::Unknown)
    }

    pub fn matches(&self, other: &AnonymousType) -> bool {
        match (self, other) {
            (AnonymousType::Scalar(left), AnonymousType::Scalar(right)) => {
                left.referencing.matches(&right.referencing)
                    && left.name.matches(&right.name)
                    && left.array.matches(&right.array)
            }
            (AnonymousType::Tuple(left), AnonymousType::Tuple(right)) => {
                left.referencing.matches(&right.referencing)
                    && left.array.matches(&right.array)
                    && left.members.len() == right.members.len()
                    && left
                        .members
                        .iter()
                        .zip(&right.members)
                        .all(|(left, right)| left.matches(right))
            }
            _ => false,
        }
    }

    pub fn has_consistent_member_names(&self) -> bool {
        match self {
            AnonymousType::Scalar(_) => true,
            AnonymousType::Tuple(tuple) => tuple.has_consistent_member_names(),
        }
    }
}

impl Display for AnonymousType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let referencing = self.referencing();
        if referencing != Referencing::None {
            write!(f, "{} ", referencing)?;
        }

        match self {
            AnonymousType::Scalar(scalar) => write!(f, "{}", scalar.name)?,
            AnonymousType::Tuple(tuple) => {
                write!(f, "(")?;
                for (index, member) in tuple.members.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", member)?;
                }
                write!(f, ")")?;
            }
        }
        write!(f, "{}", self.array())?;

        if let Some(name) = self.member_name() {
            write!(f, " {}", name.value)?;
        }
        Ok(())
    }
}
