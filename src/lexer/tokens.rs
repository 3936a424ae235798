use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

/// Words that are parsed as `TokenKind::Expression`.
pub const EXPRESSION_KEYWORDS: &[&str] = &[
    "new", "class", "enum", "union", "struct", "interface", "for", "while", "repeat", "do", "if",
    "else", "switch", "case", "loop", "continue", "break", "return", "await", "goto", "is", "in",
    "as", "where", "defer", "assert", "sizeof", "malloc", "free", "memcpy", "memset", "memmove",
];

/// Words that are parsed as `TokenKind::Type`.
pub const TYPE_KEYWORDS: &[&str] = &[
    "let", "mut", "ref", "deref", "byte", "ubyte", "short", "ushort", "int", "uint", "double",
    "float", "long", "ulong", "void", "bool", "char", "string",
];

/// Words that are parsed as `TokenKind::Modifier`.
pub const MODIFIER_KEYWORDS: &[&str] = &[
    "public", "protected", "private", "static", "final", "native", "extern", "transient",
    "synchronized", "async", "const", "unsafe", "weak", "strong", "default",
];

pub const BOOL_KEYWORDS: &[&str] = &["true", "false"];
pub const INFO_KEYWORDS: &[&str] = &["package", "import", "using"];
pub const NULL_KEYWORDS: &[&str] = &["null", "nullptr"];

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        // earlier tables win, so insert them last
        let tables = [
            (NULL_KEYWORDS, TokenKind::Null),
            (INFO_KEYWORDS, TokenKind::Info),
            (BOOL_KEYWORDS, TokenKind::Bool),
            (MODIFIER_KEYWORDS, TokenKind::Modifier),
            (TYPE_KEYWORDS, TokenKind::Type),
            (EXPRESSION_KEYWORDS, TokenKind::Expression),
        ];
        for (words, kind) in tables {
            for word in words {
                map.insert(*word, kind);
            }
        }
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    String,
    Character,

    Begin, // {
    End,   // }

    Byte,
    UByte,
    Short,
    UShort,
    Double,
    Float,
    Long,
    ULong,
    Int,
    UInt,
    Hexadecimal,
    Binary,
    Bool,

    Semicolon,
    Colon,
    Comma,
    Open,  // (
    Close, // )
    Start, // [
    Stop,  // ]

    Expression,
    Identifier,
    Operator,
    Type,
    Modifier,
    Annotation,
    Null,
    Info,

    EOF,
    Unexpected,
    NewLine,
    None,
}

impl TokenKind {
    /// Every kind that holds a constant value.
    pub const LITERALS: [TokenKind; 15] = [
        TokenKind::Bool,
        TokenKind::Character,
        TokenKind::String,
        TokenKind::Byte,
        TokenKind::UByte,
        TokenKind::Short,
        TokenKind::UShort,
        TokenKind::Int,
        TokenKind::UInt,
        TokenKind::Long,
        TokenKind::ULong,
        TokenKind::Float,
        TokenKind::Double,
        TokenKind::Hexadecimal,
        TokenKind::Binary,
    ];

    pub fn is_literal(&self) -> bool {
        TokenKind::LITERALS.contains(self)
    }

    pub fn is_number(&self) -> bool {
        self.is_literal() && !matches!(self, TokenKind::Bool | TokenKind::Character | TokenKind::String)
    }

    /// Converts a signed integer kind to its unsigned counterpart.
    pub fn to_unsigned(&self) -> Option<TokenKind> {
        match self {
            TokenKind::Byte => Some(TokenKind::UByte),
            TokenKind::Short => Some(TokenKind::UShort),
            TokenKind::Int => Some(TokenKind::UInt),
            TokenKind::Long => Some(TokenKind::ULong),
            _ => None,
        }
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::UByte => "UBYTE",
            TokenKind::UShort => "USHORT",
            TokenKind::ULong => "ULONG",
            TokenKind::UInt => "UINT",
            TokenKind::NewLine => "NEW_LINE",
            other => return write!(f, "{}", format!("{:?}", other).to_uppercase()),
        };
        write!(f, "{}", name)
    }
}

/// A single lexeme. Equality ignores the span so token sequences can be
/// compared against expectations built with [`Token::of`].
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl Eq for Token {}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.value.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}({})", self.kind, self.value)
        }
    }
}

impl Token {
    pub fn of(kind: TokenKind, value: &str) -> Self {
        Token {
            kind,
            value: String::from(value),
            span: Span::EMPTY,
        }
    }

    pub fn eof(span: Span) -> Self {
        Token {
            kind: TokenKind::EOF,
            value: String::new(),
            span,
        }
    }

    /// Synthetic `;` produced by automatic semicolon insertion.
    pub fn auto_semicolon(span: Span) -> Self {
        Token {
            kind: TokenKind::Semicolon,
            value: String::from("auto"),
            span,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    pub fn is_value(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }

    pub fn is_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.kind)
    }

    pub fn is_literal(&self) -> bool {
        self.kind.is_literal()
    }

    pub fn is_auto_semicolon(&self) -> bool {
        self.is_value(TokenKind::Semicolon, "auto")
    }

    /// Whether the lexer should keep producing tokens after this one.
    pub fn has_next(&self) -> bool {
        !matches!(self.kind, TokenKind::EOF | TokenKind::Unexpected)
    }
}
