#![allow(clippy::module_inception)]

pub mod ast;
pub mod codegen;
pub mod config;
pub mod driver;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod resolver;

extern crate regex;

/// Location of a token inside the source text.
///
/// `begin` and `end` are byte offsets, `line_index` is the column the token
/// starts at and `line_number` is one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
    pub line_index: usize,
    pub line_number: usize,
}

impl Span {
    pub const EMPTY: Span = Span {
        begin: 0,
        end: 0,
        line_index: 0,
        line_number: 0,
    };

    pub fn new(begin: usize, end: usize, line_index: usize, line_number: usize) -> Self {
        Span {
            begin,
            end,
            line_index,
            line_number,
        }
    }

    /// Returns a span covering both `self` and `other`, keeping the line
    /// information of whichever starts first.
    pub fn to(&self, other: &Span) -> Span {
        let (first, _) = if self.begin <= other.begin {
            (self, other)
        } else {
            (other, self)
        };

        Span {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
            line_index: first.line_index,
            line_number: first.line_number,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
