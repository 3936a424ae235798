use std::fmt::Display;

/// Every operator the parser can compose out of single-character tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Negate,
    Multiply,
    Divide,
    Remainder,
    Power,
    Equal,
    Assign,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Dot,
    Slice,
    Lambda,
    Arrow,
    Increment,
    Decrement,
    Not,
    And,
    AddEqual,
    SubtractEqual,
    MultiplyEqual,
    DivideEqual,
    RemainderEqual,
    PowerEqual,
}

impl Operator {
    pub const ALL: [Operator; 27] = [
        Operator::Add,
        Operator::Negate,
        Operator::Multiply,
        Operator::Divide,
        Operator::Remainder,
        Operator::Power,
        Operator::Equal,
        Operator::Assign,
        Operator::NotEqual,
        Operator::GreaterThan,
        Operator::GreaterOrEqual,
        Operator::LessThan,
        Operator::LessOrEqual,
        Operator::Dot,
        Operator::Slice,
        Operator::Lambda,
        Operator::Arrow,
        Operator::Increment,
        Operator::Decrement,
        Operator::Not,
        Operator::And,
        Operator::AddEqual,
        Operator::SubtractEqual,
        Operator::MultiplyEqual,
        Operator::DivideEqual,
        Operator::RemainderEqual,
        Operator::PowerEqual,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Negate => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Remainder => "%",
            Operator::Power => "^",
            Operator::Equal => "==",
            Operator::Assign => "=",
            Operator::NotEqual => "!=",
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::Dot => ".",
            Operator::Slice => ":",
            Operator::Lambda => "::",
            Operator::Arrow => "->",
            Operator::Increment => "++",
            Operator::Decrement => "--",
            Operator::Not => "!",
            Operator::And => "&&",
            Operator::AddEqual => "+=",
            Operator::SubtractEqual => "-=",
            Operator::MultiplyEqual => "*=",
            Operator::DivideEqual => "/=",
            Operator::RemainderEqual => "%=",
            Operator::PowerEqual => "^=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        Operator::ALL
            .iter()
            .copied()
            .find(|operator| operator.symbol() == symbol)
    }

    /// Operators that lower to one arithmetic instruction.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Operator::Add | Operator::Negate | Operator::Multiply | Operator::Divide
        )
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
