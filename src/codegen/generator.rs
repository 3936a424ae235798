use std::fmt::Display;

use crate::{
    ast::types::{AnonymousType, PrimitiveType},
    errors::errors::Error,
};

/// Arithmetic a binary operation lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryInstruction {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Display for BinaryInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BinaryInstruction::Add => "add",
            BinaryInstruction::Subtract => "sub",
            BinaryInstruction::Multiply => "mul",
            BinaryInstruction::Divide => "div",
        };
        write!(f, "{}", name)
    }
}

/// Which family of machine arithmetic an operation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericKind {
    Signed,
    Unsigned,
    Floating,
}

impl NumericKind {
    pub fn of(primitive: PrimitiveType) -> NumericKind {
        if primitive.is_floating() {
            NumericKind::Floating
        } else if primitive.is_unsigned() || primitive == PrimitiveType::Bool {
            NumericKind::Unsigned
        } else {
            NumericKind::Signed
        }
    }
}

impl Display for NumericKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NumericKind::Signed => "s",
            NumericKind::Unsigned => "u",
            NumericKind::Floating => "f",
        };
        write!(f, "{}", name)
    }
}

/// The boundary between the resolved tree and an instruction backend.
///
/// Lowering drives a generator strictly in program order: functions are
/// declared up front, then each body is entered, filled block by block and
/// exited. Handles are opaque to the lowering pass; a backend decides what
/// a value, a type or a function is.
pub trait CodeGenerator {
    type Value: Clone;
    type Type: Clone;
    type Function: Clone;

    /// Maps a language type to a backend type.
    ///
    /// # Arguments
    ///
    /// * `type_` - A resolved, non-void type
    ///
    /// # Returns
    ///
    /// The backend's representation of the type
    fn lower_type(&mut self, type_: &AnonymousType) -> Result<Self::Type, Error>;

    /// Declares a function so calls can refer to it before its body exists.
    ///
    /// # Arguments
    ///
    /// * `name` - The symbol name, already unique within the module
    /// * `return_type` - The declared return type, `void` allowed
    /// * `parameters` - The parameter types in order
    ///
    /// # Returns
    ///
    /// A handle usable with `enter_function`, `parameter` and `call`
    fn declare_function(
        &mut self,
        name: &str,
        return_type: &AnonymousType,
        parameters: &[AnonymousType],
    ) -> Result<Self::Function, Error>;

    /// Makes `function` the target of subsequent instructions.
    fn enter_function(&mut self, function: &Self::Function) -> Result<(), Error>;

    fn exit_function(&mut self) -> Result<(), Error>;

    fn current_function(&self) -> Option<Self::Function>;

    /// Appends a block to the current function and positions at its end.
    fn append_block(&mut self, name: &str) -> Result<(), Error>;

    fn parameter(&mut self, function: &Self::Function, index: usize)
        -> Result<Self::Value, Error>;

    fn const_int(&mut self, primitive: PrimitiveType, value: u64) -> Result<Self::Value, Error>;

    fn const_float(&mut self, primitive: PrimitiveType, value: f64)
        -> Result<Self::Value, Error>;

    fn const_bool(&mut self, value: bool) -> Result<Self::Value, Error>;

    fn const_string(&mut self, value: &str) -> Result<Self::Value, Error>;

    /// Converts a primitive value between two arithmetic types.
    fn convert(
        &mut self,
        value: Self::Value,
        from: PrimitiveType,
        to: PrimitiveType,
    ) -> Result<Self::Value, Error>;

    /// Emits an arithmetic instruction over two operands of the same type.
    /// The result wraps around at the width of that type.
    ///
    /// # Arguments
    ///
    /// * `instruction` - The operation
    /// * `primitive` - The operand and result type, its [`NumericKind`]
    ///   picks signed, unsigned or floating arithmetic
    /// * `lhs` - The left operand
    /// * `rhs` - The right operand
    /// * `name` - A name hint for the result
    fn binary(
        &mut self,
        instruction: BinaryInstruction,
        primitive: PrimitiveType,
        lhs: Self::Value,
        rhs: Self::Value,
        name: &str,
    ) -> Result<Self::Value, Error>;

    /// Reserves storage for one value of `type_` and returns its pointer.
    fn alloca(&mut self, type_: &Self::Type, name: &str) -> Result<Self::Value, Error>;

    fn load(
        &mut self,
        type_: &Self::Type,
        pointer: Self::Value,
        name: &str,
    ) -> Result<Self::Value, Error>;

    fn store(&mut self, value: Self::Value, pointer: Self::Value) -> Result<(), Error>;

    /// Calls `function`; the result is `None` for void functions.
    fn call(
        &mut self,
        function: &Self::Function,
        arguments: &[Self::Value],
        name: &str,
    ) -> Result<Option<Self::Value>, Error>;

    fn return_value(&mut self, value: Self::Value) -> Result<(), Error>;

    fn return_void(&mut self) -> Result<(), Error>;
}
