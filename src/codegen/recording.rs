use std::fmt::Display;

use tracing::{debug, trace};

use crate::{
    ast::{
        statements::signature,
        types::{AnonymousType, PrimitiveType},
    },
    errors::errors::{Error, ErrorImpl},
    Span, MK_ID,
};

use super::generator::{BinaryInstruction, CodeGenerator, NumericKind};

MK_ID!(Register);
MK_ID!(FunctionId);

/// Nested calls beyond this depth abort evaluation.
pub const MAX_CALL_DEPTH: usize = 1000;

/// One recorded instruction. Registers are numbered per function.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    Block {
        name: String,
    },
    ConstInt {
        result: Register,
        primitive: PrimitiveType,
        value: u64,
    },
    ConstFloat {
        result: Register,
        primitive: PrimitiveType,
        value: f64,
    },
    ConstBool {
        result: Register,
        value: bool,
    },
    ConstString {
        result: Register,
        value: String,
    },
    Parameter {
        result: Register,
        index: usize,
    },
    Convert {
        result: Register,
        value: Register,
        from: PrimitiveType,
        to: PrimitiveType,
    },
    Binary {
        result: Register,
        instruction: BinaryInstruction,
        kind: NumericKind,
        primitive: PrimitiveType,
        lhs: Register,
        rhs: Register,
    },
    Alloca {
        result: Register,
        type_: AnonymousType,
    },
    Load {
        result: Register,
        pointer: Register,
    },
    Store {
        value: Register,
        pointer: Register,
    },
    Call {
        result: Option<Register>,
        callee: String,
        arguments: Vec<Register>,
    },
    Return {
        value: Register,
    },
    ReturnVoid,
}

impl RecordedOp {
    pub fn is_terminator(&self) -> bool {
        matches!(self, RecordedOp::Return { .. } | RecordedOp::ReturnVoid)
    }
}

impl Display for RecordedOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordedOp::Block { name } => write!(f, "{}:", name),
            RecordedOp::ConstInt {
                result,
                primitive,
                value,
            } => write!(f, "%{} = const {} {}", result.0, primitive.name(), value),
            RecordedOp::ConstFloat {
                result,
                primitive,
                value,
            } => write!(f, "%{} = const {} {}", result.0, primitive.name(), value),
            RecordedOp::ConstBool { result, value } => {
                write!(f, "%{} = const bool {}", result.0, value)
            }
            RecordedOp::ConstString { result, value } => {
                write!(f, "%{} = const string {:?}", result.0, value)
            }
            RecordedOp::Parameter { result, index } => {
                write!(f, "%{} = param {}", result.0, index)
            }
            RecordedOp::Convert {
                result,
                value,
                from,
                to,
            } => write!(
                f,
                "%{} = convert {} %{} to {}",
                result.0,
                from.name(),
                value.0,
                to.name()
            ),
            RecordedOp::Binary {
                result,
                instruction,
                kind,
                lhs,
                rhs,
                ..
            } => write!(
                f,
                "%{} = {}{} %{}, %{}",
                result.0, kind, instruction, lhs.0, rhs.0
            ),
            RecordedOp::Alloca { result, type_ } => write!(f, "%{} = alloca {}", result.0, type_),
            RecordedOp::Load { result, pointer } => {
                write!(f, "%{} = load %{}", result.0, pointer.0)
            }
            RecordedOp::Store { value, pointer } => write!(f, "store %{}, %{}", value.0, pointer.0),
            RecordedOp::Call {
                result,
                callee,
                arguments,
            } => {
                let arguments = arguments
                    .iter()
                    .map(|argument| format!("%{}", argument.0))
                    .collect::<Vec<_>>()
                    .join(", ");
                match result {
                    Some(result) => write!(f, "%{} = call {}({})", result.0, callee, arguments),
                    None => write!(f, "call {}({})", callee, arguments),
                }
            }
            RecordedOp::Return { value } => write!(f, "ret %{}", value.0),
            RecordedOp::ReturnVoid => write!(f, "ret void"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFunction {
    pub name: String,
    pub return_type: AnonymousType,
    pub parameters: Vec<AnonymousType>,
    pub body: Vec<RecordedOp>,
    registers: u32,
}

impl RecordedFunction {
    /// Only declared, no body lowered into it yet.
    pub fn is_declaration(&self) -> bool {
        self.body.is_empty()
    }

    /// Instructions without the block labels.
    pub fn instructions(&self) -> impl Iterator<Item = &RecordedOp> {
        self.body
            .iter()
            .filter(|op| !matches!(op, RecordedOp::Block { .. }))
    }
}

impl Display for RecordedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "define {} {} {{",
            self.return_type,
            signature(&self.name, &self.parameters)
        )?;
        for op in &self.body {
            match op {
                RecordedOp::Block { .. } => writeln!(f, "{}", op)?,
                _ => writeln!(f, "  {}", op)?,
            }
        }
        write!(f, "}}")
    }
}

/// A backend that keeps every instruction as data.
///
/// The recorded program can be inspected instruction by instruction, or run
/// with [`RecordingGenerator::run`].
#[derive(Debug, Default)]
pub struct RecordingGenerator {
    functions: Vec<RecordedFunction>,
    current: Option<FunctionId>,
}

impl RecordingGenerator {
    pub fn new() -> Self {
        RecordingGenerator::default()
    }

    pub fn functions(&self) -> &[RecordedFunction] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&RecordedFunction> {
        self.functions.iter().find(|function| function.name == name)
    }

    /// Evaluates function `name` with `arguments`.
    ///
    /// # Arguments
    ///
    /// * `name` - The symbol of a lowered function
    /// * `arguments` - One value per parameter
    ///
    /// # Returns
    ///
    /// The returned value, `RuntimeValue::Void` for void functions
    pub fn run(&self, name: &str, arguments: &[RuntimeValue]) -> Result<RuntimeValue, Error> {
        debug!("evaluating `{}`", name);
        let mut evaluator = Evaluator {
            functions: &self.functions,
            memory: Vec::new(),
            depth: 0,
        };
        evaluator.call(name, arguments.to_vec())
    }

    fn current_mut(&mut self) -> Result<&mut RecordedFunction, Error> {
        let current = self
            .current
            .ok_or_else(|| backend("no function is being generated"))?;
        self.functions
            .get_mut(current.index())
            .ok_or_else(|| backend("unknown function handle"))
    }

    fn push(&mut self, op: RecordedOp) -> Result<(), Error> {
        trace!("recording `{}`", op);
        self.current_mut()?.body.push(op);
        Ok(())
    }

    fn next_register(&mut self) -> Result<Register, Error> {
        let function = self.current_mut()?;
        let register = Register::from_raw(function.registers);
        function.registers += 1;
        Ok(register)
    }

    fn push_value(&mut self, op: impl FnOnce(Register) -> RecordedOp) -> Result<Register, Error> {
        let result = self.next_register()?;
        self.push(op(result))?;
        Ok(result)
    }
}

impl CodeGenerator for RecordingGenerator {
    type Value = Register;
    type Type = AnonymousType;
    type Function = FunctionId;

    fn lower_type(&mut self, type_: &AnonymousType) -> Result<AnonymousType, Error> {
        if type_.is_void() {
            return Err(backend("`void` has no storage"));
        }
        Ok(type_.clone())
    }

    fn declare_function(
        &mut self,
        name: &str,
        return_type: &AnonymousType,
        parameters: &[AnonymousType],
    ) -> Result<FunctionId, Error> {
        if self.function(name).is_some() {
            return Err(backend(format!("`{}` is declared twice", name)));
        }

        let id = FunctionId::from_raw(self.functions.len() as u32);
        self.functions.push(RecordedFunction {
            name: name.to_string(),
            return_type: return_type.clone(),
            parameters: parameters.to_vec(),
            body: Vec::new(),
            registers: 0,
        });
        Ok(id)
    }

    fn enter_function(&mut self, function: &FunctionId) -> Result<(), Error> {
        if function.index() >= self.functions.len() {
            return Err(backend("unknown function handle"));
        }
        self.current = Some(*function);
        Ok(())
    }

    fn exit_function(&mut self) -> Result<(), Error> {
        self.current
            .take()
            .map(|_| ())
            .ok_or_else(|| backend("no function is being generated"))
    }

    fn current_function(&self) -> Option<FunctionId> {
        self.current
    }

    fn append_block(&mut self, name: &str) -> Result<(), Error> {
        self.push(RecordedOp::Block {
            name: name.to_string(),
        })
    }

    fn parameter(&mut self, function: &FunctionId, index: usize) -> Result<Register, Error> {
        let count = self
            .functions
            .get(function.index())
            .map(|function| function.parameters.len())
            .ok_or_else(|| backend("unknown function handle"))?;
        if index >= count {
            return Err(backend(format!("parameter {} out of range", index)));
        }
        self.push_value(|result| RecordedOp::Parameter { result, index })
    }

    fn const_int(&mut self, primitive: PrimitiveType, value: u64) -> Result<Register, Error> {
        self.push_value(|result| RecordedOp::ConstInt {
            result,
            primitive,
            value,
        })
    }

    fn const_float(&mut self, primitive: PrimitiveType, value: f64) -> Result<Register, Error> {
        self.push_value(|result| RecordedOp::ConstFloat {
            result,
            primitive,
            value,
        })
    }

    fn const_bool(&mut self, value: bool) -> Result<Register, Error> {
        self.push_value(|result| RecordedOp::ConstBool { result, value })
    }

    fn const_string(&mut self, value: &str) -> Result<Register, Error> {
        self.push_value(|result| RecordedOp::ConstString {
            result,
            value: value.to_string(),
        })
    }

    fn convert(
        &mut self,
        value: Register,
        from: PrimitiveType,
        to: PrimitiveType,
    ) -> Result<Register, Error> {
        self.push_value(|result| RecordedOp::Convert {
            result,
            value,
            from,
            to,
        })
    }

    fn binary(
        &mut self,
        instruction: BinaryInstruction,
        primitive: PrimitiveType,
        lhs: Register,
        rhs: Register,
        _name: &str,
    ) -> Result<Register, Error> {
        self.push_value(|result| RecordedOp::Binary {
            result,
            instruction,
            kind: NumericKind::of(primitive),
            primitive,
            lhs,
            rhs,
        })
    }

    fn alloca(&mut self, type_: &AnonymousType, _name: &str) -> Result<Register, Error> {
        self.push_value(|result| RecordedOp::Alloca {
            result,
            type_: type_.clone(),
        })
    }

    fn load(
        &mut self,
        _type_: &AnonymousType,
        pointer: Register,
        _name: &str,
    ) -> Result<Register, Error> {
        self.push_value(|result| RecordedOp::Load { result, pointer })
    }

    fn store(&mut self, value: Register, pointer: Register) -> Result<(), Error> {
        self.push(RecordedOp::Store { value, pointer })
    }

    fn call(
        &mut self,
        function: &FunctionId,
        arguments: &[Register],
        _name: &str,
    ) -> Result<Option<Register>, Error> {
        let callee = self
            .functions
            .get(function.index())
            .ok_or_else(|| backend("unknown function handle"))?;
        if callee.parameters.len() != arguments.len() {
            return Err(backend(format!(
                "`{}` takes {} arguments, {} given",
                callee.name,
                callee.parameters.len(),
                arguments.len()
            )));
        }

        let callee_name = callee.name.clone();
        let result = if callee.return_type.is_void() {
            None
        } else {
            Some(self.next_register()?)
        };

        self.push(RecordedOp::Call {
            result,
            callee: callee_name,
            arguments: arguments.to_vec(),
        })?;
        Ok(result)
    }

    fn return_value(&mut self, value: Register) -> Result<(), Error> {
        self.push(RecordedOp::Return { value })
    }

    fn return_void(&mut self) -> Result<(), Error> {
        self.push(RecordedOp::ReturnVoid)
    }
}

/// A value produced while evaluating recorded instructions.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    String(String),
    /// Index of a memory slot created by an `alloca`.
    Pointer(usize),
    Void,
}

impl RuntimeValue {
    fn as_i64(&self) -> Result<i64, Error> {
        match self {
            RuntimeValue::Int(value) => Ok(*value),
            RuntimeValue::UInt(value) => Ok(*value as i64),
            RuntimeValue::Bool(value) => Ok(*value as i64),
            RuntimeValue::Float(value) => Ok(*value as i64),
            other => Err(backend(format!("{:?} is not a number", other))),
        }
    }

    fn as_u64(&self) -> Result<u64, Error> {
        match self {
            RuntimeValue::Int(value) => Ok(*value as u64),
            RuntimeValue::UInt(value) => Ok(*value),
            RuntimeValue::Bool(value) => Ok(*value as u64),
            RuntimeValue::Float(value) => Ok(*value as u64),
            other => Err(backend(format!("{:?} is not a number", other))),
        }
    }

    fn as_f64(&self) -> Result<f64, Error> {
        match self {
            RuntimeValue::Int(value) => Ok(*value as f64),
            RuntimeValue::UInt(value) => Ok(*value as f64),
            RuntimeValue::Bool(value) => Ok(*value as u8 as f64),
            RuntimeValue::Float(value) => Ok(*value),
            other => Err(backend(format!("{:?} is not a number", other))),
        }
    }

    /// Narrows an integer to the width of `primitive`.
    fn of_width(self, primitive: PrimitiveType) -> Result<RuntimeValue, Error> {
        let bits = primitive.bits();
        if primitive.is_floating() {
            return Ok(RuntimeValue::Float(if bits == 32 {
                self.as_f64()? as f32 as f64
            } else {
                self.as_f64()?
            }));
        }
        if primitive == PrimitiveType::Bool {
            return Ok(RuntimeValue::Bool(self.as_u64()? & 1 == 1));
        }
        if bits == 0 || bits >= 64 {
            return Ok(match primitive.is_unsigned() {
                true => RuntimeValue::UInt(self.as_u64()?),
                false => RuntimeValue::Int(self.as_i64()?),
            });
        }

        let mask = (1u64 << bits) - 1;
        let raw = self.as_u64()? & mask;
        if primitive.is_unsigned() {
            Ok(RuntimeValue::UInt(raw))
        } else {
            let shift = 64 - bits;
            Ok(RuntimeValue::Int(((raw << shift) as i64) >> shift))
        }
    }
}

struct Evaluator<'a> {
    functions: &'a [RecordedFunction],
    memory: Vec<RuntimeValue>,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    fn call(&mut self, name: &str, arguments: Vec<RuntimeValue>) -> Result<RuntimeValue, Error> {
        let functions = self.functions;
        let function = functions
            .iter()
            .find(|function| function.name == name)
            .ok_or_else(|| backend(format!("no function named `{}`", name)))?;

        if function.is_declaration() {
            return Err(backend(format!("`{}` has no body", name)));
        }
        if function.parameters.len() != arguments.len() {
            return Err(backend(format!(
                "`{}` takes {} arguments, {} given",
                name,
                function.parameters.len(),
                arguments.len()
            )));
        }
        if self.depth >= MAX_CALL_DEPTH {
            return Err(backend(format!(
                "call depth exceeded {} while calling `{}`",
                MAX_CALL_DEPTH, name
            )));
        }

        self.depth += 1;
        let result = self.execute(function, &arguments);
        self.depth -= 1;
        result
    }

    fn execute(
        &mut self,
        function: &RecordedFunction,
        arguments: &[RuntimeValue],
    ) -> Result<RuntimeValue, Error> {
        let mut registers = vec![RuntimeValue::Void; function.registers as usize];

        for op in &function.body {
            match op {
                RecordedOp::Block { .. } => {}
                RecordedOp::ConstInt {
                    result,
                    primitive,
                    value,
                } => {
                    registers[result.index()] = RuntimeValue::UInt(*value).of_width(*primitive)?;
                }
                RecordedOp::ConstFloat { result, value, .. } => {
                    registers[result.index()] = RuntimeValue::Float(*value);
                }
                RecordedOp::ConstBool { result, value } => {
                    registers[result.index()] = RuntimeValue::Bool(*value);
                }
                RecordedOp::ConstString { result, value } => {
                    registers[result.index()] = RuntimeValue::String(value.clone());
                }
                RecordedOp::Parameter { result, index } => {
                    registers[result.index()] = arguments
                        .get(*index)
                        .cloned()
                        .ok_or_else(|| backend(format!("parameter {} out of range", index)))?;
                }
                RecordedOp::Convert {
                    result, value, to, ..
                } => {
                    registers[result.index()] = registers[value.index()].clone().of_width(*to)?;
                }
                RecordedOp::Binary {
                    result,
                    instruction,
                    kind,
                    primitive,
                    lhs,
                    rhs,
                } => {
                    registers[result.index()] = arithmetic(
                        *instruction,
                        *kind,
                        &registers[lhs.index()],
                        &registers[rhs.index()],
                    )?
                    .of_width(*primitive)?;
                }
                RecordedOp::Alloca { result, .. } => {
                    self.memory.push(RuntimeValue::Void);
                    registers[result.index()] = RuntimeValue::Pointer(self.memory.len() - 1);
                }
                RecordedOp::Load { result, pointer } => {
                    let slot = self.slot(&registers[pointer.index()])?;
                    registers[result.index()] = self.memory[slot].clone();
                }
                RecordedOp::Store { value, pointer } => {
                    let slot = self.slot(&registers[pointer.index()])?;
                    self.memory[slot] = registers[value.index()].clone();
                }
                RecordedOp::Call {
                    result,
                    callee,
                    arguments,
                } => {
                    let values = arguments
                        .iter()
                        .map(|argument| registers[argument.index()].clone())
                        .collect();
                    let value = self.call(callee, values)?;
                    if let Some(result) = result {
                        registers[result.index()] = value;
                    }
                }
                RecordedOp::Return { value } => return Ok(registers[value.index()].clone()),
                RecordedOp::ReturnVoid => return Ok(RuntimeValue::Void),
            }
        }

        Err(backend(format!("`{}` fell off its last block", function.name)))
    }

    fn slot(&self, pointer: &RuntimeValue) -> Result<usize, Error> {
        match pointer {
            RuntimeValue::Pointer(slot) if *slot < self.memory.len() => Ok(*slot),
            other => Err(backend(format!("{:?} is not a valid pointer", other))),
        }
    }
}

fn arithmetic(
    instruction: BinaryInstruction,
    kind: NumericKind,
    lhs: &RuntimeValue,
    rhs: &RuntimeValue,
) -> Result<RuntimeValue, Error> {
    match kind {
        NumericKind::Floating => {
            let (lhs, rhs) = (lhs.as_f64()?, rhs.as_f64()?);
            Ok(RuntimeValue::Float(match instruction {
                BinaryInstruction::Add => lhs + rhs,
                BinaryInstruction::Subtract => lhs - rhs,
                BinaryInstruction::Multiply => lhs * rhs,
                BinaryInstruction::Divide => lhs / rhs,
            }))
        }
        NumericKind::Signed => {
            let (lhs, rhs) = (lhs.as_i64()?, rhs.as_i64()?);
            Ok(RuntimeValue::Int(match instruction {
                BinaryInstruction::Add => lhs.wrapping_add(rhs),
                BinaryInstruction::Subtract => lhs.wrapping_sub(rhs),
                BinaryInstruction::Multiply => lhs.wrapping_mul(rhs),
                BinaryInstruction::Divide if rhs == 0 => return Err(backend("division by zero")),
                BinaryInstruction::Divide => lhs.wrapping_div(rhs),
            }))
        }
        NumericKind::Unsigned => {
            let (lhs, rhs) = (lhs.as_u64()?, rhs.as_u64()?);
            Ok(RuntimeValue::UInt(match instruction {
                BinaryInstruction::Add => lhs.wrapping_add(rhs),
                BinaryInstruction::Subtract => lhs.wrapping_sub(rhs),
                BinaryInstruction::Multiply => lhs.wrapping_mul(rhs),
                BinaryInstruction::Divide if rhs == 0 => return Err(backend("division by zero")),
                BinaryInstruction::Divide => lhs / rhs,
            }))
        }
    }
}

fn backend(message: impl Into<String>) -> Error {
    Error::new(
        ErrorImpl::Backend {
            message: message.into(),
        },
        Span::EMPTY,
    )
}
