//! LLVM backend.
//!
//! Lowers the generator operations to LLVM IR through inkwell. The module
//! and builder are owned by the generator, the context is borrowed so it
//! outlives both of them.

use std::fmt::Display;

use inkwell::{
    builder::Builder,
    context::Context,
    execution_engine::{ExecutionEngine, GenericValue},
    module::{Linkage, Module},
    targets::{InitializationConfig, Target},
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum},
    values::{BasicMetadataValueEnum, BasicValue, BasicValueEnum, FunctionValue},
    AddressSpace, FloatPredicate, IntPredicate, OptimizationLevel,
};
use tracing::debug;

use crate::{
    ast::types::{AnonymousType, PrimitiveType, TypeName},
    errors::errors::{Error, ErrorImpl},
    Span,
};

use super::generator::{BinaryInstruction, CodeGenerator, NumericKind};

/// Code generator emitting LLVM IR.
///
/// Fields drop in declaration order: the builder first, then the execution
/// engine and the module it may own.
///
/// # Type Parameters
///
/// * `'ctx` - Lifetime of the LLVM context
pub struct LlvmGenerator<'ctx> {
    /// The LLVM IR builder
    builder: Builder<'ctx>,
    /// JIT engine, created on the first `run_function`
    engine: Option<ExecutionEngine<'ctx>>,
    /// The LLVM module holding every declared function
    module: Module<'ctx>,
    /// The LLVM context for creating types and values
    context: &'ctx Context,
    /// The function instructions are emitted into
    current: Option<FunctionValue<'ctx>>,
}

impl<'ctx> LlvmGenerator<'ctx> {
    /// Creates a generator with an empty module.
    ///
    /// # Arguments
    ///
    /// * `context` - The LLVM context, which must outlive the generator
    /// * `module_name` - Name of the module, usually the source file name
    ///
    /// # Returns
    ///
    /// A generator ready for `declare_function`
    pub fn new(context: &'ctx Context, module_name: &str) -> Self {
        let module = context.create_module(module_name);
        let builder = context.create_builder();

        LlvmGenerator {
            builder,
            engine: None,
            module,
            context,
            current: None,
        }
    }

    pub fn module(&self) -> &Module<'ctx> {
        &self.module
    }

    /// Returns the textual LLVM IR of the module.
    pub fn print_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }

    /// Runs the LLVM verifier over the module.
    pub fn verify(&self) -> Result<(), Error> {
        self.module.verify().map_err(|message| backend(message.to_string()))
    }

    /// JIT-compiles the module and runs one of its functions.
    ///
    /// Supports functions taking integer parameters and returning an
    /// integer or nothing.
    ///
    /// # Arguments
    ///
    /// * `name` - The symbol of the function to run
    /// * `arguments` - The integer arguments, passed as signed values
    ///
    /// # Returns
    ///
    /// The returned integer, sign-extended; 0 for void functions
    pub fn run_function(&mut self, name: &str, arguments: &[u64]) -> Result<u64, Error> {
        let function = self
            .module
            .get_function(name)
            .ok_or_else(|| backend(format!("no function named `{}`", name)))?;

        if self.engine.is_none() {
            Target::initialize_native(&InitializationConfig::default()).map_err(backend)?;
            let engine = self
                .module
                .create_jit_execution_engine(OptimizationLevel::None)
                .map_err(|message| backend(message.to_string()))?;
            self.engine = Some(engine);
        }
        let engine = self
            .engine
            .as_ref()
            .ok_or_else(|| backend("the execution engine is unavailable"))?;

        let parameters = function.get_params();
        if parameters.len() != arguments.len() {
            return Err(backend(format!(
                "`{}` takes {} arguments, {} given",
                name,
                parameters.len(),
                arguments.len()
            )));
        }

        let mut values = Vec::with_capacity(arguments.len());
        for (parameter, argument) in parameters.iter().zip(arguments) {
            let BasicValueEnum::IntValue(parameter) = parameter else {
                return Err(backend("only integer parameters can be passed to the JIT"));
            };
            values.push(parameter.get_type().create_generic_value(*argument, true));
        }
        let values: Vec<&GenericValue> = values.iter().collect();

        debug!("running `{}` through the JIT", name);
        let result = unsafe { engine.run_function(function, &values) };

        match function.get_type().get_return_type() {
            Some(_) => Ok(result.as_int(true)),
            None => Ok(0),
        }
    }

    /// Converts a language type to an LLVM basic type.
    ///
    /// Pointers and arrays become pointers to their element, tuples become
    /// anonymous structs and named types are opaque byte pointers.
    fn basic_type(&self, type_: &AnonymousType) -> Result<BasicTypeEnum<'ctx>, Error> {
        let element = match type_ {
            AnonymousType::Scalar(scalar) => match &scalar.name {
                TypeName::Primitive(primitive) => self.primitive_type(*primitive)?,
                TypeName::Single(_) | TypeName::Complex(_) => self
                    .context
                    .i8_type()
                    .ptr_type(AddressSpace::default())
                    .into(),
            },
            AnonymousType::Tuple(tuple) => {
                let mut fields = Vec::with_capacity(tuple.members.len());
                for member in &tuple.members {
                    fields.push(self.basic_type(member)?);
                }
                self.context.struct_type(&fields, false).into()
            }
        };

        let mut lowered = element;
        for _ in 0..type_.array().dimensions.len() + type_.referencing().depth() as usize {
            lowered = lowered.ptr_type(AddressSpace::default()).into();
        }
        Ok(lowered)
    }

    fn primitive_type(&self, primitive: PrimitiveType) -> Result<BasicTypeEnum<'ctx>, Error> {
        Ok(match primitive {
            PrimitiveType::Bool => self.context.bool_type().into(),
            PrimitiveType::Char | PrimitiveType::Byte | PrimitiveType::UByte => {
                self.context.i8_type().into()
            }
            PrimitiveType::Short | PrimitiveType::UShort => self.context.i16_type().into(),
            PrimitiveType::Int | PrimitiveType::UInt => self.context.i32_type().into(),
            PrimitiveType::Long | PrimitiveType::ULong => self.context.i64_type().into(),
            PrimitiveType::Float => self.context.f32_type().into(),
            PrimitiveType::Double => self.context.f64_type().into(),
            PrimitiveType::String => self
                .context
                .i8_type()
                .ptr_type(AddressSpace::default())
                .into(),
            PrimitiveType::Void | PrimitiveType::Unknown => {
                return Err(backend(format!("`{}` has no storage", primitive.name())))
            }
        })
    }

    fn function(&self) -> Result<FunctionValue<'ctx>, Error> {
        self.current
            .ok_or_else(|| backend("no function is being generated"))
    }
}

impl<'ctx> CodeGenerator for LlvmGenerator<'ctx> {
    type Value = BasicValueEnum<'ctx>;
    type Type = BasicTypeEnum<'ctx>;
    type Function = FunctionValue<'ctx>;

    fn lower_type(&mut self, type_: &AnonymousType) -> Result<BasicTypeEnum<'ctx>, Error> {
        self.basic_type(type_)
    }

    fn declare_function(
        &mut self,
        name: &str,
        return_type: &AnonymousType,
        parameters: &[AnonymousType],
    ) -> Result<FunctionValue<'ctx>, Error> {
        let mut lowered: Vec<BasicMetadataTypeEnum> = Vec::with_capacity(parameters.len());
        for parameter in parameters {
            lowered.push(self.basic_type(parameter)?.into());
        }

        let function_type = if return_type.is_void() {
            self.context.void_type().fn_type(&lowered, false)
        } else {
            self.basic_type(return_type)?.fn_type(&lowered, false)
        };

        Ok(self
            .module
            .add_function(name, function_type, Some(Linkage::External)))
    }

    fn enter_function(&mut self, function: &FunctionValue<'ctx>) -> Result<(), Error> {
        self.current = Some(*function);
        Ok(())
    }

    fn exit_function(&mut self) -> Result<(), Error> {
        let function = self.function()?;
        if !function.verify(false) {
            return Err(backend(format!(
                "`{}` failed verification",
                function.get_name().to_string_lossy()
            )));
        }
        self.current = None;
        Ok(())
    }

    fn current_function(&self) -> Option<FunctionValue<'ctx>> {
        self.current
    }

    fn append_block(&mut self, name: &str) -> Result<(), Error> {
        let function = self.function()?;
        let block = self.context.append_basic_block(function, name);
        self.builder.position_at_end(block);
        Ok(())
    }

    fn parameter(
        &mut self,
        function: &FunctionValue<'ctx>,
        index: usize,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        function
            .get_nth_param(index as u32)
            .ok_or_else(|| backend(format!("parameter {} out of range", index)))
    }

    fn const_int(
        &mut self,
        primitive: PrimitiveType,
        value: u64,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        let BasicTypeEnum::IntType(int_type) = self.primitive_type(primitive)? else {
            return Err(backend(format!("`{}` is not an integer type", primitive.name())));
        };
        Ok(int_type.const_int(value, !primitive.is_unsigned()).into())
    }

    fn const_float(
        &mut self,
        primitive: PrimitiveType,
        value: f64,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        let BasicTypeEnum::FloatType(float_type) = self.primitive_type(primitive)? else {
            return Err(backend(format!("`{}` is not a floating type", primitive.name())));
        };
        Ok(float_type.const_float(value).into())
    }

    fn const_bool(&mut self, value: bool) -> Result<BasicValueEnum<'ctx>, Error> {
        Ok(self.context.bool_type().const_int(value as u64, false).into())
    }

    fn const_string(&mut self, value: &str) -> Result<BasicValueEnum<'ctx>, Error> {
        let global = self
            .builder
            .build_global_string_ptr(value, "str")
            .map_err(backend)?;
        Ok(global.as_pointer_value().into())
    }

    fn convert(
        &mut self,
        value: BasicValueEnum<'ctx>,
        from: PrimitiveType,
        to: PrimitiveType,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        let target = self.primitive_type(to)?;
        let converted: BasicValueEnum<'ctx> = match (value, target) {
            (BasicValueEnum::IntValue(int), BasicTypeEnum::IntType(int_type)) => {
                if to == PrimitiveType::Bool {
                    let zero = int.get_type().const_zero();
                    self.builder
                        .build_int_compare(IntPredicate::NE, int, zero, "")
                        .map_err(backend)?
                        .into()
                } else {
                    let signed = !from.is_unsigned() && from != PrimitiveType::Bool;
                    self.builder
                        .build_int_cast_sign_flag(int, int_type, signed, "")
                        .map_err(backend)?
                        .into()
                }
            }
            (BasicValueEnum::IntValue(int), BasicTypeEnum::FloatType(float_type)) => {
                if from.is_unsigned() || from == PrimitiveType::Bool {
                    self.builder
                        .build_unsigned_int_to_float(int, float_type, "")
                        .map_err(backend)?
                        .into()
                } else {
                    self.builder
                        .build_signed_int_to_float(int, float_type, "")
                        .map_err(backend)?
                        .into()
                }
            }
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::FloatType(float_type)) => self
                .builder
                .build_float_cast(float, float_type, "")
                .map_err(backend)?
                .into(),
            (BasicValueEnum::FloatValue(float), BasicTypeEnum::IntType(int_type)) => {
                if to == PrimitiveType::Bool {
                    let zero = float.get_type().const_zero();
                    self.builder
                        .build_float_compare(FloatPredicate::ONE, float, zero, "")
                        .map_err(backend)?
                        .into()
                } else if to.is_unsigned() {
                    self.builder
                        .build_float_to_unsigned_int(float, int_type, "")
                        .map_err(backend)?
                        .into()
                } else {
                    self.builder
                        .build_float_to_signed_int(float, int_type, "")
                        .map_err(backend)?
                        .into()
                }
            }
            _ => {
                return Err(backend(format!(
                    "cannot convert `{}` to `{}`",
                    from.name(),
                    to.name()
                )))
            }
        };
        Ok(converted)
    }

    fn binary(
        &mut self,
        instruction: BinaryInstruction,
        primitive: PrimitiveType,
        lhs: BasicValueEnum<'ctx>,
        rhs: BasicValueEnum<'ctx>,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        let kind = NumericKind::of(primitive);
        let result: BasicValueEnum<'ctx> = match (lhs, rhs) {
            (BasicValueEnum::FloatValue(lhs), BasicValueEnum::FloatValue(rhs))
                if kind == NumericKind::Floating =>
            {
                match instruction {
                    BinaryInstruction::Add => self.builder.build_float_add(lhs, rhs, name),
                    BinaryInstruction::Subtract => self.builder.build_float_sub(lhs, rhs, name),
                    BinaryInstruction::Multiply => self.builder.build_float_mul(lhs, rhs, name),
                    BinaryInstruction::Divide => self.builder.build_float_div(lhs, rhs, name),
                }
                .map_err(backend)?
                .into()
            }
            (BasicValueEnum::IntValue(lhs), BasicValueEnum::IntValue(rhs)) => {
                match (instruction, kind) {
                    (BinaryInstruction::Add, _) => self.builder.build_int_add(lhs, rhs, name),
                    (BinaryInstruction::Subtract, _) => self.builder.build_int_sub(lhs, rhs, name),
                    (BinaryInstruction::Multiply, _) => self.builder.build_int_mul(lhs, rhs, name),
                    (BinaryInstruction::Divide, NumericKind::Unsigned) => {
                        self.builder.build_int_unsigned_div(lhs, rhs, name)
                    }
                    (BinaryInstruction::Divide, _) => {
                        self.builder.build_int_signed_div(lhs, rhs, name)
                    }
                }
                .map_err(backend)?
                .into()
            }
            _ => {
                return Err(backend(format!(
                    "`{}` needs two numeric operands of the same kind",
                    instruction
                )))
            }
        };
        Ok(result)
    }

    fn alloca(
        &mut self,
        type_: &BasicTypeEnum<'ctx>,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        Ok(self
            .builder
            .build_alloca(*type_, name)
            .map_err(backend)?
            .into())
    }

    fn load(
        &mut self,
        _type_: &BasicTypeEnum<'ctx>,
        pointer: BasicValueEnum<'ctx>,
        name: &str,
    ) -> Result<BasicValueEnum<'ctx>, Error> {
        let BasicValueEnum::PointerValue(pointer) = pointer else {
            return Err(backend("load needs a pointer"));
        };
        self.builder.build_load(pointer, name).map_err(backend)
    }

    fn store(
        &mut self,
        value: BasicValueEnum<'ctx>,
        pointer: BasicValueEnum<'ctx>,
    ) -> Result<(), Error> {
        let BasicValueEnum::PointerValue(pointer) = pointer else {
            return Err(backend("store needs a pointer"));
        };
        self.builder.build_store(pointer, value).map_err(backend)?;
        Ok(())
    }

    fn call(
        &mut self,
        function: &FunctionValue<'ctx>,
        arguments: &[BasicValueEnum<'ctx>],
        name: &str,
    ) -> Result<Option<BasicValueEnum<'ctx>>, Error> {
        let arguments: Vec<BasicMetadataValueEnum> =
            arguments.iter().map(|argument| (*argument).into()).collect();
        let call = self
            .builder
            .build_call(*function, &arguments, name)
            .map_err(backend)?;
        Ok(call.try_as_basic_value().left())
    }

    fn return_value(&mut self, value: BasicValueEnum<'ctx>) -> Result<(), Error> {
        self.builder
            .build_return(Some(&value as &dyn BasicValue))
            .map_err(backend)?;
        Ok(())
    }

    fn return_void(&mut self) -> Result<(), Error> {
        self.builder.build_return(None).map_err(backend)?;
        Ok(())
    }
}

fn backend(message: impl Display) -> Error {
    Error::new(
        ErrorImpl::Backend {
            message: message.to_string(),
        },
        Span::EMPTY,
    )
}
