use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    ast::{
        ast::{Ast, LoadStrategy, Node, NodeId, Resolution, Stmt, Value, Variable},
        expressions::Constant,
        operators::Operator,
        types::{AnonymousType, PrimitiveType, Types},
    },
    errors::errors::{Error, ErrorImpl},
    resolver::scope::value_type,
    Span,
};

use super::generator::{BinaryInstruction, CodeGenerator};

/// Lowers a resolved package into `generator`.
///
/// Every method is declared before any body is lowered, so calls to methods
/// declared later in the file find their callee. Overloads after the first
/// get the symbol `name.N`, where `N` counts the earlier overloads.
///
/// # Arguments
///
/// * `ast` - The arena, after all resolution phases have run
/// * `root` - The package node
/// * `generator` - The backend receiving the instructions
///
/// # Returns
///
/// `Ok(())` once every method has been lowered, or the first error hit
pub fn generate<G: CodeGenerator>(ast: &Ast, root: NodeId, generator: &mut G) -> Result<(), Error> {
    let mut lowering = Lowering::new(ast);
    lowering.package(root, generator)
}

struct Lowering<'a, G: CodeGenerator> {
    ast: &'a Ast,
    functions: HashMap<NodeId, G::Function>,
    /// Storage pointer and stored type of each local of the current method.
    locals: HashMap<NodeId, (G::Value, G::Type)>,
    method: Option<NodeId>,
}

impl<'a, G: CodeGenerator> Lowering<'a, G> {
    fn new(ast: &'a Ast) -> Self {
        Lowering {
            ast,
            functions: HashMap::new(),
            locals: HashMap::new(),
            method: None,
        }
    }

    fn package(&mut self, root: NodeId, generator: &mut G) -> Result<(), Error> {
        let ast = self.ast;
        let package = ast
            .node(root)
            .as_package()
            .ok_or_else(|| unresolved(ast, root))?;

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for id in &package.methods {
            let Some(method) = ast.node(*id).as_method() else {
                return Err(unresolved(ast, *id));
            };

            let count = seen.entry(method.name.value.as_str()).or_insert(0);
            let symbol = match *count {
                0 => method.name.value.clone(),
                n => format!("{}.{}", method.name.value, n),
            };
            *count += 1;

            let function = generator.declare_function(
                &symbol,
                &method.return_type,
                &method.parameter_types(),
            )?;
            self.functions.insert(*id, function);
        }

        debug!(
            "declared {} functions for package `{}`",
            self.functions.len(),
            package.name
        );

        for id in &package.methods {
            self.method(*id, generator)?;
        }

        Ok(())
    }

    fn method(&mut self, id: NodeId, generator: &mut G) -> Result<(), Error> {
        let ast = self.ast;
        let method = ast
            .node(id)
            .as_method()
            .ok_or_else(|| unresolved(ast, id))?;
        let function = self
            .functions
            .get(&id)
            .cloned()
            .ok_or_else(|| unresolved(ast, id))?;

        debug!("lowering method `{}`", method.signature());
        self.locals.clear();
        self.method = Some(id);

        generator.enter_function(&function)?;
        let terminated = self.scope(method.body, generator)?;
        if !terminated {
            if !method.return_type.is_void() {
                return Err(Error::at(
                    ErrorImpl::Backend {
                        message: format!("`{}` ends without returning a value", method.signature()),
                    },
                    &method.name,
                    "this method",
                ));
            }
            generator.return_void()?;
        }
        generator.exit_function()?;

        self.method = None;
        Ok(())
    }

    /// Lowers a scope into a fresh block. Returns whether the block ended
    /// with a terminator.
    fn scope(&mut self, id: NodeId, generator: &mut G) -> Result<bool, Error> {
        let ast = self.ast;
        let scope = ast
            .node(id)
            .as_scope()
            .ok_or_else(|| unresolved(ast, id))?;

        generator.append_block("scope")?;
        for statement in &scope.statements {
            trace!("lowering {:?}", ast.node(*statement).kind());
            match ast.node(*statement) {
                Node::Stmt(Stmt::ImmutableLocal(_)) | Node::Stmt(Stmt::MutableLocal(_)) => {
                    self.local(*statement, generator)?;
                }
                Node::Stmt(Stmt::Return(_)) => {
                    self.ret(*statement, generator)?;
                    return Ok(true);
                }
                Node::Stmt(Stmt::Scope(_)) => {
                    if self.scope(*statement, generator)? {
                        return Ok(true);
                    }
                }
                Node::Value(Value::MethodCall(_)) => {
                    self.call(*statement, generator)?;
                }
                Node::Value(_) => {
                    self.value(*statement, generator)?;
                }
                Node::Eof | Node::Empty => {}
                Node::Package(_) | Node::Method(_) | Node::Error(_) => {
                    return Err(unresolved(ast, *statement));
                }
            }
        }

        Ok(false)
    }

    fn local(&mut self, id: NodeId, generator: &mut G) -> Result<(), Error> {
        let ast = self.ast;
        let local = ast
            .node(id)
            .as_local()
            .ok_or_else(|| unresolved(ast, id))?;
        let Resolution::Resolved(resolved) = &local.resolved_type else {
            return Err(unresolved(ast, id));
        };

        let stored = resolved.as_value();
        let lowered = generator.lower_type(&stored)?;

        let value = self.value(local.value, generator)?;
        let value = self.coerce(local.value, value, &stored, generator)?;

        let pointer = generator.alloca(&lowered, &local.name.value)?;
        generator.store(value, pointer.clone())?;
        self.locals.insert(id, (pointer, lowered));
        Ok(())
    }

    fn ret(&mut self, id: NodeId, generator: &mut G) -> Result<(), Error> {
        let ast = self.ast;
        let Node::Stmt(Stmt::Return(ret)) = ast.node(id) else {
            return Err(unresolved(ast, id));
        };

        match ret.value {
            Some(value_id) => {
                let return_type = self.return_type(id)?;
                let value = self.value(value_id, generator)?;
                let value = self.coerce(value_id, value, &return_type, generator)?;
                generator.return_value(value)
            }
            None => generator.return_void(),
        }
    }

    fn value(&mut self, id: NodeId, generator: &mut G) -> Result<G::Value, Error> {
        let ast = self.ast;
        let Node::Value(value) = ast.node(id) else {
            return Err(unresolved(ast, id));
        };

        match value {
            Value::Literal(literal) => {
                let primitive = literal
                    .value_type
                    .as_resolved()
                    .and_then(AnonymousType::primitive)
                    .ok_or_else(|| unresolved(ast, id))?;

                match &literal.constant {
                    Constant::Bool(value) => generator.const_bool(*value),
                    Constant::Char(value) => generator.const_int(primitive, *value as u64),
                    Constant::String(value) => generator.const_string(value),
                    Constant::Integer(value) => generator.const_int(primitive, *value),
                    Constant::Float(value) => generator.const_float(primitive, *value),
                }
            }
            Value::NameAccess(access) => {
                let Resolution::Resolved(variable) = access.variable else {
                    return Err(unresolved(ast, id));
                };
                self.load_variable(variable, LoadStrategy::LoadPointer, generator)
            }
            Value::MethodCall(call) => match self.call(id, generator)? {
                Some(value) => Ok(value),
                None => Err(Error::at(
                    ErrorImpl::VoidValue {
                        name: call.name.value.clone(),
                    },
                    &call.name,
                    "this call does not produce a value",
                )),
            },
            Value::BinaryOperation(operation) => {
                let result = resolved_primitive(ast, id)?;
                let instruction = match operation.operator {
                    Operator::Add => BinaryInstruction::Add,
                    Operator::Negate => BinaryInstruction::Subtract,
                    Operator::Multiply => BinaryInstruction::Multiply,
                    Operator::Divide => BinaryInstruction::Divide,
                    _ => return Err(unresolved(ast, id)),
                };

                let target = Types::primitive(result);

                let lhs = self.value(operation.left, generator)?;
                let lhs = self.coerce(operation.left, lhs, &target, generator)?;
                let rhs = self.value(operation.right, generator)?;
                let rhs = self.coerce(operation.right, rhs, &target, generator)?;

                generator.binary(instruction, result, lhs, rhs, "")
            }
            Value::LocalAssign(assign) => {
                let Resolution::Resolved(variable) = assign.variable else {
                    return Err(unresolved(ast, id));
                };
                let stored = match variable.resolved_type(ast) {
                    Resolution::Resolved(type_) => type_.as_value(),
                    _ => return Err(unresolved(ast, id)),
                };

                let value = self.value(assign.value, generator)?;
                let value = self.coerce(assign.value, value, &stored, generator)?;
                let pointer = self.load_variable(variable, LoadStrategy::KeepPointer, generator)?;
                generator.store(value.clone(), pointer)?;
                Ok(value)
            }
        }
    }

    fn call(&mut self, id: NodeId, generator: &mut G) -> Result<Option<G::Value>, Error> {
        let ast = self.ast;
        let Node::Value(Value::MethodCall(call)) = ast.node(id) else {
            return Err(unresolved(ast, id));
        };
        let Resolution::Resolved(method) = call.method else {
            return Err(unresolved(ast, id));
        };
        let function = self
            .functions
            .get(&method)
            .cloned()
            .ok_or_else(|| unresolved(ast, id))?;

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            arguments.push(self.value(*argument, generator)?);
        }

        generator.call(&function, &arguments, &call.name.value)
    }

    /// Produces the value stored in `variable`, or its storage pointer when
    /// the caller asks to keep it.
    fn load_variable(
        &mut self,
        variable: Variable,
        strategy: LoadStrategy,
        generator: &mut G,
    ) -> Result<G::Value, Error> {
        let ast = self.ast;
        match variable {
            Variable::Parameter { method, index } => {
                if strategy == LoadStrategy::KeepPointer {
                    return Err(unresolved(ast, method));
                }
                let function = self
                    .functions
                    .get(&method)
                    .cloned()
                    .ok_or_else(|| unresolved(ast, method))?;
                generator.parameter(&function, index)
            }
            Variable::ImmutableLocal(local) | Variable::MutableLocal(local) => {
                let (pointer, type_) = self
                    .locals
                    .get(&local)
                    .cloned()
                    .ok_or_else(|| unresolved(ast, local))?;

                match strategy {
                    LoadStrategy::LoadPointer => {
                        let name = variable
                            .name(ast)
                            .map_or_else(String::new, |name| name.value.clone());
                        generator.load(&type_, pointer, &name)
                    }
                    LoadStrategy::KeepPointer => Ok(pointer),
                }
            }
        }
    }

    /// Converts `value`, computed by node `id`, to `target` when both are
    /// different arithmetic primitives.
    fn coerce(
        &self,
        id: NodeId,
        value: G::Value,
        target: &AnonymousType,
        generator: &mut G,
    ) -> Result<G::Value, Error> {
        let ast = self.ast;
        let from = value_type(ast, id)
            .as_resolved()
            .and_then(AnonymousType::primitive);

        match (from, target.primitive()) {
            (Some(from), Some(to)) if from != to && from.is_arithmetic() && to.is_arithmetic() => {
                generator.convert(value, from, to)
            }
            _ => Ok(value),
        }
    }

    fn return_type(&self, id: NodeId) -> Result<AnonymousType, Error> {
        let ast = self.ast;
        self.method
            .and_then(|method| ast.node(method).as_method())
            .map(|method| method.return_type.clone())
            .ok_or_else(|| unresolved(ast, id))
    }
}

fn resolved_primitive(ast: &Ast, id: NodeId) -> Result<PrimitiveType, Error> {
    value_type(ast, id)
        .as_resolved()
        .and_then(AnonymousType::primitive)
        .ok_or_else(|| unresolved(ast, id))
}

fn unresolved(ast: &Ast, id: NodeId) -> Error {
    let node = ast.node(id);
    let span = node.token().map_or(Span::EMPTY, |token| token.span);

    Error::new(
        ErrorImpl::UnresolvedNode {
            kind: format!("{:?}", node.kind()),
        },
        span,
    )
}
