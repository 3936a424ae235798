/// AST (Abstract Syntax Tree) module
/// Contains the node arena and the structural type system
///
/// Submodules:
/// - ast: Node ids, node sum types, the arena and resolution states
/// - expressions: Value nodes (literals, accesses, calls, operations)
/// - operators: The composed operator table
/// - statements: Package, method, scope and statement nodes
/// - types: Referencing, type names, arrays and anonymous types
pub mod ast;
pub mod expressions;
pub mod operators;
pub mod statements;
pub mod types;
