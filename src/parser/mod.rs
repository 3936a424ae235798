//! Parser module for building the node arena.
//!
//! This module turns a token stream into arena nodes. Every construct is
//! parsed by one stateless algorithm registered under a `Production`:
//!
//! - Type algorithms (referencing, type names, arrays, scalars, tuples)
//! - Statement algorithms (package, method, scope, locals, return)
//! - Value algorithms (literals, accesses, calls, operator composition)
//!
//! The `Parser` facade dispatches through the registry, so algorithms only
//! ever reach each other through `next_*` calls.

pub mod cursor;
pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
pub mod types;

#[cfg(test)]
mod tests;
