//! Semantic resolution over the node arena.
//!
//! This module gives every parsed node its meaning:
//!
//! - `hierarchy` wires parents and fixes the traversal order
//! - `scope` answers name, overload and value-type questions
//! - `resolver` drives the four resolution phases and reports diagnostics
//!
//! Problems are accumulated, a failed node never triggers a second
//! diagnostic in the nodes that depend on it.

pub mod hierarchy;
pub mod resolver;
pub mod scope;

#[cfg(test)]
mod tests;
