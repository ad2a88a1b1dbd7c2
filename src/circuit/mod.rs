//! Circuit graph representation and validation.
//!
//! This module provides the in-memory representation of a magnetic circuit.
//! The [`Circuit`] struct holds all elements, nodes, and the material model
//! registry in a form suitable for solving.

mod graph;
mod types;
mod validate;

pub use graph::{Circuit, ModelRegistry};
pub use types::*;
pub use validate::validate_circuit;
