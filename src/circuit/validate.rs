//! Circuit validation.

use crate::error::{EmcError, Result};

use super::Circuit;

/// Validate a circuit for solving.
///
/// Checks:
/// - The circuit has at least one element and one unknown
/// - No duplicate element names
/// - Every model label bound to a permeance is registered
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    if circuit.elements().is_empty() {
        return Err(EmcError::topology("Circuit has no elements"));
    }

    if circuit.matrix_size() == 0 {
        return Err(EmcError::topology(
            "Circuit has no unknowns: every element is connected to ground only",
        ));
    }

    if let Some(name) = circuit.first_duplicate_element() {
        return Err(EmcError::DuplicateElement {
            name: name.to_string(),
        });
    }

    if let Some(&(element, model)) = circuit.unresolved_models().first() {
        return Err(EmcError::UndefinedModel {
            model: model.to_string(),
            element: element.to_string(),
        });
    }

    Ok(())
}
