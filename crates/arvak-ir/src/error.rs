//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur in IR operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit not found in circuit.
    #[error("Qubit {qubit:?} not found in circuit{}", format_gate_context(.gate_name))]
    QubitNotFound {
        /// The qubit that was not found.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Classical bit not found in circuit.
    #[error("Classical bit {clbit:?} not found in circuit{}", format_gate_context(.gate_name))]
    ClbitNotFound {
        /// The classical bit that was not found.
        clbit: ClbitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// Operation requires a different number of qubits.
    #[error("Operation '{gate_name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the operation.
        gate_name: String,
        /// Expected number of qubits.
        expected: usize,
        /// Actual number of qubits provided.
        got: usize,
    },

    /// Parameter is unbound.
    #[error("Parameter '{0}' is unbound")]
    UnboundParameter(String),

    /// Duplicate qubit in operation.
    #[error("Duplicate qubit {qubit:?} in operation{}", format_gate_context(.gate_name))]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Optional gate name for context.
        gate_name: Option<String>,
    },

    /// The instruction has no inverse (measure, reset, ...).
    #[error("Instruction '{0}' cannot be inverted")]
    NotInvertible(String),

    /// A fractional power was requested for a circuit that only supports integer powers.
    #[error("Cannot raise circuit to non-integer power {0}")]
    NonIntegerPower(f64),

    /// Unrecognized gate modifier keyword.
    #[error("Unknown modifier '{0}'")]
    UnknownModifier(String),

    /// Invalid parameters for a high-level operation.
    #[error("Invalid operation '{name}': {reason}")]
    InvalidOperation {
        /// Name of the operation.
        name: String,
        /// Why the parameters were rejected.
        reason: String,
    },

    /// Malformed Pauli label or operator.
    #[error("Invalid Pauli operator: {0}")]
    InvalidPauli(String),
}

/// Helper function to format optional gate context.
#[allow(clippy::ref_option)]
fn format_gate_context(gate_name: &Option<String>) -> String {
    match gate_name {
        Some(name) => format!(" (gate: {name})"),
        None => String::new(),
    }
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
