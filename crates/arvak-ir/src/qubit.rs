//! Qubit and classical bit identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a qubit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub usize);

impl QubitId {
    /// The position of this qubit in the circuit's qubit list.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<usize> for QubitId {
    fn from(id: usize) -> Self {
        QubitId(id)
    }
}

/// Index of a classical bit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub usize);

impl ClbitId {
    /// The position of this bit in the circuit's classical bit list.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<usize> for ClbitId {
    fn from(id: usize) -> Self {
        ClbitId(id)
    }
}

/// Shorthand for building a list of qubit ids from plain indices.
pub fn qubits(indices: impl IntoIterator<Item = usize>) -> Vec<QubitId> {
    indices.into_iter().map(QubitId).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qubit_display() {
        assert_eq!(format!("{}", QubitId(0)), "q0");
        assert_eq!(format!("{}", ClbitId(3)), "c3");
    }

    #[test]
    fn test_qubits_helper() {
        assert_eq!(qubits(1..3), vec![QubitId(1), QubitId(2)]);
    }
}
