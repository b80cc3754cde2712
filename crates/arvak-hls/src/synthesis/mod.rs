//! Synthesis algorithms.
//!
//! Each function maps operation parameters to a [`Circuit`](arvak_ir::Circuit)
//! over the operation's qubits, followed by the ancillas the algorithm needs.
//! None of them look at a tracker or a coupling map; resource policy lives in
//! the [`plugins`](crate::plugins).

pub mod arithmetic;
pub mod clifford;
pub mod evolution;
pub mod linear;
pub mod mcx;
pub mod permutation;
pub mod qft;
pub mod token_swapper;

use arvak_ir::QubitId;

/// Qubit ids `start..start + len`.
pub(crate) fn register(start: usize, len: usize) -> Vec<QubitId> {
    (start..start + len).map(QubitId).collect()
}
