//! Clifford operators in stabilizer-tableau form.
//!
//! The tableau has `2n` rows and `2n + 1` columns. Row `i < n` is the image of
//! `X_i` under conjugation (a destabilizer), row `n + i` the image of `Z_i`
//! (a stabilizer). Each row stores the X bits, then the Z bits, then a sign bit.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::InstructionKind;

/// A Clifford operator, up to global phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clifford {
    num_qubits: usize,
    tableau: Array2<bool>,
}

impl Clifford {
    /// The identity Clifford on `num_qubits` qubits.
    pub fn identity(num_qubits: usize) -> Self {
        let tableau =
            Array2::from_shape_fn((2 * num_qubits, 2 * num_qubits + 1), |(r, c)| r == c);
        Self {
            num_qubits,
            tableau,
        }
    }

    /// Build from a raw tableau, checking its shape and symplectic structure.
    pub fn from_tableau(tableau: Array2<bool>) -> IrResult<Self> {
        let rows = tableau.nrows();
        if rows % 2 != 0 || tableau.ncols() != rows + 1 {
            return Err(invalid(format!(
                "tableau shape {}x{} is not 2n x (2n+1)",
                rows,
                tableau.ncols()
            )));
        }
        let clifford = Self {
            num_qubits: rows / 2,
            tableau,
        };
        if !clifford.is_symplectic() {
            return Err(invalid("tableau rows violate the commutation relations".into()));
        }
        Ok(clifford)
    }

    /// Simulate a circuit of Clifford gates on the identity tableau.
    pub fn from_circuit(circuit: &Circuit) -> IrResult<Self> {
        let mut clifford = Self::identity(circuit.num_qubits());
        clifford.append_circuit(circuit)?;
        Ok(clifford)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The raw tableau.
    pub fn tableau(&self) -> &Array2<bool> {
        &self.tableau
    }

    /// X bit of qubit `q` in row `row`.
    #[inline]
    pub fn x(&self, row: usize, q: usize) -> bool {
        self.tableau[[row, q]]
    }

    /// Z bit of qubit `q` in row `row`.
    #[inline]
    pub fn z(&self, row: usize, q: usize) -> bool {
        self.tableau[[row, self.num_qubits + q]]
    }

    /// Sign bit of row `row` (`true` means a minus sign).
    #[inline]
    pub fn phase(&self, row: usize) -> bool {
        self.tableau[[row, 2 * self.num_qubits]]
    }

    /// True when the tableau equals the identity, signs included.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity(self.num_qubits)
    }

    fn is_symplectic(&self) -> bool {
        let n = self.num_qubits;
        let anticommute = |a: usize, b: usize| {
            (0..n).fold(false, |acc, q| {
                acc ^ (self.x(a, q) & self.z(b, q)) ^ (self.z(a, q) & self.x(b, q))
            })
        };
        (0..2 * n).all(|a| {
            (a + 1..2 * n).all(|b| {
                let expected = b == a + n && a < n;
                anticommute(a, b) == expected
            })
        })
    }

    // =========================================================================
    // Gate updates (conjugation of every row)
    // =========================================================================

    fn columns(&self, q: usize) -> (usize, usize, usize) {
        (q, self.num_qubits + q, 2 * self.num_qubits)
    }

    /// Append a Hadamard.
    pub fn apply_h(&mut self, q: usize) {
        let (xc, zc, pc) = self.columns(q);
        for r in 0..2 * self.num_qubits {
            let (x, z) = (self.tableau[[r, xc]], self.tableau[[r, zc]]);
            self.tableau[[r, pc]] ^= x & z;
            self.tableau[[r, xc]] = z;
            self.tableau[[r, zc]] = x;
        }
    }

    /// Append an S gate.
    pub fn apply_s(&mut self, q: usize) {
        let (xc, zc, pc) = self.columns(q);
        for r in 0..2 * self.num_qubits {
            let (x, z) = (self.tableau[[r, xc]], self.tableau[[r, zc]]);
            self.tableau[[r, pc]] ^= x & z;
            self.tableau[[r, zc]] = z ^ x;
        }
    }

    /// Append an S-dagger gate.
    pub fn apply_sdg(&mut self, q: usize) {
        let (xc, zc, pc) = self.columns(q);
        for r in 0..2 * self.num_qubits {
            let (x, z) = (self.tableau[[r, xc]], self.tableau[[r, zc]]);
            self.tableau[[r, pc]] ^= x & !z;
            self.tableau[[r, zc]] = z ^ x;
        }
    }

    /// Append a Pauli X.
    pub fn apply_x(&mut self, q: usize) {
        let (_, zc, pc) = self.columns(q);
        for r in 0..2 * self.num_qubits {
            let z = self.tableau[[r, zc]];
            self.tableau[[r, pc]] ^= z;
        }
    }

    /// Append a Pauli Z.
    pub fn apply_z(&mut self, q: usize) {
        let (xc, _, pc) = self.columns(q);
        for r in 0..2 * self.num_qubits {
            let x = self.tableau[[r, xc]];
            self.tableau[[r, pc]] ^= x;
        }
    }

    /// Append a Pauli Y.
    pub fn apply_y(&mut self, q: usize) {
        let (xc, zc, pc) = self.columns(q);
        for r in 0..2 * self.num_qubits {
            let (x, z) = (self.tableau[[r, xc]], self.tableau[[r, zc]]);
            self.tableau[[r, pc]] ^= x ^ z;
        }
    }

    /// Append a CX with control `c` and target `t`.
    pub fn apply_cx(&mut self, c: usize, t: usize) {
        let n = self.num_qubits;
        let pc = 2 * n;
        for r in 0..2 * n {
            let (x0, z0) = (self.tableau[[r, c]], self.tableau[[r, n + c]]);
            let (x1, z1) = (self.tableau[[r, t]], self.tableau[[r, n + t]]);
            self.tableau[[r, pc]] ^= (x1 ^ z0 ^ true) & z1 & x0;
            self.tableau[[r, t]] = x1 ^ x0;
            self.tableau[[r, n + c]] = z0 ^ z1;
        }
    }

    /// Append a CZ.
    pub fn apply_cz(&mut self, a: usize, b: usize) {
        self.apply_h(b);
        self.apply_cx(a, b);
        self.apply_h(b);
    }

    /// Append a SWAP.
    pub fn apply_swap(&mut self, a: usize, b: usize) {
        let n = self.num_qubits;
        for r in 0..2 * n {
            self.tableau.swap([r, a], [r, b]);
            self.tableau.swap([r, n + a], [r, n + b]);
        }
    }

    /// Append a standard gate, rejecting gates outside the Clifford group.
    pub fn apply_gate(&mut self, gate: &StandardGate, qubits: &[usize]) -> IrResult<()> {
        match gate {
            StandardGate::I => {}
            StandardGate::X => self.apply_x(qubits[0]),
            StandardGate::Y => self.apply_y(qubits[0]),
            StandardGate::Z => self.apply_z(qubits[0]),
            StandardGate::H => self.apply_h(qubits[0]),
            StandardGate::S => self.apply_s(qubits[0]),
            StandardGate::Sdg => self.apply_sdg(qubits[0]),
            StandardGate::SX => {
                self.apply_h(qubits[0]);
                self.apply_s(qubits[0]);
                self.apply_h(qubits[0]);
            }
            StandardGate::SXdg => {
                self.apply_h(qubits[0]);
                self.apply_sdg(qubits[0]);
                self.apply_h(qubits[0]);
            }
            StandardGate::CX => self.apply_cx(qubits[0], qubits[1]),
            StandardGate::CZ => self.apply_cz(qubits[0], qubits[1]),
            StandardGate::CY => {
                self.apply_sdg(qubits[1]);
                self.apply_cx(qubits[0], qubits[1]);
                self.apply_s(qubits[1]);
            }
            StandardGate::Swap => self.apply_swap(qubits[0], qubits[1]),
            StandardGate::ISwap => {
                let definition = gate
                    .definition()
                    .ok_or_else(|| invalid("iswap has no definition".into()))?;
                for inst in definition.instructions() {
                    if let InstructionKind::Gate(g) = &inst.kind {
                        let mapped: Vec<usize> =
                            inst.qubits.iter().map(|q| qubits[q.index()]).collect();
                        self.apply_gate(g, &mapped)?;
                    }
                }
            }
            other => {
                return Err(invalid(format!("gate '{}' is not a Clifford", other.name())));
            }
        }
        Ok(())
    }

    /// Append every instruction of a circuit.
    pub fn append_circuit(&mut self, circuit: &Circuit) -> IrResult<()> {
        for inst in circuit.instructions() {
            let qubits: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
            match &inst.kind {
                InstructionKind::Gate(g) => self.apply_gate(g, &qubits)?,
                InstructionKind::Barrier | InstructionKind::Delay { .. } => {}
                _ => {
                    return Err(invalid(format!(
                        "instruction '{}' is not a Clifford gate",
                        inst.name()
                    )));
                }
            }
        }
        Ok(())
    }
}

fn invalid(reason: String) -> IrError {
    IrError::InvalidOperation {
        name: "clifford".into(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QubitId;

    #[test]
    fn test_identity_is_symplectic() {
        let id = Clifford::identity(3);
        assert!(id.is_identity());
        assert!(Clifford::from_tableau(id.tableau().clone()).is_ok());
    }

    #[test]
    fn test_h_squared_is_identity() {
        let mut c = Clifford::identity(1);
        c.apply_h(0);
        assert!(!c.is_identity());
        c.apply_h(0);
        assert!(c.is_identity());
    }

    #[test]
    fn test_s_fourth_power_is_identity() {
        let mut c = Clifford::identity(1);
        for _ in 0..2 {
            c.apply_s(0);
        }
        // S² = Z flips the sign of the X image only.
        assert!(c.phase(0));
        assert!(!c.phase(1));
        for _ in 0..2 {
            c.apply_s(0);
        }
        assert!(c.is_identity());
    }

    #[test]
    fn test_bell_circuit_tableau() {
        let mut circuit = Circuit::with_size("bell", 2, 0);
        circuit.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let c = Clifford::from_circuit(&circuit).unwrap();
        // Z_0 maps to X_0 X_1.
        assert!(c.x(2, 0) && c.x(2, 1));
        assert!(!c.z(2, 0) && !c.z(2, 1));
    }

    #[test]
    fn test_non_clifford_rejected() {
        let mut circuit = Circuit::with_size("t", 1, 0);
        circuit.t(QubitId(0)).unwrap();
        assert!(Clifford::from_circuit(&circuit).is_err());
    }
}
