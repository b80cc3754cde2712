//! Dense statevector simulation for checking synthesized circuits.
//!
//! Qubit `q` is bit `q` of the basis-state index (little-endian). `U` and
//! `CX` are applied natively along with every single-qubit gate through its
//! Euler form; other gates are expanded through their definitions.
//! Exponential in the qubit count, so only meant for small circuits.

use ndarray::Array2;
use num_complex::Complex64;

use crate::circuit::Circuit;
use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::InstructionKind;
use crate::operation::HighLevelOperation;

/// Tolerance for amplitude comparisons.
pub const SIM_EPSILON: f64 = 1e-8;

/// Largest register the simulator accepts.
pub const MAX_SIM_QUBITS: usize = 20;

type Matrix2 = [[Complex64; 2]; 2];

fn u_matrix(theta: f64, phi: f64, lambda: f64, phase: f64) -> Matrix2 {
    let (c, s) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    let g = Complex64::from_polar(1.0, phase);
    [
        [g * c, -g * Complex64::from_polar(s, lambda)],
        [
            g * Complex64::from_polar(s, phi),
            g * Complex64::from_polar(c, phi + lambda),
        ],
    ]
}

/// A pure state on `num_qubits` qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    num_qubits: usize,
    amplitudes: Vec<Complex64>,
}

impl Statevector {
    /// The computational basis state `|index⟩`.
    pub fn basis_state(num_qubits: usize, index: usize) -> IrResult<Self> {
        if num_qubits > MAX_SIM_QUBITS || index >= 1 << num_qubits {
            return Err(simulation_error(format!(
                "basis state {index} on {num_qubits} qubits is out of range"
            )));
        }
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Ok(Self {
            num_qubits,
            amplitudes,
        })
    }

    /// The all-zero state.
    pub fn zero(num_qubits: usize) -> IrResult<Self> {
        Self::basis_state(num_qubits, 0)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Raw amplitudes.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Run a circuit on the state.
    pub fn evolve(&mut self, circuit: &Circuit) -> IrResult<()> {
        if circuit.num_qubits() > self.num_qubits {
            return Err(simulation_error(format!(
                "circuit has {} qubits, state has {}",
                circuit.num_qubits(),
                self.num_qubits
            )));
        }
        let map: Vec<usize> = (0..circuit.num_qubits()).collect();
        self.evolve_mapped(circuit, &map)
    }

    fn evolve_mapped(&mut self, circuit: &Circuit, map: &[usize]) -> IrResult<()> {
        self.apply_phase(circuit.global_phase().value()?);
        for inst in circuit.instructions() {
            let qubits: Vec<usize> = inst.qubits.iter().map(|q| map[q.index()]).collect();
            match &inst.kind {
                InstructionKind::Gate(g) => self.apply_gate(g, &qubits)?,
                InstructionKind::HighLevel(op) => self.apply_high_level(op, &qubits)?,
                InstructionKind::Barrier | InstructionKind::Delay { .. } => {}
                InstructionKind::Measure | InstructionKind::Reset => {
                    return Err(simulation_error(format!(
                        "'{}' is not unitary",
                        inst.name()
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply_phase(&mut self, phase: f64) {
        if phase.abs() > f64::EPSILON {
            let g = Complex64::from_polar(1.0, phase);
            self.amplitudes.iter_mut().for_each(|a| *a *= g);
        }
    }

    fn apply_gate(&mut self, gate: &StandardGate, qubits: &[usize]) -> IrResult<()> {
        if let Some(e) = gate.euler() {
            let m = u_matrix(
                e.theta.value()?,
                e.phi.value()?,
                e.lambda.value()?,
                e.phase.value()?,
            );
            self.apply_1q(&m, qubits[0]);
            return Ok(());
        }
        if *gate == StandardGate::CX {
            self.apply_mcx(&qubits[..1], qubits[1]);
            return Ok(());
        }
        let definition = gate
            .definition()
            .ok_or_else(|| simulation_error(format!("no definition for '{}'", gate.name())))?;
        self.evolve_mapped(&definition, qubits)
    }

    fn apply_high_level(&mut self, op: &HighLevelOperation, qubits: &[usize]) -> IrResult<()> {
        match op {
            HighLevelOperation::Mcx { num_ctrl_qubits } => {
                self.apply_mcx(&qubits[..*num_ctrl_qubits], qubits[*num_ctrl_qubits]);
                Ok(())
            }
            HighLevelOperation::Permutation { pattern } => {
                self.apply_permutation(pattern, qubits);
                Ok(())
            }
            other => Err(simulation_error(format!(
                "high-level operation '{}' must be synthesized before simulation",
                other.name()
            ))),
        }
    }

    fn apply_1q(&mut self, m: &Matrix2, q: usize) {
        let bit = 1 << q;
        for i in 0..self.amplitudes.len() {
            if i & bit == 0 {
                let (a0, a1) = (self.amplitudes[i], self.amplitudes[i | bit]);
                self.amplitudes[i] = m[0][0] * a0 + m[0][1] * a1;
                self.amplitudes[i | bit] = m[1][0] * a0 + m[1][1] * a1;
            }
        }
    }

    fn apply_mcx(&mut self, controls: &[usize], target: usize) {
        let mask = controls.iter().fold(0usize, |m, c| m | (1 << c));
        let bit = 1 << target;
        for i in 0..self.amplitudes.len() {
            if i & mask == mask && i & bit == 0 {
                self.amplitudes.swap(i, i | bit);
            }
        }
    }

    fn apply_permutation(&mut self, pattern: &[usize], qubits: &[usize]) {
        let old = self.amplitudes.clone();
        for (i, amp) in old.into_iter().enumerate() {
            let mut j = i;
            for (out, &src) in pattern.iter().enumerate() {
                let value = (i >> qubits[src]) & 1;
                j = (j & !(1 << qubits[out])) | (value << qubits[out]);
            }
            self.amplitudes[j] = amp;
        }
    }

    /// Inner product `⟨self|other⟩`.
    pub fn inner(&self, other: &Statevector) -> Complex64 {
        self.amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum()
    }

    /// Equality of amplitudes, optionally up to a global phase.
    pub fn equiv(&self, other: &Statevector, up_to_phase: bool) -> bool {
        if self.num_qubits != other.num_qubits {
            return false;
        }
        if up_to_phase {
            (self.inner(other).norm() - 1.0).abs() < SIM_EPSILON
        } else {
            self.amplitudes
                .iter()
                .zip(&other.amplitudes)
                .all(|(a, b)| (a - b).norm() < SIM_EPSILON)
        }
    }

    /// The basis-state index if the state is a single basis state up to phase.
    pub fn basis_index(&self) -> Option<usize> {
        self.amplitudes
            .iter()
            .position(|a| (a.norm_sqr() - 1.0).abs() < SIM_EPSILON)
    }
}

/// Run a circuit on the basis state `|input⟩`.
pub fn simulate_basis(circuit: &Circuit, input: usize) -> IrResult<Statevector> {
    let mut state = Statevector::basis_state(circuit.num_qubits(), input)?;
    state.evolve(circuit)?;
    Ok(state)
}

/// The unitary matrix of a circuit (column `j` is the image of `|j⟩`).
pub fn circuit_unitary(circuit: &Circuit) -> IrResult<Array2<Complex64>> {
    let dim = 1usize << circuit.num_qubits();
    let mut matrix = Array2::zeros((dim, dim));
    for j in 0..dim {
        let state = simulate_basis(circuit, j)?;
        for (i, amp) in state.amplitudes.iter().enumerate() {
            matrix[[i, j]] = *amp;
        }
    }
    Ok(matrix)
}

/// True when two circuits implement the same unitary.
///
/// With `up_to_phase` a common global phase is ignored.
pub fn equivalent(a: &Circuit, b: &Circuit, up_to_phase: bool) -> IrResult<bool> {
    if a.num_qubits() != b.num_qubits() {
        return Ok(false);
    }
    let (ua, ub) = (circuit_unitary(a)?, circuit_unitary(b)?);
    let mut phase: Option<Complex64> = None;
    for (x, y) in ua.iter().zip(ub.iter()) {
        if up_to_phase && x.norm() > SIM_EPSILON {
            let ratio = *phase.get_or_insert(y / x);
            if (x * ratio - y).norm() > SIM_EPSILON {
                return Ok(false);
            }
        } else if (x - y).norm() > SIM_EPSILON {
            return Ok(false);
        }
    }
    Ok(true)
}

impl StandardGate {
    /// Dense unitary of the gate.
    pub fn matrix(&self) -> IrResult<Array2<Complex64>> {
        let mut circuit = Circuit::with_size(self.name(), self.num_qubits(), 0);
        circuit.append(self.clone(), (0..self.num_qubits()).map(crate::QubitId))?;
        circuit_unitary(&circuit)
    }
}

fn simulation_error(reason: String) -> IrError {
    IrError::InvalidOperation {
        name: "simulation".into(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QubitId;
    use std::f64::consts::PI;

    #[test]
    fn test_bell_state_amplitudes() {
        let mut circuit = Circuit::with_size("bell", 2, 0);
        circuit.h(QubitId(0)).unwrap().cx(QubitId(0), QubitId(1)).unwrap();
        let state = simulate_basis(&circuit, 0).unwrap();
        let s = 1.0 / 2.0_f64.sqrt();
        assert!((state.amplitudes()[0].re - s).abs() < 1e-12);
        assert!((state.amplitudes()[3].re - s).abs() < 1e-12);
    }

    fn amp(circuit: &Circuit, input: usize, output: usize) -> Complex64 {
        simulate_basis(circuit, input).unwrap().amplitudes()[output]
    }

    fn close(a: Complex64, re: f64, im: f64) -> bool {
        (a - Complex64::new(re, im)).norm() < 1e-9
    }

    #[test]
    fn test_two_qubit_definitions() {
        let s = 1.0 / 2.0_f64.sqrt();
        let cy = StandardGate::CY.definition().unwrap();
        // Control is qubit 0: |c=1, t=0> is index 1, Y|0> = i|1>.
        assert!(close(amp(&cy, 1, 3), 0.0, 1.0));
        assert!(close(amp(&cy, 2, 2), 1.0, 0.0));

        let ch = StandardGate::CH.definition().unwrap();
        assert!(close(amp(&ch, 1, 1), s, 0.0));
        assert!(close(amp(&ch, 1, 3), s, 0.0));
        assert!(close(amp(&ch, 0, 0), 1.0, 0.0));

        let iswap = StandardGate::ISwap.definition().unwrap();
        assert!(close(amp(&iswap, 1, 2), 0.0, 1.0));
        assert!(close(amp(&iswap, 3, 3), 1.0, 0.0));

        let rzz = StandardGate::RZZ(0.6.into()).definition().unwrap();
        assert!(close(amp(&rzz, 0, 0), (0.3f64).cos(), -(0.3f64).sin()));
        assert!(close(amp(&rzz, 1, 1), (0.3f64).cos(), (0.3f64).sin()));
    }

    #[test]
    fn test_phase_gate_identities() {
        let mut cz = Circuit::with_size("cz", 2, 0);
        cz.cz(QubitId(0), QubitId(1)).unwrap();
        let mut zc = Circuit::with_size("zc", 2, 0);
        zc.cz(QubitId(1), QubitId(0)).unwrap();
        let mut cp = Circuit::with_size("cp", 2, 0);
        cp.cp(PI, QubitId(0), QubitId(1)).unwrap();
        assert!(equivalent(&cz, &zc, false).unwrap());
        assert!(equivalent(&cz, &cp, false).unwrap());

        let mut crz = Circuit::with_size("crz", 2, 0);
        crz.crz(PI, QubitId(0), QubitId(1)).unwrap();
        // CRz(π) = diag(1, -i, 1, i) in little-endian order.
        assert!(close(amp(&crz, 1, 1), 0.0, -1.0));
        assert!(close(amp(&crz, 3, 3), 0.0, 1.0));
    }

    #[test]
    fn test_swap_and_cswap_move_bits() {
        let swap = StandardGate::Swap.definition().unwrap();
        assert_eq!(simulate_basis(&swap, 0b01).unwrap().basis_index(), Some(0b10));
        let cswap = StandardGate::CSwap.definition().unwrap();
        assert_eq!(simulate_basis(&cswap, 0b011).unwrap().basis_index(), Some(0b101));
        assert_eq!(simulate_basis(&cswap, 0b010).unwrap().basis_index(), Some(0b010));
    }

    #[test]
    fn test_ccx_truth_table() {
        let mut circuit = Circuit::with_size("ccx", 3, 0);
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        for input in 0..8 {
            let out = simulate_basis(&circuit, input).unwrap().basis_index();
            let expected = if input & 3 == 3 { input ^ 4 } else { input };
            assert_eq!(out, Some(expected));
        }
    }

    #[test]
    fn test_equivalent_up_to_phase() {
        let mut a = Circuit::with_size("a", 1, 0);
        a.rz(PI, QubitId(0)).unwrap();
        let mut b = Circuit::with_size("b", 1, 0);
        b.z(QubitId(0)).unwrap();
        assert!(!equivalent(&a, &b, false).unwrap());
        assert!(equivalent(&a, &b, true).unwrap());
    }

    #[test]
    fn test_permutation_moves_bits() {
        let mut circuit = Circuit::with_size("perm", 3, 0);
        circuit
            .high_level(
                HighLevelOperation::permutation(vec![2, 0, 1]).unwrap(),
                (0..3).map(QubitId),
            )
            .unwrap();
        // Input bit 2 set; output 0 takes input 2.
        let out = simulate_basis(&circuit, 0b100).unwrap().basis_index();
        assert_eq!(out, Some(0b001));
    }
}
