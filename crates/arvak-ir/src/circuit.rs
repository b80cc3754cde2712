//! Quantum circuits: an ordered instruction list with a global phase.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::operation::{HighLevelOperation, Operation};
use crate::parameter::ParameterExpression;
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit.
///
/// Qubits and classical bits are addressed by position. The circuit
/// implements `e^{iγ} · U_k ⋯ U_1` where `γ` is the global phase and
/// `U_1` is the first instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    num_qubits: usize,
    num_clbits: usize,
    instructions: Vec<Instruction>,
    global_phase: ParameterExpression,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_size(name, 0, 0)
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: usize, num_clbits: usize) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            instructions: vec![],
            global_phase: ParameterExpression::default(),
        }
    }

    /// Build a circuit from `(gate, qubit indices)` pairs.
    ///
    /// Intended for fixed decompositions whose operands are known to be valid.
    pub fn from_gates(
        name: impl Into<String>,
        num_qubits: usize,
        gates: impl IntoIterator<Item = (StandardGate, Vec<usize>)>,
    ) -> Self {
        let mut circuit = Self::with_size(name, num_qubits, 0);
        circuit.instructions = gates
            .into_iter()
            .map(|(g, qs)| Instruction::gate(g, qs.into_iter().map(QubitId)))
            .collect();
        circuit
    }

    /// A circuit holding a single operation on qubits `0..n`.
    pub fn from_operation(op: Operation) -> Self {
        let n = op.num_qubits();
        let mut circuit = Self::with_size(op.name().to_string(), n, 0);
        circuit
            .instructions
            .push(Instruction::operation(op, (0..n).map(QubitId)));
        circuit
    }

    /// Append `count` fresh qubits and return their ids.
    pub fn add_qubits(&mut self, count: usize) -> Vec<QubitId> {
        let start = self.num_qubits;
        self.num_qubits += count;
        (start..self.num_qubits).map(QubitId).collect()
    }

    /// Append `count` fresh classical bits and return their ids.
    pub fn add_clbits(&mut self, count: usize) -> Vec<ClbitId> {
        let start = self.num_clbits;
        self.num_clbits += count;
        (start..self.num_clbits).map(ClbitId).collect()
    }

    /// Validate and append an instruction.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.validate(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    fn validate(&self, inst: &Instruction) -> IrResult<()> {
        let gate_name = || Some(inst.name().to_string());
        let expected = match &inst.kind {
            InstructionKind::Gate(g) => Some(g.num_qubits()),
            InstructionKind::HighLevel(op) => Some(op.num_qubits()),
            InstructionKind::Measure | InstructionKind::Reset | InstructionKind::Delay { .. } => {
                Some(1)
            }
            InstructionKind::Barrier => None,
        };
        if let Some(expected) = expected.filter(|&e| e != inst.qubits.len()) {
            return Err(IrError::QubitCountMismatch {
                gate_name: inst.name().to_string(),
                expected,
                got: inst.qubits.len(),
            });
        }
        for (i, q) in inst.qubits.iter().enumerate() {
            if q.index() >= self.num_qubits {
                return Err(IrError::QubitNotFound {
                    qubit: *q,
                    gate_name: gate_name(),
                });
            }
            if inst.qubits[..i].contains(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: *q,
                    gate_name: gate_name(),
                });
            }
        }
        if let Some(c) = inst.clbits.iter().find(|c| c.index() >= self.num_clbits) {
            return Err(IrError::ClbitNotFound {
                clbit: *c,
                gate_name: gate_name(),
            });
        }
        Ok(())
    }

    fn gate(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Append a gate or high-level operation.
    pub fn append(
        &mut self,
        op: impl Into<Operation>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::operation(op.into(), qubits))
    }

    /// Append a high-level operation.
    pub fn high_level(
        &mut self,
        op: HighLevelOperation,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::high_level(op, qubits))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::H, [qubit])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::X, [qubit])
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Y, [qubit])
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Z, [qubit])
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::S, [qubit])
    }

    /// Apply S-dagger gate.
    pub fn sdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Sdg, [qubit])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::T, [qubit])
    }

    /// Apply T-dagger gate.
    pub fn tdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Tdg, [qubit])
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::SX, [qubit])
    }

    /// Apply sqrt(X)-dagger gate.
    pub fn sxdg(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::SXdg, [qubit])
    }

    /// Apply Rx rotation gate.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rx(theta.into()), [qubit])
    }

    /// Apply Ry rotation gate.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Ry(theta.into()), [qubit])
    }

    /// Apply Rz rotation gate.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rz(theta.into()), [qubit])
    }

    /// Apply phase gate.
    pub fn p(
        &mut self,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::P(lambda.into()), [qubit])
    }

    /// Apply U(θ, φ, λ) gate.
    pub fn u(
        &mut self,
        theta: impl Into<ParameterExpression>,
        phi: impl Into<ParameterExpression>,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(
            StandardGate::U(theta.into(), phi.into(), lambda.into()),
            [qubit],
        )
    }

    // =========================================================================
    // Two-qubit gates
    // =========================================================================

    /// Apply CNOT (CX) gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CX, [control, target])
    }

    /// Apply controlled-Y gate.
    pub fn cy(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CY, [control, target])
    }

    /// Apply controlled-Z gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CZ, [control, target])
    }

    /// Apply controlled-Hadamard gate.
    pub fn ch(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CH, [control, target])
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::Swap, [q1, q2])
    }

    /// Apply iSWAP gate.
    pub fn iswap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::ISwap, [q1, q2])
    }

    /// Apply controlled-Rx gate.
    pub fn crx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::CRx(theta.into()), [control, target])
    }

    /// Apply controlled-Ry gate.
    pub fn cry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::CRy(theta.into()), [control, target])
    }

    /// Apply controlled-Rz gate.
    pub fn crz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::CRz(theta.into()), [control, target])
    }

    /// Apply controlled-phase gate.
    pub fn cp(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::CP(theta.into()), [control, target])
    }

    /// Apply RXX (XX rotation) gate.
    pub fn rxx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::RXX(theta.into()), [q1, q2])
    }

    /// Apply RYY (YY rotation) gate.
    pub fn ryy(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::RYY(theta.into()), [q1, q2])
    }

    /// Apply RZZ (ZZ rotation) gate.
    pub fn rzz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::RZZ(theta.into()), [q1, q2])
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CCX, [c1, c2, target])
    }

    /// Apply Fredkin (CSWAP) gate.
    pub fn cswap(&mut self, control: QubitId, t1: QubitId, t2: QubitId) -> IrResult<&mut Self> {
        self.gate(StandardGate::CSwap, [control, t1, t2])
    }

    /// Apply X to `target` controlled on every qubit in `controls`.
    ///
    /// Zero, one and two controls emit X, CX and CCX; more controls emit an
    /// MCX high-level operation.
    pub fn mcx(&mut self, controls: &[QubitId], target: QubitId) -> IrResult<&mut Self> {
        match controls {
            [] => self.x(target),
            [c] => self.cx(*c, target),
            [c1, c2] => self.ccx(*c1, *c2, target),
            _ => self.high_level(
                HighLevelOperation::mcx(controls.len()),
                controls.iter().copied().chain([target]),
            ),
        }
    }

    // =========================================================================
    // Non-unitary operations
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::reset(qubit))
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.apply(Instruction::barrier(qubits))
    }

    /// Apply a barrier to all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        let qubits: Vec<_> = (0..self.num_qubits).map(QubitId).collect();
        self.apply(Instruction::barrier(qubits))
    }

    /// Apply a delay to a qubit.
    pub fn delay(&mut self, qubit: QubitId, duration: u64) -> IrResult<&mut Self> {
        self.apply(Instruction::delay(qubit, duration))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits
    }

    /// The instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Consume the circuit and return its instructions.
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if there are no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The global phase.
    pub fn global_phase(&self) -> &ParameterExpression {
        &self.global_phase
    }

    /// Replace the global phase.
    pub fn set_global_phase(&mut self, phase: impl Into<ParameterExpression>) {
        self.global_phase = phase.into();
    }

    /// Add to the global phase.
    pub fn add_global_phase(&mut self, phase: &ParameterExpression) {
        self.global_phase = self.global_phase.plus(phase);
    }

    /// Count instructions by name.
    pub fn count_ops(&self) -> FxHashMap<&str, usize> {
        let mut counts = FxHashMap::default();
        for inst in &self.instructions {
            *counts.entry(inst.name()).or_insert(0) += 1;
        }
        counts
    }

    /// Number of unitary instructions acting on two or more qubits.
    pub fn num_nonlocal_gates(&self) -> usize {
        self.instructions
            .iter()
            .filter(|inst| {
                matches!(
                    inst.kind,
                    InstructionKind::Gate(_) | InstructionKind::HighLevel(_)
                ) && inst.qubits.len() > 1
            })
            .count()
    }

    /// Get the circuit depth, barriers excluded.
    pub fn depth(&self) -> usize {
        let mut qubit_depth = vec![0usize; self.num_qubits];
        let mut clbit_depth = vec![0usize; self.num_clbits];
        for inst in &self.instructions {
            if inst.is_barrier() {
                continue;
            }
            let level = inst
                .qubits
                .iter()
                .map(|q| qubit_depth[q.index()])
                .chain(inst.clbits.iter().map(|c| clbit_depth[c.index()]))
                .max()
                .unwrap_or(0)
                + 1;
            for q in &inst.qubits {
                qubit_depth[q.index()] = level;
            }
            for c in &inst.clbits {
                clbit_depth[c.index()] = level;
            }
        }
        qubit_depth
            .into_iter()
            .chain(clbit_depth)
            .max()
            .unwrap_or(0)
    }

    // =========================================================================
    // Circuit transformations
    // =========================================================================

    /// Append `other` with its qubit `i` mapped to `qubits[i]`.
    ///
    /// Classical bits are mapped by position. The global phases add.
    pub fn compose(&mut self, other: &Circuit, qubits: &[QubitId]) -> IrResult<&mut Self> {
        if qubits.len() != other.num_qubits {
            return Err(IrError::QubitCountMismatch {
                gate_name: other.name.clone(),
                expected: other.num_qubits,
                got: qubits.len(),
            });
        }
        if other.num_clbits > self.num_clbits {
            return Err(IrError::ClbitNotFound {
                clbit: ClbitId(self.num_clbits),
                gate_name: Some(other.name.clone()),
            });
        }
        for inst in &other.instructions {
            let mapped = Instruction {
                kind: inst.kind.clone(),
                qubits: inst.qubits.iter().map(|q| qubits[q.index()]).collect(),
                clbits: inst.clbits.clone(),
            };
            self.apply(mapped)?;
        }
        self.add_global_phase(&other.global_phase);
        Ok(self)
    }

    /// The adjoint circuit: instructions reversed and inverted, phase negated.
    pub fn inverse(&self) -> IrResult<Circuit> {
        let mut inverted = Vec::with_capacity(self.instructions.len());
        let mut extra_phase = ParameterExpression::default();
        for inst in self.instructions.iter().rev() {
            match &inst.kind {
                InstructionKind::Gate(g) => match g.inverse() {
                    Some(inv) => inverted.push(Instruction::gate(inv, inst.qubits.clone())),
                    None => {
                        let definition = g
                            .definition()
                            .ok_or_else(|| IrError::NotInvertible(g.name().to_string()))?
                            .inverse()?;
                        for sub in definition.instructions {
                            inverted.push(Instruction {
                                kind: sub.kind,
                                qubits: sub.qubits.iter().map(|q| inst.qubits[q.index()]).collect(),
                                clbits: vec![],
                            });
                        }
                        extra_phase = extra_phase.plus(&definition.global_phase);
                    }
                },
                InstructionKind::HighLevel(op) => {
                    inverted.push(Instruction::high_level(op.inverse(), inst.qubits.clone()));
                }
                InstructionKind::Barrier | InstructionKind::Delay { .. } => {
                    inverted.push(inst.clone());
                }
                InstructionKind::Measure | InstructionKind::Reset => {
                    return Err(IrError::NotInvertible(inst.name().to_string()));
                }
            }
        }
        Ok(Circuit {
            name: format!("{}_dg", self.name),
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            instructions: inverted,
            global_phase: self.global_phase.negated().plus(&extra_phase),
        })
    }

    /// The circuit repeated `reps` times.
    pub fn repeat(&self, reps: usize) -> Circuit {
        let mut instructions = Vec::with_capacity(self.instructions.len() * reps);
        for _ in 0..reps {
            instructions.extend(self.instructions.iter().cloned());
        }
        Circuit {
            name: format!("{}**{}", self.name, reps),
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            instructions,
            global_phase: self.global_phase.scaled(reps as f64),
        }
    }

    /// The circuit raised to a real power.
    ///
    /// Integer exponents repeat the circuit (or its inverse). A fractional
    /// exponent is only defined for an empty circuit or a single rotation or
    /// phase gate, whose angle is scaled.
    pub fn power(&self, exponent: f64) -> IrResult<Circuit> {
        if exponent.fract() == 0.0 {
            let reps = exponent.abs() as usize;
            return if exponent < 0.0 {
                Ok(self.inverse()?.repeat(reps))
            } else {
                Ok(self.repeat(reps))
            };
        }
        let powered_gate = match self.instructions.as_slice() {
            [] => None,
            [inst] => match &inst.kind {
                InstructionKind::Gate(g) => match g.power(exponent) {
                    Some(p) => Some(Instruction::gate(p, inst.qubits.clone())),
                    None => return Err(IrError::NonIntegerPower(exponent)),
                },
                _ => return Err(IrError::NonIntegerPower(exponent)),
            },
            _ => return Err(IrError::NonIntegerPower(exponent)),
        };
        Ok(Circuit {
            name: format!("{}**{}", self.name, exponent),
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            instructions: powered_gate.into_iter().collect(),
            global_phase: self.global_phase.scaled(exponent),
        })
    }
}
