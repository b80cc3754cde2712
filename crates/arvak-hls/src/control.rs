//! Controlled versions of instructions and circuits.
//!
//! Controls always precede the base qubits. One control maps a gate to its
//! native controlled form where the gate set has one; several controls use
//! MCX, a multi-controlled phase, or the `A·X·B·X·C` construction for
//! single-qubit gates. Everything else is controlled through its definition.
//! High-level operations stay abstract: an MCX gains controls, anything else
//! is wrapped in a control modifier.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use arvak_ir::{
    AnnotatedOperation, Circuit, HighLevelOperation, Instruction, InstructionKind, Modifier,
    ParameterExpression, QubitId, StandardGate,
};

use crate::error::{HlsError, HlsResult};
use crate::synthesis::mcx::append_mcphase;

/// Append a phase `e^{iγ}` that fires when every control is |1⟩.
pub fn append_controlled_phase(
    circuit: &mut Circuit,
    phase: &ParameterExpression,
    controls: &[QubitId],
) -> HlsResult<()> {
    if phase.is_zero() {
        return Ok(());
    }
    match controls.split_last() {
        None => circuit.add_global_phase(phase),
        Some((last, rest)) => append_mcphase(circuit, phase, rest, *last)?,
    }
    Ok(())
}

/// Phase angle of the diagonal gates Z, S, T and their adjoints.
fn phase_angle(gate: &StandardGate) -> Option<ParameterExpression> {
    let angle = match gate {
        StandardGate::Z => PI,
        StandardGate::S => FRAC_PI_2,
        StandardGate::Sdg => -FRAC_PI_2,
        StandardGate::T => FRAC_PI_4,
        StandardGate::Tdg => -FRAC_PI_4,
        StandardGate::P(lambda) => return Some(lambda.clone()),
        _ => return None,
    };
    Some(angle.into())
}

fn append_native_single_control(
    circuit: &mut Circuit,
    gate: &StandardGate,
    control: QubitId,
    qubits: &[QubitId],
) -> HlsResult<bool> {
    use StandardGate as G;

    let controlled = match (gate, qubits) {
        (G::Y, [t]) => Instruction::gate(G::CY, [control, *t]),
        (G::Z, [t]) => Instruction::gate(G::CZ, [control, *t]),
        (G::H, [t]) => Instruction::gate(G::CH, [control, *t]),
        (G::Rx(a), [t]) => Instruction::gate(G::CRx(a.clone()), [control, *t]),
        (G::Ry(a), [t]) => Instruction::gate(G::CRy(a.clone()), [control, *t]),
        (G::Rz(a), [t]) => Instruction::gate(G::CRz(a.clone()), [control, *t]),
        (G::Swap, [a, b]) => Instruction::gate(G::CSwap, [control, *a, *b]),
        _ => return Ok(false),
    };
    circuit.apply(controlled)?;
    Ok(true)
}

/// `A·X·B·X·C` for a single-qubit gate in Euler form, plus a controlled
/// phase.
fn append_controlled_euler(
    circuit: &mut Circuit,
    gate: &StandardGate,
    controls: &[QubitId],
    target: QubitId,
) -> HlsResult<bool> {
    let Some(e) = gate.euler() else {
        return Ok(false);
    };
    let (theta, phi, lambda) = (e.theta, e.phi, e.lambda);
    let sum = phi.plus(&lambda);

    circuit.rz((lambda.clone() - phi.clone()).half(), target)?;
    circuit.mcx(controls, target)?;
    circuit.rz(sum.half().negated(), target)?;
    circuit.ry(theta.half().negated(), target)?;
    circuit.mcx(controls, target)?;
    circuit.ry(theta.half(), target)?;
    circuit.rz(phi, target)?;
    append_controlled_phase(circuit, &e.phase.plus(&sum.half()), controls)?;
    Ok(true)
}

fn append_controlled_gate(
    circuit: &mut Circuit,
    gate: &StandardGate,
    controls: &[QubitId],
    qubits: &[QubitId],
) -> HlsResult<()> {
    use StandardGate as G;

    match (gate, qubits) {
        (G::I, _) => return Ok(()),
        (G::X, [t]) => {
            circuit.mcx(controls, *t)?;
            return Ok(());
        }
        (G::CX, [c, t]) | (G::CCX, [.., c, t]) => {
            let mut all: Vec<QubitId> = controls.to_vec();
            all.extend_from_slice(&qubits[..qubits.len() - 1]);
            debug_assert!(all.contains(c));
            circuit.mcx(&all, *t)?;
            return Ok(());
        }
        (G::CP(lambda), [c, t]) => {
            let mut all: Vec<QubitId> = controls.to_vec();
            all.push(*c);
            append_mcphase(circuit, lambda, &all, *t)?;
            return Ok(());
        }
        _ => {}
    }

    if let (Some(lambda), [t]) = (phase_angle(gate), qubits) {
        append_mcphase(circuit, &lambda, controls, *t)?;
        return Ok(());
    }
    if let [control] = controls {
        if append_native_single_control(circuit, gate, *control, qubits)? {
            return Ok(());
        }
    }
    if let [t] = qubits {
        if append_controlled_euler(circuit, gate, controls, *t)? {
            return Ok(());
        }
    }

    let definition = gate
        .definition()
        .ok_or_else(|| HlsError::NotControllable(gate.name().to_string()))?;
    for inst in definition.instructions() {
        let mapped = Instruction {
            kind: inst.kind.clone(),
            qubits: inst.qubits.iter().map(|q| qubits[q.index()]).collect(),
            clbits: vec![],
        };
        append_controlled(circuit, &mapped, controls)?;
    }
    append_controlled_phase(circuit, definition.global_phase(), controls)
}

fn controlled_high_level(op: &HighLevelOperation, num_controls: usize) -> HighLevelOperation {
    match op {
        HighLevelOperation::Mcx { num_ctrl_qubits } => {
            HighLevelOperation::mcx(num_ctrl_qubits + num_controls)
        }
        HighLevelOperation::Annotated(annotated) => {
            let mut modifiers = annotated.modifiers.clone();
            modifiers.push(Modifier::control(num_controls));
            HighLevelOperation::Annotated(AnnotatedOperation {
                base: annotated.base.clone(),
                modifiers,
            })
        }
        other => HighLevelOperation::annotated(other.clone(), vec![Modifier::control(num_controls)]),
    }
}

/// Append `inst` controlled on `controls`, all required to be |1⟩.
///
/// `inst` must already use `circuit`'s qubit indices.
pub fn append_controlled(
    circuit: &mut Circuit,
    inst: &Instruction,
    controls: &[QubitId],
) -> HlsResult<()> {
    if controls.is_empty() {
        circuit.apply(inst.clone())?;
        return Ok(());
    }
    match &inst.kind {
        InstructionKind::Gate(gate) => append_controlled_gate(circuit, gate, controls, &inst.qubits),
        InstructionKind::HighLevel(op) => {
            let controlled = controlled_high_level(op, controls.len());
            let qubits = controls.iter().chain(&inst.qubits).copied();
            circuit.high_level(controlled, qubits)?;
            Ok(())
        }
        InstructionKind::Barrier | InstructionKind::Delay { .. } => {
            circuit.apply(inst.clone())?;
            Ok(())
        }
        InstructionKind::Measure | InstructionKind::Reset => {
            Err(HlsError::NotControllable(inst.name().to_string()))
        }
    }
}

/// The controlled circuit: `ctrl_state.len()` new leading qubits, with
/// control `i` required to be in state `ctrl_state[i]`.
///
/// Circuits with classical bits cannot be controlled.
pub fn control_circuit(circuit: &Circuit, ctrl_state: &[bool]) -> HlsResult<Circuit> {
    if circuit.num_clbits() > 0 {
        return Err(HlsError::ControlWithClbits(circuit.name().to_string()));
    }
    let n = ctrl_state.len();
    if n == 0 {
        return Ok(circuit.clone());
    }

    let mut controlled = Circuit::with_size(
        format!("c{}_{}", n, circuit.name()),
        n + circuit.num_qubits(),
        0,
    );
    let controls: Vec<QubitId> = (0..n).map(QubitId).collect();
    let open: Vec<QubitId> = controls
        .iter()
        .zip(ctrl_state)
        .filter(|&(_, &closed)| !closed)
        .map(|(q, _)| *q)
        .collect();

    for q in &open {
        controlled.x(*q)?;
    }
    append_controlled_phase(&mut controlled, circuit.global_phase(), &controls)?;
    for inst in circuit.instructions() {
        let shifted = Instruction {
            kind: inst.kind.clone(),
            qubits: inst.qubits.iter().map(|q| QubitId(q.index() + n)).collect(),
            clbits: vec![],
        };
        append_controlled(&mut controlled, &shifted, &controls)?;
    }
    for q in &open {
        controlled.x(*q)?;
    }
    Ok(controlled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arvak_ir::operator::simulate_basis;
    use arvak_ir::{ClbitId, Statevector};
    use num_complex::Complex64;

    /// Check that `controlled` acts as `base` when the controls match
    /// `ctrl_state` and as the identity otherwise.
    fn assert_controls(base: &Circuit, controlled: &Circuit, ctrl_state: &[bool]) {
        let n = ctrl_state.len();
        let wanted = ctrl_state
            .iter()
            .enumerate()
            .fold(0usize, |acc, (i, &b)| acc | (usize::from(b) << i));
        let dim = 1usize << controlled.num_qubits();
        for input in 0..dim {
            let got = simulate_basis(controlled, input).unwrap();
            let ctrl = input & ((1 << n) - 1);
            let mut expected = vec![Complex64::new(0.0, 0.0); dim];
            if ctrl == wanted {
                let inner: Statevector = simulate_basis(base, input >> n).unwrap();
                for (j, amp) in inner.amplitudes().iter().enumerate() {
                    expected[ctrl | (j << n)] = *amp;
                }
            } else {
                expected[input] = Complex64::new(1.0, 0.0);
            }
            for (g, e) in got.amplitudes().iter().zip(&expected) {
                assert!(
                    (g - e).norm() < 1e-9,
                    "{} with controls {ctrl_state:?} differs on input {input}",
                    base.name()
                );
            }
        }
    }

    fn one_gate(gate: StandardGate) -> Circuit {
        let n = gate.num_qubits();
        Circuit::from_gates(gate.name(), n, [(gate, (0..n).collect())])
    }

    fn every_gate() -> Vec<StandardGate> {
        use StandardGate as G;
        vec![
            G::I,
            G::X,
            G::Y,
            G::Z,
            G::H,
            G::S,
            G::Sdg,
            G::T,
            G::Tdg,
            G::SX,
            G::SXdg,
            G::Rx(0.3.into()),
            G::Ry(1.1.into()),
            G::Rz((-0.7).into()),
            G::P(0.4.into()),
            G::U(0.5.into(), 1.2.into(), (-0.3).into()),
            G::CX,
            G::CY,
            G::CZ,
            G::CH,
            G::Swap,
            G::ISwap,
            G::CRx(0.6.into()),
            G::CRy(0.2.into()),
            G::CRz(0.9.into()),
            G::CP(1.3.into()),
            G::RXX(0.5.into()),
            G::RYY(0.8.into()),
            G::RZZ(0.1.into()),
            G::CCX,
            G::CSwap,
        ]
    }

    #[test]
    fn test_single_control_of_every_gate() {
        for gate in every_gate() {
            let base = one_gate(gate);
            let controlled = control_circuit(&base, &[true]).unwrap();
            assert_controls(&base, &controlled, &[true]);
        }
    }

    #[test]
    fn test_two_controls_of_every_gate() {
        for gate in every_gate() {
            let base = one_gate(gate);
            let controlled = control_circuit(&base, &[true, true]).unwrap();
            assert_controls(&base, &controlled, &[true, true]);
        }
    }

    #[test]
    fn test_open_controls() {
        let base = one_gate(StandardGate::H);
        for state in [[false, true], [true, false], [false, false]] {
            let controlled = control_circuit(&base, &state).unwrap();
            assert_controls(&base, &controlled, &state);
        }
    }

    #[test]
    fn test_global_phase_is_controlled() {
        let mut base = Circuit::with_size("phase", 1, 0);
        base.set_global_phase(PI / 3.0);
        base.x(QubitId(0)).unwrap();
        for n in 1..=3 {
            let controlled = control_circuit(&base, &vec![true; n]).unwrap();
            assert_controls(&base, &controlled, &vec![true; n]);
        }
    }

    #[test]
    fn test_native_forms_for_one_control() {
        let controlled = control_circuit(&one_gate(StandardGate::Rz(0.5.into())), &[true]).unwrap();
        assert_eq!(controlled.count_ops().get("crz"), Some(&1));
        assert_eq!(controlled.len(), 1);

        let controlled = control_circuit(&one_gate(StandardGate::CX), &[true]).unwrap();
        assert_eq!(controlled.count_ops().get("ccx"), Some(&1));
    }

    #[test]
    fn test_high_level_ops_stay_abstract() {
        let mut base = Circuit::with_size("hl", 4, 0);
        base.high_level(HighLevelOperation::mcx(3), (0..4).map(QubitId))
            .unwrap();
        base.high_level(HighLevelOperation::qft(2), [QubitId(0), QubitId(1)])
            .unwrap();

        let controlled = control_circuit(&base, &[true, true]).unwrap();
        let ops: Vec<&HighLevelOperation> = controlled
            .instructions()
            .iter()
            .filter_map(Instruction::as_high_level)
            .collect();
        assert_eq!(ops[0], &HighLevelOperation::mcx(5));
        assert_eq!(
            ops[1],
            &HighLevelOperation::annotated(HighLevelOperation::qft(2), vec![Modifier::control(2)])
        );
        assert_eq!(controlled.instructions()[1].qubits[..2], [QubitId(0), QubitId(1)]);
    }

    #[test]
    fn test_classical_bits_are_rejected() {
        let mut base = Circuit::with_size("measured", 1, 1);
        base.h(QubitId(0)).unwrap();
        assert!(matches!(
            control_circuit(&base, &[true]),
            Err(HlsError::ControlWithClbits(name)) if name == "measured"
        ));

        let mut base = Circuit::with_size("reset", 1, 0);
        base.reset(QubitId(0)).unwrap();
        assert!(matches!(
            control_circuit(&base, &[true]),
            Err(HlsError::NotControllable(_))
        ));

        let mut measured = Circuit::with_size("m", 1, 1);
        measured.measure(QubitId(0), ClbitId(0)).unwrap();
        assert!(control_circuit(&measured, &[true]).is_err());
    }
}
