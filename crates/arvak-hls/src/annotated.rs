//! Resolution of annotated operations.
//!
//! An annotated operation is resolved in five steps:
//!
//! 1. [`canonicalize`] flattens nested annotations and merges modifiers.
//! 2. [`partition`] splits the qubits into controls and base qubits.
//! 3. The base operation is synthesized against a copy of the tracker in
//!    which the controls are disabled.
//! 4. [`conjugate_decomposition`] peels off a leading block whose inverse
//!    closes the circuit, so only the middle needs modifying.
//! 5. [`apply_modifiers`] applies the modifiers in list order.

use std::cell::RefCell;

use arvak_ir::{
    AnnotatedOperation, Circuit, HighLevelOperation, Instruction, InstructionKind, Modifier,
    Operation, QubitId, StandardGate,
};
use tracing::debug;

use crate::context::ResourceContext;
use crate::control::control_circuit;
use crate::error::HlsResult;
use crate::plugin::PluginResult;

/// Tolerance for comparing numeric gate parameters.
const PARAM_ATOL: f64 = 1e-12;

fn push_modifier(stack: &mut Vec<Modifier>, modifier: Modifier) {
    let merged = match (stack.last(), &modifier) {
        (_, Modifier::Power { exponent }) if *exponent == 1.0 => return,
        (Some(Modifier::Inverse), Modifier::Inverse) => None,
        (Some(Modifier::Power { exponent: a }), Modifier::Power { exponent: b }) => {
            Some(Modifier::Power { exponent: a * b })
        }
        // Inverting the identity or raising it to a power leaves the identity.
        (Some(Modifier::Power { exponent }), Modifier::Inverse) if *exponent == 0.0 => return,
        (Some(Modifier::Inverse), Modifier::Power { exponent }) if *exponent == 0.0 => {
            Some(modifier.clone())
        }
        (Some(Modifier::Control { ctrl_state: inner }), Modifier::Control { ctrl_state: outer }) => {
            let mut ctrl_state = outer.clone();
            ctrl_state.extend_from_slice(inner);
            Some(Modifier::Control { ctrl_state })
        }
        _ => {
            stack.push(modifier);
            return;
        }
    };
    stack.pop();
    if let Some(m) = merged {
        push_modifier(stack, m);
    }
}

/// Flatten nested annotations and simplify the modifier list.
///
/// Adjacent powers multiply, adjacent inverses cancel, `Power(1)` is
/// dropped and adjacent controls merge. `Power(0)` is kept: it turns the
/// whole node into the identity.
pub fn canonicalize(op: &AnnotatedOperation) -> AnnotatedOperation {
    let mut base = op.base.as_ref();
    let mut layers = vec![op.modifiers.as_slice()];
    while let Operation::HighLevel(HighLevelOperation::Annotated(inner)) = base {
        layers.push(inner.modifiers.as_slice());
        base = inner.base.as_ref();
    }

    let mut modifiers = Vec::new();
    for layer in layers.iter().rev() {
        for modifier in layer.iter() {
            push_modifier(&mut modifiers, modifier.clone());
        }
    }
    AnnotatedOperation {
        base: Box::new(base.clone()),
        modifiers,
    }
}

/// Split `qubits` into the controls of every Control modifier and the base
/// qubits.
pub fn partition<'q>(
    modifiers: &[Modifier],
    qubits: &'q [QubitId],
) -> (&'q [QubitId], &'q [QubitId]) {
    let num_ctrl: usize = modifiers.iter().map(Modifier::num_ctrl_qubits).sum();
    qubits.split_at(num_ctrl.min(qubits.len()))
}

fn params_match(a: &StandardGate, b: &StandardGate) -> bool {
    let (pa, pb) = (a.parameters(), b.parameters());
    pa.len() == pb.len()
        && pa.iter().zip(&pb).all(|(x, y)| match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => (x - y).abs() < PARAM_ATOL,
            _ => x == y,
        })
}

fn gates_inverse(a: &StandardGate, b: &StandardGate) -> bool {
    a.inverse()
        .is_some_and(|inv| inv.name() == b.name() && params_match(&inv, b))
}

/// The base of an operation wrapped in exactly one Inverse modifier.
fn inverted_base(op: &HighLevelOperation) -> Option<&Operation> {
    match op {
        HighLevelOperation::Annotated(a) if a.modifiers == [Modifier::Inverse] => {
            Some(a.base.as_ref())
        }
        _ => None,
    }
}

fn operations_inverse(a: &HighLevelOperation, b: &HighLevelOperation) -> bool {
    let wraps = |wrapper: &HighLevelOperation, plain: &HighLevelOperation| {
        inverted_base(wrapper).is_some_and(|base| *base == Operation::HighLevel(plain.clone()))
    };
    a.inverse() == *b || b.inverse() == *a || wraps(a, b) || wraps(b, a)
}

/// True if `b` undoes `a`: same operands and inverse operations.
///
/// Recognises plain inverse gates, self-inverse MCX, inverse permutations
/// and an operation paired with itself under a single Inverse modifier.
pub fn are_inverse_ops(a: &Instruction, b: &Instruction) -> bool {
    if a.qubits != b.qubits || a.clbits != b.clbits || a.num_params() != b.num_params() {
        return false;
    }
    match (&a.kind, &b.kind) {
        (InstructionKind::Gate(x), InstructionKind::Gate(y)) => gates_inverse(x, y),
        (InstructionKind::HighLevel(x), InstructionKind::HighLevel(y)) => operations_inverse(x, y),
        _ => false,
    }
}

/// A circuit split as `front · middle · back` with `back` undoing `front`.
#[derive(Debug, Clone, PartialEq)]
pub struct Conjugation {
    /// Leading instructions.
    pub front: Circuit,
    /// The part that needs modifying; carries the global phase.
    pub middle: Circuit,
    /// Trailing instructions, the inverse of `front`.
    pub back: Circuit,
}

/// Match instructions from both ends inward. Returns `None` if the first
/// and last instructions are not inverses of each other.
pub fn conjugate_decomposition(circuit: &Circuit) -> HlsResult<Option<Conjugation>> {
    let instructions = circuit.instructions();
    let len = instructions.len();
    let matched = (0..len / 2)
        .take_while(|&i| are_inverse_ops(&instructions[i], &instructions[len - 1 - i]))
        .count();
    if matched == 0 {
        return Ok(None);
    }

    let part = |name: &str, range: std::ops::Range<usize>| -> HlsResult<Circuit> {
        let mut part = Circuit::with_size(
            format!("{}_{name}", circuit.name()),
            circuit.num_qubits(),
            circuit.num_clbits(),
        );
        for inst in &instructions[range] {
            part.apply(inst.clone())?;
        }
        Ok(part)
    };
    let front = part("front", 0..matched)?;
    let mut middle = part("middle", matched..len - matched)?;
    middle.set_global_phase(circuit.global_phase().clone());
    let back = part("back", len - matched..len)?;
    debug!(matched, total = len, "conjugate decomposition");
    Ok(Some(Conjugation {
        front,
        middle,
        back,
    }))
}

/// Apply `modifiers` to `circuit` in list order.
///
/// Each Control modifier adds its control qubits in front of the current
/// ones. Power of zero gives the identity.
pub fn apply_modifiers(circuit: Circuit, modifiers: &[Modifier]) -> HlsResult<Circuit> {
    let mut circuit = circuit;
    for modifier in modifiers {
        circuit = match modifier {
            Modifier::Inverse => circuit.inverse()?,
            Modifier::Control { ctrl_state } => control_circuit(&circuit, ctrl_state)?,
            Modifier::Power { exponent } => circuit.power(*exponent)?,
        };
    }
    Ok(circuit)
}

/// Apply `modifiers` to the middle of a conjugation and put `front` and
/// `back` around it on the base qubits.
fn modify_conjugation(
    conjugation: Conjugation,
    modifiers: &[Modifier],
    num_ctrl: usize,
) -> HlsResult<Circuit> {
    let Conjugation { front, middle, back } = conjugation;
    let modified = apply_modifiers(middle, modifiers)?;
    let mut circuit = Circuit::with_size(
        modified.name(),
        modified.num_qubits(),
        modified.num_clbits(),
    );
    let base_qubits: Vec<QubitId> = (num_ctrl..modified.num_qubits()).map(QubitId).collect();
    let all_qubits: Vec<QubitId> = (0..modified.num_qubits()).map(QubitId).collect();
    circuit.compose(&front, &base_qubits)?;
    circuit.compose(&modified, &all_qubits)?;
    circuit.compose(&back, &base_qubits)?;
    Ok(circuit)
}

fn is_identity(modifiers: &[Modifier]) -> bool {
    modifiers
        .iter()
        .any(|m| matches!(m, Modifier::Power { exponent } if *exponent == 0.0))
}

fn only_controls(modifiers: &[Modifier]) -> bool {
    modifiers
        .iter()
        .all(|m| matches!(m, Modifier::Control { .. }))
}

/// The `annotated.default` plugin.
///
/// Needs the engine fields of the context; a standalone call fails with a
/// missing-context error.
pub(crate) fn resolve(
    op: &HighLevelOperation,
    ctx: &ResourceContext<'_>,
) -> HlsResult<PluginResult> {
    let HighLevelOperation::Annotated(annotated) = op else {
        return Ok(PluginResult::NotApplicable);
    };
    let canonical = canonicalize(annotated);
    let modifiers = canonical.modifiers.as_slice();

    if modifiers.is_empty() {
        return Ok(Circuit::from_operation(*canonical.base).into());
    }
    if is_identity(modifiers) {
        return Ok(Circuit::with_size(op.name(), op.num_qubits(), 0).into());
    }
    // An MCX under controls is a wider MCX.
    if only_controls(modifiers)
        && matches!(*canonical.base, Operation::HighLevel(HighLevelOperation::Mcx { .. }))
    {
        let circuit = apply_modifiers(Circuit::from_operation(*canonical.base), modifiers)?;
        return Ok(circuit.into());
    }

    let input_qubits = ctx.input_qubits()?;
    let tracker = ctx.tracker()?;
    let engine = ctx.engine()?;
    let (controls, base_qubits) = partition(modifiers, input_qubits);

    let mut child = tracker.borrow().clone();
    child.disable(controls);
    if !only_controls(modifiers) {
        child.set_dirty(base_qubits);
    }
    let child = RefCell::new(child);
    debug!(
        base = canonical.base.name(),
        controls = controls.len(),
        modifiers = modifiers.len(),
        "resolving annotated operation"
    );
    let synthesized = engine.synthesize_base(&canonical.base, base_qubits, &child);
    tracker.borrow_mut().set_dirty(base_qubits);
    let (base_circuit, base_out_qubits) = synthesized?;

    let circuit = match conjugate_decomposition(&base_circuit)? {
        Some(conjugation) => modify_conjugation(conjugation, modifiers, controls.len())?,
        None => apply_modifiers(base_circuit, modifiers)?,
    };
    let qubits = controls.iter().copied().chain(base_out_qubits).collect();
    Ok(PluginResult::Bound { circuit, qubits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HlsError;
    use arvak_ir::operator::equivalent;

    fn annotated(base: HighLevelOperation, modifiers: Vec<Modifier>) -> AnnotatedOperation {
        AnnotatedOperation::new(Operation::from(base), modifiers)
    }

    fn power(exponent: f64) -> Modifier {
        Modifier::Power { exponent }
    }

    #[test]
    fn test_double_inverse_cancels() {
        let op = annotated(
            HighLevelOperation::qft(3),
            vec![Modifier::Inverse, Modifier::Inverse],
        );
        assert!(canonicalize(&op).modifiers.is_empty());
    }

    #[test]
    fn test_powers_multiply_and_unit_power_vanishes() {
        let op = annotated(HighLevelOperation::qft(2), vec![power(2.0), power(3.0)]);
        assert_eq!(canonicalize(&op).modifiers, vec![power(6.0)]);

        let op = annotated(HighLevelOperation::qft(2), vec![power(2.0), power(0.5)]);
        assert!(canonicalize(&op).modifiers.is_empty());
    }

    #[test]
    fn test_nested_annotations_flatten_inner_first() {
        let inner = HighLevelOperation::annotated(HighLevelOperation::qft(2), vec![Modifier::Inverse]);
        let op = annotated(inner, vec![Modifier::control(1), Modifier::Inverse]);
        let canonical = canonicalize(&op);
        assert_eq!(*canonical.base, Operation::from(HighLevelOperation::qft(2)));
        assert_eq!(
            canonical.modifiers,
            vec![Modifier::Inverse, Modifier::control(1), Modifier::Inverse]
        );
    }

    #[test]
    fn test_adjacent_controls_merge_outer_first() {
        let op = annotated(
            HighLevelOperation::qft(2),
            vec![Modifier::neg_control(1), Modifier::control(2)],
        );
        let canonical = canonicalize(&op);
        assert_eq!(
            canonical.modifiers,
            vec![Modifier::Control {
                ctrl_state: vec![true, true, false]
            }]
        );
        assert_eq!(canonical.num_qubits(), op.num_qubits());
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let op = annotated(
            HighLevelOperation::qft(2),
            vec![
                power(2.0),
                Modifier::Inverse,
                Modifier::Inverse,
                power(1.5),
                Modifier::control(1),
                Modifier::Inverse,
            ],
        );
        let once = canonicalize(&op);
        assert_eq!(canonicalize(&once), once);
    }

    #[test]
    fn test_zero_power_absorbs_inverses() {
        let op = annotated(
            HighLevelOperation::qft(2),
            vec![Modifier::Inverse, power(0.0), Modifier::Inverse],
        );
        assert_eq!(canonicalize(&op).modifiers, vec![power(0.0)]);
    }

    #[test]
    fn test_partition() {
        let qubits = arvak_ir::qubits(0..6);
        let (controls, base) = partition(
            &[Modifier::control(2), Modifier::Inverse, Modifier::control(1)],
            &qubits,
        );
        assert_eq!(controls, &qubits[..3]);
        assert_eq!(base, &qubits[3..]);
    }

    #[test]
    fn test_inverse_pairs() {
        let q = arvak_ir::qubits(0..3);
        let rz = |a: f64| Instruction::gate(StandardGate::Rz(a.into()), [q[0]]);
        assert!(are_inverse_ops(&rz(0.4), &rz(-0.4)));
        assert!(!are_inverse_ops(&rz(0.4), &rz(0.4)));
        assert!(are_inverse_ops(
            &Instruction::gate(StandardGate::S, [q[1]]),
            &Instruction::gate(StandardGate::Sdg, [q[1]])
        ));
        assert!(!are_inverse_ops(
            &Instruction::gate(StandardGate::S, [q[1]]),
            &Instruction::gate(StandardGate::Sdg, [q[2]])
        ));

        let mcx = Instruction::high_level(HighLevelOperation::mcx(2), q.clone());
        assert!(are_inverse_ops(&mcx, &mcx));

        let perm = HighLevelOperation::permutation(vec![1, 2, 0]).unwrap();
        let inv = HighLevelOperation::permutation(vec![2, 0, 1]).unwrap();
        assert!(are_inverse_ops(
            &Instruction::high_level(perm, q.clone()),
            &Instruction::high_level(inv, q.clone())
        ));

        let qft = HighLevelOperation::qft(3);
        let wrapped = HighLevelOperation::annotated(qft.clone(), vec![Modifier::Inverse]);
        assert!(are_inverse_ops(
            &Instruction::high_level(wrapped.clone(), q.clone()),
            &Instruction::high_level(qft.clone(), q.clone())
        ));
        assert!(are_inverse_ops(
            &Instruction::high_level(qft, q.clone()),
            &Instruction::high_level(wrapped, q)
        ));
    }

    fn conjugated() -> Circuit {
        let mut circuit = Circuit::with_size("conj", 2, 0);
        circuit
            .h(QubitId(0))
            .unwrap()
            .s(QubitId(1))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .rz(0.3, QubitId(1))
            .unwrap()
            .sdg(QubitId(1))
            .unwrap()
            .h(QubitId(0))
            .unwrap();
        circuit
    }

    #[test]
    fn test_conjugate_decomposition_splits() {
        let conjugation = conjugate_decomposition(&conjugated()).unwrap().unwrap();
        assert_eq!(conjugation.front.len(), 2);
        assert_eq!(conjugation.middle.len(), 2);
        assert_eq!(conjugation.back.len(), 2);

        let mut round_trip = conjugation.front.clone();
        round_trip
            .compose(&conjugation.back, &arvak_ir::qubits(0..2))
            .unwrap();
        assert!(equivalent(&round_trip, &Circuit::with_size("id", 2, 0), false).unwrap());

        let mut plain = Circuit::with_size("plain", 1, 0);
        plain.h(QubitId(0)).unwrap().x(QubitId(0)).unwrap();
        assert!(conjugate_decomposition(&plain).unwrap().is_none());
    }

    #[test]
    fn test_conjugated_and_whole_modification_agree() {
        let modifier_lists = [
            vec![Modifier::control(1)],
            vec![Modifier::Inverse, Modifier::control(2)],
            vec![power(3.0), Modifier::neg_control(1)],
        ];
        for modifiers in modifier_lists {
            let whole = apply_modifiers(conjugated(), &modifiers).unwrap();
            let num_ctrl = modifiers.iter().map(Modifier::num_ctrl_qubits).sum();
            let split = modify_conjugation(
                conjugate_decomposition(&conjugated()).unwrap().unwrap(),
                &modifiers,
                num_ctrl,
            )
            .unwrap();
            assert!(equivalent(&whole, &split, false).unwrap(), "{modifiers:?}");
        }
    }

    #[test]
    fn test_apply_modifiers_rejects_faults() {
        let mut measured = Circuit::with_size("m", 1, 1);
        measured.measure(QubitId(0), arvak_ir::ClbitId(0)).unwrap();
        assert!(matches!(
            apply_modifiers(measured.clone(), &[Modifier::control(1)]),
            Err(HlsError::ControlWithClbits(_))
        ));
        assert!(matches!(
            apply_modifiers(measured, &[Modifier::Inverse]),
            Err(HlsError::NotInvertible(_))
        ));

        let mut two = Circuit::with_size("two", 1, 0);
        two.h(QubitId(0)).unwrap().t(QubitId(0)).unwrap();
        assert!(matches!(
            apply_modifiers(two, &[power(0.5)]),
            Err(HlsError::NonIntegerPower(_))
        ));
    }

    #[test]
    fn test_standalone_resolution_needs_engine_context() {
        let op = HighLevelOperation::annotated(HighLevelOperation::qft(2), vec![Modifier::control(1)]);
        assert!(matches!(
            resolve(&op, &ResourceContext::new()),
            Err(HlsError::MissingContext(_))
        ));

        let trivial = HighLevelOperation::annotated(
            HighLevelOperation::qft(2),
            vec![Modifier::Inverse, Modifier::Inverse],
        );
        let result = resolve(&trivial, &ResourceContext::new()).unwrap();
        assert_eq!(result.circuit().map(Circuit::len), Some(1));

        let identity = HighLevelOperation::annotated(
            HighLevelOperation::qft(2),
            vec![Modifier::control(1), power(0.0)],
        );
        let result = resolve(&identity, &ResourceContext::new()).unwrap();
        let circuit = result.into_circuit().unwrap();
        assert_eq!((circuit.num_qubits(), circuit.len()), (3, 0));
    }
}
