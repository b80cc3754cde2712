//! Pauli-evolution synthesis.
//!
//! An evolution is first expanded into a list of Pauli rotations
//! `exp(-i · θ · P)`, each emitted as a basis change, a CX ladder over the
//! support of `P`, `Rz(2θ)` on the last qubit of the support, and the undo.

use arvak_ir::{
    Circuit, EvolutionSynthesis, Instruction, PauliEvolution, PauliOp, PauliString, PauliTerm,
    QubitId, SparsePauliOp,
};
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rustc_hash::FxHashMap;

use crate::error::{HlsError, HlsResult};

/// Coefficients below this are dropped when operators are normalized.
const COEFF_ATOL: f64 = 1e-12;

/// One rotation of a Pauli network: `exp(-i · angle · pauli)`.
pub type PauliRotation = (PauliString, f64);

fn invalid(reason: impl Into<String>) -> HlsError {
    HlsError::InvalidParameters {
        name: "pauli_evolution".into(),
        reason: reason.into(),
    }
}

fn basis_change(circuit: &mut Circuit, pauli: &PauliString, undo: bool) -> HlsResult<()> {
    for &(q, op) in pauli.ops() {
        let q = QubitId(q);
        match (op, undo) {
            (PauliOp::X, _) => {
                circuit.h(q)?;
            }
            (PauliOp::Y, false) => {
                circuit.sdg(q)?.h(q)?;
            }
            (PauliOp::Y, true) => {
                circuit.h(q)?.s(q)?;
            }
            (PauliOp::Z | PauliOp::I, _) => {}
        }
    }
    Ok(())
}

/// Append `exp(-i · angle · pauli)`. The identity contributes a global phase.
pub fn append_pauli_rotation(
    circuit: &mut Circuit,
    pauli: &PauliString,
    angle: f64,
) -> HlsResult<()> {
    let support: Vec<QubitId> = pauli.support().into_iter().map(QubitId).collect();
    let Some((&last, _)) = support.split_last() else {
        circuit.add_global_phase(&(-angle).into());
        return Ok(());
    };

    basis_change(circuit, pauli, false)?;
    for pair in support.windows(2) {
        circuit.cx(pair[0], pair[1])?;
    }
    circuit.rz(2.0 * angle, last)?;
    for pair in support.windows(2).rev() {
        circuit.cx(pair[0], pair[1])?;
    }
    basis_change(circuit, pauli, true)?;
    Ok(())
}

/// Reorder terms so that terms with equal support are adjacent, keeping
/// the order of first appearance.
pub fn group_by_support(terms: &[PauliTerm]) -> Vec<PauliTerm> {
    let mut groups: FxHashMap<Vec<usize>, usize> = FxHashMap::default();
    let mut keyed: Vec<(usize, &PauliTerm)> = terms
        .iter()
        .map(|term| {
            let next = groups.len();
            let group = *groups.entry(term.pauli.support()).or_insert(next);
            (group, term)
        })
        .collect();
    keyed.sort_by_key(|(group, _)| *group);
    keyed.into_iter().map(|(_, term)| term.clone()).collect()
}

/// Time fractions and directions of one Suzuki step of order `order`.
fn suzuki_sweeps(order: usize, fraction: f64, out: &mut Vec<(f64, bool)>) {
    if order <= 2 {
        out.push((fraction / 2.0, false));
        out.push((fraction / 2.0, true));
        return;
    }
    let k = (order / 2) as f64;
    let u = 1.0 / (4.0 - 4f64.powf(1.0 / (2.0 * k - 1.0)));
    for weight in [u, u, 1.0 - 4.0 * u, u, u] {
        suzuki_sweeps(order - 2, fraction * weight, out);
    }
}

/// Expand a strategy into the rotation list of `exp(-i · time · Σ terms)`.
pub fn expand_rotations(
    terms: &[PauliTerm],
    time: f64,
    synthesis: &EvolutionSynthesis,
) -> HlsResult<Vec<PauliRotation>> {
    match synthesis {
        EvolutionSynthesis::ProductFormula {
            order,
            reps,
            preserve_order,
        } => {
            if *reps == 0 {
                return Err(invalid("product formula needs at least one repetition"));
            }
            if *order == 0 || (*order > 1 && order % 2 == 1) {
                return Err(invalid(format!("unsupported product formula order {order}")));
            }
            let terms = if *preserve_order {
                terms.to_vec()
            } else {
                group_by_support(terms)
            };
            let dt = time / *reps as f64;

            let mut sweeps = Vec::new();
            if *order == 1 {
                sweeps.push((1.0, false));
            } else {
                suzuki_sweeps(*order, 1.0, &mut sweeps);
            }

            let mut rotations = Vec::new();
            for _ in 0..*reps {
                for &(fraction, reversed) in &sweeps {
                    let sweep: Box<dyn Iterator<Item = &PauliTerm>> = if reversed {
                        Box::new(terms.iter().rev())
                    } else {
                        Box::new(terms.iter())
                    };
                    for term in sweep {
                        rotations.push((term.pauli.clone(), term.coeff * dt * fraction));
                    }
                }
            }
            Ok(rotations)
        }
        EvolutionSynthesis::QDrift { reps, seed } => {
            let lambda: f64 = terms.iter().map(|t| t.coeff.abs()).sum();
            let num_samples = (2.0 * lambda * lambda * time * time * *reps as f64).ceil() as usize;
            if lambda == 0.0 || num_samples == 0 {
                return Ok(Vec::new());
            }
            let weights = WeightedIndex::new(terms.iter().map(|t| t.coeff.abs()))
                .map_err(|e| invalid(format!("cannot sample terms: {e}")))?;
            let mut rng = SmallRng::seed_from_u64(*seed);
            let step = lambda * time / num_samples as f64;
            Ok((0..num_samples)
                .map(|_| {
                    let term = &terms[weights.sample(&mut rng)];
                    (term.pauli.clone(), step.copysign(term.coeff))
                })
                .collect())
        }
    }
}

/// Synthesize an evolution with `synthesis`, which replaces the strategy
/// embedded in the operation.
pub fn synth_pauli_evolution(
    evolution: &PauliEvolution,
    synthesis: &EvolutionSynthesis,
) -> HlsResult<Circuit> {
    let rotations = expand_rotations(&evolution.pauli_terms(), evolution.time(), synthesis)?;
    let mut circuit = Circuit::with_size("pauli_evolution", evolution.num_qubits(), 0);
    for (pauli, angle) in &rotations {
        append_pauli_rotation(&mut circuit, pauli, *angle)?;
    }
    Ok(circuit)
}

/// Merge the operators of an evolution into one simplified Pauli sum.
///
/// Fails with [`HlsError::InvalidOperator`] on non-finite coefficients.
pub fn normalize_operators(evolution: &PauliEvolution) -> HlsResult<SparsePauliOp> {
    let terms = evolution.pauli_terms();
    if let Some(bad) = terms.iter().find(|t| !t.coeff.is_finite()) {
        return Err(HlsError::InvalidOperator(format!(
            "coefficient {} of {:?} is not finite",
            bad.coeff,
            bad.pauli.ops()
        )));
    }
    let merged = SparsePauliOp::new(evolution.num_qubits(), terms)?;
    Ok(merged.simplify(COEFF_ATOL))
}

fn cancels(first: &Instruction, second: &Instruction) -> bool {
    first.qubits == second.qubits
        && match (first.as_gate(), second.as_gate()) {
            (Some(a), Some(b)) => a.inverse().as_ref() == Some(b),
            _ => false,
        }
}

/// Remove pairs of mutually inverse gates with nothing between them on
/// their qubits, repeatedly, in one sweep.
pub fn cancel_inverse_pairs(circuit: &Circuit) -> HlsResult<Circuit> {
    let mut kept: Vec<&Instruction> = Vec::with_capacity(circuit.len());
    let mut alive: Vec<bool> = Vec::with_capacity(circuit.len());
    let mut wires: Vec<Vec<usize>> = vec![Vec::new(); circuit.num_qubits()];

    for inst in circuit.instructions() {
        let previous = inst
            .qubits
            .first()
            .and_then(|q| wires[q.index()].last().copied());
        if let Some(i) = previous {
            let adjacent = inst
                .qubits
                .iter()
                .all(|q| wires[q.index()].last() == Some(&i));
            if adjacent && cancels(kept[i], inst) {
                alive[i] = false;
                for q in &inst.qubits {
                    wires[q.index()].pop();
                }
                continue;
            }
        }
        let index = kept.len();
        kept.push(inst);
        alive.push(true);
        for q in &inst.qubits {
            wires[q.index()].push(index);
        }
    }

    let mut reduced = Circuit::with_size(circuit.name(), circuit.num_qubits(), circuit.num_clbits());
    for (inst, live) in kept.into_iter().zip(alive) {
        if live {
            reduced.apply(inst.clone())?;
        }
    }
    reduced.set_global_phase(circuit.global_phase().clone());
    Ok(reduced)
}

/// Emit a Pauli network for `rotations`.
///
/// `optimize_count` merges consecutive rotations about the same string and
/// cancels the basis changes and CX ladders that meet between rotations.
/// `upto_phase` drops the phase of identity terms.
pub fn synth_pauli_network(
    num_qubits: usize,
    rotations: &[PauliRotation],
    optimize_count: bool,
    upto_phase: bool,
) -> HlsResult<Circuit> {
    let mut merged: Vec<PauliRotation> = Vec::with_capacity(rotations.len());
    for (pauli, angle) in rotations {
        match merged.last_mut() {
            Some((last, total)) if optimize_count && last == pauli => *total += angle,
            _ => merged.push((pauli.clone(), *angle)),
        }
    }

    let mut circuit = Circuit::with_size("pauli_network", num_qubits, 0);
    for (pauli, angle) in &merged {
        if pauli.is_identity() && upto_phase {
            continue;
        }
        append_pauli_rotation(&mut circuit, pauli, *angle)?;
    }
    if optimize_count {
        circuit = cancel_inverse_pairs(&circuit)?;
    }
    Ok(circuit)
}
