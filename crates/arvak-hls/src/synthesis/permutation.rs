//! Permutation synthesis into SWAP networks.
//!
//! A pattern maps output positions to input qubits: after the circuit,
//! position `i` holds the state that started on qubit `pattern[i]`.

use arvak_ir::{Circuit, QubitId};

use crate::error::{HlsError, HlsResult};

/// Check that `pattern` is a permutation of `0..pattern.len()`.
pub fn validate_pattern(pattern: &[usize]) -> HlsResult<()> {
    let mut seen = vec![false; pattern.len()];
    for &p in pattern {
        if p >= pattern.len() || std::mem::replace(&mut seen[p], true) {
            return Err(HlsError::InvalidParameters {
                name: "permutation".into(),
                reason: format!("{pattern:?} is not a permutation"),
            });
        }
    }
    Ok(())
}

/// The inverse pattern.
pub fn invert(pattern: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; pattern.len()];
    for (i, &p) in pattern.iter().enumerate() {
        inverse[p] = i;
    }
    inverse
}

fn swap_circuit(name: &str, num_qubits: usize, swaps: &[(usize, usize)]) -> HlsResult<Circuit> {
    let mut circuit = Circuit::with_size(name, num_qubits, 0);
    for &(a, b) in swaps {
        circuit.swap(QubitId(a), QubitId(b))?;
    }
    Ok(circuit)
}

/// Put each element in place with one swap. A cycle of length `m` costs
/// `m - 1` swaps.
pub fn ordered_swaps(pattern: &[usize]) -> Vec<(usize, usize)> {
    let mut permutation = pattern.to_vec();
    let mut index_of = invert(pattern);
    let mut swaps = Vec::with_capacity(pattern.len());
    for i in 0..pattern.len() {
        let value = permutation[i];
        if value == i {
            continue;
        }
        let j = index_of[i];
        swaps.push((i, j));
        permutation.swap(i, j);
        index_of[value] = j;
        index_of[i] = i;
    }
    swaps.reverse();
    swaps
}

/// Disjoint cycles of length at least two.
fn cycles(pattern: &[usize]) -> Vec<Vec<usize>> {
    let mut explored = vec![false; pattern.len()];
    let mut cycles = Vec::new();
    for &start in pattern {
        let mut cycle = Vec::new();
        let mut i = start;
        while !explored[i] {
            cycle.push(i);
            explored[i] = true;
            i = pattern[i];
        }
        if cycle.len() > 1 {
            cycles.push(cycle);
        }
    }
    cycles
}

/// Swaps of one odd-even transposition layer over `order`, applied in place.
fn transposition_layer(order: &mut [usize], start: usize) -> Vec<(usize, usize)> {
    let mut swaps = Vec::new();
    let mut j = start;
    while j + 1 < order.len() {
        if order[j] > order[j + 1] {
            swaps.push((j, j + 1));
            order.swap(j, j + 1);
        }
        j += 2;
    }
    swaps
}

fn lnn_swaps(pattern: &[usize]) -> Vec<(usize, usize)> {
    let mut order = invert(pattern);
    (0..pattern.len())
        .flat_map(|layer| transposition_layer(&mut order, layer % 2))
        .collect()
}

/// Nearest-neighbour swaps reversing `n` qubits.
pub(crate) fn reverse_lnn_layers(n: usize) -> Vec<(usize, usize)> {
    let reversed: Vec<usize> = (0..n).rev().collect();
    lnn_swaps(&reversed)
}

/// Ordered swaps, one per misplaced element.
pub fn synth_permutation_basic(pattern: &[usize]) -> HlsResult<Circuit> {
    validate_pattern(pattern)?;
    swap_circuit("permutation_basic", pattern.len(), &ordered_swaps(pattern))
}

/// Depth-two swap network (Alon, Chung and Graham 1994): every cycle is
/// written as a product of two reflections, each a layer of disjoint swaps.
pub fn synth_permutation_acg(pattern: &[usize]) -> HlsResult<Circuit> {
    validate_pattern(pattern)?;
    let inverse = invert(pattern);
    let mut swaps = Vec::new();
    for cycle in cycles(&inverse) {
        let len = cycle.len();
        let at = |idx: isize| cycle[idx.rem_euclid(len as isize) as usize];
        let l = len as isize;
        for idx in 0..(l - 1) / 2 {
            swaps.push((at(idx - 1), at(l - 3 - idx)));
        }
        for idx in 0..l / 2 {
            swaps.push((at(idx - 1), at(l - 2 - idx)));
        }
    }
    swap_circuit("permutation_acg", pattern.len(), &swaps)
}

/// Odd-even transposition sort: `n` layers of nearest-neighbour swaps
/// (Kutin, Moulton and Smithline 2007).
pub fn synth_permutation_depth_lnn_kms(pattern: &[usize]) -> HlsResult<Circuit> {
    validate_pattern(pattern)?;
    swap_circuit("permutation_kms", pattern.len(), &lnn_swaps(pattern))
}
