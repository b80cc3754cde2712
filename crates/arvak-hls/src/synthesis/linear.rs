//! CX synthesis of linear functions: the count-optimal method of Patel,
//! Markov and Hayes (2008) and the depth-optimal nearest-neighbour method of
//! Kutin, Moulton and Smithline (2007).
//!
//! The matrix convention is the one of [`LinearFunction`]: `CX(c, t)` adds
//! row `c` to row `t`, so a circuit `E₁ … E_k` has the matrix `E_k ⋯ E₁`.

use arvak_ir::linear::calc_inverse_matrix;
use arvak_ir::{Circuit, LinearFunction, QubitId};
use ndarray::{Array2, ArrayView2};
use rustc_hash::FxHashMap;

use crate::error::{HlsError, HlsResult};

/// Rows below the pivot that share more than this many ones with it are
/// added back to it.
const BACK_REDUCE_CUTOFF: usize = 1;

/// Add line `ctrl` to line `target`; lines are rows, or columns when
/// `transpose` is set.
fn add_line(matrix: &mut Array2<bool>, transpose: bool, ctrl: usize, target: usize) {
    let n = matrix.nrows();
    for k in 0..n {
        if transpose {
            let v = matrix[[k, ctrl]];
            matrix[[k, target]] ^= v;
        } else {
            let v = matrix[[ctrl, k]];
            matrix[[target, k]] ^= v;
        }
    }
}

fn entry(matrix: &Array2<bool>, transpose: bool, i: usize, j: usize) -> bool {
    if transpose {
        matrix[[j, i]]
    } else {
        matrix[[i, j]]
    }
}

fn line(matrix: &Array2<bool>, transpose: bool, i: usize) -> Vec<bool> {
    (0..matrix.ncols()).map(|k| entry(matrix, transpose, i, k)).collect()
}

/// Reduce the matrix to upper triangular form, section by section, and
/// return the row operations as `(ctrl, target)` pairs.
fn lower_cnot_synth(
    matrix: &mut Array2<bool>,
    section_size: usize,
    transpose: bool,
) -> Vec<(usize, usize)> {
    let n = matrix.nrows();
    let mut ops = Vec::new();

    for start in (0..n).step_by(section_size) {
        let end = (start + section_size).min(n);

        // Clear sub-rows that repeat an earlier sub-row of the section.
        let mut patterns: FxHashMap<Vec<bool>, usize> = FxHashMap::default();
        for row in start..n {
            let pattern = line(matrix, transpose, row)[start..end].to_vec();
            if !pattern.iter().any(|&b| b) {
                continue;
            }
            match patterns.get(&pattern) {
                Some(&first) => {
                    add_line(matrix, transpose, first, row);
                    ops.push((first, row));
                }
                None => {
                    patterns.insert(pattern, row);
                }
            }
        }

        // Gaussian elimination of the section, with back-reduction.
        for col in start..end {
            let mut pivot = matrix[[col, col]];
            for row in col + 1..n {
                if entry(matrix, transpose, row, col) {
                    if !pivot {
                        add_line(matrix, transpose, row, col);
                        ops.push((row, col));
                        pivot = true;
                    }
                    add_line(matrix, transpose, col, row);
                    ops.push((col, row));
                }
                let overlap = line(matrix, transpose, col)
                    .iter()
                    .zip(line(matrix, transpose, row))
                    .filter(|&(&a, b)| a && b)
                    .count();
                if overlap > BACK_REDUCE_CUTOFF {
                    add_line(matrix, transpose, row, col);
                    ops.push((row, col));
                }
            }
        }
    }
    ops
}

/// Default section size: `max(2, ⌊0.56 · log2 n⌋)`.
pub fn default_section_size(num_qubits: usize) -> usize {
    let scaled = 0.56 * (num_qubits.max(1) as f64).log2();
    (scaled.floor() as usize).max(2)
}

/// CX circuit for an invertible boolean matrix.
pub fn synth_cnot_count_full_pmh(
    matrix: ArrayView2<bool>,
    section_size: Option<usize>,
) -> HlsResult<Circuit> {
    let n = matrix.nrows();
    let section_size = section_size.unwrap_or_else(|| default_section_size(n));
    if section_size == 0 {
        return Err(HlsError::InvalidParameters {
            name: "linear_function".into(),
            reason: "section_size must be positive".into(),
        });
    }

    let mut work = matrix.to_owned();
    let lower = lower_cnot_synth(&mut work, section_size, false);
    let upper = lower_cnot_synth(&mut work, section_size, true);

    let mut circuit = Circuit::with_size("linear_pmh", n, 0);
    let ops = upper
        .into_iter()
        .map(|(a, b)| (b, a))
        .chain(lower.into_iter().rev());
    for (ctrl, target) in ops {
        circuit.cx(QubitId(ctrl), QubitId(target))?;
    }
    Ok(circuit)
}

/// The CX circuit of the transposed matrix: gates reversed, with control and
/// target exchanged.
pub fn transpose_cx_circuit(circuit: &Circuit) -> HlsResult<Circuit> {
    let mut transposed = Circuit::with_size(circuit.name(), circuit.num_qubits(), 0);
    for inst in circuit.instructions().iter().rev() {
        match inst.qubits.as_slice() {
            [c, t] if inst.name() == "cx" => {
                transposed.cx(*t, *c)?;
            }
            _ => {
                return Err(HlsError::InvalidParameters {
                    name: circuit.name().to_string(),
                    reason: format!("'{}' is not a CX gate", inst.name()),
                });
            }
        }
    }
    Ok(transposed)
}

/// Synthesize `function` through `synth`, optionally working on the
/// transposed or inverted matrix and undoing that on the circuit.
fn synth_linear_with(
    function: &LinearFunction,
    use_inverted: bool,
    use_transposed: bool,
    name: &str,
    synth: impl FnOnce(ArrayView2<bool>) -> HlsResult<Circuit>,
) -> HlsResult<Circuit> {
    let mut matrix = function.matrix().clone();
    if use_transposed {
        matrix = matrix.t().to_owned();
    }
    if use_inverted {
        matrix = calc_inverse_matrix(matrix.view())?;
    }

    let mut circuit = synth(matrix.view())?;
    if use_transposed {
        circuit = transpose_cx_circuit(&circuit)?;
    }
    if use_inverted {
        circuit = circuit.inverse()?;
    }
    circuit.set_name(name);
    Ok(circuit)
}

/// PMH synthesis of a linear function.
///
/// `use_transposed` synthesizes the transposed matrix and transposes the
/// circuit back; `use_inverted` does the same with the inverse. Either can
/// give a cheaper circuit.
pub fn synth_linear_pmh(
    function: &LinearFunction,
    section_size: Option<usize>,
    use_inverted: bool,
    use_transposed: bool,
) -> HlsResult<Circuit> {
    synth_linear_with(function, use_inverted, use_transposed, "linear_pmh", |m| {
        synth_cnot_count_full_pmh(m, section_size)
    })
}

// =============================================================================
// Nearest-neighbour synthesis
// =============================================================================

/// Row operations bringing `matrix` to a permuted lower triangular form,
/// applied to copies of `matrix` and of its inverse.
fn lower_triangular(
    matrix: &Array2<bool>,
    inverse: &Array2<bool>,
) -> (Array2<bool>, Array2<bool>) {
    let n = matrix.nrows();
    let mut work = matrix.clone();
    let mut ops = Vec::new();
    for i in (0..n).rev() {
        let ones: Vec<usize> = (0..n).rev().filter(|&j| work[[i, j]]).collect();
        let Some((&first, rest)) = ones.split_first() else {
            continue;
        };
        for &j in rest {
            add_line(&mut work, true, first, j);
        }
        let rows: Vec<usize> = (0..i).rev().filter(|&k| work[[k, first]]).collect();
        for k in rows {
            add_line(&mut work, false, i, k);
            ops.push((i, k));
        }
    }

    let mut triangular = matrix.clone();
    let mut triangular_inverse = inverse.clone();
    for (ctrl, target) in ops {
        add_line(&mut triangular, false, ctrl, target);
        add_line(&mut triangular_inverse, true, target, ctrl);
    }
    (triangular, triangular_inverse)
}

/// Whether `row` lies in the span of the triangular rows other than the one
/// labelled `label`.
fn spanned_without(
    row_of_label: &[usize],
    triangular_inverse: &Array2<bool>,
    row: &[bool],
    label: usize,
) -> bool {
    let n = row.len();
    let mut needed = vec![false; n];
    for l in (0..n).filter(|&l| row[l]) {
        for (c, slot) in needed.iter_mut().enumerate() {
            *slot ^= triangular_inverse[[l, c]];
        }
    }
    !needed[row_of_label[label]]
}

fn push_row_op(
    matrix: &mut Array2<bool>,
    ops: &mut Vec<(usize, usize)>,
    ctrl: usize,
    target: usize,
) {
    add_line(matrix, false, ctrl, target);
    ops.push((ctrl, target));
}

/// Odd-even sweeps of neighbouring row operations until the matrix is
/// north-west triangular.
fn matrix_to_north_west(
    matrix: &mut Array2<bool>,
    inverse: &Array2<bool>,
) -> Vec<(usize, usize)> {
    let n = matrix.nrows();
    let (triangular, triangular_inverse) = lower_triangular(matrix, inverse);
    let mut labels: Vec<usize> = (0..n)
        .map(|i| (0..n).find(|&j| triangular[[i, n - 1 - j]]).unwrap_or(0))
        .collect();
    let mut row_of_label = vec![0; n];
    for (i, &label) in labels.iter().enumerate() {
        row_of_label[label] = i;
    }

    let mut ops = Vec::new();
    let mut first = 0;
    let mut idle_sweeps = 0;
    while idle_sweeps < 2 {
        let mut swapped = false;
        for i in (first..n - 1).step_by(2) {
            if labels[i] <= labels[i + 1] {
                continue;
            }
            swapped = true;
            let lower = line(matrix, false, i + 1);
            let sum: Vec<bool> = line(matrix, false, i)
                .iter()
                .zip(&lower)
                .map(|(a, b)| a ^ b)
                .collect();
            let label = labels[i + 1];
            if spanned_without(&row_of_label, &triangular_inverse, &lower, label) {
                // The rows swap labels without any gate.
            } else if spanned_without(&row_of_label, &triangular_inverse, &sum, label) {
                push_row_op(matrix, &mut ops, i, i + 1);
            } else if spanned_without(
                &row_of_label,
                &triangular_inverse,
                &line(matrix, false, i),
                label,
            ) {
                push_row_op(matrix, &mut ops, i + 1, i);
                push_row_op(matrix, &mut ops, i, i + 1);
            }
            labels.swap(i, i + 1);
        }
        idle_sweeps = if swapped { 0 } else { idle_sweeps + 1 };
        first = 1 - first;
    }
    ops
}

/// Odd-even sweeps taking a north-west triangular matrix to the identity.
fn north_west_to_identity(matrix: &mut Array2<bool>) -> Vec<(usize, usize)> {
    let n = matrix.nrows();
    let mut labels: Vec<usize> = (0..n).rev().collect();
    let mut ops = Vec::new();
    let mut first = 0;
    let mut idle_sweeps = 0;
    while idle_sweeps < 2 {
        let mut swapped = false;
        for i in (first..n - 1).step_by(2) {
            if labels[i] <= labels[i + 1] {
                continue;
            }
            swapped = true;
            if !matrix[[i, labels[i + 1]]] {
                push_row_op(matrix, &mut ops, i + 1, i);
            }
            push_row_op(matrix, &mut ops, i, i + 1);
            push_row_op(matrix, &mut ops, i + 1, i);
            labels.swap(i, i + 1);
        }
        idle_sweeps = if swapped { 0 } else { idle_sweeps + 1 };
        first = 1 - first;
    }
    ops
}

/// Depth-optimal CX circuit for an invertible boolean matrix using only
/// gates between neighbouring qubits; the depth is at most `5n`.
pub fn synth_cnot_depth_line_kms(matrix: ArrayView2<bool>) -> HlsResult<Circuit> {
    let n = matrix.nrows();
    let mut circuit = Circuit::with_size("linear_kms", n, 0);
    if n < 2 {
        return Ok(circuit);
    }

    // The row operations reduce the inverse to the identity, so in order
    // they build the matrix itself.
    let original = matrix.to_owned();
    let mut work = calc_inverse_matrix(matrix)?;
    let mut ops = matrix_to_north_west(&mut work, &original);
    ops.extend(north_west_to_identity(&mut work));
    debug_assert!((0..n).all(|i| (0..n).all(|j| work[[i, j]] == (i == j))));

    for (ctrl, target) in ops {
        circuit.cx(QubitId(ctrl), QubitId(target))?;
    }
    Ok(circuit)
}

/// KMS synthesis of a linear function, with the same transposed and inverted
/// options as [`synth_linear_pmh`]. Both keep every gate between neighbours.
pub fn synth_linear_kms(
    function: &LinearFunction,
    use_inverted: bool,
    use_transposed: bool,
) -> HlsResult<Circuit> {
    synth_linear_with(
        function,
        use_inverted,
        use_transposed,
        "linear_kms",
        synth_cnot_depth_line_kms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_linear(n: usize, gates: usize, seed: u64) -> LinearFunction {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut circuit = Circuit::with_size("random", n, 0);
        for _ in 0..gates {
            let c = rng.gen_range(0..n);
            let t = (c + rng.gen_range(1..n)) % n;
            circuit.cx(QubitId(c), QubitId(t)).unwrap();
        }
        LinearFunction::from_circuit(&circuit).unwrap()
    }

    #[test]
    fn test_pmh_reproduces_the_matrix() {
        for n in 2..=7 {
            for seed in 0..10 {
                let function = random_linear(n, 3 * n, seed);
                for section_size in [None, Some(1), Some(3)] {
                    let circuit = synth_linear_pmh(&function, section_size, false, false).unwrap();
                    assert_eq!(LinearFunction::from_circuit(&circuit).unwrap(), function);
                }
            }
        }
    }

    #[test]
    fn test_inverted_and_transposed_variants() {
        let function = random_linear(5, 12, 42);
        for use_inverted in [false, true] {
            for use_transposed in [false, true] {
                let circuit =
                    synth_linear_pmh(&function, None, use_inverted, use_transposed).unwrap();
                assert_eq!(
                    LinearFunction::from_circuit(&circuit).unwrap(),
                    function,
                    "inverted={use_inverted} transposed={use_transposed}"
                );
            }
        }
    }

    fn assert_neighbouring(circuit: &Circuit) {
        for inst in circuit.instructions() {
            let [a, b] = inst.qubits.as_slice() else {
                panic!("{} is not a two-qubit gate", inst.name());
            };
            assert_eq!(a.index().abs_diff(b.index()), 1, "{} on {a:?}, {b:?}", inst.name());
        }
    }

    #[test]
    fn test_kms_reproduces_the_matrix() {
        for n in 2..=7 {
            for seed in 0..10 {
                let function = random_linear(n, 3 * n, seed);
                let circuit = synth_linear_kms(&function, false, false).unwrap();
                assert_eq!(LinearFunction::from_circuit(&circuit).unwrap(), function);
                assert_neighbouring(&circuit);
                assert!(circuit.depth() <= 5 * n);
            }
        }
    }

    #[test]
    fn test_kms_inverted_and_transposed_variants() {
        let function = random_linear(6, 20, 9);
        for use_inverted in [false, true] {
            for use_transposed in [false, true] {
                let circuit = synth_linear_kms(&function, use_inverted, use_transposed).unwrap();
                assert_eq!(
                    LinearFunction::from_circuit(&circuit).unwrap(),
                    function,
                    "inverted={use_inverted} transposed={use_transposed}"
                );
                assert_neighbouring(&circuit);
            }
        }
    }

    #[test]
    fn test_kms_reverses_a_line() {
        // The qubit-reversal permutation is the worst case for neighbour
        // gates.
        let n = 5;
        let reversal = Array2::from_shape_fn((n, n), |(i, j)| i + j == n - 1);
        let circuit = synth_cnot_depth_line_kms(reversal.view()).unwrap();
        let function = LinearFunction::from_circuit(&circuit).unwrap();
        assert_eq!(function.matrix(), &reversal);
        assert_neighbouring(&circuit);
    }

    #[test]
    fn test_identity_needs_no_gates() {
        let identity = Array2::from_shape_fn((4, 4), |(i, j)| i == j);
        let circuit = synth_cnot_count_full_pmh(identity.view(), None).unwrap();
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_zero_section_size_is_rejected() {
        let identity = Array2::from_shape_fn((2, 2), |(i, j)| i == j);
        assert!(matches!(
            synth_cnot_count_full_pmh(identity.view(), Some(0)),
            Err(HlsError::InvalidParameters { .. })
        ));
    }

    #[test]
    fn test_default_section_size() {
        assert_eq!(default_section_size(1), 2);
        assert_eq!(default_section_size(16), 2);
        assert_eq!(default_section_size(1 << 10), 5);
    }
}
