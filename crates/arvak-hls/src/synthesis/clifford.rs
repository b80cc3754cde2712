//! Clifford synthesis by tableau reduction.
//!
//! The reduction appends gates to a copy of the tableau until it becomes the
//! identity; the synthesized circuit is the inverse of the recorded gates.
//! Every read goes to the live tableau, since each appended gate rewrites it.

use arvak_ir::linear::calc_inverse_matrix;
use arvak_ir::{Circuit, Clifford, QubitId};
use ndarray::Array2;

use crate::error::HlsResult;
use crate::synthesis::linear::{synth_cnot_count_full_pmh, synth_cnot_depth_line_kms};

/// Largest Clifford the exhaustive qubit-order search handles.
pub const CLIFFORD_BM_MAX_QUBITS: usize = 3;

/// A tableau paired with the circuit that reduces it.
struct Reduction {
    clifford: Clifford,
    circuit: Circuit,
}

impl Reduction {
    fn new(clifford: &Clifford, name: &str) -> Self {
        Reduction {
            clifford: clifford.clone(),
            circuit: Circuit::with_size(name, clifford.num_qubits(), 0),
        }
    }

    fn h(&mut self, q: usize) -> HlsResult<()> {
        self.clifford.apply_h(q);
        self.circuit.h(QubitId(q))?;
        Ok(())
    }

    fn s(&mut self, q: usize) -> HlsResult<()> {
        self.clifford.apply_s(q);
        self.circuit.s(QubitId(q))?;
        Ok(())
    }

    fn x(&mut self, q: usize) -> HlsResult<()> {
        self.clifford.apply_x(q);
        self.circuit.x(QubitId(q))?;
        Ok(())
    }

    fn z(&mut self, q: usize) -> HlsResult<()> {
        self.clifford.apply_z(q);
        self.circuit.z(QubitId(q))?;
        Ok(())
    }

    fn cx(&mut self, c: usize, t: usize) -> HlsResult<()> {
        self.clifford.apply_cx(c, t);
        self.circuit.cx(QubitId(c), QubitId(t))?;
        Ok(())
    }

    fn cz(&mut self, a: usize, b: usize) -> HlsResult<()> {
        self.clifford.apply_cz(a, b);
        self.circuit.cz(QubitId(a), QubitId(b))?;
        Ok(())
    }

    fn swap(&mut self, a: usize, b: usize) -> HlsResult<()> {
        self.clifford.apply_swap(a, b);
        self.circuit.swap(QubitId(a), QubitId(b))?;
        Ok(())
    }

    fn num_qubits(&self) -> usize {
        self.clifford.num_qubits()
    }

    /// Make the X part of destabilizer `q` nonzero on qubit `q`. `rest` are
    /// the other qubits still to reduce.
    fn set_qubit_x_true(&mut self, q: usize, rest: &[usize]) -> HlsResult<()> {
        if self.clifford.x(q, q) {
            return Ok(());
        }
        if let Some(&i) = rest.iter().find(|&&i| self.clifford.x(q, i)) {
            return self.swap(i, q);
        }
        if self.clifford.z(q, q) {
            return self.h(q);
        }
        if let Some(&i) = rest.iter().find(|&&i| self.clifford.z(q, i)) {
            self.h(i)?;
            self.swap(i, q)?;
        }
        Ok(())
    }

    /// Reduce destabilizer `q` to `X_q`.
    fn set_row_x_zero(&mut self, q: usize, rest: &[usize]) -> HlsResult<()> {
        for &i in rest {
            if self.clifford.x(q, i) {
                self.cx(q, i)?;
            }
        }
        if self.clifford.z(q, q) || rest.iter().any(|&i| self.clifford.z(q, i)) {
            if !self.clifford.z(q, q) {
                self.s(q)?;
            }
            for &i in rest {
                if self.clifford.z(q, i) {
                    self.cx(i, q)?;
                }
            }
            self.s(q)?;
        }
        Ok(())
    }

    /// Reduce stabilizer `q` to `Z_q`.
    fn set_row_z_zero(&mut self, q: usize, rest: &[usize]) -> HlsResult<()> {
        let row = self.num_qubits() + q;
        for &i in rest {
            if self.clifford.z(row, i) {
                self.cx(i, q)?;
            }
        }
        if self.clifford.x(row, q) || rest.iter().any(|&i| self.clifford.x(row, i)) {
            self.h(q)?;
            for &i in rest {
                if self.clifford.x(row, i) {
                    self.cx(q, i)?;
                }
            }
            if self.clifford.z(row, q) {
                self.s(q)?;
            }
            self.h(q)?;
        }
        Ok(())
    }

    /// Clear the signs of a tableau whose Paulis are already `X_q`, `Z_q`.
    fn fix_signs(&mut self) -> HlsResult<()> {
        let n = self.num_qubits();
        for q in 0..n {
            if self.clifford.phase(q) {
                self.z(q)?;
            }
            if self.clifford.phase(n + q) {
                self.x(q)?;
            }
        }
        Ok(())
    }

    /// Apply `S` where `pairs` has a diagonal one and `CZ` where it has an
    /// off-diagonal one. With `line` set, every CZ acts on neighbours.
    fn diagonal_layer(&mut self, pairs: &Array2<bool>, line: bool) -> HlsResult<()> {
        let n = self.num_qubits();
        for q in (0..n).filter(|&q| pairs[[q, q]]) {
            self.s(q)?;
        }
        if line {
            return self.line_cz_layer(pairs);
        }
        for a in 0..n {
            for b in (a + 1..n).filter(|&b| pairs[[a, b]]) {
                self.cz(a, b)?;
            }
        }
        Ok(())
    }

    /// Off-diagonal CZs of `pairs` on a line. An odd-even swap network of
    /// `n` rounds reverses the line and brings every pair together once; a
    /// second pass reverses it back.
    fn line_cz_layer(&mut self, pairs: &Array2<bool>) -> HlsResult<()> {
        let n = self.num_qubits();
        if !(0..n).any(|a| (a + 1..n).any(|b| pairs[[a, b]])) {
            return Ok(());
        }
        let mut at: Vec<usize> = (0..n).collect();
        for pass in 0..2 {
            for round in 0..n {
                for p in (round % 2..n - 1).step_by(2) {
                    if pass == 0 && pairs[[at[p], at[p + 1]]] {
                        self.cz(p, p + 1)?;
                    }
                    self.swap(p, p + 1)?;
                    at.swap(p, p + 1);
                }
            }
        }
        Ok(())
    }

    fn finish(self, name: &str) -> HlsResult<Circuit> {
        let mut circuit = self.circuit.inverse()?;
        circuit.set_name(name);
        Ok(circuit)
    }
}

/// Decouple one qubit at a time, in the order `pick` chooses from the qubits
/// still to reduce, then fix the signs.
fn reduce_by_qubit(
    clifford: &Clifford,
    name: &str,
    mut pick: impl FnMut(&Clifford, &[usize]) -> usize,
) -> HlsResult<Circuit> {
    let mut reduction = Reduction::new(clifford, name);
    let mut remaining: Vec<usize> = (0..clifford.num_qubits()).collect();
    while !remaining.is_empty() {
        let q = pick(&reduction.clifford, &remaining);
        remaining.retain(|&i| i != q);
        reduction.set_qubit_x_true(q, &remaining)?;
        reduction.set_row_x_zero(q, &remaining)?;
        reduction.set_row_z_zero(q, &remaining)?;
    }
    reduction.fix_signs()?;
    reduction.finish(name)
}

/// Aaronson–Gottesman style synthesis: qubit by qubit, reduce the
/// destabilizer to `X_q` and the stabilizer to `Z_q`, then fix the signs.
pub fn synth_clifford_ag(clifford: &Clifford) -> HlsResult<Circuit> {
    reduce_by_qubit(clifford, "clifford_ag", |_, remaining| remaining[0])
}

/// Number of other remaining qubits that destabilizer `q` or stabilizer `q`
/// acts on.
fn decoupling_cost(clifford: &Clifford, q: usize, remaining: &[usize]) -> usize {
    let n = clifford.num_qubits();
    let touches = |row: usize, i: usize| clifford.x(row, i) || clifford.z(row, i);
    remaining
        .iter()
        .filter(|&&i| i != q && (touches(q, i) || touches(n + q, i)))
        .count()
}

/// Greedy synthesis: the same reduction, always decoupling next the qubit
/// whose destabilizer and stabilizer touch the fewest remaining qubits.
pub fn synth_clifford_greedy(clifford: &Clifford) -> HlsResult<Circuit> {
    reduce_by_qubit(clifford, "clifford_greedy", |clifford, remaining| {
        remaining
            .iter()
            .copied()
            .min_by_key(|&q| (decoupling_cost(clifford, q, remaining), q))
            .unwrap_or(remaining[0])
    })
}

/// Qubits whose columns do not pivot in the X part of the destabilizers.
/// A Hadamard on each of them makes that part invertible.
fn non_pivot_qubits(clifford: &Clifford) -> Vec<usize> {
    let n = clifford.num_qubits();
    let mut work = Array2::from_shape_fn((n, n), |(r, q)| clifford.x(r, q));
    let mut pivots = vec![false; n];
    let mut row = 0;
    for col in 0..n {
        let Some(p) = (row..n).find(|&r| work[[r, col]]) else {
            continue;
        };
        for c in 0..n {
            work.swap([p, c], [row, c]);
        }
        let rows: Vec<usize> = (0..n).filter(|&r| r != row && work[[r, col]]).collect();
        for r in rows {
            for c in 0..n {
                let v = work[[row, c]];
                work[[r, c]] ^= v;
            }
        }
        pivots[col] = true;
        row += 1;
    }
    (0..n).filter(|&q| !pivots[q]).collect()
}

/// Layered synthesis: `H · CX · S/CZ · H · S/CZ · H · Pauli` in reduction
/// order. With `line` set the CX layer is KMS and the CZ layers use a swap
/// network, so every two-qubit gate acts on neighbouring qubits.
fn reduce_in_layers(clifford: &Clifford, name: &str, line: bool) -> HlsResult<Circuit> {
    let n = clifford.num_qubits();
    let mut reduction = Reduction::new(clifford, name);

    for q in non_pivot_qubits(&reduction.clifford) {
        reduction.h(q)?;
    }

    // Destabilizers are [A | B] with A invertible. Appended CX gates act on
    // A by column operations, so the layer realizes the transposed inverse.
    let a = Array2::from_shape_fn((n, n), |(r, q)| reduction.clifford.x(r, q));
    let target = calc_inverse_matrix(a.view())?.t().to_owned();
    let layer = if line {
        synth_cnot_depth_line_kms(target.view())?
    } else {
        synth_cnot_count_full_pmh(target.view(), None)?
    };
    for inst in layer.instructions() {
        reduction.cx(inst.qubits[0].index(), inst.qubits[1].index())?;
    }

    // Destabilizers are now [I | B] with B symmetric.
    let b = Array2::from_shape_fn((n, n), |(r, q)| reduction.clifford.z(r, q));
    reduction.diagonal_layer(&b, line)?;

    // Stabilizers are [C | I] with C symmetric; under Hadamards they become
    // [I | C] while the destabilizers lose their X part.
    for q in 0..n {
        reduction.h(q)?;
    }
    let c = Array2::from_shape_fn((n, n), |(r, q)| reduction.clifford.z(n + r, q));
    reduction.diagonal_layer(&c, line)?;
    for q in 0..n {
        reduction.h(q)?;
    }

    reduction.fix_signs()?;
    reduction.finish(name)
}

/// Layered Clifford synthesis with a single CX layer between Hadamard and
/// phase layers.
pub fn synth_clifford_layers(clifford: &Clifford) -> HlsResult<Circuit> {
    reduce_in_layers(clifford, "clifford_layers", false)
}

/// Layered Clifford synthesis for a linear nearest-neighbour connectivity.
pub fn synth_clifford_lnn(clifford: &Clifford) -> HlsResult<Circuit> {
    reduce_in_layers(clifford, "clifford_lnn", true)
}

/// The Clifford with qubit `i` relabelled from qubit `order[i]`.
fn relabel(clifford: &Clifford, order: &[usize]) -> HlsResult<Clifford> {
    let n = clifford.num_qubits();
    let source = clifford.tableau();
    let old_index = |k: usize| {
        if k < n {
            order[k]
        } else if k < 2 * n {
            n + order[k - n]
        } else {
            k
        }
    };
    let tableau = Array2::from_shape_fn((2 * n, 2 * n + 1), |(r, c)| {
        source[[old_index(r), old_index(c)]]
    });
    Ok(Clifford::from_tableau(tableau)?)
}

fn orders(n: usize) -> Vec<Vec<usize>> {
    if n == 0 {
        return vec![vec![]];
    }
    let mut out = Vec::new();
    for shorter in orders(n - 1) {
        for pos in 0..n {
            let mut order = shorter.clone();
            order.insert(pos, n - 1);
            out.push(order);
        }
    }
    out
}

/// Small-Clifford synthesis: the tableau reduction under every qubit order,
/// keeping the circuit with the fewest two-qubit gates.
///
/// Returns `None` above [`CLIFFORD_BM_MAX_QUBITS`] qubits.
pub fn synth_clifford_bm(clifford: &Clifford) -> HlsResult<Option<Circuit>> {
    let n = clifford.num_qubits();
    if n > CLIFFORD_BM_MAX_QUBITS {
        return Ok(None);
    }
    let mut best: Option<Circuit> = None;
    for order in orders(n) {
        let relabelled = relabel(clifford, &order)?;
        let reduced = synth_clifford_ag(&relabelled)?;
        let qubits: Vec<QubitId> = order.iter().copied().map(QubitId).collect();
        let mut candidate = Circuit::with_size("clifford_bm", n, 0);
        candidate.compose(&reduced, &qubits)?;

        let cost = |c: &Circuit| (c.num_nonlocal_gates(), c.len());
        if best.as_ref().is_none_or(|b| cost(&candidate) < cost(b)) {
            best = Some(candidate);
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::permutation::invert;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_clifford(n: usize, gates: usize, seed: u64) -> Clifford {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut circuit = Circuit::with_size("random", n, 0);
        for _ in 0..gates {
            let q = QubitId(rng.gen_range(0..n));
            match rng.gen_range(0..6) {
                0 => circuit.h(q).unwrap(),
                1 => circuit.s(q).unwrap(),
                2 => circuit.sdg(q).unwrap(),
                3 => circuit.x(q).unwrap(),
                4 => circuit.z(q).unwrap(),
                _ if n > 1 => {
                    let t = QubitId((q.index() + rng.gen_range(1..n)) % n);
                    circuit.cx(q, t).unwrap()
                }
                _ => circuit.y(q).unwrap(),
            };
        }
        Clifford::from_circuit(&circuit).unwrap()
    }

    #[test]
    fn test_ag_reproduces_random_cliffords() {
        for n in 1..=5 {
            for seed in 0..20 {
                let clifford = random_clifford(n, 6 * n, seed);
                let circuit = synth_clifford_ag(&clifford).unwrap();
                assert_eq!(Clifford::from_circuit(&circuit).unwrap(), clifford);
            }
        }
    }

    #[test]
    fn test_greedy_reproduces_random_cliffords() {
        for n in 1..=6 {
            for seed in 0..20 {
                let clifford = random_clifford(n, 8 * n, seed);
                let circuit = synth_clifford_greedy(&clifford).unwrap();
                assert_eq!(circuit.name(), "clifford_greedy");
                assert_eq!(Clifford::from_circuit(&circuit).unwrap(), clifford);
            }
        }
    }

    #[test]
    fn test_greedy_skips_idle_qubits() {
        // Only qubits 3 and 4 interact; the other qubits carry single-qubit
        // gates and need no CX at all.
        let mut circuit = Circuit::with_size("sparse", 5, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.s(QubitId(2)).unwrap();
        circuit.cx(QubitId(3), QubitId(4)).unwrap();
        let clifford = Clifford::from_circuit(&circuit).unwrap();
        let greedy = synth_clifford_greedy(&clifford).unwrap();
        assert_eq!(Clifford::from_circuit(&greedy).unwrap(), clifford);
        assert_eq!(greedy.num_nonlocal_gates(), 1);
    }

    #[test]
    fn test_layers_reproduce_random_cliffords() {
        for n in 1..=6 {
            for seed in 0..20 {
                let clifford = random_clifford(n, 8 * n, seed);
                let circuit = synth_clifford_layers(&clifford).unwrap();
                assert_eq!(Clifford::from_circuit(&circuit).unwrap(), clifford);
            }
        }
    }

    #[test]
    fn test_lnn_uses_neighbouring_gates_only() {
        for n in 1..=6 {
            for seed in 0..20 {
                let clifford = random_clifford(n, 8 * n, seed);
                let circuit = synth_clifford_lnn(&clifford).unwrap();
                assert_eq!(Clifford::from_circuit(&circuit).unwrap(), clifford);
                for inst in circuit.instructions().iter().filter(|i| i.qubits.len() == 2) {
                    let (a, b) = (inst.qubits[0].index(), inst.qubits[1].index());
                    assert_eq!(a.abs_diff(b), 1, "{} on {a}, {b}", inst.name());
                }
            }
        }
    }

    #[test]
    fn test_non_pivot_qubits_of_a_graph_state() {
        // H on qubit 0 turns its destabilizer into Z_0; only qubit 0 needs
        // a Hadamard to make the X block invertible again.
        let mut circuit = Circuit::with_size("h", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        let clifford = Clifford::from_circuit(&circuit).unwrap();
        assert_eq!(non_pivot_qubits(&clifford), vec![0]);
        assert!(non_pivot_qubits(&Clifford::identity(3)).is_empty());
    }

    #[test]
    fn test_identity_gives_empty_circuit() {
        let circuit = synth_clifford_ag(&Clifford::identity(3)).unwrap();
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_bm_is_size_gated() {
        assert!(synth_clifford_bm(&Clifford::identity(4)).unwrap().is_none());
        for seed in 0..20 {
            let clifford = random_clifford(3, 15, seed);
            let small = synth_clifford_bm(&clifford).unwrap().unwrap();
            assert_eq!(Clifford::from_circuit(&small).unwrap(), clifford);
            let ag = synth_clifford_ag(&clifford).unwrap();
            assert!(small.num_nonlocal_gates() <= ag.num_nonlocal_gates());
        }
    }

    #[test]
    fn test_relabel_round_trip() {
        let clifford = random_clifford(3, 12, 7);
        let order = [2, 0, 1];
        let there = relabel(&clifford, &order).unwrap();
        let back = relabel(&there, &invert(&order)).unwrap();
        assert_eq!(back, clifford);
    }
}
