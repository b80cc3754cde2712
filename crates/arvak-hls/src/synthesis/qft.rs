//! Quantum Fourier transform synthesis.
//!
//! Qubit 0 is the least significant bit. Without the final swaps, qubit `j`
//! of the output carries the phase `2π·x / 2^(j+1)`; the arithmetic
//! constructions rely on that convention.

use std::f64::consts::PI;

use arvak_ir::{Circuit, QubitId};

use crate::error::HlsResult;
use crate::synthesis::permutation::reverse_lnn_layers;

/// Controlled-phase rotations kept for target `j`: rotations with an angle
/// below `π / 2^(n - approximation_degree)` are dropped.
fn num_entanglements(n: usize, j: usize, approximation_degree: usize) -> usize {
    j.saturating_sub(approximation_degree.saturating_sub(n - j - 1))
}

/// Textbook QFT with optional approximation, barriers and swaps.
pub fn synth_qft_full(
    num_qubits: usize,
    approximation_degree: usize,
    do_swaps: bool,
    insert_barriers: bool,
    inverse: bool,
) -> HlsResult<Circuit> {
    let n = num_qubits;
    let mut circuit = Circuit::with_size("qft", n, 0);
    for j in (0..n).rev() {
        circuit.h(QubitId(j))?;
        let kept = num_entanglements(n, j, approximation_degree);
        for k in (j - kept..j).rev() {
            let lambda = PI * 2f64.powi(k as i32 - j as i32);
            circuit.cp(lambda, QubitId(j), QubitId(k))?;
        }
        if insert_barriers {
            circuit.barrier_all()?;
        }
    }
    if do_swaps {
        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - i - 1))?;
        }
    }
    if inverse {
        let mut inverted = circuit.inverse()?;
        inverted.set_name("iqft");
        return Ok(inverted);
    }
    Ok(circuit)
}

/// QFT for linear nearest-neighbour connectivity (Fowler, Devitt and
/// Hollenberg 2004).
///
/// The phase-and-swap network reverses the qubit order on its own, so it
/// implements the QFT including swaps. Without `do_swaps` a KMS reversal
/// network is appended.
pub fn synth_qft_line(
    num_qubits: usize,
    approximation_degree: usize,
    do_swaps: bool,
    inverse: bool,
) -> HlsResult<Circuit> {
    let n = num_qubits;
    let mut circuit = Circuit::with_size("qft_line", n, 0);
    let keep_below = (n + 1).saturating_sub(approximation_degree);

    for i in 0..n {
        circuit.h(QubitId(n - 1))?;
        for j in i..n - 1 {
            let q0 = QubitId(n - j + i - 1);
            let q1 = QubitId(n - j + i - 2);
            if j - i + 2 < keep_below {
                let phase = PI / 2f64.powi((j - i + 2) as i32);
                circuit
                    .p(phase, q0)?
                    .cx(q0, q1)?
                    .p(-phase, q1)?
                    .cx(q1, q0)?
                    .cx(q0, q1)?
                    .p(phase, q0)?;
            } else {
                circuit.cx(q0, q1)?.cx(q1, q0)?.cx(q0, q1)?;
            }
        }
    }
    if !do_swaps {
        for (a, b) in reverse_lnn_layers(n) {
            circuit.swap(QubitId(a), QubitId(b))?;
        }
    }
    if inverse {
        let mut inverted = circuit.inverse()?;
        inverted.set_name("iqft_line");
        return Ok(inverted);
    }
    Ok(circuit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::register;
    use arvak_ir::operator::{equivalent, simulate_basis};
    use num_complex::Complex64;

    fn expected_amplitude(n: usize, x: usize, k: usize) -> Complex64 {
        let dim = (1usize << n) as f64;
        Complex64::from_polar(1.0 / dim.sqrt(), 2.0 * PI * (x * k) as f64 / dim)
    }

    #[test]
    fn test_full_qft_matches_fourier_matrix() {
        let n = 3;
        let circuit = synth_qft_full(n, 0, true, false, false).unwrap();
        for x in 0..1 << n {
            let state = simulate_basis(&circuit, x).unwrap();
            for (k, amp) in state.amplitudes().iter().enumerate() {
                assert!((amp - expected_amplitude(n, x, k)).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn test_no_swap_phase_convention() {
        let n = 3;
        let x = 5;
        let circuit = synth_qft_full(n, 0, false, false, false).unwrap();
        let state = simulate_basis(&circuit, x).unwrap();
        // Qubit j is (|0⟩ + e^{2πi x / 2^(j+1)} |1⟩) / √2.
        let mut expected = Complex64::new(1.0, 0.0);
        let index = 0b111;
        for j in 0..n {
            expected *= Complex64::from_polar(
                1.0 / 2f64.sqrt(),
                2.0 * PI * x as f64 / 2f64.powi(j as i32 + 1),
            );
        }
        assert!((state.amplitudes()[index] - expected).norm() < 1e-9);
    }

    #[test]
    fn test_inverse_flag() {
        let forward = synth_qft_full(3, 0, true, false, false).unwrap();
        let inverse = synth_qft_full(3, 0, true, false, true).unwrap();
        let mut round_trip = forward.clone();
        round_trip.compose(&inverse, &register(0, 3)).unwrap();
        assert!(equivalent(&round_trip, &Circuit::with_size("id", 3, 0), false).unwrap());
    }

    #[test]
    fn test_approximation_drops_small_rotations() {
        let exact = synth_qft_full(4, 0, false, false, false).unwrap();
        let approx = synth_qft_full(4, 2, false, false, false).unwrap();
        assert_eq!(exact.count_ops().get("cp"), Some(&6));
        assert_eq!(approx.count_ops().get("cp"), Some(&3));
    }

    #[test]
    fn test_barriers() {
        let circuit = synth_qft_full(3, 0, true, true, false).unwrap();
        assert_eq!(circuit.count_ops().get("barrier"), Some(&3));
    }

    #[test]
    fn test_line_qft_matches_full() {
        for n in 1..=4 {
            for do_swaps in [true, false] {
                let full = synth_qft_full(n, 0, do_swaps, false, false).unwrap();
                let line = synth_qft_line(n, 0, do_swaps, false).unwrap();
                assert!(equivalent(&full, &line, false).unwrap(), "n={n} swaps={do_swaps}");
            }
        }
    }

    #[test]
    fn test_line_qft_is_nearest_neighbour() {
        let circuit = synth_qft_line(5, 0, false, false).unwrap();
        for inst in circuit.instructions() {
            if let [a, b] = inst.qubits.as_slice() {
                assert_eq!(a.index().abs_diff(b.index()), 1);
            }
        }
    }
}
