//! Adders, comparators, multipliers and weighted sums.
//!
//! Register layouts, with every register little-endian:
//!
//! | Operation | Qubits |
//! |---|---|
//! | modular adder | `[a (n), b (n)]`, `b ← a + b mod 2^n` |
//! | half adder | `[a (n), b (n), cout]`, `cout ⊕= carry` |
//! | full adder | `[cin, a (n), b (n), cout]` |
//! | comparator | `[x (n), result]`, `result ⊕= (x ≥ v)` or `(x < v)` |
//! | multiplier | `[a (n), b (n), out (r)]`, `out ← out + a·b mod 2^r` |
//! | weighted sum | `[x (n), sum (s)]`, `sum ← sum + Σ wᵢxᵢ mod 2^s` |
//!
//! Ancillas follow the operation's qubits and are returned clean.

use std::f64::consts::PI;

use arvak_ir::operation::{weight_total, weighted_sum_width};
use arvak_ir::{Circuit, HighLevelOperation, Modifier, QubitId};

use crate::error::{HlsError, HlsResult};
use crate::synthesis::register;

/// The three adder flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdderKind {
    /// Sum modulo `2^n`.
    Modular,
    /// Sum with carry-out.
    Half,
    /// Sum with carry-in and carry-out.
    Full,
}

impl AdderKind {
    /// The kind and width `n` of an adder operation.
    pub fn of(op: &HighLevelOperation) -> Option<(AdderKind, usize)> {
        match op {
            HighLevelOperation::ModularAdder { num_state_qubits } => {
                Some((AdderKind::Modular, *num_state_qubits))
            }
            HighLevelOperation::HalfAdder { num_state_qubits } => {
                Some((AdderKind::Half, *num_state_qubits))
            }
            HighLevelOperation::FullAdder { num_state_qubits } => {
                Some((AdderKind::Full, *num_state_qubits))
            }
            _ => None,
        }
    }

    /// Name used in circuit names and errors.
    pub fn name(self) -> &'static str {
        match self {
            AdderKind::Modular => "modular_adder",
            AdderKind::Half => "half_adder",
            AdderKind::Full => "full_adder",
        }
    }
}

struct AdderLayout {
    cin: Option<QubitId>,
    a: Vec<QubitId>,
    b: Vec<QubitId>,
    cout: Option<QubitId>,
    width: usize,
}

impl AdderLayout {
    fn new(kind: AdderKind, n: usize) -> Self {
        match kind {
            AdderKind::Modular => Self {
                cin: None,
                a: register(0, n),
                b: register(n, n),
                cout: None,
                width: 2 * n,
            },
            AdderKind::Half => Self {
                cin: None,
                a: register(0, n),
                b: register(n, n),
                cout: Some(QubitId(2 * n)),
                width: 2 * n + 1,
            },
            AdderKind::Full => Self {
                cin: Some(QubitId(0)),
                a: register(1, n),
                b: register(n + 1, n),
                cout: Some(QubitId(2 * n + 1)),
                width: 2 * n + 2,
            },
        }
    }
}

fn require_state_qubits(name: &str, n: usize) -> HlsResult<()> {
    if n == 0 {
        return Err(HlsError::InvalidParameters {
            name: name.to_string(),
            reason: "needs at least one state qubit".into(),
        });
    }
    Ok(())
}

// =============================================================================
// Ripple-carry adders
// =============================================================================

/// Ripple-carry adder of Cuccaro, Draper, Kutin and Moulton (2004).
///
/// Modular and half adders take one clean helper qubit after the operation's
/// qubits; the full adder uses its carry-in as the helper.
pub fn synth_adder_ripple_c04(n: usize, kind: AdderKind) -> HlsResult<Circuit> {
    require_state_qubits(kind.name(), n)?;
    let layout = AdderLayout::new(kind, n);
    let (helper, width) = match layout.cin {
        Some(cin) => (cin, layout.width),
        None => (QubitId(layout.width), layout.width + 1),
    };
    let mut circuit = Circuit::with_size(format!("{}_ripple_c04", kind.name()), width, 0);
    let (a, b) = (&layout.a, &layout.b);

    let maj = |circuit: &mut Circuit, c: QubitId, b: QubitId, a: QubitId| -> HlsResult<()> {
        circuit.cx(a, b)?.cx(a, c)?.ccx(c, b, a)?;
        Ok(())
    };
    let uma = |circuit: &mut Circuit, c: QubitId, b: QubitId, a: QubitId| -> HlsResult<()> {
        circuit.ccx(c, b, a)?.cx(a, c)?.cx(c, b)?;
        Ok(())
    };

    maj(&mut circuit, helper, b[0], a[0])?;
    for i in 1..n {
        maj(&mut circuit, a[i - 1], b[i], a[i])?;
    }
    if let Some(cout) = layout.cout {
        circuit.cx(a[n - 1], cout)?;
    }
    for i in (1..n).rev() {
        uma(&mut circuit, a[i - 1], b[i], a[i])?;
    }
    uma(&mut circuit, helper, b[0], a[0])?;
    Ok(circuit)
}

/// Ripple-carry adder of Vedral, Barenco and Ekert (1995) with `n - 1`
/// clean carry ancillas.
pub fn synth_adder_ripple_v95(n: usize, kind: AdderKind) -> HlsResult<Circuit> {
    require_state_qubits(kind.name(), n)?;
    let layout = AdderLayout::new(kind, n);
    let width = layout.width + n - 1;
    let mut circuit = Circuit::with_size(format!("{}_ripple_v95", kind.name()), width, 0);
    let (a, b) = (&layout.a, &layout.b);

    let mut carries: Vec<Option<QubitId>> = Vec::with_capacity(n + 1);
    carries.push(layout.cin);
    carries.extend(register(layout.width, n - 1).into_iter().map(Some));
    carries.push(layout.cout);

    let carry = |circuit: &mut Circuit,
                 c: Option<QubitId>,
                 a: QubitId,
                 b: QubitId,
                 next: QubitId|
     -> HlsResult<()> {
        circuit.ccx(a, b, next)?.cx(a, b)?;
        if let Some(c) = c {
            circuit.ccx(c, b, next)?;
        }
        Ok(())
    };
    let carry_dg = |circuit: &mut Circuit,
                    c: Option<QubitId>,
                    a: QubitId,
                    b: QubitId,
                    next: QubitId|
     -> HlsResult<()> {
        if let Some(c) = c {
            circuit.ccx(c, b, next)?;
        }
        circuit.cx(a, b)?.ccx(a, b, next)?;
        Ok(())
    };
    let sum = |circuit: &mut Circuit, c: Option<QubitId>, a: QubitId, b: QubitId| {
        circuit.cx(a, b)?;
        if let Some(c) = c {
            circuit.cx(c, b)?;
        }
        Ok::<(), HlsError>(())
    };

    for i in 0..n {
        if let Some(next) = carries[i + 1] {
            carry(&mut circuit, carries[i], a[i], b[i], next)?;
        }
    }
    if carries[n].is_some() {
        circuit.cx(a[n - 1], b[n - 1])?;
    }
    sum(&mut circuit, carries[n - 1], a[n - 1], b[n - 1])?;
    for i in (0..n - 1).rev() {
        if let Some(next) = carries[i + 1] {
            carry_dg(&mut circuit, carries[i], a[i], b[i], next)?;
        }
        sum(&mut circuit, carries[i], a[i], b[i])?;
    }
    Ok(circuit)
}

/// Half adder without ancillas (Takahashi, Tani and Kunihiro 2010).
pub fn synth_adder_ripple_r25(n: usize) -> HlsResult<Circuit> {
    require_state_qubits("half_adder", n)?;
    let mut circuit = Circuit::with_size("half_adder_ripple_r25", 2 * n + 1, 0);
    // The carry-out acts as the (n+1)-th bit of `a`.
    let a = register(0, n).into_iter().chain([QubitId(2 * n)]).collect::<Vec<_>>();
    let b = register(n, n);

    for i in 1..n {
        circuit.cx(a[i], b[i])?;
    }
    for i in (1..n).rev() {
        circuit.cx(a[i], a[i + 1])?;
    }
    for i in 0..n {
        circuit.ccx(a[i], b[i], a[i + 1])?;
    }
    for i in (1..n).rev() {
        circuit.cx(a[i], b[i])?;
        circuit.ccx(a[i - 1], b[i - 1], a[i])?;
    }
    for i in 1..n.saturating_sub(1) {
        circuit.cx(a[i], a[i + 1])?;
    }
    for i in 0..n {
        circuit.cx(a[i], b[i])?;
    }
    Ok(circuit)
}

// =============================================================================
// Fourier-space adders and multipliers
// =============================================================================

fn fourier_register(num_qubits: usize) -> HighLevelOperation {
    HighLevelOperation::Qft {
        num_qubits,
        approximation_degree: 0,
        do_swaps: false,
        inverse: false,
    }
}

fn inverse_fourier_register(num_qubits: usize) -> HighLevelOperation {
    HighLevelOperation::annotated(fourier_register(num_qubits), vec![Modifier::Inverse])
}

/// Draper adder (2000): the sum register is moved to Fourier space, each
/// addend bit adds its phases, and an annotated inverse QFT returns.
pub fn synth_adder_qft_d00(n: usize, kind: AdderKind) -> HlsResult<Circuit> {
    require_state_qubits(kind.name(), n)?;
    let layout = AdderLayout::new(kind, n);
    let mut circuit = Circuit::with_size(format!("{}_qft_d00", kind.name()), layout.width, 0);

    let mut sum = layout.b.clone();
    sum.extend(layout.cout);
    let m = sum.len();

    circuit.high_level(fourier_register(m), sum.iter().copied())?;
    let addends = layout
        .cin
        .map(|cin| (0, cin))
        .into_iter()
        .chain(layout.a.iter().copied().enumerate());
    for (position, control) in addends {
        for k in 0..m - position {
            circuit.cp(PI / 2f64.powi(k as i32), control, sum[position + k])?;
        }
    }
    circuit.high_level(inverse_fourier_register(m), sum.iter().copied())?;
    Ok(circuit)
}

fn ccp(circuit: &mut Circuit, lambda: f64, x: QubitId, y: QubitId, z: QubitId) -> HlsResult<()> {
    circuit
        .cp(lambda / 2.0, y, z)?
        .cx(x, y)?
        .cp(-lambda / 2.0, y, z)?
        .cx(x, y)?
        .cp(lambda / 2.0, x, z)?;
    Ok(())
}

fn multiplier_registers(n: usize, r: usize) -> HlsResult<(Vec<QubitId>, Vec<QubitId>, Vec<QubitId>)> {
    require_state_qubits("multiplier", n)?;
    if r == 0 {
        return Err(HlsError::InvalidParameters {
            name: "multiplier".into(),
            reason: "needs at least one result qubit".into(),
        });
    }
    Ok((register(0, n), register(n, n), register(2 * n, r)))
}

/// Multiplier as a sum of controlled adders, one per bit of `a`
/// (Häner, Roetteler and Svore 2018). The controlled adders are annotated
/// operations.
pub fn synth_multiplier_cumulative_h18(n: usize, r: usize) -> HlsResult<Circuit> {
    let (a, b, out) = multiplier_registers(n, r)?;
    let mut circuit = Circuit::with_size("multiplier_cumulative_h18", 2 * n + r, 0);

    for (i, &control) in a.iter().enumerate().take(r) {
        let remaining = r - i;
        let (adder, targets) = if remaining > n {
            (
                HighLevelOperation::HalfAdder { num_state_qubits: n },
                b.iter().chain(&out[i..=i + n]).copied().collect::<Vec<_>>(),
            )
        } else {
            (
                HighLevelOperation::ModularAdder {
                    num_state_qubits: remaining,
                },
                b[..remaining].iter().chain(&out[i..]).copied().collect(),
            )
        };
        let controlled = HighLevelOperation::annotated(adder, vec![Modifier::control(1)]);
        circuit.high_level(controlled, std::iter::once(control).chain(targets))?;
    }
    Ok(circuit)
}

/// Multiplier with doubly controlled phases in Fourier space (Ruiz-Perez and
/// Garcia-Escartin 2017).
pub fn synth_multiplier_qft_r17(n: usize, r: usize) -> HlsResult<Circuit> {
    let (a, b, out) = multiplier_registers(n, r)?;
    let mut circuit = Circuit::with_size("multiplier_qft_r17", 2 * n + r, 0);

    circuit.high_level(fourier_register(r), out.iter().copied())?;
    for (p, &x) in a.iter().enumerate() {
        for (q, &y) in b.iter().enumerate() {
            for j in (p + q)..r {
                let lambda = PI / 2f64.powi((j - p - q) as i32);
                ccp(&mut circuit, lambda, x, y, out[j])?;
            }
        }
    }
    circuit.high_level(inverse_fourier_register(r), out.iter().copied())?;
    Ok(circuit)
}

// =============================================================================
// Comparators
// =============================================================================

/// Comparison outcome that does not depend on `x`.
fn constant_comparison(n: usize, value: i64) -> Option<bool> {
    if value <= 0 {
        Some(true)
    } else if n < 63 && value >= 1i64 << n {
        Some(false)
    } else {
        None
    }
}

/// Bit `i` of `value`; zero past the 64th bit.
fn bit_of(value: u64, i: usize) -> bool {
    u32::try_from(i)
        .ok()
        .and_then(|i| value.checked_shr(i))
        .is_some_and(|shifted| shifted & 1 == 1)
}

/// `target ⊕= a ∨ b`.
fn or_into(circuit: &mut Circuit, a: QubitId, b: QubitId, target: QubitId) -> HlsResult<()> {
    circuit
        .x(a)?
        .x(b)?
        .ccx(a, b, target)?
        .x(a)?
        .x(b)?
        .x(target)?;
    Ok(())
}

/// Comparator through the carry of `x + (2^n - v)`, with `n - 1` clean
/// ancillas holding the intermediate carries.
pub fn synth_integer_comparator_2s(n: usize, value: i64, geq: bool) -> HlsResult<Circuit> {
    require_state_qubits("int_comparator", n)?;
    let x = register(0, n);
    let result = QubitId(n);
    let mut circuit = Circuit::with_size("int_comparator_twos", 2 * n, 0);

    if let Some(always) = constant_comparison(n, value) {
        if always == geq {
            circuit.x(result)?;
        }
        return Ok(circuit);
    }

    // 0 < value < 2^n, so 2^n - v is the n-bit complement of v - 1.
    let below = value as u64 - 1;
    let bit = |i: usize| !bit_of(below, i);
    let carries: Vec<QubitId> = register(n + 1, n - 1).into_iter().chain([result]).collect();

    let step = |circuit: &mut Circuit, i: usize, undo: bool| -> HlsResult<()> {
        if i == 0 {
            if bit(0) {
                circuit.cx(x[0], carries[0])?;
            }
        } else if bit(i) {
            if undo {
                circuit
                    .x(carries[i])?
                    .x(carries[i - 1])?
                    .x(x[i])?
                    .ccx(x[i], carries[i - 1], carries[i])?
                    .x(carries[i - 1])?
                    .x(x[i])?;
            } else {
                or_into(circuit, x[i], carries[i - 1], carries[i])?;
            }
        } else {
            circuit.ccx(x[i], carries[i - 1], carries[i])?;
        }
        Ok(())
    };

    for i in 0..n {
        step(&mut circuit, i, false)?;
    }
    if !geq {
        circuit.x(result)?;
    }
    for i in (0..n - 1).rev() {
        step(&mut circuit, i, true)?;
    }
    Ok(circuit)
}

/// Comparator without ancillas: one multi-controlled X per term of a
/// disjoint decomposition of `x ≥ v` by the highest differing bit.
pub fn synth_integer_comparator_greedy(n: usize, value: i64, geq: bool) -> HlsResult<Circuit> {
    require_state_qubits("int_comparator", n)?;
    let x = register(0, n);
    let result = QubitId(n);
    let mut circuit = Circuit::with_size("int_comparator_noaux", n + 1, 0);

    if let Some(always) = constant_comparison(n, value) {
        if always == geq {
            circuit.x(result)?;
        }
        return Ok(circuit);
    }
    if !geq {
        circuit.x(result)?;
    }

    let v = value as u64;
    let required = |j: usize| bit_of(v, j);
    // Term i: x agrees with v above bit i, and x_i = 1 where v_i = 0.
    // The last term is x = v.
    let terms = (0..n)
        .filter(|&i| !required(i))
        .map(Some)
        .chain(std::iter::once(None));
    for term in terms {
        let lowest = term.unwrap_or(0);
        let controls = &x[lowest..];
        let flips: Vec<QubitId> = (lowest..n)
            .filter(|&j| {
                let want = if Some(j) == term { true } else { required(j) };
                !want
            })
            .map(|j| x[j])
            .collect();
        for &q in &flips {
            circuit.x(q)?;
        }
        circuit.mcx(controls, result)?;
        for &q in &flips {
            circuit.x(q)?;
        }
    }
    Ok(circuit)
}

// =============================================================================
// Weighted sum
// =============================================================================

/// Number of clean ancillas [`synth_weighted_sum`] needs.
pub fn weighted_sum_ancillas(weights: &[u64]) -> usize {
    weighted_sum_width(weights) - 1
}

/// Weighted sum as controlled increments: for every set bit `j` of `wᵢ`,
/// `xᵢ` increments `sum[j..]` through a clean carry chain.
pub fn synth_weighted_sum(weights: &[u64]) -> HlsResult<Circuit> {
    weight_total(weights)?;
    let n = weights.len();
    let s = weighted_sum_width(weights);
    let x = register(0, n);
    let sum = register(n, s);
    let anc = register(n + s, s - 1);
    let mut circuit = Circuit::with_size("weighted_sum", n + 2 * s - 1, 0);

    for (i, &weight) in weights.iter().enumerate() {
        for j in (0..s).filter(|&j| (weight >> j) & 1 == 1) {
            let y = &sum[j..];
            let m = y.len();
            // carry[t] is set iff the control and y[..t] are all one.
            let carry: Vec<QubitId> = std::iter::once(x[i])
                .chain(anc[..m - 1].iter().copied())
                .collect();
            for t in 1..m {
                circuit.ccx(carry[t - 1], y[t - 1], carry[t])?;
            }
            for t in (1..m).rev() {
                circuit.cx(carry[t], y[t])?;
                circuit.ccx(carry[t - 1], y[t - 1], carry[t])?;
            }
            circuit.cx(x[i], y[0])?;
        }
    }
    Ok(circuit)
}
