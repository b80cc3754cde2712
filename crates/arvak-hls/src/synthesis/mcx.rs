//! Multi-controlled X synthesis.
//!
//! Every circuit uses the layout `[controls (k), target, ancillas]`. The
//! ancilla count of each construction is fixed by `k`:
//!
//! | Function | Ancillas (k ≥ 3) | Ancilla state |
//! |---|---|---|
//! | [`synth_mcx_noaux_v24`] | 0 | |
//! | [`synth_mcx_n_clean_m15`] | k − 2 | clean |
//! | [`synth_mcx_n_dirty_i15`] | k − 2 | dirty |
//! | [`synth_mcx_1_clean_kg24`] | 1 | clean |
//! | [`synth_mcx_2_clean_kg24`] | 2 | clean |
//! | [`synth_mcx_1_dirty_kg24`] | 1 | dirty |
//! | [`synth_mcx_2_dirty_kg24`] | 2 | dirty |
//! | [`synth_mcx_1_clean_b95`] | 1 if k ≥ 5 | clean |
//! | [`synth_mcx_gray_code`] | 0 | |
//!
//! For fewer than three controls every function returns X, CX or CCX.

use std::f64::consts::PI;

use arvak_ir::{Circuit, ParameterExpression, QubitId};

use crate::error::{HlsError, HlsResult};
use crate::synthesis::register;

fn direct(num_ctrl: usize) -> HlsResult<Option<Circuit>> {
    if num_ctrl >= 3 {
        return Ok(None);
    }
    let mut circuit = Circuit::with_size("mcx", num_ctrl + 1, 0);
    let controls = register(0, num_ctrl);
    circuit.mcx(&controls, QubitId(num_ctrl))?;
    Ok(Some(circuit))
}

/// Split the controls into a leading half of `⌈k/2⌉` qubits and the rest.
fn halves(controls: &[QubitId]) -> (&[QubitId], &[QubitId]) {
    controls.split_at(controls.len().div_ceil(2))
}

/// Qubits of `pool` that are not in `used`.
fn spare(pool: &[QubitId], used: &[QubitId]) -> Vec<QubitId> {
    pool.iter().copied().filter(|q| !used.contains(q)).collect()
}

/// Relative-phase Toffoli (Margolus). The sequence is its own inverse.
fn rccx(circuit: &mut Circuit, a: QubitId, b: QubitId, target: QubitId) -> HlsResult<()> {
    circuit
        .h(target)?
        .t(target)?
        .cx(b, target)?
        .tdg(target)?
        .cx(a, target)?
        .t(target)?
        .cx(b, target)?
        .tdg(target)?
        .h(target)?;
    Ok(())
}

fn action_gadget(circuit: &mut Circuit, q0: QubitId, q1: QubitId, q2: QubitId) -> HlsResult<()> {
    circuit.h(q2)?.t(q2)?.cx(q0, q2)?.tdg(q2)?.cx(q1, q2)?;
    Ok(())
}

fn reset_gadget(circuit: &mut Circuit, q0: QubitId, q1: QubitId, q2: QubitId) -> HlsResult<()> {
    circuit.cx(q1, q2)?.t(q2)?.cx(q0, q2)?.tdg(q2)?.h(q2)?;
    Ok(())
}

/// Append a multi-controlled phase without ancillas.
///
/// `P(λ)` on `target` fires when every control is |1⟩. The construction
/// halves the angle on the last control and recurses on the others.
pub(crate) fn append_mcphase(
    circuit: &mut Circuit,
    lambda: &ParameterExpression,
    controls: &[QubitId],
    target: QubitId,
) -> HlsResult<()> {
    match controls {
        [] => {
            circuit.p(lambda.clone(), target)?;
        }
        [c] => {
            circuit.cp(lambda.clone(), *c, target)?;
        }
        [rest @ .., last] => {
            let half = lambda.half();
            circuit.cp(half.clone(), *last, target)?;
            append_mcx_noaux(circuit, rest, *last)?;
            circuit.cp(half.negated(), *last, target)?;
            append_mcx_noaux(circuit, rest, *last)?;
            append_mcphase(circuit, &half, rest, target)?;
        }
    }
    Ok(())
}

/// Append an MCX built from the multi-controlled phase, without ancillas.
pub(crate) fn append_mcx_noaux(
    circuit: &mut Circuit,
    controls: &[QubitId],
    target: QubitId,
) -> HlsResult<()> {
    if controls.len() < 3 {
        circuit.mcx(controls, target)?;
        return Ok(());
    }
    circuit.h(target)?;
    append_mcphase(circuit, &PI.into(), controls, target)?;
    circuit.h(target)?;
    Ok(())
}

/// Append an exact MCX using `controls.len() - 2` dirty ancillas
/// (Barenco et al. 1995, Lemma 7.2). Every ancilla is restored.
pub(crate) fn append_mcx_vchain_dirty(
    circuit: &mut Circuit,
    controls: &[QubitId],
    target: QubitId,
    ancillas: &[QubitId],
) -> HlsResult<()> {
    let m = controls.len();
    if m < 3 {
        circuit.mcx(controls, target)?;
        return Ok(());
    }
    let a = &ancillas[..m - 2];
    let ladder_down = |circuit: &mut Circuit| -> HlsResult<()> {
        for i in (1..m - 2).rev() {
            circuit.ccx(controls[i + 1], a[i - 1], a[i])?;
        }
        Ok(())
    };
    let ladder_up = |circuit: &mut Circuit| -> HlsResult<()> {
        for i in 1..m - 2 {
            circuit.ccx(controls[i + 1], a[i - 1], a[i])?;
        }
        Ok(())
    };

    circuit.ccx(controls[m - 1], a[m - 3], target)?;
    ladder_down(circuit)?;
    circuit.ccx(controls[0], controls[1], a[0])?;
    ladder_up(circuit)?;
    circuit.ccx(controls[m - 1], a[m - 3], target)?;

    ladder_down(circuit)?;
    circuit.ccx(controls[0], controls[1], a[0])?;
    ladder_up(circuit)?;
    Ok(())
}

/// MCX without ancillas: `H · MCPhase(π) · H`.
pub fn synth_mcx_noaux_v24(num_ctrl: usize) -> HlsResult<Circuit> {
    if let Some(circuit) = direct(num_ctrl)? {
        return Ok(circuit);
    }
    let mut circuit = Circuit::with_size("mcx_noaux_v24", num_ctrl + 1, 0);
    append_mcx_noaux(&mut circuit, &register(0, num_ctrl), QubitId(num_ctrl))?;
    Ok(circuit)
}

/// MCX with `k − 2` clean ancillas: a relative-phase Toffoli V-chain
/// (Maslov 2015).
pub fn synth_mcx_n_clean_m15(num_ctrl: usize) -> HlsResult<Circuit> {
    if let Some(circuit) = direct(num_ctrl)? {
        return Ok(circuit);
    }
    let k = num_ctrl;
    let mut circuit = Circuit::with_size("mcx_n_clean_m15", 2 * k - 1, 0);
    let controls = register(0, k);
    let target = QubitId(k);
    let anc = register(k + 1, k - 2);

    rccx(&mut circuit, controls[0], controls[1], anc[0])?;
    for j in 2..k - 1 {
        rccx(&mut circuit, controls[j], anc[j - 2], anc[j - 1])?;
    }
    circuit.ccx(controls[k - 1], anc[k - 3], target)?;
    for j in (2..k - 1).rev() {
        rccx(&mut circuit, controls[j], anc[j - 2], anc[j - 1])?;
    }
    rccx(&mut circuit, controls[0], controls[1], anc[0])?;
    Ok(circuit)
}

/// MCX with `k − 2` dirty ancillas (Iten et al. 2016).
///
/// With `relative_phase` the result is correct up to a diagonal relative
/// phase; with `action_only` only the action part is emitted, which is
/// correct when the ancillas are clean.
pub fn synth_mcx_n_dirty_i15(
    num_ctrl: usize,
    relative_phase: bool,
    action_only: bool,
) -> HlsResult<Circuit> {
    let k = num_ctrl;
    if let Some(circuit) = direct(k)? {
        return Ok(circuit);
    }
    let mut circuit = Circuit::with_size("mcx_n_dirty_i15", 2 * k - 1, 0);
    let controls = register(0, k);
    let target = QubitId(k);
    let anc = register(k + 1, k - 2);

    if k == 3 && !relative_phase {
        append_mcx_vchain_dirty(&mut circuit, &controls, target, &anc)?;
        return Ok(circuit);
    }

    for j in 0..2 {
        if !relative_phase {
            circuit.ccx(controls[k - 1], anc[k - 3], target)?;
        } else if j == 0 {
            action_gadget(&mut circuit, controls[k - 1], anc[k - 3], target)?;
        } else {
            reset_gadget(&mut circuit, controls[k - 1], anc[k - 3], target)?;
        }

        for i in (0..k - 3).rev() {
            action_gadget(&mut circuit, controls[i + 2], anc[i], anc[i + 1])?;
        }
        rccx(&mut circuit, controls[0], controls[1], anc[0])?;
        for i in 0..k - 3 {
            reset_gadget(&mut circuit, controls[i + 2], anc[i], anc[i + 1])?;
        }

        if action_only {
            circuit.ccx(controls[k - 1], anc[k - 3], target)?;
            break;
        }
    }
    Ok(circuit)
}

/// MCX with one clean ancilla: AND one half of the controls into the
/// ancilla, apply an MCX from the other half and the ancilla, uncompute.
pub fn synth_mcx_1_clean_kg24(num_ctrl: usize) -> HlsResult<Circuit> {
    if let Some(circuit) = direct(num_ctrl)? {
        return Ok(circuit);
    }
    let k = num_ctrl;
    let mut circuit = Circuit::with_size("mcx_1_clean_kg24", k + 2, 0);
    let all = register(0, k + 2);
    let controls = &all[..k];
    let (target, anc) = (all[k], all[k + 1]);
    let (first, second) = halves(controls);
    let mut second_and_anc = second.to_vec();
    second_and_anc.push(anc);

    let compute = |circuit: &mut Circuit| {
        let used: Vec<QubitId> = first.iter().copied().chain([anc]).collect();
        append_mcx_vchain_dirty(circuit, first, anc, &spare(&all, &used))
    };
    compute(&mut circuit)?;
    let used: Vec<QubitId> = second_and_anc.iter().copied().chain([target]).collect();
    append_mcx_vchain_dirty(&mut circuit, &second_and_anc, target, &spare(&all, &used))?;
    compute(&mut circuit)?;
    Ok(circuit)
}

/// MCX with two clean ancillas: each half of the controls is ANDed into
/// its own ancilla, and a Toffoli on the two ancillas flips the target.
pub fn synth_mcx_2_clean_kg24(num_ctrl: usize) -> HlsResult<Circuit> {
    if let Some(circuit) = direct(num_ctrl)? {
        return Ok(circuit);
    }
    let k = num_ctrl;
    let mut circuit = Circuit::with_size("mcx_2_clean_kg24", k + 3, 0);
    let all = register(0, k + 3);
    let controls = &all[..k];
    let (target, a1, a2) = (all[k], all[k + 1], all[k + 2]);
    let (first, second) = halves(controls);

    let and_halves = |circuit: &mut Circuit| -> HlsResult<()> {
        let used: Vec<QubitId> = first.iter().copied().chain([a1]).collect();
        append_mcx_vchain_dirty(circuit, first, a1, &spare(&all, &used))?;
        let used: Vec<QubitId> = second.iter().copied().chain([a2]).collect();
        append_mcx_vchain_dirty(circuit, second, a2, &spare(&all, &used))
    };
    and_halves(&mut circuit)?;
    circuit.ccx(a1, a2, target)?;
    and_halves(&mut circuit)?;
    Ok(circuit)
}

/// Four-block MCX with one dirty ancilla (Barenco et al. 1995, Lemma 7.3).
fn four_block(name: &str, num_ctrl: usize) -> HlsResult<Circuit> {
    let k = num_ctrl;
    let mut circuit = Circuit::with_size(name, k + 2, 0);
    let all = register(0, k + 2);
    let controls = &all[..k];
    let (target, anc) = (all[k], all[k + 1]);
    let (first, second) = halves(controls);
    let mut second_and_anc = second.to_vec();
    second_and_anc.push(anc);

    for _ in 0..2 {
        let used: Vec<QubitId> = first.iter().copied().chain([anc]).collect();
        append_mcx_vchain_dirty(&mut circuit, first, anc, &spare(&all, &used))?;
        let used: Vec<QubitId> = second_and_anc.iter().copied().chain([target]).collect();
        append_mcx_vchain_dirty(&mut circuit, &second_and_anc, target, &spare(&all, &used))?;
    }
    Ok(circuit)
}

/// MCX with one dirty ancilla.
pub fn synth_mcx_1_dirty_kg24(num_ctrl: usize) -> HlsResult<Circuit> {
    if let Some(circuit) = direct(num_ctrl)? {
        return Ok(circuit);
    }
    four_block("mcx_1_dirty_kg24", num_ctrl)
}

/// MCX with two dirty ancillas.
///
/// Each half of the controls toggles its own ancilla twice, interleaved with
/// four Toffolis from the ancillas onto the target; the products that do not
/// involve both halves cancel.
pub fn synth_mcx_2_dirty_kg24(num_ctrl: usize) -> HlsResult<Circuit> {
    if let Some(circuit) = direct(num_ctrl)? {
        return Ok(circuit);
    }
    let k = num_ctrl;
    let mut circuit = Circuit::with_size("mcx_2_dirty_kg24", k + 3, 0);
    let all = register(0, k + 3);
    let controls = &all[..k];
    let (target, a1, a2) = (all[k], all[k + 1], all[k + 2]);
    let (first, second) = halves(controls);

    for _ in 0..2 {
        circuit.ccx(a1, a2, target)?;
        let used: Vec<QubitId> = first.iter().copied().chain([a1]).collect();
        append_mcx_vchain_dirty(&mut circuit, first, a1, &spare(&all, &used))?;
        circuit.ccx(a1, a2, target)?;
        let used: Vec<QubitId> = second.iter().copied().chain([a2]).collect();
        append_mcx_vchain_dirty(&mut circuit, second, a2, &spare(&all, &used))?;
    }
    Ok(circuit)
}

/// MCX following Barenco et al. 1995, Corollary 7.4: no ancilla for three
/// or four controls, one ancilla from five controls on.
pub fn synth_mcx_1_clean_b95(num_ctrl: usize) -> HlsResult<Circuit> {
    if num_ctrl < 5 {
        return synth_mcx_noaux_v24(num_ctrl);
    }
    four_block("mcx_1_clean_b95", num_ctrl)
}

/// MCX without ancillas from `2^k − 1` controlled phases of `±π/2^(k−1)`,
/// visiting the control subsets in Gray-code order (Barenco et al. 1995,
/// Lemma 7.1). The leading control of each subset carries its parity.
pub fn synth_mcx_gray_code(num_ctrl: usize) -> HlsResult<Circuit> {
    if let Some(circuit) = direct(num_ctrl)? {
        return Ok(circuit);
    }
    let k = num_ctrl;
    let codes = u32::try_from(k)
        .ok()
        .and_then(|shift| 1usize.checked_shl(shift))
        .ok_or_else(|| HlsError::InvalidParameters {
            name: "mcx.gray_code".into(),
            reason: format!("{k} controls exceed the Gray-code range"),
        })?;
    let angle = PI / 2f64.powi(k as i32 - 1);
    let bit = |code: usize, p: usize| (code >> (k - 1 - p)) & 1 == 1;
    let target = QubitId(k);

    let mut circuit = Circuit::with_size("mcx_gray_code", k + 1, 0);
    circuit.h(target)?;
    let mut previous: Option<usize> = None;
    for i in 1..codes {
        let code = i ^ (i >> 1);
        let Some(lead) = (0..k).find(|&p| bit(code, p)) else {
            continue;
        };
        let changed = previous.and_then(|prev| (0..k).find(|&p| bit(code, p) != bit(prev, p)));
        match changed {
            Some(p) if p == lead => {
                for other in (lead + 1..k).filter(|&o| bit(code, o)) {
                    circuit.cx(QubitId(other), QubitId(lead))?;
                }
            }
            Some(p) => {
                circuit.cx(QubitId(p), QubitId(lead))?;
            }
            None => {}
        }
        let sign = if code.count_ones() % 2 == 0 { -1.0 } else { 1.0 };
        circuit.cp(sign * angle, QubitId(lead), target)?;
        previous = Some(code);
    }
    circuit.h(target)?;
    Ok(circuit)
}
