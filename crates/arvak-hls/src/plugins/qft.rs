//! QFT variants.

use arvak_ir::{Circuit, Family, HighLevelOperation};

use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::qft::{synth_qft_full, synth_qft_line};

/// The operation's parameters after option overrides.
struct QftParams {
    num_qubits: usize,
    approximation_degree: usize,
    do_swaps: bool,
    inverse: bool,
}

impl QftParams {
    fn of(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> Option<Self> {
        let HighLevelOperation::Qft {
            num_qubits,
            approximation_degree,
            do_swaps,
            inverse,
        } = op
        else {
            return None;
        };
        let options = &ctx.options.qft;
        Some(Self {
            num_qubits: *num_qubits,
            approximation_degree: options.approximation_degree.unwrap_or(*approximation_degree),
            do_swaps: options.reverse_qubits.map_or(*do_swaps, |reverse| !reverse),
            inverse: *inverse ^ options.inverse.unwrap_or(false),
        })
    }
}

fn named(mut circuit: Circuit, ctx: &ResourceContext<'_>) -> PluginResult {
    if let Some(name) = &ctx.options.qft.name {
        circuit.set_name(name.clone());
    }
    circuit.into()
}

fn full(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(p) = QftParams::of(op, ctx) else {
        return Ok(PluginResult::NotApplicable);
    };
    let circuit = synth_qft_full(
        p.num_qubits,
        p.approximation_degree,
        p.do_swaps,
        ctx.options.qft.insert_barriers.unwrap_or(false),
        p.inverse,
    )?;
    Ok(named(circuit, ctx))
}

fn line(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(p) = QftParams::of(op, ctx) else {
        return Ok(PluginResult::NotApplicable);
    };
    let circuit = synth_qft_line(p.num_qubits, p.approximation_degree, p.do_swaps, p.inverse)?;
    Ok(named(circuit, ctx))
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::Qft, "full", full));
    registry.register(FnPlugin::new(Family::Qft, "line", line));
    registry.set_default(Family::Qft, DefaultPolicy::Chain(&["full"]));
}
