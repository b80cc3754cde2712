//! Clifford variants.

use arvak_ir::{Circuit, Clifford, Family, HighLevelOperation};

use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::clifford::{
    synth_clifford_ag, synth_clifford_bm, synth_clifford_greedy, synth_clifford_layers,
    synth_clifford_lnn, CLIFFORD_BM_MAX_QUBITS,
};

fn synthesize(
    op: &HighLevelOperation,
    synth: fn(&Clifford) -> HlsResult<Circuit>,
) -> HlsResult<PluginResult> {
    let HighLevelOperation::Clifford(clifford) = op else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth(clifford)?.into())
}

fn ag(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    synthesize(op, synth_clifford_ag)
}

fn greedy(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    synthesize(op, synth_clifford_greedy)
}

fn layers(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    synthesize(op, synth_clifford_layers)
}

fn lnn(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    synthesize(op, synth_clifford_lnn)
}

fn bm(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let HighLevelOperation::Clifford(clifford) = op else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_clifford_bm(clifford)?.into())
}

/// Exhaustive search for small Cliffords, greedy reduction otherwise.
fn default_variants(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> Vec<&'static str> {
    match op {
        HighLevelOperation::Clifford(c) if c.num_qubits() <= CLIFFORD_BM_MAX_QUBITS => vec!["bm"],
        _ => vec!["greedy"],
    }
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::Clifford, "ag", ag));
    registry.register(FnPlugin::new(Family::Clifford, "bm", bm));
    registry.register(FnPlugin::new(Family::Clifford, "greedy", greedy));
    registry.register(FnPlugin::new(Family::Clifford, "layers", layers));
    registry.register(FnPlugin::new(Family::Clifford, "lnn", lnn));
    registry.set_default(Family::Clifford, DefaultPolicy::Conditional(default_variants));
}
