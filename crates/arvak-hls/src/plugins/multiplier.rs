//! Multiplier variants.

use arvak_ir::{Family, HighLevelOperation};

use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::arithmetic::{synth_multiplier_cumulative_h18, synth_multiplier_qft_r17};

fn widths(op: &HighLevelOperation) -> Option<(usize, usize)> {
    match op {
        HighLevelOperation::Multiplier {
            num_state_qubits,
            num_result_qubits,
        } => Some((*num_state_qubits, *num_result_qubits)),
        _ => None,
    }
}

fn cumulative_h18(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some((n, r)) = widths(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_multiplier_cumulative_h18(n, r)?.into())
}

fn qft_r17(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some((n, r)) = widths(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_multiplier_qft_r17(n, r)?.into())
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::Multiplier, "cumulative_h18", cumulative_h18));
    registry.register(FnPlugin::new(Family::Multiplier, "qft_r17", qft_r17));
    registry.set_default(
        Family::Multiplier,
        DefaultPolicy::Chain(&["cumulative_h18", "qft_r17"]),
    );
}
