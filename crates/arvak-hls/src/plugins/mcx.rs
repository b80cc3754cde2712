//! Multi-controlled X variants.

use arvak_ir::{Family, HighLevelOperation};

use super::when;
use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::mcx::{
    synth_mcx_1_clean_b95, synth_mcx_1_clean_kg24, synth_mcx_1_dirty_kg24,
    synth_mcx_2_clean_kg24, synth_mcx_2_dirty_kg24, synth_mcx_gray_code,
    synth_mcx_n_clean_m15, synth_mcx_n_dirty_i15, synth_mcx_noaux_v24,
};

/// Priority order of the default variant.
const DEFAULT_CHAIN: &[&str] = &[
    "2_clean_kg24",
    "1_clean_kg24",
    "n_clean_m15",
    "n_dirty_i15",
    "2_dirty_kg24",
    "1_dirty_kg24",
    "1_clean_b95",
    "noaux_v24",
];

fn num_ctrl(op: &HighLevelOperation) -> Option<usize> {
    match op {
        HighLevelOperation::Mcx { num_ctrl_qubits } => Some(*num_ctrl_qubits),
        _ => None,
    }
}

fn two_clean(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    when(ctx.clean_ancillas() >= 2, || synth_mcx_2_clean_kg24(k))
}

fn one_clean(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    when(ctx.clean_ancillas() >= 1, || synth_mcx_1_clean_kg24(k))
}

fn n_clean(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    when(k < 3 || ctx.clean_ancillas() >= k - 2, || {
        synth_mcx_n_clean_m15(k)
    })
}

fn n_dirty(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    let available = ctx.clean_ancillas() + ctx.dirty_ancillas();
    let relative_phase = ctx.options.mcx.relative_phase.unwrap_or(false);
    let action_only = ctx.options.mcx.action_only.unwrap_or(false);
    when(k < 3 || available >= k - 2, || {
        synth_mcx_n_dirty_i15(k, relative_phase, action_only)
    })
}

fn two_dirty(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    let available = ctx.clean_ancillas() + ctx.dirty_ancillas();
    when(available >= 2, || synth_mcx_2_dirty_kg24(k))
}

fn one_dirty(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    let available = ctx.clean_ancillas() + ctx.dirty_ancillas();
    when(available >= 1, || synth_mcx_1_dirty_kg24(k))
}

fn one_clean_b95(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    when(k >= 3 && (k < 5 || ctx.clean_ancillas() >= 1), || {
        synth_mcx_1_clean_b95(k)
    })
}

fn noaux(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_mcx_noaux_v24(k)?.into())
}

fn gray_code(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(k) = num_ctrl(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_mcx_gray_code(k)?.into())
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::Mcx, "2_clean_kg24", two_clean));
    registry.register(FnPlugin::new(Family::Mcx, "1_clean_kg24", one_clean));
    registry.register(FnPlugin::new(Family::Mcx, "n_clean_m15", n_clean));
    registry.register(FnPlugin::new(Family::Mcx, "n_dirty_i15", n_dirty));
    registry.register(FnPlugin::new(Family::Mcx, "2_dirty_kg24", two_dirty));
    registry.register(FnPlugin::new(Family::Mcx, "1_dirty_kg24", one_dirty));
    registry.register(FnPlugin::new(Family::Mcx, "1_clean_b95", one_clean_b95));
    registry.register(FnPlugin::new(Family::Mcx, "noaux_v24", noaux));
    registry.register(FnPlugin::new(Family::Mcx, "gray_code", gray_code));
    registry.set_default(Family::Mcx, DefaultPolicy::Chain(DEFAULT_CHAIN));
}
