//! Linear-function variants.

use arvak_ir::{Family, HighLevelOperation};

use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::linear::{synth_linear_kms, synth_linear_pmh};

/// Section size used when the caller does not set one.
pub const PMH_SECTION_SIZE: usize = 2;

fn pmh(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let HighLevelOperation::LinearFunction(function) = op else {
        return Ok(PluginResult::NotApplicable);
    };
    let options = &ctx.options.linear;
    let circuit = synth_linear_pmh(
        function,
        Some(options.section_size.unwrap_or(PMH_SECTION_SIZE)),
        options.use_inverted.unwrap_or(false),
        options.use_transposed.unwrap_or(false),
    )?;
    Ok(circuit.into())
}

fn kms(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let HighLevelOperation::LinearFunction(function) = op else {
        return Ok(PluginResult::NotApplicable);
    };
    let options = &ctx.options.linear;
    let circuit = synth_linear_kms(
        function,
        options.use_inverted.unwrap_or(false),
        options.use_transposed.unwrap_or(false),
    )?;
    Ok(circuit.into())
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::LinearFunction, "pmh", pmh));
    registry.register(FnPlugin::new(Family::LinearFunction, "kms", kms));
    registry.set_default(Family::LinearFunction, DefaultPolicy::Chain(&["pmh"]));
}
