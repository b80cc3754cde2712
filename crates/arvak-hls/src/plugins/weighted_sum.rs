//! Weighted sum synthesis.

use arvak_ir::{Family, HighLevelOperation};
use tracing::warn;

use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::PluginRegistry;
use crate::synthesis::arithmetic::{synth_weighted_sum, weighted_sum_ancillas};

fn default(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let HighLevelOperation::WeightedSum { weights } = op else {
        return Ok(PluginResult::NotApplicable);
    };
    let required = weighted_sum_ancillas(weights);
    if ctx.clean_ancillas() < required {
        warn!(
            required,
            available = ctx.clean_ancillas(),
            "weighted_sum.default needs clean ancillas for the carry chain"
        );
        return Ok(PluginResult::NotApplicable);
    }
    Ok(synth_weighted_sum(weights)?.into())
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::WeightedSum, "default", default));
}
