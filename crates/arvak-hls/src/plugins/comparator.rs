//! Integer comparator variants.

use arvak_ir::{Family, HighLevelOperation};
use tracing::warn;

use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::arithmetic::{
    synth_integer_comparator_2s, synth_integer_comparator_greedy,
};

fn params(op: &HighLevelOperation) -> Option<(usize, i64, bool)> {
    match op {
        HighLevelOperation::IntegerComparator {
            num_state_qubits,
            value,
            geq,
        } => Some((*num_state_qubits, *value, *geq)),
        _ => None,
    }
}

/// Carry-chain ancillas the two's-complement variant needs.
fn carry_ancillas(n: usize) -> usize {
    n.saturating_sub(1)
}

fn twos(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some((n, value, geq)) = params(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    let required = carry_ancillas(n);
    if ctx.clean_ancillas() < required {
        warn!(
            required,
            available = ctx.clean_ancillas(),
            "int_comparator.twos needs clean ancillas for the carry chain"
        );
        return Ok(PluginResult::NotApplicable);
    }
    Ok(synth_integer_comparator_2s(n, value, geq)?.into())
}

fn noaux(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some((n, value, geq)) = params(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_integer_comparator_greedy(n, value, geq)?.into())
}

fn select(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> Vec<&'static str> {
    match params(op) {
        Some((n, _, _)) if ctx.clean_ancillas() >= carry_ancillas(n) => vec!["twos"],
        _ => vec!["noaux"],
    }
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::IntegerComparator, "twos", twos));
    registry.register(FnPlugin::new(Family::IntegerComparator, "noaux", noaux));
    registry.set_default(Family::IntegerComparator, DefaultPolicy::Conditional(select));
}
