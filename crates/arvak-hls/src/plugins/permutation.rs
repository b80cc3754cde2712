//! Permutation variants.

use arvak_ir::{Family, HighLevelOperation};

use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::permutation::{
    synth_permutation_acg, synth_permutation_basic, synth_permutation_depth_lnn_kms,
};
use crate::synthesis::token_swapper::{
    DEFAULT_PARALLEL_THRESHOLD, DEFAULT_TRIALS, synth_permutation_token_swapper,
};

/// Seed of the token swapper when the options do not set one.
const DEFAULT_SEED: u64 = 0;

fn pattern(op: &HighLevelOperation) -> Option<&[usize]> {
    match op {
        HighLevelOperation::Permutation { pattern } => Some(pattern),
        _ => None,
    }
}

fn basic(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(pattern) = pattern(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_permutation_basic(pattern)?.into())
}

fn acg(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(pattern) = pattern(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_permutation_acg(pattern)?.into())
}

fn kms(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(pattern) = pattern(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_permutation_depth_lnn_kms(pattern)?.into())
}

fn token_swapper(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(pattern) = pattern(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    let reduced = match (ctx.coupling_map, ctx.qubits.as_deref()) {
        (Some(coupling), Some(qubits)) => Some(coupling.reduce(qubits)),
        _ => None,
    };
    let options = &ctx.options;
    let circuit = synth_permutation_token_swapper(
        pattern,
        reduced.as_ref(),
        options.trials.unwrap_or(DEFAULT_TRIALS),
        options.seed.unwrap_or(DEFAULT_SEED),
        options.parallel_threshold.unwrap_or(DEFAULT_PARALLEL_THRESHOLD),
    )?;
    Ok(circuit.into())
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::Permutation, "basic", basic));
    registry.register(FnPlugin::new(Family::Permutation, "acg", acg));
    registry.register(FnPlugin::new(Family::Permutation, "kms", kms));
    registry.register(FnPlugin::new(Family::Permutation, "token_swapper", token_swapper));
    registry.set_default(Family::Permutation, DefaultPolicy::Chain(&["basic"]));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::CouplingMap;
    use arvak_ir::operator::equivalent;
    use arvak_ir::{Circuit, Operation};

    fn run(key: &str, op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> PluginResult {
        let mut registry = PluginRegistry::new();
        register(&mut registry);
        registry.run_method(key, op, ctx).unwrap()
    }

    #[test]
    fn test_every_variant_is_exact() {
        let op = HighLevelOperation::permutation(vec![3, 0, 4, 1, 2]).unwrap();
        let reference = Circuit::from_operation(Operation::from(op.clone()));
        for key in [
            "permutation.default",
            "permutation.acg",
            "permutation.kms",
            "permutation.token_swapper",
        ] {
            let circuit = run(key, &op, &ResourceContext::new()).into_circuit().unwrap();
            assert!(equivalent(&circuit, &reference, false).unwrap(), "{key}");
        }
    }

    #[test]
    fn test_token_swapper_respects_the_coupling_map() {
        // Physical qubits 1, 2, 3 form a line inside a 5-qubit line.
        let line = CouplingMap::linear(5);
        let op = HighLevelOperation::permutation(vec![2, 0, 1]).unwrap();
        let ctx = ResourceContext::new().with_coupling(&line, vec![3, 1, 2]);
        let circuit = run("permutation.token_swapper", &op, &ctx).into_circuit().unwrap();
        // Operation qubits 0 and 1 sit on physical 3 and 1, which are not adjacent.
        for inst in circuit.instructions() {
            let pair = (inst.qubits[0].index(), inst.qubits[1].index());
            assert!(pair != (0, 1) && pair != (1, 0));
        }
    }

    #[test]
    fn test_token_swapper_declines_split_qubits() {
        let line = CouplingMap::linear(5);
        let op = HighLevelOperation::permutation(vec![1, 0]).unwrap();
        let ctx = ResourceContext::new().with_coupling(&line, vec![0, 4]);
        assert!(!run("permutation.token_swapper", &op, &ctx).is_applicable());
    }
}
