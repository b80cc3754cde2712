//! Pauli-evolution variants.
//!
//! Option overrides act on a copy of the embedded strategy; the operation
//! itself is never changed.

use arvak_ir::{EvolutionSynthesis, Family, HighLevelOperation, PauliEvolution};
use tracing::{debug, warn};

use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::PluginRegistry;
use crate::synthesis::evolution::{
    expand_rotations, normalize_operators, synth_pauli_evolution, synth_pauli_network,
};

/// The embedded strategy with the `preserve_order` override applied.
fn strategy(evolution: &PauliEvolution, ctx: &ResourceContext<'_>) -> EvolutionSynthesis {
    let embedded = evolution.synthesis();
    match ctx.options.evolution.preserve_order {
        Some(preserve) if embedded.is_product_formula() => embedded.with_preserve_order(preserve),
        _ => embedded.clone(),
    }
}

fn default(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let HighLevelOperation::PauliEvolution(evolution) = op else {
        return Ok(PluginResult::NotApplicable);
    };
    let synthesis = strategy(evolution, ctx);
    Ok(synth_pauli_evolution(evolution, &synthesis)?.into())
}

fn rustiq(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let HighLevelOperation::PauliEvolution(evolution) = op else {
        return Ok(PluginResult::NotApplicable);
    };
    if !evolution.synthesis().is_product_formula() {
        warn!(
            synthesis = ?evolution.synthesis(),
            "pauli_evolution.rustiq only handles product formulas"
        );
        return Ok(PluginResult::NotApplicable);
    }
    let options = &ctx.options.evolution;
    if options.upto_clifford.is_some() || options.resynth_clifford_method.is_some() {
        debug!("Clifford-related options do not change the Pauli network");
    }

    let operator = normalize_operators(evolution)?;
    let synthesis = strategy(evolution, ctx);
    let rotations = expand_rotations(operator.terms(), evolution.time(), &synthesis)?;
    let circuit = synth_pauli_network(
        evolution.num_qubits(),
        &rotations,
        options.optimize_count.unwrap_or(true),
        options.upto_phase.unwrap_or(false),
    )?;
    Ok(circuit.into())
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::PauliEvolution, "default", default));
    registry.register(FnPlugin::new(Family::PauliEvolution, "rustiq", rustiq));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HlsError;
    use crate::options::{EvolutionOptions, PluginOptions};
    use arvak_ir::operator::equivalent;
    use arvak_ir::{PauliOperator, SparsePauliOp};

    fn evolution_op(labels: &[(&str, f64)], synthesis: EvolutionSynthesis) -> HighLevelOperation {
        let op = SparsePauliOp::from_labels(labels).unwrap();
        let evo = PauliEvolution::new(vec![PauliOperator::from(op)], 0.4, synthesis).unwrap();
        HighLevelOperation::PauliEvolution(evo)
    }

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        register(&mut registry);
        registry
    }

    fn ctx_with(evolution: EvolutionOptions) -> ResourceContext<'static> {
        ResourceContext::new().with_options(PluginOptions {
            evolution,
            ..PluginOptions::default()
        })
    }

    #[test]
    fn test_preserve_order_override_leaves_op_untouched() {
        let op = evolution_op(
            &[("ZI", 1.0), ("XX", 0.3), ("ZI", 0.5)],
            EvolutionSynthesis::default(),
        );
        let before = op.clone();
        let ctx = ctx_with(EvolutionOptions {
            preserve_order: Some(false),
            ..EvolutionOptions::default()
        });
        let grouped = registry()
            .run_method("pauli_evolution.default", &op, &ctx)
            .unwrap()
            .into_circuit()
            .unwrap();
        let ordered = registry()
            .run_method("pauli_evolution.default", &op, &ResourceContext::new())
            .unwrap()
            .into_circuit()
            .unwrap();
        assert_eq!(op, before);
        assert_ne!(grouped, ordered);
    }

    #[test]
    fn test_rustiq_matches_default_for_commuting_terms() {
        let op = evolution_op(&[("ZZ", 1.0), ("ZI", 0.5)], EvolutionSynthesis::default());
        let default = registry()
            .run_method("pauli_evolution.default", &op, &ResourceContext::new())
            .unwrap()
            .into_circuit()
            .unwrap();
        let network = registry()
            .run_method("pauli_evolution.rustiq", &op, &ResourceContext::new())
            .unwrap()
            .into_circuit()
            .unwrap();
        assert!(equivalent(&default, &network, false).unwrap());
    }

    #[test]
    fn test_rustiq_declines_qdrift() {
        let op = evolution_op(
            &[("XX", 1.0)],
            EvolutionSynthesis::QDrift { reps: 2, seed: 1 },
        );
        let result = registry()
            .run_method("pauli_evolution.rustiq", &op, &ResourceContext::new())
            .unwrap();
        assert!(!result.is_applicable());
    }

    #[test]
    fn test_rustiq_rejects_bad_operator() {
        let op = evolution_op(&[("XZ", f64::INFINITY)], EvolutionSynthesis::default());
        assert!(matches!(
            registry().run_method("pauli_evolution.rustiq", &op, &ResourceContext::new()),
            Err(HlsError::InvalidOperator(_))
        ));
    }
}
