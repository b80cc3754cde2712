//! Modular, half and full adder variants.
//!
//! The three families share the same algorithms; only the default policies
//! differ. Small adders favour the variants without ancillas.

use arvak_ir::{Family, HighLevelOperation};

use super::when;
use crate::context::ResourceContext;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::arithmetic::{
    AdderKind, synth_adder_qft_d00, synth_adder_ripple_c04, synth_adder_ripple_r25,
    synth_adder_ripple_v95,
};

/// Largest modular adder the default synthesizes with the QFT adder.
pub const MODULAR_ADDER_QFT_MAX: usize = 5;

/// Largest half adder the default synthesizes without ancillas.
pub const HALF_ADDER_RIPPLE_MAX: usize = 3;

/// Width at which the full-adder default tries the VBE adder first.
pub const FULL_ADDER_RIPPLE_MAX: usize = 1;

fn ripple_c04(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some((kind, n)) = AdderKind::of(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    // The full adder's carry-in doubles as the helper qubit.
    let helper = usize::from(kind != AdderKind::Full);
    when(ctx.clean_ancillas() >= helper, || synth_adder_ripple_c04(n, kind))
}

fn ripple_v95(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some((kind, n)) = AdderKind::of(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    when(ctx.clean_ancillas() >= n.saturating_sub(1), || {
        synth_adder_ripple_v95(n, kind)
    })
}

fn ripple_r25(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    match op {
        HighLevelOperation::HalfAdder { num_state_qubits } => {
            Ok(synth_adder_ripple_r25(*num_state_qubits)?.into())
        }
        _ => Ok(PluginResult::NotApplicable),
    }
}

fn qft_d00(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some((kind, n)) = AdderKind::of(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    Ok(synth_adder_qft_d00(n, kind)?.into())
}

fn modular_default(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> Vec<&'static str> {
    match AdderKind::of(op) {
        Some((_, n)) if n <= MODULAR_ADDER_QFT_MAX => vec!["qft_d00"],
        _ => vec!["ripple_c04", "qft_d00"],
    }
}

fn half_default(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> Vec<&'static str> {
    match AdderKind::of(op) {
        Some((_, n)) if n <= HALF_ADDER_RIPPLE_MAX => vec!["ripple_r25"],
        _ => vec!["ripple_c04", "ripple_r25"],
    }
}

fn full_default(op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> Vec<&'static str> {
    match AdderKind::of(op) {
        Some((_, n)) if n == FULL_ADDER_RIPPLE_MAX => vec!["ripple_v95", "ripple_c04"],
        _ => vec!["ripple_c04"],
    }
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    for family in [Family::ModularAdder, Family::HalfAdder, Family::FullAdder] {
        registry.register(FnPlugin::new(family, "ripple_c04", ripple_c04));
        registry.register(FnPlugin::new(family, "ripple_v95", ripple_v95));
        registry.register(FnPlugin::new(family, "qft_d00", qft_d00));
    }
    registry.register(FnPlugin::new(Family::HalfAdder, "ripple_r25", ripple_r25));

    registry.set_default(Family::ModularAdder, DefaultPolicy::Conditional(modular_default));
    registry.set_default(Family::HalfAdder, DefaultPolicy::Conditional(half_default));
    registry.set_default(Family::FullAdder, DefaultPolicy::Conditional(full_default));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(key: &str, op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> PluginResult {
        let mut registry = PluginRegistry::new();
        register(&mut registry);
        registry.run_method(key, op, ctx).unwrap()
    }

    fn name(result: &PluginResult) -> Option<String> {
        result.circuit().map(|c| c.name().to_string())
    }

    #[test]
    fn test_small_half_adder_uses_r25() {
        let op = HighLevelOperation::HalfAdder { num_state_qubits: 2 };
        let result = run("half_adder.default", &op, &ResourceContext::new().with_ancillas(4, 0));
        assert_eq!(result.circuit().map(|c| c.num_qubits()), Some(5));
    }

    #[test]
    fn test_large_half_adder_prefers_c04_with_helper() {
        let op = HighLevelOperation::HalfAdder { num_state_qubits: 4 };
        let with = run("half_adder.default", &op, &ResourceContext::new().with_ancillas(1, 0));
        assert_eq!(with.circuit().map(|c| c.num_qubits()), Some(10));
        assert_eq!(name(&with).as_deref(), Some("half_adder_ripple_c04"));

        let without = run("half_adder.default", &op, &ResourceContext::new());
        assert_eq!(without.circuit().map(|c| c.num_qubits()), Some(9));
    }

    #[test]
    fn test_modular_default_threshold() {
        let small = HighLevelOperation::ModularAdder { num_state_qubits: 5 };
        let result = run("modular_adder.default", &small, &ResourceContext::new().with_ancillas(1, 0));
        assert_eq!(result.circuit().map(|c| c.num_qubits()), Some(10));

        let large = HighLevelOperation::ModularAdder { num_state_qubits: 6 };
        let result = run("modular_adder.default", &large, &ResourceContext::new().with_ancillas(1, 0));
        assert_eq!(name(&result).as_deref(), Some("modular_adder_ripple_c04"));
        let result = run("modular_adder.default", &large, &ResourceContext::new());
        assert_eq!(result.circuit().map(|c| c.num_qubits()), Some(12));
    }

    #[test]
    fn test_full_adder_defaults() {
        let one = HighLevelOperation::FullAdder { num_state_qubits: 1 };
        let result = run("full_adder.default", &one, &ResourceContext::new());
        assert_eq!(name(&result).as_deref(), Some("full_adder_ripple_v95"));

        let three = HighLevelOperation::FullAdder { num_state_qubits: 3 };
        let result = run("full_adder.default", &three, &ResourceContext::new());
        assert_eq!(result.circuit().map(|c| c.num_qubits()), Some(8));
    }

    #[test]
    fn test_r25_is_half_adder_only() {
        let mut registry = PluginRegistry::new();
        register(&mut registry);
        assert!(registry.contains("half_adder.ripple_r25"));
        assert!(!registry.contains("modular_adder.ripple_r25"));
    }

    #[test]
    fn test_v95_carry_ancillas() {
        let op = HighLevelOperation::ModularAdder { num_state_qubits: 4 };
        assert!(!run("modular_adder.ripple_v95", &op, &ResourceContext::new().with_ancillas(2, 0)).is_applicable());
        let result = run("modular_adder.ripple_v95", &op, &ResourceContext::new().with_ancillas(3, 0));
        assert_eq!(result.circuit().map(|c| c.num_qubits()), Some(11));
    }
}
