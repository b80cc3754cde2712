//! The contract every synthesis algorithm implements.

use arvak_ir::{Circuit, Family, HighLevelOperation, QubitId};

use crate::context::ResourceContext;
use crate::error::HlsResult;

/// Outcome of one plugin invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginResult {
    /// A circuit over the operation's qubits, followed by ancillas the
    /// caller must borrow.
    Synthesized(Circuit),
    /// A circuit whose qubits were already bound to global qubits by the
    /// plugin; `qubits[i]` is the global qubit of circuit qubit `i`.
    Bound {
        /// The synthesized circuit.
        circuit: Circuit,
        /// Global qubit of each circuit qubit.
        qubits: Vec<QubitId>,
    },
    /// The plugin does not handle this operation with these resources.
    NotApplicable,
}

impl PluginResult {
    /// True unless the plugin declined.
    pub fn is_applicable(&self) -> bool {
        !matches!(self, PluginResult::NotApplicable)
    }

    /// The synthesized circuit, if any.
    pub fn circuit(&self) -> Option<&Circuit> {
        match self {
            PluginResult::Synthesized(circuit) | PluginResult::Bound { circuit, .. } => {
                Some(circuit)
            }
            PluginResult::NotApplicable => None,
        }
    }

    /// Consume the result, returning the circuit if any.
    pub fn into_circuit(self) -> Option<Circuit> {
        match self {
            PluginResult::Synthesized(circuit) | PluginResult::Bound { circuit, .. } => {
                Some(circuit)
            }
            PluginResult::NotApplicable => None,
        }
    }
}

impl From<Option<Circuit>> for PluginResult {
    fn from(circuit: Option<Circuit>) -> Self {
        circuit.map_or(PluginResult::NotApplicable, PluginResult::Synthesized)
    }
}

impl From<Circuit> for PluginResult {
    fn from(circuit: Circuit) -> Self {
        PluginResult::Synthesized(circuit)
    }
}

/// A synthesis algorithm for one operation family.
///
/// `run` must return [`PluginResult::NotApplicable`] for operations of
/// another family and when the resources in `ctx` are insufficient. `Err`
/// is reserved for configuration faults.
pub trait SynthesisPlugin: Send + Sync {
    /// The family this plugin synthesizes.
    fn family(&self) -> Family;

    /// Variant name, unique within the family.
    fn name(&self) -> &str;

    /// Synthesize `op` with the resources in `ctx`.
    fn run(&self, op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult>;
}

/// Signature of a plugin implemented as a plain function.
pub type PluginFn = fn(&HighLevelOperation, &ResourceContext<'_>) -> HlsResult<PluginResult>;

/// A plugin backed by a function pointer.
#[derive(Debug, Clone, Copy)]
pub struct FnPlugin {
    family: Family,
    name: &'static str,
    run: PluginFn,
}

impl FnPlugin {
    /// Wrap `run` as the plugin `<family>.<name>`.
    pub const fn new(family: Family, name: &'static str, run: PluginFn) -> Self {
        Self { family, name, run }
    }
}

impl SynthesisPlugin for FnPlugin {
    fn family(&self) -> Family {
        self.family
    }

    fn name(&self) -> &str {
        self.name
    }

    fn run(&self, op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
        if op.family() != self.family {
            return Ok(PluginResult::NotApplicable);
        }
        (self.run)(op, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always_x(_op: &HighLevelOperation, _ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
        let mut circuit = Circuit::with_size("x", 1, 0);
        circuit.x(QubitId(0))?;
        Ok(circuit.into())
    }

    #[test]
    fn test_fn_plugin_declines_other_families() {
        let plugin = FnPlugin::new(Family::Mcx, "x", always_x);
        let ctx = ResourceContext::new();

        let result = plugin.run(&HighLevelOperation::mcx(0), &ctx).unwrap();
        assert!(result.is_applicable());
        assert_eq!(result.circuit().map(Circuit::len), Some(1));

        let result = plugin.run(&HighLevelOperation::qft(1), &ctx).unwrap();
        assert_eq!(result, PluginResult::NotApplicable);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(PluginResult::from(None), PluginResult::NotApplicable);
        let circuit = Circuit::with_size("c", 2, 0);
        assert_eq!(
            PluginResult::from(Some(circuit.clone())).into_circuit(),
            Some(circuit)
        );
    }
}
