//! Plugin registry keyed by `"<family>.<variant>"`.
//!
//! Every family has a `"<family>.default"` entry. It is either a
//! [`DefaultPolicy`], which yields an ordered list of sibling variants that
//! the registry tries until one applies, or a plugin registered under the
//! variant name `default`.

use std::fmt;
use std::str::FromStr;

use arvak_ir::{Family, HighLevelOperation};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::context::ResourceContext;
use crate::error::{HlsError, HlsResult};
use crate::plugin::{PluginResult, SynthesisPlugin};
use crate::plugins;

/// Name of the default variant of every family.
pub const DEFAULT_VARIANT: &str = "default";

/// How a family's default variant picks among its siblings.
#[derive(Clone, Copy)]
pub enum DefaultPolicy {
    /// A fixed priority order.
    Chain(&'static [&'static str]),
    /// A priority order that depends on the operation and the resources.
    Conditional(fn(&HighLevelOperation, &ResourceContext<'_>) -> Vec<&'static str>),
}

impl DefaultPolicy {
    /// The variants to try, in order.
    pub fn variants(&self, op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> Vec<&'static str> {
        match self {
            DefaultPolicy::Chain(chain) => chain.to_vec(),
            DefaultPolicy::Conditional(select) => select(op, ctx),
        }
    }
}

impl fmt::Debug for DefaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultPolicy::Chain(chain) => f.debug_tuple("Chain").field(chain).finish(),
            DefaultPolicy::Conditional(_) => f.write_str("Conditional(..)"),
        }
    }
}

/// Registry of synthesis plugins and default policies.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: FxHashMap<String, Box<dyn SynthesisPlugin>>,
    defaults: FxHashMap<Family, DefaultPolicy>,
}

impl PluginRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in variant and default policy.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        plugins::register_standard(&mut registry);
        registry
    }

    /// Register a plugin under `"<family>.<name>"`, returning any plugin it
    /// replaces.
    pub fn register(
        &mut self,
        plugin: impl SynthesisPlugin + 'static,
    ) -> Option<Box<dyn SynthesisPlugin>> {
        let key = format!("{}.{}", plugin.family(), plugin.name());
        self.plugins.insert(key, Box::new(plugin))
    }

    /// Install the default policy of a family.
    pub fn set_default(&mut self, family: Family, policy: DefaultPolicy) {
        self.defaults.insert(family, policy);
    }

    /// The default policy of a family, if one is installed.
    pub fn default_policy(&self, family: Family) -> Option<&DefaultPolicy> {
        self.defaults.get(&family)
    }

    /// Look up a plugin by key.
    pub fn get(&self, key: &str) -> Option<&dyn SynthesisPlugin> {
        self.plugins.get(key).map(|p| p.as_ref())
    }

    /// True if `key` names a plugin or a default policy.
    pub fn contains(&self, key: &str) -> bool {
        if self.plugins.contains_key(key) {
            return true;
        }
        match key.split_once('.') {
            Some((family, DEFAULT_VARIANT)) => Family::from_str(family)
                .is_ok_and(|family| self.defaults.contains_key(&family)),
            _ => false,
        }
    }

    /// Every resolvable key, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.plugins.keys().cloned().collect();
        for family in self.defaults.keys() {
            let key = format!("{family}.{DEFAULT_VARIANT}");
            if !self.plugins.contains_key(&key) {
                keys.push(key);
            }
        }
        keys.sort();
        keys
    }

    /// Variant names available for a family, sorted, `default` included.
    pub fn methods(&self, family: Family) -> Vec<String> {
        let prefix = format!("{family}.");
        let mut names: Vec<String> = self
            .keys()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Run the method registered under `key`.
    ///
    /// A `"<family>.default"` key backed by a policy tries the policy's
    /// variants in order and returns the first applicable result.
    pub fn run_method(
        &self,
        key: &str,
        op: &HighLevelOperation,
        ctx: &ResourceContext<'_>,
    ) -> HlsResult<PluginResult> {
        if let Some((family, DEFAULT_VARIANT)) = key.split_once('.') {
            let family =
                Family::from_str(family).map_err(|_| HlsError::UnknownPlugin(key.to_string()))?;
            if let Some(policy) = self.defaults.get(&family) {
                return self.run_chain(family, &policy.variants(op, ctx), op, ctx);
            }
        }
        let plugin = self
            .get(key)
            .ok_or_else(|| HlsError::UnknownPlugin(key.to_string()))?;
        plugin.run(op, ctx)
    }

    fn run_chain(
        &self,
        family: Family,
        variants: &[&'static str],
        op: &HighLevelOperation,
        ctx: &ResourceContext<'_>,
    ) -> HlsResult<PluginResult> {
        for variant in variants {
            let key = format!("{family}.{variant}");
            let plugin = self
                .get(&key)
                .ok_or_else(|| HlsError::UnknownPlugin(key.clone()))?;
            let result = plugin.run(op, ctx)?;
            if result.is_applicable() {
                debug!(plugin = %key, "default policy selected variant");
                return Ok(result);
            }
            debug!(plugin = %key, "variant not applicable");
        }
        Ok(PluginResult::NotApplicable)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::FnPlugin;
    use arvak_ir::{Circuit, QubitId};

    fn decline(_: &HighLevelOperation, _: &ResourceContext<'_>) -> HlsResult<PluginResult> {
        Ok(PluginResult::NotApplicable)
    }

    fn flip(op: &HighLevelOperation, _: &ResourceContext<'_>) -> HlsResult<PluginResult> {
        let mut circuit = Circuit::with_size("flip", op.num_qubits(), 0);
        circuit.x(QubitId(op.num_qubits() - 1))?;
        Ok(circuit.into())
    }

    fn toy_registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register(FnPlugin::new(Family::Mcx, "never", decline));
        registry.register(FnPlugin::new(Family::Mcx, "flip", flip));
        registry.set_default(Family::Mcx, DefaultPolicy::Chain(&["never", "flip"]));
        registry
    }

    #[test]
    fn test_default_chain_short_circuits() {
        let registry = toy_registry();
        let result = registry
            .run_method("mcx.default", &HighLevelOperation::mcx(0), &ResourceContext::new())
            .unwrap();
        assert_eq!(result.circuit().map(Circuit::len), Some(1));
    }

    #[test]
    fn test_unknown_keys_are_faults() {
        let registry = toy_registry();
        let ctx = ResourceContext::new();
        let op = HighLevelOperation::mcx(1);
        assert!(matches!(
            registry.run_method("mcx.missing", &op, &ctx),
            Err(HlsError::UnknownPlugin(key)) if key == "mcx.missing"
        ));
        assert!(matches!(
            registry.run_method("teleport.default", &op, &ctx),
            Err(HlsError::UnknownPlugin(_))
        ));
    }

    #[test]
    fn test_chain_with_unregistered_variant_fails() {
        let mut registry = toy_registry();
        registry.set_default(Family::Mcx, DefaultPolicy::Chain(&["never", "ghost"]));
        let result = registry.run_method(
            "mcx.default",
            &HighLevelOperation::mcx(2),
            &ResourceContext::new(),
        );
        assert!(matches!(result, Err(HlsError::UnknownPlugin(key)) if key == "mcx.ghost"));
    }

    #[test]
    fn test_keys_and_methods() {
        let registry = toy_registry();
        assert!(registry.contains("mcx.default"));
        assert!(registry.contains("mcx.flip"));
        assert!(!registry.contains("qft.default"));
        assert_eq!(registry.methods(Family::Mcx), vec!["default", "flip", "never"]);
    }

    #[test]
    fn test_standard_registry_has_every_family_default() {
        let registry = PluginRegistry::standard();
        for family in Family::ALL {
            let key = format!("{family}.default");
            assert!(registry.contains(&key), "missing {key}");
        }
    }
}
