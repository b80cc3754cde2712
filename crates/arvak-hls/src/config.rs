//! Method selection for [`HighLevelSynthesis`](crate::HighLevelSynthesis).
//!
//! Configuration can be built in code or loaded from JSON or YAML:
//!
//! ```yaml
//! use_default_on_unspecified: true
//! plugin_selection: sequential
//! methods:
//!   mcx: [n_clean_m15, noaux_v24]
//!   permutation:
//!     - name: token_swapper
//!       options: { trials: 10, seed: 42 }
//! ```
//!
//! Families without an entry use their default variant when
//! `use_default_on_unspecified` is set, and are left unsynthesized otherwise.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use arvak_ir::Family;
use serde::{Deserialize, Serialize};

use crate::error::{HlsError, HlsResult};
use crate::options::PluginOptions;
use crate::registry::{DEFAULT_VARIANT, PluginRegistry};

/// One configured method: a variant name and its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MethodSpecRepr")]
pub struct MethodSpec {
    /// Variant name within the family, e.g. `n_clean_m15`.
    pub name: String,
    /// Options passed to the variant.
    #[serde(default)]
    pub options: PluginOptions,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MethodSpecRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        options: PluginOptions,
    },
}

impl From<MethodSpecRepr> for MethodSpec {
    fn from(repr: MethodSpecRepr) -> Self {
        match repr {
            MethodSpecRepr::Name(name) => MethodSpec::new(name),
            MethodSpecRepr::Full { name, options } => MethodSpec { name, options },
        }
    }
}

impl MethodSpec {
    /// A method with default options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: PluginOptions::default(),
        }
    }

    /// A method with the given options.
    pub fn with_options(name: impl Into<String>, options: PluginOptions) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// How the engine chooses among configured methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginSelection {
    /// Use the first method that applies.
    #[default]
    Sequential,
    /// Run every method and keep the cheapest result.
    All,
}

/// High-level synthesis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HlsConfig {
    /// Fall back to `<family>.default` for families without an entry.
    #[serde(default = "default_true")]
    pub use_default_on_unspecified: bool,

    /// Selection strategy over the configured methods.
    #[serde(default)]
    pub plugin_selection: PluginSelection,

    /// Ordered method lists keyed by family name.
    #[serde(default)]
    pub methods: BTreeMap<String, Vec<MethodSpec>>,
}

fn default_true() -> bool {
    true
}

impl Default for HlsConfig {
    fn default() -> Self {
        Self {
            use_default_on_unspecified: default_true(),
            plugin_selection: PluginSelection::default(),
            methods: BTreeMap::new(),
        }
    }
}

impl HlsConfig {
    /// The default configuration: every family uses its default variant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method list of a family.
    #[must_use]
    pub fn with_methods(mut self, family: Family, methods: Vec<MethodSpec>) -> Self {
        self.methods.insert(family.as_str().to_string(), methods);
        self
    }

    /// Set the selection strategy.
    #[must_use]
    pub fn with_selection(mut self, selection: PluginSelection) -> Self {
        self.plugin_selection = selection;
        self
    }

    /// Set whether unconfigured families fall back to their default variant.
    #[must_use]
    pub fn with_default_on_unspecified(mut self, enabled: bool) -> Self {
        self.use_default_on_unspecified = enabled;
        self
    }

    /// The methods to try for a family.
    ///
    /// `None` means the family is not synthesized by any plugin.
    pub fn methods_for(&self, family: Family) -> Option<Vec<MethodSpec>> {
        match self.methods.get(family.as_str()) {
            Some(methods) => Some(methods.clone()),
            None if self.use_default_on_unspecified => Some(vec![MethodSpec::new(DEFAULT_VARIANT)]),
            None => None,
        }
    }

    /// Parse a JSON configuration.
    pub fn from_json(text: &str) -> HlsResult<Self> {
        serde_json::from_str(text).map_err(|e| HlsError::Config(e.to_string()))
    }

    /// Parse a YAML configuration.
    pub fn from_yaml(text: &str) -> HlsResult<Self> {
        serde_yaml_ng::from_str(text).map_err(|e| HlsError::Config(e.to_string()))
    }

    /// Load a configuration file, choosing the format from its extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> HlsResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&contents),
            Some("yaml" | "yml") => Self::from_yaml(&contents),
            other => Err(HlsError::Config(format!(
                "unsupported configuration format {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> HlsResult<String> {
        serde_yaml_ng::to_string(self).map_err(|e| HlsError::Config(e.to_string()))
    }

    /// Check that every family and method name resolves in `registry`.
    pub fn validate(&self, registry: &PluginRegistry) -> HlsResult<()> {
        for (family, methods) in &self.methods {
            let family = Family::from_str(family)
                .map_err(|_| HlsError::Config(format!("unknown operation family '{family}'")))?;
            for method in methods {
                let key = format!("{family}.{}", method.name);
                if !registry.contains(&key) {
                    return Err(HlsError::UnknownPlugin(key));
                }
            }
        }
        Ok(())
    }
}
