//! Typed per-call plugin options.
//!
//! Every field is optional; `None` means "use the plugin's default". Option
//! groups are flattened, so a configuration entry reads as one flat map:
//!
//! ```
//! use arvak_hls::PluginOptions;
//!
//! let options: PluginOptions = serde_json::from_str(
//!     r#"{ "seed": 7, "trials": 3, "use_inverted": true, "colour": "blue" }"#,
//! )
//! .unwrap();
//! assert_eq!(options.seed, Some(7));
//! assert_eq!(options.linear.use_inverted, Some(true));
//! ```
//!
//! Unknown keys (`colour` above) are ignored.

use serde::{Deserialize, Serialize};

/// Options for linear-function synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearOptions {
    /// Column block size of the Patel-Markov-Hayes elimination.
    pub section_size: Option<usize>,
    /// Synthesize the inverse matrix and invert the circuit.
    pub use_inverted: Option<bool>,
    /// Synthesize the transposed matrix and transpose the circuit.
    pub use_transposed: Option<bool>,
}

/// Options for QFT synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QftOptions {
    /// Leave the output qubits in reversed order (skip the final swaps).
    pub reverse_qubits: Option<bool>,
    /// Override the operation's approximation degree.
    pub approximation_degree: Option<usize>,
    /// Insert a barrier after every qubit's rotations.
    pub insert_barriers: Option<bool>,
    /// Build the inverse transform.
    pub inverse: Option<bool>,
    /// Name of the produced circuit.
    pub name: Option<String>,
}

/// Options for MCX synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McxOptions {
    /// Allow a relative phase between the action and reset parts.
    pub relative_phase: Option<bool>,
    /// Emit only the action part.
    #[serde(alias = "actions_only")]
    pub action_only: Option<bool>,
}

/// Options for MCMT synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McmtOptions {
    /// Control state, bit `i` for control `i`; all ones when unset.
    pub ctrl_state: Option<u64>,
}

/// Options for Pauli-evolution synthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionOptions {
    /// Override the product formula's order-preservation flag.
    pub preserve_order: Option<bool>,
    /// Reduce the CX count of the Pauli network.
    pub optimize_count: Option<bool>,
    /// Allow the result to differ by a final Clifford.
    pub upto_clifford: Option<bool>,
    /// Allow the result to differ by a global phase.
    pub upto_phase: Option<bool>,
    /// Method used to resynthesize the final Clifford.
    pub resynth_clifford_method: Option<u8>,
}

/// Options handed to a plugin for one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginOptions {
    /// Override the number of clean ancillas derived from the tracker.
    pub num_clean_ancillas: Option<usize>,
    /// Override the number of dirty ancillas derived from the tracker.
    pub num_dirty_ancillas: Option<usize>,
    /// Seed for randomized algorithms.
    pub seed: Option<u64>,
    /// Number of randomized trials.
    pub trials: Option<usize>,
    /// Node count from which randomized trials run in parallel.
    pub parallel_threshold: Option<usize>,
    /// Linear-function options.
    #[serde(flatten)]
    pub linear: LinearOptions,
    /// QFT options.
    #[serde(flatten)]
    pub qft: QftOptions,
    /// MCX options.
    #[serde(flatten)]
    pub mcx: McxOptions,
    /// MCMT options.
    #[serde(flatten)]
    pub mcmt: McmtOptions,
    /// Pauli-evolution options.
    #[serde(flatten)]
    pub evolution: EvolutionOptions,
}

impl PluginOptions {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the trial count.
    #[must_use]
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);
        self
    }

    /// Override both ancilla counts.
    #[must_use]
    pub fn with_ancillas(mut self, clean: usize, dirty: usize) -> Self {
        self.num_clean_ancillas = Some(clean);
        self.num_dirty_ancillas = Some(dirty);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flattened_groups_deserialize() {
        let options: PluginOptions = serde_json::from_str(
            r#"{
                "num_clean_ancillas": 2,
                "section_size": 3,
                "reverse_qubits": true,
                "actions_only": true,
                "ctrl_state": 5,
                "preserve_order": false
            }"#,
        )
        .unwrap();

        assert_eq!(options.num_clean_ancillas, Some(2));
        assert_eq!(options.linear.section_size, Some(3));
        assert_eq!(options.qft.reverse_qubits, Some(true));
        assert_eq!(options.mcx.action_only, Some(true));
        assert_eq!(options.mcmt.ctrl_state, Some(5));
        assert_eq!(options.evolution.preserve_order, Some(false));
        assert_eq!(options.seed, None);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let options: PluginOptions =
            serde_json::from_str(r#"{ "trials": 4, "not_an_option": [1, 2] }"#).unwrap();
        assert_eq!(options, PluginOptions::new().with_trials(4));
    }

    #[test]
    fn test_empty_map_is_default() {
        let options: PluginOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, PluginOptions::default());
    }
}
