//! Arvak High-Level Synthesis
//!
//! This crate turns abstract operations (multi-controlled X, permutations,
//! adders, Pauli evolutions, annotated operations and more) into gates.
//! Each operation family has several competing synthesis algorithms with
//! different qubit and gate-count trade-offs; a plugin registry picks one
//! per request based on the ancillas the circuit can lend and the target
//! connectivity.
//!
//! # Architecture
//!
//! ```text
//! Input Circuit
//!       │
//!       ▼
//! ┌────────────────────┐
//! │ HighLevelSynthesis │ ◄── PropertySet (coupling map, basis gates)
//! └────────────────────┘      HlsConfig (method lists per family)
//!       │
//!       ├── QubitTracker: clean/dirty state of every qubit
//!       ├── PluginRegistry: "<family>.<variant>" → SynthesisPlugin
//!       │       └── "<family>.default" → DefaultPolicy chain
//!       └── annotated.default: canonicalize → synthesize base → modify
//!       │
//!       ▼
//! Output Circuit (only basis gates)
//! ```
//!
//! # Example: Synthesizing an MCX
//!
//! ```rust
//! use arvak_hls::{BasisGates, HighLevelSynthesis, PropertySet};
//! use arvak_ir::{Circuit, HighLevelOperation};
//!
//! let mut circuit = Circuit::with_size("mcx", 8, 0);
//! circuit
//!     .high_level(HighLevelOperation::mcx(5), arvak_ir::qubits(0..6))
//!     .unwrap();
//!
//! // Qubits 6 and 7 are idle and start in |0⟩, so they serve as ancillas.
//! let properties = PropertySet::new().with_basis_gates(BasisGates::minimal());
//! let synthesized = HighLevelSynthesis::default()
//!     .run_on_circuit(&circuit, &properties)
//!     .unwrap();
//! assert_eq!(synthesized.num_qubits(), 8);
//! ```
//!
//! # Running a single plugin
//!
//! ```rust
//! use arvak_hls::{PluginOptions, PluginRegistry, ResourceContext};
//! use arvak_ir::HighLevelOperation;
//!
//! let registry = PluginRegistry::standard();
//! let ctx = ResourceContext::new()
//!     .with_ancillas(0, 3)
//!     .with_options(PluginOptions::default());
//! let result = registry
//!     .run_method("mcx.n_dirty_i15", &HighLevelOperation::mcx(5), &ctx)
//!     .unwrap();
//! assert_eq!(result.circuit().map(|c| c.num_qubits()), Some(9));
//! ```
//!
//! # Configuration
//!
//! Method lists are loaded from JSON or YAML:
//!
//! ```yaml
//! plugin_selection: sequential
//! methods:
//!   permutation:
//!     - name: token_swapper
//!       options: { trials: 10, seed: 7 }
//!     - basic
//! ```

pub mod annotated;
pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod hls;
pub mod options;
pub mod pass;
pub mod plugin;
pub mod plugins;
pub mod property;
pub mod registry;
pub mod synthesis;
pub mod tracker;

pub use config::{HlsConfig, MethodSpec, PluginSelection};
pub use context::ResourceContext;
pub use error::{HlsError, HlsResult};
pub use hls::{HighLevelSynthesis, SynthesisSummary};
pub use options::PluginOptions;
pub use pass::{Pass, PassKind};
pub use plugin::{FnPlugin, PluginResult, SynthesisPlugin};
pub use property::{BasisGates, CouplingMap, PropertySet};
pub use registry::{DefaultPolicy, PluginRegistry};
pub use tracker::QubitTracker;
