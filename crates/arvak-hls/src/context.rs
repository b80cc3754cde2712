//! The per-call resource context handed to synthesis plugins.

use std::cell::RefCell;

use arvak_ir::QubitId;

use crate::error::{HlsError, HlsResult};
use crate::hls::SynthesisHandle;
use crate::options::PluginOptions;
use crate::property::CouplingMap;
use crate::tracker::QubitTracker;

/// Resources available to one plugin invocation.
///
/// Plugins read the public fields. The engine-internal fields are only filled
/// in when the context comes from [`HighLevelSynthesis`](crate::HighLevelSynthesis);
/// a plugin that needs them (the annotated resolver) fails with
/// [`HlsError::MissingContext`] when it is called standalone.
#[derive(Debug, Clone, Default)]
pub struct ResourceContext<'a> {
    /// Connectivity of the target device, if restricted.
    pub coupling_map: Option<&'a CouplingMap>,
    /// Physical qubits the operation is placed on.
    pub qubits: Option<Vec<usize>>,
    /// Clean ancillas the tracker can lend.
    pub num_clean_ancillas: usize,
    /// Dirty ancillas the tracker can lend.
    pub num_dirty_ancillas: usize,
    /// Options of the selected method.
    pub options: PluginOptions,

    pub(crate) tracker: Option<&'a RefCell<QubitTracker>>,
    pub(crate) input_qubits: Option<Vec<QubitId>>,
    pub(crate) engine: Option<SynthesisHandle<'a>>,
}

impl<'a> ResourceContext<'a> {
    /// A context with no coupling constraint and no ancillas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ancilla counts.
    #[must_use]
    pub fn with_ancillas(mut self, clean: usize, dirty: usize) -> Self {
        self.num_clean_ancillas = clean;
        self.num_dirty_ancillas = dirty;
        self
    }

    /// Set the method options.
    #[must_use]
    pub fn with_options(mut self, options: PluginOptions) -> Self {
        self.options = options;
        self
    }

    /// Restrict the operation to `qubits` of `coupling_map`.
    #[must_use]
    pub fn with_coupling(mut self, coupling_map: &'a CouplingMap, qubits: Vec<usize>) -> Self {
        self.coupling_map = Some(coupling_map);
        self.qubits = Some(qubits);
        self
    }

    /// Clean ancillas, with an explicit option taking precedence.
    pub fn clean_ancillas(&self) -> usize {
        self.options
            .num_clean_ancillas
            .unwrap_or(self.num_clean_ancillas)
    }

    /// Dirty ancillas, with an explicit option taking precedence.
    pub fn dirty_ancillas(&self) -> usize {
        self.options
            .num_dirty_ancillas
            .unwrap_or(self.num_dirty_ancillas)
    }

    pub(crate) fn tracker(&self) -> HlsResult<&'a RefCell<QubitTracker>> {
        self.tracker.ok_or(HlsError::MissingContext("tracker"))
    }

    pub(crate) fn input_qubits(&self) -> HlsResult<&[QubitId]> {
        self.input_qubits
            .as_deref()
            .ok_or(HlsError::MissingContext("input_qubits"))
    }

    pub(crate) fn engine(&self) -> HlsResult<SynthesisHandle<'a>> {
        self.engine.ok_or(HlsError::MissingContext("engine"))
    }
}
