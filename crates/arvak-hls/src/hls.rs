//! The high-level synthesis pass.
//!
//! [`HighLevelSynthesis`] walks a circuit, keeps a [`QubitTracker`] of which
//! qubits are known to be |0⟩, and replaces every instruction the target
//! cannot execute: high-level operations through the configured plugins,
//! standard gates outside the basis through their definitions. Every
//! synthesized fragment is synthesized again until nothing is left to
//! replace.
//!
//! Internally all fragments are kept over the global qubit space, so a
//! fragment produced deep in the recursion is appended to its parent
//! without any remapping.

use std::cell::RefCell;
use std::fmt;

use arvak_ir::{
    Circuit, Family, HighLevelOperation, Instruction, InstructionKind, Operation, QubitId,
    StandardGate,
};
use tracing::{debug, info, instrument};

use crate::config::{HlsConfig, PluginSelection};
use crate::context::ResourceContext;
use crate::error::{HlsError, HlsResult};
use crate::pass::{Pass, PassKind};
use crate::plugin::PluginResult;
use crate::property::{BasisGates, CouplingMap, PropertySet};
use crate::registry::PluginRegistry;
use crate::tracker::QubitTracker;

/// Families a controlled wrapper handles without synthesizing them first.
const CONTROLLABLE_FAMILIES: [Family; 3] = [Family::Mcx, Family::Qft, Family::Annotated];

/// What a [`Pass::run`] of [`HighLevelSynthesis`] did, stored in the
/// [`PropertySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisSummary {
    /// High-level instructions in the input circuit.
    pub high_level_ops: usize,
    /// Instructions before synthesis.
    pub input_len: usize,
    /// Instructions after synthesis.
    pub output_len: usize,
}

/// The synthesis pass.
#[derive(Debug)]
pub struct HighLevelSynthesis {
    registry: PluginRegistry,
    config: HlsConfig,
    qubits_initially_zero: bool,
}

impl Default for HighLevelSynthesis {
    fn default() -> Self {
        Self::new(HlsConfig::default())
    }
}

/// The target a synthesis run works towards.
#[derive(Debug, Clone, Copy, Default)]
struct Target<'a> {
    coupling_map: Option<&'a CouplingMap>,
    basis_gates: Option<&'a BasisGates>,
}

/// Re-entry point into the engine, handed to plugins through the context.
#[derive(Clone, Copy)]
pub(crate) struct SynthesisHandle<'a> {
    engine: &'a HighLevelSynthesis,
    target: Target<'a>,
}

impl fmt::Debug for SynthesisHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisHandle")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl SynthesisHandle<'_> {
    /// Synthesize the base of an annotated operation on `qubits`.
    ///
    /// Gates and the families in [`CONTROLLABLE_FAMILIES`] are left in place
    /// so the modifiers can act on them directly. Returns a circuit over
    /// `qubits` followed by any ancillas it borrowed, and the global qubits
    /// it acts on in that order.
    pub(crate) fn synthesize_base(
        &self,
        op: &Operation,
        qubits: &[QubitId],
        tracker: &RefCell<QubitTracker>,
    ) -> HlsResult<(Circuit, Vec<QubitId>)> {
        let global = self
            .engine
            .synthesize_operation(op, qubits, tracker, true, self.target)?;
        localize(&global, qubits)
    }
}

impl HighLevelSynthesis {
    /// A pass with the built-in plugins and the given configuration.
    pub fn new(config: HlsConfig) -> Self {
        Self {
            registry: PluginRegistry::standard(),
            config,
            qubits_initially_zero: true,
        }
    }

    /// Replace the plugin registry.
    #[must_use]
    pub fn with_registry(mut self, registry: PluginRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Whether the input qubits start in |0⟩ and can be lent as clean
    /// ancillas before they are first used.
    #[must_use]
    pub fn with_qubits_initially_zero(mut self, initially_zero: bool) -> Self {
        self.qubits_initially_zero = initially_zero;
        self
    }

    /// The plugin registry.
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// The configuration.
    pub fn config(&self) -> &HlsConfig {
        &self.config
    }

    /// Synthesize every unsupported instruction of `circuit`.
    #[instrument(skip(self, circuit, properties), fields(name = circuit.name()))]
    pub fn run_on_circuit(
        &self,
        circuit: &Circuit,
        properties: &PropertySet,
    ) -> HlsResult<Circuit> {
        self.config.validate(&self.registry)?;
        info!(
            "Running high-level synthesis on circuit with {} qubits and {} instructions",
            circuit.num_qubits(),
            circuit.len()
        );

        let target = Target {
            coupling_map: properties.coupling_map.as_ref(),
            basis_gates: properties.basis_gates.as_ref(),
        };
        let tracker = RefCell::new(QubitTracker::new(
            circuit.num_qubits(),
            self.qubits_initially_zero,
        ));
        let qubits: Vec<QubitId> = (0..circuit.num_qubits()).map(QubitId).collect();
        let mut output = self.synthesize_circuit(circuit, &qubits, &tracker, false, target)?;
        output.set_name(circuit.name());

        info!(
            "High-level synthesis completed, depth: {}, ops: {}",
            output.depth(),
            output.len()
        );
        Ok(output)
    }

    /// Synthesize `circuit`, whose local qubit `i` is the global qubit
    /// `qubits[i]`, into a circuit over all tracked qubits.
    fn synthesize_circuit(
        &self,
        circuit: &Circuit,
        qubits: &[QubitId],
        tracker: &RefCell<QubitTracker>,
        controllable: bool,
        target: Target<'_>,
    ) -> HlsResult<Circuit> {
        let width = tracker.borrow().num_qubits();
        let mut output = Circuit::with_size(circuit.name(), width, circuit.num_clbits());
        output.set_global_phase(circuit.global_phase().clone());

        for inst in circuit.instructions() {
            let inst = relabel(inst, qubits);
            match &inst.kind {
                InstructionKind::Barrier | InstructionKind::Delay { .. } => {}
                InstructionKind::Reset => tracker.borrow_mut().set_clean(&inst.qubits),
                InstructionKind::Measure => tracker.borrow_mut().set_dirty(&inst.qubits),
                _ if self.is_supported(&inst, controllable, target) => {
                    tracker.borrow_mut().set_dirty(&inst.qubits);
                }
                _ => {
                    let Some(op) = inst.as_operation() else {
                        return Err(HlsError::UnableToSynthesize(inst.name().to_string()));
                    };
                    let synthesized =
                        self.synthesize_operation(&op, &inst.qubits, tracker, controllable, target)?;
                    extend(&mut output, &synthesized)?;
                    continue;
                }
            }
            output.apply(inst)?;
        }
        Ok(output)
    }

    fn is_supported(&self, inst: &Instruction, controllable: bool, target: Target<'_>) -> bool {
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                controllable || target.basis_gates.is_none_or(|basis| basis.contains(gate.name()))
            }
            InstructionKind::HighLevel(op) => {
                (controllable && CONTROLLABLE_FAMILIES.contains(&op.family()))
                    || target.basis_gates.is_some_and(|basis| basis.contains(op.name()))
                    || self.config.methods_for(op.family()).is_none()
            }
            _ => true,
        }
    }

    /// Synthesize one operation acting on the global `qubits`.
    ///
    /// This is also the recursion point of the annotated resolver.
    fn synthesize_operation(
        &self,
        op: &Operation,
        qubits: &[QubitId],
        tracker: &RefCell<QubitTracker>,
        controllable: bool,
        target: Target<'_>,
    ) -> HlsResult<Circuit> {
        match op {
            Operation::Gate(gate) => self.synthesize_gate(gate, qubits, tracker, controllable, target),
            Operation::HighLevel(op) => {
                self.synthesize_high_level(op, qubits, tracker, controllable, target)
            }
        }
    }

    fn synthesize_gate(
        &self,
        gate: &StandardGate,
        qubits: &[QubitId],
        tracker: &RefCell<QubitTracker>,
        controllable: bool,
        target: Target<'_>,
    ) -> HlsResult<Circuit> {
        if controllable {
            let mut circuit = Circuit::with_size(gate.name(), tracker.borrow().num_qubits(), 0);
            circuit.apply(Instruction::gate(gate.clone(), qubits.iter().copied()))?;
            tracker.borrow_mut().set_dirty(qubits);
            return Ok(circuit);
        }
        let Some(definition) = gate.definition() else {
            return Err(HlsError::UnableToSynthesize(gate.name().to_string()));
        };
        debug!(gate = gate.name(), "unrolling gate through its definition");
        self.synthesize_circuit(&definition, qubits, tracker, controllable, target)
    }

    fn synthesize_high_level(
        &self,
        op: &HighLevelOperation,
        qubits: &[QubitId],
        tracker: &RefCell<QubitTracker>,
        controllable: bool,
        target: Target<'_>,
    ) -> HlsResult<Circuit> {
        let Some((result, method)) = self.run_methods(op, qubits, tracker, target)? else {
            return Err(HlsError::UnableToSynthesize(op.name().to_string()));
        };

        let (fragment, fragment_qubits) = match result {
            PluginResult::Bound { circuit, qubits } => (circuit, qubits),
            PluginResult::Synthesized(circuit) => {
                let extra = circuit.num_qubits().saturating_sub(qubits.len());
                let ancillas = tracker.borrow().borrow(extra, qubits);
                if ancillas.len() < extra {
                    return Err(HlsError::InsufficientAncillas {
                        required: extra,
                        available: ancillas.len(),
                    });
                }
                let mut all = qubits.to_vec();
                all.extend(ancillas);
                (circuit, all)
            }
            PluginResult::NotApplicable => {
                return Err(HlsError::UnableToSynthesize(op.name().to_string()));
            }
        };
        let ancillas: Vec<QubitId> = fragment_qubits
            .iter()
            .filter(|q| !qubits.contains(q))
            .copied()
            .collect();
        debug!(
            op = op.name(),
            method = %method,
            ancillas = ancillas.len(),
            instructions = fragment.len(),
            "synthesized high-level operation"
        );

        let snapshot = tracker.borrow().clone();
        let synthesized =
            self.synthesize_circuit(&fragment, &fragment_qubits, tracker, controllable, target)?;
        let mut tracker = tracker.borrow_mut();
        tracker.replace_state(&snapshot, &ancillas);
        tracker.set_dirty(qubits);
        Ok(synthesized)
    }

    /// Run the configured methods of `op`'s family and return the chosen
    /// result with its method name.
    fn run_methods(
        &self,
        op: &HighLevelOperation,
        qubits: &[QubitId],
        tracker: &RefCell<QubitTracker>,
        target: Target<'_>,
    ) -> HlsResult<Option<(PluginResult, String)>> {
        let family = op.family();
        let methods = self.config.methods_for(family).unwrap_or_default();
        let (num_clean, num_dirty) = {
            let tracker = tracker.borrow();
            (tracker.num_clean(qubits), tracker.num_dirty(qubits))
        };
        let handle = SynthesisHandle {
            engine: self,
            target,
        };

        let mut best: Option<(PluginResult, String)> = None;
        for method in methods {
            let mut ctx = ResourceContext::new()
                .with_ancillas(num_clean, num_dirty)
                .with_options(method.options.clone());
            if let Some(coupling_map) = target.coupling_map {
                ctx = ctx.with_coupling(coupling_map, qubits.iter().map(|q| q.index()).collect());
            }
            ctx.tracker = Some(tracker);
            ctx.input_qubits = Some(qubits.to_vec());
            ctx.engine = Some(handle);

            let key = format!("{family}.{}", method.name);
            let result = self.registry.run_method(&key, op, &ctx)?;
            if !result.is_applicable() {
                debug!(plugin = %key, "method not applicable");
                continue;
            }
            match self.config.plugin_selection {
                PluginSelection::Sequential => return Ok(Some((result, key))),
                PluginSelection::All => {
                    if best.as_ref().is_none_or(|(current, _)| cost(&result) < cost(current)) {
                        best = Some((result, key));
                    }
                }
            }
        }
        Ok(best)
    }
}

impl Pass for HighLevelSynthesis {
    fn name(&self) -> &str {
        "HighLevelSynthesis"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> HlsResult<()> {
        let high_level_ops = circuit
            .instructions()
            .iter()
            .filter(|inst| matches!(inst.kind, InstructionKind::HighLevel(_)))
            .count();
        let input_len = circuit.len();
        *circuit = self.run_on_circuit(circuit, properties)?;
        properties.insert(SynthesisSummary {
            high_level_ops,
            input_len,
            output_len: circuit.len(),
        });
        Ok(())
    }
}

/// Ranking used when every method runs: fewer multi-qubit gates, then fewer
/// instructions.
fn cost(result: &PluginResult) -> (usize, usize) {
    result
        .circuit()
        .map_or((usize::MAX, usize::MAX), |c| (c.num_nonlocal_gates(), c.len()))
}

fn relabel(inst: &Instruction, qubits: &[QubitId]) -> Instruction {
    let mut inst = inst.clone();
    for q in &mut inst.qubits {
        if let Some(&global) = qubits.get(q.index()) {
            *q = global;
        }
    }
    inst
}

/// Append `fragment`, a circuit over the same global qubits, to `output`.
fn extend(output: &mut Circuit, fragment: &Circuit) -> HlsResult<()> {
    output.add_global_phase(fragment.global_phase());
    for inst in fragment.instructions() {
        output.apply(inst.clone())?;
    }
    Ok(())
}

/// Restrict a circuit over the global qubits to `qubits` followed by every
/// other qubit it touches.
fn localize(circuit: &Circuit, qubits: &[QubitId]) -> HlsResult<(Circuit, Vec<QubitId>)> {
    let mut order = qubits.to_vec();
    let mut touched: Vec<QubitId> = circuit
        .instructions()
        .iter()
        .flat_map(|inst| inst.qubits.iter().copied())
        .filter(|q| !qubits.contains(q))
        .collect();
    touched.sort_unstable();
    touched.dedup();
    order.extend(touched);

    let mut local = Circuit::with_size(circuit.name(), order.len(), circuit.num_clbits());
    local.set_global_phase(circuit.global_phase().clone());
    for inst in circuit.instructions() {
        let mut inst = inst.clone();
        for q in &mut inst.qubits {
            if let Some(position) = order.iter().position(|g| g == q) {
                *q = QubitId(position);
            }
        }
        local.apply(inst)?;
    }
    Ok((local, order))
}
