//! Pauli operators and the Pauli-evolution operation.
//!
//! Two operator representations are supported:
//!
//! - [`SparsePauliOp`]: `Σ_k c_k · P_k` with each `P_k` a tensor product of
//!   I, X, Y, Z.
//! - [`SparseObservable`]: terms over the extended alphabet
//!   `X Y Z + - r l 0 1`, where the last six letters are single-qubit
//!   projectors onto the eigenstates of X, Y and Z.
//!
//! Evolution synthesis only knows how to exponentiate Pauli strings, so
//! observables are expanded with [`SparseObservable::to_sparse_pauli_op`].

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};

/// Single-qubit Pauli operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PauliOp {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl PauliOp {
    fn from_char(c: char) -> IrResult<Self> {
        match c {
            'I' => Ok(PauliOp::I),
            'X' => Ok(PauliOp::X),
            'Y' => Ok(PauliOp::Y),
            'Z' => Ok(PauliOp::Z),
            other => Err(IrError::InvalidPauli(format!("unknown Pauli letter '{other}'"))),
        }
    }
}

/// A tensor product of Pauli operators.
///
/// Stored as `(qubit, op)` pairs sorted by qubit, identities omitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PauliString {
    ops: Vec<(usize, PauliOp)>,
}

impl PauliString {
    /// Construct from `(qubit, op)` pairs; identities are dropped.
    pub fn from_ops(ops: impl IntoIterator<Item = (usize, PauliOp)>) -> Self {
        let mut v: Vec<(usize, PauliOp)> = ops
            .into_iter()
            .filter(|(_, op)| *op != PauliOp::I)
            .collect();
        v.sort_by_key(|(q, _)| *q);
        Self { ops: v }
    }

    /// Parse a dense label such as `"XIZ"`. The rightmost letter acts on qubit 0.
    pub fn from_label(label: &str) -> IrResult<Self> {
        let n = label.chars().count();
        let ops = label
            .chars()
            .enumerate()
            .map(|(i, c)| PauliOp::from_char(c).map(|op| (n - 1 - i, op)))
            .collect::<IrResult<Vec<_>>>()?;
        Ok(Self::from_ops(ops))
    }

    /// Non-identity `(qubit, op)` pairs, sorted by qubit index.
    pub fn ops(&self) -> &[(usize, PauliOp)] {
        &self.ops
    }

    /// True if there are no non-identity operators.
    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Qubits on which the string acts non-trivially.
    pub fn support(&self) -> Vec<usize> {
        self.ops.iter().map(|(q, _)| *q).collect()
    }

    /// The highest qubit index referenced, or `None` for the identity.
    pub fn max_qubit(&self) -> Option<usize> {
        self.ops.last().map(|(q, _)| *q)
    }
}

/// A single weighted Pauli term: `coeff · pauli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliTerm {
    /// Real coefficient.
    pub coeff: f64,
    /// The Pauli string.
    pub pauli: PauliString,
}

impl PauliTerm {
    /// Create a new term.
    pub fn new(coeff: f64, pauli: PauliString) -> Self {
        Self { coeff, pauli }
    }
}

/// A weighted sum of Pauli strings on a fixed number of qubits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsePauliOp {
    num_qubits: usize,
    terms: Vec<PauliTerm>,
}

impl SparsePauliOp {
    /// Create from terms, checking that every string fits in `num_qubits`.
    pub fn new(num_qubits: usize, terms: Vec<PauliTerm>) -> IrResult<Self> {
        for term in &terms {
            if let Some(q) = term.pauli.max_qubit().filter(|&q| q >= num_qubits) {
                return Err(IrError::InvalidPauli(format!(
                    "term acts on qubit {q} of a {num_qubits}-qubit operator"
                )));
            }
        }
        Ok(Self { num_qubits, terms })
    }

    /// Create from dense labels, e.g. `[("ZZ", 1.0), ("XI", 0.5)]`.
    pub fn from_labels(labels: &[(&str, f64)]) -> IrResult<Self> {
        let num_qubits = labels.first().map_or(0, |(l, _)| l.chars().count());
        let terms = labels
            .iter()
            .map(|(label, coeff)| {
                if label.chars().count() != num_qubits {
                    return Err(IrError::InvalidPauli(format!(
                        "label '{label}' does not have {num_qubits} letters"
                    )));
                }
                Ok(PauliTerm::new(*coeff, PauliString::from_label(label)?))
            })
            .collect::<IrResult<Vec<_>>>()?;
        Self::new(num_qubits, terms)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// All terms.
    pub fn terms(&self) -> &[PauliTerm] {
        &self.terms
    }

    /// Sum of absolute coefficients.
    pub fn lambda(&self) -> f64 {
        self.terms.iter().map(|t| t.coeff.abs()).sum()
    }

    /// Merge duplicate strings and drop zero terms.
    pub fn simplify(&self, atol: f64) -> Self {
        let mut merged: Vec<PauliTerm> = Vec::with_capacity(self.terms.len());
        for term in &self.terms {
            match merged.iter_mut().find(|t| t.pauli == term.pauli) {
                Some(existing) => existing.coeff += term.coeff,
                None => merged.push(term.clone()),
            }
        }
        merged.retain(|t| t.coeff.abs() > atol);
        Self {
            num_qubits: self.num_qubits,
            terms: merged,
        }
    }
}

/// One letter of the sparse-observable alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BitTerm {
    /// Pauli X.
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z.
    Z,
    /// Projector onto |+⟩.
    Plus,
    /// Projector onto |-⟩.
    Minus,
    /// Projector onto |r⟩ (+1 eigenstate of Y).
    Right,
    /// Projector onto |l⟩ (-1 eigenstate of Y).
    Left,
    /// Projector onto |0⟩.
    Zero,
    /// Projector onto |1⟩.
    One,
}

impl BitTerm {
    /// Parse one letter of the alphabet `X Y Z + - r l 0 1`.
    pub fn from_char(c: char) -> IrResult<Self> {
        Ok(match c {
            'X' => BitTerm::X,
            'Y' => BitTerm::Y,
            'Z' => BitTerm::Z,
            '+' => BitTerm::Plus,
            '-' => BitTerm::Minus,
            'r' => BitTerm::Right,
            'l' => BitTerm::Left,
            '0' => BitTerm::Zero,
            '1' => BitTerm::One,
            other => {
                return Err(IrError::InvalidPauli(format!(
                    "unknown observable letter '{other}'"
                )));
            }
        })
    }

    /// Expansion as `[(coeff, pauli)]`: projectors become `(I ± P) / 2`.
    fn expand(self) -> Vec<(f64, PauliOp)> {
        match self {
            BitTerm::X => vec![(1.0, PauliOp::X)],
            BitTerm::Y => vec![(1.0, PauliOp::Y)],
            BitTerm::Z => vec![(1.0, PauliOp::Z)],
            BitTerm::Plus => vec![(0.5, PauliOp::I), (0.5, PauliOp::X)],
            BitTerm::Minus => vec![(0.5, PauliOp::I), (-0.5, PauliOp::X)],
            BitTerm::Right => vec![(0.5, PauliOp::I), (0.5, PauliOp::Y)],
            BitTerm::Left => vec![(0.5, PauliOp::I), (-0.5, PauliOp::Y)],
            BitTerm::Zero => vec![(0.5, PauliOp::I), (0.5, PauliOp::Z)],
            BitTerm::One => vec![(0.5, PauliOp::I), (-0.5, PauliOp::Z)],
        }
    }
}

/// A single observable term: `coeff · ⊗_q bit_q`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservableTerm {
    /// Real coefficient.
    pub coeff: f64,
    /// Non-identity letters, sorted by qubit.
    pub bits: Vec<(usize, BitTerm)>,
}

/// A sparse observable over the extended projector alphabet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseObservable {
    num_qubits: usize,
    terms: Vec<ObservableTerm>,
}

impl SparseObservable {
    /// Create from terms, checking indices and duplicate qubits.
    pub fn new(num_qubits: usize, mut terms: Vec<ObservableTerm>) -> IrResult<Self> {
        for term in &mut terms {
            term.bits.sort_by_key(|(q, _)| *q);
            if term.bits.windows(2).any(|w| w[0].0 == w[1].0) {
                return Err(IrError::InvalidPauli("duplicate qubit in observable term".into()));
            }
            if let Some(&(q, _)) = term.bits.last().filter(|(q, _)| *q >= num_qubits) {
                return Err(IrError::InvalidPauli(format!(
                    "term acts on qubit {q} of a {num_qubits}-qubit observable"
                )));
            }
        }
        Ok(Self { num_qubits, terms })
    }

    /// Create from dense labels such as `("0+Z", 1.0)`; `I` marks identity.
    pub fn from_labels(labels: &[(&str, f64)]) -> IrResult<Self> {
        let num_qubits = labels.first().map_or(0, |(l, _)| l.chars().count());
        let mut terms = Vec::with_capacity(labels.len());
        for (label, coeff) in labels {
            let n = label.chars().count();
            if n != num_qubits {
                return Err(IrError::InvalidPauli(format!(
                    "label '{label}' does not have {num_qubits} letters"
                )));
            }
            let bits = label
                .chars()
                .enumerate()
                .filter(|(_, c)| *c != 'I')
                .map(|(i, c)| BitTerm::from_char(c).map(|b| (n - 1 - i, b)))
                .collect::<IrResult<Vec<_>>>()?;
            terms.push(ObservableTerm {
                coeff: *coeff,
                bits,
            });
        }
        Self::new(num_qubits, terms)
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// All terms.
    pub fn terms(&self) -> &[ObservableTerm] {
        &self.terms
    }

    /// Expand every projector into Pauli strings.
    ///
    /// A term with `k` projector letters expands into `2^k` Pauli terms.
    pub fn to_sparse_pauli_op(&self) -> SparsePauliOp {
        let mut out = Vec::new();
        for term in &self.terms {
            let mut partial: Vec<(f64, Vec<(usize, PauliOp)>)> = vec![(term.coeff, vec![])];
            for &(q, bit) in &term.bits {
                let mut next = Vec::with_capacity(partial.len() * 2);
                for (coeff, ops) in &partial {
                    for (factor, op) in bit.expand() {
                        let mut ops = ops.clone();
                        ops.push((q, op));
                        next.push((coeff * factor, ops));
                    }
                }
                partial = next;
            }
            out.extend(
                partial
                    .into_iter()
                    .map(|(c, ops)| PauliTerm::new(c, PauliString::from_ops(ops))),
            );
        }
        SparsePauliOp {
            num_qubits: self.num_qubits,
            terms: out,
        }
    }
}

/// Either operator representation accepted by [`PauliEvolution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PauliOperator {
    /// A sum of Pauli strings.
    Pauli(SparsePauliOp),
    /// A sparse observable with projector letters.
    Observable(SparseObservable),
}

impl PauliOperator {
    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        match self {
            PauliOperator::Pauli(op) => op.num_qubits(),
            PauliOperator::Observable(obs) => obs.num_qubits(),
        }
    }

    /// The operator as Pauli strings.
    pub fn to_sparse_pauli_op(&self) -> SparsePauliOp {
        match self {
            PauliOperator::Pauli(op) => op.clone(),
            PauliOperator::Observable(obs) => obs.to_sparse_pauli_op(),
        }
    }
}

impl From<SparsePauliOp> for PauliOperator {
    fn from(op: SparsePauliOp) -> Self {
        PauliOperator::Pauli(op)
    }
}

impl From<SparseObservable> for PauliOperator {
    fn from(obs: SparseObservable) -> Self {
        PauliOperator::Observable(obs)
    }
}

/// Strategy embedded in a [`PauliEvolution`] for building its circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvolutionSynthesis {
    /// Lie-Trotter (`order = 1`) or Suzuki-Trotter (`order = 2`) product formula.
    ProductFormula {
        /// Formula order.
        order: usize,
        /// Number of repetitions.
        reps: usize,
        /// Keep the terms in the order given instead of grouping them.
        preserve_order: bool,
    },
    /// Randomized QDrift sampling.
    QDrift {
        /// Number of samples.
        reps: usize,
        /// Sampling seed.
        seed: u64,
    },
}

impl Default for EvolutionSynthesis {
    fn default() -> Self {
        EvolutionSynthesis::ProductFormula {
            order: 1,
            reps: 1,
            preserve_order: true,
        }
    }
}

impl EvolutionSynthesis {
    /// Lie-Trotter formula with `reps` repetitions.
    pub fn lie_trotter(reps: usize) -> Self {
        EvolutionSynthesis::ProductFormula {
            order: 1,
            reps,
            preserve_order: true,
        }
    }

    /// Second-order Suzuki-Trotter formula with `reps` repetitions.
    pub fn suzuki_trotter(reps: usize) -> Self {
        EvolutionSynthesis::ProductFormula {
            order: 2,
            reps,
            preserve_order: true,
        }
    }

    /// True for product formulas.
    pub fn is_product_formula(&self) -> bool {
        matches!(self, EvolutionSynthesis::ProductFormula { .. })
    }

    /// A copy with the order-preservation flag replaced (product formulas only).
    #[must_use]
    pub fn with_preserve_order(&self, preserve: bool) -> Self {
        match self {
            EvolutionSynthesis::ProductFormula { order, reps, .. } => {
                EvolutionSynthesis::ProductFormula {
                    order: *order,
                    reps: *reps,
                    preserve_order: preserve,
                }
            }
            other => other.clone(),
        }
    }
}

/// The operation `exp(-i · t · Σ_j H_j)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauliEvolution {
    operators: Vec<PauliOperator>,
    time: f64,
    synthesis: EvolutionSynthesis,
}

impl PauliEvolution {
    /// Create an evolution; all operators must act on the same number of qubits.
    pub fn new(
        operators: Vec<PauliOperator>,
        time: f64,
        synthesis: EvolutionSynthesis,
    ) -> IrResult<Self> {
        let Some(first) = operators.first() else {
            return Err(IrError::InvalidPauli("evolution needs at least one operator".into()));
        };
        let n = first.num_qubits();
        if operators.iter().any(|op| op.num_qubits() != n) {
            return Err(IrError::InvalidPauli(
                "evolution operators act on different qubit counts".into(),
            ));
        }
        Ok(Self {
            operators,
            time,
            synthesis,
        })
    }

    /// Operators summed in the exponent.
    pub fn operators(&self) -> &[PauliOperator] {
        &self.operators
    }

    /// Evolution time.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Embedded synthesis strategy.
    pub fn synthesis(&self) -> &EvolutionSynthesis {
        &self.synthesis
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.operators.first().map_or(0, PauliOperator::num_qubits)
    }

    /// The evolution for time `-t`.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            operators: self.operators.clone(),
            time: -self.time,
            synthesis: self.synthesis.clone(),
        }
    }

    /// All operators flattened into Pauli terms, in order.
    pub fn pauli_terms(&self) -> Vec<PauliTerm> {
        self.operators
            .iter()
            .flat_map(|op| op.to_sparse_pauli_op().terms)
            .collect()
    }
}
