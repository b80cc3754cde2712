//! High-level operations, gate modifiers and annotated operations.
//!
//! A [`HighLevelOperation`] is an abstract description of a unitary (a
//! permutation, a multi-controlled X, an adder, ...) that a synthesis pass
//! later replaces by gates. Its [`Family`] selects the plugins that may
//! synthesize it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clifford::Clifford;
use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::linear::LinearFunction;
use crate::pauli::PauliEvolution;

/// The operation families known to the synthesis engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Clifford tableau.
    Clifford,
    /// Invertible GF(2) linear map.
    LinearFunction,
    /// Qubit permutation.
    Permutation,
    /// Quantum Fourier transform.
    Qft,
    /// Multi-controlled X.
    Mcx,
    /// Multi-controlled multi-target gate.
    Mcmt,
    /// Integer comparator.
    #[serde(rename = "int_comparator")]
    IntegerComparator,
    /// Adder modulo 2^n.
    ModularAdder,
    /// Adder with carry out.
    HalfAdder,
    /// Adder with carry in and carry out.
    FullAdder,
    /// Out-of-place multiplier.
    Multiplier,
    /// Exponential of a Pauli sum.
    PauliEvolution,
    /// Weighted sum of state bits.
    WeightedSum,
    /// Operation wrapped in modifiers.
    Annotated,
}

impl Family {
    /// Every family, in registry order.
    pub const ALL: [Family; 14] = [
        Family::Clifford,
        Family::LinearFunction,
        Family::Permutation,
        Family::Qft,
        Family::Mcx,
        Family::Mcmt,
        Family::IntegerComparator,
        Family::ModularAdder,
        Family::HalfAdder,
        Family::FullAdder,
        Family::Multiplier,
        Family::PauliEvolution,
        Family::WeightedSum,
        Family::Annotated,
    ];

    /// Registry name of the family.
    pub fn as_str(self) -> &'static str {
        match self {
            Family::Clifford => "clifford",
            Family::LinearFunction => "linear_function",
            Family::Permutation => "permutation",
            Family::Qft => "qft",
            Family::Mcx => "mcx",
            Family::Mcmt => "mcmt",
            Family::IntegerComparator => "int_comparator",
            Family::ModularAdder => "modular_adder",
            Family::HalfAdder => "half_adder",
            Family::FullAdder => "full_adder",
            Family::Multiplier => "multiplier",
            Family::PauliEvolution => "pauli_evolution",
            Family::WeightedSum => "weighted_sum",
            Family::Annotated => "annotated",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Family::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| IrError::InvalidOperation {
                name: s.to_string(),
                reason: "unknown operation family".into(),
            })
    }
}

/// A structural transformation layered onto a base operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// Adjoint of the operation.
    Inverse,
    /// Control on `ctrl_state.len()` new leading qubits; entry `i` is the
    /// value control `i` must hold for the operation to fire.
    Control {
        /// Required value of each control qubit.
        ctrl_state: Vec<bool>,
    },
    /// Operation raised to a real power.
    Power {
        /// The exponent.
        exponent: f64,
    },
}

impl Modifier {
    /// Control on `n` qubits, all required to be |1⟩.
    pub fn control(n: usize) -> Self {
        Modifier::Control {
            ctrl_state: vec![true; n],
        }
    }

    /// Control on `n` qubits, all required to be |0⟩.
    pub fn neg_control(n: usize) -> Self {
        Modifier::Control {
            ctrl_state: vec![false; n],
        }
    }

    /// Control on `n` qubits with bit `i` of `state` giving control `i`.
    pub fn control_with_state(n: usize, state: u64) -> Self {
        Modifier::Control {
            ctrl_state: (0..n).map(|i| i < 64 && (state >> i) & 1 == 1).collect(),
        }
    }

    /// Power modifier.
    pub fn power(exponent: f64) -> Self {
        Modifier::Power { exponent }
    }

    /// Number of control qubits this modifier adds.
    pub fn num_ctrl_qubits(&self) -> usize {
        match self {
            Modifier::Control { ctrl_state } => ctrl_state.len(),
            _ => 0,
        }
    }

    /// Parse an OpenQASM 3 modifier chain such as `inv @ ctrl(2) @ pow(0.5)`.
    ///
    /// The text lists the outermost modifier first; the returned list is
    /// innermost first, the order in which modifiers are applied.
    pub fn parse_chain(text: &str) -> IrResult<Vec<Modifier>> {
        let mut modifiers = text
            .split('@')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<IrResult<Vec<Modifier>>>()?;
        modifiers.reverse();
        Ok(modifiers)
    }
}

impl FromStr for Modifier {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (keyword, arg) = match s.find('(') {
            Some(open) => {
                let close = s
                    .rfind(')')
                    .filter(|&c| c > open)
                    .ok_or_else(|| IrError::UnknownModifier(s.to_string()))?;
                (s[..open].trim(), Some(s[open + 1..close].trim()))
            }
            None => (s, None),
        };
        let count = |arg: Option<&str>| -> IrResult<usize> {
            match arg {
                None => Ok(1),
                Some(a) => a
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or_else(|| IrError::UnknownModifier(s.to_string())),
            }
        };
        match keyword {
            "inv" if arg.is_none() => Ok(Modifier::Inverse),
            "ctrl" => Ok(Modifier::control(count(arg)?)),
            "negctrl" => Ok(Modifier::neg_control(count(arg)?)),
            "pow" => arg
                .and_then(|a| a.parse::<f64>().ok())
                .map(Modifier::power)
                .ok_or_else(|| IrError::UnknownModifier(s.to_string())),
            _ => Err(IrError::UnknownModifier(s.to_string())),
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Inverse => write!(f, "inv"),
            Modifier::Control { ctrl_state } if ctrl_state.iter().all(|b| *b) => {
                write!(f, "ctrl({})", ctrl_state.len())
            }
            Modifier::Control { ctrl_state } if ctrl_state.iter().all(|b| !*b) => {
                write!(f, "negctrl({})", ctrl_state.len())
            }
            Modifier::Control { ctrl_state } => {
                let bits: String = ctrl_state.iter().map(|b| if *b { '1' } else { '0' }).collect();
                write!(f, "ctrl[{bits}]")
            }
            Modifier::Power { exponent } => write!(f, "pow({exponent})"),
        }
    }
}

/// A base operation wrapped in an ordered list of modifiers.
///
/// `modifiers[0]` is applied first. Control qubits added by the modifiers
/// precede the base qubits, the latest control outermost (first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedOperation {
    /// The operation being modified.
    pub base: Box<Operation>,
    /// Modifiers, innermost first.
    pub modifiers: Vec<Modifier>,
}

impl AnnotatedOperation {
    /// Wrap `base` in `modifiers`.
    pub fn new(base: impl Into<Operation>, modifiers: Vec<Modifier>) -> Self {
        Self {
            base: Box::new(base.into()),
            modifiers,
        }
    }

    /// Total number of control qubits across all modifiers.
    pub fn num_ctrl_qubits(&self) -> usize {
        self.modifiers.iter().map(Modifier::num_ctrl_qubits).sum()
    }

    /// Number of qubits: the base qubits plus every control.
    pub fn num_qubits(&self) -> usize {
        self.base.num_qubits() + self.num_ctrl_qubits()
    }
}

/// An abstract operation that must be synthesized into gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HighLevelOperation {
    /// Clifford operator given by its tableau.
    Clifford(Clifford),
    /// Linear function over GF(2).
    LinearFunction(LinearFunction),
    /// Qubit permutation: output `i` takes the state of input `pattern[i]`.
    Permutation {
        /// The permutation pattern.
        pattern: Vec<usize>,
    },
    /// Quantum Fourier transform.
    Qft {
        /// Number of qubits.
        num_qubits: usize,
        /// Number of smallest controlled rotations dropped.
        approximation_degree: usize,
        /// Reverse the qubit order at the end.
        do_swaps: bool,
        /// Inverse transform.
        inverse: bool,
    },
    /// X on the last qubit, controlled on all others.
    Mcx {
        /// Number of controls.
        num_ctrl_qubits: usize,
    },
    /// A single-qubit gate applied to several targets under shared controls.
    Mcmt {
        /// The single-qubit base gate.
        base: StandardGate,
        /// Number of controls.
        num_ctrl_qubits: usize,
        /// Number of targets.
        num_target_qubits: usize,
    },
    /// Flip the result qubit iff the state register is `>= value` (or `<`).
    IntegerComparator {
        /// Width of the state register.
        num_state_qubits: usize,
        /// Comparison threshold.
        value: i64,
        /// Compare with `>=` when true, `<` otherwise.
        geq: bool,
    },
    /// `|a⟩|b⟩ → |a⟩|a + b mod 2^n⟩`.
    ModularAdder {
        /// Width of each operand.
        num_state_qubits: usize,
    },
    /// `|a⟩|b⟩|0⟩ → |a⟩|a + b⟩` with the carry in the last qubit.
    HalfAdder {
        /// Width of each operand.
        num_state_qubits: usize,
    },
    /// `|cin⟩|a⟩|b⟩|0⟩ → |cin⟩|a⟩|a + b + cin⟩`.
    FullAdder {
        /// Width of each operand.
        num_state_qubits: usize,
    },
    /// `|a⟩|b⟩|0⟩ → |a⟩|b⟩|a · b mod 2^r⟩`.
    Multiplier {
        /// Width of each operand.
        num_state_qubits: usize,
        /// Width of the product register.
        num_result_qubits: usize,
    },
    /// `exp(-i t H)` for a sum of Pauli operators.
    PauliEvolution(PauliEvolution),
    /// `|x⟩|s⟩ → |x⟩|s + Σ w_i x_i⟩`.
    WeightedSum {
        /// Weight of each state bit.
        weights: Vec<u64>,
    },
    /// Operation wrapped in modifiers.
    Annotated(AnnotatedOperation),
}

impl HighLevelOperation {
    /// A permutation, validating that `pattern` is a bijection.
    pub fn permutation(pattern: Vec<usize>) -> IrResult<Self> {
        let mut seen = vec![false; pattern.len()];
        for &p in &pattern {
            if p >= pattern.len() || std::mem::replace(&mut seen[p], true) {
                return Err(IrError::InvalidOperation {
                    name: "permutation".into(),
                    reason: format!("{pattern:?} is not a permutation"),
                });
            }
        }
        Ok(HighLevelOperation::Permutation { pattern })
    }

    /// An exact QFT with final swaps.
    pub fn qft(num_qubits: usize) -> Self {
        HighLevelOperation::Qft {
            num_qubits,
            approximation_degree: 0,
            do_swaps: true,
            inverse: false,
        }
    }

    /// A multi-controlled X with `num_ctrl_qubits` controls.
    pub fn mcx(num_ctrl_qubits: usize) -> Self {
        HighLevelOperation::Mcx { num_ctrl_qubits }
    }

    /// A multi-controlled multi-target gate; `base` must act on one qubit.
    pub fn mcmt(
        base: StandardGate,
        num_ctrl_qubits: usize,
        num_target_qubits: usize,
    ) -> IrResult<Self> {
        if base.num_qubits() != 1 || num_target_qubits == 0 {
            return Err(IrError::InvalidOperation {
                name: "mcmt".into(),
                reason: format!(
                    "base '{}' on {} targets is not a single-qubit gate on at least one target",
                    base.name(),
                    num_target_qubits
                ),
            });
        }
        Ok(HighLevelOperation::Mcmt {
            base,
            num_ctrl_qubits,
            num_target_qubits,
        })
    }

    /// A weighted sum; at least one weight is required.
    pub fn weighted_sum(weights: Vec<u64>) -> IrResult<Self> {
        if weights.is_empty() {
            return Err(IrError::InvalidOperation {
                name: "weighted_sum".into(),
                reason: "no weights given".into(),
            });
        }
        weight_total(&weights)?;
        Ok(HighLevelOperation::WeightedSum { weights })
    }

    /// Wrap an operation in modifiers.
    pub fn annotated(base: impl Into<Operation>, modifiers: Vec<Modifier>) -> Self {
        HighLevelOperation::Annotated(AnnotatedOperation::new(base, modifiers))
    }

    /// The family this operation belongs to.
    pub fn family(&self) -> Family {
        match self {
            HighLevelOperation::Clifford(_) => Family::Clifford,
            HighLevelOperation::LinearFunction(_) => Family::LinearFunction,
            HighLevelOperation::Permutation { .. } => Family::Permutation,
            HighLevelOperation::Qft { .. } => Family::Qft,
            HighLevelOperation::Mcx { .. } => Family::Mcx,
            HighLevelOperation::Mcmt { .. } => Family::Mcmt,
            HighLevelOperation::IntegerComparator { .. } => Family::IntegerComparator,
            HighLevelOperation::ModularAdder { .. } => Family::ModularAdder,
            HighLevelOperation::HalfAdder { .. } => Family::HalfAdder,
            HighLevelOperation::FullAdder { .. } => Family::FullAdder,
            HighLevelOperation::Multiplier { .. } => Family::Multiplier,
            HighLevelOperation::PauliEvolution(_) => Family::PauliEvolution,
            HighLevelOperation::WeightedSum { .. } => Family::WeightedSum,
            HighLevelOperation::Annotated(_) => Family::Annotated,
        }
    }

    /// Instruction name, identical to the family name.
    pub fn name(&self) -> &'static str {
        self.family().as_str()
    }

    /// Number of qubits the operation acts on.
    pub fn num_qubits(&self) -> usize {
        match self {
            HighLevelOperation::Clifford(c) => c.num_qubits(),
            HighLevelOperation::LinearFunction(lf) => lf.num_qubits(),
            HighLevelOperation::Permutation { pattern } => pattern.len(),
            HighLevelOperation::Qft { num_qubits, .. } => *num_qubits,
            HighLevelOperation::Mcx { num_ctrl_qubits } => num_ctrl_qubits + 1,
            HighLevelOperation::Mcmt {
                num_ctrl_qubits,
                num_target_qubits,
                ..
            } => num_ctrl_qubits + num_target_qubits,
            HighLevelOperation::IntegerComparator {
                num_state_qubits, ..
            } => num_state_qubits + 1,
            HighLevelOperation::ModularAdder { num_state_qubits } => 2 * num_state_qubits,
            HighLevelOperation::HalfAdder { num_state_qubits } => 2 * num_state_qubits + 1,
            HighLevelOperation::FullAdder { num_state_qubits } => 2 * num_state_qubits + 2,
            HighLevelOperation::Multiplier {
                num_state_qubits,
                num_result_qubits,
            } => 2 * num_state_qubits + num_result_qubits,
            HighLevelOperation::PauliEvolution(evo) => evo.num_qubits(),
            HighLevelOperation::WeightedSum { weights } => {
                weights.len() + weighted_sum_width(weights)
            }
            HighLevelOperation::Annotated(a) => a.num_qubits(),
        }
    }

    /// High-level operations never touch classical bits.
    pub fn num_clbits(&self) -> usize {
        0
    }

    /// The adjoint operation.
    ///
    /// Families with a closed-form inverse return it directly; the rest are
    /// wrapped in an `Inverse` modifier.
    pub fn inverse(&self) -> HighLevelOperation {
        match self {
            HighLevelOperation::Mcx { .. } => self.clone(),
            HighLevelOperation::Permutation { pattern } => {
                let mut inv = vec![0; pattern.len()];
                for (i, &p) in pattern.iter().enumerate() {
                    inv[p] = i;
                }
                HighLevelOperation::Permutation { pattern: inv }
            }
            HighLevelOperation::Qft {
                num_qubits,
                approximation_degree,
                do_swaps,
                inverse,
            } => HighLevelOperation::Qft {
                num_qubits: *num_qubits,
                approximation_degree: *approximation_degree,
                do_swaps: *do_swaps,
                inverse: !inverse,
            },
            HighLevelOperation::LinearFunction(lf) => match lf.inverse() {
                Ok(inv) => HighLevelOperation::LinearFunction(inv),
                Err(_) => self.wrapped_inverse(),
            },
            HighLevelOperation::Mcmt {
                base,
                num_ctrl_qubits,
                num_target_qubits,
            } => match base.inverse() {
                Some(inv) => HighLevelOperation::Mcmt {
                    base: inv,
                    num_ctrl_qubits: *num_ctrl_qubits,
                    num_target_qubits: *num_target_qubits,
                },
                None => self.wrapped_inverse(),
            },
            HighLevelOperation::PauliEvolution(evo) => {
                HighLevelOperation::PauliEvolution(evo.inverse())
            }
            HighLevelOperation::Annotated(a) => {
                let mut modifiers = a.modifiers.clone();
                if modifiers.last() == Some(&Modifier::Inverse) {
                    modifiers.pop();
                } else {
                    modifiers.push(Modifier::Inverse);
                }
                HighLevelOperation::Annotated(AnnotatedOperation {
                    base: a.base.clone(),
                    modifiers,
                })
            }
            _ => self.wrapped_inverse(),
        }
    }

    fn wrapped_inverse(&self) -> HighLevelOperation {
        HighLevelOperation::annotated(self.clone(), vec![Modifier::Inverse])
    }
}

/// Σw, rejected when it does not fit in 64 bits.
pub fn weight_total(weights: &[u64]) -> IrResult<u64> {
    weights
        .iter()
        .try_fold(0u64, |acc, &w| acc.checked_add(w))
        .ok_or_else(|| IrError::InvalidOperation {
            name: "weighted_sum".into(),
            reason: "sum of weights exceeds 64 bits".into(),
        })
}

/// Width of the sum register of a weighted sum: `⌊log2 Σw⌋ + 1`, at least 1.
///
/// Saturates at 64 bits; [`weight_total`] tells whether Σw fits.
pub fn weighted_sum_width(weights: &[u64]) -> usize {
    let total = weights.iter().fold(0u64, |acc, &w| acc.saturating_add(w));
    if total == 0 {
        1
    } else {
        (u64::BITS - total.leading_zeros()) as usize
    }
}

/// Either a standard gate or a high-level operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// A standard gate.
    Gate(StandardGate),
    /// A high-level operation.
    HighLevel(HighLevelOperation),
}

impl Operation {
    /// Name of the operation.
    pub fn name(&self) -> &str {
        match self {
            Operation::Gate(g) => g.name(),
            Operation::HighLevel(op) => op.name(),
        }
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        match self {
            Operation::Gate(g) => g.num_qubits(),
            Operation::HighLevel(op) => op.num_qubits(),
        }
    }

    /// The adjoint operation.
    pub fn inverse(&self) -> Operation {
        match self {
            Operation::Gate(g) => match g.inverse() {
                Some(inv) => Operation::Gate(inv),
                None => Operation::HighLevel(HighLevelOperation::annotated(
                    g.clone(),
                    vec![Modifier::Inverse],
                )),
            },
            Operation::HighLevel(op) => Operation::HighLevel(op.inverse()),
        }
    }
}

impl From<StandardGate> for Operation {
    fn from(gate: StandardGate) -> Self {
        Operation::Gate(gate)
    }
}

impl From<HighLevelOperation> for Operation {
    fn from(op: HighLevelOperation) -> Self {
        Operation::HighLevel(op)
    }
}
