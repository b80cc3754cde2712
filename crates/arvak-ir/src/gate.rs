//! Standard gates and their algebra (inverse, powers, Euler form, definitions).

use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::circuit::Circuit;
use crate::parameter::ParameterExpression;

/// Standard gates with known semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,
    /// sqrt(X)-dagger gate.
    SXdg,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(ParameterExpression),
    /// Rotation around Y axis.
    Ry(ParameterExpression),
    /// Rotation around Z axis.
    Rz(ParameterExpression),
    /// Phase gate.
    P(ParameterExpression),
    /// Universal single-qubit gate U(θ, φ, λ).
    U(
        ParameterExpression,
        ParameterExpression,
        ParameterExpression,
    ),

    // Two-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Y gate.
    CY,
    /// Controlled-Z gate.
    CZ,
    /// Controlled-Hadamard gate.
    CH,
    /// SWAP gate.
    Swap,
    /// iSWAP gate.
    ISwap,
    /// Controlled rotation around X.
    CRx(ParameterExpression),
    /// Controlled rotation around Y.
    CRy(ParameterExpression),
    /// Controlled rotation around Z.
    CRz(ParameterExpression),
    /// Controlled phase gate.
    CP(ParameterExpression),
    /// XX rotation gate.
    RXX(ParameterExpression),
    /// YY rotation gate.
    RYY(ParameterExpression),
    /// ZZ rotation gate.
    RZZ(ParameterExpression),

    // Three-qubit gates
    /// Toffoli gate (CCX).
    CCX,
    /// Fredkin gate (CSWAP).
    CSwap,
}

/// Euler form of a single-qubit gate: `gate = e^{iγ} · U(θ, φ, λ)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EulerAngles {
    /// Polar angle θ.
    pub theta: ParameterExpression,
    /// First azimuthal angle φ.
    pub phi: ParameterExpression,
    /// Second azimuthal angle λ.
    pub lambda: ParameterExpression,
    /// Global phase γ.
    pub phase: ParameterExpression,
}

impl EulerAngles {
    fn new(theta: f64, phi: f64, lambda: f64, phase: f64) -> Self {
        Self {
            theta: theta.into(),
            phi: phi.into(),
            lambda: lambda.into(),
            phase: phase.into(),
        }
    }
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::SXdg => "sxdg",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::P(_) => "p",
            StandardGate::U(_, _, _) => "u",
            StandardGate::CX => "cx",
            StandardGate::CY => "cy",
            StandardGate::CZ => "cz",
            StandardGate::CH => "ch",
            StandardGate::Swap => "swap",
            StandardGate::ISwap => "iswap",
            StandardGate::CRx(_) => "crx",
            StandardGate::CRy(_) => "cry",
            StandardGate::CRz(_) => "crz",
            StandardGate::CP(_) => "cp",
            StandardGate::RXX(_) => "rxx",
            StandardGate::RYY(_) => "ryy",
            StandardGate::RZZ(_) => "rzz",
            StandardGate::CCX => "ccx",
            StandardGate::CSwap => "cswap",
        }
    }

    /// Get the number of qubits this gate operates on.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        match self {
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::SX
            | StandardGate::SXdg
            | StandardGate::Rx(_)
            | StandardGate::Ry(_)
            | StandardGate::Rz(_)
            | StandardGate::P(_)
            | StandardGate::U(_, _, _) => 1,

            StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::ISwap
            | StandardGate::CRx(_)
            | StandardGate::CRy(_)
            | StandardGate::CRz(_)
            | StandardGate::CP(_)
            | StandardGate::RXX(_)
            | StandardGate::RYY(_)
            | StandardGate::RZZ(_) => 2,

            StandardGate::CCX | StandardGate::CSwap => 3,
        }
    }

    /// Check if this gate has unbound parameters.
    pub fn is_parameterized(&self) -> bool {
        self.parameters().iter().any(|p| p.is_symbolic())
    }

    /// Get parameters of this gate.
    pub fn parameters(&self) -> Vec<&ParameterExpression> {
        match self {
            StandardGate::Rx(p)
            | StandardGate::Ry(p)
            | StandardGate::Rz(p)
            | StandardGate::P(p)
            | StandardGate::CRx(p)
            | StandardGate::CRy(p)
            | StandardGate::CRz(p)
            | StandardGate::CP(p)
            | StandardGate::RXX(p)
            | StandardGate::RYY(p)
            | StandardGate::RZZ(p) => vec![p],

            StandardGate::U(a, b, c) => vec![a, b, c],

            _ => vec![],
        }
    }

    /// The inverse gate, when it is itself a standard gate.
    ///
    /// Returns `None` for iSWAP, whose inverse is only reachable through its
    /// definition.
    pub fn inverse(&self) -> Option<StandardGate> {
        let inv = match self {
            StandardGate::S => StandardGate::Sdg,
            StandardGate::Sdg => StandardGate::S,
            StandardGate::T => StandardGate::Tdg,
            StandardGate::Tdg => StandardGate::T,
            StandardGate::SX => StandardGate::SXdg,
            StandardGate::SXdg => StandardGate::SX,
            StandardGate::Rx(p) => StandardGate::Rx(p.negated()),
            StandardGate::Ry(p) => StandardGate::Ry(p.negated()),
            StandardGate::Rz(p) => StandardGate::Rz(p.negated()),
            StandardGate::P(p) => StandardGate::P(p.negated()),
            StandardGate::U(theta, phi, lambda) => {
                StandardGate::U(theta.negated(), lambda.negated(), phi.negated())
            }
            StandardGate::CRx(p) => StandardGate::CRx(p.negated()),
            StandardGate::CRy(p) => StandardGate::CRy(p.negated()),
            StandardGate::CRz(p) => StandardGate::CRz(p.negated()),
            StandardGate::CP(p) => StandardGate::CP(p.negated()),
            StandardGate::RXX(p) => StandardGate::RXX(p.negated()),
            StandardGate::RYY(p) => StandardGate::RYY(p.negated()),
            StandardGate::RZZ(p) => StandardGate::RZZ(p.negated()),
            StandardGate::ISwap => return None,
            StandardGate::I
            | StandardGate::X
            | StandardGate::Y
            | StandardGate::Z
            | StandardGate::H
            | StandardGate::CX
            | StandardGate::CY
            | StandardGate::CZ
            | StandardGate::CH
            | StandardGate::Swap
            | StandardGate::CCX
            | StandardGate::CSwap => self.clone(),
        };
        Some(inv)
    }

    /// The gate raised to a real exponent, for gates that form a
    /// one-parameter group (rotations and phases).
    pub fn power(&self, exponent: f64) -> Option<StandardGate> {
        let powered = match self {
            StandardGate::Rx(p) => StandardGate::Rx(p.scaled(exponent)),
            StandardGate::Ry(p) => StandardGate::Ry(p.scaled(exponent)),
            StandardGate::Rz(p) => StandardGate::Rz(p.scaled(exponent)),
            StandardGate::P(p) => StandardGate::P(p.scaled(exponent)),
            StandardGate::CRx(p) => StandardGate::CRx(p.scaled(exponent)),
            StandardGate::CRy(p) => StandardGate::CRy(p.scaled(exponent)),
            StandardGate::CRz(p) => StandardGate::CRz(p.scaled(exponent)),
            StandardGate::CP(p) => StandardGate::CP(p.scaled(exponent)),
            StandardGate::RXX(p) => StandardGate::RXX(p.scaled(exponent)),
            StandardGate::RYY(p) => StandardGate::RYY(p.scaled(exponent)),
            StandardGate::RZZ(p) => StandardGate::RZZ(p.scaled(exponent)),
            StandardGate::Z => StandardGate::P((PI * exponent).into()),
            StandardGate::S => StandardGate::P((FRAC_PI_2 * exponent).into()),
            StandardGate::Sdg => StandardGate::P((-FRAC_PI_2 * exponent).into()),
            StandardGate::T => StandardGate::P((FRAC_PI_4 * exponent).into()),
            StandardGate::Tdg => StandardGate::P((-FRAC_PI_4 * exponent).into()),
            StandardGate::I => StandardGate::I,
            _ => return None,
        };
        Some(powered)
    }

    /// Euler form of a single-qubit gate. `None` for multi-qubit gates.
    pub fn euler(&self) -> Option<EulerAngles> {
        let angles = match self {
            StandardGate::I => EulerAngles::new(0.0, 0.0, 0.0, 0.0),
            StandardGate::X => EulerAngles::new(PI, 0.0, PI, 0.0),
            StandardGate::Y => EulerAngles::new(PI, FRAC_PI_2, FRAC_PI_2, 0.0),
            StandardGate::Z => EulerAngles::new(0.0, 0.0, PI, 0.0),
            StandardGate::H => EulerAngles::new(FRAC_PI_2, 0.0, PI, 0.0),
            StandardGate::S => EulerAngles::new(0.0, 0.0, FRAC_PI_2, 0.0),
            StandardGate::Sdg => EulerAngles::new(0.0, 0.0, -FRAC_PI_2, 0.0),
            StandardGate::T => EulerAngles::new(0.0, 0.0, FRAC_PI_4, 0.0),
            StandardGate::Tdg => EulerAngles::new(0.0, 0.0, -FRAC_PI_4, 0.0),
            StandardGate::SX => EulerAngles::new(FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2, FRAC_PI_4),
            StandardGate::SXdg => {
                EulerAngles::new(-FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2, -FRAC_PI_4)
            }
            StandardGate::Rx(t) => EulerAngles {
                theta: t.clone(),
                phi: (-FRAC_PI_2).into(),
                lambda: FRAC_PI_2.into(),
                phase: 0.0.into(),
            },
            StandardGate::Ry(t) => EulerAngles {
                theta: t.clone(),
                phi: 0.0.into(),
                lambda: 0.0.into(),
                phase: 0.0.into(),
            },
            StandardGate::Rz(t) => EulerAngles {
                theta: 0.0.into(),
                phi: 0.0.into(),
                lambda: t.clone(),
                phase: t.half().negated(),
            },
            StandardGate::P(l) => EulerAngles {
                theta: 0.0.into(),
                phi: 0.0.into(),
                lambda: l.clone(),
                phase: 0.0.into(),
            },
            StandardGate::U(theta, phi, lambda) => EulerAngles {
                theta: theta.clone(),
                phi: phi.clone(),
                lambda: lambda.clone(),
                phase: 0.0.into(),
            },
            _ => return None,
        };
        Some(angles)
    }

    /// Decomposition into simpler standard gates.
    ///
    /// `U` and `CX` are the leaves of the definition tree and return `None`;
    /// every other gate eventually reduces to them.
    pub fn definition(&self) -> Option<Circuit> {
        use StandardGate as G;

        if matches!(self, G::U(..) | G::CX) {
            return None;
        }
        if let Some(e) = self.euler() {
            let mut circuit = Circuit::from_gates(
                self.name(),
                1,
                [(G::U(e.theta, e.phi, e.lambda), vec![0])],
            );
            circuit.set_global_phase(e.phase);
            return Some(circuit);
        }

        let half = |p: &ParameterExpression| p.half();
        let gates: Vec<(StandardGate, Vec<usize>)> = match self {
            G::CY => vec![(G::Sdg, vec![1]), (G::CX, vec![0, 1]), (G::S, vec![1])],
            G::CZ => vec![(G::H, vec![1]), (G::CX, vec![0, 1]), (G::H, vec![1])],
            G::CH => vec![
                (G::S, vec![1]),
                (G::H, vec![1]),
                (G::T, vec![1]),
                (G::CX, vec![0, 1]),
                (G::Tdg, vec![1]),
                (G::H, vec![1]),
                (G::Sdg, vec![1]),
            ],
            G::Swap => vec![(G::CX, vec![0, 1]), (G::CX, vec![1, 0]), (G::CX, vec![0, 1])],
            G::ISwap => vec![
                (G::S, vec![0]),
                (G::S, vec![1]),
                (G::H, vec![0]),
                (G::CX, vec![0, 1]),
                (G::CX, vec![1, 0]),
                (G::H, vec![1]),
            ],
            G::CRx(t) => vec![
                (G::P(FRAC_PI_2.into()), vec![1]),
                (G::CX, vec![0, 1]),
                (G::U(half(t).negated(), 0.0.into(), 0.0.into()), vec![1]),
                (G::CX, vec![0, 1]),
                (G::U(half(t), (-FRAC_PI_2).into(), 0.0.into()), vec![1]),
            ],
            G::CRy(t) => vec![
                (G::Ry(half(t)), vec![1]),
                (G::CX, vec![0, 1]),
                (G::Ry(half(t).negated()), vec![1]),
                (G::CX, vec![0, 1]),
            ],
            G::CRz(t) => vec![
                (G::Rz(half(t)), vec![1]),
                (G::CX, vec![0, 1]),
                (G::Rz(half(t).negated()), vec![1]),
                (G::CX, vec![0, 1]),
            ],
            G::CP(l) => vec![
                (G::P(half(l)), vec![0]),
                (G::CX, vec![0, 1]),
                (G::P(half(l).negated()), vec![1]),
                (G::CX, vec![0, 1]),
                (G::P(half(l)), vec![1]),
            ],
            G::RXX(t) => vec![
                (G::H, vec![0]),
                (G::H, vec![1]),
                (G::CX, vec![0, 1]),
                (G::Rz(t.clone()), vec![1]),
                (G::CX, vec![0, 1]),
                (G::H, vec![0]),
                (G::H, vec![1]),
            ],
            G::RYY(t) => vec![
                (G::Rx(FRAC_PI_2.into()), vec![0]),
                (G::Rx(FRAC_PI_2.into()), vec![1]),
                (G::CX, vec![0, 1]),
                (G::Rz(t.clone()), vec![1]),
                (G::CX, vec![0, 1]),
                (G::Rx((-FRAC_PI_2).into()), vec![0]),
                (G::Rx((-FRAC_PI_2).into()), vec![1]),
            ],
            G::RZZ(t) => vec![
                (G::CX, vec![0, 1]),
                (G::Rz(t.clone()), vec![1]),
                (G::CX, vec![0, 1]),
            ],
            G::CCX => vec![
                (G::H, vec![2]),
                (G::CX, vec![1, 2]),
                (G::Tdg, vec![2]),
                (G::CX, vec![0, 2]),
                (G::T, vec![2]),
                (G::CX, vec![1, 2]),
                (G::Tdg, vec![2]),
                (G::CX, vec![0, 2]),
                (G::T, vec![1]),
                (G::T, vec![2]),
                (G::H, vec![2]),
                (G::CX, vec![0, 1]),
                (G::T, vec![0]),
                (G::Tdg, vec![1]),
                (G::CX, vec![0, 1]),
            ],
            G::CSwap => vec![
                (G::CX, vec![2, 1]),
                (G::CCX, vec![0, 1, 2]),
                (G::CX, vec![2, 1]),
            ],
            _ => return None,
        };
        Some(Circuit::from_gates(self.name(), self.num_qubits(), gates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_gate_properties() {
        assert_eq!(StandardGate::H.num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);

        assert!(!StandardGate::H.is_parameterized());
        assert!(!StandardGate::Rx(ParameterExpression::constant(PI)).is_parameterized());
        assert!(StandardGate::Rx(ParameterExpression::symbol("theta")).is_parameterized());
    }

    #[test]
    fn test_inverse_pairs() {
        assert_eq!(StandardGate::S.inverse(), Some(StandardGate::Sdg));
        assert_eq!(StandardGate::CCX.inverse(), Some(StandardGate::CCX));
        assert_eq!(
            StandardGate::Rz(1.0.into()).inverse(),
            Some(StandardGate::Rz((-1.0).into()))
        );
        assert_eq!(StandardGate::ISwap.inverse(), None);
    }

    #[test]
    fn test_power_of_phase_gates() {
        assert_eq!(
            StandardGate::T.power(2.0),
            Some(StandardGate::P(FRAC_PI_2.into()))
        );
        assert_eq!(
            StandardGate::Ry(1.0.into()).power(0.5),
            Some(StandardGate::Ry(0.5.into()))
        );
        assert_eq!(StandardGate::H.power(0.5), None);
    }

    #[test]
    fn test_definitions_bottom_out() {
        assert!(StandardGate::CX.definition().is_none());
        assert!(StandardGate::U(0.0.into(), 0.0.into(), 0.0.into())
            .definition()
            .is_none());

        let ccx = StandardGate::CCX.definition().unwrap();
        assert_eq!(ccx.num_qubits(), 3);
        assert_eq!(ccx.count_ops().get("cx"), Some(&6));

        let rz = StandardGate::Rz(1.0.into()).definition().unwrap();
        assert_eq!(rz.global_phase().as_f64(), Some(-0.5));
    }
}
