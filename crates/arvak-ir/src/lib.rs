//! Arvak Circuit Intermediate Representation
//!
//! Core data structures for quantum circuits that still contain abstract,
//! not-yet-synthesized operations. The high-level synthesis crate consumes
//! these circuits and rewrites every [`HighLevelOperation`] into gates.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] with inverses, powers, Euler forms and definitions
//! - **Parameters**: [`ParameterExpression`] for symbolic angles
//! - **High-level operations**: [`HighLevelOperation`], grouped into [`Family`]s,
//!   and [`AnnotatedOperation`]s carrying [`Modifier`]s
//! - **Operators**: [`Clifford`] tableaux, [`LinearFunction`]s, Pauli sums and
//!   [`PauliEvolution`]
//! - **Circuit**: [`Circuit`], an instruction list with a fluent builder API
//! - **Simulation**: [`Statevector`] and [`operator::equivalent`] for small circuits
//!
//! # Example: Annotated operation
//!
//! ```rust
//! use arvak_ir::{Circuit, HighLevelOperation, Modifier, QubitId};
//!
//! let controlled_inverse_qft = HighLevelOperation::annotated(
//!     HighLevelOperation::qft(3),
//!     Modifier::parse_chain("ctrl(2) @ inv").unwrap(),
//! );
//! assert_eq!(controlled_inverse_qft.num_qubits(), 5);
//!
//! let mut circuit = Circuit::with_size("main", 5, 0);
//! circuit
//!     .high_level(controlled_inverse_qft, (0..5).map(QubitId))
//!     .unwrap();
//! assert_eq!(circuit.count_ops().get("annotated"), Some(&1));
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `H` | 1 | Hadamard gate |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `S`, `Sdg`, `T`, `Tdg`, `SX`, `SXdg` | 1 | Fixed phase and root gates |
//! | `Rx`, `Ry`, `Rz`, `P` | 1 | Rotation and phase gates |
//! | `U` | 1 | Universal single-qubit gate U(θ,φ,λ) |
//! | `CX`, `CY`, `CZ`, `CH` | 2 | Controlled Paulis and Hadamard |
//! | `CRx`, `CRy`, `CRz`, `CP` | 2 | Controlled rotations and phase |
//! | `Swap`, `ISwap` | 2 | Swap gates |
//! | `RXX`, `RYY`, `RZZ` | 2 | Two-qubit Pauli rotations |
//! | `CCX`, `CSwap` | 3 | Toffoli and Fredkin gates |

pub mod circuit;
pub mod clifford;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod linear;
pub mod operation;
pub mod operator;
pub mod parameter;
pub mod pauli;
pub mod qubit;

pub use circuit::Circuit;
pub use clifford::Clifford;
pub use error::{IrError, IrResult};
pub use gate::{EulerAngles, StandardGate};
pub use instruction::{Instruction, InstructionKind};
pub use linear::LinearFunction;
pub use operation::{AnnotatedOperation, Family, HighLevelOperation, Modifier, Operation};
pub use operator::Statevector;
pub use parameter::ParameterExpression;
pub use pauli::{
    BitTerm, EvolutionSynthesis, ObservableTerm, PauliEvolution, PauliOp, PauliOperator,
    PauliString, PauliTerm, SparseObservable, SparsePauliOp,
};
pub use qubit::{ClbitId, QubitId, qubits};
