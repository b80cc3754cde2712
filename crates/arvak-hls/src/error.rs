//! Error types for high-level synthesis.
//!
//! A plugin that cannot handle an operation returns
//! [`PluginResult::NotApplicable`](crate::plugin::PluginResult::NotApplicable);
//! everything in [`HlsError`] is a hard failure that aborts the enclosing
//! synthesis call.

use arvak_ir::IrError;
use thiserror::Error;

/// Errors produced while synthesizing high-level operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HlsError {
    /// Circuit construction failed.
    #[error("Circuit IR error: {0}")]
    Ir(#[source] IrError),

    /// A modifier keyword was not recognized.
    #[error("Unknown modifier '{0}'")]
    UnknownModifier(String),

    /// A control modifier was applied to a circuit with classical bits.
    #[error("Cannot control circuit '{0}': it has classical bits")]
    ControlWithClbits(String),

    /// An instruction has no controlled form (measure, reset).
    #[error("Instruction '{0}' cannot be controlled")]
    NotControllable(String),

    /// An instruction has no inverse.
    #[error("Instruction '{0}' cannot be inverted")]
    NotInvertible(String),

    /// A fractional power of a circuit that only supports integer powers.
    #[error("Cannot raise circuit to non-integer power {0}")]
    NonIntegerPower(f64),

    /// An engine-internal context field was missing.
    #[error("Resource context is missing '{0}'")]
    MissingContext(&'static str),

    /// No plugin is registered under the given key.
    #[error("Unknown synthesis plugin '{0}'")]
    UnknownPlugin(String),

    /// An operator handed to a synthesis routine was malformed.
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// Operation parameters are outside what the algorithm supports.
    #[error("Invalid parameters for '{name}': {reason}")]
    InvalidParameters {
        /// Operation name.
        name: String,
        /// Why the parameters were rejected.
        reason: String,
    },

    /// No method and no definition produced a circuit.
    #[error("Unable to synthesize '{0}'")]
    UnableToSynthesize(String),

    /// A synthesized circuit needs more ancillas than the circuit can lend.
    #[error("Synthesis needs {required} ancilla qubits but only {available} are available")]
    InsufficientAncillas {
        /// Ancillas the synthesized circuit uses.
        required: usize,
        /// Ancillas the tracker could provide.
        available: usize,
    },

    /// Invalid configuration file or value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IrError> for HlsError {
    fn from(err: IrError) -> Self {
        match err {
            IrError::UnknownModifier(m) => HlsError::UnknownModifier(m),
            IrError::NotInvertible(name) => HlsError::NotInvertible(name),
            IrError::NonIntegerPower(p) => HlsError::NonIntegerPower(p),
            other => HlsError::Ir(other),
        }
    }
}

/// Result type for synthesis operations.
pub type HlsResult<T> = Result<T, HlsError>;
