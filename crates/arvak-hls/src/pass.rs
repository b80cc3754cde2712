//! Pass trait and types for compilation passes.

use arvak_ir::Circuit;

use crate::error::HlsResult;
use crate::property::PropertySet;

/// The kind of compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Analysis pass that reads but does not modify the circuit.
    Analysis,
    /// Transformation pass that rewrites the circuit.
    Transformation,
}

/// A compilation pass that operates on a circuit.
///
/// [`HighLevelSynthesis`](crate::HighLevelSynthesis) is a transformation
/// pass: it reads the target from the `PropertySet` and replaces the
/// circuit with its synthesized form.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Run the pass on the given circuit.
    ///
    /// Analysis passes should not modify the circuit but may write to the
    /// `PropertySet`.
    fn run(&self, circuit: &mut Circuit, properties: &mut PropertySet) -> HlsResult<()>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _circuit: &Circuit, _properties: &PropertySet) -> bool {
        true
    }
}
