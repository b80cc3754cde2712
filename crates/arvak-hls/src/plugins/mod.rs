//! Built-in synthesis plugins, one module per operation family.
//!
//! Each module registers its variants and the family's default policy. The
//! variants only decide applicability and translate options; the circuits
//! come from [`synthesis`](crate::synthesis).

mod adder;
mod annotated;
mod clifford;
mod comparator;
mod evolution;
mod linear;
mod mcmt;
mod mcx;
mod multiplier;
mod permutation;
mod qft;
mod weighted_sum;

pub use adder::{FULL_ADDER_RIPPLE_MAX, HALF_ADDER_RIPPLE_MAX, MODULAR_ADDER_QFT_MAX};

use arvak_ir::Circuit;

use crate::error::HlsResult;
use crate::plugin::PluginResult;
use crate::registry::PluginRegistry;

/// Install every built-in variant and default policy.
pub(crate) fn register_standard(registry: &mut PluginRegistry) {
    mcx::register(registry);
    mcmt::register(registry);
    comparator::register(registry);
    adder::register(registry);
    multiplier::register(registry);
    evolution::register(registry);
    clifford::register(registry);
    linear::register(registry);
    permutation::register(registry);
    qft::register(registry);
    weighted_sum::register(registry);
    annotated::register(registry);
}

/// Run `synthesize` only when `condition` holds.
fn when(
    condition: bool,
    synthesize: impl FnOnce() -> HlsResult<Circuit>,
) -> HlsResult<PluginResult> {
    if !condition {
        return Ok(PluginResult::NotApplicable);
    }
    synthesize().map(PluginResult::Synthesized)
}
