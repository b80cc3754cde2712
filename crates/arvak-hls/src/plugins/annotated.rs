//! The annotated-operation resolver as a registry plugin.

use arvak_ir::Family;

use crate::annotated::resolve;
use crate::plugin::FnPlugin;
use crate::registry::{DEFAULT_VARIANT, PluginRegistry};

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::Annotated, DEFAULT_VARIANT, resolve));
}
