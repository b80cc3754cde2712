//! Multi-controlled multi-target variants.
//!
//! Layout `[controls (k), targets (t), ancillas]`. Open controls from the
//! `ctrl_state` option are conjugated by X around the whole construction.

use arvak_ir::{Circuit, Family, HighLevelOperation, Instruction, QubitId, StandardGate};

use crate::context::ResourceContext;
use crate::control::append_controlled;
use crate::error::HlsResult;
use crate::plugin::{FnPlugin, PluginResult};
use crate::registry::{DefaultPolicy, PluginRegistry};
use crate::synthesis::register as qubit_range;

const DEFAULT_CHAIN: &[&str] = &["xgate", "vchain", "noaux"];

struct Mcmt<'a> {
    base: &'a StandardGate,
    controls: Vec<QubitId>,
    targets: Vec<QubitId>,
}

impl<'a> Mcmt<'a> {
    fn of(op: &'a HighLevelOperation) -> Option<Self> {
        match op {
            HighLevelOperation::Mcmt {
                base,
                num_ctrl_qubits,
                num_target_qubits,
            } => Some(Self {
                base,
                controls: qubit_range(0, *num_ctrl_qubits),
                targets: qubit_range(*num_ctrl_qubits, *num_target_qubits),
            }),
            _ => None,
        }
    }

    fn width(&self) -> usize {
        self.controls.len() + self.targets.len()
    }

    /// Build `name` on `width` qubits with the open controls flipped
    /// around `body`.
    fn build(
        &self,
        name: &str,
        width: usize,
        ctx: &ResourceContext<'_>,
        body: impl FnOnce(&mut Circuit) -> HlsResult<()>,
    ) -> HlsResult<Circuit> {
        let mut circuit = Circuit::with_size(name, width, 0);
        let open: Vec<QubitId> = match ctx.options.mcmt.ctrl_state {
            Some(state) => self
                .controls
                .iter()
                .filter(|q| q.index() >= 64 || state >> q.index() & 1 == 0)
                .copied()
                .collect(),
            None => vec![],
        };
        for &q in &open {
            circuit.x(q)?;
        }
        body(&mut circuit)?;
        for &q in &open {
            circuit.x(q)?;
        }
        Ok(circuit)
    }

    fn base_on(&self, target: QubitId) -> Instruction {
        Instruction::gate(self.base.clone(), [target])
    }
}

fn xgate(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(mcmt) = Mcmt::of(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    let Some((&first, rest)) = mcmt.targets.split_first() else {
        return Ok(PluginResult::NotApplicable);
    };
    if *mcmt.base != StandardGate::X {
        return Ok(PluginResult::NotApplicable);
    }
    let circuit = mcmt.build("mcmt_xgate", mcmt.width(), ctx, |circuit| {
        for &t in rest {
            circuit.cx(first, t)?;
        }
        circuit.mcx(&mcmt.controls, first)?;
        for &t in rest {
            circuit.cx(first, t)?;
        }
        Ok(())
    })?;
    Ok(circuit.into())
}

fn vchain(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(mcmt) = Mcmt::of(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    let k = mcmt.controls.len();
    let needed = k.saturating_sub(1);
    if ctx.clean_ancillas() < needed {
        return Ok(PluginResult::NotApplicable);
    }
    let ancillas = qubit_range(mcmt.width(), needed);
    let controls = &mcmt.controls;

    let compute = |circuit: &mut Circuit| -> HlsResult<()> {
        if k >= 2 {
            circuit.ccx(controls[0], controls[1], ancillas[0])?;
        }
        for i in 2..k {
            circuit.ccx(controls[i], ancillas[i - 2], ancillas[i - 1])?;
        }
        Ok(())
    };
    let uncompute = |circuit: &mut Circuit| -> HlsResult<()> {
        for i in (2..k).rev() {
            circuit.ccx(controls[i], ancillas[i - 2], ancillas[i - 1])?;
        }
        if k >= 2 {
            circuit.ccx(controls[0], controls[1], ancillas[0])?;
        }
        Ok(())
    };

    let top: Vec<QubitId> = match k {
        0 => vec![],
        1 => vec![controls[0]],
        _ => vec![ancillas[k - 2]],
    };
    let circuit = mcmt.build("mcmt_vchain", mcmt.width() + needed, ctx, |circuit| {
        compute(circuit)?;
        for &t in &mcmt.targets {
            append_controlled(circuit, &mcmt.base_on(t), &top)?;
        }
        uncompute(circuit)
    })?;
    Ok(circuit.into())
}

fn noaux(op: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    let Some(mcmt) = Mcmt::of(op) else {
        return Ok(PluginResult::NotApplicable);
    };
    let circuit = mcmt.build("mcmt_noaux", mcmt.width(), ctx, |circuit| {
        for &t in &mcmt.targets {
            append_controlled(circuit, &mcmt.base_on(t), &mcmt.controls)?;
        }
        Ok(())
    })?;
    Ok(circuit.into())
}

pub(crate) fn register(registry: &mut PluginRegistry) {
    registry.register(FnPlugin::new(Family::Mcmt, "xgate", xgate));
    registry.register(FnPlugin::new(Family::Mcmt, "vchain", vchain));
    registry.register(FnPlugin::new(Family::Mcmt, "noaux", noaux));
    registry.set_default(Family::Mcmt, DefaultPolicy::Chain(DEFAULT_CHAIN));
}
