//! End-to-end synthesis scenarios.
//!
//! These tests drive the registry and the `HighLevelSynthesis` pass the way
//! a compiler pipeline would, and check the synthesized circuits either
//! structurally (widths, variant names, basis) or behaviourally against the
//! dense simulator.

use std::io;
use std::sync::{Arc, Mutex};

use arvak_hls::annotated::{apply_modifiers, canonicalize, conjugate_decomposition};
use arvak_hls::synthesis::arithmetic::{AdderKind, synth_adder_qft_d00};
use arvak_hls::{
    BasisGates, CouplingMap, FnPlugin, HighLevelSynthesis, HlsConfig, HlsError, HlsResult,
    MethodSpec, PluginRegistry, PluginResult, PropertySet, ResourceContext,
};
use arvak_ir::operator::{equivalent, simulate_basis};
use arvak_ir::{
    AnnotatedOperation, Circuit, EvolutionSynthesis, Family, HighLevelOperation, Modifier,
    PauliEvolution, PauliOperator, QubitId, SparsePauliOp, StandardGate,
};

/// Helper: a circuit holding one high-level operation on its first qubits.
fn single_op(name: &str, width: usize, op: HighLevelOperation) -> Circuit {
    let n = op.num_qubits();
    let mut circuit = Circuit::with_size(name, width, 0);
    circuit.high_level(op, arvak_ir::qubits(0..n)).unwrap();
    circuit
}

/// Helper: true if every instruction is in `basis`.
fn only_basis(circuit: &Circuit, basis: &BasisGates) -> bool {
    circuit
        .instructions()
        .iter()
        .all(|inst| basis.contains(inst.name()))
}

/// Helper: route pass logs to the test output, filtered by `RUST_LOG`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Helper: synthesize down to `u` and `cx`.
fn synthesize_minimal(circuit: &Circuit) -> Circuit {
    init_tracing();
    let properties = PropertySet::new().with_basis_gates(BasisGates::minimal());
    HighLevelSynthesis::default()
        .run_on_circuit(circuit, &properties)
        .unwrap()
}

/// Helper: the basis state a circuit maps `input` to.
fn classical_output(circuit: &Circuit, input: usize) -> usize {
    simulate_basis(circuit, input)
        .unwrap()
        .basis_index()
        .unwrap_or_else(|| panic!("input {input:b} leaves the computational basis"))
}

// ============================================================================
// Scenario 1: MCX with five controls and no ancillas
// ============================================================================

#[test]
fn test_mcx_five_controls_without_ancillas() {
    let registry = PluginRegistry::standard();
    let result = registry
        .run_method("mcx.default", &HighLevelOperation::mcx(5), &ResourceContext::new())
        .unwrap();
    assert_eq!(result.circuit().map(Circuit::num_qubits), Some(6));

    let circuit = single_op("mcx5", 6, HighLevelOperation::mcx(5));
    let synthesized = synthesize_minimal(&circuit);
    assert_eq!(synthesized.num_qubits(), 6);
    assert!(only_basis(&synthesized, &BasisGates::minimal()));
    assert!(equivalent(&synthesized, &circuit, false).unwrap());
}

// ============================================================================
// Scenario 2: small half adder picks the ancilla-free ripple adder
// ============================================================================

#[test]
fn test_small_half_adder_selects_r25() {
    let registry = PluginRegistry::standard();
    let op = HighLevelOperation::HalfAdder { num_state_qubits: 2 };
    let result = registry
        .run_method("half_adder.default", &op, &ResourceContext::new())
        .unwrap();
    let circuit = result.into_circuit().unwrap();
    assert_eq!(circuit.name(), "half_adder_ripple_r25");
    assert_eq!(circuit.num_qubits(), 5);
}

#[test]
fn test_half_adder_adds() {
    let circuit = single_op(
        "half_adder",
        5,
        HighLevelOperation::HalfAdder { num_state_qubits: 2 },
    );
    let synthesized = synthesize_minimal(&circuit);
    for a in 0..4 {
        for b in 0..4 {
            let out = classical_output(&synthesized, a | b << 2);
            assert_eq!(out & 0b11, a, "a={a} b={b}");
            assert_eq!(out >> 2, a + b, "a={a} b={b}");
        }
    }
}

// ============================================================================
// Scenario 3: controlled inverse QFT
// ============================================================================

#[test]
fn test_controlled_inverse_qft() {
    let op = AnnotatedOperation::new(
        HighLevelOperation::qft(3),
        vec![Modifier::control(2), Modifier::Inverse],
    );
    let canonical = canonicalize(&op);
    assert_eq!(canonical.modifiers, op.modifiers);
    assert_eq!(canonical.num_ctrl_qubits(), 2);

    let circuit = single_op("cc_iqft", 5, HighLevelOperation::Annotated(op));
    let synthesized = synthesize_minimal(&circuit);
    assert_eq!(synthesized.num_qubits(), 5);
    assert!(only_basis(&synthesized, &BasisGates::minimal()));

    // With a control off the register is untouched.
    for input in [0b00_000, 0b01_101, 0b10_010] {
        assert_eq!(classical_output(&synthesized, input), input);
    }
    // With both controls on, |000⟩ spreads uniformly.
    let state = simulate_basis(&synthesized, 0b11).unwrap();
    for (index, amplitude) in state.amplitudes().iter().enumerate() {
        let expected = if index & 0b11 == 0b11 { 1.0 / 8f64.sqrt() } else { 0.0 };
        assert!((amplitude.norm() - expected).abs() < 1e-9, "index {index:05b}");
    }
}

// ============================================================================
// Annotated resolution
// ============================================================================

static SEEN_ANCILLAS: Mutex<Vec<(usize, usize)>> = Mutex::new(Vec::new());

fn record_ancillas(_: &HighLevelOperation, ctx: &ResourceContext<'_>) -> HlsResult<PluginResult> {
    SEEN_ANCILLAS
        .lock()
        .unwrap()
        .push((ctx.num_clean_ancillas, ctx.num_dirty_ancillas));
    Ok(PluginResult::NotApplicable)
}

#[test]
fn test_control_qubits_are_never_lent_to_the_base() {
    let mut registry = PluginRegistry::standard();
    registry.register(FnPlugin::new(Family::Mcx, "recording", record_ancillas));
    let config = HlsConfig::new().with_methods(
        Family::Mcx,
        vec![MethodSpec::new("recording"), MethodSpec::new("default")],
    );

    // Control on qubit 0, MCX(4) on qubits 1..=5, qubit 6 idle.
    let op = HighLevelOperation::annotated(
        HighLevelOperation::mcx(4),
        vec![Modifier::control(1), Modifier::Inverse],
    );
    let circuit = single_op("isolation", 7, op);
    let synthesized = HighLevelSynthesis::new(config)
        .with_registry(registry)
        .run_on_circuit(&circuit, &PropertySet::new())
        .unwrap();

    // The base sees only qubit 6: qubit 0 is clean but reserved.
    let seen = SEEN_ANCILLAS.lock().unwrap().clone();
    assert_eq!(seen.first(), Some(&(1, 0)));

    for input in 0..64 {
        let expected = if input & 0b11111 == 0b11111 { input ^ 0b100000 } else { input };
        assert_eq!(classical_output(&synthesized, input), expected, "input {input:06b}");
    }
}

#[test]
fn test_conjugate_round_trip() {
    let adder = synth_adder_qft_d00(2, AdderKind::Modular).unwrap();
    let conjugation = conjugate_decomposition(&adder).unwrap().unwrap();
    assert_eq!(conjugation.front.len(), 1);
    assert_eq!(conjugation.back.len(), 1);

    let mut round_trip = conjugation.front.clone();
    round_trip
        .compose(&conjugation.back, &arvak_ir::qubits(0..4))
        .unwrap();
    let identity = Circuit::with_size("identity", 4, 0);
    assert!(equivalent(&synthesize_minimal(&round_trip), &identity, false).unwrap());

    // Control only the middle and put front and back around it.
    let modifiers = [Modifier::control(1)];
    let whole = apply_modifiers(adder.clone(), &modifiers).unwrap();
    let middle = apply_modifiers(conjugation.middle.clone(), &modifiers).unwrap();
    let mut factored = Circuit::with_size("factored", 5, 0);
    factored
        .compose(&conjugation.front, &arvak_ir::qubits(1..5))
        .unwrap()
        .compose(&middle, &arvak_ir::qubits(0..5))
        .unwrap()
        .compose(&conjugation.back, &arvak_ir::qubits(1..5))
        .unwrap();
    assert!(equivalent(&synthesize_minimal(&whole), &synthesize_minimal(&factored), false).unwrap());
}

#[test]
fn test_controlled_modular_adder() {
    let op = HighLevelOperation::annotated(
        HighLevelOperation::ModularAdder { num_state_qubits: 2 },
        vec![Modifier::control(1)],
    );
    let synthesized = synthesize_minimal(&single_op("c_add", 5, op));
    for ctrl in 0..2 {
        for a in 0..4 {
            for b in 0..4 {
                let out = classical_output(&synthesized, ctrl | a << 1 | b << 3);
                let sum = if ctrl == 1 { (a + b) % 4 } else { b };
                assert_eq!(out, ctrl | a << 1 | sum << 3, "ctrl={ctrl} a={a} b={b}");
            }
        }
    }
}

#[test]
fn test_zero_power_is_identity_on_all_qubits() {
    let op = HighLevelOperation::annotated(
        HighLevelOperation::qft(2),
        vec![Modifier::control(1), Modifier::power(0.0), Modifier::Inverse],
    );
    let synthesized = synthesize_minimal(&single_op("nothing", 3, op));
    assert!(synthesized.is_empty());
}

#[test]
fn test_modifier_faults_abort_synthesis() {
    let mut measured = Circuit::with_size("measured", 1, 1);
    measured.measure(QubitId(0), arvak_ir::ClbitId(0)).unwrap();
    let err = apply_modifiers(measured, &[Modifier::control(1)]).unwrap_err();
    assert!(matches!(err, HlsError::ControlWithClbits(ref name) if name == "measured"));

    let err = Modifier::parse_chain("sqrt @ ctrl(1)").unwrap_err();
    assert!(matches!(HlsError::from(err), HlsError::UnknownModifier(_)));

    // A fractional power of a multi-gate base cannot be built.
    let op = HighLevelOperation::annotated(HighLevelOperation::qft(2), vec![Modifier::power(0.5)]);
    let properties = PropertySet::new().with_basis_gates(BasisGates::minimal());
    let err = HighLevelSynthesis::default()
        .run_on_circuit(&single_op("sqrt_qft", 2, op), &properties)
        .unwrap_err();
    assert!(matches!(err, HlsError::NonIntegerPower(p) if p == 0.5));
}

#[test]
fn test_fractional_power_of_rotation() {
    let op = HighLevelOperation::annotated(StandardGate::Rz(0.8_f64.into()), vec![Modifier::power(0.5)]);
    let synthesized = synthesize_minimal(&single_op("sqrt_rz", 1, op));

    let mut expected = Circuit::with_size("rz", 1, 0);
    expected.rz(0.4, QubitId(0)).unwrap();
    assert!(equivalent(&synthesized, &expected, false).unwrap());
}

// ============================================================================
// Configuration and targets
// ============================================================================

#[test]
fn test_yaml_configuration_drives_method_choice() {
    let config = HlsConfig::from_yaml(
        r#"
plugin_selection: sequential
methods:
  permutation:
    - name: token_swapper
      options:
        trials: 4
        seed: 11
    - basic
"#,
    )
    .unwrap();
    let op = HighLevelOperation::permutation(vec![3, 2, 1, 0]).unwrap();
    let circuit = single_op("reverse", 4, op);
    let properties = PropertySet::new().with_target(CouplingMap::linear(4), BasisGates::universal());

    let pass = HighLevelSynthesis::new(config);
    let synthesized = pass.run_on_circuit(&circuit, &properties).unwrap();
    let coupling = CouplingMap::linear(4);
    for inst in synthesized.instructions() {
        assert_eq!(inst.name(), "swap");
        assert!(coupling.is_connected(inst.qubits[0].index(), inst.qubits[1].index()));
    }
    assert!(equivalent(&synthesized, &circuit, false).unwrap());

    // Same seed, same circuit.
    assert_eq!(pass.run_on_circuit(&circuit, &properties).unwrap(), synthesized);
}

#[test]
fn test_configuration_file_round_trip() {
    let config = HlsConfig::new()
        .with_default_on_unspecified(false)
        .with_methods(Family::Mcx, vec![MethodSpec::new("noaux_v24")]);
    let path = std::env::temp_dir().join(format!("arvak_hls_config_{}.yaml", std::process::id()));
    std::fs::write(&path, config.to_yaml().unwrap()).unwrap();
    let loaded = HlsConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, config);

    let err = HlsConfig::from_file(path.with_extension("toml")).unwrap_err();
    assert!(matches!(err, HlsError::Io(_)));
}

#[test]
fn test_mixed_circuit_reaches_minimal_basis() {
    let mut circuit = Circuit::with_size("mixed", 8, 1);
    circuit
        .h(QubitId(0))
        .unwrap()
        .high_level(
            HighLevelOperation::IntegerComparator {
                num_state_qubits: 3,
                value: 5,
                geq: true,
            },
            arvak_ir::qubits(0..4),
        )
        .unwrap()
        .high_level(
            HighLevelOperation::mcmt(StandardGate::Y, 2, 2).unwrap(),
            arvak_ir::qubits(2..6),
        )
        .unwrap()
        .high_level(HighLevelOperation::qft(3), arvak_ir::qubits(4..7))
        .unwrap()
        .high_level(
            HighLevelOperation::permutation(vec![1, 2, 0]).unwrap(),
            arvak_ir::qubits(5..8),
        )
        .unwrap()
        .measure(QubitId(7), arvak_ir::ClbitId(0))
        .unwrap();

    let synthesized = synthesize_minimal(&circuit);
    assert_eq!(synthesized.num_qubits(), 8);
    assert_eq!(synthesized.num_clbits(), 1);
    assert!(only_basis(&synthesized, &BasisGates::minimal()));
    assert!(synthesized.instructions().last().is_some_and(|inst| inst.is_measure()));
}

#[test]
fn test_comparator_uses_idle_qubits_as_carries() {
    let op = HighLevelOperation::IntegerComparator {
        num_state_qubits: 3,
        value: 5,
        geq: true,
    };
    // Two idle qubits are enough for the carry chain.
    let synthesized = synthesize_minimal(&single_op("cmp", 6, op));
    for x in 0..8 {
        let expected = x | usize::from(x >= 5) << 3;
        assert_eq!(classical_output(&synthesized, x), expected, "x={x}");
    }
}

// ============================================================================
// Advisory warnings
// ============================================================================

/// Helper: a log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Helper: run `f` with WARN events formatted into a buffer.
fn capture_warnings<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    (result, logs)
}

fn run_with_clean(key: &str, op: &HighLevelOperation, clean: usize) -> (PluginResult, String) {
    let registry = PluginRegistry::standard();
    let ctx = ResourceContext::new().with_ancillas(clean, 0);
    capture_warnings(|| registry.run_method(key, op, &ctx).unwrap())
}

#[test]
fn test_twos_comparator_warns_before_declining() {
    let op = HighLevelOperation::IntegerComparator {
        num_state_qubits: 4,
        value: 3,
        geq: true,
    };
    let (result, logs) = run_with_clean("int_comparator.twos", &op, 1);
    assert!(!result.is_applicable());
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("int_comparator.twos needs clean ancillas"), "{logs}");
    assert!(logs.contains("required=3"), "{logs}");

    let (result, logs) = run_with_clean("int_comparator.twos", &op, 3);
    assert!(result.is_applicable());
    assert!(logs.is_empty(), "{logs}");
}

#[test]
fn test_weighted_sum_warns_before_declining() {
    // Σw = 8 needs a 4-bit sum register and three carries.
    let op = HighLevelOperation::weighted_sum(vec![3, 5]).unwrap();
    let (result, logs) = run_with_clean("weighted_sum.default", &op, 2);
    assert!(!result.is_applicable());
    assert!(logs.contains("weighted_sum.default needs clean ancillas"), "{logs}");
    assert!(logs.contains("required=3") && logs.contains("available=2"), "{logs}");

    let (result, logs) = run_with_clean("weighted_sum.default", &op, 3);
    assert!(result.is_applicable());
    assert!(logs.is_empty(), "{logs}");
}

#[test]
fn test_rustiq_warns_on_qdrift() {
    let pauli = SparsePauliOp::from_labels(&[("XX", 1.0)]).unwrap();
    let evolution = PauliEvolution::new(
        vec![PauliOperator::from(pauli)],
        0.3,
        EvolutionSynthesis::QDrift { reps: 2, seed: 1 },
    )
    .unwrap();
    let op = HighLevelOperation::PauliEvolution(evolution);
    let (result, logs) = run_with_clean("pauli_evolution.rustiq", &op, 0);
    assert!(!result.is_applicable());
    assert!(logs.contains("only handles product formulas"), "{logs}");
}
