use stabsim_core::{
    BaseCase, ChannelMode, ContingencyRegistry, DisturbanceKind, EngineOutcome, Megawatts,
    Seconds, SimulationCase,
};
use stabsim_engine::{EngineCommand, EngineFault, EngineSession, ScriptedEngine};
use stabsim_sim::{ControllerState, RunDriver, RunOptions};
use std::path::Path;
use tempfile::TempDir;

fn case(dir: &Path, name: &str, kind: DisturbanceKind) -> SimulationCase {
    let directory = dir.join(name);
    std::fs::create_dir_all(&directory).unwrap();
    let sav = directory.join("ieee9.sav");
    let dyr = directory.join("ieee9.dyr");
    std::fs::write(&sav, "").unwrap();
    std::fs::write(&dyr, "").unwrap();
    SimulationCase {
        name: name.to_string(),
        directory,
        base_case: BaseCase::Saved(sav),
        dynamics: Some(dyr),
        disturbance: kind,
        channel_mode: ChannelMode::All,
        runtime: Seconds(20.0),
    }
}

fn open(engine: ScriptedEngine) -> ScriptedEngine {
    let mut engine = engine;
    engine.open().unwrap();
    engine
}

#[test]
fn line_trip_run_produces_all_channel_groups() {
    let dir = TempDir::new().unwrap();
    let case = case(dir.path(), "case_NRE", DisturbanceKind::LineFault);
    let resolved = ContingencyRegistry::builtin().resolve(&case.name, case.disturbance);
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new());
    let run = RunDriver::default()
        .run(&mut engine, &case, resolved.disturbance.as_ref(), &output)
        .unwrap();

    assert_eq!(run.outcome, EngineOutcome::Converged);
    assert_eq!(engine.advance_times(), vec![1.0, 1.17, 20.0]);
    assert!(run.disturbance_issue.is_none());
    assert_eq!(run.transitions.last(), Some(&ControllerState::Done));
    // 3 machines x (power, speed) + 9 buses x (frequency, voltage)
    assert_eq!(run.dump.channel_count(), 3 * 2 + 9 * 2);
    assert_eq!(run.dump.time().last(), Some(&20.0));
    assert_eq!(engine.reads(), &[output]);

    assert!(engine.calls().iter().any(|call| matches!(
        call,
        EngineCommand::TripBranch { from_bus, to_bus, .. }
            if from_bus.value() == 5 && to_bus.value() == 7
    )));
}

#[test]
fn command_sequence_follows_engine_setup_order() {
    let dir = TempDir::new().unwrap();
    let case = case(dir.path(), "case_NRE", DisturbanceKind::LineFault);
    let resolved = ContingencyRegistry::builtin().resolve(&case.name, case.disturbance);
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new());
    RunDriver::default()
        .run(&mut engine, &case, resolved.disturbance.as_ref(), &output)
        .unwrap();

    let setup: Vec<&str> = engine.ops().into_iter().take(12).collect();
    assert_eq!(
        setup,
        vec![
            "initialize",
            "load_case",
            "solve_power_flow",
            "convert_generators",
            "convert_loads",
            "convert_loads",
            "convert_loads",
            "factorize_network",
            "load_dynamics",
            "delete_channels",
            "configure_channels",
            "start_dynamic_run",
        ]
    );
}

#[test]
fn generator_change_sets_only_active_power() {
    let dir = TempDir::new().unwrap();
    let case = case(dir.path(), "case_RE", DisturbanceKind::GenChange);
    let resolved = ContingencyRegistry::builtin().resolve(&case.name, case.disturbance);
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new());
    RunDriver::default()
        .run(&mut engine, &case, resolved.disturbance.as_ref(), &output)
        .unwrap();

    let change = engine
        .calls()
        .iter()
        .find_map(|call| match call {
            EngineCommand::ChangeMachinePower {
                bus, active_power, ..
            } => Some((bus.value(), *active_power)),
            _ => None,
        })
        .unwrap();
    assert_eq!(change, (2, Megawatts(217.0)));
    assert_eq!(engine.advance_times(), vec![1.0, 20.0]);
}

#[test]
fn non_zero_status_codes_do_not_stop_the_run() {
    let dir = TempDir::new().unwrap();
    let case = case(dir.path(), "case_NRE", DisturbanceKind::LineFault);
    let resolved = ContingencyRegistry::builtin().resolve(&case.name, case.disturbance);
    let output = dir.path().join("run.outx");

    let mut engine = open(
        ScriptedEngine::new()
            .with_status("solve_power_flow", 2)
            .with_status("load_dynamics", 1),
    );
    let run = RunDriver::default()
        .run(&mut engine, &case, resolved.disturbance.as_ref(), &output)
        .unwrap();

    assert_eq!(run.statuses.non_zero().count(), 3); // the trip leaves nothing to clear
    assert_eq!(engine.advance_times(), vec![1.0, 1.17, 20.0]);
    assert_eq!(run.outcome, EngineOutcome::Converged);
}

#[test]
fn non_convergence_outranks_initial_conditions_marker() {
    let dir = TempDir::new().unwrap();
    let case = case(dir.path(), "case_NRE", DisturbanceKind::LineFault);
    let resolved = ContingencyRegistry::builtin().resolve(&case.name, case.disturbance);
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new().inject_output("advance", "Network not converged"));
    let run = RunDriver::default()
        .run(&mut engine, &case, resolved.disturbance.as_ref(), &output)
        .unwrap();

    assert!(run.diagnostics.contains("INITIAL CONDITIONS CHECK O.K."));
    assert_eq!(run.outcome, EngineOutcome::NotConverged);
    // data is still read back for export
    assert!(run.dump.channel_count() > 0);
}

#[test]
fn unknown_pair_runs_without_disturbance() {
    let dir = TempDir::new().unwrap();
    let case = case(dir.path(), "case_X", DisturbanceKind::LineFault);
    let resolved = ContingencyRegistry::builtin().resolve(&case.name, case.disturbance);
    assert!(resolved.is_unknown());
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new());
    let run = RunDriver::default()
        .run(&mut engine, &case, resolved.disturbance.as_ref(), &output)
        .unwrap();

    assert!(run
        .disturbance_issue
        .as_ref()
        .is_some_and(|issue| issue.is_configuration()));
    assert_eq!(engine.advance_times(), vec![1.0, 20.0]);
    assert!(!run.transitions.contains(&ControllerState::Applied));
}

#[test]
fn captures_do_not_leak_between_runs() {
    let dir = TempDir::new().unwrap();
    let nre = case(dir.path(), "case_NRE", DisturbanceKind::LineFault);
    let re = case(dir.path(), "case_RE", DisturbanceKind::LineFault);
    let registry = ContingencyRegistry::builtin();
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new().inject_case_output("case_NRE", "advance", "NaN"));
    let driver = RunDriver::default();

    let first = driver
        .run(
            &mut engine,
            &nre,
            registry.resolve(&nre.name, nre.disturbance).disturbance.as_ref(),
            &output,
        )
        .unwrap();
    let second = driver
        .run(
            &mut engine,
            &re,
            registry.resolve(&re.name, re.disturbance).disturbance.as_ref(),
            &output,
        )
        .unwrap();

    assert_eq!(first.outcome, EngineOutcome::NumericalFailure);
    assert_eq!(second.outcome, EngineOutcome::Converged);
    assert!(!second.diagnostics.contains("NaN"));
}

#[test]
fn host_fault_aborts_run_and_releases_capture() {
    let dir = TempDir::new().unwrap();
    let case = case(dir.path(), "case_NRE", DisturbanceKind::LineFault);
    let resolved = ContingencyRegistry::builtin().resolve(&case.name, case.disturbance);
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new().fail_on("clear_fault"));
    let err = RunDriver::default()
        .run(&mut engine, &case, resolved.disturbance.as_ref(), &output)
        .unwrap_err();

    assert!(matches!(err, EngineFault::Host { ref command, .. } if command == "clear_fault"));
    assert!(!engine.diagnostics_mut().is_capturing());
    assert!(engine.reads().is_empty());
}

#[test]
fn raw_base_case_is_read_not_loaded() {
    let dir = TempDir::new().unwrap();
    let mut case = case(dir.path(), "case_NRE", DisturbanceKind::LineFault);
    let raw = case.directory.join("ieee9.raw");
    std::fs::write(&raw, "").unwrap();
    case.base_case = BaseCase::Raw(raw.clone());
    case.dynamics = None;
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new());
    let options = RunOptions {
        capacity: 50_000,
        ..RunOptions::default()
    };
    RunDriver::new(options)
        .run(&mut engine, &case, None, &output)
        .unwrap();

    assert_eq!(engine.calls()[0], EngineCommand::Initialize { capacity: 50_000 });
    assert_eq!(engine.calls()[1], EngineCommand::ReadRaw { path: raw });
    assert!(!engine.ops().contains(&"load_dynamics"));
}

#[test]
fn channel_mode_none_configures_nothing() {
    let dir = TempDir::new().unwrap();
    let mut case = case(dir.path(), "case_NRE", DisturbanceKind::LineFault);
    case.channel_mode = ChannelMode::None;
    let output = dir.path().join("run.outx");

    let mut engine = open(ScriptedEngine::new());
    let run = RunDriver::default()
        .run(&mut engine, &case, None, &output)
        .unwrap();

    assert!(!engine.ops().contains(&"configure_channels"));
    assert_eq!(run.dump.channel_count(), 0);
}

#[test]
fn back_to_back_runs_start_from_a_clean_session() {
    let dir = TempDir::new().unwrap();
    let first = case(dir.path(), "case_NRE", DisturbanceKind::GenChange);
    let second = case(dir.path(), "case_RE", DisturbanceKind::GenChange);
    let registry = ContingencyRegistry::builtin();
    let driver = RunDriver::default();

    let run_on = |engine: &mut ScriptedEngine, case: &SimulationCase| {
        let resolved = registry.resolve(&case.name, case.disturbance);
        let output = dir.path().join(format!("{}.outx", case.name));
        driver
            .run(engine, case, resolved.disturbance.as_ref(), &output)
            .unwrap()
    };

    let mut solo_engine = open(ScriptedEngine::new());
    let solo = run_on(&mut solo_engine, &second);

    let mut shared = open(ScriptedEngine::new());
    run_on(&mut shared, &first);
    let after = run_on(&mut shared, &second);

    let power = after
        .dump
        .labels
        .iter()
        .position(|label| label.starts_with("POWR 2["))
        .unwrap();
    assert_eq!(after.dump.samples[power][0], 120.0);
    assert_eq!(after.dump, solo.dump);
    assert_eq!(after.outcome, solo.outcome);
}
