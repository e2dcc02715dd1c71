//! Behavioural tests for engine supervision against real processes.

use std::cell::RefCell;
use std::fs;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use crate::engine::{EngineError, EngineStatus};

use super::support::{self, FakeEngine, TestWorld, spawn_count, wait_until};

const CUSTOM_CONFIG: &str = "DataStores: []\n";

#[fixture]
fn world() -> RefCell<TestWorld> {
    support::world()
}

#[given("a long-running engine")]
fn given_long_running(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_engine(FakeEngine::LongRunning);
}

#[given("a crashing engine")]
fn given_crashing(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_engine(FakeEngine::Crashing);
}

#[given("a missing engine")]
fn given_missing(world: &RefCell<TestWorld>) {
    world.borrow_mut().use_engine(FakeEngine::Missing);
}

#[when("the engine is started")]
fn when_started(world: &RefCell<TestWorld>) {
    world.borrow_mut().start_engine();
}

#[when("{callers} callers start the engine at once")]
fn when_started_concurrently(world: &RefCell<TestWorld>, callers: String) {
    world.borrow_mut().start_engine_concurrently(parse(&callers));
}

#[when("the engine is stopped")]
fn when_stopped(world: &RefCell<TestWorld>) {
    world.borrow_mut().stop_engine();
}

#[when("the engine state is queried")]
fn when_queried(world: &RefCell<TestWorld>) {
    world.borrow_mut().query_engine();
}

#[when("the engine configuration is customised")]
fn when_config_customised(world: &RefCell<TestWorld>) {
    let path = world.borrow().data_dir().join("xcube-server.yaml");
    fs::write(path, CUSTOM_CONFIG).expect("customise engine configuration");
}

#[then("exactly {count} engine was launched")]
fn then_launched_once(world: &RefCell<TestWorld>, count: String) {
    assert_launches(world, parse(&count));
}

#[then("exactly {count} engines were launched")]
fn then_launched(world: &RefCell<TestWorld>, count: String) {
    assert_launches(world, parse(&count));
}

#[then("every start reports the same pid")]
fn then_same_pid(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    let pids: Vec<_> = world
        .engine_results()
        .iter()
        .map(|result| result.as_ref().expect("start succeeded").record.pid)
        .collect();
    assert!(pids.len() > 1, "expected several starts, saw {}", pids.len());
    assert!(pids[0].is_some());
    assert!(pids.iter().all(|pid| *pid == pids[0]), "pids differ: {pids:?}");
}

#[then("the engine is reported as not started")]
fn then_not_started(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(matches!(
        world.last_engine_result(),
        Err(EngineError::NotStarted)
    ));
}

#[then("the engine is eventually reported as gone")]
fn then_eventually_gone(world: &RefCell<TestWorld>) {
    let mut world = world.borrow_mut();
    let gone = wait_until(|| {
        world.query_engine();
        matches!(
            world.last_engine_result(),
            Ok(state) if state.status == EngineStatus::Gone && state.exit_code.is_some()
        )
    });
    assert!(gone, "engine still reported as {:?}", world.last_engine_result());
}

#[then("the captured stderr contains \"{text}\"")]
fn then_stderr_contains(world: &RefCell<TestWorld>, text: String) {
    let world = world.borrow();
    let state = world.last_engine_result().as_ref().expect("engine state");
    let stderr = state.stderr.as_deref().unwrap_or_default();
    assert!(stderr.contains(&text), "stderr was {stderr:?}");
}

#[then("the exit code is {code}")]
fn then_exit_code(world: &RefCell<TestWorld>, code: String) {
    let world = world.borrow();
    let state = world.last_engine_result().as_ref().expect("engine state");
    assert_eq!(state.exit_code, Some(parse::<i32>(&code)));
}

#[then("the start fails with a launch error")]
fn then_launch_error(world: &RefCell<TestWorld>) {
    let world = world.borrow();
    assert!(matches!(
        world.last_engine_result(),
        Err(EngineError::Launch { .. })
    ));
}

#[then("no engine record exists")]
fn then_no_record(world: &RefCell<TestWorld>) {
    assert!(!world.borrow().data_dir().join("server-info.json").exists());
}

#[then("the engine configuration is still customised")]
fn then_config_preserved(world: &RefCell<TestWorld>) {
    let path = world.borrow().data_dir().join("xcube-server.yaml");
    assert_eq!(
        fs::read_to_string(path).expect("read engine configuration"),
        CUSTOM_CONFIG
    );
}

fn parse<T>(raw: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw.parse() {
        Ok(value) => value,
        Err(error) => panic!("invalid step value '{raw}': {error}"),
    }
}

fn assert_launches(world: &RefCell<TestWorld>, count: usize) {
    let data_dir = world.borrow().data_dir();
    assert!(
        wait_until(|| spawn_count(&data_dir) == count),
        "expected {count} launches, saw {}",
        spawn_count(&data_dir)
    );
}

#[scenario(
    path = "tests/features/engine_lifecycle.feature",
    name = "Starting twice launches one engine"
)]
fn starting_twice_launches_one_engine(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/engine_lifecycle.feature",
    name = "Concurrent starts launch one engine"
)]
fn concurrent_starts_launch_one_engine(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/engine_lifecycle.feature",
    name = "Stopping forgets the engine"
)]
fn stopping_forgets_the_engine(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/engine_lifecycle.feature",
    name = "Stopping without a start is rejected"
)]
fn stopping_without_start_is_rejected(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/engine_lifecycle.feature",
    name = "A crashed engine is reported as gone with its output"
)]
fn crashed_engine_is_reported_gone(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/engine_lifecycle.feature",
    name = "A missing engine binary fails to launch"
)]
fn missing_engine_fails_to_launch(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/engine_lifecycle.feature",
    name = "A gone engine is replaced on start"
)]
fn gone_engine_is_replaced(world: RefCell<TestWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/engine_lifecycle.feature",
    name = "The default engine configuration is written once"
)]
fn default_configuration_is_written_once(world: RefCell<TestWorld>) {
    drop(world);
}
