//! Fuzz target: scenario files
//!
//! Arbitrary JSON is parsed as a scenario and, when it parses, run with a
//! small dispatch budget. Neither step may panic.
//!
//! Run: cargo +nightly fuzz run fuzz_scenario

#![no_main]
use libfuzzer_sys::fuzz_target;
use tip3_vm::scenario::{Scenario, ScenarioRunner};
use tip3_vm::SimConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(mut scenario) = serde_json::from_slice::<Scenario>(data) else {
        return;
    };
    let mut config = scenario.config.take().unwrap_or_default();
    config.max_dispatch_steps = config.max_dispatch_steps.min(500);
    scenario.config = Some(config);
    let _ = ScenarioRunner::new(SimConfig::default()).run(&scenario);
});
