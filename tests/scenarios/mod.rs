use grav_prop::io::{ConfigError, ConfigRepr};
use grav_prop::md::{propagate_batch, Cr3bpSetup, PropSetup, ThreeBodySetup, TwoBodySetup};
use grav_prop::propagators::{DEFAULT_BETA, DEFAULT_TOLERANCE};
use grav_prop::PropagationError;
use rstest::*;

use crate::{data_path, init_logger};

#[test]
fn load_two_body_scenarios() {
    init_logger();
    let setups = TwoBodySetup::load_many(data_path("two_body.yaml")).unwrap();
    assert_eq!(setups.len(), 2);
    assert_eq!(setups[0], TwoBodySetup::demo());

    let fixed = &setups[1];
    assert_eq!(fixed.problem.step_size, Some(0.05));
    assert_eq!(fixed.problem.tolerance, DEFAULT_TOLERANCE);
    assert_eq!(fixed.problem.beta, DEFAULT_BETA);
    assert_eq!(fixed.propagate().unwrap().len(), 141);
}

#[test]
fn load_named_three_body_scenarios() {
    let setups = ThreeBodySetup::load_named(data_path("three_body.yaml")).unwrap();
    assert_eq!(setups.len(), 2);
    assert_eq!(setups["figure_eight"], ThreeBodySetup::demo());
    assert_eq!(setups["short"].problem.t_final, 1.0);
}

#[test]
fn missing_or_malformed_files() {
    assert!(matches!(
        TwoBodySetup::load(data_path("does_not_exist.yaml")),
        Err(ConfigError::ReadError { .. })
    ));
    // A list is not a single setup
    assert!(matches!(
        TwoBodySetup::load(data_path("two_body.yaml")),
        Err(ConfigError::ParseError { .. })
    ));
}

#[test]
fn restricted_scenario_roundtrip() {
    let demo = Cr3bpSetup::earth_moon_demo();
    let yaml = serde_yaml::to_string(&vec![demo.clone()]).unwrap();
    // Fixed step is not serialized when unset
    assert!(!yaml.contains("step_size"));
    let loaded = Cr3bpSetup::loads_many(&yaml).unwrap();
    assert_eq!(loaded, vec![demo]);
}

#[fixture]
fn batch() -> Vec<TwoBodySetup> {
    let data = r#"
- t_init: 0.0
  t_final: 7.0
  tolerance: 1.0e-6
  mass_1: 1.0
  mass_2: 1.0e-12
  grav_constant: 1.0
  initial_conditions: [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
- t_init: 0.0
  t_final: 7.0
  mass_1: 0.0
  mass_2: 1.0
  grav_constant: 1.0
  initial_conditions: [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
- t_init: 0.0
  t_final: 3.0
  tolerance: 1.0e-8
  mass_1: 1.0
  mass_2: 1.0
  grav_constant: 1.0
  initial_conditions: [-1.0, 0.0, 0.0, 0.0, -0.5, 0.0, 1.0, 0.0, 0.0, 0.0, 0.5, 0.0]
"#;
    TwoBodySetup::loads_many(data).unwrap()
}

#[rstest]
fn batch_runs_are_independent(batch: Vec<TwoBodySetup>) {
    init_logger();
    let results = propagate_batch(&batch);
    assert_eq!(results.len(), batch.len());

    // Order is preserved, and the invalid setup only fails its own run
    for (setup, result) in batch.iter().zip(results.iter()) {
        match result {
            Ok(traj) => {
                assert_eq!(traj.last().unwrap().0, setup.problem.t_final);
                let single = setup.propagate().unwrap();
                assert_eq!(traj.times(), single.times());
                assert_eq!(traj.last().unwrap().1, single.last().unwrap().1);
            }
            Err(e) => {
                assert_eq!(setup.mass_1, 0.0);
                assert!(
                    matches!(e, PropagationError::PropConfigError { .. }),
                    "{e}"
                );
            }
        }
    }
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
}
