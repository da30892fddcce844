use std::f64::consts::{PI, TAU};

use approx::assert_relative_eq;
use grav_prop::dynamics::TwoBody;
use grav_prop::linalg::{OVector, U12};
use grav_prop::md::{PropSetup, ThreeBodySetup, TwoBodySetup};
use grav_prop::propagators::*;
use grav_prop::utils::linear_momentum;
use grav_prop::{DynamicsError, PropagationError};
use rstest::*;

use super::circular_setup;
use crate::init_logger;

#[fixture]
fn circular_state() -> OVector<f64, U12> {
    OVector::<f64, U12>::from_column_slice(&circular_setup().initial_conditions)
}

#[test]
fn demo_two_body_endpoints() {
    init_logger();
    let setup = TwoBodySetup::demo();
    let traj = setup.propagate().unwrap();
    println!("{traj}");

    let (t0, first) = traj.first().unwrap();
    assert_eq!(t0, 0.0);
    assert_eq!(first.as_slice(), setup.initial_conditions.as_slice());

    let (tf, last) = traj.last().unwrap();
    assert_eq!(tf, 480.0);
    assert!(last.iter().all(|v| v.is_finite()));

    assert!(traj.len() > 2);
    assert_eq!(traj.stats().accepted, traj.len() - 1);
    assert!(traj.times().windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn two_body_momentum_is_conserved() {
    let setup = TwoBodySetup::demo();
    let masses = [setup.mass_1, setup.mass_2];
    let traj = setup.propagate().unwrap();

    let p0 = linear_momentum(&masses, traj.states()[0].as_slice()).unwrap();
    for state in traj.states() {
        let p = linear_momentum(&masses, state.as_slice()).unwrap();
        assert!(
            (p - p0).norm() <= 1e-9 * p0.norm(),
            "momentum drifted from {p0} to {p}"
        );
    }
}

#[test]
fn finer_tolerance_does_not_reduce_points() {
    let coarse = TwoBodySetup::demo();
    let mut fine = coarse.clone();
    fine.problem.tolerance /= 10.0;

    let coarse_len = coarse.propagate().unwrap().len();
    let fine_len = fine.propagate().unwrap().len();
    assert!(
        fine_len >= coarse_len,
        "{fine_len} points at fine tolerance, {coarse_len} at coarse tolerance"
    );
}

#[rstest]
#[case(0.05, 141)]
#[case(0.1, 71)]
#[case(0.25, 29)]
#[case(0.03, 235)]
#[case(10.0, 2)]
fn fixed_step_count(#[case] step: f64, #[case] expected: usize) {
    let mut setup = circular_setup();
    setup.problem.step_size = Some(step);
    let traj = setup.propagate().unwrap();

    assert_eq!(traj.len(), expected);
    assert_eq!(traj.last().unwrap().0, setup.problem.t_final);
    assert_relative_eq!(
        traj.times()[1] - traj.times()[0],
        step.min(setup.problem.t_final),
        max_relative = 1e-12
    );
    assert_eq!(traj.stats().rejected, 0);
}

#[rstest]
#[case(1000.0, 0.01, 100_001)]
#[case(100.0, 0.001, 100_001)]
#[case(1000.0, 0.1, 10_001)]
fn long_fixed_step_count(
    #[case] t_final: f64,
    #[case] step: f64,
    #[case] expected: usize,
) {
    let mut setup = circular_setup();
    setup.problem.t_final = t_final;
    setup.problem.step_size = Some(step);
    let traj = setup.propagate().unwrap();

    assert_eq!(traj.len(), expected);
    assert_eq!(traj.last().unwrap().0, t_final);
    // Every interval is a full step, including the last one
    for w in traj.times().windows(2) {
        assert_relative_eq!(w[1] - w[0], step, max_relative = 1e-6);
    }
}

#[rstest]
fn max_step_bounds_adaptive_steps(circular_state: OVector<f64, U12>) {
    let opts = PropOpts::<LargestError>::builder()
        .tolerance(1e-6)
        .max_step(0.05)
        .build();
    let prop = Propagator::rkf45(TwoBody::from_gm(1.0, 0.0), opts);
    let traj = prop.with(0.0, circular_state).until_time_with_traj(3.0).unwrap();

    // A span of 3 cannot be covered in fewer than 60 steps of 0.05
    assert!(traj.len() >= 61, "{} samples", traj.len());
    for w in traj.times().windows(2) {
        assert!(w[1] - w[0] <= 0.05 * (1.0 + 1e-9), "step of {}", w[1] - w[0]);
    }
    assert_eq!(traj.last().unwrap().0, 3.0);
}

#[test]
fn relative_energy_is_conserved() {
    let mut setup = circular_setup();
    setup.problem.tolerance = 1e-10;
    let dynamics = setup.dynamics().unwrap();
    let traj = setup.propagate().unwrap();

    let e0 = dynamics.relative_energy(&traj.states()[0]);
    assert_relative_eq!(e0, -0.5, max_relative = 1e-9);
    for state in traj.states() {
        assert_relative_eq!(dynamics.relative_energy(state), e0, max_relative = 1e-6);
    }
}

#[rstest]
fn vanishing_step_underflows(circular_state: OVector<f64, U12>) {
    let prop = Propagator::default(TwoBody::from_gm(1.0, 0.0));
    let mut instance = prop.with(1.0, circular_state);
    instance.set_step(1e-20, false);

    let err = instance.until_time(2.0).unwrap_err();
    assert!(
        matches!(err, PropagationError::StepUnderflow { t, .. } if t == 1.0),
        "{err}"
    );
    assert_eq!(instance.stats.accepted, 0);
}

#[rstest]
fn circular_orbit_closes(circular_state: OVector<f64, U12>) {
    let prop = Propagator::default(TwoBody::from_gm(1.0, 0.0));
    let mut opts = prop.opts;
    opts.tolerance = 1e-10;
    let prop = Propagator::rkf45(prop.dynamics, opts);

    let mut instance = prop.with(0.0, circular_state);
    let final_state = instance.until_time(TAU).unwrap();
    assert_eq!(instance.t, TAU);

    for i in 0..12 {
        assert!(
            (final_state[i] - circular_state[i]).abs() < 1e-6,
            "component {i}: {} != {}",
            final_state[i],
            circular_state[i]
        );
    }
    assert!(instance.stats.accepted > 0);
    assert!(instance.latest_details().error <= 1e-10);
}

#[rstest]
fn embedded_methods_agree(circular_state: OVector<f64, U12>) {
    let dynamics = TwoBody::from_gm(1.0, 0.0);
    let opts = PropOpts::with_tolerance(1e-10);

    let rkf = Propagator::rkf45(dynamics, opts)
        .with(0.0, circular_state)
        .until_time(PI)
        .unwrap();
    let cash_karp = Propagator::new::<CashKarp45>(dynamics, opts)
        .with(0.0, circular_state)
        .until_time(PI)
        .unwrap();

    // Half an orbit later, the light body is on the other side
    assert!((rkf[6] + 1.0).abs() < 1e-6);
    assert!((rkf[10] + 1.0).abs() < 1e-6);
    assert!((rkf - cash_karp).amax() < 1e-6);
}

#[rstest]
fn rss_error_control(circular_state: OVector<f64, U12>) {
    let opts = PropOpts::with_adaptive_step(1e-9, 0.9, RSSError);
    let prop = Propagator::rkf45(TwoBody::from_gm(1.0, 0.0), opts);
    let final_state = prop.with(0.0, circular_state).until_time(PI).unwrap();
    assert!((final_state[6] + 1.0).abs() < 1e-6);
}

#[rstest]
fn single_steps(circular_state: OVector<f64, U12>) {
    let prop = Propagator::default(TwoBody::from_gm(1.0, 0.0));
    let mut instance = prop.with(0.0, circular_state);

    // No step size and no stop time to infer one from
    assert!(matches!(
        instance.single_step(),
        Err(PropagationError::PropConfigError { .. })
    ));

    instance.set_step(0.01, false);
    instance.single_step().unwrap();
    let first_t = instance.t;
    assert!(first_t > 0.0 && first_t <= 0.01);
    instance.single_step().unwrap();
    assert!(instance.t > first_t);
    assert_eq!(instance.stats.accepted, 2);
}

#[rstest]
fn collapsing_step_fails(circular_state: OVector<f64, U12>) {
    init_logger();
    let opts = PropOpts::<LargestError>::builder()
        .tolerance(1e-30)
        .attempts(3)
        .build();
    let prop = Propagator::rkf45(TwoBody::from_gm(1.0, 0.0), opts);

    let err = prop.with(0.0, circular_state).until_time(1.0).unwrap_err();
    assert!(
        matches!(err, PropagationError::NonConvergence { attempts: 3, t, .. } if t == 0.0),
        "{err}"
    );
}

#[rstest]
fn backward_propagation_is_rejected(circular_state: OVector<f64, U12>) {
    let prop = Propagator::default(TwoBody::from_gm(1.0, 0.0));
    let mut instance = prop.with(1.0, circular_state);
    assert!(matches!(
        instance.until_time(0.5),
        Err(PropagationError::PropConfigError { .. })
    ));
    // Nothing to do when already at the stop time
    assert_eq!(instance.until_time(1.0).unwrap(), circular_state);
    assert_eq!(instance.stats.accepted, 0);
}

#[test]
fn coincident_bodies_are_singular() {
    let mut setup = circular_setup();
    setup.initial_conditions[6] = 0.0;

    match setup.propagate() {
        Err(PropagationError::Dynamics { source }) => assert_eq!(
            source,
            DynamicsError::Singularity {
                t: 0.0,
                bodies: "bodies 1 and 2"
            }
        ),
        other => panic!("expected a singularity, got {other:?}"),
    }
}

#[test]
fn three_body_demo() {
    let setup = ThreeBodySetup::demo();
    let traj = setup.propagate().unwrap();
    assert_eq!(traj.last().unwrap().0, 7.0);

    // The total momentum is initially zero
    let masses = [setup.mass_1, setup.mass_2, setup.mass_3];
    for state in traj.states() {
        let momentum = linear_momentum(&masses, state.as_slice()).unwrap();
        assert!(momentum.norm() < 1e-9);
    }
}
