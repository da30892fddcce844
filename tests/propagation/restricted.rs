use std::f64::consts::TAU;

use grav_prop::dynamics::{RestrictedThreeBody, TwoBody};
use grav_prop::linalg::{OVector, U12, U6};
use grav_prop::md::{Cr3bpSetup, PropSetup};
use grav_prop::propagators::{PropOpts, Propagator};
use grav_prop::{DynamicsError, PropagationError};

use crate::init_logger;

#[test]
fn restricted_without_rotation_is_keplerian() {
    init_logger();
    let opts = PropOpts::with_tolerance(1e-10);

    // Single attracting primary at the origin, and a non rotating frame
    let cr3bp = RestrictedThreeBody::from_parameters(1.0, 0.0, 100.0, 0.0);
    assert_eq!(cr3bp.pi_2(), 0.0);
    let restricted = Propagator::rkf45(cr3bp, opts)
        .with(
            0.0,
            OVector::<f64, U6>::from_column_slice(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]),
        )
        .until_time_with_traj(TAU)
        .unwrap();

    let two_body = Propagator::rkf45(TwoBody::from_gm(1.0, 0.0), opts)
        .with(
            0.0,
            OVector::<f64, U12>::from_column_slice(&[
                0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0,
            ]),
        )
        .until_time_with_traj(TAU)
        .unwrap();

    let (_, restricted_final) = restricted.last().unwrap();
    let (_, two_body_final) = two_body.last().unwrap();
    for i in 0..6 {
        assert!(
            (restricted_final[i] - two_body_final[i + 6]).abs() < 1e-6,
            "component {i}: {} != {}",
            restricted_final[i],
            two_body_final[i + 6]
        );
    }
    // One full period later, back at the start
    assert!((restricted_final[0] - 1.0).abs() < 1e-6);
    assert!((restricted_final[4] - 1.0).abs() < 1e-6);
}

#[test]
fn jacobi_constant_is_conserved() {
    let cr3bp = RestrictedThreeBody::from_parameters(0.98785, 0.01215, 1.0, 1.0);
    let (primary_1, _) = cr3bp.primaries();
    let radius = 0.3;
    let speed = (cr3bp.mu_1() / radius).sqrt() - (primary_1[0] + radius);
    let state = OVector::<f64, U6>::from_column_slice(&[
        primary_1[0] + radius,
        0.0,
        0.0,
        0.0,
        speed,
        0.0,
    ]);

    let traj = Propagator::rkf45(cr3bp, PropOpts::with_tolerance(1e-10))
        .with(0.0, state)
        .until_time_with_traj(10.0)
        .unwrap();

    let jacobi_0 = cr3bp.jacobi_constant(&state);
    for (t, state) in traj.iter() {
        let jacobi = cr3bp.jacobi_constant(state);
        assert!(
            (jacobi - jacobi_0).abs() < 1e-6,
            "Jacobi constant drifted from {jacobi_0} to {jacobi} at t = {t}"
        );
    }
}

#[test]
fn starting_on_a_primary_is_singular() {
    let mut setup = Cr3bpSetup::earth_moon_demo();
    let (earth, _) = setup.dynamics().unwrap().primaries();
    setup.initial_conditions[0] = earth[0];
    setup.initial_conditions[1] = 0.0;

    match setup.propagate() {
        Err(PropagationError::Dynamics { source }) => assert_eq!(
            source,
            DynamicsError::Singularity {
                t: 0.0,
                bodies: "the body and primary 1"
            }
        ),
        other => panic!("expected a singularity, got {other:?}"),
    }
}
