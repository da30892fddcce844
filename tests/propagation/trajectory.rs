use std::sync::mpsc::channel;

use grav_prop::dynamics::ForceModel;
use grav_prop::linalg::{OVector, U12};
use grav_prop::md::{
    two_body_propagator, Cr3bpSetup, PropSetup, ThreeBodySetup, TrajError, TwoBodySetup,
};
use grav_prop::propagators::Propagator;
use grav_prop::PropagationError;

use super::circular_setup;

#[test]
fn column_schemas() {
    let two_body = circular_setup().propagate().unwrap();
    assert_eq!(
        two_body.column_names(),
        vec!["t", "x1", "y1", "z1", "vx1", "vy1", "vz1", "x2", "y2", "z2", "vx2", "vy2", "vz2"]
    );

    let setup = Cr3bpSetup::earth_moon_demo();
    let restricted = setup.dynamics().unwrap();
    assert_eq!(restricted.dimension(), 6);
    assert_eq!(
        <grav_prop::dynamics::RestrictedThreeBody as ForceModel>::COLUMNS,
        &["x", "y", "z", "vx", "vy", "vz"]
    );

    let three_body = ThreeBodySetup::demo().dynamics().unwrap();
    assert_eq!(three_body.dimension(), 18);
    assert_eq!(
        <grav_prop::dynamics::GeneralThreeBody as ForceModel>::COLUMNS[12..],
        ["x3", "y3", "z3", "vx3", "vy3", "vz3"]
    );
}

#[test]
fn columns_and_arrays_are_row_aligned() {
    let traj = circular_setup().propagate().unwrap();
    assert_eq!(traj.column("t").unwrap(), traj.times());

    let x2 = traj.column("x2").unwrap();
    assert_eq!(x2.len(), traj.len());
    assert_eq!(x2[0], 1.0);
    assert_eq!(x2[traj.len() - 1], traj.last().unwrap().1[6]);
    assert_eq!(
        traj.column("altitude"),
        Err(TrajError::ColumnNotFound {
            name: "altitude".to_string()
        })
    );

    let matrix = traj.to_dmatrix();
    assert_eq!(matrix.shape(), (traj.len(), 12));
    let (states, times) = traj.clone().into_arrays();
    assert_eq!(states, matrix);
    assert_eq!(times, traj.times());
    for (row, state) in traj.states().iter().enumerate() {
        for (col, value) in state.iter().enumerate() {
            assert_eq!(states[(row, col)], *value);
        }
    }
}

#[test]
fn flat_two_body_propagator() {
    let demo = TwoBodySetup::demo();
    let (states, times) = two_body_propagator(
        0.0,
        480.0,
        1e26,
        1e26,
        &demo.initial_conditions,
        6.67259e-11,
        500.0,
        0.8,
        None,
    )
    .unwrap();

    assert_eq!(states.nrows(), times.len());
    assert_eq!(states.ncols(), 12);
    assert_eq!(times[0], 0.0);
    assert_eq!(times[times.len() - 1], 480.0);
    for (j, ic) in demo.initial_conditions.iter().enumerate() {
        assert_eq!(states[(0, j)], *ic);
    }

    // Same result as the typed setup
    let traj = demo.propagate().unwrap();
    assert_eq!(times, traj.times());

    // Validation happens before any integration
    assert!(matches!(
        two_body_propagator(
            0.0,
            480.0,
            1e26,
            1e26,
            &demo.initial_conditions[..6],
            6.67259e-11,
            500.0,
            0.8,
            None,
        ),
        Err(PropagationError::PropConfigError { .. })
    ));
}

#[test]
fn channel_streams_accepted_steps() {
    let setup = circular_setup();
    let traj = setup.propagate().unwrap();

    let prop = Propagator::rkf45(setup.dynamics().unwrap(), setup.problem.prop_opts());
    let state = OVector::<f64, U12>::from_column_slice(&setup.initial_conditions);
    let (tx, rx) = channel();
    let final_state = prop
        .with(setup.problem.t_init, state)
        .until_time_with_channel(setup.problem.t_final, tx)
        .unwrap();

    let streamed: Vec<(f64, OVector<f64, U12>)> = rx.iter().collect();
    assert_eq!(streamed.len(), traj.len() - 1);
    assert_eq!(streamed.last().unwrap().1, final_state);
    for ((t, state), (traj_t, traj_state)) in streamed.iter().zip(traj.iter().skip(1)) {
        assert_eq!(*t, traj_t);
        assert_eq!(state, traj_state);
    }
}

#[test]
fn dropped_receiver_cancels() {
    let setup = circular_setup();
    let prop = Propagator::rkf45(setup.dynamics().unwrap(), setup.problem.prop_opts());
    let state = OVector::<f64, U12>::from_column_slice(&setup.initial_conditions);

    let (tx, rx) = channel();
    drop(rx);
    let err = prop
        .with(setup.problem.t_init, state)
        .until_time_with_channel(setup.problem.t_final, tx)
        .unwrap_err();
    assert!(
        matches!(err, PropagationError::Cancelled { t } if t > 0.0),
        "{err}"
    );
}
