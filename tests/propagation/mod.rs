use grav_prop::md::{IntegrationProblem, TwoBodySetup};

mod propagators;
mod restricted;
mod trajectory;

/// A light body on a circular orbit of unit radius about a unit gravitational parameter, over
/// a bit more than one period.
pub(crate) fn circular_setup() -> TwoBodySetup {
    TwoBodySetup::builder()
        .problem(
            IntegrationProblem::builder()
                .t_init(0.0)
                .t_final(7.0)
                .tolerance(1e-6)
                .build(),
        )
        .mass_1(1.0)
        .mass_2(1e-12)
        .grav_constant(1.0)
        .initial_conditions(vec![
            0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // body 1
            1.0, 0.0, 0.0, 0.0, 1.0, 0.0, // body 2
        ])
        .build()
}
