/*
    grav-prop, adaptive propagation of gravitational N-body dynamics
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

extern crate serde_derive;

use self::serde_derive::{Deserialize, Serialize};
use crate::dynamics::{
    ForceModel, GeneralThreeBody, RestrictedThreeBody, TwoBody, GRAV_CONSTANT,
};
use crate::io::{ConfigError, ConfigRepr, InvalidConfigSnafu, StateDimensionSnafu};
use crate::linalg::allocator::Allocator;
use crate::linalg::{DMatrix, DefaultAllocator, OVector};
use crate::md::trajectory::Trajectory;
use crate::propagators::{
    LargestError, PropConfigSnafu, PropOpts, PropagationError, Propagator, DEFAULT_BETA,
    DEFAULT_TOLERANCE,
};
use snafu::prelude::*;
use typed_builder::TypedBuilder;

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_beta() -> f64 {
    DEFAULT_BETA
}

fn default_grav_constant() -> f64 {
    GRAV_CONSTANT
}

/// Time span and integrator settings shared by all of the setups.
///
/// When `step_size` is set, the propagation uses that fixed step and ignores the tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct IntegrationProblem {
    pub t_init: f64,
    pub t_final: f64,
    #[serde(default = "default_tolerance")]
    #[builder(default = DEFAULT_TOLERANCE)]
    pub tolerance: f64,
    #[serde(default = "default_beta")]
    #[builder(default = DEFAULT_BETA)]
    pub beta: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(strip_option))]
    pub step_size: Option<f64>,
}

impl IntegrationProblem {
    /// Checks that the time span and the integrator settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            self.t_init.is_finite() && self.t_final.is_finite() && self.t_final > self.t_init,
            InvalidConfigSnafu {
                msg: format!(
                    "final time ({}) must be after initial time ({})",
                    self.t_final, self.t_init
                )
            }
        );
        ensure!(
            self.tolerance > 0.0 && self.tolerance.is_finite(),
            InvalidConfigSnafu {
                msg: format!("tolerance must be positive but got {}", self.tolerance)
            }
        );
        ensure!(
            self.beta > 0.0 && self.beta < 1.0,
            InvalidConfigSnafu {
                msg: format!("beta must be in (0, 1) but got {}", self.beta)
            }
        );
        if let Some(step) = self.step_size {
            ensure!(
                step > 0.0 && step.is_finite(),
                InvalidConfigSnafu {
                    msg: format!("fixed step size must be positive but got {step}")
                }
            );
        }
        Ok(())
    }

    /// Returns the integrator options matching this problem.
    pub fn prop_opts(&self) -> PropOpts<LargestError> {
        match self.step_size {
            Some(step) => PropOpts::with_fixed_step(step),
            None => PropOpts::<LargestError>::builder()
                .tolerance(self.tolerance)
                .beta(self.beta)
                .build(),
        }
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<(), ConfigError> {
    ensure!(
        value > 0.0 && value.is_finite(),
        InvalidConfigSnafu {
            msg: format!("{name} must be positive but got {value}")
        }
    );
    Ok(())
}

/// A propagation setup: a force model, its initial conditions and the integration problem.
pub trait PropSetup
where
    DefaultAllocator: Allocator<<Self::Dynamics as ForceModel>::Size>,
{
    type Dynamics: ForceModel;

    fn problem(&self) -> &IntegrationProblem;

    /// Initial state, laid out as the columns of the force model.
    fn initial_conditions(&self) -> &[f64];

    /// Validates the physical parameters of this setup and builds its force model.
    fn dynamics(&self) -> Result<Self::Dynamics, ConfigError>;

    /// Validates this setup, then propagates it from `t_init` until `t_final`.
    ///
    /// No integration work is done unless all of the parameters are valid.
    fn propagate(
        &self,
    ) -> Result<Trajectory<<Self::Dynamics as ForceModel>::Size>, PropagationError> {
        let problem = self.problem();
        problem.validate().context(PropConfigSnafu)?;
        let dynamics = self.dynamics().context(PropConfigSnafu)?;

        let ics = self.initial_conditions();
        let expected = dynamics.dimension();
        if ics.len() != expected {
            return StateDimensionSnafu {
                expected,
                got: ics.len(),
            }
            .fail()
            .context(PropConfigSnafu);
        }
        if ics.iter().any(|v| !v.is_finite()) {
            return InvalidConfigSnafu {
                msg: "initial conditions must be finite",
            }
            .fail()
            .context(PropConfigSnafu);
        }

        let state = OVector::<f64, <Self::Dynamics as ForceModel>::Size>::from_column_slice(ics);
        let prop = Propagator::rkf45(dynamics, problem.prop_opts());
        let mut traj = prop
            .with(problem.t_init, state)
            .until_time_with_traj(problem.t_final)?;
        traj.name = Some(format!("{}", prop.dynamics));
        Ok(traj)
    }
}

/// Setup of a two-body propagation, with a state laid out as
/// `[x1, y1, z1, vx1, vy1, vz1, x2, y2, z2, vx2, vy2, vz2]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct TwoBodySetup {
    #[serde(flatten)]
    pub problem: IntegrationProblem,
    pub mass_1: f64,
    pub mass_2: f64,
    #[serde(default = "default_grav_constant")]
    #[builder(default = GRAV_CONSTANT)]
    pub grav_constant: f64,
    pub initial_conditions: Vec<f64>,
}

impl TwoBodySetup {
    /// Two bodies of 1e26 kg, 3000 km apart, over 480 seconds.
    pub fn demo() -> Self {
        Self::builder()
            .problem(
                IntegrationProblem::builder()
                    .t_init(0.0)
                    .t_final(480.0)
                    .tolerance(500.0)
                    .beta(0.8)
                    .build(),
            )
            .mass_1(1e26)
            .mass_2(1e26)
            .initial_conditions(vec![
                0.0, 0.0, 0.0, 10e3, 20e3, 30e3, // body 1
                3000e3, 0.0, 0.0, 0.0, 40e3, 0.0, // body 2
            ])
            .build()
    }
}

impl PropSetup for TwoBodySetup {
    type Dynamics = TwoBody;

    fn problem(&self) -> &IntegrationProblem {
        &self.problem
    }

    fn initial_conditions(&self) -> &[f64] {
        &self.initial_conditions
    }

    fn dynamics(&self) -> Result<TwoBody, ConfigError> {
        ensure_positive("mass_1", self.mass_1)?;
        ensure_positive("mass_2", self.mass_2)?;
        ensure_positive("grav_constant", self.grav_constant)?;
        Ok(TwoBody::new(self.mass_1, self.mass_2, self.grav_constant))
    }
}

impl ConfigRepr for TwoBodySetup {}

/// Setup of a circular restricted three-body propagation, with the state of the massless body
/// in the rotating frame laid out as `[x, y, z, vx, vy, vz]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct Cr3bpSetup {
    #[serde(flatten)]
    pub problem: IntegrationProblem,
    pub mass_1: f64,
    pub mass_2: f64,
    /// Distance between the primaries
    pub r_12: f64,
    #[serde(default = "default_grav_constant")]
    #[builder(default = GRAV_CONSTANT)]
    pub grav_constant: f64,
    pub initial_conditions: Vec<f64>,
}

impl Cr3bpSetup {
    /// A spacecraft departing from a low Earth orbit in the Earth-Moon system, over about
    /// 3.17 days, in kilometers and seconds.
    pub fn earth_moon_demo() -> Self {
        Self::builder()
            .problem(
                IntegrationProblem::builder()
                    .t_init(0.0)
                    .t_final(3.16689 * 86_400.0)
                    .tolerance(10.0)
                    .beta(0.8)
                    .build(),
            )
            .mass_1(5.974e24)
            .mass_2(73.48e21)
            .r_12(384_400.0)
            .grav_constant(6.6759e-20)
            .initial_conditions(vec![-4671.0, -6578.0, 0.0, 10.2565702, -3.73308146, 0.0])
            .build()
    }
}

impl PropSetup for Cr3bpSetup {
    type Dynamics = RestrictedThreeBody;

    fn problem(&self) -> &IntegrationProblem {
        &self.problem
    }

    fn initial_conditions(&self) -> &[f64] {
        &self.initial_conditions
    }

    fn dynamics(&self) -> Result<RestrictedThreeBody, ConfigError> {
        ensure_positive("mass_1", self.mass_1)?;
        ensure_positive("mass_2", self.mass_2)?;
        ensure_positive("r_12", self.r_12)?;
        ensure_positive("grav_constant", self.grav_constant)?;
        Ok(RestrictedThreeBody::new(
            self.mass_1,
            self.mass_2,
            self.r_12,
            self.grav_constant,
        ))
    }
}

impl ConfigRepr for Cr3bpSetup {}

/// Setup of a general three-body propagation, with a state laid out as
/// `[x1, y1, z1, vx1, vy1, vz1, x2, ..., vz2, x3, ..., vz3]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct ThreeBodySetup {
    #[serde(flatten)]
    pub problem: IntegrationProblem,
    pub mass_1: f64,
    pub mass_2: f64,
    pub mass_3: f64,
    #[serde(default = "default_grav_constant")]
    #[builder(default = GRAV_CONSTANT)]
    pub grav_constant: f64,
    pub initial_conditions: Vec<f64>,
}

impl ThreeBodySetup {
    /// Three unit masses on a figure-eight like orbit, in normalized units.
    pub fn demo() -> Self {
        Self::builder()
            .problem(
                IntegrationProblem::builder()
                    .t_init(0.0)
                    .t_final(7.0)
                    .tolerance(0.005)
                    .beta(0.7)
                    .build(),
            )
            .mass_1(1.0)
            .mass_2(1.0)
            .mass_3(1.0)
            .grav_constant(1.0)
            .initial_conditions(vec![
                -1.0, 0.0, 0.0, 0.39295, 0.09758, 0.0, // body 1
                1.0, 0.0, 0.0, 0.39295, 0.09758, 0.0, // body 2
                0.0, 0.0, 0.0, -0.7859, -0.19516, 0.0, // body 3
            ])
            .build()
    }
}

impl PropSetup for ThreeBodySetup {
    type Dynamics = GeneralThreeBody;

    fn problem(&self) -> &IntegrationProblem {
        &self.problem
    }

    fn initial_conditions(&self) -> &[f64] {
        &self.initial_conditions
    }

    fn dynamics(&self) -> Result<GeneralThreeBody, ConfigError> {
        ensure_positive("mass_1", self.mass_1)?;
        ensure_positive("mass_2", self.mass_2)?;
        ensure_positive("mass_3", self.mass_3)?;
        ensure_positive("grav_constant", self.grav_constant)?;
        Ok(GeneralThreeBody::new(
            self.mass_1,
            self.mass_2,
            self.mass_3,
            self.grav_constant,
        ))
    }
}

impl ConfigRepr for ThreeBodySetup {}

/// Propagates two bodies and returns the states (one row per accepted step) and their times.
#[allow(clippy::too_many_arguments)]
pub fn two_body_propagator(
    t_init: f64,
    t_final: f64,
    mass_1: f64,
    mass_2: f64,
    initial_conditions: &[f64],
    grav_constant: f64,
    tolerance: f64,
    beta: f64,
    step_size: Option<f64>,
) -> Result<(DMatrix<f64>, Vec<f64>), PropagationError> {
    let setup = TwoBodySetup {
        problem: IntegrationProblem {
            t_init,
            t_final,
            tolerance,
            beta,
            step_size,
        },
        mass_1,
        mass_2,
        grav_constant,
        initial_conditions: initial_conditions.to_vec(),
    };
    Ok(setup.propagate()?.into_arrays())
}

/// Propagates a massless body in the circular restricted three-body problem and returns the
/// states (one row per accepted step) and their times.
#[allow(clippy::too_many_arguments)]
pub fn three_body_cr_propagator(
    t_init: f64,
    t_final: f64,
    mass_1: f64,
    mass_2: f64,
    r_12: f64,
    initial_conditions: &[f64],
    grav_constant: f64,
    tolerance: f64,
    beta: f64,
    step_size: Option<f64>,
) -> Result<(DMatrix<f64>, Vec<f64>), PropagationError> {
    let setup = Cr3bpSetup {
        problem: IntegrationProblem {
            t_init,
            t_final,
            tolerance,
            beta,
            step_size,
        },
        mass_1,
        mass_2,
        r_12,
        grav_constant,
        initial_conditions: initial_conditions.to_vec(),
    };
    Ok(setup.propagate()?.into_arrays())
}

/// Propagates three bodies and returns the states (one row per accepted step) and their times.
#[allow(clippy::too_many_arguments)]
pub fn three_body_propagator(
    t_init: f64,
    t_final: f64,
    mass_1: f64,
    mass_2: f64,
    mass_3: f64,
    initial_conditions: &[f64],
    grav_constant: f64,
    tolerance: f64,
    beta: f64,
    step_size: Option<f64>,
) -> Result<(DMatrix<f64>, Vec<f64>), PropagationError> {
    let setup = ThreeBodySetup {
        problem: IntegrationProblem {
            t_init,
            t_final,
            tolerance,
            beta,
            step_size,
        },
        mass_1,
        mass_2,
        mass_3,
        grav_constant,
        initial_conditions: initial_conditions.to_vec(),
    };
    Ok(setup.propagate()?.into_arrays())
}
