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

/*! # grav-prop

Propagation of gravitationally interacting bodies with an embedded Runge Kutta Fehlberg 4(5) integrator.

Three force models are provided:
+ [`TwoBody`](dynamics::TwoBody): two point masses in an inertial frame;
+ [`RestrictedThreeBody`](dynamics::RestrictedThreeBody): a massless body in the rotating frame of two primaries on circular orbits;
+ [`GeneralThreeBody`](dynamics::GeneralThreeBody): three point masses in an inertial frame.

The quickest way in is through one of the setups in [`md`], which validate their inputs and return a [`md::Trajectory`].
*/

/// Provides the adaptive and fixed step integrators, and their options.
pub mod propagators;

/// Provides the gravitational force models which can be integrated.
pub mod dynamics;

/// Propagation setups, trajectories and batch runs.
pub mod md;

/// Loading of YAML configurations.
pub mod io;

/// Utility functions shared by different modules, and which may be useful to engineers.
pub mod utils;

#[macro_use]
extern crate log;
extern crate nalgebra as na;

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

pub use self::dynamics::{DynamicsError, ForceModel};
pub use self::io::ConfigError;
pub use self::md::Trajectory;
pub use self::propagators::PropagationError;
