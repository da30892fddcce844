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

use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, DimName, OVector};
use snafu::prelude::*;

use std::fmt;

/// Two point masses in an inertial frame.
pub mod two_body;
pub use self::two_body::*;

/// Massless body in the rotating frame of two primaries in circular orbit.
pub mod cr3bp;
pub use self::cr3bp::*;

/// Three point masses in an inertial frame.
pub mod three_body;
pub use self::three_body::*;

/// Gravitational constant in SI units (m^3 kg^-1 s^-2), default of all setups.
pub const GRAV_CONSTANT: f64 = 6.67259e-11;

/// A trait for the force models whose equations of motion can be integrated.
///
/// A force model stores the physical constants it needs, computed once at initialization, and
/// is otherwise stateless: `evaluate` must be deterministic and free of side effects, such that
/// a single instance may be shared between several propagations.
pub trait ForceModel: Clone + Send + Sync + fmt::Debug + fmt::Display
where
    DefaultAllocator: Allocator<Self::Size>,
{
    /// Size of the state vector, fixed for a given force model.
    type Size: DimName;

    /// Name of each component of the state vector, in order.
    const COLUMNS: &'static [&'static str];

    /// Defines the equations of motion.
    ///
    /// - `t`: time of the evaluation, in the same time unit as the gravitational parameters.
    /// - `state`: the state vector at which to evaluate the derivative.
    ///
    /// Returns an error if the state lies on a singularity of this model (i.e. two attracting
    /// bodies share the same position) or if the derivative overflows.
    fn evaluate(
        &self,
        t: f64,
        state: &OVector<f64, Self::Size>,
    ) -> Result<OVector<f64, Self::Size>, DynamicsError>;

    /// Returns the dimension of the state vector of this force model.
    fn dimension(&self) -> usize {
        Self::Size::dim()
    }
}

/// Dynamical model errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    /// Two attracting bodies are at exactly the same position.
    #[snafu(display("singular configuration at t = {t}: separation between {bodies} is zero"))]
    Singularity { t: f64, bodies: &'static str },
    /// The separation is non zero but the acceleration overflowed.
    #[snafu(display("derivative component #{index} is not finite at t = {t}"))]
    NonFiniteDerivative { t: f64, index: usize },
}

/// Returns the cube of the norm of a separation, or a singularity error if that separation is zero.
pub(crate) fn separation_cubed(
    t: f64,
    norm: f64,
    bodies: &'static str,
) -> Result<f64, DynamicsError> {
    ensure!(norm != 0.0, SingularitySnafu { t, bodies });
    Ok(norm.powi(3))
}

/// Ensures that all of the components of the derivative are finite.
pub(crate) fn ensure_finite<N: DimName>(
    t: f64,
    d_x: OVector<f64, N>,
) -> Result<OVector<f64, N>, DynamicsError>
where
    DefaultAllocator: Allocator<N>,
{
    match d_x.iter().position(|v| !v.is_finite()) {
        Some(index) => NonFiniteDerivativeSnafu { t, index }.fail(),
        None => Ok(d_x),
    }
}
