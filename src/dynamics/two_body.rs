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

use super::{ensure_finite, separation_cubed, DynamicsError, ForceModel};
use crate::linalg::{OVector, Vector3, U12};
use std::fmt;

/// `TwoBody` provides the equations of motion of two point masses in an inertial frame.
///
/// The state vector is `[x1, y1, z1, vx1, vy1, vz1, x2, y2, z2, vx2, vy2, vz2]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TwoBody {
    mu_1: f64,
    mu_2: f64,
}

impl TwoBody {
    /// Initializes the two body dynamics from the masses of each body and the gravitational constant.
    pub fn new(mass_1: f64, mass_2: f64, grav_constant: f64) -> Self {
        Self::from_gm(grav_constant * mass_1, grav_constant * mass_2)
    }

    /// Initializes the two body dynamics from the gravitational parameter of each body.
    pub fn from_gm(mu_1: f64, mu_2: f64) -> Self {
        let me = Self { mu_1, mu_2 };
        debug!("{me}");
        me
    }

    pub fn mu_1(&self) -> f64 {
        self.mu_1
    }

    pub fn mu_2(&self) -> f64 {
        self.mu_2
    }

    /// Specific orbital energy of the relative motion, constant in the absence of other forces.
    pub fn relative_energy(&self, state: &OVector<f64, U12>) -> f64 {
        let r12 = state.fixed_rows::<3>(6) - state.fixed_rows::<3>(0);
        let v12 = state.fixed_rows::<3>(9) - state.fixed_rows::<3>(3);
        0.5 * v12.norm_squared() - (self.mu_1 + self.mu_2) / r12.norm()
    }
}

impl fmt::Display for TwoBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "two body dynamics (mu_1 = {:e}, mu_2 = {:e})", self.mu_1, self.mu_2)
    }
}

impl ForceModel for TwoBody {
    type Size = U12;

    const COLUMNS: &'static [&'static str] = &[
        "x1", "y1", "z1", "vx1", "vy1", "vz1", "x2", "y2", "z2", "vx2", "vy2", "vz2",
    ];

    fn evaluate(
        &self,
        t: f64,
        state: &OVector<f64, U12>,
    ) -> Result<OVector<f64, U12>, DynamicsError> {
        // Separation from body 1 to body 2, shared by both accelerations
        let r12: Vector3<f64> = state.fixed_rows::<3>(6) - state.fixed_rows::<3>(0);
        let r12_cubed = separation_cubed(t, r12.norm(), "bodies 1 and 2")?;

        let mut d_x = OVector::<f64, U12>::zeros();
        d_x.fixed_rows_mut::<3>(0).copy_from(&state.fixed_rows::<3>(3));
        d_x.fixed_rows_mut::<3>(3).copy_from(&(self.mu_2 / r12_cubed * r12));
        d_x.fixed_rows_mut::<3>(6).copy_from(&state.fixed_rows::<3>(9));
        d_x.fixed_rows_mut::<3>(9).copy_from(&(-self.mu_1 / r12_cubed * r12));

        ensure_finite(t, d_x)
    }
}
