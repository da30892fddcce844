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
use crate::linalg::{OVector, Vector3, U18};
use std::fmt;

/// `GeneralThreeBody` provides the equations of motion of three point masses in an inertial frame.
///
/// The state vector is the position and velocity of body 1, then of body 2, then of body 3:
/// `[x1, y1, z1, vx1, vy1, vz1, x2, ..., vz2, x3, ..., vz3]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeneralThreeBody {
    mu: [f64; 3],
}

impl GeneralThreeBody {
    /// Initializes the three body dynamics from the masses of each body and the gravitational constant.
    pub fn new(mass_1: f64, mass_2: f64, mass_3: f64, grav_constant: f64) -> Self {
        Self::from_gm(
            grav_constant * mass_1,
            grav_constant * mass_2,
            grav_constant * mass_3,
        )
    }

    /// Initializes the three body dynamics from the gravitational parameter of each body.
    pub fn from_gm(mu_1: f64, mu_2: f64, mu_3: f64) -> Self {
        let me = Self {
            mu: [mu_1, mu_2, mu_3],
        };
        debug!("{me}");
        me
    }

    /// Gravitational parameters of body 1, 2 and 3.
    pub fn mu(&self) -> [f64; 3] {
        self.mu
    }
}

impl fmt::Display for GeneralThreeBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "general three body dynamics (mu_1 = {:e}, mu_2 = {:e}, mu_3 = {:e})",
            self.mu[0], self.mu[1], self.mu[2]
        )
    }
}

impl ForceModel for GeneralThreeBody {
    type Size = U18;

    const COLUMNS: &'static [&'static str] = &[
        "x1", "y1", "z1", "vx1", "vy1", "vz1", "x2", "y2", "z2", "vx2", "vy2", "vz2", "x3", "y3",
        "z3", "vx3", "vy3", "vz3",
    ];

    fn evaluate(
        &self,
        t: f64,
        state: &OVector<f64, U18>,
    ) -> Result<OVector<f64, U18>, DynamicsError> {
        let [mu_1, mu_2, mu_3] = self.mu;
        let r_1: Vector3<f64> = state.fixed_rows::<3>(0).into_owned();
        let r_2: Vector3<f64> = state.fixed_rows::<3>(6).into_owned();
        let r_3: Vector3<f64> = state.fixed_rows::<3>(12).into_owned();

        // Each pairwise separation is computed once and used for both bodies of the pair
        let r_12 = r_2 - r_1;
        let r_13 = r_3 - r_1;
        let r_23 = r_3 - r_2;
        let r_12_cubed = separation_cubed(t, r_12.norm(), "bodies 1 and 2")?;
        let r_13_cubed = separation_cubed(t, r_13.norm(), "bodies 1 and 3")?;
        let r_23_cubed = separation_cubed(t, r_23.norm(), "bodies 2 and 3")?;

        let acc_1 = mu_2 / r_12_cubed * r_12 + mu_3 / r_13_cubed * r_13;
        let acc_2 = -mu_1 / r_12_cubed * r_12 + mu_3 / r_23_cubed * r_23;
        let acc_3 = -mu_1 / r_13_cubed * r_13 - mu_2 / r_23_cubed * r_23;

        let mut d_x = OVector::<f64, U18>::zeros();
        for (body, acc) in [acc_1, acc_2, acc_3].iter().enumerate() {
            let offset = 6 * body;
            d_x.fixed_rows_mut::<3>(offset)
                .copy_from(&state.fixed_rows::<3>(offset + 3));
            d_x.fixed_rows_mut::<3>(offset + 3).copy_from(acc);
        }

        ensure_finite(t, d_x)
    }
}
