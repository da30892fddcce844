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
use crate::linalg::{OVector, Vector3, U6};
use std::fmt;

/// `RestrictedThreeBody` provides the equations of motion of the circular restricted three body problem,
/// expressed in the synodic frame, i.e. the frame rotating with both primaries.
///
/// The origin is the barycenter of the primaries, which are fixed on the X axis at `x = -pi_2 * r_12` (primary 1)
/// and `x = +pi_1 * r_12` (primary 2). The state vector is `[x, y, z, vx, vy, vz]` of the third, massless, body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RestrictedThreeBody {
    mu_1: f64,
    mu_2: f64,
    pi_1: f64,
    pi_2: f64,
    omega: f64,
    r_12: f64,
}

impl RestrictedThreeBody {
    /// Initializes the dynamics from the masses of the primaries, their separation and the gravitational constant.
    /// The mean motion is that of the circular orbit of the primaries about one another.
    pub fn new(mass_1: f64, mass_2: f64, r_12: f64, grav_constant: f64) -> Self {
        let omega = (grav_constant * (mass_1 + mass_2) / r_12.powi(3)).sqrt();
        Self::from_parameters(grav_constant * mass_1, grav_constant * mass_2, r_12, omega)
    }

    /// Initializes the dynamics from the gravitational parameters, the separation and an arbitrary mean motion.
    ///
    /// The mass fractions are computed from the gravitational parameters, whose sum must be strictly positive. Setting `mu_2` and `omega` to zero
    /// yields the Keplerian motion about primary 1 in an inertial frame centered on it.
    pub fn from_parameters(mu_1: f64, mu_2: f64, r_12: f64, omega: f64) -> Self {
        let mu = mu_1 + mu_2;
        let me = Self {
            mu_1,
            mu_2,
            pi_1: mu_1 / mu,
            pi_2: mu_2 / mu,
            omega,
            r_12,
        };
        debug!("{me}");
        me
    }

    pub fn mu_1(&self) -> f64 {
        self.mu_1
    }

    pub fn mu_2(&self) -> f64 {
        self.mu_2
    }

    /// Mass fraction of primary 1
    pub fn pi_1(&self) -> f64 {
        self.pi_1
    }

    /// Mass fraction of primary 2
    pub fn pi_2(&self) -> f64 {
        self.pi_2
    }

    /// Mean motion of the rotating frame
    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn r_12(&self) -> f64 {
        self.r_12
    }

    /// Returns the position of primary 1 and of primary 2 in the rotating frame.
    pub fn primaries(&self) -> (Vector3<f64>, Vector3<f64>) {
        (
            Vector3::new(-self.pi_2 * self.r_12, 0.0, 0.0),
            Vector3::new(self.pi_1 * self.r_12, 0.0, 0.0),
        )
    }

    /// Jacobi constant `C = omega^2 (x^2 + y^2) + 2 mu_1 / r_1 + 2 mu_2 / r_2 - v^2`, the integral of motion of the restricted problem.
    pub fn jacobi_constant(&self, state: &OVector<f64, U6>) -> f64 {
        let radius = state.fixed_rows::<3>(0);
        let (p1, p2) = self.primaries();
        let r_1 = (radius - p1).norm();
        let r_2 = (radius - p2).norm();
        self.omega.powi(2) * (radius[0].powi(2) + radius[1].powi(2))
            + 2.0 * self.mu_1 / r_1
            + 2.0 * self.mu_2 / r_2
            - state.fixed_rows::<3>(3).norm_squared()
    }
}

impl fmt::Display for RestrictedThreeBody {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "restricted three body dynamics (mu_1 = {:e}, mu_2 = {:e}, pi_1 = {:.6}, pi_2 = {:.6}, omega = {:e}, r_12 = {:e})",
            self.mu_1, self.mu_2, self.pi_1, self.pi_2, self.omega, self.r_12
        )
    }
}

impl ForceModel for RestrictedThreeBody {
    type Size = U6;

    const COLUMNS: &'static [&'static str] = &["x", "y", "z", "vx", "vy", "vz"];

    fn evaluate(
        &self,
        t: f64,
        state: &OVector<f64, U6>,
    ) -> Result<OVector<f64, U6>, DynamicsError> {
        let (x, y, z) = (state[0], state[1], state[2]);
        let (vx, vy) = (state[3], state[4]);

        // Position relative to each primary
        let dx_1 = x + self.pi_2 * self.r_12;
        let dx_2 = x - self.pi_1 * self.r_12;
        let r_1_cubed = separation_cubed(
            t,
            (dx_1.powi(2) + y.powi(2) + z.powi(2)).sqrt(),
            "the body and primary 1",
        )?;
        let r_2_cubed = separation_cubed(
            t,
            (dx_2.powi(2) + y.powi(2) + z.powi(2)).sqrt(),
            "the body and primary 2",
        )?;

        let g_1 = self.mu_1 / r_1_cubed;
        let g_2 = self.mu_2 / r_2_cubed;
        let omega_sq = self.omega.powi(2);

        let d_x = OVector::<f64, U6>::from_column_slice(&[
            vx,
            vy,
            state[5],
            2.0 * self.omega * vy + omega_sq * x - g_1 * dx_1 - g_2 * dx_2,
            -2.0 * self.omega * vx + omega_sq * y - g_1 * y - g_2 * y,
            -g_1 * z - g_2 * z,
        ]);

        ensure_finite(t, d_x)
    }
}
