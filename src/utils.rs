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

use crate::io::{ConfigError, InvalidConfigSnafu};
use crate::linalg::Vector3;
use snafu::prelude::*;
use std::f64::consts::TAU;

/// Gravitational parameter of the Earth in km^3/s^2, default of `time_since_periapsis`.
pub const EARTH_GM_KM3_S2: f64 = 398_600.0;

/// Returns the time elapsed since periapsis passage at the provided true anomaly (in radians) on
/// an elliptic orbit of eccentricity `ecc` and specific angular momentum `h`, about a central body
/// of gravitational parameter `mu`.
///
/// The time is in `[0, T)` where `T = 2π / mu^2 * (h / sqrt(1 - e^2))^3` is the orbital period,
/// and its unit follows the units of `h` and `mu` (e.g. seconds for km^2/s and km^3/s^2).
pub fn time_since_periapsis(
    ecc: f64,
    h: f64,
    true_anomaly: f64,
    mu: f64,
) -> Result<f64, ConfigError> {
    ensure!(
        (0.0..1.0).contains(&ecc),
        InvalidConfigSnafu {
            msg: format!("eccentricity must be in [0, 1) but got {ecc}")
        }
    );
    ensure!(
        h > 0.0 && mu > 0.0,
        InvalidConfigSnafu {
            msg: format!("angular momentum ({h}) and gravitational parameter ({mu}) must be positive")
        }
    );
    ensure!(
        true_anomaly.is_finite(),
        InvalidConfigSnafu {
            msg: "true anomaly must be finite"
        }
    );

    let period = TAU / mu.powi(2) * (h / (1.0 - ecc.powi(2)).sqrt()).powi(3);
    // tan(E/2) = sqrt((1 - e) / (1 + e)) tan(ν/2)
    let half_nu = true_anomaly / 2.0;
    let ecc_anomaly = (2.0
        * ((1.0 - ecc).sqrt() * half_nu.sin()).atan2((1.0 + ecc).sqrt() * half_nu.cos()))
    .rem_euclid(TAU);
    let mean_anomaly = ecc_anomaly - ecc * ecc_anomaly.sin();

    Ok(mean_anomaly / TAU * period)
}

/// Returns the total linear momentum of point masses in an inertial state laid out as
/// `[x1, y1, z1, vx1, vy1, vz1, x2, ...]`, or None if the state does not hold one position and
/// velocity per mass.
pub fn linear_momentum(masses: &[f64], state: &[f64]) -> Option<Vector3<f64>> {
    if state.len() != 6 * masses.len() {
        return None;
    }
    Some(
        masses
            .iter()
            .zip(state.chunks_exact(6))
            .map(|(mass, body)| *mass * Vector3::from_column_slice(&body[3..6]))
            .sum(),
    )
}

/// Returns the position of the center of mass of point masses in an inertial state laid out as
/// `linear_momentum` expects it.
pub fn barycenter(masses: &[f64], state: &[f64]) -> Option<Vector3<f64>> {
    let total_mass: f64 = masses.iter().sum();
    if state.len() != 6 * masses.len() || total_mass <= 0.0 {
        return None;
    }
    let weighted: Vector3<f64> = masses
        .iter()
        .zip(state.chunks_exact(6))
        .map(|(mass, body)| *mass * Vector3::from_column_slice(&body[0..3]))
        .sum();
    Some(weighted / total_mass)
}
