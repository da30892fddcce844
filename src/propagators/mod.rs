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

use snafu::prelude::*;
use std::fmt;

/// Provides different methods for controlling the error computation of the integrator.
pub mod error_ctrl;
pub use self::error_ctrl::*;

// Re-Export
mod instance;
pub use instance::*;
mod propagator;
pub use propagator::*;
mod rk_methods;
pub use rk_methods::*;
mod options;
pub use options::*;

use crate::{dynamics::DynamicsError, io::ConfigError, md::trajectory::TrajError};

/// Stores the details of the previous integration step of a propagation instance.
/// Access it with `PropInstance::latest_details`.
#[derive(Copy, Clone, Debug)]
pub struct IntegrationDetails {
    /// step size used
    pub step: f64,
    /// error in the previous integration step
    pub error: f64,
    /// number of attempts needed by an adaptive step size to be within the tolerance
    pub attempts: u8,
}

impl fmt::Display for IntegrationDetails {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "IntegrationDetails {{step: {:e}, error: {:.3e}, attempts: {}}}",
            self.step, self.error, self.attempts
        )
    }
}

/// Counters of a propagation, accumulated over all of its steps.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IntegrationStats {
    /// Number of accepted steps
    pub accepted: usize,
    /// Number of rejected steps, each retried with a smaller step
    pub rejected: usize,
    /// Number of evaluations of the force model
    pub evaluations: usize,
}

impl fmt::Display for IntegrationStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} accepted steps, {} rejected steps, {} evaluations",
            self.accepted, self.rejected, self.evaluations
        )
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("encountered a dynamics error {source}"))]
    Dynamics { source: DynamicsError },
    #[snafu(display(
        "step size collapsed to {step:e} at t = {t} after {attempts} attempts without meeting the tolerance"
    ))]
    NonConvergence { t: f64, step: f64, attempts: u8 },
    #[snafu(display("step size underflowed to {step:e} at t = {t}: time no longer advances"))]
    StepUnderflow { t: f64, step: f64 },
    #[snafu(display("propagation cancelled at t = {t} because the receiver hung up"))]
    Cancelled { t: f64 },
    #[snafu(display("propagation failed because {source}"))]
    PropConfigError { source: ConfigError },
    #[snafu(display("when building the trajectory: {source}"))]
    TrajectoryError { source: TrajError },
}
