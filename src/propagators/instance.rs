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

use super::error_ctrl::ErrorCtrl;
use super::{
    CancelledSnafu, DynamicsSnafu, IntegrationDetails, IntegrationStats, NonConvergenceSnafu,
    PropConfigSnafu, PropagationError, Propagator, StepUnderflowSnafu, TrajectorySnafu,
};
use crate::dynamics::ForceModel;
use crate::io::InvalidConfigSnafu;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, OVector};
use crate::md::trajectory::Trajectory;
use hifitime::Duration;
use snafu::prelude::*;
use std::sync::mpsc::Sender;
use std::time::Instant;

/// Steps ending within this fraction of a step from the stop time are stretched onto it.
const STOP_TIME_SNAP: f64 = 1e-10;
/// Unless set in the options, the initial step is the propagation span divided by this value.
const DEFAULT_STEPS_PER_SPAN: f64 = 100.0;
/// Rounding allowance, in units of `f64::EPSILON` of the times involved, when a fixed step grid
/// point is compared to the stop time.
const GRID_ROUNDING: f64 = 4.0;

/// A `PropInstance` is a propagator with a state to propagate.
///
/// It stores the current time and state, and is advanced by the `until_time*` methods. Every
/// sample produced by a propagation is an accepted step: rejected trial steps are never emitted.
#[derive(Debug)]
pub struct PropInstance<'a, D: ForceModel, E: ErrorCtrl>
where
    DefaultAllocator: Allocator<D::Size>,
{
    /// Current time of the propagation
    pub t: f64,
    /// Current state of the propagation
    pub state: OVector<f64, D::Size>,
    /// The propagator setup (kind, stages, etc.)
    pub prop: &'a Propagator<D, E>,
    /// Stores the details of the previous integration step
    pub details: IntegrationDetails,
    /// Counters of all of the steps of this instance
    pub stats: IntegrationStats,
    pub(crate) step_size: Option<f64>,
    pub(crate) fixed_step: bool,
    // Fixed steps land on `grid_origin + n * step`, with `n` the steps taken since the origin
    pub(crate) grid_origin: f64,
    pub(crate) grid_steps: u64,
    // Allows us to do pre-allocation of the ki vectors
    pub(crate) k: Vec<OVector<f64, D::Size>>,
}

impl<'a, D: ForceModel, E: ErrorCtrl> PropInstance<'a, D, E>
where
    DefaultAllocator: Allocator<D::Size>,
{
    /// Allows setting the step size of the propagator
    pub fn set_step(&mut self, step_size: f64, fixed: bool) {
        self.step_size = Some(step_size);
        self.fixed_step = fixed;
        self.grid_origin = self.t;
        self.grid_steps = 0;
    }

    /// Propagates the state until the provided stop time and returns the final state.
    pub fn until_time(
        &mut self,
        stop_time: f64,
    ) -> Result<OVector<f64, D::Size>, PropagationError> {
        self.until_time_with_sink(stop_time, |_, _| Ok(()))
    }

    /// Propagates the state until the provided stop time and returns every accepted step,
    /// starting with the current state.
    ///
    /// On error, the samples accepted so far are discarded: the error reports the time at which
    /// the propagation stopped.
    pub fn until_time_with_traj(
        &mut self,
        stop_time: f64,
    ) -> Result<Trajectory<D::Size>, PropagationError> {
        let mut traj = Trajectory::new(D::COLUMNS);
        traj.push(self.t, self.state.clone())
            .context(TrajectorySnafu)?;

        let result = self.until_time_with_sink(stop_time, |t, state| {
            traj.push(t, state.clone()).context(TrajectorySnafu)
        });

        match result {
            Ok(_) => {
                traj.stats = self.stats;
                Ok(traj)
            }
            Err(e) => {
                warn!(
                    "propagation aborted at t = {} after {} accepted samples: {e}",
                    self.t,
                    traj.len()
                );
                Err(e)
            }
        }
    }

    /// Propagates the state until the provided stop time and publishes every accepted step on the
    /// provided channel.
    ///
    /// The propagation stops with a `Cancelled` error as soon as the receiver is dropped.
    pub fn until_time_with_channel(
        &mut self,
        stop_time: f64,
        tx_chan: Sender<(f64, OVector<f64, D::Size>)>,
    ) -> Result<OVector<f64, D::Size>, PropagationError> {
        self.until_time_with_sink(stop_time, |t, state| {
            tx_chan
                .send((t, state.clone()))
                .ok()
                .context(CancelledSnafu { t })
        })
    }

    /// Takes a single accepted step, without any stop time.
    ///
    /// The step size must have been set, either in the options or with `set_step`.
    pub fn single_step(&mut self) -> Result<(), PropagationError> {
        self.step_until(f64::INFINITY)
    }

    /// Copy the details of the latest integration step.
    pub fn latest_details(&self) -> IntegrationDetails {
        self.details
    }

    fn until_time_with_sink<F>(
        &mut self,
        stop_time: f64,
        mut sink: F,
    ) -> Result<OVector<f64, D::Size>, PropagationError>
    where
        F: FnMut(f64, &OVector<f64, D::Size>) -> Result<(), PropagationError>,
    {
        if !stop_time.is_finite() || stop_time < self.t {
            return InvalidConfigSnafu {
                msg: format!(
                    "cannot propagate from t = {} until t = {stop_time}: only forward propagation is supported",
                    self.t
                ),
            }
            .fail()
            .context(PropConfigSnafu);
        }

        if stop_time == self.t {
            return Ok(self.state.clone());
        }

        if self.step_size.is_none() {
            self.step_size = Some((stop_time - self.t) / DEFAULT_STEPS_PER_SPAN);
        }
        self.grid_origin = self.t;
        self.grid_steps = 0;

        let tick = Instant::now();
        debug!(
            "propagating {} from t = {} until t = {stop_time} ({})",
            self.prop.dynamics, self.t, self.prop.opts
        );

        while self.t < stop_time {
            self.step_until(stop_time)?;
            sink(self.t, &self.state)?;
        }

        let tock: Duration = tick.elapsed().into();
        info!("reached t = {stop_time} in {tock}: {}", self.stats);
        Ok(self.state.clone())
    }

    fn step_until(&mut self, stop_time: f64) -> Result<(), PropagationError> {
        let (t, state) = self.derive(stop_time)?;
        self.t = t;
        self.state = state;
        self.stats.accepted += 1;
        Ok(())
    }

    /// Computes the stages of the Runge Kutta method from the current state, adapting the step
    /// size until the error is within the tolerance.
    ///
    /// This function returns the next time and state of an accepted step. The step never goes
    /// past `stop_time`: if the trial step would, it is truncated onto it.
    ///
    /// Note that the step size adaptation is **not** performed if the propagator is set to a fixed step.
    /// Fixed steps are placed on a grid counted from the start of the propagation, so rounding does not
    /// accumulate from one step to the next.
    fn derive(
        &mut self,
        stop_time: f64,
    ) -> Result<(f64, OVector<f64, D::Size>), PropagationError> {
        let prop = self.prop;
        let t = self.t;
        let state_vec = &self.state;
        let stages = prop.stages;

        let mut step_size = match self.step_size {
            Some(step_size) if step_size > 0.0 && step_size.is_finite() => step_size,
            _ => {
                return InvalidConfigSnafu {
                    msg: format!("invalid step size {:?}", self.step_size),
                }
                .fail()
                .context(PropConfigSnafu)
            }
        };
        if let Some(max_step) = prop.opts.max_step {
            step_size = step_size.min(max_step);
        }

        self.details.attempts = 1;
        loop {
            let t_trial = if self.fixed_step {
                self.grid_origin + (self.grid_steps + 1) as f64 * step_size
            } else {
                t + step_size
            };
            let snap = if self.fixed_step {
                (STOP_TIME_SNAP * step_size).max(
                    GRID_ROUNDING * f64::EPSILON * (self.grid_origin.abs() + t_trial.abs()),
                )
            } else {
                STOP_TIME_SNAP * step_size
            };
            let lands = t_trial + snap >= stop_time;
            let t_next = if lands { stop_time } else { t_trial };
            let h = t_next - t;
            ensure!(t + h > t, StepUnderflowSnafu { t, step: h });

            self.k[0] = prop
                .dynamics
                .evaluate(t, state_vec)
                .context(DynamicsSnafu)?;
            let mut a_idx: usize = 0;
            for i in 0..(stages - 1) {
                // Let's compute the c_i by summing the relevant items from the list of coefficients.
                // \sum_{j=1}^{i-1} a_ij  ∀ i ∈ [2, s]
                let mut ci: f64 = 0.0;
                // The wi stores the a_{s1} * k_1 + a_{s2} * k_2 + ... + a_{s, s-1} * k_{s-1} +
                let mut wi = OVector::<f64, D::Size>::zeros();
                for kj in &self.k[0..i + 1] {
                    let a_ij = prop.a_coeffs[a_idx];
                    ci += a_ij;
                    wi += a_ij * kj;
                    a_idx += 1;
                }

                self.k[i + 1] = prop
                    .dynamics
                    .evaluate(t + ci * h, &(state_vec + h * wi))
                    .context(DynamicsSnafu)?;
            }
            self.stats.evaluations += stages;

            // Compute the next state and the error
            let mut next_state = state_vec.clone();
            // State error estimation from https://en.wikipedia.org/wiki/Runge%E2%80%93Kutta_methods#Adaptive_Runge%E2%80%93Kutta_methods
            // This is consistent with GMAT https://github.com/ChristopherRabotin/GMAT/blob/37201a6290e7f7b941bc98ee973a527a5857104b/src/base/propagator/RungeKutta.cpp#L537
            let mut error_est = OVector::<f64, D::Size>::zeros();
            for (i, ki) in self.k.iter().enumerate() {
                let b_i = prop.b_coeffs[i];
                if !self.fixed_step {
                    let b_i_star = prop.b_coeffs[i + stages];
                    error_est += h * (b_i - b_i_star) * ki;
                }
                next_state += h * b_i * ki;
            }

            if self.fixed_step {
                self.details.step = h;
                self.details.error = 0.0;
                if lands {
                    self.grid_origin = stop_time;
                    self.grid_steps = 0;
                } else {
                    self.grid_steps += 1;
                }
                return Ok((t_next, next_state));
            }

            self.details.error = E::estimate(&error_est, &next_state, state_vec);
            let factor = prop.opts.step_factor(self.details.error, prop.order);

            if self.details.error <= prop.opts.tolerance {
                self.details.step = h;
                // A step truncated onto the stop time does not inform the next step size
                let mut next_step = if lands { step_size } else { h * factor };
                if let Some(max_step) = prop.opts.max_step {
                    next_step = next_step.min(max_step);
                }
                self.step_size = Some(next_step);
                return Ok((t_next, next_state));
            }

            self.stats.rejected += 1;
            trace!(
                "rejected step of {h:e} at t = {t}: error {:e} > {:e}",
                self.details.error,
                prop.opts.tolerance
            );
            ensure!(
                self.details.attempts < prop.opts.attempts,
                NonConvergenceSnafu {
                    t,
                    step: h,
                    attempts: self.details.attempts
                }
            );
            self.details.attempts += 1;
            step_size = h * factor;
        }
    }
}
