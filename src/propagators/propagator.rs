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

use super::error_ctrl::{ErrorCtrl, LargestError};
use super::{Fehlberg45, IntegrationDetails, IntegrationStats, PropInstance, PropOpts, RK};
use crate::dynamics::ForceModel;
use crate::linalg::allocator::Allocator;
use crate::linalg::{DefaultAllocator, OVector};

/// A Propagator allows propagating a force model forward in time.
/// It includes the force model, the options and the set of coefficients used for the monomorphic instance.
#[derive(Clone, Debug)]
pub struct Propagator<D: ForceModel, E: ErrorCtrl>
where
    DefaultAllocator: Allocator<D::Size>,
{
    pub dynamics: D, // Stores the dynamics used. *Must* use this to get the latest values
    pub opts: PropOpts<E>, // Stores the integration options (tolerance, beta, init step, etc.)
    pub(crate) order: u8,  // Order of the integrator
    pub(crate) stages: usize, // Number of stages, i.e. how many times the derivatives will be called
    pub(crate) a_coeffs: &'static [f64],
    pub(crate) b_coeffs: &'static [f64],
}

impl<D: ForceModel, E: ErrorCtrl> Propagator<D, E>
where
    DefaultAllocator: Allocator<D::Size>,
{
    /// Each propagator must be initialized with `new` which stores propagator information.
    pub fn new<T: RK>(dynamics: D, opts: PropOpts<E>) -> Self {
        Self {
            dynamics,
            opts,
            stages: T::STAGES,
            order: T::ORDER,
            a_coeffs: T::A_COEFFS,
            b_coeffs: T::B_COEFFS,
        }
    }

    /// A Runge Kutta Fehlberg 4(5) propagator with custom propagator options.
    pub fn rkf45(dynamics: D, opts: PropOpts<E>) -> Self {
        Self::new::<Fehlberg45>(dynamics, opts)
    }

    /// Builds a propagation instance starting at time `t` from the provided `state`.
    pub fn with(&self, t: f64, state: OVector<f64, D::Size>) -> PropInstance<'_, D, E> {
        // Pre-allocate the k used in the propagator
        let k = vec![OVector::<f64, D::Size>::zeros(); self.stages];
        PropInstance {
            t,
            state,
            prop: self,
            details: IntegrationDetails {
                step: self.opts.init_step.unwrap_or(0.0),
                error: 0.0,
                attempts: 1,
            },
            stats: IntegrationStats::default(),
            step_size: self.opts.init_step,
            fixed_step: self.opts.fixed_step,
            grid_origin: t,
            grid_steps: 0,
            k,
        }
    }
}

impl<D: ForceModel> Propagator<D, LargestError>
where
    DefaultAllocator: Allocator<D::Size>,
{
    /// Default propagator is an RKF45 with the default PropOpts.
    pub fn default(dynamics: D) -> Self {
        Self::rkf45(dynamics, PropOpts::default())
    }
}
