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
use std::fmt;

// This determines when to take into consideration the magnitude of the state_delta -- prevents dividing by too small of a number.
const REL_ERR_THRESH: f64 = 0.1;

/// The Error Control trait manages how a propagator computes the error in the current step.
pub trait ErrorCtrl: Copy + Default + Send + Sync + fmt::Debug {
    /// Computes the actual error of the current step.
    ///
    /// The `error_est` is the difference between the propagated and the embedded solutions, the `candidate`
    /// is the propagated solution and the `cur_state` is the state at the start of the step.
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>;
}

/// An absolute largest error control: the error of the step is the largest absolute difference
/// between any component of the two solutions.
///
/// This is the default error control: the tolerance is then expressed in the units of the state
/// (e.g. meters and meters per second), which is easy to reason about when all components share a scale.
#[derive(Clone, Copy, Debug, Default)]
pub struct LargestError;

impl ErrorCtrl for LargestError {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        _candidate: &OVector<f64, N>,
        _cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        error_est.amax()
    }
}

/// An absolute RSS error control: the error is the L2 norm of the difference between the two solutions.
#[derive(Clone, Copy, Debug, Default)]
pub struct RSSError;

impl ErrorCtrl for RSSError {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        _candidate: &OVector<f64, N>,
        _cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        error_est.norm()
    }
}

/// A largest step error control which computes the largest error at each component, relative to the change of that
/// component during the step when that change is large enough.
///
/// This error estimator is from the physical model estimator of GMAT
/// (Source)[https://github.com/ChristopherRabotin/GMAT/blob/37201a6290e7f7b941bc98ee973a527a5857104b/src/base/forcemodel/PhysicalModel.cpp#L987]
#[derive(Clone, Copy, Debug, Default)]
pub struct LargestStep;

impl ErrorCtrl for LargestStep {
    fn estimate<N: DimName>(
        error_est: &OVector<f64, N>,
        candidate: &OVector<f64, N>,
        cur_state: &OVector<f64, N>,
    ) -> f64
    where
        DefaultAllocator: Allocator<N>,
    {
        let state_delta = candidate - cur_state;
        let mut max_err = 0.0;
        for (i, prop_err_i) in error_est.iter().enumerate() {
            let err = if state_delta[i].abs() > REL_ERR_THRESH {
                (prop_err_i / state_delta[i]).abs()
            } else {
                prop_err_i.abs()
            };
            if err > max_err {
                max_err = err;
            }
        }
        max_err
    }
}
