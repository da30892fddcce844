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

use super::{ColumnNotFoundSnafu, CreationSnafu, TrajError};
use crate::linalg::allocator::Allocator;
use crate::linalg::{DMatrix, DefaultAllocator, DimName, OVector};
use crate::propagators::IntegrationStats;
use snafu::prelude::*;
use std::fmt;

/// Name of the time column, which precedes the state columns.
const TIME_COLUMN: &str = "t";

/// Store the accepted samples of a propagation, in chronological order.
///
/// Each sample is a time and the state vector at that time. The first sample is the initial
/// condition, and the times are strictly increasing.
#[derive(Clone, PartialEq)]
pub struct Trajectory<N: DimName>
where
    DefaultAllocator: Allocator<N>,
{
    /// Optionally name this trajectory
    pub name: Option<String>,
    columns: &'static [&'static str],
    times: Vec<f64>,
    states: Vec<OVector<f64, N>>,
    pub(crate) stats: IntegrationStats,
}

impl<N: DimName> Trajectory<N>
where
    DefaultAllocator: Allocator<N>,
{
    /// Initializes an empty trajectory whose state components are named by `columns`.
    pub fn new(columns: &'static [&'static str]) -> Self {
        Self {
            name: None,
            columns,
            times: Vec::new(),
            states: Vec::new(),
            stats: IntegrationStats::default(),
        }
    }

    /// Appends a sample, which must be finite and strictly after the last one.
    pub(crate) fn push(&mut self, t: f64, state: OVector<f64, N>) -> Result<(), TrajError> {
        ensure!(
            t.is_finite() && state.iter().all(|v| v.is_finite()),
            CreationSnafu {
                msg: format!("sample at t = {t} is not finite")
            }
        );
        if let Some(&last_t) = self.times.last() {
            ensure!(
                t > last_t,
                CreationSnafu {
                    msg: format!("sample at t = {t} is not after the last sample at t = {last_t}")
                }
            );
        }
        self.times.push(t);
        self.states.push(state);
        Ok(())
    }

    /// Number of samples in this trajectory
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the first sample of this trajectory, i.e. the initial condition.
    pub fn first(&self) -> Option<(f64, &OVector<f64, N>)> {
        self.times.first().copied().zip(self.states.first())
    }

    /// Returns the last sample of this trajectory
    pub fn last(&self) -> Option<(f64, &OVector<f64, N>)> {
        self.times.last().copied().zip(self.states.last())
    }

    /// Times of each sample
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// State vectors of each sample, aligned with `times`
    pub fn states(&self) -> &[OVector<f64, N>] {
        &self.states
    }

    /// Iterates through the samples of this trajectory.
    pub fn iter(&self) -> impl Iterator<Item = (f64, &OVector<f64, N>)> {
        self.times.iter().copied().zip(self.states.iter())
    }

    /// Counters of the propagation which built this trajectory.
    pub fn stats(&self) -> IntegrationStats {
        self.stats
    }

    /// Names of the columns of this trajectory: the time followed by each state component.
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(self.columns.len() + 1);
        names.push(TIME_COLUMN);
        names.extend_from_slice(self.columns);
        names
    }

    /// Returns the values of the requested column, either `t` or one of the state components.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, TrajError> {
        if name == TIME_COLUMN {
            return Ok(self.times.clone());
        }

        let idx = self
            .columns
            .iter()
            .position(|col| *col == name)
            .context(ColumnNotFoundSnafu { name })?;

        Ok(self.states.iter().map(|state| state[idx]).collect())
    }

    /// Returns the states as a matrix with one row per sample.
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.len(), N::dim(), |i, j| self.states[i][j])
    }

    /// Consumes this trajectory into a matrix of states, one row per sample, and the row-aligned times.
    pub fn into_arrays(self) -> (DMatrix<f64>, Vec<f64>) {
        (self.to_dmatrix(), self.times)
    }
}

impl<N: DimName> fmt::Display for Trajectory<N>
where
    DefaultAllocator: Allocator<N>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}: ")?;
        }
        match (self.times.first(), self.times.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "Trajectory from t = {first} to t = {last} ({:.3} time units) [{} states]",
                last - first,
                self.len()
            ),
            _ => write!(f, "Empty trajectory"),
        }
    }
}

impl<N: DimName> fmt::Debug for Trajectory<N>
where
    DefaultAllocator: Allocator<N>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}",)
    }
}
