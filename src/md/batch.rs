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

use super::setup::PropSetup;
use crate::dynamics::ForceModel;
use crate::linalg::allocator::Allocator;
use crate::linalg::DefaultAllocator;
use crate::md::trajectory::Trajectory;
use crate::propagators::PropagationError;
use hifitime::Duration;
use rayon::prelude::*;
use std::time::Instant;

/// Propagates each of the setups on the rayon thread pool.
///
/// Returns one result per setup, in the order of the setups. Each run is independent of the
/// others: a failed run only shows up as an error in its own slot.
pub fn propagate_batch<S>(
    setups: &[S],
) -> Vec<Result<Trajectory<<S::Dynamics as ForceModel>::Size>, PropagationError>>
where
    S: PropSetup + Sync,
    DefaultAllocator: Allocator<<S::Dynamics as ForceModel>::Size>,
    Trajectory<<S::Dynamics as ForceModel>::Size>: Send,
{
    let start = Instant::now();
    let results = setups
        .par_iter()
        .map(|setup| setup.propagate())
        .collect::<Vec<_>>();

    let clock_time: Duration = start.elapsed().into();
    let failures = results.iter().filter(|result| result.is_err()).count();
    info!(
        "Propagated {} setups in {clock_time} on {} threads ({failures} failed)",
        setups.len(),
        rayon::current_num_threads()
    );

    results
}
