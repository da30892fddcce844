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

use std::fmt;

use super::{ErrorCtrl, LargestError};
use typed_builder::TypedBuilder;

/// Default tolerance, in the units of the state vector.
pub const DEFAULT_TOLERANCE: f64 = 0.2;
/// Default safety factor applied to the optimal step size.
pub const DEFAULT_BETA: f64 = 0.8;

/// PropOpts stores the integrator options, including the tolerance, the step size safety factor, and
/// the bounds of the step size adaptation.
///
/// Note that the tolerance and the adaptation parameters are only used by adaptive methods. To use a
/// fixed step integrator, initialize the options using `with_fixed_step`: all of the stages of the
/// Runge Kutta method are still computed, but every step is accepted.
#[derive(Clone, Copy, Debug, TypedBuilder)]
#[builder(doc)]
pub struct PropOpts<E: ErrorCtrl> {
    /// Initial step size, defaults to one hundredth of the propagation span.
    #[builder(default, setter(strip_option))]
    pub init_step: Option<f64>,
    /// Upper bound of the adapted step size, unbounded by default.
    #[builder(default, setter(strip_option))]
    pub max_step: Option<f64>,
    #[builder(default = DEFAULT_TOLERANCE)]
    pub tolerance: f64,
    /// Safety factor `beta` of the step size update `h_new = beta * h * (tol / err)^(1 / order)`
    #[builder(default = DEFAULT_BETA)]
    pub beta: f64,
    /// Smallest factor by which a step can be shrunk in a single adaptation
    #[builder(default = 0.2)]
    pub min_factor: f64,
    /// Largest factor by which a step can be grown in a single adaptation
    #[builder(default = 5.0)]
    pub max_factor: f64,
    /// Maximum number of consecutive attempts at a given step before giving up
    #[builder(default = 50)]
    pub attempts: u8,
    #[builder(default = false)]
    pub fixed_step: bool,
    #[builder(default)]
    pub error_ctrl: E,
}

impl<E: ErrorCtrl> PropOpts<E> {
    /// `with_adaptive_step` initializes an `PropOpts` such that the integrator is used with an
    ///  adaptive step size. The number of attempts is fixed to 50 (as in GMAT).
    pub fn with_adaptive_step(tolerance: f64, beta: f64, error_ctrl: E) -> Self {
        PropOpts {
            init_step: None,
            max_step: None,
            tolerance,
            beta,
            min_factor: 0.2,
            max_factor: 5.0,
            attempts: 50,
            fixed_step: false,
            error_ctrl,
        }
    }

    /// Returns the factor by which to multiply the current step size given the error of that step.
    ///
    /// The factor is `beta * (tolerance / error)^(1 / order)`, clamped to `[min_factor, max_factor]`.
    pub fn step_factor(&self, error: f64, order: u8) -> f64 {
        if error == 0.0 {
            // The embedded solutions agree exactly: grow as much as allowed
            self.max_factor
        } else if !error.is_finite() {
            self.min_factor
        } else {
            (self.beta * (self.tolerance / error).powf(1.0 / f64::from(order)))
                .clamp(self.min_factor, self.max_factor)
        }
    }
}

impl<E: ErrorCtrl> fmt::Display for PropOpts<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fixed_step {
            match self.init_step {
                Some(step) => write!(f, "fixed step: {step:e}"),
                None => write!(f, "fixed step: span / 100"),
            }
        } else {
            write!(
                f,
                "tol: {:e}, beta: {}, factors: [{}, {}], attempts: {}",
                self.tolerance, self.beta, self.min_factor, self.max_factor, self.attempts,
            )
        }
    }
}

impl PropOpts<LargestError> {
    /// `with_fixed_step` initializes an `PropOpts` such that the integrator is used with a fixed
    ///  step size.
    pub fn with_fixed_step(step: f64) -> Self {
        PropOpts {
            init_step: Some(step),
            max_step: Some(step),
            tolerance: 0.0,
            beta: DEFAULT_BETA,
            min_factor: 1.0,
            max_factor: 1.0,
            attempts: 0,
            fixed_step: true,
            error_ctrl: LargestError,
        }
    }

    /// Returns the default options with a specific tolerance.
    #[allow(clippy::field_reassign_with_default)]
    pub fn with_tolerance(tolerance: f64) -> Self {
        let mut opts = Self::default();
        opts.tolerance = tolerance;
        opts
    }
}

impl Default for PropOpts<LargestError> {
    /// `default` returns an adaptive step with the default tolerance and safety factor.
    fn default() -> PropOpts<LargestError> {
        Self::with_adaptive_step(DEFAULT_TOLERANCE, DEFAULT_BETA, LargestError)
    }
}

#[test]
fn test_options() {
    use super::error_ctrl::RSSError;

    let opts = PropOpts::with_fixed_step(1e-1);
    assert_eq!(opts.init_step, Some(1e-1));
    assert_eq!(opts.max_step, Some(1e-1));
    assert!(opts.tolerance.abs() < f64::EPSILON);
    assert!(opts.fixed_step);

    let opts = PropOpts::with_adaptive_step(1e-2, 0.9, RSSError);
    assert_eq!(opts.init_step, None);
    assert!((opts.tolerance - 1e-2).abs() < f64::EPSILON);
    assert!((opts.beta - 0.9).abs() < f64::EPSILON);
    assert!(!opts.fixed_step);

    let opts: PropOpts<LargestError> = Default::default();
    assert!((opts.tolerance - 0.2).abs() < f64::EPSILON);
    assert!((opts.beta - 0.8).abs() < f64::EPSILON);
    assert_eq!(opts.attempts, 50);
    assert!(!opts.fixed_step);

    let opts = PropOpts::<LargestError>::builder()
        .tolerance(500.0)
        .init_step(1.0)
        .attempts(10)
        .build();
    assert_eq!(opts.init_step, Some(1.0));
    assert_eq!(opts.max_step, None);
    assert!((opts.beta - 0.8).abs() < f64::EPSILON);
    assert_eq!(opts.attempts, 10);
}

#[test]
fn test_step_factor() {
    let opts = PropOpts::with_tolerance(1.0);
    // Error equal to the tolerance: only the safety factor applies
    assert!((opts.step_factor(1.0, 5) - 0.8).abs() < f64::EPSILON);
    // Error 32 times smaller than tolerance: doubled by the fifth root
    assert!((opts.step_factor(1.0 / 32.0, 5) - 1.6).abs() < 1e-14);
    // Clamped on both ends
    assert_eq!(opts.step_factor(1e-30, 5), 5.0);
    assert_eq!(opts.step_factor(1e30, 5), 0.2);
    assert_eq!(opts.step_factor(0.0, 5), 5.0);
    assert_eq!(opts.step_factor(f64::NAN, 5), 0.2);
    assert_eq!(opts.step_factor(f64::INFINITY, 5), 0.2);
}
