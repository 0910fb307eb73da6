//! One euro filter: a low-pass filter whose cutoff rises with the speed of the signal.
//!
//! Smooth when the signal is at rest, responsive when it moves fast. The rotation variant works
//! directly on unit quaternions, using the relative rotation between samples as derivative.

use crate::config::FilterParams;
use glam::{Quat, Vec3};
use std::f32::consts::PI;

/// Stand-in for `dt` when there's no previous timestamp to measure against.
const MIN_DT: f32 = 1e-6;

/// A value the filter can smooth.
pub trait Filterable: Copy {
    /// Derivative reported before there are two samples to compare.
    fn identity_derivative() -> Self;
    /// Rate of change between `prev` and `cur`, `rate` being `1 / dt`.
    fn derivative(prev: Self, cur: Self, rate: f32) -> Self;
    fn magnitude(self) -> f32;
    /// Moves `from` towards `to` by `alpha` (0 keeps `from`, 1 yields `to`).
    fn interpolate(from: Self, to: Self, alpha: f32) -> Self;
}

impl Filterable for Vec3 {
    fn identity_derivative() -> Self {
        Vec3::ZERO
    }

    fn derivative(prev: Self, cur: Self, rate: f32) -> Self {
        (cur - prev) * rate
    }

    fn magnitude(self) -> f32 {
        self.length()
    }

    fn interpolate(from: Self, to: Self, alpha: f32) -> Self {
        from.lerp(to, alpha)
    }
}

impl Filterable for Quat {
    fn identity_derivative() -> Self {
        Quat::IDENTITY
    }

    fn derivative(prev: Self, cur: Self, rate: f32) -> Self {
        let mut dq = cur * prev.inverse();
        if dq.w < 0.0 {
            dq = -dq;
        }
        // Scaling the scalar part this way keeps w ~ 1 for small rotations, so the
        // normalized result stays a valid (if approximate) angular velocity.
        Quat::from_xyzw(
            dq.x * rate,
            dq.y * rate,
            dq.z * rate,
            dq.w * rate + (1.0 - rate),
        )
        .normalize()
    }

    fn magnitude(self) -> f32 {
        2.0 * self.w.abs().clamp(0.0, 1.0).acos()
    }

    fn interpolate(from: Self, to: Self, alpha: f32) -> Self {
        from.slerp(to, alpha).normalize()
    }
}

/// Single pole low-pass stage. The first sample passes through untouched.
#[derive(Clone, Debug)]
struct LowPass<T> {
    prev: Option<T>,
}

impl<T: Filterable> LowPass<T> {
    const fn new() -> Self {
        Self { prev: None }
    }

    fn filter(&mut self, sample: T, alpha: f32) -> T {
        let filtered = match self.prev {
            Some(prev) => T::interpolate(prev, sample, alpha),
            None => sample,
        };
        self.prev = Some(filtered);
        filtered
    }
}

#[inline]
fn alpha(dt: f32, cutoff: f32) -> f32 {
    let tau = 1.0 / (2.0 * PI * cutoff);
    1.0 / (1.0 + tau / dt)
}

#[derive(Clone, Debug)]
pub struct OneEuroFilter<T> {
    params: FilterParams,
    value: LowPass<T>,
    derivative: LowPass<T>,
    last_timestamp: Option<i64>,
}

pub type OneEuroFilterVector = OneEuroFilter<Vec3>;
pub type OneEuroFilterQuaternion = OneEuroFilter<Quat>;

impl<T: Filterable> OneEuroFilter<T> {
    pub const fn new(params: FilterParams) -> Self {
        Self {
            params,
            value: LowPass::new(),
            derivative: LowPass::new(),
            last_timestamp: None,
        }
    }

    pub fn params(&self) -> FilterParams {
        self.params
    }

    /// Feeds a sample taken at `timestamp` (nanoseconds) and returns the smoothed value.
    pub fn filter(&mut self, timestamp: i64, sample: T) -> T {
        let dt = match self.last_timestamp {
            Some(last) if timestamp > last => (timestamp - last) as f32 * 1e-9,
            Some(_) => {
                // Repeated or out of order sample, nothing new to learn from it.
                if let Some(prev) = self.value.prev {
                    return prev;
                }
                MIN_DT
            }
            None => MIN_DT,
        };
        self.last_timestamp = Some(timestamp);

        let dx = match self.value.prev {
            Some(prev) => T::derivative(prev, sample, 1.0 / dt),
            None => T::identity_derivative(),
        };
        let edx = self
            .derivative
            .filter(dx, alpha(dt, self.params.d_cutoff));
        let cutoff = self.params.min_cutoff + self.params.beta * edx.magnitude();

        self.value.filter(sample, alpha(dt, cutoff))
    }
}
