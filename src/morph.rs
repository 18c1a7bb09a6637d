//! Morph driver: the shared blend factor between the two layouts.
//!
//! Once per rendered frame the factor eases toward the target of the current
//! [`InteractionMode`] with a first-order low-pass filter:
//!
//! ```text
//! factor += (target - factor) * speed * 60 * dt
//! ```
//!
//! `speed * 60` is the convergence rate at a 60 fps baseline, which keeps the
//! perceived speed roughly independent of frame rate. Scattering eases at
//! 0.025 and assembling at a heavier 0.02. The factor approaches its target
//! asymptotically, so "settled" checks must use a tolerance.

use crate::mode::InteractionMode;
use glam::Vec3;
use std::f32::consts::PI;

/// Ease rate while scattering.
pub const SCATTER_SPEED: f32 = 0.025;
/// Ease rate while assembling.
pub const ASSEMBLE_SPEED: f32 = 0.02;
/// Frame rate the ease rates were tuned at.
pub const BASELINE_FPS: f32 = 60.0;

/// Default tolerance for [`MorphDriver::is_settled`].
pub const SETTLE_EPSILON: f32 = 1e-3;

/// Ease rate for a mode.
#[inline]
pub fn ease_speed(mode: InteractionMode) -> f32 {
    match mode {
        InteractionMode::Scattered => SCATTER_SPEED,
        InteractionMode::Assembled => ASSEMBLE_SPEED,
    }
}

/// Transition-only spin intensity: `sin(factor * π)`.
///
/// Zero at both rest states, 1.0 halfway through the morph.
#[inline]
pub fn vortex_intensity(factor: f32) -> f32 {
    let s = (factor * PI).sin();
    // sin(π) is ~-8.7e-8 in f32; rest states must not spin.
    if s.abs() < 1e-6 {
        0.0
    } else {
        s
    }
}

/// Blend between the two rest positions. `factor` is clamped to [0, 1], so
/// the result always lies on the segment between them.
#[inline]
pub fn blend(assembled: Vec3, scattered: Vec3, factor: f32) -> Vec3 {
    assembled.lerp(scattered, factor.clamp(0.0, 1.0))
}

/// Per-session morph state: the blend factor plus an elapsed-time
/// accumulator that drives the noise phases.
#[derive(Debug, Clone, Copy, Default)]
pub struct MorphDriver {
    factor: f32,
    elapsed: f32,
}

impl MorphDriver {
    /// Start fully assembled at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current blend factor, 0 = assembled, 1 = scattered.
    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Seconds of animation accumulated so far.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance one frame.
    ///
    /// Negative or non-finite `dt` counts as zero. The per-frame gain is
    /// capped at 1 so a long stall snaps to the target instead of
    /// overshooting it. Returns the new factor.
    pub fn update(&mut self, dt: f32, mode: InteractionMode) -> f32 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;

        let target = mode.target();
        let gain = (ease_speed(mode) * BASELINE_FPS * dt).min(1.0);
        self.factor = (self.factor + (target - self.factor) * gain).clamp(0.0, 1.0);
        self.factor
    }

    /// Whether the factor is within `epsilon` of the mode's target.
    pub fn is_settled(&self, mode: InteractionMode, epsilon: f32) -> bool {
        (mode.target() - self.factor).abs() <= epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_zero_dt_is_idempotent() {
        let mut driver = MorphDriver::new();
        driver.update(DT, InteractionMode::Scattered);
        let before = driver.factor();
        driver.update(0.0, InteractionMode::Scattered);
        driver.update(0.0, InteractionMode::Assembled);
        assert_eq!(driver.factor(), before);
    }

    #[test]
    fn test_bad_dt_is_ignored() {
        let mut driver = MorphDriver::new();
        driver.update(DT, InteractionMode::Scattered);
        let before = driver.factor();
        driver.update(-1.0, InteractionMode::Scattered);
        driver.update(f32::NAN, InteractionMode::Scattered);
        driver.update(f32::INFINITY, InteractionMode::Scattered);
        assert_eq!(driver.factor(), before);
    }

    #[test]
    fn test_single_step_matches_ease_rule() {
        let mut driver = MorphDriver::new();
        let f = driver.update(DT, InteractionMode::Scattered);
        assert!((f - 0.025).abs() < 1e-6);
    }

    #[test]
    fn test_monotonic_convergence_to_scattered() {
        let mut driver = MorphDriver::new();
        let mut last = driver.factor();
        for _ in 0..2_000 {
            let f = driver.update(DT, InteractionMode::Scattered);
            assert!(f >= last);
            assert!(f <= 1.0);
            last = f;
        }
        assert!(driver.is_settled(InteractionMode::Scattered, SETTLE_EPSILON));
    }

    #[test]
    fn test_monotonic_convergence_to_assembled() {
        let mut driver = MorphDriver::new();
        for _ in 0..2_000 {
            driver.update(DT, InteractionMode::Scattered);
        }
        let mut last = driver.factor();
        for _ in 0..2_000 {
            let f = driver.update(DT, InteractionMode::Assembled);
            assert!(f <= last);
            assert!(f >= 0.0);
            last = f;
        }
        assert!(driver.is_settled(InteractionMode::Assembled, SETTLE_EPSILON));
    }

    #[test]
    fn test_assembling_is_slower() {
        let mut scatter = MorphDriver::new();
        scatter.update(DT, InteractionMode::Scattered);

        let mut assemble = MorphDriver { factor: 1.0, elapsed: 0.0 };
        assemble.update(DT, InteractionMode::Assembled);

        assert!(scatter.factor() > 1.0 - assemble.factor());
    }

    #[test]
    fn test_long_stall_does_not_overshoot() {
        let mut driver = MorphDriver::new();
        let f = driver.update(5.0, InteractionMode::Scattered);
        assert_eq!(f, 1.0);
        let f = driver.update(5.0, InteractionMode::Assembled);
        assert_eq!(f, 0.0);
    }

    #[test]
    fn test_elapsed_accumulates() {
        let mut driver = MorphDriver::new();
        driver.update(0.5, InteractionMode::Assembled);
        driver.update(0.25, InteractionMode::Scattered);
        assert!((driver.elapsed() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_vortex_intensity_boundaries() {
        assert_eq!(vortex_intensity(0.0), 0.0);
        assert_eq!(vortex_intensity(1.0), 0.0);
        assert!((vortex_intensity(0.5) - 1.0).abs() < 1e-6);
        assert!(vortex_intensity(0.25) < vortex_intensity(0.5));
    }

    #[test]
    fn test_blend_is_convex_combination() {
        let a = Vec3::new(1.0, -2.0, 3.0);
        let b = Vec3::new(-12.0, 8.0, 15.0);
        let total = a.distance(b);
        for k in 0..=20 {
            let m = k as f32 / 20.0;
            let p = blend(a, b, m);
            assert!((a.distance(p) + p.distance(b) - total).abs() < 1e-4);
            assert!((a.distance(p) - m * total).abs() < 1e-4);
        }
        assert_eq!(blend(a, b, -0.5), a);
        assert_eq!(blend(a, b, 1.5), b);
    }
}
