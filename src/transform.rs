//! Per-frame particle transform.
//!
//! [`transform`] turns the immutable [`ParticleField`] plus the two live
//! scalars (morph factor and elapsed time) into renderable buffers. The
//! render shader runs the same steps per vertex on the GPU; this CPU version
//! exists so the transform can be tested and inspected without a device.
//!
//! Per particle:
//!
//! 1. Blend the two rest positions by the morph factor.
//! 2. Add a floating offset sampled from simplex noise keyed by time and the
//!    particle's seed, scaled by `factor * 1.5` (still when assembled).
//! 3. Twist the horizontal plane by an angle that peaks mid-transition and
//!    falls off with distance from the tree's axis.
//! 4. Pulse the size while scattered or transitioning.
//! 5. Twinkle the color with noise and apply the exposure boost.
//!
//! Distance attenuation of the size depends on the camera, so it is left to
//! the render shader.

use crate::field::ParticleField;
use crate::morph::{blend, vortex_intensity};
use crate::noise::simplex3;
use glam::Vec3;

/// Noise offset amplitude at full scatter.
pub const FLOAT_AMPLITUDE: f32 = 1.5;
/// Extra weight on vertical drift.
pub const VERTICAL_DRIFT: f32 = 1.5;
/// Twist angle in radians at peak intensity on the axis.
pub const VORTEX_ANGLE: f32 = 4.0;
/// Twist falloff per unit of assembled radius.
pub const VORTEX_FALLOFF: f32 = 0.1;
/// Intensity below which the twist is skipped.
pub const VORTEX_CUTOFF: f32 = 0.01;
/// Relative size pulse at full scatter.
pub const PULSE_DEPTH: f32 = 0.2;
/// Multiplier applied to colors ahead of bloom.
pub const EXPOSURE_BOOST: f32 = 3.0;
/// Pixel scale for billboard sizes (`size * POINT_SCALE / depth`).
pub const POINT_SCALE: f32 = 400.0;

/// Output of one frame's transform, parallel to the field's arrays.
#[derive(Debug, Clone, Default)]
pub struct RenderBuffers {
    pub positions: Vec<Vec3>,
    pub sizes: Vec<f32>,
    pub colors: Vec<Vec3>,
}

impl RenderBuffers {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            positions: Vec::with_capacity(n),
            sizes: Vec::with_capacity(n),
            colors: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Transform every particle for one frame.
pub fn transform(field: &ParticleField, factor: f32, time: f32) -> RenderBuffers {
    let mut out = RenderBuffers::with_capacity(field.len());
    transform_into(field, factor, time, &mut out);
    out
}

/// Like [`transform`], reusing the allocations in `out`.
pub fn transform_into(field: &ParticleField, factor: f32, time: f32, out: &mut RenderBuffers) {
    out.positions.clear();
    out.sizes.clear();
    out.colors.clear();

    let factor = factor.clamp(0.0, 1.0);
    let twist = vortex_intensity(factor);

    for i in 0..field.len() {
        let seed = field.seeds()[i];
        let assembled = field.assembled()[i];

        let mut pos = blend(assembled, field.scattered()[i], factor);
        pos += float_offset(seed, time) * (factor * FLOAT_AMPLITUDE);
        if twist > VORTEX_CUTOFF {
            pos = twist_xz(pos, twist_angle(assembled, twist));
        }

        out.positions.push(pos);
        out.sizes.push(field.sizes()[i] * pulse(seed, time, factor));
        out.colors.push(field.colors()[i] * twinkle(pos, time) * EXPOSURE_BOOST);
    }
}

/// Unscaled floating offset for a particle at `time`.
pub fn float_offset(seed: Vec3, time: f32) -> Vec3 {
    Vec3::new(
        simplex3(Vec3::new(time * 0.1, seed.y, 0.0)),
        simplex3(Vec3::new(seed.x, time * 0.15, 0.0)) * VERTICAL_DRIFT,
        simplex3(Vec3::new(0.0, seed.z, time * 0.1)),
    )
}

/// Twist angle for a particle: strongest near the axis of the assembled tree.
#[inline]
pub fn twist_angle(assembled: Vec3, intensity: f32) -> f32 {
    let axis_distance = Vec3::new(assembled.x, 0.0, assembled.z).length();
    intensity * VORTEX_ANGLE * (1.0 - axis_distance * VORTEX_FALLOFF)
}

/// Rotate the horizontal (x, z) coordinates by `angle`, leaving y alone.
#[inline]
pub fn twist_xz(p: Vec3, angle: f32) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(c * p.x + s * p.z, p.y, -s * p.x + c * p.z)
}

/// Size multiplier: 1 at rest, pulsing by up to ±20% as the factor grows.
#[inline]
pub fn pulse(seed: Vec3, time: f32, factor: f32) -> f32 {
    1.0 + (time * 2.0 + seed.x * 10.0).sin() * PULSE_DEPTH * factor
}

/// Brightness multiplier in [0.4, 1.0] from noise at the particle's position.
#[inline]
pub fn twinkle(pos: Vec3, time: f32) -> f32 {
    let sparkle = simplex3(pos * 0.5 + Vec3::splat(time * 2.0));
    0.7 + 0.3 * (sparkle * 10.0).sin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ParticleField;

    fn field() -> ParticleField {
        ParticleField::generate_seeded(1000, 2024)
    }

    #[test]
    fn test_output_lengths() {
        let f = field();
        let out = transform(&f, 0.4, 3.0);
        assert_eq!(out.len(), f.len());
        assert_eq!(out.sizes.len(), f.len());
        assert_eq!(out.colors.len(), f.len());
    }

    #[test]
    fn test_assembled_is_still() {
        let f = field();
        for time in [0.0, 1.7, 42.0] {
            let out = transform(&f, 0.0, time);
            assert_eq!(out.positions, f.assembled());
            assert_eq!(out.sizes, f.sizes());
        }
    }

    #[test]
    fn test_fully_scattered_has_no_twist() {
        let f = field();
        let out = transform(&f, 1.0, 0.0);
        for i in 0..f.len() {
            let expected = f.scattered()[i] + float_offset(f.seeds()[i], 0.0) * FLOAT_AMPLITUDE;
            assert!((out.positions[i] - expected).length() < 1e-4);
        }
    }

    #[test]
    fn test_twist_preserves_height_and_radius() {
        let p = Vec3::new(3.0, -1.5, 4.0);
        let q = twist_xz(p, 1.234);
        assert_eq!(q.y, p.y);
        assert!((Vec3::new(q.x, 0.0, q.z).length() - 5.0).abs() < 1e-5);
        assert_eq!(twist_xz(p, 0.0), p);
    }

    #[test]
    fn test_twist_weaker_away_from_axis() {
        let near = twist_angle(Vec3::new(0.5, 0.0, 0.0), 1.0);
        let far = twist_angle(Vec3::new(4.0, 0.0, 0.0), 1.0);
        assert!(near > far);
        assert_eq!(twist_angle(Vec3::new(4.0, 2.0, 0.0), 0.0), 0.0);
    }

    #[test]
    fn test_pulse_only_when_scattered() {
        let seed = Vec3::new(0.3, 0.6, 0.9);
        assert_eq!(pulse(seed, 12.3, 0.0), 1.0);
        for k in 0..100 {
            let p = pulse(seed, k as f32 * 0.1, 1.0);
            assert!((0.8 - 1e-6..=1.2 + 1e-6).contains(&p));
        }
    }

    #[test]
    fn test_twinkle_range() {
        for k in 0..200 {
            let t = twinkle(Vec3::new(k as f32 * 0.37, 1.0, -2.0), k as f32 * 0.05);
            assert!((0.4 - 1e-6..=1.0 + 1e-6).contains(&t));
        }
    }

    #[test]
    fn test_colors_are_boosted() {
        let f = field();
        let out = transform(&f, 0.0, 0.0);
        for (lit, base) in out.colors.iter().zip(f.colors()) {
            let ratio_bound = *base * EXPOSURE_BOOST + Vec3::splat(1e-5);
            assert!(lit.cmple(ratio_bound).all());
            assert!(lit.cmpge(*base * 0.4 * EXPOSURE_BOOST - Vec3::splat(1e-5)).all());
        }
    }

    #[test]
    fn test_transform_into_reuses_buffers() {
        let f = field();
        let mut out = RenderBuffers::default();
        transform_into(&f, 0.5, 1.0, &mut out);
        transform_into(&f, 0.5, 1.0, &mut out);
        assert_eq!(out.len(), f.len());
        assert!(out.positions.iter().all(|p| p.is_finite()));
    }
}
