//! Background star shell.
//!
//! A few thousand faint points on a thick spherical shell far outside the
//! tree. Each star's radius steps inward by a random fraction of
//! `depth / count`, so the shell fills from `radius + depth` toward `radius`.
//! Hue sweeps the full wheel across the star index at a fixed pale lightness.
//! All stars share one size drawn at generation.

use crate::config::StarsConfig;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Lightness of every star color.
const STAR_LIGHTNESS: f32 = 0.9;

/// One star as uploaded to the GPU. Matches the vertex inputs of
/// [`crate::shader::star_shader`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Star {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub size: f32,
}

#[derive(Debug, Clone, Default)]
pub struct StarField {
    stars: Vec<Star>,
}

impl StarField {
    pub fn generate(config: &StarsConfig) -> Self {
        Self::generate_with_rng(config, &mut SmallRng::from_entropy())
    }

    pub fn generate_seeded(config: &StarsConfig, seed: u64) -> Self {
        Self::generate_with_rng(config, &mut SmallRng::seed_from_u64(seed))
    }

    pub fn generate_with_rng<R: Rng>(config: &StarsConfig, rng: &mut R) -> Self {
        let count = config.count;
        let size = (0.5 + 0.5 * rng.gen::<f32>()) * config.factor;
        let increment = config.depth / count.max(1) as f32;
        let mut r = config.radius + config.depth;

        let stars = (0..count)
            .map(|i| {
                r -= increment * rng.gen::<f32>();
                let hue = i as f32 / count as f32;
                Star {
                    position: shell_point(r, rng).to_array(),
                    color: hsl_to_rgb(hue, config.saturation, STAR_LIGHTNESS).to_array(),
                    size,
                }
            })
            .collect();

        Self { stars }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stars.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }
}

/// Area-uniform point at distance `r` from the origin.
fn shell_point<R: Rng>(r: f32, rng: &mut R) -> Vec3 {
    let phi = (1.0 - 2.0 * rng.gen::<f32>()).acos();
    let theta = rng.gen::<f32>() * TAU;
    Vec3::new(
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
        r * phi.sin() * theta.cos(),
    )
}

/// HSL with all components in [0, 1] (hue wraps) to RGB.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Vec3 {
    let h = hue.rem_euclid(1.0);
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);
    if s == 0.0 {
        return Vec3::splat(l);
    }

    let hi = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let lo = 2.0 * l - hi;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            lo + (hi - lo) * 6.0 * t
        } else if t < 0.5 {
            hi
        } else if t < 2.0 / 3.0 {
            lo + (hi - lo) * 6.0 * (2.0 / 3.0 - t)
        } else {
            lo
        }
    };
    Vec3::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_shell_bounds() {
        let config = StarsConfig::default();
        let field = StarField::generate_seeded(&config, 5);
        assert_eq!(field.len(), 6000);

        let size = field.stars()[0].size;
        assert!((0.5 * config.factor..=config.factor).contains(&size));
        for star in field.stars() {
            let r = Vec3::from_array(star.position).length();
            assert!(r >= config.radius - 1e-2 && r <= config.radius + config.depth + 1e-2, "r {}", r);
            assert_eq!(star.size, size);
            assert!(star.color.iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn test_seeded_stars_repeat() {
        let config = StarsConfig { count: 50, ..Default::default() };
        let a = StarField::generate_seeded(&config, 9);
        let b = StarField::generate_seeded(&config, 9);
        assert_eq!(a.stars(), b.stars());
    }

    #[test]
    fn test_empty_shell() {
        let config = StarsConfig { count: 0, ..Default::default() };
        assert!(StarField::generate_seeded(&config, 1).is_empty());
    }

    #[test]
    fn test_hsl_to_rgb() {
        assert!((hsl_to_rgb(0.0, 1.0, 0.5) - Vec3::X).length() < 1e-6);
        assert!((hsl_to_rgb(1.0 / 3.0, 1.0, 0.5) - Vec3::Y).length() < 1e-5);
        assert!((hsl_to_rgb(2.0 / 3.0, 1.0, 0.5) - Vec3::Z).length() < 1e-5);
        assert_eq!(hsl_to_rgb(0.4, 0.0, 0.9), Vec3::splat(0.9));

        // Pale star tones keep every channel bright.
        let pale = hsl_to_rgb(0.25, 1.0, STAR_LIGHTNESS);
        assert!(pale.min_element() >= 0.8 - 1e-6);
    }

    #[test]
    fn test_star_layout_is_packed() {
        assert_eq!(std::mem::size_of::<Star>(), 28);
    }
}
