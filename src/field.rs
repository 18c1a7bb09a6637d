//! Particle field generation.
//!
//! A [`ParticleField`] is the fixed set of per-particle attributes the morph
//! engine animates: two rest positions (the assembled spiral cone and the
//! scattered spherical shell), a color, a size, and a random seed triple.
//! It is generated once per session and never mutated; only the shared morph
//! factor changes over time.
//!
//! Attributes are stored as five parallel arrays so they can be uploaded to
//! the GPU as separate instance buffers without repacking.
//!
//! # Layout
//!
//! For particle `i` of `count`, with `t = i / count`:
//!
//! - **Assembled**: a cone spiral making 75 full turns. The radius grows
//!   linearly to 4.5 (with ±0.3 jitter) while the height falls from +5.5 at
//!   the apex (`t = 0`) to −5.5 at the base.
//! - **Scattered**: area-uniform point on a sphere with radius in [12, 20).
//! - **Category**: roughly 15% gold ornaments, the rest emerald needles whose
//!   green brightens toward the top of the tree.

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

/// Particle count of the standard tree.
pub const DEFAULT_PARTICLE_COUNT: u32 = 5000;

/// Spiral sweep in radians over the whole tree.
const SPIRAL_SWEEP: f32 = 75.0 * TAU;
const CONE_BASE_RADIUS: f32 = 4.5;
const CONE_RADIUS_JITTER: f32 = 0.3;
const CONE_HEIGHT: f32 = 11.0;
const SHELL_MIN_RADIUS: f32 = 12.0;
const SHELL_MAX_RADIUS: f32 = 20.0;

/// Category draws above this value become ornaments.
const ORNAMENT_THRESHOLD: f32 = 0.85;
/// Maximum blend toward the shadow emerald for needles.
const NEEDLE_SHADOW_MAX: f32 = 0.3;

/// Size range for ornaments.
pub const ORNAMENT_SIZE: (f32, f32) = (0.6, 1.4);
/// Size range for needles.
pub const NEEDLE_SIZE: (f32, f32) = (0.1, 0.5);

/// Fixed palette tones as RGB triples in [0, 1].
pub mod palette {
    use glam::Vec3;

    /// `#004225`
    pub const EMERALD_DEEP: Vec3 = Vec3::new(0.0, 66.0 / 255.0, 37.0 / 255.0);
    /// `#50C878`
    pub const EMERALD_BRIGHT: Vec3 = Vec3::new(80.0 / 255.0, 200.0 / 255.0, 120.0 / 255.0);
    /// `#002211`
    pub const EMERALD_SHADOW: Vec3 = Vec3::new(0.0, 34.0 / 255.0, 17.0 / 255.0);
    /// `#B8860B`
    pub const GOLD_DEEP: Vec3 = Vec3::new(184.0 / 255.0, 134.0 / 255.0, 11.0 / 255.0);
    /// `#FFD700`
    pub const GOLD_BRIGHT: Vec3 = Vec3::new(1.0, 215.0 / 255.0, 0.0);

    /// `0xRRGGBB` to an RGB triple in [0, 1].
    pub fn hex(rgb: u32) -> Vec3 {
        Vec3::new(
            ((rgb >> 16) & 0xFF) as f32 / 255.0,
            ((rgb >> 8) & 0xFF) as f32 / 255.0,
            (rgb & 0xFF) as f32 / 255.0,
        )
    }

    /// Decode sRGB-encoded tones for the linear render target.
    pub fn srgb_to_linear(c: Vec3) -> Vec3 {
        let channel = |v: f32| {
            if v <= 0.04045 {
                v / 12.92
            } else {
                ((v + 0.055) / 1.055).powf(2.4)
            }
        };
        Vec3::new(channel(c.x), channel(c.y), channel(c.z))
    }
}

/// Visual category of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Large gold particles.
    Ornament,
    /// Small emerald particles.
    Needle,
}

impl Category {
    /// Inclusive-exclusive size range for this category.
    pub fn size_range(self) -> (f32, f32) {
        match self {
            Category::Ornament => ORNAMENT_SIZE,
            Category::Needle => NEEDLE_SIZE,
        }
    }
}

/// Immutable per-particle attributes, struct-of-arrays.
#[derive(Debug, Clone)]
pub struct ParticleField {
    assembled: Vec<Vec3>,
    scattered: Vec<Vec3>,
    colors: Vec<Vec3>,
    sizes: Vec<f32>,
    seeds: Vec<Vec3>,
    categories: Vec<Category>,
}

impl ParticleField {
    /// Generate a field from ambient randomness.
    pub fn generate(count: u32) -> Self {
        Self::generate_with_rng(count, &mut SmallRng::from_entropy())
    }

    /// Generate a reproducible field from a fixed seed.
    pub fn generate_seeded(count: u32, seed: u64) -> Self {
        Self::generate_with_rng(count, &mut SmallRng::seed_from_u64(seed))
    }

    /// Generate a field drawing from the given RNG.
    pub fn generate_with_rng<R: Rng>(count: u32, rng: &mut R) -> Self {
        let n = count as usize;
        let mut field = Self {
            assembled: Vec::with_capacity(n),
            scattered: Vec::with_capacity(n),
            colors: Vec::with_capacity(n),
            sizes: Vec::with_capacity(n),
            seeds: Vec::with_capacity(n),
            categories: Vec::with_capacity(n),
        };

        for i in 0..count {
            let t = i as f32 / count as f32;

            field.assembled.push(cone_position(t, rng));
            field.scattered.push(shell_position(rng));

            let (category, color, size) = if rng.gen::<f32>() > ORNAMENT_THRESHOLD {
                let color = palette::GOLD_DEEP.lerp(palette::GOLD_BRIGHT, rng.gen::<f32>());
                (Category::Ornament, color, rng.gen_range(ORNAMENT_SIZE.0..ORNAMENT_SIZE.1))
            } else {
                let height_weight = (1.0 - t).sqrt();
                let color = palette::EMERALD_DEEP
                    .lerp(palette::EMERALD_BRIGHT, height_weight)
                    .lerp(palette::EMERALD_SHADOW, rng.gen::<f32>() * NEEDLE_SHADOW_MAX);
                (Category::Needle, color, rng.gen_range(NEEDLE_SIZE.0..NEEDLE_SIZE.1))
            };
            field.categories.push(category);
            field.colors.push(color);
            field.sizes.push(size);

            field.seeds.push(Vec3::new(rng.gen(), rng.gen(), rng.gen()));
        }

        field
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.assembled.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.assembled.is_empty()
    }

    /// Rest positions in the tree layout.
    pub fn assembled(&self) -> &[Vec3] {
        &self.assembled
    }

    /// Rest positions in the scattered layout.
    pub fn scattered(&self) -> &[Vec3] {
        &self.scattered
    }

    /// Base RGB colors.
    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }

    /// Base sizes.
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    /// Per-particle animation phase seeds in [0, 1).
    pub fn seeds(&self) -> &[Vec3] {
        &self.seeds
    }

    /// Category each particle was drawn as.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

fn cone_position<R: Rng>(t: f32, rng: &mut R) -> Vec3 {
    let angle = t * SPIRAL_SWEEP;
    let radius = t * CONE_BASE_RADIUS + (rng.gen::<f32>() - 0.5) * 2.0 * CONE_RADIUS_JITTER;
    let height = (1.0 - t) * CONE_HEIGHT - CONE_HEIGHT * 0.5;
    Vec3::new(radius * angle.cos(), height, radius * angle.sin())
}

fn shell_position<R: Rng>(rng: &mut R) -> Vec3 {
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).clamp(-1.0, 1.0).acos();
    let r = rng.gen_range(SHELL_MIN_RADIUS..SHELL_MAX_RADIUS);
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srgb_to_linear() {
        assert_eq!(palette::srgb_to_linear(Vec3::ZERO), Vec3::ZERO);
        assert!((palette::srgb_to_linear(Vec3::ONE) - Vec3::ONE).length() < 1e-5);
        let mid = palette::srgb_to_linear(Vec3::splat(0.5));
        assert!((mid.x - 0.214).abs() < 1e-3);
        // Linear gold stays gold: red dominates, blue nearly vanishes.
        let gold = palette::srgb_to_linear(palette::GOLD_BRIGHT);
        assert!(gold.x > gold.y && gold.z == 0.0);
    }

    fn field() -> ParticleField {
        ParticleField::generate_seeded(DEFAULT_PARTICLE_COUNT, 1225)
    }

    fn within(v: Vec3, a: Vec3, b: Vec3) -> bool {
        let lo = a.min(b) - Vec3::splat(1e-5);
        let hi = a.max(b) + Vec3::splat(1e-5);
        v.cmpge(lo).all() && v.cmple(hi).all()
    }

    #[test]
    fn test_array_lengths() {
        let f = field();
        assert_eq!(f.len(), 5000);
        assert_eq!(f.assembled().len(), 5000);
        assert_eq!(f.scattered().len(), 5000);
        assert_eq!(f.colors().len(), 5000);
        assert_eq!(f.sizes().len(), 5000);
        assert_eq!(f.seeds().len(), 5000);
    }

    #[test]
    fn test_empty_field() {
        let f = ParticleField::generate_seeded(0, 1);
        assert!(f.is_empty());
    }

    #[test]
    fn test_no_nan_coordinates() {
        let f = field();
        for i in 0..f.len() {
            assert!(f.assembled()[i].is_finite());
            assert!(f.scattered()[i].is_finite());
            assert!(f.colors()[i].is_finite());
            assert!(f.sizes()[i].is_finite());
        }
    }

    #[test]
    fn test_sizes_match_category() {
        let f = field();
        for (size, category) in f.sizes().iter().zip(f.categories()) {
            let (lo, hi) = category.size_range();
            assert!(*size >= lo && *size < hi, "{:?} size {}", category, size);
        }
    }

    #[test]
    fn test_ornament_share() {
        let f = field();
        let ornaments = f.categories().iter().filter(|c| **c == Category::Ornament).count();
        let share = ornaments as f32 / f.len() as f32;
        assert!(share > 0.12 && share < 0.18, "ornament share {}", share);
    }

    #[test]
    fn test_scattered_on_shell() {
        let f = field();
        for p in f.scattered() {
            let r = p.length();
            assert!(r >= SHELL_MIN_RADIUS - 1e-3 && r <= SHELL_MAX_RADIUS + 1e-3, "radius {}", r);
        }
    }

    #[test]
    fn test_assembled_cone() {
        let f = field();
        let n = f.len() as f32;
        for (i, p) in f.assembled().iter().enumerate() {
            let t = i as f32 / n;
            let expected_y = (1.0 - t) * 11.0 - 5.5;
            assert!((p.y - expected_y).abs() < 1e-4);
            let r = Vec3::new(p.x, 0.0, p.z).length();
            assert!(r <= t * CONE_BASE_RADIUS + CONE_RADIUS_JITTER + 1e-4);
        }
        assert!((f.assembled()[0].y - 5.5).abs() < 1e-6);
    }

    #[test]
    fn test_seeds_in_unit_range() {
        let f = field();
        for s in f.seeds() {
            assert!(s.cmpge(Vec3::ZERO).all() && s.cmplt(Vec3::ONE).all());
        }
    }

    #[test]
    fn test_colors_within_palettes() {
        let f = field();
        for (c, category) in f.colors().iter().zip(f.categories()) {
            match category {
                Category::Ornament => {
                    assert!(within(*c, palette::GOLD_DEEP, palette::GOLD_BRIGHT));
                }
                Category::Needle => {
                    let lo = palette::EMERALD_SHADOW.min(palette::EMERALD_DEEP);
                    assert!(within(*c, lo, palette::EMERALD_BRIGHT));
                }
            }
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = ParticleField::generate_seeded(500, 42);
        let b = ParticleField::generate_seeded(500, 42);
        let c = ParticleField::generate_seeded(500, 43);
        assert_eq!(a.assembled(), b.assembled());
        assert_eq!(a.colors(), b.colors());
        assert_ne!(a.scattered(), c.scattered());
    }

    #[test]
    fn test_hex_palette() {
        assert_eq!(palette::hex(0xFF0000), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(palette::hex(0x50C878), palette::EMERALD_BRIGHT);
        assert_eq!(palette::hex(0xB8860B), palette::GOLD_DEEP);
    }
}
