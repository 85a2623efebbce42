//! Random draws used when placing blips.

use std::f64::consts::E;

use rand::Rng;

use decoy_core::config::Extent;
use decoy_core::enums::RangeDistribution;

/// Pick one of the extents uniformly. `None` when there are none.
pub fn pick_extent<'a, R: Rng + ?Sized>(extents: &'a [Extent], rng: &mut R) -> Option<&'a Extent> {
    if extents.is_empty() {
        return None;
    }
    extents.get(rng.gen_range(0..extents.len()))
}

/// Uniform draw inside an extent; a degenerate extent returns its bound.
pub fn draw_uniform<R: Rng + ?Sized>(extent: &Extent, rng: &mut R) -> f64 {
    if extent.width() <= 0.0 {
        return extent.min;
    }
    rng.gen_range(extent.min..=extent.max)
}

/// Radial draw. Log and exponential laws push blips toward the outer edge.
pub fn draw_radius<R: Rng + ?Sized>(
    extent: &Extent,
    distribution: RangeDistribution,
    rng: &mut R,
) -> f64 {
    let width = extent.width();
    match distribution {
        RangeDistribution::Uniform => draw_uniform(extent, rng),
        RangeDistribution::Log => {
            let u: f64 = rng.gen_range(0.1..=1.0);
            extent.min + width * (1.0 + u.log10())
        }
        RangeDistribution::Exponential => {
            let u: f64 = rng.gen_range(E.recip()..=1.0);
            extent.min + width * (1.0 + u.ln())
        }
    }
}

/// Stable 64-bit seed from a generator name and scan index (FNV-1a).
pub fn stable_seed(name: &str, scan_index: u64) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for byte in name.bytes().chain(scan_index.to_le_bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_radius_stays_inside_extent() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let extent = Extent::new(10_000.0, 50_000.0);
        for distribution in [
            RangeDistribution::Uniform,
            RangeDistribution::Log,
            RangeDistribution::Exponential,
        ] {
            for _ in 0..500 {
                let r = draw_radius(&extent, distribution, &mut rng);
                assert!(
                    r >= extent.min - 1e-6 && r <= extent.max + 1e-6,
                    "{distribution:?} drew {r}"
                );
            }
        }
    }

    #[test]
    fn test_log_law_favors_outer_edge() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let extent = Extent::new(0.0, 1.0);
        let n = 2000;
        let mean: f64 =
            (0..n).map(|_| draw_radius(&extent, RangeDistribution::Log, &mut rng)).sum::<f64>()
                / n as f64;
        assert!(mean > 0.6, "log placement mean {mean} should sit past the midpoint");
    }

    #[test]
    fn test_degenerate_extent() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let point = Extent::new(3.0, 3.0);
        assert_eq!(draw_uniform(&point, &mut rng), 3.0);
    }

    #[test]
    fn test_pick_extent_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(pick_extent(&[], &mut rng).is_none());
    }

    #[test]
    fn test_stable_seed() {
        assert_eq!(stable_seed("raid", 3), stable_seed("raid", 3));
        assert_ne!(stable_seed("raid", 3), stable_seed("raid", 4));
        assert_ne!(stable_seed("raid", 3), stable_seed("raie", 3));
    }
}
