//! Weighted random selection over static variant tables.

use rand::Rng;

/// Weighted sampling over (value, weight) pairs.
///
/// Panics on an empty table; callers pick from static non-empty
/// variant lists.
pub fn weighted_pick<'a, R: Rng + ?Sized>(variants: &'a [(&'a str, u32)], rng: &mut R) -> &'a str {
    let total: u32 = variants.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (text, weight) in variants {
        if roll < *weight {
            return text;
        }
        roll -= weight;
    }
    variants[variants.len() - 1].0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_weighted_pick_stays_in_table() {
        let variants: &[(&str, u32)] = &[("a", 3), ("b", 1), ("c", 1)];
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let picked = weighted_pick(variants, &mut rng);
            assert!(variants.iter().any(|(v, _)| *v == picked));
        }
    }

    #[test]
    fn test_weighted_pick_reaches_every_variant() {
        let variants: &[(&str, u32)] = &[("a", 1), ("b", 1), ("c", 1)];
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(weighted_pick(variants, &mut rng));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_weighted_pick_honors_zero_weight() {
        let variants: &[(&str, u32)] = &[("never", 0), ("always", 1)];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            assert_eq!(weighted_pick(variants, &mut rng), "always");
        }
    }
}
