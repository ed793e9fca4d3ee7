use rand::Rng;

use crate::catalog::TraitAsset;

/// Pick one trait from `traits` by rarity weight, or `None`.
///
/// `none_chance` is a percentage in `[0, 100]` rolled *before* weighting: it
/// is the probability of selecting no trait at all, independent of the
/// individual weights. With the none-roll survived, each trait is selected
/// with probability `weight / total_weight`.
pub fn weighted_choice<'a, R: Rng + ?Sized>(
    traits: &'a [TraitAsset],
    none_chance: f64,
    rng: &mut R,
) -> Option<&'a TraitAsset> {
    if traits.is_empty() {
        return None;
    }
    if none_chance > 0.0 && rng.random_range(0.0..100.0) < none_chance {
        return None;
    }

    let total_weight: u32 = traits.iter().map(|t| t.weight).sum();
    let mut draw = rng.random_range(0.0..f64::from(total_weight));
    for t in traits {
        draw -= f64::from(t.weight);
        if draw <= 0.0 {
            return Some(t);
        }
    }
    // Floating-point error exhausted the walk; the list is non-empty, so the
    // last trait stands in.
    traits.last()
}
