//! Maximum-information item selection with randomized tie-breaking.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::Rng;

use crate::config::SelectorConfig;
use crate::irt::estimator::fisher_information;
use crate::types::Item;

/// Pick the most informative unanswered item for the given ability.
///
/// Each candidate's Fisher information is multiplied by an independent
/// uniform jitter from `[jitter_min, jitter_max]` so near-tied items do not
/// always resolve to the same winner. An empty pool yields `None`, a normal
/// outcome the caller handles by widening the pool or ending the session.
pub fn select_next<'a, I, R>(
    theta: f64,
    candidates: I,
    answered: &HashSet<String>,
    rng: &mut R,
    config: &SelectorConfig,
) -> Option<&'a Item>
where
    I: IntoIterator<Item = &'a Item>,
    R: Rng + ?Sized,
{
    let mut best: Option<(&Item, f64)> = None;

    for item in candidates {
        if answered.contains(&item.id) {
            continue;
        }

        let jitter = rng.gen_range(config.jitter_min..=config.jitter_max);
        let score = fisher_information(theta, &item.params) * jitter;

        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((item, score)),
        }
    }

    if best.is_none() {
        tracing::warn!(theta, "no unanswered candidates available for selection");
    }

    best.map(|(item, _)| item)
}

/// Jitter-free ranking of the unanswered candidates by Fisher information,
/// best first. Used for ability-targeted pools where the caller wants the
/// whole ordering rather than a single pick.
pub fn rank_candidates<'a, I>(
    theta: f64,
    candidates: I,
    answered: &HashSet<String>,
) -> Vec<(&'a Item, f64)>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut ranked: Vec<(&Item, f64)> = candidates
        .into_iter()
        .filter(|item| !answered.contains(&item.id))
        .map(|item| (item, fisher_information(theta, &item.params)))
        .collect();

    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemParams, Subject};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn item(id: &str, difficulty: f64) -> Item {
        Item::new(
            id,
            Subject::Maths,
            "algebra",
            ItemParams::new(difficulty, 1.0, 0.25),
        )
    }

    #[test]
    fn selects_item_matched_to_ability() {
        let pool = vec![item("far-easy", -2.8), item("matched", 0.3), item("far-hard", 2.9)];
        let answered = HashSet::new();
        let mut rng = StdRng::seed_from_u64(7);

        let config = SelectorConfig::default();
        let picked = select_next(0.0, &pool, &answered, &mut rng, &config).unwrap();
        assert_eq!(picked.id, "matched");
    }

    #[test]
    fn skips_answered_items() {
        let pool = vec![item("a", 0.0), item("b", 0.4)];
        let answered: HashSet<String> = ["a".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(1);

        let config = SelectorConfig::default();
        let picked = select_next(0.0, &pool, &answered, &mut rng, &config).unwrap();
        assert_eq!(picked.id, "b");
    }

    #[test]
    fn exhausted_pool_yields_none() {
        let pool = vec![item("a", 0.0)];
        let answered: HashSet<String> = ["a".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(1);

        let config = SelectorConfig::default();
        assert!(select_next(0.0, &pool, &answered, &mut rng, &config).is_none());

        let empty: Vec<Item> = Vec::new();
        assert!(select_next(0.0, &empty, &answered, &mut rng, &config).is_none());
    }

    #[test]
    fn jitter_varies_picks_between_near_ties() {
        let pool = vec![item("twin-a", 0.3), item("twin-b", 0.3)];
        let answered = HashSet::new();
        let config = SelectorConfig::default();

        let mut seen = HashSet::new();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = select_next(0.0, &pool, &answered, &mut rng, &config).unwrap();
            seen.insert(picked.id.clone());
        }
        assert_eq!(seen.len(), 2, "near-tied items should both get served");
    }

    #[test]
    fn ranking_is_sorted_by_information() {
        let pool = vec![item("far", 2.9), item("near", 0.2), item("mid", 1.2)];
        let answered = HashSet::new();

        let ranked = rank_candidates(0.0, &pool, &answered);
        assert_eq!(ranked[0].0.id, "near");
        assert!(ranked[0].1 >= ranked[1].1 && ranked[1].1 >= ranked[2].1);
    }
}
