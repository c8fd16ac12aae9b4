//! Reward candidate sampling

use classquest_core::{RewardCatalog, RewardEntry};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::DrawPolicy;

/// Sample `count` candidates from the catalog, independently and with
/// replacement
///
/// The same entry can appear more than once in one offer. An empty catalog
/// yields an empty candidate list (catalog validation rejects it upstream).
pub fn sample_candidates<'a, R: Rng + ?Sized>(
    catalog: &'a RewardCatalog,
    count: usize,
    policy: DrawPolicy,
    rng: &mut R,
) -> Vec<&'a RewardEntry> {
    let entries = catalog.entries();
    (0..count)
        .filter_map(|_| match policy {
            DrawPolicy::Uniform => entries.choose(rng),
            DrawPolicy::Weighted => entries.choose_weighted(rng, |e| e.weight).ok(),
        })
        .collect()
}
