use log::debug;

use crate::config::*;

/// Classifies a seat from its margin only.
///
/// Seats without a usable margin land in the lowest tier; negative or NaN
/// margins are expected to be rejected before this point.
pub fn classify(margin: Option<f64>, thresholds: &TierThresholds) -> Tier {
    match margin {
        Some(m) if m < thresholds.critical => Tier::Critical,
        Some(m) if m < thresholds.high => Tier::High,
        Some(m) if m < thresholds.medium => Tier::Medium,
        _ => Tier::Low,
    }
}

/// Splits the results into tiers, each sorted by decreasing combined priority.
///
/// The sort is stable and ties are explicitly broken by roster order, so the
/// output does not depend on the order the results were handed in.
pub fn partition(results: &[EntityResult]) -> Vec<(Tier, Vec<EntityResult>)> {
    Tier::ALL
        .iter()
        .map(|&tier| {
            let mut members: Vec<EntityResult> = results
                .iter()
                .filter(|r| r.scores.tier == tier)
                .cloned()
                .collect();
            members.sort_by(|a, b| {
                b.scores
                    .combined_priority_tenths
                    .cmp(&a.scores.combined_priority_tenths)
                    .then(a.load_order.cmp(&b.load_order))
            });
            debug!("partition: tier {}: {} entities", tier.label(), members.len());
            (tier, members)
        })
        .collect()
}
