use std::collections::HashMap;

use log::debug;

use crate::config::*;
use crate::tiering::classify;

// The holdings breakpoints of the priority score, with their bonus.
const HOLDINGS_PRIORITY_BREAKPOINTS: [(u32, u32); 3] = [(10, 3), (5, 2), (1, 1)];

const MAX_CONFLICT_PRIORITY: u32 = 3;

pub const MAX_INCONSISTENCY_SCORE: u32 = 100;
pub const MAX_PRIORITY_SCORE: u32 = 10;

fn holdings_term(entity: &Entity, rules: &ScoringRules) -> u32 {
    entity
        .holdings
        .saturating_mul(rules.holdings_multiplier)
        .min(rules.holdings_cap)
}

fn conflict_term(entity: &Entity, weights: &HashMap<&str, f64>, rules: &ScoringRules) -> u32 {
    let conflicts = entity.voting.votes.iter().filter(|v| v.conflicting);
    match rules.conflict_weighting {
        ConflictWeighting::Flat => (conflicts.count() as u32).saturating_mul(rules.conflict_points),
        ConflictWeighting::EventWeight => {
            let total: f64 = conflicts
                .map(|v| {
                    let w = weights.get(v.event_id.as_str()).cloned().unwrap_or(1.0);
                    rules.conflict_points as f64 * w.max(0.0)
                })
                .sum();
            total.round().min(u32::MAX as f64) as u32
        }
    }
}

fn vulnerability_term(entity: &Entity, rules: &ScoringRules) -> u32 {
    match entity.margin() {
        Some(m) if m < rules.vulnerability_threshold => rules.vulnerability_points,
        // An unknown margin never counts as vulnerable.
        _ => 0,
    }
}

/// The composite inconsistency score, clamped to [0, 100].
pub fn inconsistency_score(
    entity: &Entity,
    weights: &HashMap<&str, f64>,
    rules: &ScoringRules,
) -> u32 {
    let executive = if entity.executive_office {
        rules.executive_points
    } else {
        0
    };
    let total = holdings_term(entity, rules)
        .saturating_add(conflict_term(entity, weights, rules))
        .saturating_add(executive)
        .saturating_add(vulnerability_term(entity, rules));
    total.min(MAX_INCONSISTENCY_SCORE)
}

/// The outreach priority, between 1 and 10.
pub fn priority_score(entity: &Entity, thresholds: &TierThresholds) -> u32 {
    let holdings_bonus = HOLDINGS_PRIORITY_BREAKPOINTS
        .iter()
        .find(|(min, _)| entity.holdings >= *min)
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0);
    let conflicts_bonus = entity.voting.conflicting_votes().min(MAX_CONFLICT_PRIORITY);
    let margin_bonus = match entity.margin() {
        Some(m) if m < thresholds.critical => 3,
        Some(m) if m < thresholds.high => 2,
        Some(m) if m < thresholds.medium => 1,
        _ => 0,
    };
    let score = 1 + holdings_bonus + conflicts_bonus + margin_bonus;
    debug_assert!(score <= MAX_PRIORITY_SCORE);
    score.min(MAX_PRIORITY_SCORE)
}

/// 0.6 x inconsistency + 0.4 x (priority x 10), kept in tenths so that the
/// ordering does not depend on floating point rounding.
pub fn combined_priority_tenths(inconsistency: u32, priority: u32) -> u32 {
    6 * inconsistency + 40 * priority
}

/// Computes all the scores of one entity.
pub fn score_entity(
    entity: &Entity,
    weights: &HashMap<&str, f64>,
    rules: &ReportRules,
) -> ScoreResult {
    let inconsistency = inconsistency_score(entity, weights, &rules.scoring);
    let priority = priority_score(entity, &rules.thresholds);
    let res = ScoreResult {
        inconsistency_score: inconsistency,
        priority_score: priority,
        tier: classify(entity.margin(), &rules.thresholds),
        combined_priority_tenths: combined_priority_tenths(inconsistency, priority),
    };
    debug!("score_entity: {}: {:?}", entity.name, res);
    res
}

/// The event weights, by event id.
pub fn event_weights(slate: &[TrackedEvent]) -> HashMap<&str, f64> {
    slate.iter().map(|e| (e.id.as_str(), e.weight)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(holdings: u32, executive: bool, margin: Option<f64>, conflicts: usize) -> Entity {
        let votes = (0..5)
            .map(|i| VoteRecord {
                event_id: format!("e{}", i),
                cast: if i < conflicts {
                    VoteCast::Against
                } else {
                    VoteCast::For
                },
                conflicting: i < conflicts,
            })
            .collect();
        Entity {
            name: "Sam Example".to_string(),
            affiliation: "Blue".to_string(),
            constituency: "East".to_string(),
            holdings,
            executive_office: executive,
            voting: VotingRecord {
                provenance: Provenance::Sourced,
                votes,
            },
            electoral: margin.map(|m| ElectoralProfile {
                margin: Some(m),
                votes_to_flip: None,
            }),
        }
    }

    fn weights() -> HashMap<&'static str, f64> {
        [("e0", 2.0), ("e1", 0.5)].into_iter().collect()
    }

    #[test]
    fn no_holdings_safe_seat_scores_zero() {
        let rules = ReportRules::DEFAULT_RULES;
        let e = entity(0, false, Some(12.0), 0);
        let s = score_entity(&e, &weights(), &rules);
        assert_eq!(s.inconsistency_score, 0);
        assert_eq!(s.priority_score, 1);
        assert_eq!(s.tier, Tier::Low);
    }

    #[test]
    fn terms_add_up() {
        let rules = ReportRules::DEFAULT_RULES;
        // 3 x 4 + 15 x 2 + 15 + 10
        let e = entity(4, true, Some(3.0), 2);
        assert_eq!(inconsistency_score(&e, &weights(), &rules.scoring), 67);
        // 1 + 1 + 2 + 1
        assert_eq!(priority_score(&e, &rules.thresholds), 5);
    }

    #[test]
    fn holdings_term_is_capped() {
        let rules = ReportRules::DEFAULT_RULES;
        let e = entity(27, false, None, 0);
        assert_eq!(inconsistency_score(&e, &weights(), &rules.scoring), 30);
    }

    #[test]
    fn critical_scenario_hits_the_ceiling() {
        let rules = ReportRules::DEFAULT_RULES;
        let e = entity(1, true, Some(0.8), 5);
        let s = score_entity(&e, &weights(), &rules);
        assert_eq!(s.inconsistency_score, 100);
        assert_eq!(s.tier, Tier::Critical);
        // 1 + 1 + 3 + 3
        assert_eq!(s.priority_score, 8);
        assert_eq!(s.combined_priority_tenths, 920);
        assert_eq!(s.combined_priority(), 92.0);
    }

    #[test]
    fn unknown_margin_has_no_vulnerability_term() {
        let rules = ReportRules::DEFAULT_RULES;
        let known = entity(2, false, Some(0.5), 1);
        let unknown = entity(2, false, None, 1);
        assert_eq!(
            inconsistency_score(&known, &weights(), &rules.scoring),
            inconsistency_score(&unknown, &weights(), &rules.scoring) + 10
        );
    }

    #[test]
    fn event_weights_change_the_conflict_term() {
        let mut rules = ReportRules::DEFAULT_RULES;
        rules.scoring.conflict_weighting = ConflictWeighting::EventWeight;
        // e0 weighs 2.0, e1 weighs 0.5, e2 is unknown to the weights and counts 1.0
        let e = entity(0, false, None, 3);
        assert_eq!(inconsistency_score(&e, &weights(), &rules.scoring), 30 + 8 + 15);
    }

    #[test]
    fn scores_stay_in_bounds() {
        let rules = ReportRules::DEFAULT_RULES;
        for holdings in [0, 1, 4, 5, 9, 10, 250] {
            for executive in [false, true] {
                for margin in [None, Some(0.0), Some(0.99), Some(2.4), Some(4.9), Some(40.0)] {
                    for conflicts in 0..=5 {
                        let e = entity(holdings, executive, margin, conflicts);
                        let s = score_entity(&e, &weights(), &rules);
                        assert!(s.inconsistency_score <= MAX_INCONSISTENCY_SCORE);
                        assert!((1..=MAX_PRIORITY_SCORE).contains(&s.priority_score));
                    }
                }
            }
        }
    }
}
