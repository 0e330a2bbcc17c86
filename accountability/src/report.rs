use log::info;

use crate::config::*;
use crate::tiering::partition;

fn mean(values: &[u32]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().map(|v| *v as f64).sum::<f64>() / values.len() as f64
    }
}

fn summarize(results: &[EntityResult], tiers: &[TierList], diagnostics: &[Diagnostic]) -> ReportSummary {
    let holders: Vec<&EntityResult> = results
        .iter()
        .filter(|r| r.entity.is_property_holder())
        .collect();
    let holder_scores: Vec<u32> = holders.iter().map(|r| r.scores.inconsistency_score).collect();
    let holder_conflicts: Vec<u32> = holders.iter().map(|r| r.conflicting_votes()).collect();
    let count_provenance =
        |p: Provenance| results.iter().filter(|r| r.provenance() == p).count();

    // Entities without electoral data stay out of this one.
    let flips: Vec<u64> = results
        .iter()
        .filter(|r| matches!(r.scores.tier, Tier::Critical | Tier::High))
        .filter_map(|r| r.entity.electoral.and_then(|e| e.votes_to_flip))
        .collect();

    ReportSummary {
        total_entities: results.len(),
        property_holders: holders.len(),
        tier_counts: tiers.iter().map(|t| (t.tier, t.total)).collect(),
        mean_inconsistency_score: mean(&holder_scores),
        mean_conflicting_votes: mean(&holder_conflicts),
        executive_office_count: results.iter().filter(|r| r.entity.executive_office).count(),
        governing_affiliation_count: results.iter().filter(|r| r.in_government).count(),
        sourced_count: count_provenance(Provenance::Sourced),
        synthesized_count: count_provenance(Provenance::Synthesized),
        absent_count: count_provenance(Provenance::Absent),
        priority_seats_votes_to_flip: if flips.is_empty() {
            None
        } else {
            Some(flips.iter().fold(0u64, |acc, v| acc.saturating_add(*v)))
        },
        diagnostics_count: diagnostics.len(),
    }
}

/// Assembles the final report from the scored entities.
///
/// The results are expected in roster order. Nothing random happens here: the
/// same results always give the same report.
pub fn assemble(
    results: Vec<EntityResult>,
    diagnostics: Vec<Diagnostic>,
    limits: &TierLimits,
    generated_at: &str,
) -> AccountabilityReport {
    let tiers: Vec<TierList> = partition(&results)
        .into_iter()
        .map(|(tier, members)| {
            let total = members.len();
            let entries = members.into_iter().take(limits.limit(tier)).collect();
            TierList {
                tier,
                total,
                entries,
            }
        })
        .collect();
    for t in tiers.iter() {
        info!(
            "Tier {}: {} entities, {} listed",
            t.tier.label(),
            t.total,
            t.entries.len()
        );
    }
    let summary = summarize(&results, &tiers, &diagnostics);
    AccountabilityReport {
        generated_at: generated_at.to_string(),
        summary,
        tiers,
        results,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(
        order: usize,
        holdings: u32,
        provenance: Provenance,
        tier: Tier,
        score: u32,
        flip: Option<u64>,
    ) -> EntityResult {
        EntityResult {
            entity: Entity {
                name: format!("Rep {}", order),
                affiliation: "Blue".to_string(),
                constituency: format!("C{}", order),
                holdings,
                executive_office: order == 0,
                voting: VotingRecord {
                    provenance,
                    votes: vec![VoteRecord {
                        event_id: "e".to_string(),
                        cast: VoteCast::Against,
                        conflicting: holdings > 0,
                    }],
                },
                electoral: Some(ElectoralProfile {
                    margin: None,
                    votes_to_flip: flip,
                }),
            },
            in_government: order % 2 == 1,
            scores: ScoreResult {
                inconsistency_score: score,
                priority_score: 1,
                tier,
                combined_priority_tenths: 6 * score + 40,
            },
            load_order: order,
        }
    }

    #[test]
    fn summary_and_clipping() {
        let mut results = Vec::new();
        for i in 0..7 {
            results.push(result(i, 2, Provenance::Synthesized, Tier::Critical, 10 * i as u32, Some(100)));
        }
        results.push(result(7, 0, Provenance::Absent, Tier::Low, 0, None));
        results.push(result(8, 4, Provenance::Sourced, Tier::High, 40, None));
        let limits = ReportRules::DEFAULT_RULES.limits;
        let report = assemble(results, vec![], &limits, "2026-01-01T00:00:00+00:00");

        let critical = &report.tiers[0];
        assert_eq!(critical.total, 7);
        assert_eq!(critical.entries.len(), 5);
        assert_eq!(critical.entries[0].entity.name, "Rep 6");
        assert_eq!(report.results.len(), 9);

        let s = &report.summary;
        assert_eq!(s.total_entities, 9);
        assert_eq!(s.property_holders, 8);
        assert_eq!(
            s.tier_counts,
            vec![(Tier::Critical, 7), (Tier::High, 1), (Tier::Medium, 0), (Tier::Low, 1)]
        );
        // (0 + 10 + ... + 60 + 40) / 8
        assert!((s.mean_inconsistency_score - 250.0 / 8.0).abs() < 1e-9);
        assert!((s.mean_conflicting_votes - 1.0).abs() < 1e-9);
        assert_eq!(s.executive_office_count, 1);
        assert_eq!(s.governing_affiliation_count, 4);
        assert_eq!((s.sourced_count, s.synthesized_count, s.absent_count), (1, 7, 1));
        assert_eq!(s.priority_seats_votes_to_flip, Some(700));
    }

    #[test]
    fn votes_to_flip_saturates() {
        let results = vec![
            result(0, 1, Provenance::Sourced, Tier::Critical, 50, Some(u64::MAX)),
            result(1, 1, Provenance::Sourced, Tier::Critical, 40, Some(2)),
        ];
        let report = assemble(results, vec![], &ReportRules::DEFAULT_RULES.limits, "t");
        assert_eq!(report.summary.priority_seats_votes_to_flip, Some(u64::MAX));
    }

    #[test]
    fn empty_roster() {
        let report = assemble(vec![], vec![], &ReportRules::DEFAULT_RULES.limits, "t");
        assert_eq!(report.summary.total_entities, 0);
        assert_eq!(report.summary.mean_inconsistency_score, 0.0);
        assert_eq!(report.summary.priority_seats_votes_to_flip, None);
        assert_eq!(report.tiers.len(), 4);
    }
}
