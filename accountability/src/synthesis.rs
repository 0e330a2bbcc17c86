//! Fallback vote patterns for representatives without recorded votes.
//!
//! The generated votes are plausible, not true: every record set produced here
//! is tagged [Provenance::Synthesized].

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::*;

/// The likelihood of an unfavorable vote for this entity, and whether its
/// affiliation was found in the table.
///
/// The holdings contribution is capped so that large holders do not end up
/// voting against every event with certainty.
pub fn unfavorable_likelihood(entity: &Entity, rules: &SynthesisRules) -> (f64, bool) {
    let base = rules
        .affiliation_likelihoods
        .iter()
        .find(|(a, _)| *a == entity.affiliation)
        .map(|(_, p)| *p);
    let recognized = base.is_some();
    let base = base.unwrap_or(rules.default_likelihood);
    let adjustment =
        (entity.holdings as f64 * rules.per_holding_adjustment).min(rules.max_holding_adjustment);
    ((base + adjustment).min(1.0), recognized)
}

/// Draws one outcome relative to the favorable position of an event.
/// Returns Some(true) for favorable, Some(false) for unfavorable and None for
/// an abstention.
fn draw_outcome<R: Rng>(rng: &mut R, unfavorable: f64, abstain_band: f64) -> Option<bool> {
    let x: f64 = rng.random::<f64>();
    if x < unfavorable {
        Some(false)
    } else if x < unfavorable + abstain_band {
        None
    } else {
        Some(true)
    }
}

/// Generates a complete vote record set over the slate for one entity.
///
/// The entity is not modified; the caller attaches the result.
pub fn synthesize_votes<R: Rng>(
    entity: &Entity,
    slate: &[TrackedEvent],
    rules: &SynthesisRules,
    rng: &mut R,
) -> VotingRecord {
    let (unfavorable, _) = unfavorable_likelihood(entity, rules);
    let votes: Vec<VoteRecord> = slate
        .iter()
        .map(|event| {
            let cast = match draw_outcome(rng, unfavorable, rules.abstain_band) {
                Some(favorable) => event.cast_for(favorable),
                None => VoteCast::Abstain,
            };
            VoteRecord {
                event_id: event.id.clone(),
                cast,
                conflicting: event.conflicts_with(cast),
            }
        })
        .collect();
    debug!(
        "synthesize_votes: {}: likelihood {:.3}, {} conflicting out of {}",
        entity.name,
        unfavorable,
        votes.iter().filter(|v| v.conflicting).count(),
        votes.len()
    );
    VotingRecord {
        provenance: Provenance::Synthesized,
        votes,
    }
}

/// Derives the seed of an entity stream from the base seed and the entity name.
///
/// The first 8 bytes of a SHA-256 digest are used, so that the stream of one
/// entity does not depend on the other entities.
pub fn entity_seed(base_seed: u64, name: &str) -> u64 {
    let digest = sha256::digest(format!("{}:{}", base_seed, name).as_str());
    // The digest is a hex string, 16 characters cover 8 bytes.
    u64::from_str_radix(&digest[..16], 16).unwrap_or(base_seed)
}

/// The random stream for one entity.
pub fn entity_rng(name: &str, seed: SynthesisSeed) -> ChaCha8Rng {
    match seed {
        SynthesisSeed::Seeded(base) => ChaCha8Rng::seed_from_u64(entity_seed(base, name)),
        SynthesisSeed::Unseeded => ChaCha8Rng::from_os_rng(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slate() -> Vec<TrackedEvent> {
        vec![
            TrackedEvent {
                id: "rent-freeze".to_string(),
                title: "Rent freeze".to_string(),
                date: "2020-10-21".to_string(),
                favorable_position: Position::For,
                weight: 1.0,
            },
            TrackedEvent {
                id: "eviction-repeal".to_string(),
                title: "Repeal of the eviction ban".to_string(),
                date: "2021-03-31".to_string(),
                favorable_position: Position::Against,
                weight: 1.5,
            },
        ]
    }

    fn entity(affiliation: &str, holdings: u32) -> Entity {
        Entity {
            name: "Pat Example".to_string(),
            affiliation: affiliation.to_string(),
            constituency: "North".to_string(),
            holdings,
            executive_office: false,
            voting: VotingRecord::absent(),
            electoral: None,
        }
    }

    fn rules() -> SynthesisRules {
        SynthesisRules {
            affiliation_likelihoods: vec![("Blue".to_string(), 0.7), ("Green".to_string(), 0.1)],
            ..ReportRules::DEFAULT_RULES.synthesis
        }
    }

    #[test]
    fn likelihood_uses_table_and_default() {
        let r = rules();
        assert_eq!(unfavorable_likelihood(&entity("Blue", 0), &r), (0.7, true));
        assert_eq!(unfavorable_likelihood(&entity("Orange", 0), &r), (0.5, false));
    }

    #[test]
    fn holdings_adjustment_is_capped() {
        let r = rules();
        let (small, _) = unfavorable_likelihood(&entity("Green", 2), &r);
        assert!((small - 0.14).abs() < 1e-9);
        let (large, _) = unfavorable_likelihood(&entity("Green", 500), &r);
        assert!((large - 0.3).abs() < 1e-9);
        let (saturated, _) = unfavorable_likelihood(&entity("Blue", 500), &r);
        assert!(saturated <= 1.0);
    }

    #[test]
    fn conflicts_are_symmetric() {
        let s = slate();
        let for_event = &s[0];
        let against_event = &s[1];
        assert!(for_event.conflicts_with(VoteCast::Against));
        assert!(against_event.conflicts_with(VoteCast::For));
        assert!(!for_event.conflicts_with(VoteCast::For));
        assert!(!against_event.conflicts_with(VoteCast::Against));
        assert!(!for_event.conflicts_with(VoteCast::Abstain));
        assert!(!against_event.conflicts_with(VoteCast::Abstain));
    }

    #[test]
    fn synthesized_set_covers_the_slate() {
        let s = slate();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let rec = synthesize_votes(&entity("Blue", 27), &s, &rules(), &mut rng);
        assert_eq!(rec.provenance, Provenance::Synthesized);
        let ids: Vec<&str> = rec.votes.iter().map(|v| v.event_id.as_str()).collect();
        assert_eq!(ids, vec!["rent-freeze", "eviction-repeal"]);
        for (v, e) in rec.votes.iter().zip(s.iter()) {
            assert_eq!(v.conflicting, e.conflicts_with(v.cast));
        }
    }

    #[test]
    fn empirical_rates_match_likelihood() {
        let _ = env_logger::builder().is_test(true).try_init();
        let s = vec![slate()[0].clone()];
        let r = rules();
        let e = entity("Green", 5);
        let (expected, _) = unfavorable_likelihood(&e, &r);
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let n = 4000;
        let mut unfavorable = 0;
        let mut abstain = 0;
        for _ in 0..n {
            let rec = synthesize_votes(&e, &s, &r, &mut rng);
            match rec.votes[0].cast {
                VoteCast::Against => unfavorable += 1,
                VoteCast::Abstain => abstain += 1,
                VoteCast::For => {}
            }
        }
        let rate = unfavorable as f64 / n as f64;
        let abstain_rate = abstain as f64 / n as f64;
        assert!((rate - expected).abs() < 0.04, "rate {} vs {}", rate, expected);
        assert!((abstain_rate - r.abstain_band).abs() < 0.04);
    }

    #[test]
    fn unfavorable_on_against_event_is_a_for_vote() {
        let s = vec![slate()[1].clone()];
        let r = SynthesisRules {
            default_likelihood: 1.0,
            ..rules()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let rec = synthesize_votes(&entity("Orange", 0), &s, &r, &mut rng);
        assert_eq!(rec.votes[0].cast, VoteCast::For);
        assert!(rec.votes[0].conflicting);
    }

    #[test]
    fn seeded_streams_are_per_entity() {
        let seed = SynthesisSeed::Seeded(42);
        let a1: f64 = entity_rng("Alice", seed).random();
        let a2: f64 = entity_rng("Alice", seed).random();
        let b: f64 = entity_rng("Bob", seed).random();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert_ne!(entity_seed(42, "Alice"), entity_seed(43, "Alice"));
    }
}
