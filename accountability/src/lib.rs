mod config;
pub mod builder;
pub mod manual;
pub mod report;
pub mod scoring;
pub mod synthesis;
pub mod tiering;

use log::{debug, info, warn};

use std::collections::{HashMap, HashSet};

pub use crate::config::*;
use crate::scoring::{event_weights, score_entity};
use crate::synthesis::{entity_rng, synthesize_votes, unfavorable_likelihood};

/// All the datasets handed over by the readers, already parsed.
///
/// The vote and electoral datasets are optional: None means that the dataset
/// is missing entirely, which is reported but never fatal.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Dataset {
    pub roster: Vec<RosterEntry>,
    /// Recorded votes, by entity name.
    pub sourced_votes: Option<Vec<(String, Vec<SourcedVote>)>>,
    /// Electoral profiles, by constituency.
    pub electoral: Option<Vec<(String, ElectoralProfile)>>,
    /// Problems already found by the readers.
    pub diagnostics: Vec<Diagnostic>,
}

fn push_diagnostic(diagnostics: &mut Vec<Diagnostic>, d: Diagnostic) {
    warn!("{:?} {}: {}", d.kind, d.subject, d.message);
    diagnostics.push(d);
}

pub(crate) fn check_slate(slate: &[TrackedEvent]) -> Result<(), ReportErrors> {
    if slate.is_empty() {
        return Err(ReportErrors::EmptyEventSlate);
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for e in slate.iter() {
        if !seen.insert(e.id.as_str()) {
            return Err(ReportErrors::DuplicateEvent(e.id.clone()));
        }
        if !(e.weight.is_finite() && e.weight >= 0.0) {
            return Err(ReportErrors::InvalidRules(format!(
                "event {} has an invalid weight {}",
                e.id, e.weight
            )));
        }
    }
    Ok(())
}

/// Validates the roster. Rejected lines are reported and skipped, the first
/// occurrence of a name wins.
fn load_entities(roster: &[RosterEntry], diagnostics: &mut Vec<Diagnostic>) -> Vec<Entity> {
    let mut names: HashSet<String> = HashSet::new();
    let mut entities: Vec<Entity> = Vec::new();
    for (idx, r) in roster.iter().enumerate() {
        let name = r.name.trim();
        if name.is_empty() {
            push_diagnostic(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::MalformedEntity,
                    &format!("roster line {}", idx + 1),
                    "missing name".to_string(),
                ),
            );
            continue;
        }
        let holdings = match u32::try_from(r.holdings) {
            Ok(h) => h,
            Err(_) => {
                push_diagnostic(
                    diagnostics,
                    Diagnostic::new(
                        DiagnosticKind::MalformedEntity,
                        name,
                        format!("invalid holding count {}", r.holdings),
                    ),
                );
                continue;
            }
        };
        if !names.insert(name.to_string()) {
            push_diagnostic(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::DuplicateEntity,
                    name,
                    format!("roster line {} repeats an earlier entity", idx + 1),
                ),
            );
            continue;
        }
        entities.push(Entity {
            name: name.to_string(),
            affiliation: r.affiliation.trim().to_string(),
            constituency: r.constituency.trim().to_string(),
            holdings,
            executive_office: r.executive_office,
            voting: VotingRecord::absent(),
            electoral: None,
        });
    }
    entities
}

fn attach_electoral(
    entities: &mut [Entity],
    electoral: Option<&[(String, ElectoralProfile)]>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let data = match electoral {
        Some(data) => data,
        None => {
            push_diagnostic(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::MissingDataset,
                    "electoral",
                    "no electoral data, every seat is treated as unknown".to_string(),
                ),
            );
            return;
        }
    };
    let mut profiles: HashMap<&str, ElectoralProfile> = HashMap::new();
    for (constituency, profile) in data.iter() {
        let mut profile = *profile;
        if let Some(m) = profile.margin {
            if !(m.is_finite() && m >= 0.0) {
                push_diagnostic(
                    diagnostics,
                    Diagnostic::new(
                        DiagnosticKind::InvalidElectoralData,
                        constituency,
                        format!("margin {} is not a valid percentage, treated as unknown", m),
                    ),
                );
                profile.margin = None;
            }
        }
        if profiles.contains_key(constituency.as_str()) {
            push_diagnostic(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::InvalidElectoralData,
                    constituency,
                    "constituency listed twice, keeping the first entry".to_string(),
                ),
            );
            continue;
        }
        profiles.insert(constituency.as_str(), profile);
    }
    for e in entities.iter_mut() {
        e.electoral = profiles.get(e.constituency.as_str()).copied();
        if e.electoral.is_none() {
            debug!("attach_electoral: no data for {} ({})", e.name, e.constituency);
        }
    }
}

fn attach_votes(
    entities: &mut [Entity],
    sourced: Option<&[(String, Vec<SourcedVote>)]>,
    slate: &[TrackedEvent],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let data = match sourced {
        Some(data) => data,
        None => {
            push_diagnostic(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::MissingDataset,
                    "votes",
                    "no recorded votes, property holders get synthesized votes".to_string(),
                ),
            );
            return;
        }
    };
    let known: HashSet<&str> = entities.iter().map(|e| e.name.as_str()).collect();
    let mut by_name: HashMap<&str, Vec<&SourcedVote>> = HashMap::new();
    for (name, votes) in data.iter() {
        let name = name.trim();
        if !known.contains(name) {
            push_diagnostic(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::UnmatchedVotes,
                    name,
                    format!("{} recorded votes for an entity not in the roster", votes.len()),
                ),
            );
            continue;
        }
        by_name.entry(name).or_default().extend(votes.iter());
    }

    let event_index: HashMap<&str, usize> = slate
        .iter()
        .enumerate()
        .map(|(idx, e)| (e.id.as_str(), idx))
        .collect();
    for e in entities.iter_mut() {
        let votes = match by_name.get(e.name.as_str()) {
            Some(v) => v,
            None => continue,
        };
        let mut records: Vec<(usize, VoteRecord)> = Vec::new();
        for v in votes.iter() {
            let idx = match event_index.get(v.event_id.as_str()) {
                Some(idx) => *idx,
                None => {
                    push_diagnostic(
                        diagnostics,
                        Diagnostic::new(
                            DiagnosticKind::UnknownEvent,
                            &e.name,
                            format!("vote on untracked event {} ignored", v.event_id),
                        ),
                    );
                    continue;
                }
            };
            if records.iter().any(|(i, _)| *i == idx) {
                push_diagnostic(
                    diagnostics,
                    Diagnostic::new(
                        DiagnosticKind::DuplicateVote,
                        &e.name,
                        format!("second vote on {} ignored", v.event_id),
                    ),
                );
                continue;
            }
            records.push((
                idx,
                VoteRecord {
                    event_id: v.event_id.clone(),
                    cast: v.cast,
                    conflicting: slate[idx].conflicts_with(v.cast),
                },
            ));
        }
        if records.is_empty() {
            continue;
        }
        records.sort_by_key(|(idx, _)| *idx);
        e.voting = VotingRecord {
            provenance: Provenance::Sourced,
            votes: records.into_iter().map(|(_, r)| r).collect(),
        };
    }
}

/// Fills the gaps: every property holder without recorded votes receives a
/// synthesized record set.
fn synthesize_missing(
    entities: &mut [Entity],
    slate: &[TrackedEvent],
    rules: &SynthesisRules,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut reported: HashSet<String> = HashSet::new();
    let mut count = 0;
    for e in entities.iter_mut() {
        if e.voting.provenance != Provenance::Absent || !e.is_property_holder() {
            continue;
        }
        let (_, recognized) = unfavorable_likelihood(e, rules);
        if !recognized && reported.insert(e.affiliation.clone()) {
            push_diagnostic(
                diagnostics,
                Diagnostic::new(
                    DiagnosticKind::UnknownAffiliation,
                    &e.affiliation,
                    format!(
                        "affiliation not in the likelihood table, using the default {}",
                        rules.default_likelihood
                    ),
                ),
            );
        }
        let mut rng = entity_rng(&e.name, rules.seed);
        e.voting = synthesize_votes(e, slate, rules, &mut rng);
        count += 1;
    }
    info!("Synthesized votes for {} entities", count);
}

/// Runs the whole pipeline: integration, synthesis, scoring, tiering and
/// assembly of the report.
///
/// Arguments:
/// * `dataset` the roster and the optional vote and electoral datasets
/// * `slate` the tracked events
/// * `rules` the configuration of every stage
/// * `generated_at` the timestamp written in the report
pub fn build_report(
    dataset: &Dataset,
    slate: &[TrackedEvent],
    rules: &ReportRules,
    generated_at: &str,
) -> Result<AccountabilityReport, ReportErrors> {
    info!(
        "Processing {} roster entries, {} tracked events, votes: {}, electoral: {}",
        dataset.roster.len(),
        slate.len(),
        dataset.sourced_votes.is_some(),
        dataset.electoral.is_some()
    );
    check_slate(slate)?;
    rules.validate()?;

    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for d in dataset.diagnostics.iter() {
        push_diagnostic(&mut diagnostics, d.clone());
    }
    let mut entities = load_entities(&dataset.roster, &mut diagnostics);
    info!("Loaded {} entities", entities.len());

    attach_electoral(&mut entities, dataset.electoral.as_deref(), &mut diagnostics);
    attach_votes(
        &mut entities,
        dataset.sourced_votes.as_deref(),
        slate,
        &mut diagnostics,
    );
    synthesize_missing(&mut entities, slate, &rules.synthesis, &mut diagnostics);

    let weights = event_weights(slate);
    let results: Vec<EntityResult> = entities
        .into_iter()
        .enumerate()
        .map(|(load_order, entity)| {
            let scores = score_entity(&entity, &weights, rules);
            let in_government = rules
                .scoring
                .governing_affiliations
                .iter()
                .any(|a| *a == entity.affiliation);
            EntityResult {
                entity,
                in_government,
                scores,
                load_order,
            }
        })
        .collect();

    Ok(report::assemble(
        results,
        diagnostics,
        &rules.limits,
        generated_at,
    ))
}
