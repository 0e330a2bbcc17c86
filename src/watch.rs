use log::{debug, info, warn};

use accountability::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_json;

use crate::watch::config_reader::*;

#[derive(Debug, Snafu)]
pub enum WatchError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON in {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Unexpected layout in {path}: {message}"))]
    JsonLayout { path: String, message: String },
    #[snafu(display("Cannot read a number in field {field}"))]
    ParsingJsonNumber { field: String },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Column {column} is missing in {path}"))]
    CsvMissingColumn { column: String, path: String },
    #[snafu(display("Event {id} has an invalid date {date:?}, expected YYYY-MM-DD"))]
    InvalidDate {
        source: chrono::ParseError,
        id: String,
        date: String,
    },
    #[snafu(display("Timestamp {timestamp:?} is not an RFC 3339 date"))]
    InvalidTimestamp {
        source: chrono::ParseError,
        timestamp: String,
    },
    #[snafu(display("Unknown provider {provider:?} for the {dataset} dataset"))]
    UnknownProvider { provider: String, dataset: String },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},
    #[snafu(display("Error writing the report to {path}"))]
    WritingReport {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Cannot build the report"))]
    Report { source: ReportErrors },
    #[snafu(display("Cannot render the report as JSON"))]
    RenderingReport { source: serde_json::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type WatchResult<T> = Result<T, WatchError>;

fn read_roster(root: &Path, source: &FileSource) -> WatchResult<(Vec<RosterEntry>, Vec<Diagnostic>)> {
    let path = io_common::resolve_path(root, &source.file_path);
    info!("Reading roster from {} ({})", path, source.provider);
    match source.provider.as_str() {
        "json" => io_json::read_roster_json(&path),
        "csv" => io_csv::read_roster_csv(&path),
        x => UnknownProviderSnafu {
            provider: x,
            dataset: "roster",
        }
        .fail(),
    }
}

fn read_votes(
    root: &Path,
    source: &FileSource,
) -> WatchResult<(Vec<(String, Vec<SourcedVote>)>, Vec<Diagnostic>)> {
    let path = io_common::resolve_path(root, &source.file_path);
    info!("Reading recorded votes from {} ({})", path, source.provider);
    match source.provider.as_str() {
        "json" => io_json::read_votes_json(&path),
        "csv" => io_csv::read_votes_csv(&path),
        x => UnknownProviderSnafu {
            provider: x,
            dataset: "votes",
        }
        .fail(),
    }
}

fn read_electoral(
    root: &Path,
    source: &FileSource,
) -> WatchResult<(Vec<(String, ElectoralProfile)>, Vec<Diagnostic>)> {
    let path = io_common::resolve_path(root, &source.file_path);
    info!("Reading electoral data from {} ({})", path, source.provider);
    match source.provider.as_str() {
        "json" => io_json::read_electoral_json(&path),
        "csv" => io_csv::read_electoral_csv(&path),
        x => UnknownProviderSnafu {
            provider: x,
            dataset: "electoral",
        }
        .fail(),
    }
}

/// Reads every configured dataset. The optional datasets stay None when they
/// are not configured, the engine reports them as missing.
fn read_datasets(root: &Path, sources: &DataSources) -> WatchResult<Dataset> {
    let (roster, mut diagnostics) = read_roster(root, &sources.roster)?;
    let sourced_votes = match &sources.votes {
        Some(s) => {
            let (votes, mut d) = read_votes(root, s)?;
            diagnostics.append(&mut d);
            Some(votes)
        }
        None => None,
    };
    let electoral = match &sources.electoral {
        Some(s) => {
            let (profiles, mut d) = read_electoral(root, s)?;
            diagnostics.append(&mut d);
            Some(profiles)
        }
        None => None,
    };
    debug!("read_datasets: {} reader diagnostics", diagnostics.len());
    Ok(Dataset {
        roster,
        sourced_votes,
        electoral,
        diagnostics,
    })
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn provenance_label(p: Provenance) -> &'static str {
    match p {
        Provenance::Sourced => "sourced",
        Provenance::Synthesized => "synthesized",
        Provenance::Absent => "none",
    }
}

fn cast_label(c: VoteCast) -> &'static str {
    match c {
        VoteCast::For => "for",
        VoteCast::Against => "against",
        VoteCast::Abstain => "abstain",
    }
}

fn entity_to_json(r: &EntityResult) -> JSValue {
    let e = &r.entity;
    let votes: Vec<JSValue> = e
        .voting
        .votes
        .iter()
        .map(|v| {
            json!({
                "eventId": v.event_id,
                "vote": cast_label(v.cast),
                "conflicting": v.conflicting
            })
        })
        .collect();
    json!({
        "name": e.name,
        "party": e.affiliation,
        "constituency": e.constituency,
        "properties": e.holdings,
        "executiveOffice": e.executive_office,
        "inGovernment": r.in_government,
        "margin": e.margin(),
        "vulnerability": if e.margin().is_some() { "known" } else { "unknown" },
        "votesToFlip": e.electoral.and_then(|p| p.votes_to_flip),
        "voteProvenance": provenance_label(r.provenance()),
        "votesVerified": r.provenance() == Provenance::Sourced,
        "conflictingVotes": r.conflicting_votes(),
        "recordedVotes": e.voting.votes.len(),
        "inconsistencyScore": r.scores.inconsistency_score,
        "priorityScore": r.scores.priority_score,
        "combinedPriority": r.scores.combined_priority(),
        "tier": r.scores.tier.label(),
        "votes": votes
    })
}

fn summary_to_json(s: &ReportSummary) -> JSValue {
    let mut tier_counts: JSMap<String, JSValue> = JSMap::new();
    for (tier, count) in s.tier_counts.iter() {
        tier_counts.insert(tier.label().to_string(), json!(count));
    }
    json!({
        "totalEntities": s.total_entities,
        "propertyHolders": s.property_holders,
        "tierCounts": tier_counts,
        "meanInconsistencyScore": round2(s.mean_inconsistency_score),
        "meanConflictingVotes": round2(s.mean_conflicting_votes),
        "executiveOfficeCount": s.executive_office_count,
        "governingAffiliationCount": s.governing_affiliation_count,
        "voteProvenance": {
            "sourced": s.sourced_count,
            "synthesized": s.synthesized_count,
            "none": s.absent_count
        },
        "priorityVotesToFlip": s.priority_seats_votes_to_flip,
        "diagnostics": s.diagnostics_count
    })
}

fn build_report_js(config: &WatchConfig, events: &[TrackedEvent], report: &AccountabilityReport) -> JSValue {
    let mut tiers: JSMap<String, JSValue> = JSMap::new();
    for tl in report.tiers.iter() {
        let entries: Vec<JSValue> = tl.entries.iter().map(entity_to_json).collect();
        tiers.insert(
            tl.tier.label().to_string(),
            json!({"total": tl.total, "entries": entries}),
        );
    }
    let tracked: Vec<JSValue> = events
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "title": e.title,
                "date": e.date,
                "favorablePosition": match e.favorable_position {
                    Position::For => "for",
                    Position::Against => "against",
                },
                "weight": e.weight
            })
        })
        .collect();
    let diagnostics: Vec<JSValue> = report
        .diagnostics
        .iter()
        .map(|d| {
            json!({
                "kind": format!("{:?}", d.kind),
                "subject": d.subject,
                "message": d.message
            })
        })
        .collect();
    let entities: Vec<JSValue> = report.results.iter().map(entity_to_json).collect();
    json!({
        "metadata": {
            "reportName": config.output_settings.report_name,
            "generatedAt": report.generated_at,
            "entityCount": report.results.len(),
            "trackedEvents": tracked
        },
        "summary": summary_to_json(&report.summary),
        "tiers": tiers,
        "entities": entities,
        "diagnostics": diagnostics
    })
}

fn prepare_report(
    config_path: &str,
    seed: Option<u64>,
    timestamp: Option<&str>,
) -> WatchResult<(WatchConfig, String)> {
    let config_p = Path::new(config_path);
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let events = validate_events(&config.tracked_events)?;
    let rules = validate_rules(&config.rules, &config.output_settings, seed)?;

    let generated_at = match timestamp {
        Some(ts) => {
            chrono::DateTime::parse_from_rfc3339(ts).context(InvalidTimestampSnafu { timestamp: ts })?;
            ts.to_string()
        }
        None => chrono::Utc::now().to_rfc3339(),
    };

    let root_p = config_p.parent().context(MissingParentDirSnafu {})?;
    let dataset = read_datasets(root_p, &config.data_sources)?;
    let report = build_report(&dataset, &events, &rules, &generated_at).context(ReportSnafu {})?;
    info!(
        "Report: {} entities, {} diagnostics",
        report.results.len(),
        report.diagnostics.len()
    );

    let js = build_report_js(&config, &events, &report);
    let pretty = serde_json::to_string_pretty(&js).context(RenderingReportSnafu {})?;
    Ok((config, pretty))
}

/// Produces the rendered report for a configuration file.
pub fn generate_report(
    config_path: &str,
    seed: Option<u64>,
    timestamp: Option<&str>,
) -> WatchResult<String> {
    let (_, pretty) = prepare_report(config_path, seed, timestamp)?;
    Ok(pretty)
}

pub fn run_report(
    config_path: &str,
    out: Option<&str>,
    check_reference_path: Option<&str>,
    seed: Option<u64>,
    timestamp: Option<&str>,
) -> WatchResult<()> {
    let (config, pretty) = prepare_report(config_path, seed, timestamp)?;

    // The command line wins over the configuration. "stdout" is never a path.
    let out_path: Option<String> = match (out, config.output_settings.output_path.as_deref()) {
        (Some(p), _) => Some(p.to_string()),
        (None, Some("stdout")) | (None, Some("")) => None,
        (None, Some(p)) => {
            let root_p = Path::new(config_path).parent().context(MissingParentDirSnafu {})?;
            Some(io_common::resolve_path(root_p, p))
        }
        (None, None) => None,
    };
    match out_path.as_deref() {
        None | Some("stdout") | Some("") => println!("{}", pretty),
        Some(p) => {
            info!("Writing the report to {}", p);
            fs::write(p, format!("{}\n", pretty)).context(WritingReportSnafu { path: p })?;
        }
    }

    // The reference report, if provided for comparison
    if let Some(ref_p) = check_reference_path {
        let reference = io_json::read_js(ref_p)?;
        let pretty_reference =
            serde_json::to_string_pretty(&reference).context(RenderingReportSnafu {})?;
        if pretty_reference != pretty {
            warn!("Found differences with the reference report");
            print_diff(pretty_reference.as_str(), pretty.as_str(), "\n");
            whatever!("Difference detected between the generated report and the reference report")
        }
        info!("The report matches the reference {}", ref_p);
    }
    Ok(())
}
