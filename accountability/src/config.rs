// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The position on a tracked event that protects tenants.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Position {
    For,
    Against,
}

/// The vote actually cast by a representative on one event.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum VoteCast {
    For,
    Against,
    Abstain,
}

/// One of the hand-curated legislative votes used as scoring input.
#[derive(PartialEq, Debug, Clone)]
pub struct TrackedEvent {
    pub id: String,
    pub title: String,
    pub date: String,
    pub favorable_position: Position,
    /// Only used when the conflict term is event-weighted.
    pub weight: f64,
}

impl TrackedEvent {
    /// A cast conflicts with the event when it is the opposite of the
    /// declared favorable position. Abstentions never conflict.
    pub fn conflicts_with(&self, cast: VoteCast) -> bool {
        matches!(
            (self.favorable_position, cast),
            (Position::For, VoteCast::Against) | (Position::Against, VoteCast::For)
        )
    }

    /// The concrete cast matching a favorable (or unfavorable) outcome on this event.
    pub fn cast_for(&self, favorable: bool) -> VoteCast {
        match (self.favorable_position, favorable) {
            (Position::For, true) | (Position::Against, false) => VoteCast::For,
            (Position::For, false) | (Position::Against, true) => VoteCast::Against,
        }
    }
}

/// A roster line, as handed over by the readers.
///
/// The holdings are signed so that negative counts can be detected and
/// reported instead of being silently wrapped.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RosterEntry {
    pub name: String,
    pub affiliation: String,
    pub constituency: String,
    pub holdings: i64,
    pub executive_office: bool,
}

/// A recorded vote from the external voting dataset.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SourcedVote {
    pub event_id: String,
    pub cast: VoteCast,
}

/// Vulnerability context for one constituency.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct ElectoralProfile {
    /// Margin of the last election, in percentage points.
    pub margin: Option<f64>,
    pub votes_to_flip: Option<u64>,
}

// ********* Record store ***********

/// Where the votes of a representative come from.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Provenance {
    /// Recorded votes from the external dataset.
    Sourced,
    /// Generated by the vote pattern synthesizer. Never to be presented as fact.
    Synthesized,
    /// No vote data at all.
    Absent,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub event_id: String,
    pub cast: VoteCast,
    pub conflicting: bool,
}

/// The full set of votes attached to one entity, with a single provenance.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VotingRecord {
    pub provenance: Provenance,
    pub votes: Vec<VoteRecord>,
}

impl VotingRecord {
    pub fn absent() -> VotingRecord {
        VotingRecord {
            provenance: Provenance::Absent,
            votes: Vec::new(),
        }
    }

    pub fn conflicting_votes(&self) -> u32 {
        self.votes.iter().filter(|v| v.conflicting).count() as u32
    }
}

/// A validated representative, with the datasets attached during integration.
#[derive(PartialEq, Debug, Clone)]
pub struct Entity {
    pub name: String,
    pub affiliation: String,
    pub constituency: String,
    pub holdings: u32,
    pub executive_office: bool,
    pub voting: VotingRecord,
    /// None when the electoral dataset has nothing for this constituency.
    pub electoral: Option<ElectoralProfile>,
}

impl Entity {
    pub fn is_property_holder(&self) -> bool {
        self.holdings > 0
    }

    /// The margin, if it is known and usable in comparisons.
    pub fn margin(&self) -> Option<f64> {
        self.electoral.and_then(|e| e.margin)
    }
}

// ******** Output data structures *********

/// Priority tiers, ordered from the most to the least vulnerable seat.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Tier {
    Critical,
    High,
    Medium,
    /// Safe seats, and seats without electoral data.
    Low,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Critical, Tier::High, Tier::Medium, Tier::Low];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Critical => "CRITICAL",
            Tier::High => "HIGH",
            Tier::Medium => "MEDIUM",
            Tier::Low => "LOW",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ScoreResult {
    /// Composite inconsistency score, 0 to 100.
    pub inconsistency_score: u32,
    /// Outreach priority, 1 to 10.
    pub priority_score: u32,
    pub tier: Tier,
    /// 0.6 x inconsistency + 0.4 x (priority x 10), in tenths of a point.
    pub combined_priority_tenths: u32,
}

impl ScoreResult {
    pub fn combined_priority(&self) -> f64 {
        self.combined_priority_tenths as f64 / 10.0
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct EntityResult {
    pub entity: Entity,
    pub in_government: bool,
    pub scores: ScoreResult,
    /// Position in the roster, used to break ties.
    pub load_order: usize,
}

impl EntityResult {
    pub fn provenance(&self) -> Provenance {
        self.entity.voting.provenance
    }

    pub fn conflicting_votes(&self) -> u32 {
        self.entity.voting.conflicting_votes()
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct TierList {
    pub tier: Tier,
    /// Number of entities in the tier, before clipping.
    pub total: usize,
    /// The top entities of the tier, at most the configured limit.
    pub entries: Vec<EntityResult>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ReportSummary {
    pub total_entities: usize,
    pub property_holders: usize,
    pub tier_counts: Vec<(Tier, usize)>,
    /// Computed over the property holders only.
    pub mean_inconsistency_score: f64,
    /// Computed over the property holders only.
    pub mean_conflicting_votes: f64,
    pub executive_office_count: usize,
    pub governing_affiliation_count: usize,
    pub sourced_count: usize,
    pub synthesized_count: usize,
    pub absent_count: usize,
    /// Sum over CRITICAL and HIGH seats where the number is known.
    pub priority_seats_votes_to_flip: Option<u64>,
    pub diagnostics_count: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum DiagnosticKind {
    MissingDataset,
    MalformedEntity,
    DuplicateEntity,
    UnknownAffiliation,
    UnknownEvent,
    MalformedVote,
    DuplicateVote,
    UnmatchedVotes,
    InvalidElectoralData,
}

/// A non-fatal problem found while integrating the datasets.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The entity, constituency or dataset concerned.
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: &str, message: String) -> Diagnostic {
        Diagnostic {
            kind,
            subject: subject.to_string(),
            message,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct AccountabilityReport {
    pub generated_at: String,
    pub summary: ReportSummary,
    /// One list per tier, in tier order.
    pub tiers: Vec<TierList>,
    /// Every scored entity, in roster order.
    pub results: Vec<EntityResult>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Errors that prevent the report from being produced at all.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ReportErrors {
    EmptyEventSlate,
    DuplicateEvent(String),
    InvalidRules(String),
}

impl Error for ReportErrors {}

impl Display for ReportErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportErrors::EmptyEventSlate => write!(f, "no tracked events were provided"),
            ReportErrors::DuplicateEvent(id) => write!(f, "tracked event {} is declared twice", id),
            ReportErrors::InvalidRules(msg) => write!(f, "invalid rules: {}", msg),
        }
    }
}

// ********* Configuration **********

/// Source of randomness for the synthesized votes.
///
/// When seeded, each entity draws from its own stream derived from the seed and
/// its name, so that results do not depend on the order of the roster.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SynthesisSeed {
    Unseeded,
    Seeded(u64),
}

#[derive(PartialEq, Debug, Clone)]
pub struct SynthesisRules {
    /// Base likelihood of an unfavorable vote, per affiliation.
    pub affiliation_likelihoods: Vec<(String, f64)>,
    /// Used for affiliations missing from the table.
    pub default_likelihood: f64,
    pub per_holding_adjustment: f64,
    /// Upper bound of the holdings contribution to the likelihood.
    pub max_holding_adjustment: f64,
    /// Width of the abstain band that follows the unfavorable band.
    pub abstain_band: f64,
    pub seed: SynthesisSeed,
}

/// How conflicting votes contribute to the inconsistency score.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ConflictWeighting {
    /// Every conflict is worth the same number of points.
    Flat,
    /// Every conflict is worth its points multiplied by the event weight.
    /// This changes the scores compared to the flat mode.
    EventWeight,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ScoringRules {
    pub holdings_multiplier: u32,
    pub holdings_cap: u32,
    pub conflict_points: u32,
    pub conflict_weighting: ConflictWeighting,
    pub executive_points: u32,
    pub vulnerability_points: u32,
    /// Margins strictly below this threshold earn the vulnerability points.
    pub vulnerability_threshold: f64,
    pub governing_affiliations: Vec<String>,
}

/// Upper margin bounds (exclusive) of the tiers, in percentage points.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct TierThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
}

/// How many entities are listed per tier in the report.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct TierLimits {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierLimits {
    pub fn limit(&self, tier: Tier) -> usize {
        match tier {
            Tier::Critical => self.critical,
            Tier::High => self.high,
            Tier::Medium => self.medium,
            Tier::Low => self.low,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct ReportRules {
    pub synthesis: SynthesisRules,
    pub scoring: ScoringRules,
    pub thresholds: TierThresholds,
    pub limits: TierLimits,
}

impl ReportRules {
    pub const DEFAULT_RULES: ReportRules = ReportRules {
        synthesis: SynthesisRules {
            affiliation_likelihoods: Vec::new(),
            default_likelihood: 0.5,
            per_holding_adjustment: 0.02,
            max_holding_adjustment: 0.2,
            abstain_band: 0.1,
            seed: SynthesisSeed::Unseeded,
        },
        scoring: ScoringRules {
            holdings_multiplier: 3,
            holdings_cap: 30,
            conflict_points: 15,
            conflict_weighting: ConflictWeighting::Flat,
            executive_points: 15,
            vulnerability_points: 10,
            vulnerability_threshold: 5.0,
            governing_affiliations: Vec::new(),
        },
        thresholds: TierThresholds {
            critical: 1.0,
            high: 2.5,
            medium: 5.0,
        },
        limits: TierLimits {
            critical: 5,
            high: 8,
            medium: 10,
            low: 10,
        },
    };

    /// Checks that the probabilities and thresholds make sense.
    pub fn validate(&self) -> Result<(), ReportErrors> {
        let s = &self.synthesis;
        let unit = |x: f64| (0.0..=1.0).contains(&x);
        for (affiliation, p) in s.affiliation_likelihoods.iter() {
            if !unit(*p) {
                return Err(ReportErrors::InvalidRules(format!(
                    "likelihood {} for affiliation {} is not within [0, 1]",
                    p, affiliation
                )));
            }
        }
        if !unit(s.default_likelihood) {
            return Err(ReportErrors::InvalidRules(format!(
                "default likelihood {} is not within [0, 1]",
                s.default_likelihood
            )));
        }
        if !unit(s.abstain_band) {
            return Err(ReportErrors::InvalidRules(format!(
                "abstain band {} is not within [0, 1]",
                s.abstain_band
            )));
        }
        if !(s.per_holding_adjustment >= 0.0 && s.max_holding_adjustment >= 0.0) {
            return Err(ReportErrors::InvalidRules(
                "holding adjustments must be non-negative".to_string(),
            ));
        }
        let t = &self.thresholds;
        if !(0.0 <= t.critical && t.critical <= t.high && t.high <= t.medium) {
            return Err(ReportErrors::InvalidRules(format!(
                "tier thresholds must be increasing: {:?}",
                t
            )));
        }
        if !(self.scoring.vulnerability_threshold >= 0.0) {
            return Err(ReportErrors::InvalidRules(
                "vulnerability threshold must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
