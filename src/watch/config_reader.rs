use accountability::*;
use chrono::NaiveDate;
use serde_json::Map as JSMap;

use crate::watch::io_common::*;
use crate::watch::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TierLimitsConfig {
    pub critical: Option<JSValue>,
    pub high: Option<JSValue>,
    pub medium: Option<JSValue>,
    pub low: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportName")]
    pub report_name: String,
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    #[serde(rename = "tierLimits")]
    pub tier_limits: Option<TierLimitsConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DataSources {
    pub roster: FileSource,
    pub votes: Option<FileSource>,
    pub electoral: Option<FileSource>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(rename = "favorablePosition")]
    pub favorable_position: String,
    pub weight: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TierThresholdsConfig {
    pub critical: Option<JSValue>,
    pub high: Option<JSValue>,
    pub medium: Option<JSValue>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "affiliationLikelihoods")]
    pub affiliation_likelihoods: Option<JSMap<String, JSValue>>,
    #[serde(rename = "defaultLikelihood")]
    pub default_likelihood: Option<JSValue>,
    #[serde(rename = "perHoldingAdjustment")]
    pub per_holding_adjustment: Option<JSValue>,
    #[serde(rename = "maxHoldingAdjustment")]
    pub max_holding_adjustment: Option<JSValue>,
    #[serde(rename = "abstainBand")]
    pub abstain_band: Option<JSValue>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<JSValue>,
    #[serde(rename = "holdingsMultiplier")]
    pub holdings_multiplier: Option<JSValue>,
    #[serde(rename = "holdingsCap")]
    pub holdings_cap: Option<JSValue>,
    #[serde(rename = "conflictPoints")]
    pub conflict_points: Option<JSValue>,
    #[serde(rename = "conflictWeighting")]
    pub conflict_weighting: Option<String>,
    #[serde(rename = "executivePoints")]
    pub executive_points: Option<JSValue>,
    #[serde(rename = "vulnerabilityPoints")]
    pub vulnerability_points: Option<JSValue>,
    #[serde(rename = "vulnerabilityThreshold")]
    pub vulnerability_threshold: Option<JSValue>,
    #[serde(rename = "governingAffiliations")]
    pub governing_affiliations: Option<Vec<String>>,
    #[serde(rename = "tierThresholds")]
    pub tier_thresholds: Option<TierThresholdsConfig>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "dataSources")]
    pub data_sources: DataSources,
    #[serde(rename = "trackedEvents")]
    pub tracked_events: Vec<EventConfig>,
    #[serde(default)]
    pub rules: RulesConfig,
}

pub fn read_config(path: &str) -> WatchResult<WatchConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

// A missing field keeps the default, a present but unreadable one is an error.
fn read_f64(x: &Option<JSValue>, field: &str, default: f64) -> WatchResult<f64> {
    match x {
        None => Ok(default),
        Some(_) => read_js_f64(x.as_ref()).context(ParsingJsonNumberSnafu { field }),
    }
}

fn read_u32(x: &Option<JSValue>, field: &str, default: u32) -> WatchResult<u32> {
    match x {
        None => Ok(default),
        Some(_) => read_js_u64(x.as_ref())
            .and_then(|v| u32::try_from(v).ok())
            .context(ParsingJsonNumberSnafu { field }),
    }
}

fn read_usize(x: &Option<JSValue>, field: &str, default: usize) -> WatchResult<usize> {
    match x {
        None => Ok(default),
        Some(_) => read_js_u64(x.as_ref())
            .map(|v| v as usize)
            .context(ParsingJsonNumberSnafu { field }),
    }
}

pub fn validate_events(events: &[EventConfig]) -> WatchResult<Vec<TrackedEvent>> {
    let mut res: Vec<TrackedEvent> = Vec::new();
    for e in events.iter() {
        let date = NaiveDate::parse_from_str(e.date.trim(), "%Y-%m-%d").context(InvalidDateSnafu {
            id: e.id.clone(),
            date: e.date.clone(),
        })?;
        let favorable_position = match e.favorable_position.trim().to_lowercase().as_str() {
            "for" => Position::For,
            "against" => Position::Against,
            x => {
                whatever!(
                    "Event {}: favorable position must be 'for' or 'against', got {:?}",
                    e.id,
                    x
                )
            }
        };
        res.push(TrackedEvent {
            id: e.id.trim().to_string(),
            title: e.title.clone(),
            date: date.format("%Y-%m-%d").to_string(),
            favorable_position,
            weight: read_f64(&e.weight, "weight", 1.0)?,
        });
    }
    Ok(res)
}

pub fn validate_rules(
    rules: &RulesConfig,
    output: &OutputSettings,
    seed_override: Option<u64>,
) -> WatchResult<ReportRules> {
    let d = ReportRules::DEFAULT_RULES;

    let mut affiliation_likelihoods: Vec<(String, f64)> = Vec::new();
    if let Some(table) = &rules.affiliation_likelihoods {
        for (affiliation, p) in table.iter() {
            let p = read_js_f64(Some(p)).context(ParsingJsonNumberSnafu {
                field: format!("affiliationLikelihoods.{}", affiliation),
            })?;
            affiliation_likelihoods.push((affiliation.clone(), p));
        }
    }

    let seed = match (seed_override, &rules.random_seed) {
        (Some(s), _) => SynthesisSeed::Seeded(s),
        (None, None) => SynthesisSeed::Unseeded,
        (None, x) => SynthesisSeed::Seeded(
            read_js_u64(x.as_ref()).context(ParsingJsonNumberSnafu { field: "randomSeed" })?,
        ),
    };

    let conflict_weighting = match rules.conflict_weighting.as_deref() {
        None | Some("flat") => ConflictWeighting::Flat,
        Some("eventWeight") => ConflictWeighting::EventWeight,
        Some(x) => {
            whatever!("Cannot use conflict weighting {:?}: expected flat or eventWeight", x)
        }
    };

    let thresholds = match &rules.tier_thresholds {
        None => d.thresholds,
        Some(t) => TierThresholds {
            critical: read_f64(&t.critical, "tierThresholds.critical", d.thresholds.critical)?,
            high: read_f64(&t.high, "tierThresholds.high", d.thresholds.high)?,
            medium: read_f64(&t.medium, "tierThresholds.medium", d.thresholds.medium)?,
        },
    };

    let limits = match &output.tier_limits {
        None => d.limits,
        Some(l) => TierLimits {
            critical: read_usize(&l.critical, "tierLimits.critical", d.limits.critical)?,
            high: read_usize(&l.high, "tierLimits.high", d.limits.high)?,
            medium: read_usize(&l.medium, "tierLimits.medium", d.limits.medium)?,
            low: read_usize(&l.low, "tierLimits.low", d.limits.low)?,
        },
    };

    let res = ReportRules {
        synthesis: SynthesisRules {
            affiliation_likelihoods,
            default_likelihood: read_f64(
                &rules.default_likelihood,
                "defaultLikelihood",
                d.synthesis.default_likelihood,
            )?,
            per_holding_adjustment: read_f64(
                &rules.per_holding_adjustment,
                "perHoldingAdjustment",
                d.synthesis.per_holding_adjustment,
            )?,
            max_holding_adjustment: read_f64(
                &rules.max_holding_adjustment,
                "maxHoldingAdjustment",
                d.synthesis.max_holding_adjustment,
            )?,
            abstain_band: read_f64(&rules.abstain_band, "abstainBand", d.synthesis.abstain_band)?,
            seed,
        },
        scoring: ScoringRules {
            holdings_multiplier: read_u32(
                &rules.holdings_multiplier,
                "holdingsMultiplier",
                d.scoring.holdings_multiplier,
            )?,
            holdings_cap: read_u32(&rules.holdings_cap, "holdingsCap", d.scoring.holdings_cap)?,
            conflict_points: read_u32(
                &rules.conflict_points,
                "conflictPoints",
                d.scoring.conflict_points,
            )?,
            conflict_weighting,
            executive_points: read_u32(
                &rules.executive_points,
                "executivePoints",
                d.scoring.executive_points,
            )?,
            vulnerability_points: read_u32(
                &rules.vulnerability_points,
                "vulnerabilityPoints",
                d.scoring.vulnerability_points,
            )?,
            vulnerability_threshold: read_f64(
                &rules.vulnerability_threshold,
                "vulnerabilityThreshold",
                d.scoring.vulnerability_threshold,
            )?,
            governing_affiliations: rules.governing_affiliations.clone().unwrap_or_default(),
        },
        thresholds,
        limits,
    };
    // Catch the inconsistent values here, with a readable message.
    res.validate().context(ReportSnafu {})?;
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output() -> OutputSettings {
        OutputSettings {
            report_name: "test".to_string(),
            output_path: None,
            tier_limits: Some(TierLimitsConfig {
                critical: Some(json!("2")),
                high: None,
                medium: None,
                low: Some(json!(3)),
            }),
        }
    }

    #[test]
    fn defaults_when_empty() {
        let rules = validate_rules(&RulesConfig::default(), &output(), None).unwrap();
        assert_eq!(rules.scoring, ReportRules::DEFAULT_RULES.scoring);
        assert_eq!(rules.synthesis.seed, SynthesisSeed::Unseeded);
        assert_eq!(rules.limits.critical, 2);
        assert_eq!(rules.limits.high, 8);
        assert_eq!(rules.limits.low, 3);
    }

    #[test]
    fn seed_and_table() {
        let cfg: RulesConfig = serde_json::from_value(json!({
            "affiliationLikelihoods": {"Blue": 0.7, "Green": "0.1"},
            "randomSeed": "42",
            "conflictWeighting": "eventWeight",
            "governingAffiliations": ["Blue"]
        }))
        .unwrap();
        let rules = validate_rules(&cfg, &output(), None).unwrap();
        assert_eq!(rules.synthesis.seed, SynthesisSeed::Seeded(42));
        assert_eq!(
            rules.synthesis.affiliation_likelihoods,
            vec![("Blue".to_string(), 0.7), ("Green".to_string(), 0.1)]
        );
        assert_eq!(rules.scoring.conflict_weighting, ConflictWeighting::EventWeight);
        let overridden = validate_rules(&cfg, &output(), Some(7)).unwrap();
        assert_eq!(overridden.synthesis.seed, SynthesisSeed::Seeded(7));
    }

    #[test]
    fn invalid_rules_are_errors() {
        let cfg: RulesConfig = serde_json::from_value(json!({"defaultLikelihood": 2.0})).unwrap();
        assert!(validate_rules(&cfg, &output(), None).is_err());
        let cfg: RulesConfig = serde_json::from_value(json!({"holdingsCap": "lots"})).unwrap();
        assert!(validate_rules(&cfg, &output(), None).is_err());
        let cfg: RulesConfig = serde_json::from_value(json!({"conflictWeighting": "squared"})).unwrap();
        assert!(validate_rules(&cfg, &output(), None).is_err());
    }

    #[test]
    fn events() {
        let cfg = vec![EventConfig {
            id: "rent-freeze".to_string(),
            title: "Rent freeze".to_string(),
            date: "2020-10-21".to_string(),
            favorable_position: "For".to_string(),
            weight: Some(json!("1.5")),
        }];
        let events = validate_events(&cfg).unwrap();
        assert_eq!(events[0].favorable_position, Position::For);
        assert_eq!(events[0].weight, 1.5);

        let bad_date = vec![EventConfig {
            date: "21/10/2020".to_string(),
            ..cfg[0].clone()
        }];
        assert!(validate_events(&bad_date).is_err());
    }
}
