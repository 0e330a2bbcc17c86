pub use crate::config::*;
use crate::{build_report, check_slate, Dataset};

/// A builder for loading the datasets one record at a time.
///
/// ```
/// pub use accountability::builder::Builder;
/// pub use accountability::*;
///
/// let event = TrackedEvent {
///     id: "rent-freeze".to_string(),
///     title: "Rent freeze".to_string(),
///     date: "2020-10-21".to_string(),
///     favorable_position: Position::For,
///     weight: 1.0,
/// };
/// let mut builder = Builder::new(&ReportRules::DEFAULT_RULES)?.events(&[event])?;
///
/// builder.add_entity_simple("Anna", "Blue", "North", 3)?;
/// builder.add_sourced_votes("Anna", &[("rent-freeze".to_string(), VoteCast::Against)])?;
/// builder.add_electoral_profile("North", Some(0.4), Some(150))?;
///
/// let report = builder.build("2026-10-17T00:00:00+00:00")?;
/// assert_eq!(report.results[0].scores.tier, Tier::Critical);
///
/// # Ok::<(), ReportErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: ReportRules,
    pub(crate) _events: Option<Vec<TrackedEvent>>,
    pub(crate) _dataset: Dataset,
}

impl Builder {
    pub fn new(rules: &ReportRules) -> Result<Builder, ReportErrors> {
        rules.validate()?;
        Ok(Builder {
            _rules: rules.clone(),
            _events: None,
            _dataset: Dataset::default(),
        })
    }

    /// Sets the slate of tracked events.
    pub fn events(self, events: &[TrackedEvent]) -> Result<Builder, ReportErrors> {
        check_slate(events)?;
        Ok(Builder {
            _rules: self._rules,
            _events: Some(events.to_vec()),
            _dataset: self._dataset,
        })
    }

    /// Adds a representative without executive office.
    pub fn add_entity_simple(
        &mut self,
        name: &str,
        affiliation: &str,
        constituency: &str,
        holdings: u32,
    ) -> Result<(), ReportErrors> {
        self.add_entity(RosterEntry {
            name: name.to_string(),
            affiliation: affiliation.to_string(),
            constituency: constituency.to_string(),
            holdings: holdings as i64,
            executive_office: false,
        })
    }

    /// Adds a roster entry. Validation happens when the report is built, so a
    /// malformed entry ends up in the diagnostics rather than failing here.
    pub fn add_entity(&mut self, entry: RosterEntry) -> Result<(), ReportErrors> {
        self._dataset.roster.push(entry);
        Ok(())
    }

    /// Adds recorded votes for a representative. Calling this at least once
    /// marks the vote dataset as present.
    pub fn add_sourced_votes(
        &mut self,
        name: &str,
        votes: &[(String, VoteCast)],
    ) -> Result<(), ReportErrors> {
        let votes: Vec<SourcedVote> = votes
            .iter()
            .map(|(event_id, cast)| SourcedVote {
                event_id: event_id.clone(),
                cast: *cast,
            })
            .collect();
        self._dataset
            .sourced_votes
            .get_or_insert_with(Vec::new)
            .push((name.to_string(), votes));
        Ok(())
    }

    /// Adds the electoral profile of a constituency. Calling this at least once
    /// marks the electoral dataset as present.
    pub fn add_electoral_profile(
        &mut self,
        constituency: &str,
        margin: Option<f64>,
        votes_to_flip: Option<u64>,
    ) -> Result<(), ReportErrors> {
        self._dataset
            .electoral
            .get_or_insert_with(Vec::new)
            .push((
                constituency.to_string(),
                ElectoralProfile {
                    margin,
                    votes_to_flip,
                },
            ));
        Ok(())
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self._dataset.diagnostics.push(diagnostic);
    }

    pub fn build(&self, generated_at: &str) -> Result<AccountabilityReport, ReportErrors> {
        let events = self._events.as_deref().ok_or(ReportErrors::EmptyEventSlate)?;
        build_report(&self._dataset, events, &self._rules, generated_at)
    }
}
