// Primitives for reading CSV files.

use std::collections::HashMap;

use accountability::{Diagnostic, DiagnosticKind, ElectoralProfile, RosterEntry, SourcedVote};

use crate::watch::io_common::*;
use crate::watch::*;

/// The rows of a CSV file with headers, as maps from header to cell.
fn get_records(path: &str, required: &[&str]) -> WatchResult<Vec<HashMap<String, String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let headers: Vec<String> = rdr
        .headers()
        .context(CsvOpenSnafu { path })?
        .iter()
        .map(|h| h.to_lowercase())
        .collect();
    for column in required {
        ensure!(
            headers.iter().any(|h| h == column),
            CsvMissingColumnSnafu {
                column: *column,
                path
            }
        );
    }
    let mut rows: Vec<HashMap<String, String>> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("get_records: {:?} {:?}", lineno, line);
        rows.push(
            headers
                .iter()
                .cloned()
                .zip(line.iter().map(|s| s.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

fn cell(row: &HashMap<String, String>, column: &str) -> Option<JSValue> {
    row.get(column).map(|s| JSValue::String(s.clone()))
}

/// Roster with the columns `name,party,constituency,properties,executive`.
pub fn read_roster_csv(path: &str) -> WatchResult<(Vec<RosterEntry>, Vec<Diagnostic>)> {
    let rows = get_records(path, &["name", "properties"])?;
    let mut roster: Vec<RosterEntry> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let line = format!("roster line {}", idx + 2);
        let res = validate_roster_line(
            &line,
            row.get("name").map(|s| s.as_str()),
            row.get("party").map(|s| s.as_str()),
            row.get("constituency").map(|s| s.as_str()),
            cell(row, "properties").as_ref(),
            cell(row, "executive").as_ref(),
        );
        match res {
            Ok(entry) => roster.push(entry),
            Err(d) => diagnostics.push(d),
        }
    }
    debug!("read_roster_csv: {} entries, {} rejected", roster.len(), diagnostics.len());
    Ok((roster, diagnostics))
}

/// Recorded votes, one per line, with the columns `name,event,vote`.
/// The votes of an entity are grouped in the order of the file.
pub fn read_votes_csv(
    path: &str,
) -> WatchResult<(Vec<(String, Vec<SourcedVote>)>, Vec<Diagnostic>)> {
    let rows = get_records(path, &["name", "event", "vote"])?;
    let mut res: Vec<(String, Vec<SourcedVote>)> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let name = row.get("name").cloned().unwrap_or_default();
        let event = row.get("event").cloned().unwrap_or_default();
        let cast = row.get("vote").and_then(|c| parse_cast(c));
        let cast = match (name.is_empty() || event.is_empty(), cast) {
            (false, Some(cast)) => cast,
            _ => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedVote,
                    &format!("votes line {}", idx + 2),
                    format!(
                        "unreadable vote {:?} by {:?} on {:?} ignored",
                        row.get("vote"),
                        name,
                        event
                    ),
                ));
                continue;
            }
        };
        let vote = SourcedVote {
            event_id: event,
            cast,
        };
        match res.iter().position(|(n, _)| *n == name) {
            Some(idx) => res[idx].1.push(vote),
            None => res.push((name, vec![vote])),
        }
    }
    Ok((res, diagnostics))
}

/// Electoral data with the columns `constituency,margin,votes_to_flip`.
pub fn read_electoral_csv(
    path: &str,
) -> WatchResult<(Vec<(String, ElectoralProfile)>, Vec<Diagnostic>)> {
    let rows = get_records(path, &["constituency", "margin"])?;
    let mut res: Vec<(String, ElectoralProfile)> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for row in rows.iter() {
        let constituency = row.get("constituency").cloned().unwrap_or_default();
        if constituency.is_empty() {
            warn!("read_electoral_csv: skipping a line without constituency in {}", path);
            continue;
        }
        let profile = validate_electoral_line(
            &constituency,
            cell(row, "margin").as_ref(),
            cell(row, "votes_to_flip").as_ref(),
            &mut diagnostics,
        );
        res.push((constituency, profile));
    }
    Ok((res, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use accountability::VoteCast;

    fn write_tmp(name: &str, contents: &str) -> String {
        let p = std::env::temp_dir().join(name).display().to_string();
        fs::write(&p, contents).unwrap();
        p
    }

    #[test]
    fn votes_are_grouped_by_name() {
        let p = write_tmp(
            "tierwatch_votes_grouped.csv",
            "name,event,vote\nAoife Byrne,rent-freeze,against\nBrian Walsh,rent-freeze,for\nAoife Byrne,eviction-ban-repeal,For\nBrian Walsh,rent-pressure-zones,maybe\n",
        );
        let (votes, diagnostics) = read_votes_csv(&p).unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].0, "Aoife Byrne");
        assert_eq!(votes[0].1.len(), 2);
        assert_eq!(votes[0].1[1].cast, VoteCast::For);
        assert_eq!(votes[1].1.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MalformedVote);
        assert_eq!(diagnostics[0].subject, "votes line 5");
    }

    #[test]
    fn missing_column() {
        let p = write_tmp("tierwatch_missing_column.csv", "name,party\nAoife Byrne,Blue\n");
        let res = read_roster_csv(&p);
        assert!(matches!(res, Err(WatchError::CsvMissingColumn { .. })));
    }
}
