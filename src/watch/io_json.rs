// Readers for the JSON providers.
//
// Every dataset may be written either as an object keyed by the natural key
// (entity name or constituency), or as an array of objects carrying that key.
// Both keep the order of the file.

use accountability::{Diagnostic, DiagnosticKind, ElectoralProfile, RosterEntry, SourcedVote};

use crate::watch::io_common::*;
use crate::watch::*;

pub fn read_js(path: &str) -> WatchResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

fn keyed_entries(js: JSValue, key: &str, path: &str) -> WatchResult<Vec<(Option<String>, JSValue)>> {
    match js {
        JSValue::Array(items) => Ok(items
            .into_iter()
            .map(|item| {
                let k = item.get(key).and_then(|v| v.as_str()).map(|s| s.to_string());
                (k, item)
            })
            .collect()),
        JSValue::Object(m) => Ok(m.into_iter().map(|(k, v)| (Some(k), v)).collect()),
        _ => JsonLayoutSnafu {
            path,
            message: format!("expected an array or an object keyed by {}", key),
        }
        .fail(),
    }
}

pub fn read_roster_json(path: &str) -> WatchResult<(Vec<RosterEntry>, Vec<Diagnostic>)> {
    let js = read_js(path)?;
    let mut roster: Vec<RosterEntry> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for (idx, (name, fields)) in keyed_entries(js, "name", path)?.into_iter().enumerate() {
        let line = format!("roster entry {}", idx + 1);
        let res = validate_roster_line(
            &line,
            name.as_deref(),
            fields.get("party").and_then(|v| v.as_str()),
            fields.get("constituency").and_then(|v| v.as_str()),
            fields.get("properties"),
            fields.get("executive"),
        );
        match res {
            Ok(entry) => roster.push(entry),
            Err(d) => diagnostics.push(d),
        }
    }
    debug!("read_roster_json: {} entries, {} rejected", roster.len(), diagnostics.len());
    Ok((roster, diagnostics))
}

/// Recorded votes: for each entity, a list of `{"event": id, "vote": cast}`.
pub fn read_votes_json(
    path: &str,
) -> WatchResult<(Vec<(String, Vec<SourcedVote>)>, Vec<Diagnostic>)> {
    let js = read_js(path)?;
    let mut res: Vec<(String, Vec<SourcedVote>)> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for (name, fields) in keyed_entries(js, "name", path)? {
        let name = name.context(JsonLayoutSnafu {
            path,
            message: "vote entry without a name",
        })?;
        // Array entries carry their votes in a field, object entries are the list itself.
        let list: Vec<JSValue> = match fields {
            JSValue::Array(l) => l,
            JSValue::Object(mut m) => match m.remove("votes") {
                Some(JSValue::Array(l)) => l,
                _ => {
                    return JsonLayoutSnafu {
                        path,
                        message: format!("no vote list for {}", name),
                    }
                    .fail()
                }
            },
            _ => {
                return JsonLayoutSnafu {
                    path,
                    message: format!("no vote list for {}", name),
                }
                .fail()
            }
        };
        let mut votes: Vec<SourcedVote> = Vec::new();
        for v in list.iter() {
            let event = v
                .get("event")
                .or_else(|| v.get("eventId"))
                .and_then(|e| e.as_str());
            let cast = v.get("vote").and_then(|c| c.as_str()).and_then(parse_cast);
            match (event, cast) {
                (Some(event), Some(cast)) => votes.push(SourcedVote {
                    event_id: event.to_string(),
                    cast,
                }),
                _ => diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MalformedVote,
                    &name,
                    format!("unreadable vote {} ignored", v),
                )),
            }
        }
        res.push((name, votes));
    }
    Ok((res, diagnostics))
}

/// Electoral data: for each constituency, `{"margin": .., "votesToFlip": ..}`.
pub fn read_electoral_json(
    path: &str,
) -> WatchResult<(Vec<(String, ElectoralProfile)>, Vec<Diagnostic>)> {
    let js = read_js(path)?;
    let mut res: Vec<(String, ElectoralProfile)> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for (constituency, fields) in keyed_entries(js, "constituency", path)? {
        let constituency = constituency.context(JsonLayoutSnafu {
            path,
            message: "electoral entry without a constituency",
        })?;
        let profile = validate_electoral_line(
            &constituency,
            fields.get("margin"),
            fields.get("votesToFlip").or_else(|| fields.get("votes_to_flip")),
            &mut diagnostics,
        );
        res.push((constituency, profile));
    }
    Ok((res, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_roster_keeps_file_order() {
        let p = std::env::temp_dir().join("tierwatch_keyed_roster.json");
        let p = p.display().to_string();
        fs::write(
            &p,
            r#"{
  "Zoe Ryan": {"party": "Blue", "constituency": "Harbour", "properties": 2},
  "Aoife Byrne": {"party": "Red", "constituency": "Hillside", "properties": 1, "executive": "yes"}
}"#,
        )
        .unwrap();
        let (roster, diagnostics) = read_roster_json(&p).unwrap();
        assert!(diagnostics.is_empty());
        let names: Vec<&str> = roster.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Zoe Ryan", "Aoife Byrne"]);
        assert!(roster[1].executive_office);
    }
}
