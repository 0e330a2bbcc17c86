// Primitives shared by the readers.

use std::path::Path;

use accountability::{Diagnostic, DiagnosticKind, ElectoralProfile, RosterEntry, VoteCast};
use serde_json::Value as JSValue;

/// Resolves a data file relative to the directory of the configuration.
pub fn resolve_path(root: &Path, file_path: &str) -> String {
    root.join(file_path).display().to_string()
}

/// Flags as found in spreadsheets and hand-written JSON.
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "" | "false" | "no" | "n" | "0" => Some(false),
        "true" | "yes" | "y" | "1" => Some(true),
        _ => None,
    }
}

pub fn parse_cast(s: &str) -> Option<VoteCast> {
    match s.trim().to_lowercase().as_str() {
        "for" | "yes" | "aye" => Some(VoteCast::For),
        "against" | "no" | "nay" => Some(VoteCast::Against),
        "abstain" | "abstained" => Some(VoteCast::Abstain),
        _ => None,
    }
}

/// Numbers may be written as JSON numbers or as strings.
pub fn read_js_f64(x: Option<&JSValue>) -> Option<f64> {
    match x {
        Some(JSValue::Number(n)) => n.as_f64(),
        Some(JSValue::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn read_js_i64(x: Option<&JSValue>) -> Option<i64> {
    match x {
        Some(JSValue::Number(n)) => n.as_i64(),
        Some(JSValue::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn read_js_u64(x: Option<&JSValue>) -> Option<u64> {
    match x {
        Some(JSValue::Number(n)) => n.as_u64(),
        Some(JSValue::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

/// Distinguishes an absent or empty cell from a cell that cannot be read.
pub fn is_blank(x: Option<&JSValue>) -> bool {
    match x {
        None | Some(JSValue::Null) => true,
        Some(JSValue::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Shape validation of one roster line, whatever the provider.
/// A rejected line is returned as a diagnostic for the report.
pub fn validate_roster_line(
    line: &str,
    name: Option<&str>,
    party: Option<&str>,
    constituency: Option<&str>,
    properties: Option<&JSValue>,
    executive: Option<&JSValue>,
) -> Result<RosterEntry, Diagnostic> {
    let name = match name.map(|n| n.trim()) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => {
            return Err(Diagnostic::new(
                DiagnosticKind::MalformedEntity,
                line,
                "missing name".to_string(),
            ))
        }
    };
    let holdings = if is_blank(properties) {
        0
    } else {
        match read_js_i64(properties) {
            Some(h) => h,
            None => {
                return Err(Diagnostic::new(
                    DiagnosticKind::MalformedEntity,
                    &name,
                    format!("holding count {:?} is not an integer", properties),
                ))
            }
        }
    };
    let executive_office = match executive {
        None | Some(JSValue::Null) => Some(false),
        Some(JSValue::Bool(b)) => Some(*b),
        Some(JSValue::String(s)) => parse_flag(s),
        Some(_) => None,
    };
    let executive_office = match executive_office {
        Some(b) => b,
        None => {
            return Err(Diagnostic::new(
                DiagnosticKind::MalformedEntity,
                &name,
                format!("executive flag {:?} is not a boolean", executive),
            ))
        }
    };
    Ok(RosterEntry {
        name,
        affiliation: party.unwrap_or("").trim().to_string(),
        constituency: constituency.unwrap_or("").trim().to_string(),
        holdings,
        executive_office,
    })
}

/// Reads the electoral figures of one constituency. Unreadable numbers become
/// unknown and are reported.
pub fn validate_electoral_line(
    constituency: &str,
    margin: Option<&JSValue>,
    votes_to_flip: Option<&JSValue>,
    diagnostics: &mut Vec<Diagnostic>,
) -> ElectoralProfile {
    let margin = if is_blank(margin) {
        None
    } else {
        let m = read_js_f64(margin);
        if m.is_none() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidElectoralData,
                constituency,
                format!("margin {:?} is not a number, treated as unknown", margin),
            ));
        }
        m
    };
    let votes_to_flip = if is_blank(votes_to_flip) {
        None
    } else {
        let v = read_js_u64(votes_to_flip);
        if v.is_none() {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidElectoralData,
                constituency,
                format!("votes to flip {:?} is not a count, treated as unknown", votes_to_flip),
            ));
        }
        v
    };
    ElectoralProfile {
        margin,
        votes_to_flip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag(""), Some(false));
        assert_eq!(parse_flag("sometimes"), None);
    }

    #[test]
    fn casts() {
        assert_eq!(parse_cast("Against"), Some(VoteCast::Against));
        assert_eq!(parse_cast("aye"), Some(VoteCast::For));
        assert_eq!(parse_cast("abstained"), Some(VoteCast::Abstain));
        assert_eq!(parse_cast("absent"), None);
    }

    #[test]
    fn numbers() {
        assert_eq!(read_js_f64(Some(&json!("1.6"))), Some(1.6));
        assert_eq!(read_js_f64(Some(&json!(0.8))), Some(0.8));
        assert_eq!(read_js_i64(Some(&json!(-3))), Some(-3));
        assert_eq!(read_js_u64(Some(&json!(-3))), None);
        assert_eq!(read_js_u64(Some(&json!("312"))), Some(312));
        assert_eq!(read_js_f64(Some(&json!(true))), None);
        assert!(is_blank(Some(&JSValue::Null)));
        assert!(is_blank(Some(&json!(" "))));
        assert!(!is_blank(Some(&json!("x"))));
    }

    #[test]
    fn roster_lines() {
        let ok = validate_roster_line(
            "line 1",
            Some(" Aoife Byrne "),
            Some("Blue"),
            Some("Harbour"),
            Some(&json!("3")),
            Some(&json!("yes")),
        )
        .unwrap();
        assert_eq!(ok.name, "Aoife Byrne");
        assert_eq!(ok.holdings, 3);
        assert!(ok.executive_office);

        let missing = validate_roster_line("line 2", None, None, None, None, None).unwrap_err();
        assert_eq!(missing.kind, DiagnosticKind::MalformedEntity);
        assert_eq!(missing.subject, "line 2");

        let bad_flag = validate_roster_line(
            "line 3",
            Some("Declan Fox"),
            None,
            None,
            Some(&json!(6)),
            Some(&json!(2)),
        )
        .unwrap_err();
        assert_eq!(bad_flag.subject, "Declan Fox");

        // Negative counts go through, the engine reports them.
        let negative = validate_roster_line(
            "line 4",
            Some("Neg"),
            None,
            None,
            Some(&json!(-1)),
            None,
        )
        .unwrap();
        assert_eq!(negative.holdings, -1);
    }

    #[test]
    fn electoral_lines() {
        let mut diagnostics = Vec::new();
        let p = validate_electoral_line("Harbour", Some(&json!("0.8")), Some(&json!(312)), &mut diagnostics);
        assert_eq!(p.margin, Some(0.8));
        assert_eq!(p.votes_to_flip, Some(312));
        let q = validate_electoral_line("Hillside", Some(&json!("n/a")), None, &mut diagnostics);
        assert_eq!(q.margin, None);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::InvalidElectoralData);
    }
}
