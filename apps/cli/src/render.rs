//! Plain-text rendering of the client's view models.

use std::fmt::Write as _;

use cinema_client::{
    gating::Capability,
    view::{ProgramDetails, ProgramRow, ScreeningDetails, ScreeningRow, MISSING},
};

pub fn program_table(rows: &[ProgramRow]) -> String {
    if rows.is_empty() {
        return "No programs.\n".into();
    }
    let mut out = format!("{:<6} {:<30} {:<25} {}\n", "ID", "NAME", "DATES", "STATE");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<6} {:<30} {:<25} {}",
            row.id, row.name, row.dates, row.state
        );
    }
    out
}

fn join_or_missing(names: &[String]) -> String {
    if names.is_empty() {
        MISSING.into()
    } else {
        names.join(", ")
    }
}

pub fn program_details(details: &ProgramDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Program #{}: {}", details.id, details.name);
    let _ = writeln!(out, "  Description:  {}", details.description);
    let _ = writeln!(out, "  Dates:        {}", details.dates);
    let _ = writeln!(out, "  State:        {}", details.state);
    let _ = writeln!(out, "  Created by:   {} at {}", details.creator, details.created);
    let _ = writeln!(
        out,
        "  Programmers:  {} ({})",
        details.programmers,
        join_or_missing(&details.programmer_usernames)
    );
    let _ = writeln!(
        out,
        "  Staff:        {} ({})",
        details.staff,
        join_or_missing(&details.staff_usernames)
    );
    let _ = writeln!(out, "  Screenings:   {}", details.screenings);
    let _ = writeln!(out, "  {}", details.advance_label);
    out
}

pub fn screening_table(rows: &[ScreeningRow]) -> String {
    if rows.is_empty() {
        return "No screenings.\n".into();
    }
    let mut out = format!(
        "{:<6} {:<28} {:<12} {:<36} {:<10} {:<12} {}\n",
        "ID", "TITLE", "AUDITORIUM", "TIME", "STATE", "SUBMITTER", "HANDLER"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<6} {:<28} {:<12} {:<36} {:<10} {:<12} {}",
            row.id,
            row.title,
            row.auditorium,
            row.times,
            row.state,
            row.submitter,
            row.handler
        );
    }
    out
}

pub fn screening_details(details: &ScreeningDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Screening #{}: {}", details.id, details.title);
    let _ = writeln!(out, "  Cast:         {}", details.cast);
    let _ = writeln!(out, "  Genres:       {}", details.genres);
    let _ = writeln!(out, "  Duration:     {}", details.duration);
    let _ = writeln!(out, "  Auditorium:   {}", details.auditorium);
    let _ = writeln!(out, "  Start:        {}", details.start);
    let _ = writeln!(out, "  End:          {}", details.end);
    let _ = writeln!(out, "  State:        {}", details.state);
    let _ = writeln!(out, "  Submitter:    {}", details.submitter);
    let _ = writeln!(out, "  Handler:      {}", details.handler);
    if let Some(review) = &details.review {
        let _ = writeln!(out, "  Review:       {}/10, {}", review.score, review.comments);
    }
    if let Some(notes) = &details.approval_notes {
        let _ = writeln!(out, "  Approval:     {notes}");
    }
    if let Some(reason) = &details.rejection_reason {
        let _ = writeln!(out, "  Rejected:     {reason}");
    }
    if details.final_submitted {
        let _ = writeln!(out, "  Final submission received");
    }
    let _ = writeln!(out, "  Actions:");
    for (action, capability) in &details.actions {
        let mark = match capability {
            Capability::Allowed => "x",
            Capability::Denied => " ",
        };
        let _ = writeln!(out, "    [{mark}] {action}");
    }
    out
}

#[cfg(test)]
mod tests {
    use cinema_shared::protocol::{Program, Screening};
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_tables_say_so() {
        assert_eq!(program_table(&[]), "No programs.\n");
        assert_eq!(screening_table(&[]), "No screenings.\n");
    }

    #[test]
    fn program_details_show_advance_label() {
        let program: Program = serde_json::from_value(json!({
            "id": 4,
            "name": "Winter",
            "state": "ANNOUNCED",
            "programmerUsernames": ["prog1", "prog2"]
        }))
        .expect("program");
        let text = program_details(&ProgramDetails::from(&program));
        assert!(text.contains("Programmers:  0 (prog1, prog2)"));
        assert!(text.contains("State is final (ANNOUNCED)"));
    }

    #[test]
    fn screening_details_mark_allowed_actions() {
        let program: Program =
            serde_json::from_value(json!({ "id": 1, "name": "P", "state": "REVIEW" }))
                .expect("program");
        let screening: Screening = serde_json::from_value(json!({
            "id": 2,
            "state": "SUBMITTED",
            "handlerUsername": "staff1"
        }))
        .expect("screening");
        let text = screening_details(&ScreeningDetails::new(Some("staff1"), &program, &screening));
        assert!(text.contains("[x] review"));
        assert!(text.contains("[ ] submit"));
        assert!(!text.contains("Review:"));
    }
}
