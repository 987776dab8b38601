//! Display-ready projections of programs and screenings.

use chrono::{NaiveDate, NaiveDateTime};
use cinema_shared::{
    domain::{ProgramId, ProgramState, ScreeningId, ScreeningState},
    protocol::{Program, Screening},
};

use crate::gating::{action_matrix, Capability, GateContext, ScreeningAction};

pub const MISSING: &str = "-";

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// `from → to`, or a single `-` unless both ends are known.
pub fn format_range<T, F>(from: Option<&T>, to: Option<&T>, format: F) -> String
where
    F: Fn(&T) -> String,
{
    match (from, to) {
        (Some(from), Some(to)) => format!("{} → {}", format(from), format(to)),
        _ => MISSING.to_string(),
    }
}

fn format_date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn text_or_missing(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => MISSING.to_string(),
    }
}

pub fn advance_label(state: ProgramState) -> String {
    match state.next() {
        Some(next) => format!("Advance state to {next}"),
        None => format!("State is final ({state})"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramRow {
    pub id: ProgramId,
    pub name: String,
    pub dates: String,
    pub state: ProgramState,
}

impl From<&Program> for ProgramRow {
    fn from(program: &Program) -> Self {
        Self {
            id: program.id,
            name: program.name.clone(),
            dates: format_range(program.start_date.as_ref(), program.end_date.as_ref(), format_date),
            state: program.state,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDetails {
    pub id: ProgramId,
    pub name: String,
    pub description: String,
    pub dates: String,
    pub state: ProgramState,
    pub creator: String,
    pub created: String,
    pub programmers: u32,
    pub staff: u32,
    pub screenings: u32,
    pub programmer_usernames: Vec<String>,
    pub staff_usernames: Vec<String>,
    pub advance_label: String,
}

impl From<&Program> for ProgramDetails {
    fn from(program: &Program) -> Self {
        Self {
            id: program.id,
            name: program.name.clone(),
            description: text_or_missing(program.description.as_deref()),
            dates: format_range(program.start_date.as_ref(), program.end_date.as_ref(), format_date),
            state: program.state,
            creator: text_or_missing(program.creator_username.as_deref()),
            created: program
                .creation_date
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| MISSING.to_string()),
            programmers: program.programmers_count.unwrap_or(0),
            staff: program.staff_count.unwrap_or(0),
            screenings: program.screenings_count.unwrap_or(0),
            programmer_usernames: program.programmer_usernames.clone().unwrap_or_default(),
            staff_usernames: program.staff_usernames.clone().unwrap_or_default(),
            advance_label: advance_label(program.state),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningRow {
    pub id: ScreeningId,
    pub title: String,
    pub auditorium: String,
    pub times: String,
    pub state: ScreeningState,
    pub submitter: String,
    pub handler: String,
}

impl From<&Screening> for ScreeningRow {
    fn from(screening: &Screening) -> Self {
        Self {
            id: screening.id,
            title: text_or_missing(screening.film_title.as_deref()),
            auditorium: text_or_missing(screening.auditorium_name.as_deref()),
            times: format_range(
                screening.start_time.as_ref(),
                screening.end_time.as_ref(),
                format_timestamp,
            ),
            state: screening.state,
            submitter: text_or_missing(screening.submitter_username.as_deref()),
            handler: text_or_missing(screening.handler_username.as_deref()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSummary {
    pub score: i32,
    pub comments: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningDetails {
    pub id: ScreeningId,
    pub title: String,
    pub cast: String,
    pub genres: String,
    pub duration: String,
    pub auditorium: String,
    pub start: String,
    pub end: String,
    pub state: ScreeningState,
    pub submitter: String,
    pub handler: String,
    /// Only present once the screening has a score.
    pub review: Option<ReviewSummary>,
    pub approval_notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub final_submitted: bool,
    pub actions: Vec<(ScreeningAction, Capability)>,
}

impl ScreeningDetails {
    pub fn new(caller: Option<&str>, program: &Program, screening: &Screening) -> Self {
        let time = |value: Option<&NaiveDateTime>| {
            value.map(format_timestamp).unwrap_or_else(|| MISSING.to_string())
        };
        let ctx = GateContext::new(caller, program, screening);
        Self {
            id: screening.id,
            title: text_or_missing(screening.film_title.as_deref()),
            cast: text_or_missing(screening.film_cast.as_deref()),
            genres: text_or_missing(screening.film_genres.as_deref()),
            duration: screening
                .film_duration_minutes
                .filter(|minutes| *minutes > 0)
                .map(|minutes| format!("{minutes} min"))
                .unwrap_or_else(|| MISSING.to_string()),
            auditorium: text_or_missing(screening.auditorium_name.as_deref()),
            start: time(screening.start_time.as_ref()),
            end: time(screening.end_time.as_ref()),
            state: screening.state,
            submitter: text_or_missing(screening.submitter_username.as_deref()),
            handler: text_or_missing(screening.handler_username.as_deref()),
            review: screening.review_score.map(|score| ReviewSummary {
                score,
                comments: text_or_missing(screening.review_comments.as_deref()),
            }),
            approval_notes: screening.approval_notes.clone().filter(|n| !n.trim().is_empty()),
            rejection_reason: screening
                .rejection_reason
                .clone()
                .filter(|r| !r.trim().is_empty()),
            final_submitted: screening.final_submitted,
            actions: action_matrix(&ctx),
        }
    }

    pub fn allowed(&self) -> impl Iterator<Item = ScreeningAction> + '_ {
        self.actions
            .iter()
            .filter(|(_, capability)| capability.is_allowed())
            .map(|(action, _)| *action)
    }
}
