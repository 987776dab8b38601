//! Pre-flight checks on user input. A form that fails here never reaches
//! the network.

use chrono::{NaiveDate, NaiveDateTime};
use cinema_shared::protocol::{
    local_datetime, ProgramCreateRequest, ReviewRequest, Screening, ScreeningDraft,
};

use crate::error::ValidationError;

/// Raw text of the create/update screening form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScreeningForm {
    pub title: String,
    pub cast: String,
    pub genres: String,
    pub auditorium: String,
    pub start: String,
    pub duration: String,
    pub end: String,
}

impl ScreeningForm {
    /// Pre-fills the form from an existing screening for an update.
    pub fn from_screening(screening: &Screening) -> Self {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        let time = |value: &Option<NaiveDateTime>| {
            value.as_ref().map(local_datetime::format).unwrap_or_default()
        };
        Self {
            title: text(&screening.film_title),
            cast: text(&screening.film_cast),
            genres: text(&screening.film_genres),
            auditorium: text(&screening.auditorium_name),
            start: time(&screening.start_time),
            duration: screening
                .film_duration_minutes
                .map(|minutes| minutes.to_string())
                .unwrap_or_default(),
            end: time(&screening.end_time),
        }
    }

    pub fn validate(&self) -> Result<ScreeningDraft, ValidationError> {
        let title = required_text("title", &self.title)?;
        let auditorium = required_text("auditorium", &self.auditorium)?;
        let start = required_text("start time", &self.start)?;

        let duration = self.duration.trim();
        let duration = if duration.is_empty() {
            0
        } else {
            duration
                .parse::<i32>()
                .map_err(|_| ValidationError::InvalidDuration(duration.to_string()))?
        };

        let end = self.end.trim();
        if end.is_empty() && duration <= 0 {
            return Err(ValidationError::MissingDurationOrEnd);
        }

        let start_time = parse_datetime("start time", &start)?;
        let end_time = if end.is_empty() {
            None
        } else {
            Some(parse_datetime("end time", end)?)
        };

        Ok(ScreeningDraft {
            film_title: title,
            film_cast: optional_text(&self.cast),
            film_genres: optional_text(&self.genres),
            film_duration_minutes: duration,
            auditorium_name: auditorium,
            start_time,
            end_time,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewForm {
    pub score: String,
    pub comments: String,
}

impl ReviewForm {
    pub fn new(score: impl Into<String>, comments: impl Into<String>) -> Self {
        Self {
            score: score.into(),
            comments: comments.into(),
        }
    }

    pub fn validate(&self) -> Result<ReviewRequest, ValidationError> {
        let raw = self.score.trim();
        let score = raw
            .parse::<f64>()
            .ok()
            .filter(|score| score.is_finite())
            .ok_or_else(|| ValidationError::ScoreNotANumber(raw.to_string()))?;
        if !(0.0..=10.0).contains(&score) {
            return Err(ValidationError::ScoreOutOfRange(score));
        }
        if score.fract() != 0.0 {
            return Err(ValidationError::ScoreNotWhole(score));
        }

        let comments = self.comments.trim();
        if comments.is_empty() {
            return Err(ValidationError::EmptyComments);
        }

        Ok(ReviewRequest {
            score: score as i32,
            comments: comments.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramForm {
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
}

impl ProgramForm {
    pub fn validate(&self) -> Result<ProgramCreateRequest, ValidationError> {
        let name = required_text("name", &self.name)?;
        let description = required_text("description", &self.description)?;
        let start = required_text("start date", &self.start_date)?;
        let end = required_text("end date", &self.end_date)?;

        Ok(ProgramCreateRequest {
            name,
            description,
            start_date: parse_date("start date", &start)?,
            end_date: parse_date("end date", &end)?,
        })
    }
}

/// Trimmed `value`, or `MissingField` when nothing is left.
pub fn required_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}

pub fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

pub fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn parse_datetime(field: &'static str, value: &str) -> Result<NaiveDateTime, ValidationError> {
    local_datetime::parse(value).ok_or_else(|| ValidationError::InvalidDateTime {
        field,
        value: value.to_string(),
    })
}
