use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{ProgramId, ProgramState, ScreeningId, ScreeningState};

/// Local date-times as the backend writes them (`2025-05-01T18:00:00`).
/// Seconds and fractions are optional on input; output always has seconds.
pub mod local_datetime {
    use chrono::NaiveDateTime;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    const ACCEPTED_FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        ACCEPTED_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    }

    pub fn format(value: &NaiveDateTime) -> String {
        value.format(WIRE_FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid local date-time '{raw}'")))
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<NaiveDateTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.serialize_some(&super::format(value)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveDateTime>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                None => Ok(None),
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid local date-time '{raw}'"))),
            }
        }
    }
}

/// A program as returned by the backend. The list endpoints return a public
/// shape without creator and counts, so only id, name and state are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub state: ProgramState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_username: Option<String>,
    #[serde(
        default,
        with = "local_datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programmers_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenings_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub programmer_usernames: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_usernames: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screening {
    pub id: ScreeningId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<ProgramId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_cast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_genres: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_duration_minutes: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auditorium_name: Option<String>,
    #[serde(
        default,
        with = "local_datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveDateTime>,
    #[serde(
        default,
        with = "local_datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<NaiveDateTime>,
    pub state: ScreeningState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_comments: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub final_submitted: bool,
}

/// Body of `POST /programs`. The backend expects exactly these four fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramCreateRequest {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramSearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of screening create and update calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningDraft {
    pub film_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_cast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_genres: Option<String>,
    pub film_duration_minutes: i32,
    pub auditorium_name: String,
    #[serde(with = "local_datetime")]
    pub start_time: NaiveDateTime,
    #[serde(default, with = "local_datetime::option")]
    pub end_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningSearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub film_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub score: i32,
    pub comments: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_details_shape() {
        let program: Program = serde_json::from_value(json!({
            "id": 3,
            "name": "Spring Festival",
            "description": "Indie films",
            "startDate": "2025-04-01",
            "endDate": "2025-04-30",
            "state": "SUBMISSION",
            "creationDate": "2025-03-01T09:30:00",
            "creatorUsername": "prog1",
            "programmerUsernames": ["prog1"],
            "staffUsernames": null,
            "programmersCount": 1,
            "staffCount": 0,
            "screeningsCount": 2
        }))
        .expect("program");

        assert_eq!(program.id, ProgramId(3));
        assert_eq!(program.state, ProgramState::Submission);
        assert_eq!(
            program.start_date,
            NaiveDate::from_ymd_opt(2025, 4, 1)
        );
        assert_eq!(program.staff_usernames, None);
        assert_eq!(program.screenings_count, Some(2));
    }

    #[test]
    fn reads_public_screening_shape_with_minute_precision() {
        let screening: Screening = serde_json::from_value(json!({
            "id": 9,
            "programId": 3,
            "filmTitle": "Stalker",
            "filmGenres": "Drama",
            "auditoriumName": "Hall 1",
            "startTime": "2025-04-02T20:00",
            "endTime": null,
            "state": "SCHEDULED"
        }))
        .expect("screening");

        assert_eq!(screening.state, ScreeningState::Scheduled);
        assert_eq!(
            screening.start_time.map(|t| local_datetime::format(&t)),
            Some("2025-04-02T20:00:00".to_string())
        );
        assert_eq!(screening.end_time, None);
        assert!(screening.submitter_username.is_none());
        assert!(!screening.final_submitted);
    }

    #[test]
    fn empty_search_is_an_empty_object() {
        let body = serde_json::to_value(ProgramSearchRequest::default()).expect("serialize");
        assert_eq!(body, json!({}));
    }

    #[test]
    fn draft_sends_null_end_and_seconds() {
        let draft = ScreeningDraft {
            film_title: "Ran".into(),
            film_cast: None,
            film_genres: Some("War".into()),
            film_duration_minutes: 162,
            auditorium_name: "Hall 2".into(),
            start_time: local_datetime::parse("2025-04-03T18:30").expect("start"),
            end_time: None,
        };
        let body = serde_json::to_value(&draft).expect("serialize");
        assert_eq!(
            body,
            json!({
                "filmTitle": "Ran",
                "filmGenres": "War",
                "filmDurationMinutes": 162,
                "auditoriumName": "Hall 2",
                "startTime": "2025-04-03T18:30:00",
                "endTime": null
            })
        );
    }
}
