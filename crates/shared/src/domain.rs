use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(ProgramId);
id_newtype!(ScreeningId);

/// Lifecycle of a program. The order of the variants is the order of the
/// lifecycle; a program only ever moves to the next variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramState {
    Created,
    Submission,
    Assignment,
    Review,
    Scheduling,
    FinalPublication,
    Decision,
    Announced,
}

impl ProgramState {
    pub const ALL: [ProgramState; 8] = [
        ProgramState::Created,
        ProgramState::Submission,
        ProgramState::Assignment,
        ProgramState::Review,
        ProgramState::Scheduling,
        ProgramState::FinalPublication,
        ProgramState::Decision,
        ProgramState::Announced,
    ];

    /// The unique successor, or `None` once the program is announced.
    pub const fn next(self) -> Option<ProgramState> {
        match self {
            ProgramState::Created => Some(ProgramState::Submission),
            ProgramState::Submission => Some(ProgramState::Assignment),
            ProgramState::Assignment => Some(ProgramState::Review),
            ProgramState::Review => Some(ProgramState::Scheduling),
            ProgramState::Scheduling => Some(ProgramState::FinalPublication),
            ProgramState::FinalPublication => Some(ProgramState::Decision),
            ProgramState::Decision => Some(ProgramState::Announced),
            ProgramState::Announced => None,
        }
    }

    pub const fn is_final(self) -> bool {
        self.next().is_none()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ProgramState::Created => "CREATED",
            ProgramState::Submission => "SUBMISSION",
            ProgramState::Assignment => "ASSIGNMENT",
            ProgramState::Review => "REVIEW",
            ProgramState::Scheduling => "SCHEDULING",
            ProgramState::FinalPublication => "FINAL_PUBLICATION",
            ProgramState::Decision => "DECISION",
            ProgramState::Announced => "ANNOUNCED",
        }
    }
}

impl fmt::Display for ProgramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProgramState(pub String);

impl fmt::Display for UnknownProgramState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown program state '{}'", self.0)
    }
}

impl std::error::Error for UnknownProgramState {}

impl FromStr for ProgramState {
    type Err = UnknownProgramState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ProgramState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownProgramState(s.to_string()))
    }
}

/// Screening states as reported by the backend. The backend owns the
/// transitions; anything it sends that is not listed here is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScreeningState {
    Created,
    Submitted,
    Reviewed,
    Approved,
    Scheduled,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl ScreeningState {
    pub const fn as_str(self) -> &'static str {
        match self {
            ScreeningState::Created => "CREATED",
            ScreeningState::Submitted => "SUBMITTED",
            ScreeningState::Reviewed => "REVIEWED",
            ScreeningState::Approved => "APPROVED",
            ScreeningState::Scheduled => "SCHEDULED",
            ScreeningState::Rejected => "REJECTED",
            ScreeningState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ScreeningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
