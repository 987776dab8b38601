//! In-memory backend for the view tests. Every endpoint call is recorded so
//! tests can assert that refused or invalid actions never reach it.

use std::sync::Mutex;

use async_trait::async_trait;
use cinema_shared::{
    domain::{ProgramId, ProgramState, ScreeningId, ScreeningState},
    error::ErrorCode,
    protocol::{
        Program, ProgramCreateRequest, ProgramSearchRequest, ReviewRequest, Screening,
        ScreeningDraft, ScreeningSearchRequest,
    },
};

use crate::{error::Result, CinemaBackend, ClientError};

#[derive(Default)]
pub struct FakeState {
    pub username: Option<String>,
    pub programs: Vec<Program>,
    pub screenings: Vec<Screening>,
    pub calls: Vec<String>,
}

#[derive(Default)]
pub struct RecordingBackend {
    pub state: Mutex<FakeState>,
}

impl RecordingBackend {
    pub fn new(username: Option<&str>, programs: Vec<Program>, screenings: Vec<Screening>) -> Self {
        Self {
            state: Mutex::new(FakeState {
                username: username.map(Into::into),
                programs,
                screenings,
                calls: Vec::new(),
            }),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().expect("lock").calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().expect("lock").calls.clear();
    }

    pub fn set_user(&self, username: Option<&str>) {
        self.state.lock().expect("lock").username = username.map(Into::into);
    }

    fn record(&self, call: impl Into<String>) -> std::sync::MutexGuard<'_, FakeState> {
        let mut state = self.state.lock().expect("lock");
        state.calls.push(call.into());
        state
    }

    fn with_screening<T>(
        &self,
        call: String,
        screening_id: ScreeningId,
        apply: impl FnOnce(&mut Screening) -> T,
    ) -> Result<T> {
        let mut state = self.record(call);
        let screening = state
            .screenings
            .iter_mut()
            .find(|s| s.id == screening_id)
            .ok_or_else(not_found)?;
        Ok(apply(screening))
    }
}

pub fn not_found() -> ClientError {
    ClientError::Http {
        status: 404,
        code: ErrorCode::NotFound,
        message: "Not found".into(),
        detail: None,
    }
}

pub fn program(id: i64, state: ProgramState) -> Program {
    Program {
        id: ProgramId(id),
        name: format!("Program {id}"),
        description: Some("Festival".into()),
        start_date: None,
        end_date: None,
        state,
        creator_username: Some("prog1".into()),
        creation_date: None,
        programmers_count: Some(1),
        staff_count: None,
        screenings_count: None,
        programmer_usernames: None,
        staff_usernames: None,
    }
}

pub fn screening(
    id: i64,
    program_id: i64,
    state: ScreeningState,
    submitter: Option<&str>,
    handler: Option<&str>,
) -> Screening {
    Screening {
        id: ScreeningId(id),
        program_id: Some(ProgramId(program_id)),
        film_title: Some(format!("Film {id}")),
        film_cast: None,
        film_genres: Some("Drama".into()),
        film_duration_minutes: Some(100),
        auditorium_name: Some("Hall 1".into()),
        start_time: None,
        end_time: None,
        state,
        submitter_username: submitter.map(Into::into),
        handler_username: handler.map(Into::into),
        review_score: None,
        review_comments: None,
        approval_notes: None,
        rejection_reason: None,
        final_submitted: false,
    }
}

#[async_trait]
impl CinemaBackend for RecordingBackend {
    async fn login(&self, username: &str, _password: &str) -> Result<()> {
        self.record(format!("login {username}")).username = Some(username.to_string());
        Ok(())
    }

    async fn logout(&self) {
        self.state.lock().expect("lock").username = None;
    }

    async fn session_username(&self) -> Option<String> {
        self.state.lock().expect("lock").username.clone()
    }

    async fn list_programs(&self) -> Result<Vec<Program>> {
        Ok(self.record("list_programs").programs.clone())
    }

    async fn get_program(&self, program_id: ProgramId) -> Result<Program> {
        self.record(format!("get_program {program_id}"))
            .programs
            .iter()
            .find(|p| p.id == program_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn search_programs(&self, request: &ProgramSearchRequest) -> Result<Vec<Program>> {
        let state = self.record(format!("search_programs {:?}", request.name));
        Ok(state
            .programs
            .iter()
            .filter(|p| request.name.as_deref().map_or(true, |name| p.name.contains(name)))
            .cloned()
            .collect())
    }

    async fn create_program(&self, request: &ProgramCreateRequest) -> Result<Program> {
        let mut state = self.record(format!("create_program {}", request.name));
        let mut created = program(state.programs.len() as i64 + 1, ProgramState::Created);
        created.name = request.name.clone();
        created.description = Some(request.description.clone());
        created.start_date = Some(request.start_date);
        created.end_date = Some(request.end_date);
        state.programs.push(created.clone());
        Ok(created)
    }

    async fn change_program_state(
        &self,
        program_id: ProgramId,
        new_state: ProgramState,
    ) -> Result<Program> {
        let mut state = self.record(format!("change_program_state {program_id} {new_state}"));
        let program = state
            .programs
            .iter_mut()
            .find(|p| p.id == program_id)
            .ok_or_else(not_found)?;
        program.state = new_state;
        Ok(program.clone())
    }

    async fn add_staff(&self, program_id: ProgramId, username: &str) -> Result<()> {
        let mut state = self.record(format!("add_staff {program_id} {username}"));
        if let Some(program) = state.programs.iter_mut().find(|p| p.id == program_id) {
            program.staff_count = Some(program.staff_count.unwrap_or(0) + 1);
        }
        Ok(())
    }

    async fn add_programmer(&self, program_id: ProgramId, username: &str) -> Result<()> {
        drop(self.record(format!("add_programmer {program_id} {username}")));
        Ok(())
    }

    async fn list_screenings(&self, program_id: ProgramId) -> Result<Vec<Screening>> {
        Ok(self
            .record(format!("list_screenings {program_id}"))
            .screenings
            .iter()
            .filter(|s| s.program_id == Some(program_id))
            .cloned()
            .collect())
    }

    async fn get_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<Screening> {
        self.record(format!("get_screening {program_id} {screening_id}"))
            .screenings
            .iter()
            .find(|s| s.id == screening_id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn search_screenings(
        &self,
        program_id: ProgramId,
        _request: &ScreeningSearchRequest,
    ) -> Result<Vec<Screening>> {
        self.list_screenings(program_id).await
    }

    async fn create_screening(
        &self,
        program_id: ProgramId,
        draft: &ScreeningDraft,
    ) -> Result<Screening> {
        let mut state = self.record(format!("create_screening {program_id}"));
        let submitter = state.username.clone();
        let mut created = screening(
            state.screenings.len() as i64 + 100,
            program_id.0,
            ScreeningState::Created,
            submitter.as_deref(),
            None,
        );
        created.film_title = Some(draft.film_title.clone());
        created.start_time = Some(draft.start_time);
        state.screenings.push(created.clone());
        Ok(created)
    }

    async fn update_screening(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
        draft: &ScreeningDraft,
    ) -> Result<()> {
        self.with_screening(format!("update_screening {screening_id}"), screening_id, |s| {
            s.film_title = Some(draft.film_title.clone());
        })
    }

    async fn withdraw_screening(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()> {
        let mut state = self.record(format!("withdraw_screening {screening_id}"));
        state.screenings.retain(|s| s.id != screening_id);
        Ok(())
    }

    async fn submit_screening(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()> {
        self.with_screening(format!("submit_screening {screening_id}"), screening_id, |s| {
            s.state = ScreeningState::Submitted;
        })
    }

    async fn assign_handler(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
        username: &str,
    ) -> Result<()> {
        self.with_screening(
            format!("assign_handler {screening_id} {username}"),
            screening_id,
            |s| s.handler_username = Some(username.to_string()),
        )
    }

    async fn review_screening(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
        review: &ReviewRequest,
    ) -> Result<()> {
        self.with_screening(
            format!("review_screening {screening_id} {}", review.score),
            screening_id,
            |s| {
                s.state = ScreeningState::Reviewed;
                s.review_score = Some(review.score);
                s.review_comments = Some(review.comments.clone());
            },
        )
    }

    async fn approve_screening(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
        notes: Option<&str>,
    ) -> Result<()> {
        self.with_screening(
            format!("approve_screening {screening_id} {notes:?}"),
            screening_id,
            |s| {
                s.state = ScreeningState::Approved;
                s.approval_notes = notes.map(Into::into);
            },
        )
    }

    async fn reject_screening(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
        reason: &str,
    ) -> Result<()> {
        self.with_screening(
            format!("reject_screening {screening_id} {reason}"),
            screening_id,
            |s| {
                s.state = ScreeningState::Rejected;
                s.rejection_reason = Some(reason.to_string());
            },
        )
    }

    async fn final_submit_screening(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()> {
        self.with_screening(
            format!("final_submit_screening {screening_id}"),
            screening_id,
            |s| s.final_submitted = true,
        )
    }

    async fn accept_screening(
        &self,
        _program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()> {
        self.with_screening(format!("accept_screening {screening_id}"), screening_id, |s| {
            s.state = ScreeningState::Scheduled;
        })
    }
}
