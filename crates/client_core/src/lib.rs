use std::time::Duration;

use async_trait::async_trait;
use cinema_shared::{
    domain::{ProgramId, ProgramState, ScreeningId},
    protocol::{
        Program, ProgramCreateRequest, ProgramSearchRequest, ReviewRequest, Screening,
        ScreeningDraft, ScreeningSearchRequest,
    },
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub mod board;
pub mod desk;
pub mod error;
pub mod filter;
pub mod gating;
pub mod session;
pub mod transport;
pub mod validation;
pub mod view;

pub use board::{AdvanceOutcome, ProgramBoard};
pub use desk::ScreeningDesk;
pub use error::{ClientError, Result, ValidationError};
pub use session::{BasicCredential, Session, SessionFile, SessionFileError};

use transport::{ApiRequest, ApiResponse, Transport};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Every backend call the views make. `CinemaClient` is the HTTP
/// implementation; tests substitute an in-memory one.
#[async_trait]
pub trait CinemaBackend: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<()>;
    async fn logout(&self);
    async fn session_username(&self) -> Option<String>;

    async fn list_programs(&self) -> Result<Vec<Program>>;
    async fn get_program(&self, program_id: ProgramId) -> Result<Program>;
    async fn search_programs(&self, request: &ProgramSearchRequest) -> Result<Vec<Program>>;
    async fn create_program(&self, request: &ProgramCreateRequest) -> Result<Program>;
    async fn change_program_state(
        &self,
        program_id: ProgramId,
        new_state: ProgramState,
    ) -> Result<Program>;
    async fn add_staff(&self, program_id: ProgramId, username: &str) -> Result<()>;
    async fn add_programmer(&self, program_id: ProgramId, username: &str) -> Result<()>;

    async fn list_screenings(&self, program_id: ProgramId) -> Result<Vec<Screening>>;
    async fn get_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<Screening>;
    async fn search_screenings(
        &self,
        program_id: ProgramId,
        request: &ScreeningSearchRequest,
    ) -> Result<Vec<Screening>>;
    async fn create_screening(
        &self,
        program_id: ProgramId,
        draft: &ScreeningDraft,
    ) -> Result<Screening>;
    async fn update_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        draft: &ScreeningDraft,
    ) -> Result<()>;
    async fn withdraw_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()>;
    async fn submit_screening(&self, program_id: ProgramId, screening_id: ScreeningId)
        -> Result<()>;
    async fn assign_handler(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        username: &str,
    ) -> Result<()>;
    async fn review_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        review: &ReviewRequest,
    ) -> Result<()>;
    async fn approve_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        notes: Option<&str>,
    ) -> Result<()>;
    async fn reject_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        reason: &str,
    ) -> Result<()>;
    async fn final_submit_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()>;
    async fn accept_screening(&self, program_id: ProgramId, screening_id: ScreeningId)
        -> Result<()>;
}

#[derive(Debug, Default)]
struct ClientState {
    session: Option<Session>,
}

pub struct CinemaClient {
    transport: Transport,
    inner: Mutex<ClientState>,
}

impl CinemaClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(base_url, timeout)?,
            inner: Mutex::new(ClientState::default()),
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url().as_str()
    }

    /// Adopts a session saved by an earlier run without probing it.
    pub async fn restore_session(&self, session: Session) {
        info!(username = %session.username, "session: restored");
        self.inner.lock().await.session = Some(session);
    }

    pub async fn session(&self) -> Option<Session> {
        self.inner.lock().await.session.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.lock().await.session.is_some()
    }

    async fn call(&self, request: ApiRequest<'_>) -> Result<ApiResponse> {
        let credential = self
            .inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|session| session.credential.clone());
        self.transport.send(request, credential.as_ref()).await
    }
}

fn body<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

#[async_trait]
impl CinemaBackend for CinemaClient {
    /// The credential is only kept if an authenticated program search
    /// succeeds with it. A failed attempt also drops any earlier session.
    async fn login(&self, username: &str, password: &str) -> Result<()> {
        let username = validation::required_text("username", username)?;
        if password.is_empty() {
            return Err(ValidationError::MissingField("password").into());
        }
        let session = Session::new(username, password);

        let probe = self
            .transport
            .send(
                ApiRequest::post(&["programs", "search"]).json(body(&ProgramSearchRequest::default())?),
                Some(&session.credential),
            )
            .await;

        let mut guard = self.inner.lock().await;
        match probe {
            Ok(_) => {
                info!(username = %session.username, "session: logged in");
                guard.session = Some(session);
                Ok(())
            }
            Err(err) => {
                warn!(username = %session.username, error = %err, "session: login rejected");
                guard.session = None;
                Err(err)
            }
        }
    }

    async fn logout(&self) {
        if let Some(session) = self.inner.lock().await.session.take() {
            info!(username = %session.username, "session: logged out");
        }
    }

    async fn session_username(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .map(|session| session.username.clone())
    }

    async fn list_programs(&self) -> Result<Vec<Program>> {
        self.call(ApiRequest::get(&["programs"]))
            .await?
            .into_json("program list")
    }

    async fn get_program(&self, program_id: ProgramId) -> Result<Program> {
        let pid = program_id.to_string();
        self.call(ApiRequest::get(&["programs", pid.as_str()]))
            .await?
            .into_json("program")
    }

    async fn search_programs(&self, request: &ProgramSearchRequest) -> Result<Vec<Program>> {
        self.call(ApiRequest::post(&["programs", "search"]).json(body(request)?))
            .await?
            .into_json("program search")
    }

    async fn create_program(&self, request: &ProgramCreateRequest) -> Result<Program> {
        let program: Program = self
            .call(ApiRequest::post(&["programs"]).json(body(request)?))
            .await?
            .into_json("created program")?;
        info!(program_id = %program.id, name = %program.name, "program: created");
        Ok(program)
    }

    async fn change_program_state(
        &self,
        program_id: ProgramId,
        new_state: ProgramState,
    ) -> Result<Program> {
        let pid = program_id.to_string();
        let program: Program = self
            .call(
                ApiRequest::post(&["programs", pid.as_str(), "state"])
                    .query(&[("newState", Some(new_state.as_str()))]),
            )
            .await?
            .into_json("program state change")?;
        info!(program_id = %program.id, state = %program.state, "program: state changed");
        Ok(program)
    }

    async fn add_staff(&self, program_id: ProgramId, username: &str) -> Result<()> {
        let pid = program_id.to_string();
        self.call(ApiRequest::post(&["programs", pid.as_str(), "staff", username]))
            .await?;
        info!(program_id = %program_id, username, "program: staff added");
        Ok(())
    }

    async fn add_programmer(&self, program_id: ProgramId, username: &str) -> Result<()> {
        let pid = program_id.to_string();
        self.call(ApiRequest::post(&["programs", pid.as_str(), "programmers", username]))
            .await?;
        info!(program_id = %program_id, username, "program: programmer added");
        Ok(())
    }

    async fn list_screenings(&self, program_id: ProgramId) -> Result<Vec<Screening>> {
        let pid = program_id.to_string();
        self.call(ApiRequest::get(&["programs", pid.as_str(), "screenings"]))
            .await?
            .into_json("screening list")
    }

    async fn get_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<Screening> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(ApiRequest::get(&["programs", pid.as_str(), "screenings", sid.as_str()]))
            .await?
            .into_json("screening")
    }

    async fn search_screenings(
        &self,
        program_id: ProgramId,
        request: &ScreeningSearchRequest,
    ) -> Result<Vec<Screening>> {
        let pid = program_id.to_string();
        self.call(
            ApiRequest::post(&["programs", pid.as_str(), "screenings", "search"])
                .json(body(request)?),
        )
        .await?
        .into_json("screening search")
    }

    async fn create_screening(
        &self,
        program_id: ProgramId,
        draft: &ScreeningDraft,
    ) -> Result<Screening> {
        let pid = program_id.to_string();
        let screening: Screening = self
            .call(ApiRequest::post(&["programs", pid.as_str(), "screenings"]).json(body(draft)?))
            .await?
            .into_json("created screening")?;
        info!(program_id = %program_id, screening_id = %screening.id, "screening: created");
        Ok(screening)
    }

    async fn update_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        draft: &ScreeningDraft,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(
            ApiRequest::put(&["programs", pid.as_str(), "screenings", sid.as_str()])
                .json(body(draft)?),
        )
        .await?;
        info!(program_id = %program_id, screening_id = %screening_id, "screening: updated");
        Ok(())
    }

    async fn withdraw_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(ApiRequest::delete(&["programs", pid.as_str(), "screenings", sid.as_str()]))
            .await?;
        info!(program_id = %program_id, screening_id = %screening_id, "screening: withdrawn");
        Ok(())
    }

    async fn submit_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(ApiRequest::post(&[
            "programs",
            pid.as_str(),
            "screenings",
            sid.as_str(),
            "submit",
        ]))
        .await?;
        info!(program_id = %program_id, screening_id = %screening_id, "screening: submitted");
        Ok(())
    }

    async fn assign_handler(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        username: &str,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(
            ApiRequest::post(&[
                "programs",
                pid.as_str(),
                "screenings",
                sid.as_str(),
                "assign-handler",
            ])
            .query(&[("username", Some(username))]),
        )
        .await?;
        info!(
            program_id = %program_id,
            screening_id = %screening_id,
            handler = username,
            "screening: handler assigned"
        );
        Ok(())
    }

    async fn review_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        review: &ReviewRequest,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(
            ApiRequest::post(&[
                "programs",
                pid.as_str(),
                "screenings",
                sid.as_str(),
                "review",
            ])
            .json(body(review)?),
        )
        .await?;
        info!(
            program_id = %program_id,
            screening_id = %screening_id,
            score = review.score,
            "screening: reviewed"
        );
        Ok(())
    }

    async fn approve_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        notes: Option<&str>,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(
            ApiRequest::post(&[
                "programs",
                pid.as_str(),
                "screenings",
                sid.as_str(),
                "approve",
            ])
            .query(&[("notes", notes)]),
        )
        .await?;
        info!(program_id = %program_id, screening_id = %screening_id, "screening: approved");
        Ok(())
    }

    async fn reject_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
        reason: &str,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(
            ApiRequest::post(&[
                "programs",
                pid.as_str(),
                "screenings",
                sid.as_str(),
                "reject",
            ])
            .query(&[("reason", Some(reason))]),
        )
        .await?;
        info!(program_id = %program_id, screening_id = %screening_id, "screening: rejected");
        Ok(())
    }

    async fn final_submit_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(ApiRequest::post(&[
            "programs",
            pid.as_str(),
            "screenings",
            sid.as_str(),
            "final-submit",
        ]))
        .await?;
        info!(program_id = %program_id, screening_id = %screening_id, "screening: final submitted");
        Ok(())
    }

    async fn accept_screening(
        &self,
        program_id: ProgramId,
        screening_id: ScreeningId,
    ) -> Result<()> {
        let pid = program_id.to_string();
        let sid = screening_id.to_string();
        self.call(ApiRequest::post(&[
            "programs",
            pid.as_str(),
            "screenings",
            sid.as_str(),
            "accept",
        ]))
        .await?;
        info!(program_id = %program_id, screening_id = %screening_id, "screening: accepted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
