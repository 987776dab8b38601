//! A single screening inside its program, and the workflow actions on it.

use std::sync::Arc;

use cinema_shared::{
    domain::{ProgramId, ScreeningId},
    protocol::{Program, Screening},
};
use tracing::debug;

use crate::{
    error::{ClientError, Result},
    gating::{self, GateContext, ScreeningAction},
    validation::{self, ReviewForm, ScreeningForm},
    view::ScreeningDetails,
    CinemaBackend,
};

pub struct ScreeningDesk {
    backend: Arc<dyn CinemaBackend>,
    program: Option<Program>,
    screening: Option<Screening>,
}

impl ScreeningDesk {
    pub fn new(backend: Arc<dyn CinemaBackend>) -> Self {
        Self {
            backend,
            program: None,
            screening: None,
        }
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn screening(&self) -> Option<&Screening> {
        self.screening.as_ref()
    }

    /// Fetches the program first since gating depends on its state.
    pub async fn load(&mut self, program_id: ProgramId, screening_id: ScreeningId) -> Result<()> {
        let program = self.backend.get_program(program_id).await?;
        let screening = self.backend.get_screening(program_id, screening_id).await?;
        debug!(
            program_id = %program_id,
            screening_id = %screening_id,
            state = %screening.state,
            "desk: screening loaded"
        );
        self.program = Some(program);
        self.screening = Some(screening);
        Ok(())
    }

    pub async fn reload(&mut self) -> Result<()> {
        let (program_id, screening_id) = self.ids()?;
        self.load(program_id, screening_id).await
    }

    pub async fn details(&self) -> Result<ScreeningDetails> {
        let (program, screening) = self.loaded()?;
        let caller = self.backend.session_username().await;
        Ok(ScreeningDetails::new(caller.as_deref(), program, screening))
    }

    pub async fn permitted_actions(&self) -> Result<Vec<ScreeningAction>> {
        let (program, screening) = self.loaded()?;
        let caller = self.backend.session_username().await;
        Ok(gating::permitted_actions(&GateContext::new(
            caller.as_deref(),
            program,
            screening,
        )))
    }

    pub async fn submit(&mut self) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::Submit).await?;
        self.backend.submit_screening(pid, sid).await?;
        self.reload().await
    }

    /// The screening no longer exists afterwards, so nothing is refetched.
    pub async fn withdraw(&mut self) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::Withdraw).await?;
        self.backend.withdraw_screening(pid, sid).await?;
        self.screening = None;
        Ok(())
    }

    pub async fn update(&mut self, form: &ScreeningForm) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::Update).await?;
        let draft = form.validate()?;
        self.backend.update_screening(pid, sid, &draft).await?;
        self.reload().await
    }

    pub async fn assign_handler(&mut self, username: &str) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::AssignHandler).await?;
        let username = validation::required_text("handler username", username)?;
        self.backend.assign_handler(pid, sid, &username).await?;
        self.reload().await
    }

    pub async fn review(&mut self, form: &ReviewForm) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::Review).await?;
        let review = form.validate()?;
        self.backend.review_screening(pid, sid, &review).await?;
        self.reload().await
    }

    /// Blank notes are left out of the request.
    pub async fn approve(&mut self, notes: &str) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::Approve).await?;
        let notes = validation::optional_text(notes);
        self.backend.approve_screening(pid, sid, notes.as_deref()).await?;
        self.reload().await
    }

    pub async fn reject(&mut self, reason: &str) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::Reject).await?;
        let reason = validation::required_text("rejection reason", reason)?;
        self.backend.reject_screening(pid, sid, &reason).await?;
        self.reload().await
    }

    pub async fn final_submit(&mut self) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::FinalSubmit).await?;
        self.backend.final_submit_screening(pid, sid).await?;
        self.reload().await
    }

    pub async fn accept(&mut self) -> Result<()> {
        let (pid, sid) = self.check(ScreeningAction::Accept).await?;
        self.backend.accept_screening(pid, sid).await?;
        self.reload().await
    }

    fn loaded(&self) -> Result<(&Program, &Screening)> {
        let program = self.program.as_ref().ok_or(ClientError::NotLoaded("program"))?;
        let screening = self
            .screening
            .as_ref()
            .ok_or(ClientError::NotLoaded("screening"))?;
        Ok((program, screening))
    }

    fn ids(&self) -> Result<(ProgramId, ScreeningId)> {
        let (program, screening) = self.loaded()?;
        Ok((program.id, screening.id))
    }

    async fn check(&self, action: ScreeningAction) -> Result<(ProgramId, ScreeningId)> {
        let (program, screening) = self.loaded()?;
        let caller = self.backend.session_username().await;
        let ctx = GateContext::new(caller.as_deref(), program, screening);
        if !gating::is_permitted(action, &ctx) {
            debug!(action = action.label(), "desk: action refused locally");
            return Err(ClientError::NotPermitted {
                action: action.label(),
            });
        }
        Ok((program.id, screening.id))
    }
}

#[cfg(test)]
#[path = "tests/desk_tests.rs"]
mod tests;
