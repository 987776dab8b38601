//! Program list, the selected program and its screenings.
//!
//! Every mutation is followed by a refetch of what it touched; nothing is
//! patched locally from a response except the program returned by a state
//! change.

use std::sync::Arc;

use cinema_shared::{
    domain::{ProgramId, ScreeningId},
    protocol::{Program, ProgramSearchRequest, Screening, ScreeningSearchRequest},
};
use tracing::{debug, info};

use crate::{
    error::{ClientError, Result},
    filter::{ScreeningCatalog, ScreeningFilter},
    gating::{self, GateContext, ScreeningAction},
    validation::{self, ProgramForm, ScreeningForm},
    view::{ProgramDetails, ProgramRow, ScreeningRow},
    CinemaBackend,
};

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Advanced(Program),
    /// The program was already `ANNOUNCED`; nothing was sent.
    AlreadyFinal,
}

pub struct ProgramBoard {
    backend: Arc<dyn CinemaBackend>,
    programs: Vec<Program>,
    selected: Option<Program>,
    screenings: ScreeningCatalog,
}

impl ProgramBoard {
    pub fn new(backend: Arc<dyn CinemaBackend>) -> Self {
        Self {
            backend,
            programs: Vec::new(),
            selected: None,
            screenings: ScreeningCatalog::default(),
        }
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn rows(&self) -> Vec<ProgramRow> {
        self.programs.iter().map(ProgramRow::from).collect()
    }

    pub fn selected(&self) -> Option<&Program> {
        self.selected.as_ref()
    }

    pub fn details(&self) -> Option<ProgramDetails> {
        self.selected.as_ref().map(ProgramDetails::from)
    }

    pub fn screenings(&self) -> &ScreeningCatalog {
        &self.screenings
    }

    pub fn screening_rows(&self) -> Vec<ScreeningRow> {
        self.screenings.visible().iter().map(ScreeningRow::from).collect()
    }

    pub async fn load_programs(&mut self) -> Result<&[Program]> {
        self.programs = self.backend.list_programs().await?;
        debug!(count = self.programs.len(), "board: programs loaded");
        Ok(&self.programs)
    }

    pub async fn search_programs(&mut self, name: &str) -> Result<&[Program]> {
        let request = ProgramSearchRequest {
            name: validation::optional_text(name),
        };
        self.programs = self.backend.search_programs(&request).await?;
        Ok(&self.programs)
    }

    /// Loads the program and its screenings.
    pub async fn select_program(&mut self, program_id: ProgramId) -> Result<&Program> {
        let program = self.backend.get_program(program_id).await?;
        self.screenings.reset();
        self.selected = Some(program);
        debug!(program_id = %program_id, "board: program selected");
        self.refresh_screenings().await?;
        self.selected.as_ref().ok_or(ClientError::NotLoaded("program"))
    }

    pub async fn refresh_program(&mut self) -> Result<()> {
        let program_id = self.selected_id()?;
        self.selected = Some(self.backend.get_program(program_id).await?);
        Ok(())
    }

    /// Refetches the screenings of the selected program and re-applies the
    /// active filter. On failure the list is emptied.
    pub async fn refresh_screenings(&mut self) -> Result<()> {
        let program_id = self.selected_id()?;
        match self.backend.list_screenings(program_id).await {
            Ok(screenings) => {
                self.screenings.replace_all(screenings);
                Ok(())
            }
            Err(err) => {
                self.screenings.reset();
                Err(err)
            }
        }
    }

    pub async fn advance(&mut self, program_id: ProgramId) -> Result<AdvanceOutcome> {
        let current = match self.selected.as_ref().filter(|p| p.id == program_id) {
            Some(program) => program.state,
            None => self.backend.get_program(program_id).await?.state,
        };
        let Some(next) = current.next() else {
            return Ok(AdvanceOutcome::AlreadyFinal);
        };
        let caller = self.backend.session_username().await;
        if !gating::can_advance_program(caller.as_deref(), current) {
            return Err(ClientError::NotLoggedIn);
        }

        let program = self.backend.change_program_state(program_id, next).await?;
        info!(program_id = %program_id, from = %current, to = %program.state, "board: program advanced");
        self.selected = Some(program.clone());
        self.load_programs().await?;
        Ok(AdvanceOutcome::Advanced(program))
    }

    pub async fn create_program(&mut self, form: &ProgramForm) -> Result<Program> {
        if self.backend.session_username().await.is_none() {
            return Err(ClientError::NotLoggedIn);
        }
        let request = form.validate()?;
        let program = self.backend.create_program(&request).await?;
        self.load_programs().await?;
        Ok(program)
    }

    pub async fn create_screening(&mut self, form: &ScreeningForm) -> Result<Screening> {
        let program = self.selected.as_ref().ok_or(ClientError::NotLoaded("program"))?;
        let program_id = program.id;
        let caller = self.backend.session_username().await;
        if !gating::can_create_screening(caller.as_deref(), program.state) {
            return Err(ClientError::NotPermitted {
                action: "create screening",
            });
        }
        let draft = form.validate()?;
        let screening = self.backend.create_screening(program_id, &draft).await?;
        self.refresh_screenings().await?;
        Ok(screening)
    }

    pub async fn submit(&mut self, screening_id: ScreeningId) -> Result<()> {
        let program_id = self.check_row_action(ScreeningAction::Submit, screening_id).await?;
        self.backend.submit_screening(program_id, screening_id).await?;
        self.refresh_screenings().await
    }

    pub async fn withdraw(&mut self, screening_id: ScreeningId) -> Result<()> {
        let program_id = self.check_row_action(ScreeningAction::Withdraw, screening_id).await?;
        self.backend.withdraw_screening(program_id, screening_id).await?;
        self.refresh_screenings().await
    }

    pub async fn add_staff(&mut self, username: &str) -> Result<()> {
        let username = validation::required_text("username", username)?;
        let program_id = self.selected_id()?;
        self.backend.add_staff(program_id, &username).await?;
        self.refresh_program().await
    }

    pub async fn add_programmer(&mut self, username: &str) -> Result<()> {
        let username = validation::required_text("username", username)?;
        let program_id = self.selected_id()?;
        self.backend.add_programmer(program_id, &username).await?;
        self.refresh_program().await
    }

    /// Server-side search within the selected program. The local catalog
    /// is left untouched.
    pub async fn search_screenings(
        &self,
        request: &ScreeningSearchRequest,
    ) -> Result<Vec<Screening>> {
        let program_id = self.selected_id()?;
        self.backend.search_screenings(program_id, request).await
    }

    pub fn apply_filter(&mut self, filter: ScreeningFilter) -> &[Screening] {
        self.screenings.apply(filter);
        self.screenings.visible()
    }

    pub fn clear_filter(&mut self) -> &[Screening] {
        self.screenings.clear();
        self.screenings.visible()
    }

    pub async fn my_assigned(&self) -> Vec<Screening> {
        match self.backend.session_username().await {
            Some(caller) => self.screenings.assigned_to(&caller),
            None => Vec::new(),
        }
    }

    fn selected_id(&self) -> Result<ProgramId> {
        self.selected
            .as_ref()
            .map(|program| program.id)
            .ok_or(ClientError::NotLoaded("program"))
    }

    async fn check_row_action(
        &self,
        action: ScreeningAction,
        screening_id: ScreeningId,
    ) -> Result<ProgramId> {
        let program = self.selected.as_ref().ok_or(ClientError::NotLoaded("program"))?;
        let screening = self
            .screenings
            .all()
            .iter()
            .find(|screening| screening.id == screening_id)
            .ok_or(ClientError::NotLoaded("screening"))?;
        let caller = self.backend.session_username().await;
        let ctx = GateContext::new(caller.as_deref(), program, screening);
        if !gating::is_permitted(action, &ctx) {
            return Err(ClientError::NotPermitted {
                action: action.label(),
            });
        }
        Ok(program.id)
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
