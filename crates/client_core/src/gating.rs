//! Which workflow actions the current user may request.
//!
//! Gating is advisory. It keeps the client from issuing requests that are
//! certain to fail, but the backend decides; every gated call still has to
//! handle a rejection when another actor changed state in the meantime.

use std::fmt;

use cinema_shared::{
    domain::{ProgramState, ScreeningState},
    protocol::{Program, Screening},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreeningAction {
    Submit,
    Withdraw,
    Update,
    AssignHandler,
    Review,
    Approve,
    Reject,
    FinalSubmit,
    Accept,
}

impl ScreeningAction {
    pub const ALL: [ScreeningAction; 9] = [
        ScreeningAction::Submit,
        ScreeningAction::Withdraw,
        ScreeningAction::Update,
        ScreeningAction::AssignHandler,
        ScreeningAction::Review,
        ScreeningAction::Approve,
        ScreeningAction::Reject,
        ScreeningAction::FinalSubmit,
        ScreeningAction::Accept,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ScreeningAction::Submit => "submit",
            ScreeningAction::Withdraw => "withdraw",
            ScreeningAction::Update => "update",
            ScreeningAction::AssignHandler => "assign handler",
            ScreeningAction::Review => "review",
            ScreeningAction::Approve => "approve",
            ScreeningAction::Reject => "reject",
            ScreeningAction::FinalSubmit => "final submit",
            ScreeningAction::Accept => "accept",
        }
    }
}

impl fmt::Display for ScreeningAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Allowed,
    Denied,
}

impl Capability {
    pub const fn from_bool(allowed: bool) -> Self {
        if allowed {
            Capability::Allowed
        } else {
            Capability::Denied
        }
    }

    pub const fn is_allowed(self) -> bool {
        matches!(self, Capability::Allowed)
    }
}

/// Who has to be calling, on top of being logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Submitter,
    Handler,
    // No ownership check: assign-handler, reject and accept are open to any
    // logged-in user here even though the backend restricts them to the
    // program's programmers.
    AnyUser,
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    program: &'static [ProgramState],
    /// `None` accepts every screening state.
    screening: Option<&'static [ScreeningState]>,
    relation: Relation,
}

const fn rule_for(action: ScreeningAction) -> Rule {
    use ProgramState as P;
    use ScreeningState as S;

    match action {
        ScreeningAction::Submit | ScreeningAction::Withdraw | ScreeningAction::Update => Rule {
            program: &[P::Submission],
            screening: Some(&[S::Created]),
            relation: Relation::Submitter,
        },
        ScreeningAction::AssignHandler => Rule {
            program: &[P::Assignment],
            screening: Some(&[S::Submitted]),
            relation: Relation::AnyUser,
        },
        ScreeningAction::Review => Rule {
            program: &[P::Review],
            screening: Some(&[S::Submitted, S::Reviewed]),
            relation: Relation::Handler,
        },
        ScreeningAction::Approve => Rule {
            program: &[P::Scheduling],
            screening: Some(&[S::Reviewed]),
            relation: Relation::Submitter,
        },
        ScreeningAction::Reject => Rule {
            program: &[P::Scheduling, P::Decision],
            screening: None,
            relation: Relation::AnyUser,
        },
        ScreeningAction::FinalSubmit => Rule {
            program: &[P::FinalPublication],
            screening: Some(&[S::Approved]),
            relation: Relation::Submitter,
        },
        ScreeningAction::Accept => Rule {
            program: &[P::Decision],
            screening: Some(&[S::Approved]),
            relation: Relation::AnyUser,
        },
    }
}

/// Everything the gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateContext<'a> {
    pub caller: Option<&'a str>,
    pub program_state: ProgramState,
    pub screening_state: ScreeningState,
    pub submitter: Option<&'a str>,
    pub handler: Option<&'a str>,
}

impl<'a> GateContext<'a> {
    pub fn new(caller: Option<&'a str>, program: &'a Program, screening: &'a Screening) -> Self {
        Self {
            caller,
            program_state: program.state,
            screening_state: screening.state,
            submitter: screening.submitter_username.as_deref(),
            handler: screening.handler_username.as_deref(),
        }
    }

    fn authenticated_caller(&self) -> Option<&'a str> {
        self.caller.filter(|caller| !caller.is_empty())
    }

    fn caller_is(&self, who: Option<&str>) -> bool {
        match (self.authenticated_caller(), who) {
            (Some(caller), Some(who)) => !who.is_empty() && caller == who,
            _ => false,
        }
    }
}

pub fn is_permitted(action: ScreeningAction, ctx: &GateContext<'_>) -> bool {
    if ctx.authenticated_caller().is_none() {
        return false;
    }

    let rule = rule_for(action);
    if !rule.program.contains(&ctx.program_state) {
        return false;
    }
    if let Some(states) = rule.screening {
        if !states.contains(&ctx.screening_state) {
            return false;
        }
    }

    match rule.relation {
        Relation::Submitter => ctx.caller_is(ctx.submitter),
        Relation::Handler => ctx.caller_is(ctx.handler),
        Relation::AnyUser => true,
    }
}

/// Actions the caller may request, in `ScreeningAction::ALL` order.
pub fn permitted_actions(ctx: &GateContext<'_>) -> Vec<ScreeningAction> {
    ScreeningAction::ALL
        .into_iter()
        .filter(|action| is_permitted(*action, ctx))
        .collect()
}

/// All nine actions with their capability.
pub fn action_matrix(ctx: &GateContext<'_>) -> Vec<(ScreeningAction, Capability)> {
    ScreeningAction::ALL
        .into_iter()
        .map(|action| (action, Capability::from_bool(is_permitted(action, ctx))))
        .collect()
}

pub fn can_create_screening(caller: Option<&str>, program_state: ProgramState) -> bool {
    caller.is_some_and(|caller| !caller.is_empty()) && program_state == ProgramState::Submission
}

pub fn can_advance_program(caller: Option<&str>, program_state: ProgramState) -> bool {
    caller.is_some_and(|caller| !caller.is_empty()) && program_state.next().is_some()
}

#[cfg(test)]
#[path = "tests/gating_tests.rs"]
mod tests;
