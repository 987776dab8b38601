use super::*;

const SUBMITTER: &str = "submitter";
const HANDLER: &str = "staff1";
const PROGRAMMER: &str = "prog1";

fn ctx(
    caller: Option<&'static str>,
    program_state: ProgramState,
    screening_state: ScreeningState,
) -> GateContext<'static> {
    GateContext {
        caller,
        program_state,
        screening_state,
        submitter: Some(SUBMITTER),
        handler: Some(HANDLER),
    }
}

fn assert_only(ctx: &GateContext<'_>, expected: &[ScreeningAction]) {
    assert_eq!(permitted_actions(ctx), expected.to_vec(), "context: {ctx:?}");
}

#[test]
fn submitter_edits_created_screening_during_submission() {
    let ok = ctx(Some(SUBMITTER), ProgramState::Submission, ScreeningState::Created);
    for action in [
        ScreeningAction::Submit,
        ScreeningAction::Withdraw,
        ScreeningAction::Update,
    ] {
        assert!(is_permitted(action, &ok), "{action} should be allowed");
    }
    assert_only(
        &ok,
        &[
            ScreeningAction::Submit,
            ScreeningAction::Withdraw,
            ScreeningAction::Update,
        ],
    );

    let someone_else = ctx(Some(PROGRAMMER), ProgramState::Submission, ScreeningState::Created);
    let already_submitted = ctx(Some(SUBMITTER), ProgramState::Submission, ScreeningState::Submitted);
    let wrong_phase = ctx(Some(SUBMITTER), ProgramState::Assignment, ScreeningState::Created);
    for action in [
        ScreeningAction::Submit,
        ScreeningAction::Withdraw,
        ScreeningAction::Update,
    ] {
        assert!(!is_permitted(action, &someone_else));
        assert!(!is_permitted(action, &already_submitted));
        assert!(!is_permitted(action, &wrong_phase));
    }
}

#[test]
fn assign_handler_needs_no_ownership() {
    let ok = ctx(Some(PROGRAMMER), ProgramState::Assignment, ScreeningState::Submitted);
    assert!(is_permitted(ScreeningAction::AssignHandler, &ok));
    assert_only(&ok, &[ScreeningAction::AssignHandler]);

    let not_submitted = ctx(Some(PROGRAMMER), ProgramState::Assignment, ScreeningState::Created);
    assert!(!is_permitted(ScreeningAction::AssignHandler, &not_submitted));
    let anonymous = ctx(None, ProgramState::Assignment, ScreeningState::Submitted);
    assert!(!is_permitted(ScreeningAction::AssignHandler, &anonymous));
}

#[test]
fn only_the_handler_reviews() {
    for state in [ScreeningState::Submitted, ScreeningState::Reviewed] {
        let ok = ctx(Some(HANDLER), ProgramState::Review, state);
        assert!(is_permitted(ScreeningAction::Review, &ok));
        assert_only(&ok, &[ScreeningAction::Review]);
    }

    let submitter = ctx(Some(SUBMITTER), ProgramState::Review, ScreeningState::Submitted);
    assert!(!is_permitted(ScreeningAction::Review, &submitter));
    let approved = ctx(Some(HANDLER), ProgramState::Review, ScreeningState::Approved);
    assert!(!is_permitted(ScreeningAction::Review, &approved));

    let mut unassigned = ctx(Some(HANDLER), ProgramState::Review, ScreeningState::Submitted);
    unassigned.handler = None;
    assert!(!is_permitted(ScreeningAction::Review, &unassigned));
}

#[test]
fn submitter_approves_reviewed_screening_while_scheduling() {
    let ok = ctx(Some(SUBMITTER), ProgramState::Scheduling, ScreeningState::Reviewed);
    assert!(is_permitted(ScreeningAction::Approve, &ok));
    assert_only(&ok, &[ScreeningAction::Approve, ScreeningAction::Reject]);

    let handler = ctx(Some(HANDLER), ProgramState::Scheduling, ScreeningState::Reviewed);
    assert!(!is_permitted(ScreeningAction::Approve, &handler));
    let unreviewed = ctx(Some(SUBMITTER), ProgramState::Scheduling, ScreeningState::Submitted);
    assert!(!is_permitted(ScreeningAction::Approve, &unreviewed));
}

#[test]
fn reject_ignores_screening_state_and_ownership() {
    for program_state in [ProgramState::Scheduling, ProgramState::Decision] {
        for screening_state in [
            ScreeningState::Created,
            ScreeningState::Approved,
            ScreeningState::Scheduled,
            ScreeningState::Rejected,
            ScreeningState::Unknown,
        ] {
            let ok = ctx(Some(PROGRAMMER), program_state, screening_state);
            assert!(is_permitted(ScreeningAction::Reject, &ok), "{ok:?}");
        }
    }

    let review = ctx(Some(PROGRAMMER), ProgramState::Review, ScreeningState::Reviewed);
    assert!(!is_permitted(ScreeningAction::Reject, &review));
    let anonymous = ctx(None, ProgramState::Decision, ScreeningState::Approved);
    assert!(!is_permitted(ScreeningAction::Reject, &anonymous));
}

#[test]
fn submitter_final_submits_approved_screening() {
    let ok = ctx(Some(SUBMITTER), ProgramState::FinalPublication, ScreeningState::Approved);
    assert!(is_permitted(ScreeningAction::FinalSubmit, &ok));
    assert_only(&ok, &[ScreeningAction::FinalSubmit]);

    let programmer = ctx(Some(PROGRAMMER), ProgramState::FinalPublication, ScreeningState::Approved);
    assert!(!is_permitted(ScreeningAction::FinalSubmit, &programmer));
    let too_early = ctx(Some(SUBMITTER), ProgramState::Scheduling, ScreeningState::Approved);
    assert!(!is_permitted(ScreeningAction::FinalSubmit, &too_early));
}

#[test]
fn accept_is_open_to_any_user_during_decision() {
    let ok = ctx(Some(PROGRAMMER), ProgramState::Decision, ScreeningState::Approved);
    assert!(is_permitted(ScreeningAction::Accept, &ok));
    assert_only(&ok, &[ScreeningAction::Reject, ScreeningAction::Accept]);

    let not_approved = ctx(Some(PROGRAMMER), ProgramState::Decision, ScreeningState::Reviewed);
    assert!(!is_permitted(ScreeningAction::Accept, &not_approved));
    let announced = ctx(Some(PROGRAMMER), ProgramState::Announced, ScreeningState::Approved);
    assert!(!is_permitted(ScreeningAction::Accept, &announced));
}

#[test]
fn empty_username_counts_as_logged_out() {
    let mut blank = ctx(Some(""), ProgramState::Submission, ScreeningState::Created);
    blank.submitter = Some("");
    assert_only(&blank, &[]);
}

#[test]
fn matrix_lists_every_action_once() {
    let ok = ctx(Some(SUBMITTER), ProgramState::Submission, ScreeningState::Created);
    let matrix = action_matrix(&ok);
    assert_eq!(matrix.len(), ScreeningAction::ALL.len());
    let allowed: Vec<_> = matrix
        .iter()
        .filter(|(_, capability)| capability.is_allowed())
        .map(|(action, _)| *action)
        .collect();
    assert_eq!(allowed, permitted_actions(&ok));
}

#[test]
fn program_level_gates() {
    assert!(can_create_screening(Some("submitter"), ProgramState::Submission));
    assert!(!can_create_screening(Some("submitter"), ProgramState::Created));
    assert!(!can_create_screening(None, ProgramState::Submission));

    assert!(can_advance_program(Some("prog1"), ProgramState::Decision));
    assert!(!can_advance_program(Some("prog1"), ProgramState::Announced));
    assert!(!can_advance_program(None, ProgramState::Created));
}
