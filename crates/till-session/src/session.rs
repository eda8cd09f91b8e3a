//! # Drawer Session
//!
//! One [`DrawerSession`] lives for one activation of a till workflow. It
//! pairs consecutive snapshots, runs the accountability gate on the first
//! one, remembers which prompt is on screen, and turns coordinator decisions
//! and operator answers into [`Directive`]s.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  first snapshot ──► gate ──┬─ Automatic(key) ──► StartTillEvent         │
//! │                            ├─ OperatorEntry ───► drawer-key prompt      │
//! │                            └─ Blocked ─────────► blocked prompt         │
//! │                                                                         │
//! │  next snapshots ──► coordinator(prev, curr) ──► directives              │
//! │                                                                         │
//! │  operator input ──► pending prompt ──► directives                       │
//! │                                                                         │
//! │  completion | void | exit ──► finished (later input is ignored)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};

use till_core::accountability::{self, GateRequest};
use till_core::tender;
use till_core::validation::{validate_drawer_key, validate_tender_lines};
use till_core::{
    BlockReason, BlockedRoute, BusinessCommand, Decision, DrawerSessionCoordinator, EventType,
    GateOutcome, KeyValidation, NavigationIntent, OperatorChoice, OperatorPrompt, ReceiptCategory,
    RecoveryOption, RecoveryPrompt, TenderDefinitions, TillPolicy, TillWorkflow,
};

use crate::config::TillConfig;
use crate::error::{SessionError, SessionResult};
use crate::snapshot::{Directive, SessionInput, SessionSnapshot};

// =============================================================================
// Pending Prompt
// =============================================================================

/// The prompt currently waiting for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingPrompt {
    Recovery(RecoveryPrompt),
    Blocked(BlockReason),
    /// Drawer key entry. `resume` is the recovery prompt to return to on
    /// Cancel; `None` while the event has not started yet.
    DrawerKey { resume: Option<RecoveryPrompt> },
}

impl PendingPrompt {
    fn offers(&self, choice: OperatorChoice) -> bool {
        match self {
            PendingPrompt::Recovery(prompt) => prompt.option_for(choice).is_some(),
            PendingPrompt::Blocked(_) => choice == OperatorChoice::Acknowledge,
            PendingPrompt::DrawerKey { .. } => choice == OperatorChoice::Cancel,
        }
    }

    fn to_operator_prompt(&self) -> OperatorPrompt {
        match self {
            PendingPrompt::Recovery(prompt) => OperatorPrompt::recovery(prompt),
            PendingPrompt::Blocked(reason) => OperatorPrompt::blocked(*reason),
            PendingPrompt::DrawerKey { .. } => OperatorPrompt::drawer_key_entry(),
        }
    }
}

// =============================================================================
// Drawer Session
// =============================================================================

#[derive(Debug)]
pub struct DrawerSession {
    coordinator: DrawerSessionCoordinator,
    fixed_drawer_key: Option<String>,
    last: Option<SessionSnapshot>,
    pending: Option<PendingPrompt>,
    drawer_key: Option<String>,
    finished: bool,
}

impl DrawerSession {
    pub fn new(
        workflow: TillWorkflow,
        policy: TillPolicy,
        tender_definitions: TenderDefinitions,
        fixed_drawer_key: Option<String>,
    ) -> Self {
        DrawerSession {
            coordinator: DrawerSessionCoordinator::new(workflow, policy, tender_definitions),
            fixed_drawer_key,
            last: None,
            pending: None,
            drawer_key: None,
            finished: false,
        }
    }

    pub fn from_config(workflow: TillWorkflow, config: &TillConfig) -> Self {
        Self::new(
            workflow,
            config.policy,
            config.tender_definitions(),
            config.fixed_drawer_key().map(str::to_string),
        )
    }

    pub fn workflow(&self) -> TillWorkflow {
        self.coordinator.workflow()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_manually_continuing(&self) -> bool {
        self.coordinator.is_manually_continuing()
    }

    /// Drawer key the event runs with, once known.
    pub fn drawer_key(&self) -> Option<&str> {
        self.drawer_key.as_deref()
    }

    /// The prompt on screen, if any.
    pub fn pending_prompt(&self) -> Option<OperatorPrompt> {
        self.pending.as_ref().map(PendingPrompt::to_operator_prompt)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Feeds the next business snapshot into the session.
    ///
    /// A rejected snapshot leaves the session unchanged.
    pub fn on_snapshot(&mut self, snapshot: SessionSnapshot) -> SessionResult<Vec<Directive>> {
        if self.finished {
            debug!(sequence = snapshot.sequence, "Session finished, ignoring snapshot");
            return Ok(Vec::new());
        }

        if let Some(last) = &self.last {
            if snapshot.sequence <= last.sequence {
                return Err(SessionError::StaleSnapshot {
                    last: last.sequence,
                    received: snapshot.sequence,
                });
            }
        }

        let workflow = self.workflow();
        if snapshot.workflow() != workflow {
            return Err(SessionError::WorkflowMismatch {
                expected: workflow.event_type,
                actual: snapshot.event_type,
            });
        }

        validate_tender_lines(&snapshot.tender_display_lines)?;

        let directives = match self.last.take() {
            None => self.start(&snapshot)?,
            Some(previous) => {
                let decision = self.coordinator.on_state_change(
                    previous.cash_drawer_state,
                    snapshot.cash_drawer_state,
                    snapshot.accountability_mode,
                    &snapshot.tender_display_lines,
                );
                debug!(
                    sequence = snapshot.sequence,
                    previous = ?previous.cash_drawer_state,
                    current = ?snapshot.cash_drawer_state,
                    ?decision,
                    "Drawer state change"
                );
                self.apply(decision)
            }
        };

        self.last = Some(snapshot);
        Ok(directives)
    }

    /// Runs the accountability gate for the first snapshot.
    fn start(&mut self, snapshot: &SessionSnapshot) -> SessionResult<Vec<Directive>> {
        let event_type = snapshot.event_type;
        let request = GateRequest {
            event_type,
            mode: snapshot.accountability_mode,
            flags: snapshot.till_flags,
            fixed_drawer_key: self.fixed_drawer_key.as_deref(),
            pending_refund: tender::pending_refund_line(&snapshot.tender_display_lines),
            till_balances: &snapshot.till_balances,
            disallow_till_events_after_final_settlement: self
                .coordinator
                .policy()
                .disallow_till_events_after_final_settlement,
        };

        let outcome = accountability::check(&request);
        info!(
            %event_type,
            mode = %snapshot.accountability_mode,
            ?outcome,
            "Till event requested"
        );

        // blocked events are reported even without a fixed key
        if matches!(outcome, GateOutcome::Proceed(_))
            && snapshot.accountability_mode.is_terminal()
            && self.fixed_drawer_key.is_none()
        {
            return Err(SessionError::MissingFixedDrawerKey);
        }

        Ok(match outcome {
            GateOutcome::Proceed(KeyValidation::Automatic(key)) => {
                vec![self.start_event(key)]
            }
            GateOutcome::Proceed(KeyValidation::OperatorEntry) => {
                vec![self.show(PendingPrompt::DrawerKey { resume: None })]
            }
            GateOutcome::Blocked(reason) => vec![self.show(PendingPrompt::Blocked(reason))],
        })
    }

    fn start_event(&mut self, drawer_key: String) -> Directive {
        self.drawer_key = Some(drawer_key.clone());
        Directive::command(BusinessCommand::StartTillEvent {
            event_type: self.workflow().event_type,
            drawer_key,
        })
    }

    // =========================================================================
    // Decisions
    // =========================================================================

    fn apply(&mut self, decision: Decision) -> Vec<Directive> {
        if self.workflow().gift_certificate_issue && decision.is_completion() {
            self.finish();
            return vec![Directive::GiftCertificateContinuation(decision)];
        }

        match decision {
            Decision::Continue => Vec::new(),
            Decision::ConfirmDrawerClosed => {
                vec![Directive::command(BusinessCommand::ConfirmCashDrawerClosed)]
            }
            Decision::NavigateToDetail(event) => {
                self.finish();
                vec![Directive::Navigate(NavigationIntent::ToDetailScreen(event))]
            }
            Decision::NavigateToReceipt(category) => {
                self.finish();
                vec![Directive::Navigate(NavigationIntent::ToReceiptScreen(
                    category,
                ))]
            }
            Decision::ShowReceiptForm => {
                self.finish();
                vec![Directive::Navigate(NavigationIntent::ToReceiptScreen(
                    ReceiptCategory::NoSale,
                ))]
            }
            Decision::PrintReceipt(category) => {
                self.finish();
                vec![Directive::command(BusinessCommand::PrintReceipt { category })]
            }
            Decision::PromptRecovery(prompt) => vec![self.show(PendingPrompt::Recovery(prompt))],
            Decision::VoidTender {
                line_number,
                change_line_number,
            } => vec![self.dispatch(BusinessCommand::void_cash_drawer_tender(
                line_number,
                change_line_number,
            ))],
            Decision::Blocked(reason) => vec![self.show(PendingPrompt::Blocked(reason))],
        }
    }

    /// Emits a business command. Voiding the transaction ends the session.
    fn dispatch(&mut self, command: BusinessCommand) -> Directive {
        if command.is_void() {
            self.finish();
        } else {
            self.pending = None;
        }
        Directive::command(command)
    }

    fn show(&mut self, pending: PendingPrompt) -> Directive {
        let prompt = pending.to_operator_prompt();
        self.pending = Some(pending);
        Directive::Prompt(prompt)
    }

    fn finish(&mut self) {
        self.pending = None;
        self.finished = true;
        debug!(event_type = %self.workflow().event_type, "Session finished");
    }

    // =========================================================================
    // Operator Input
    // =========================================================================

    /// Handles the operator's answer to the prompt on screen.
    ///
    /// Invalid input leaves the prompt in place.
    pub fn on_input(&mut self, input: SessionInput) -> SessionResult<Vec<Directive>> {
        if self.finished {
            debug!(?input, "Session finished, ignoring input");
            return Ok(Vec::new());
        }

        match input {
            SessionInput::Exit => {
                info!(event_type = %self.workflow().event_type, "Operator exited");
                self.finish();
                Ok(vec![Directive::Navigate(NavigationIntent::ExitScreen)])
            }
            SessionInput::DrawerKey(key) => self.on_drawer_key(key),
            SessionInput::Choice(choice) => self.on_choice(choice),
        }
    }

    fn on_drawer_key(&mut self, key: String) -> SessionResult<Vec<Directive>> {
        let Some(PendingPrompt::DrawerKey { resume }) = &self.pending else {
            return Err(SessionError::NoPendingPrompt);
        };
        validate_drawer_key(&key)?;

        let key = key.trim().to_string();
        let reselecting = resume.is_some();
        self.pending = None;

        if reselecting {
            info!("Reopening drawer with a newly selected key");
            self.drawer_key = Some(key.clone());
            Ok(vec![Directive::command(BusinessCommand::OpenCashDrawer {
                drawer_key: key,
            })])
        } else {
            Ok(vec![self.start_event(key)])
        }
    }

    fn on_choice(&mut self, choice: OperatorChoice) -> SessionResult<Vec<Directive>> {
        let pending = self.pending.clone().ok_or(SessionError::NoPendingPrompt)?;
        if !pending.offers(choice) {
            warn!(?choice, "Choice not offered by the current prompt");
            return Err(SessionError::ChoiceNotOffered(choice));
        }

        match pending {
            PendingPrompt::Recovery(prompt) => self.on_recovery_choice(prompt, choice),
            PendingPrompt::Blocked(reason) => {
                info!(?reason, "Blocked till event acknowledged");
                let directives = self.blocked_route();
                self.finish();
                Ok(directives)
            }
            PendingPrompt::DrawerKey { resume: Some(prompt) } => {
                Ok(vec![self.show(PendingPrompt::Recovery(prompt))])
            }
            PendingPrompt::DrawerKey { resume: None } => {
                self.finish();
                Ok(vec![Directive::Navigate(NavigationIntent::ExitScreen)])
            }
        }
    }

    fn on_recovery_choice(
        &mut self,
        prompt: RecoveryPrompt,
        choice: OperatorChoice,
    ) -> SessionResult<Vec<Directive>> {
        let option = prompt
            .option_for(choice)
            .cloned()
            .ok_or(SessionError::ChoiceNotOffered(choice))?;
        info!(?option, "Recovery option chosen");

        let directives = match option {
            RecoveryOption::Retry => {
                let drawer_key = self
                    .drawer_key
                    .clone()
                    .ok_or(SessionError::MissingDrawerKey)?;
                vec![self.dispatch(BusinessCommand::OpenCashDrawer { drawer_key })]
            }
            RecoveryOption::SelectDrawer => vec![self.show(PendingPrompt::DrawerKey {
                resume: Some(prompt),
            })],
            RecoveryOption::Override => {
                self.coordinator.select_override();
                let skip_confirm = self.workflow().event_type != EventType::NoSale;
                vec![self.dispatch(BusinessCommand::UserContinueCashDrawerOpen { skip_confirm })]
            }
            RecoveryOption::VoidTender {
                line_number,
                change_line_number,
            } => vec![self.dispatch(BusinessCommand::void_cash_drawer_tender(
                line_number,
                change_line_number,
            ))],
            RecoveryOption::VoidTransaction(command) => vec![self.dispatch(command.into())],
            RecoveryOption::Acknowledge => {
                vec![self.dispatch(BusinessCommand::ConfirmCashDrawerClosed)]
            }
            RecoveryOption::Cancel => {
                self.pending = None;
                Vec::new()
            }
        };

        Ok(directives)
    }

    /// Where an acknowledged block leads.
    fn blocked_route(&self) -> Vec<Directive> {
        match accountability::blocked_route(self.workflow()) {
            BlockedRoute::StoreOperationsMenu => {
                vec![Directive::Navigate(NavigationIntent::ToStoreOperationsMenu)]
            }
            BlockedRoute::ExitScreen => vec![Directive::Navigate(NavigationIntent::ExitScreen)],
            BlockedRoute::VoidTenderControlTransaction => {
                vec![Directive::command(
                    BusinessCommand::VoidTenderControlTransaction,
                )]
            }
            BlockedRoute::VoidLastOpenDrawerTender => {
                let lines = self
                    .last
                    .as_ref()
                    .map(|s| s.tender_display_lines.as_slice())
                    .unwrap_or_default();
                match self.coordinator.void_last_open_drawer_tender(lines) {
                    Some(Decision::VoidTender {
                        line_number,
                        change_line_number,
                    }) => vec![Directive::command(BusinessCommand::void_cash_drawer_tender(
                        line_number,
                        change_line_number,
                    ))],
                    _ => vec![Directive::Navigate(NavigationIntent::ExitScreen)],
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::{
        AccountabilityMode, CashDrawerSessionState, Money, TenderAuthCategory, TenderDefinition,
        TenderDisplayLine, TenderLineType, TillSessionFlags,
    };
    use CashDrawerSessionState::*;

    fn session(event: EventType, fixed_key: Option<&str>) -> DrawerSession {
        DrawerSession::new(
            TillWorkflow::new(event),
            TillPolicy::default(),
            vec![TenderDefinition::new(
                "cash",
                "Cash",
                [TenderLineType::Payment],
            )]
            .into_iter()
            .collect(),
            fixed_key.map(str::to_string),
        )
    }

    fn snapshot(
        sequence: u64,
        event: EventType,
        state: CashDrawerSessionState,
        mode: AccountabilityMode,
    ) -> SessionSnapshot {
        SessionSnapshot {
            accountability_mode: mode,
            till_flags: TillSessionFlags {
                in_drawer: true,
                ..TillSessionFlags::default()
            },
            ..SessionSnapshot::new(sequence, TillWorkflow::new(event), state)
        }
    }

    #[test]
    fn test_automatic_key_starts_event() {
        let mut session = session(EventType::PaidOut, Some("D-7"));
        let directives = session
            .on_snapshot(snapshot(1, EventType::PaidOut, Closed, AccountabilityMode::Terminal))
            .unwrap();

        assert_eq!(
            directives,
            vec![Directive::Command(BusinessCommand::StartTillEvent {
                event_type: EventType::PaidOut,
                drawer_key: "D-7".to_string()
            })]
        );
        assert_eq!(session.drawer_key(), Some("D-7"));
        assert!(session.pending_prompt().is_none());
    }

    #[test]
    fn test_terminal_mode_needs_fixed_key() {
        let mut session = session(EventType::PaidOut, None);
        let err = session
            .on_snapshot(snapshot(1, EventType::PaidOut, Closed, AccountabilityMode::Terminal))
            .unwrap_err();
        assert!(matches!(err, SessionError::MissingFixedDrawerKey));
    }

    #[test]
    fn test_blocked_event_reported_without_fixed_key() {
        let mut session = session(EventType::TillOut, None);
        let mut first = snapshot(1, EventType::TillOut, Closed, AccountabilityMode::Terminal);
        first.till_flags.not_in_drawer = true;

        assert_eq!(
            session.on_snapshot(first).unwrap(),
            vec![Directive::Prompt(OperatorPrompt::blocked(
                BlockReason::TillOutAlreadyPerformed
            ))]
        );
    }

    #[test]
    fn test_operator_entry_then_key() {
        let mut session = session(EventType::TillIn, None);
        let directives = session
            .on_snapshot(snapshot(1, EventType::TillIn, Closed, AccountabilityMode::Shared))
            .unwrap();
        assert_eq!(
            directives,
            vec![Directive::Prompt(OperatorPrompt::drawer_key_entry())]
        );

        assert!(matches!(
            session.on_input(SessionInput::DrawerKey("bad key!".to_string())),
            Err(SessionError::Validation(_))
        ));
        assert!(session.pending_prompt().is_some());

        let directives = session
            .on_input(SessionInput::DrawerKey(" D-2 ".to_string()))
            .unwrap();
        assert_eq!(
            directives,
            vec![Directive::Command(BusinessCommand::StartTillEvent {
                event_type: EventType::TillIn,
                drawer_key: "D-2".to_string()
            })]
        );
    }

    #[test]
    fn test_stale_and_mismatched_snapshots_are_rejected() {
        let mut session = session(EventType::PaidIn, None);
        session
            .on_snapshot(snapshot(5, EventType::PaidIn, Closed, AccountabilityMode::None))
            .unwrap();

        assert!(matches!(
            session.on_snapshot(snapshot(5, EventType::PaidIn, Open, AccountabilityMode::None)),
            Err(SessionError::StaleSnapshot {
                last: 5,
                received: 5
            })
        ));
        assert!(matches!(
            session.on_snapshot(snapshot(6, EventType::NoSale, Open, AccountabilityMode::None)),
            Err(SessionError::WorkflowMismatch { .. })
        ));

        // the accepted previous state is still Closed
        assert_eq!(
            session
                .on_snapshot(snapshot(7, EventType::PaidIn, Open, AccountabilityMode::None))
                .unwrap(),
            vec![Directive::Navigate(NavigationIntent::ToDetailScreen(
                EventType::PaidIn
            ))]
        );
        assert!(session.is_finished());
    }

    #[test]
    fn test_blocked_event_routes_after_acknowledge() {
        let mut session = session(EventType::TillOut, Some("D-1"));
        let mut first = snapshot(1, EventType::TillOut, Closed, AccountabilityMode::Terminal);
        first.till_flags.not_in_drawer = true;

        let directives = session.on_snapshot(first).unwrap();
        assert_eq!(
            directives,
            vec![Directive::Prompt(OperatorPrompt::blocked(
                BlockReason::TillOutAlreadyPerformed
            ))]
        );

        assert!(matches!(
            session.on_input(SessionInput::Choice(OperatorChoice::Cancel)),
            Err(SessionError::ChoiceNotOffered(OperatorChoice::Cancel))
        ));

        let directives = session
            .on_input(SessionInput::Choice(OperatorChoice::Acknowledge))
            .unwrap();
        assert_eq!(
            directives,
            vec![Directive::Navigate(NavigationIntent::ToStoreOperationsMenu)]
        );
        assert!(session.is_finished());
    }

    #[test]
    fn test_blocked_open_cash_drawer_voids_last_drawer_tender() {
        let mut session = session(EventType::OpenCashDrawer, Some("D-1"));
        let mut first = snapshot(1, EventType::OpenCashDrawer, Closed, AccountabilityMode::Terminal);
        first.till_flags.in_drawer = false;
        first.tender_display_lines = vec![TenderDisplayLine {
            line_number: 2,
            line_type: TenderLineType::Payment,
            tender_id: "cash".to_string(),
            tender_name: "Cash".to_string(),
            tender_amount: Money::from_cents(1500),
            tender_auth_category: TenderAuthCategory::None,
        }];

        session.on_snapshot(first).unwrap();
        let directives = session
            .on_input(SessionInput::Choice(OperatorChoice::Acknowledge))
            .unwrap();
        assert_eq!(
            directives,
            vec![Directive::Command(BusinessCommand::VoidCashDrawerTender {
                line_numbers: vec![2]
            })]
        );
    }

    #[test]
    fn test_input_without_prompt() {
        let mut session = session(EventType::PaidIn, None);
        assert!(matches!(
            session.on_input(SessionInput::Choice(OperatorChoice::Retry)),
            Err(SessionError::NoPendingPrompt)
        ));
        assert!(matches!(
            session.on_input(SessionInput::DrawerKey("D-1".to_string())),
            Err(SessionError::NoPendingPrompt)
        ));
    }

    #[test]
    fn test_finished_session_ignores_everything() {
        let mut session = session(EventType::PaidIn, None);
        assert_eq!(
            session.on_input(SessionInput::Exit).unwrap(),
            vec![Directive::Navigate(NavigationIntent::ExitScreen)]
        );
        assert!(session
            .on_snapshot(snapshot(1, EventType::PaidIn, Open, AccountabilityMode::None))
            .unwrap()
            .is_empty());
        assert!(session.on_input(SessionInput::Exit).unwrap().is_empty());
    }
}
