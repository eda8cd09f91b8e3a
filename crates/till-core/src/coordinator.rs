//! # Drawer Session Coordinator
//!
//! Turns a change in the hardware-reported drawer state into one
//! [`Decision`] for the workflow in progress.
//!
//! ## Transition Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  previous → current            event               decision             │
//! │  ──────────────────            ─────               ────────             │
//! │  WaitingOpen → Open            NoSale              ConfirmDrawerClosed  │
//! │                                OpenCashDrawer      Receipt / VatReceipt │
//! │                                TenderExchange      TenderExchange rcpt  │
//! │                                till / paid         Detail screen        │
//! │  WaitingOpen → Closed          OpenCashDrawer      Retry|Select,        │
//! │                                                    Override*, VoidTender│
//! │                                TenderExchange      Retry|Select,Override│
//! │                                others              Retry, Override, Void│
//! │  WaitingClosed → Closed        NoSale              no-sale receipt      │
//! │                                others              Acknowledge prompt   │
//! │  NoDrawer|Open → Closed        NoSale              no-sale receipt      │
//! │  Closed → Open                 NoSale              ConfirmDrawerClosed  │
//! │                                others              Detail screen        │
//! │  Closed → Closed (override)    OpenCashDrawer      Receipt / VatReceipt │
//! │                                TenderExchange      TenderExchange rcpt  │
//! │  anything else                                     Continue             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`decide`] is a pure function of the edge and its context. The
//! [`DrawerSessionCoordinator`] owns the one piece of session state, the
//! override latch, and feeds it into every call.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::accountability::BlockReason;
use crate::recovery::{
    void_action, OperatorChoice, PromptReason, RecoveryOption, RecoveryPrompt, VoidAction,
};
use crate::tender;
use crate::types::{
    AccountabilityMode, CashDrawerSessionState, EventType, ReceiptCategory, TenderDefinitions,
    TenderDisplayLine, TillPolicy, TillWorkflow,
};

// =============================================================================
// Decision
// =============================================================================

/// What the external layer should do about the latest drawer state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Nothing to do.
    Continue,
    ConfirmDrawerClosed,
    NavigateToDetail(EventType),
    NavigateToReceipt(ReceiptCategory),
    PromptRecovery(RecoveryPrompt),
    VoidTender {
        line_number: u32,
        change_line_number: Option<u32>,
    },
    Blocked(BlockReason),
    /// No-sale receipt must be chosen on the receipt form.
    ShowReceiptForm,
    /// Print without asking; no receipt type is selected.
    PrintReceipt(ReceiptCategory),
}

impl Decision {
    /// Decisions that finish the workflow.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Decision::NavigateToDetail(_)
                | Decision::NavigateToReceipt(_)
                | Decision::ShowReceiptForm
                | Decision::PrintReceipt(_)
        )
    }
}

// =============================================================================
// Pure Transition Function
// =============================================================================

/// Two consecutive hardware snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionEdge {
    pub previous: CashDrawerSessionState,
    pub current: CashDrawerSessionState,
}

impl SessionEdge {
    pub const fn new(previous: CashDrawerSessionState, current: CashDrawerSessionState) -> Self {
        SessionEdge { previous, current }
    }
}

/// Everything besides the edge that a decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub workflow: TillWorkflow,
    pub mode: AccountabilityMode,
    pub policy: TillPolicy,
    pub tender_lines: &'a [TenderDisplayLine],
    pub tender_definitions: &'a TenderDefinitions,
    /// The operator chose Override earlier in this session.
    pub manually_continuing: bool,
}

/// Decides what a drawer state change means for the workflow.
pub fn decide(edge: SessionEdge, ctx: &DecisionContext<'_>) -> Decision {
    use CashDrawerSessionState::*;

    let event = ctx.workflow.event_type;

    match (edge.previous, edge.current) {
        (WaitingForOpenDrawerResponse, Open) => drawer_opened(ctx),
        (WaitingForOpenDrawerResponse, Closed) => {
            Decision::PromptRecovery(drawer_not_opened(ctx))
        }
        (WaitingForDrawerClosedResponse, Closed) => {
            if event == EventType::NoSale {
                no_sale_receipt(&ctx.policy)
            } else {
                Decision::PromptRecovery(RecoveryPrompt::new(
                    PromptReason::DrawerClosedUnexpectedly,
                    vec![RecoveryOption::Acknowledge],
                ))
            }
        }
        (NoCashDrawer | Open, Closed) if event == EventType::NoSale => no_sale_receipt(&ctx.policy),
        (Closed, Open) => {
            if event == EventType::NoSale {
                Decision::ConfirmDrawerClosed
            } else {
                Decision::NavigateToDetail(event)
            }
        }
        (Closed, Closed) if ctx.manually_continuing => completion_after_override(ctx),
        _ => Decision::Continue,
    }
}

fn drawer_opened(ctx: &DecisionContext<'_>) -> Decision {
    match ctx.workflow.event_type {
        // the operator still has to close it
        EventType::NoSale => Decision::ConfirmDrawerClosed,
        EventType::OpenCashDrawer => Decision::NavigateToReceipt(ctx.policy.open_drawer_receipt()),
        EventType::TenderExchange => Decision::NavigateToReceipt(ReceiptCategory::TenderExchange),
        event => Decision::NavigateToDetail(event),
    }
}

/// Only the receipt-producing events complete on a repeated Closed.
/// Everything else waits for the drawer to report again.
fn completion_after_override(ctx: &DecisionContext<'_>) -> Decision {
    match ctx.workflow.event_type {
        EventType::OpenCashDrawer => Decision::NavigateToReceipt(ctx.policy.open_drawer_receipt()),
        EventType::TenderExchange => Decision::NavigateToReceipt(ReceiptCategory::TenderExchange),
        _ => Decision::Continue,
    }
}

fn drawer_not_opened(ctx: &DecisionContext<'_>) -> RecoveryPrompt {
    let reopen = if ctx.mode.is_terminal() {
        RecoveryOption::Retry
    } else {
        RecoveryOption::SelectDrawer
    };

    match ctx.workflow.event_type {
        EventType::OpenCashDrawer => {
            let mut options = vec![reopen, RecoveryOption::Override];
            options.extend(void_tender_option(ctx));
            RecoveryPrompt::new(PromptReason::DrawerNotOpened, options)
                .with_default(OperatorChoice::Override)
        }
        // exchange-out cash cannot be voided from here
        EventType::TenderExchange => RecoveryPrompt::new(
            PromptReason::DrawerNotOpened,
            vec![reopen, RecoveryOption::Override],
        ),
        event => {
            let mut options = vec![RecoveryOption::Retry, RecoveryOption::Override];
            match void_action(event) {
                VoidAction::Transaction(command) => {
                    options.push(RecoveryOption::VoidTransaction(command))
                }
                VoidAction::LastOpenDrawerTender => options.extend(void_tender_option(ctx)),
            }
            RecoveryPrompt::new(PromptReason::DrawerNotOpened, options)
        }
    }
}

/// Void option for the last drawer-opening tender, if it may be voided.
fn void_tender_option(ctx: &DecisionContext<'_>) -> Option<RecoveryOption> {
    let (change, last) = tender::last_open_drawer_tender_in(ctx.tender_lines, ctx.tender_definitions);
    let last = last?;

    tender::is_void_allowed(last, change, ctx.workflow.gift_certificate_issue).then(|| {
        RecoveryOption::VoidTender {
            line_number: last.line_number,
            change_line_number: change.map(|c| c.line_number),
        }
    })
}

fn no_sale_receipt(policy: &TillPolicy) -> Decision {
    if policy.print_no_sale_receipt_required {
        Decision::ShowReceiptForm
    } else {
        Decision::PrintReceipt(ReceiptCategory::NoSale)
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// One coordinator per workflow activation.
///
/// The override latch is its only mutable state. It is set when the
/// operator chooses Override and lives until the coordinator is dropped.
#[derive(Debug, Clone)]
pub struct DrawerSessionCoordinator {
    workflow: TillWorkflow,
    policy: TillPolicy,
    tender_definitions: TenderDefinitions,
    manually_continuing: bool,
}

impl DrawerSessionCoordinator {
    pub fn new(
        workflow: TillWorkflow,
        policy: TillPolicy,
        tender_definitions: TenderDefinitions,
    ) -> Self {
        DrawerSessionCoordinator {
            workflow,
            policy,
            tender_definitions,
            manually_continuing: false,
        }
    }

    pub fn workflow(&self) -> TillWorkflow {
        self.workflow
    }

    pub fn policy(&self) -> &TillPolicy {
        &self.policy
    }

    pub fn is_manually_continuing(&self) -> bool {
        self.manually_continuing
    }

    /// Decision for the latest pair of drawer snapshots.
    pub fn on_state_change(
        &self,
        previous: CashDrawerSessionState,
        current: CashDrawerSessionState,
        mode: AccountabilityMode,
        tender_lines: &[TenderDisplayLine],
    ) -> Decision {
        let ctx = DecisionContext {
            workflow: self.workflow,
            mode,
            policy: self.policy,
            tender_lines,
            tender_definitions: &self.tender_definitions,
            manually_continuing: self.manually_continuing,
        };
        decide(SessionEdge::new(previous, current), &ctx)
    }

    /// Records that the operator chose Override.
    pub fn select_override(&mut self) {
        self.manually_continuing = true;
    }

    /// Voids the tender that opened the drawer, if any did.
    ///
    /// Unlike the recovery prompt this does not check [`tender::is_void_allowed`]:
    /// it backs out a blocked event before any authorization took place.
    pub fn void_last_open_drawer_tender(&self, tender_lines: &[TenderDisplayLine]) -> Option<Decision> {
        let (change, last) =
            tender::last_open_drawer_tender_in(tender_lines, &self.tender_definitions);
        last.map(|tender| Decision::VoidTender {
            line_number: tender.line_number,
            change_line_number: change.map(|c| c.line_number),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::recovery::VoidCommand;
    use crate::types::{TenderAuthCategory, TenderDefinition, TenderLineType};
    use rstest::rstest;
    use CashDrawerSessionState::*;

    fn cash_definitions() -> TenderDefinitions {
        vec![TenderDefinition::new(
            "cash",
            "Cash",
            [TenderLineType::Payment, TenderLineType::Refund],
        )]
        .into_iter()
        .collect()
    }

    fn payment(n: u32, category: TenderAuthCategory) -> TenderDisplayLine {
        TenderDisplayLine {
            line_number: n,
            line_type: TenderLineType::Payment,
            tender_id: "cash".to_string(),
            tender_name: "Cash".to_string(),
            tender_amount: Money::from_cents(2000),
            tender_auth_category: category,
        }
    }

    fn coordinator(event: EventType) -> DrawerSessionCoordinator {
        DrawerSessionCoordinator::new(
            TillWorkflow::new(event),
            TillPolicy::default(),
            cash_definitions(),
        )
    }

    fn decide_for(event: EventType, previous: CashDrawerSessionState, current: CashDrawerSessionState) -> Decision {
        coordinator(event).on_state_change(previous, current, AccountabilityMode::Terminal, &[])
    }

    fn prompt(decision: Decision) -> RecoveryPrompt {
        match decision {
            Decision::PromptRecovery(prompt) => prompt,
            other => panic!("expected a recovery prompt, got {other:?}"),
        }
    }

    #[rstest]
    #[case(EventType::NoSale, Decision::ConfirmDrawerClosed)]
    #[case(EventType::OpenCashDrawer, Decision::NavigateToReceipt(ReceiptCategory::Receipt))]
    #[case(EventType::TenderExchange, Decision::NavigateToReceipt(ReceiptCategory::TenderExchange))]
    #[case(EventType::TillIn, Decision::NavigateToDetail(EventType::TillIn))]
    #[case(EventType::PaidOut, Decision::NavigateToDetail(EventType::PaidOut))]
    fn test_drawer_opened(#[case] event: EventType, #[case] expected: Decision) {
        assert_eq!(decide_for(event, WaitingForOpenDrawerResponse, Open), expected);
    }

    #[test]
    fn test_vat_locale_receipt() {
        let coordinator = DrawerSessionCoordinator::new(
            TillWorkflow::new(EventType::OpenCashDrawer),
            TillPolicy {
                vat_receipt: true,
                ..TillPolicy::default()
            },
            cash_definitions(),
        );
        assert_eq!(
            coordinator.on_state_change(
                WaitingForOpenDrawerResponse,
                Open,
                AccountabilityMode::Terminal,
                &[]
            ),
            Decision::NavigateToReceipt(ReceiptCategory::VatReceipt)
        );
    }

    #[test]
    fn test_open_cash_drawer_not_opened_offers_void_of_cash_tender() {
        let lines = vec![payment(3, TenderAuthCategory::None)];
        let decision = coordinator(EventType::OpenCashDrawer).on_state_change(
            WaitingForOpenDrawerResponse,
            Closed,
            AccountabilityMode::Terminal,
            &lines,
        );
        let prompt = prompt(decision);
        assert_eq!(
            prompt.options,
            vec![
                RecoveryOption::Retry,
                RecoveryOption::Override,
                RecoveryOption::VoidTender {
                    line_number: 3,
                    change_line_number: None
                },
            ]
        );
        assert_eq!(prompt.default_choice, Some(OperatorChoice::Override));
        assert!(!prompt.cancelable);
    }

    #[test]
    fn test_open_cash_drawer_not_opened_omits_void_of_card_tender() {
        let lines = vec![payment(3, TenderAuthCategory::CreditCard)];
        let prompt = prompt(coordinator(EventType::OpenCashDrawer).on_state_change(
            WaitingForOpenDrawerResponse,
            Closed,
            AccountabilityMode::Terminal,
            &lines,
        ));
        assert!(prompt.option_for(OperatorChoice::Void).is_none());
        assert_eq!(
            prompt.choices(),
            vec![OperatorChoice::Retry, OperatorChoice::Override]
        );
    }

    #[test]
    fn test_gift_certificate_issue_never_offers_tender_void() {
        let coordinator = DrawerSessionCoordinator::new(
            TillWorkflow::gift_certificate(EventType::OpenCashDrawer),
            TillPolicy::default(),
            cash_definitions(),
        );
        let lines = vec![payment(3, TenderAuthCategory::None)];
        let prompt = prompt(coordinator.on_state_change(
            WaitingForOpenDrawerResponse,
            Closed,
            AccountabilityMode::Terminal,
            &lines,
        ));
        assert!(prompt.option_for(OperatorChoice::Void).is_none());
    }

    #[rstest]
    #[case(AccountabilityMode::Terminal, RecoveryOption::Retry)]
    #[case(AccountabilityMode::Shared, RecoveryOption::SelectDrawer)]
    #[case(AccountabilityMode::None, RecoveryOption::SelectDrawer)]
    fn test_tender_exchange_not_opened(
        #[case] mode: AccountabilityMode,
        #[case] reopen: RecoveryOption,
    ) {
        let lines = vec![payment(1, TenderAuthCategory::None)];
        let prompt = prompt(coordinator(EventType::TenderExchange).on_state_change(
            WaitingForOpenDrawerResponse,
            Closed,
            mode,
            &lines,
        ));
        assert_eq!(prompt.options, vec![reopen, RecoveryOption::Override]);
    }

    #[rstest]
    #[case(EventType::TillIn, VoidCommand::VoidTillControlTransaction)]
    #[case(EventType::PaidIn, VoidCommand::VoidTenderControlTransaction)]
    #[case(EventType::NoSale, VoidCommand::VoidNoSaleTransaction)]
    fn test_other_events_not_opened_void_through_registry(
        #[case] event: EventType,
        #[case] command: VoidCommand,
    ) {
        let prompt = prompt(coordinator(event).on_state_change(
            WaitingForOpenDrawerResponse,
            Closed,
            AccountabilityMode::Shared,
            &[],
        ));
        assert_eq!(
            prompt.options,
            vec![
                RecoveryOption::Retry,
                RecoveryOption::Override,
                RecoveryOption::VoidTransaction(command),
            ]
        );
        assert_eq!(prompt.default_choice, None);
    }

    #[test]
    fn test_no_sale_closed_prints_or_shows_form() {
        assert_eq!(
            decide_for(EventType::NoSale, WaitingForDrawerClosedResponse, Closed),
            Decision::PrintReceipt(ReceiptCategory::NoSale)
        );

        let with_form = DrawerSessionCoordinator::new(
            TillWorkflow::new(EventType::NoSale),
            TillPolicy {
                print_no_sale_receipt_required: true,
                ..TillPolicy::default()
            },
            cash_definitions(),
        );
        assert_eq!(
            with_form.on_state_change(Open, Closed, AccountabilityMode::Terminal, &[]),
            Decision::ShowReceiptForm
        );
    }

    #[test]
    fn test_drawer_closed_response_for_other_events_asks_for_acknowledgement() {
        let prompt = prompt(decide_for(
            EventType::PaidOut,
            WaitingForDrawerClosedResponse,
            Closed,
        ));
        assert_eq!(prompt.reason, PromptReason::DrawerClosedUnexpectedly);
        assert_eq!(prompt.options, vec![RecoveryOption::Acknowledge]);
    }

    #[test]
    fn test_closed_to_open() {
        assert_eq!(
            decide_for(EventType::NoSale, Closed, Open),
            Decision::ConfirmDrawerClosed
        );
        assert_eq!(
            decide_for(EventType::TillCount, Closed, Open),
            Decision::NavigateToDetail(EventType::TillCount)
        );
    }

    #[rstest]
    #[case(EventType::OpenCashDrawer, Decision::NavigateToReceipt(ReceiptCategory::Receipt))]
    #[case(EventType::TenderExchange, Decision::NavigateToReceipt(ReceiptCategory::TenderExchange))]
    #[case(EventType::NoSale, Decision::Continue)]
    #[case(EventType::TillIn, Decision::Continue)]
    #[case(EventType::TillToBank, Decision::Continue)]
    fn test_closed_repeat_after_override(#[case] event: EventType, #[case] expected: Decision) {
        let mut coordinator = coordinator(event);
        assert_eq!(
            coordinator.on_state_change(Closed, Closed, AccountabilityMode::Terminal, &[]),
            Decision::Continue
        );

        coordinator.select_override();
        assert!(coordinator.is_manually_continuing());
        assert_eq!(
            coordinator.on_state_change(Closed, Closed, AccountabilityMode::Terminal, &[]),
            expected
        );
    }

    #[test]
    fn test_void_last_open_drawer_tender() {
        let lines = vec![
            payment(1, TenderAuthCategory::None),
            payment(4, TenderAuthCategory::CreditCard),
            TenderDisplayLine {
                line_number: 5,
                line_type: TenderLineType::Change,
                tender_id: "cash".to_string(),
                tender_name: "Cash".to_string(),
                tender_amount: Money::from_cents(-300),
                tender_auth_category: TenderAuthCategory::None,
            },
        ];
        assert_eq!(
            coordinator(EventType::NoSale).void_last_open_drawer_tender(&lines),
            Some(Decision::VoidTender {
                line_number: 4,
                change_line_number: Some(5)
            })
        );
        assert_eq!(
            coordinator(EventType::NoSale).void_last_open_drawer_tender(&[]),
            None
        );
    }

    #[test]
    fn test_completion_decisions() {
        assert!(Decision::NavigateToDetail(EventType::TillIn).is_completion());
        assert!(Decision::PrintReceipt(ReceiptCategory::NoSale).is_completion());
        assert!(!Decision::ConfirmDrawerClosed.is_completion());
        assert!(!Decision::Continue.is_completion());
    }
}
