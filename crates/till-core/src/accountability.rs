//! # Accountability Gate
//!
//! Pre-flight check run before a till event is submitted.
//!
//! ## Terminal Accountability Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  mode != Terminal ──────────────────────────► Proceed(OperatorEntry)    │
//! │                                                                         │
//! │  mode == Terminal, first match wins:                                    │
//! │   1. TillIn   & (in_drawer | inactive) ─────► TillInAlreadyPerformed    │
//! │   2. TillOut  & not_in_drawer ──────────────► TillOutAlreadyPerformed   │
//! │   3. drawer events & !in_drawer ────────────► TillInRequired            │
//! │   4. safe/bank/count/audit                                              │
//! │        & !(in_drawer | inactive) ───────────► TillInRequired            │
//! │      TillAudit & !in_drawer ────────────────► TillInRequired            │
//! │   5. TillCount, final-settlement policy on                              │
//! │        & !inactive ─────────────────────────► TillReconciliationRequired│
//! │      TillCount, policy off & !in_drawer ────► TillInRequired            │
//! │   6. pending refund & in_drawer                                         │
//! │        & balance - refund < 0 ──────────────► TillInsufficientFund      │
//! │   7. otherwise ─────────────────────────────► Proceed(Automatic(key))   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A blocked event is always recoverable: the operator acknowledges the
//! message and is routed by [`blocked_route`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{
    AccountabilityMode, EventType, TenderBalance, TenderDisplayLine, TillSessionFlags,
    TillWorkflow,
};

// =============================================================================
// Gate Types
// =============================================================================

/// Why an event may not proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    TillInAlreadyPerformed,
    TillOutAlreadyPerformed,
    TillInRequired,
    TillReconciliationRequired,
    TillInsufficientFund,
}

impl BlockReason {
    /// Operator-facing message key.
    pub const fn message_key(&self) -> &'static str {
        match self {
            BlockReason::TillInAlreadyPerformed => "tillInAlreadyPerformed",
            BlockReason::TillOutAlreadyPerformed => "tillOutAlreadyPerformed",
            BlockReason::TillInRequired => "tillInRequired",
            BlockReason::TillReconciliationRequired => "tillReconciliationRequired",
            BlockReason::TillInsufficientFund => "tillInsufficientFund",
        }
    }
}

/// How the drawer key gets validated once the gate passes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum KeyValidation {
    /// The operator scans or enters the drawer key.
    OperatorEntry,
    /// The terminal's fixed key is validated without operator input.
    Automatic(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    Proceed(KeyValidation),
    Blocked(BlockReason),
}

/// Where the operator goes after acknowledging a blocked event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BlockedRoute {
    /// Till and paid detail flows return to store operations.
    StoreOperationsMenu,
    /// Tender exchange voids its tender-control transaction.
    VoidTenderControlTransaction,
    /// Gift-certificate issuance leaves the screen.
    ExitScreen,
    /// Everything else voids the tender that opened the drawer.
    VoidLastOpenDrawerTender,
}

/// Everything the gate looks at.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub event_type: EventType,
    pub mode: AccountabilityMode,
    pub flags: TillSessionFlags,
    pub fixed_drawer_key: Option<&'a str>,
    /// Latest refund or exchange-out line of the transaction, if any.
    pub pending_refund: Option<&'a TenderDisplayLine>,
    pub till_balances: &'a [TenderBalance],
    pub disallow_till_events_after_final_settlement: bool,
}

// =============================================================================
// Gate
// =============================================================================

/// Events that need a till physically in the drawer.
const REQUIRES_IN_DRAWER: [EventType; 6] = [
    EventType::OpenCashDrawer,
    EventType::PaidIn,
    EventType::PaidOut,
    EventType::TillReconciliation,
    EventType::TillOut,
    EventType::TenderExchange,
];

/// Events satisfied by a till in the drawer or an inactive one.
const REQUIRES_ASSIGNED_TILL: [EventType; 5] = [
    EventType::SafeToTill,
    EventType::TillToSafe,
    EventType::TillToBank,
    EventType::TillCount,
    EventType::TillAudit,
];

/// Decides whether `request.event_type` may proceed.
///
/// Outside terminal accountability the operator supplies the drawer key and
/// there is nothing to check up front. A terminal without a fixed key also
/// falls back to operator entry.
pub fn check(request: &GateRequest<'_>) -> GateOutcome {
    if !request.mode.is_terminal() {
        return GateOutcome::Proceed(KeyValidation::OperatorEntry);
    }

    if let Some(reason) = terminal_block_reason(request) {
        return GateOutcome::Blocked(reason);
    }

    match request.fixed_drawer_key {
        Some(key) => GateOutcome::Proceed(KeyValidation::Automatic(key.to_string())),
        None => GateOutcome::Proceed(KeyValidation::OperatorEntry),
    }
}

fn terminal_block_reason(request: &GateRequest<'_>) -> Option<BlockReason> {
    let event = request.event_type;
    let flags = request.flags;

    if event == EventType::TillIn && flags.in_drawer_or_inactive() {
        return Some(BlockReason::TillInAlreadyPerformed);
    }

    if event == EventType::TillOut && flags.not_in_drawer {
        return Some(BlockReason::TillOutAlreadyPerformed);
    }

    if REQUIRES_IN_DRAWER.contains(&event) && !flags.in_drawer {
        return Some(BlockReason::TillInRequired);
    }

    if REQUIRES_ASSIGNED_TILL.contains(&event) {
        if !flags.in_drawer_or_inactive() {
            return Some(BlockReason::TillInRequired);
        }
        // an inactive till cannot be audited
        if event == EventType::TillAudit && !flags.in_drawer {
            return Some(BlockReason::TillInRequired);
        }
    }

    if event == EventType::TillCount {
        if request.disallow_till_events_after_final_settlement {
            if !flags.inactive {
                return Some(BlockReason::TillReconciliationRequired);
            }
        } else if !flags.in_drawer {
            return Some(BlockReason::TillInRequired);
        }
    }

    if let Some(refund) = request.pending_refund {
        if flags.in_drawer && projected_balance(refund, request.till_balances).is_negative() {
            return Some(BlockReason::TillInsufficientFund);
        }
    }

    None
}

/// Till balance of the refund's tender after paying the refund out.
pub fn projected_balance(refund: &TenderDisplayLine, till_balances: &[TenderBalance]) -> Money {
    let balance: Money = till_balances
        .iter()
        .filter(|b| b.tender_id == refund.tender_id)
        .map(|b| b.amount)
        .sum();
    balance - refund.tender_amount.abs()
}

/// Classifies where a blocked workflow goes once acknowledged.
pub fn blocked_route(workflow: TillWorkflow) -> BlockedRoute {
    if workflow.gift_certificate_issue {
        return BlockedRoute::ExitScreen;
    }

    match workflow.event_type {
        EventType::TenderExchange => BlockedRoute::VoidTenderControlTransaction,
        EventType::OpenCashDrawer | EventType::NoSale => BlockedRoute::VoidLastOpenDrawerTender,
        EventType::TillIn
        | EventType::TillOut
        | EventType::TillCount
        | EventType::TillAudit
        | EventType::TillReconciliation
        | EventType::TillToBank
        | EventType::TillToSafe
        | EventType::SafeToTill
        | EventType::PaidIn
        | EventType::PaidOut => BlockedRoute::StoreOperationsMenu,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TenderAuthCategory, TenderLineType};
    use rstest::rstest;

    const IN_DRAWER: TillSessionFlags = TillSessionFlags {
        in_drawer: true,
        inactive: false,
        not_in_drawer: false,
    };
    const INACTIVE: TillSessionFlags = TillSessionFlags {
        in_drawer: false,
        inactive: true,
        not_in_drawer: false,
    };
    const NOT_IN_DRAWER: TillSessionFlags = TillSessionFlags {
        in_drawer: false,
        inactive: false,
        not_in_drawer: true,
    };
    const NO_TILL: TillSessionFlags = TillSessionFlags {
        in_drawer: false,
        inactive: false,
        not_in_drawer: false,
    };

    fn request(event_type: EventType, flags: TillSessionFlags) -> GateRequest<'static> {
        GateRequest {
            event_type,
            mode: AccountabilityMode::Terminal,
            flags,
            fixed_drawer_key: Some("DRAWER-1"),
            pending_refund: None,
            till_balances: &[],
            disallow_till_events_after_final_settlement: false,
        }
    }

    fn automatic() -> GateOutcome {
        GateOutcome::Proceed(KeyValidation::Automatic("DRAWER-1".to_string()))
    }

    fn blocked(reason: BlockReason) -> GateOutcome {
        GateOutcome::Blocked(reason)
    }

    fn all_flag_combinations() -> Vec<TillSessionFlags> {
        let mut combos = Vec::new();
        for bits in 0..8u8 {
            combos.push(TillSessionFlags {
                in_drawer: bits & 1 != 0,
                inactive: bits & 2 != 0,
                not_in_drawer: bits & 4 != 0,
            });
        }
        combos
    }

    #[test]
    fn test_non_terminal_modes_always_pass() {
        for mode in [AccountabilityMode::None, AccountabilityMode::Shared] {
            for event in EventType::ALL {
                for flags in all_flag_combinations() {
                    let mut req = request(event, flags);
                    req.mode = mode;
                    assert_eq!(
                        check(&req),
                        GateOutcome::Proceed(KeyValidation::OperatorEntry),
                        "{mode} {event} {flags:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_till_out_after_till_out_is_blocked_regardless_of_other_flags() {
        for flags in all_flag_combinations().into_iter().filter(|f| f.not_in_drawer) {
            assert_eq!(
                check(&request(EventType::TillOut, flags)),
                blocked(BlockReason::TillOutAlreadyPerformed),
                "{flags:?}"
            );
        }
    }

    #[test]
    fn test_till_in_with_till_out_proceeds_to_automatic_validation() {
        assert_eq!(check(&request(EventType::TillIn, NOT_IN_DRAWER)), automatic());
    }

    #[rstest]
    #[case(EventType::TillIn, IN_DRAWER, blocked(BlockReason::TillInAlreadyPerformed))]
    #[case(EventType::TillIn, INACTIVE, blocked(BlockReason::TillInAlreadyPerformed))]
    #[case(EventType::TillIn, NO_TILL, automatic())]
    #[case(EventType::TillOut, IN_DRAWER, automatic())]
    #[case(EventType::TillOut, INACTIVE, blocked(BlockReason::TillInRequired))]
    #[case(EventType::OpenCashDrawer, NO_TILL, blocked(BlockReason::TillInRequired))]
    #[case(EventType::OpenCashDrawer, INACTIVE, blocked(BlockReason::TillInRequired))]
    #[case(EventType::OpenCashDrawer, IN_DRAWER, automatic())]
    #[case(EventType::PaidIn, NOT_IN_DRAWER, blocked(BlockReason::TillInRequired))]
    #[case(EventType::PaidOut, IN_DRAWER, automatic())]
    #[case(EventType::TillReconciliation, INACTIVE, blocked(BlockReason::TillInRequired))]
    #[case(EventType::TenderExchange, NO_TILL, blocked(BlockReason::TillInRequired))]
    #[case(EventType::SafeToTill, INACTIVE, automatic())]
    #[case(EventType::TillToSafe, NO_TILL, blocked(BlockReason::TillInRequired))]
    #[case(EventType::TillToBank, IN_DRAWER, automatic())]
    #[case(EventType::TillAudit, INACTIVE, blocked(BlockReason::TillInRequired))]
    #[case(EventType::TillAudit, IN_DRAWER, automatic())]
    #[case(EventType::TillCount, NO_TILL, blocked(BlockReason::TillInRequired))]
    #[case(EventType::TillCount, INACTIVE, blocked(BlockReason::TillInRequired))]
    #[case(EventType::TillCount, IN_DRAWER, automatic())]
    #[case(EventType::NoSale, NO_TILL, automatic())]
    fn test_terminal_rules(
        #[case] event: EventType,
        #[case] flags: TillSessionFlags,
        #[case] expected: GateOutcome,
    ) {
        assert_eq!(check(&request(event, flags)), expected);
    }

    #[rstest]
    #[case(IN_DRAWER, blocked(BlockReason::TillReconciliationRequired))]
    #[case(INACTIVE, automatic())]
    #[case(NO_TILL, blocked(BlockReason::TillInRequired))]
    fn test_till_count_after_final_settlement(
        #[case] flags: TillSessionFlags,
        #[case] expected: GateOutcome,
    ) {
        let mut req = request(EventType::TillCount, flags);
        req.disallow_till_events_after_final_settlement = true;
        assert_eq!(check(&req), expected);
    }

    fn refund(amount_cents: i64) -> TenderDisplayLine {
        TenderDisplayLine {
            line_number: 2,
            line_type: TenderLineType::Refund,
            tender_id: "cash".to_string(),
            tender_name: "Cash".to_string(),
            tender_amount: Money::from_cents(amount_cents),
            tender_auth_category: TenderAuthCategory::None,
        }
    }

    #[test]
    fn test_refund_exceeding_till_balance_is_blocked() {
        let balances = vec![
            TenderBalance {
                tender_id: "cash".to_string(),
                amount: Money::from_cents(5_000),
            },
            TenderBalance {
                tender_id: "check".to_string(),
                amount: Money::from_cents(90_000),
            },
        ];
        let large = refund(6_000);
        let small = refund(5_000);

        let mut req = request(EventType::OpenCashDrawer, IN_DRAWER);
        req.till_balances = &balances;

        req.pending_refund = Some(&large);
        assert_eq!(check(&req), blocked(BlockReason::TillInsufficientFund));

        req.pending_refund = Some(&small);
        assert_eq!(check(&req), automatic());
    }

    #[test]
    fn test_refund_balance_ignored_without_till_in_drawer() {
        let large = refund(6_000);
        let mut req = request(EventType::SafeToTill, INACTIVE);
        req.pending_refund = Some(&large);
        assert_eq!(check(&req), automatic());
    }

    #[test]
    fn test_terminal_without_fixed_key_falls_back_to_operator_entry() {
        let mut req = request(EventType::PaidIn, IN_DRAWER);
        req.fixed_drawer_key = None;
        assert_eq!(check(&req), GateOutcome::Proceed(KeyValidation::OperatorEntry));
    }

    #[test]
    fn test_message_keys() {
        assert_eq!(BlockReason::TillInRequired.message_key(), "tillInRequired");
        assert_eq!(
            BlockReason::TillInsufficientFund.message_key(),
            "tillInsufficientFund"
        );
    }

    #[rstest]
    #[case(TillWorkflow::new(EventType::TillIn), BlockedRoute::StoreOperationsMenu)]
    #[case(TillWorkflow::new(EventType::PaidOut), BlockedRoute::StoreOperationsMenu)]
    #[case(TillWorkflow::new(EventType::TenderExchange), BlockedRoute::VoidTenderControlTransaction)]
    #[case(TillWorkflow::new(EventType::OpenCashDrawer), BlockedRoute::VoidLastOpenDrawerTender)]
    #[case(TillWorkflow::new(EventType::NoSale), BlockedRoute::VoidLastOpenDrawerTender)]
    #[case(TillWorkflow::gift_certificate(EventType::OpenCashDrawer), BlockedRoute::ExitScreen)]
    #[case(TillWorkflow::gift_certificate(EventType::TenderExchange), BlockedRoute::ExitScreen)]
    fn test_blocked_route(#[case] workflow: TillWorkflow, #[case] expected: BlockedRoute) {
        assert_eq!(blocked_route(workflow), expected);
    }
}
