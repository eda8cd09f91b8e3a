//! # Session Messages
//!
//! What flows into a drawer session (snapshots and operator input) and what
//! comes out of it (directives).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use till_core::{
    AccountabilityMode, BusinessCommand, CashDrawerSessionState, Decision, EventType,
    NavigationIntent, OperatorChoice, OperatorPrompt, TenderBalance, TenderDisplayLine,
    TillSessionFlags, TillWorkflow,
};

// =============================================================================
// Inbound
// =============================================================================

/// Business state observed by the presentation layer.
///
/// One is delivered on every drawer or till state change. `sequence` must
/// increase strictly within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub sequence: u64,
    pub event_type: EventType,
    #[serde(default)]
    pub gift_certificate_issue: bool,
    pub cash_drawer_state: CashDrawerSessionState,
    #[serde(default)]
    pub till_flags: TillSessionFlags,
    #[serde(default)]
    pub accountability_mode: AccountabilityMode,
    #[serde(default)]
    pub tender_display_lines: Vec<TenderDisplayLine>,
    #[serde(default)]
    pub till_balances: Vec<TenderBalance>,
}

impl SessionSnapshot {
    /// A snapshot with no till flags, tender lines or balances.
    pub fn new(sequence: u64, workflow: TillWorkflow, state: CashDrawerSessionState) -> Self {
        SessionSnapshot {
            sequence,
            event_type: workflow.event_type,
            gift_certificate_issue: workflow.gift_certificate_issue,
            cash_drawer_state: state,
            till_flags: TillSessionFlags::default(),
            accountability_mode: AccountabilityMode::default(),
            tender_display_lines: Vec::new(),
            till_balances: Vec::new(),
        }
    }

    pub fn workflow(&self) -> TillWorkflow {
        TillWorkflow {
            event_type: self.event_type,
            gift_certificate_issue: self.gift_certificate_issue,
        }
    }
}

/// Operator response to the prompt on screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionInput {
    Choice(OperatorChoice),
    /// A scanned or typed drawer key.
    DrawerKey(String),
    /// The operator left the screen.
    Exit,
}

// =============================================================================
// Outbound
// =============================================================================

/// One instruction for the presentation or business layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    Command(BusinessCommand),
    Navigate(NavigationIntent),
    Prompt(OperatorPrompt),
    /// Completion of a gift-certificate issue, handed to its own flow
    /// instead of navigating.
    GiftCertificateContinuation(Decision),
}

impl Directive {
    pub fn command(command: impl Into<BusinessCommand>) -> Self {
        Directive::Command(command.into())
    }
}
