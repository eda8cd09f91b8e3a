//! # Recovery Actions
//!
//! Maps each till event to the command that voids its in-flight business
//! transaction, and defines the options offered to the operator when the
//! drawer does not behave.
//!
//! ## Void Registry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  TillIn, TillOut, TillCount,                                            │
//! │  TillAudit, TillReconciliation, TillToBank ──► VoidTillControlTransaction│
//! │  NoSale ─────────────────────────────────────► VoidNoSaleTransaction     │
//! │  PaidIn, PaidOut, SafeToTill,                                           │
//! │  TillToSafe, TenderExchange ─────────────────► VoidTenderControlTransaction│
//! │  OpenCashDrawer ─────────────────────────────► void last drawer tender   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mapping is an exhaustive `match`: a new [`EventType`] variant does not
//! compile until it has a void action.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::types::EventType;

// =============================================================================
// Void Registry
// =============================================================================

/// Business commands that void a whole in-flight transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VoidCommand {
    VoidTillControlTransaction,
    VoidNoSaleTransaction,
    VoidTenderControlTransaction,
}

/// How an event's in-flight work is voided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum VoidAction {
    Transaction(VoidCommand),
    /// Void the tender line that opened the drawer.
    LastOpenDrawerTender,
}

/// The void action registered for `event`.
pub const fn void_action(event: EventType) -> VoidAction {
    match event {
        EventType::TillIn
        | EventType::TillOut
        | EventType::TillCount
        | EventType::TillAudit
        | EventType::TillReconciliation
        | EventType::TillToBank => VoidAction::Transaction(VoidCommand::VoidTillControlTransaction),
        EventType::NoSale => VoidAction::Transaction(VoidCommand::VoidNoSaleTransaction),
        EventType::PaidIn
        | EventType::PaidOut
        | EventType::SafeToTill
        | EventType::TillToSafe
        | EventType::TenderExchange => {
            VoidAction::Transaction(VoidCommand::VoidTenderControlTransaction)
        }
        EventType::OpenCashDrawer => VoidAction::LastOpenDrawerTender,
    }
}

/// The transaction-void command for `event`, if it voids a transaction.
pub const fn void_command(event: EventType) -> Option<VoidCommand> {
    match void_action(event) {
        VoidAction::Transaction(command) => Some(command),
        VoidAction::LastOpenDrawerTender => None,
    }
}

/// Registry lookup by event name, as found in recorded business payloads.
///
/// Fails only for names that are not till events at all.
pub fn void_action_by_name(event_name: &str) -> CoreResult<VoidAction> {
    Ok(void_action(event_name.parse()?))
}

// =============================================================================
// Operator Recovery
// =============================================================================

/// What the operator can answer to a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OperatorChoice {
    Retry,
    SelectDrawer,
    Override,
    Void,
    Acknowledge,
    Cancel,
}

/// One option on a recovery prompt, with the data needed to act on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOption {
    /// Re-send the open request with the same drawer key.
    Retry,
    /// Scan or enter a different drawer key.
    SelectDrawer,
    /// Continue as if the drawer opened.
    Override,
    VoidTender {
        line_number: u32,
        change_line_number: Option<u32>,
    },
    VoidTransaction(VoidCommand),
    /// Confirm the drawer is closed.
    Acknowledge,
    Cancel,
}

impl RecoveryOption {
    pub const fn choice(&self) -> OperatorChoice {
        match self {
            RecoveryOption::Retry => OperatorChoice::Retry,
            RecoveryOption::SelectDrawer => OperatorChoice::SelectDrawer,
            RecoveryOption::Override => OperatorChoice::Override,
            RecoveryOption::VoidTender { .. } | RecoveryOption::VoidTransaction(_) => {
                OperatorChoice::Void
            }
            RecoveryOption::Acknowledge => OperatorChoice::Acknowledge,
            RecoveryOption::Cancel => OperatorChoice::Cancel,
        }
    }
}

/// What went wrong with the drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PromptReason {
    /// The drawer reported closed after an open request.
    DrawerNotOpened,
    /// The drawer reported closed while a close confirmation was pending.
    DrawerClosedUnexpectedly,
}

impl PromptReason {
    pub const fn message_key(&self) -> &'static str {
        match self {
            PromptReason::DrawerNotOpened => "cashDrawerNotOpened",
            PromptReason::DrawerClosedUnexpectedly => "cashDrawerClosed",
        }
    }
}

/// Options presented to the operator after a drawer problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecoveryPrompt {
    pub reason: PromptReason,
    pub options: Vec<RecoveryOption>,
    pub default_choice: Option<OperatorChoice>,
    /// Only prompts offering `Cancel` may be dismissed.
    pub cancelable: bool,
}

impl RecoveryPrompt {
    pub fn new(reason: PromptReason, options: Vec<RecoveryOption>) -> Self {
        let cancelable = options.contains(&RecoveryOption::Cancel);
        RecoveryPrompt {
            reason,
            options,
            default_choice: None,
            cancelable,
        }
    }

    pub fn with_default(mut self, choice: OperatorChoice) -> Self {
        self.default_choice = Some(choice);
        self
    }

    /// The option behind `choice`, if it was offered.
    pub fn option_for(&self, choice: OperatorChoice) -> Option<&RecoveryOption> {
        self.options.iter().find(|o| o.choice() == choice)
    }

    pub fn choices(&self) -> Vec<OperatorChoice> {
        self.options.iter().map(RecoveryOption::choice).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_every_event_has_a_void_action() {
        for event in EventType::ALL {
            let action = void_action(event);
            match event {
                EventType::OpenCashDrawer => {
                    assert_eq!(action, VoidAction::LastOpenDrawerTender)
                }
                _ => assert!(void_command(event).is_some(), "{event} has no void command"),
            }
        }
    }

    #[test]
    fn test_registry_families() {
        assert_eq!(
            void_command(EventType::TillReconciliation),
            Some(VoidCommand::VoidTillControlTransaction)
        );
        assert_eq!(
            void_command(EventType::NoSale),
            Some(VoidCommand::VoidNoSaleTransaction)
        );
        assert_eq!(
            void_command(EventType::TillToSafe),
            Some(VoidCommand::VoidTenderControlTransaction)
        );
        assert_eq!(
            void_command(EventType::TenderExchange),
            Some(VoidCommand::VoidTenderControlTransaction)
        );
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(
            void_action_by_name("paid_out").unwrap(),
            VoidAction::Transaction(VoidCommand::VoidTenderControlTransaction)
        );
        assert!(matches!(
            void_action_by_name("layaway"),
            Err(CoreError::UnknownEventType(_))
        ));
    }

    #[test]
    fn test_prompt_option_lookup() {
        let prompt = RecoveryPrompt::new(
            PromptReason::DrawerNotOpened,
            vec![
                RecoveryOption::Retry,
                RecoveryOption::Override,
                RecoveryOption::VoidTransaction(VoidCommand::VoidNoSaleTransaction),
            ],
        )
        .with_default(OperatorChoice::Override);

        assert!(!prompt.cancelable);
        assert_eq!(prompt.default_choice, Some(OperatorChoice::Override));
        assert_eq!(
            prompt.option_for(OperatorChoice::Void),
            Some(&RecoveryOption::VoidTransaction(
                VoidCommand::VoidNoSaleTransaction
            ))
        );
        assert!(prompt.option_for(OperatorChoice::SelectDrawer).is_none());
        assert_eq!(
            prompt.choices(),
            vec![
                OperatorChoice::Retry,
                OperatorChoice::Override,
                OperatorChoice::Void
            ]
        );
    }

    #[test]
    fn test_cancel_makes_prompt_cancelable() {
        let prompt = RecoveryPrompt::new(
            PromptReason::DrawerNotOpened,
            vec![RecoveryOption::SelectDrawer, RecoveryOption::Cancel],
        );
        assert!(prompt.cancelable);
    }
}
