//! # Outbound Types
//!
//! What the till-control logic asks the outside world to do: business
//! operations to dispatch, screens to navigate to, prompts to show.
//! None of these are executed here.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::accountability::BlockReason;
use crate::recovery::{OperatorChoice, RecoveryPrompt, VoidCommand};
use crate::types::{EventType, ReceiptCategory};

// =============================================================================
// Business Commands
// =============================================================================

/// A business operation for the external layer to dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BusinessCommand {
    StartTillEvent {
        event_type: EventType,
        drawer_key: String,
    },
    ConfirmCashDrawerClosed,
    VoidTillControlTransaction,
    VoidNoSaleTransaction,
    VoidTenderControlTransaction,
    VoidCashDrawerTender {
        line_numbers: Vec<u32>,
    },
    /// The operator overrode the drawer check.
    UserContinueCashDrawerOpen {
        skip_confirm: bool,
    },
    OpenCashDrawer {
        drawer_key: String,
    },
    PrintReceipt {
        category: ReceiptCategory,
    },
}

impl From<VoidCommand> for BusinessCommand {
    fn from(command: VoidCommand) -> Self {
        match command {
            VoidCommand::VoidTillControlTransaction => BusinessCommand::VoidTillControlTransaction,
            VoidCommand::VoidNoSaleTransaction => BusinessCommand::VoidNoSaleTransaction,
            VoidCommand::VoidTenderControlTransaction => {
                BusinessCommand::VoidTenderControlTransaction
            }
        }
    }
}

impl BusinessCommand {
    /// Voids the drawer tender line and, when present, its change line.
    pub fn void_cash_drawer_tender(line_number: u32, change_line_number: Option<u32>) -> Self {
        let mut line_numbers = vec![line_number];
        line_numbers.extend(change_line_number);
        BusinessCommand::VoidCashDrawerTender { line_numbers }
    }

    /// True for commands that end the workflow by voiding it.
    pub fn is_void(&self) -> bool {
        matches!(
            self,
            BusinessCommand::VoidTillControlTransaction
                | BusinessCommand::VoidNoSaleTransaction
                | BusinessCommand::VoidTenderControlTransaction
                | BusinessCommand::VoidCashDrawerTender { .. }
        )
    }
}

// =============================================================================
// Navigation
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NavigationIntent {
    ToDetailScreen(EventType),
    ToReceiptScreen(ReceiptCategory),
    ToStoreOperationsMenu,
    ExitScreen,
}

// =============================================================================
// Operator Prompts
// =============================================================================

/// A modal prompt. Keys are resolved to text by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OperatorPrompt {
    pub title_key: String,
    pub message_key: String,
    pub options: Vec<OperatorChoice>,
    pub default_choice: Option<OperatorChoice>,
    pub cancelable: bool,
}

impl OperatorPrompt {
    /// Drawer recovery prompt.
    pub fn recovery(prompt: &RecoveryPrompt) -> Self {
        OperatorPrompt {
            title_key: "cashDrawer".to_string(),
            message_key: prompt.reason.message_key().to_string(),
            options: prompt.choices(),
            default_choice: prompt.default_choice,
            cancelable: prompt.cancelable,
        }
    }

    /// Accountability block; acknowledging is the only way out.
    pub fn blocked(reason: BlockReason) -> Self {
        OperatorPrompt {
            title_key: "tillControl".to_string(),
            message_key: reason.message_key().to_string(),
            options: vec![OperatorChoice::Acknowledge],
            default_choice: Some(OperatorChoice::Acknowledge),
            cancelable: false,
        }
    }

    /// Asks for a drawer key to be scanned or typed.
    pub fn drawer_key_entry() -> Self {
        OperatorPrompt {
            title_key: "cashDrawer".to_string(),
            message_key: "scanDrawerKey".to_string(),
            options: vec![OperatorChoice::Cancel],
            default_choice: None,
            cancelable: true,
        }
    }
}
