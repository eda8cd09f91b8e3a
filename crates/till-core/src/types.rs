//! # Domain Types
//!
//! Core domain types shared by every till-control component.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Hardware-reported            Business-reported        Configuration    │
//! │  ─────────────────            ─────────────────        ─────────────    │
//! │  CashDrawerSessionState       TillSessionFlags         AccountabilityMode│
//! │   NoCashDrawer                 in_drawer               TenderDefinitions│
//! │   Closed / Open                inactive                TillPolicy       │
//! │   WaitingForOpen...            not_in_drawer                            │
//! │   WaitingForClosed...         TenderDisplayLine[]                       │
//! │                               TenderBalance[]                           │
//! │                                                                         │
//! │  Fixed per workflow activation: TillWorkflow { event_type, gift flag }  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Cash Drawer Session State
// =============================================================================

/// Hardware-reported lifecycle of the physical drawer.
///
/// The coordinator never assigns this state. It only reads snapshots
/// delivered by the hardware layer, and only the change between two
/// consecutive snapshots carries meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CashDrawerSessionState {
    /// No drawer is attached to this terminal.
    NoCashDrawer,
    Closed,
    Open,
    /// An open request was sent; the drawer has not answered yet.
    WaitingForOpenDrawerResponse,
    /// A confirm-closed request was sent; the drawer has not answered yet.
    WaitingForDrawerClosedResponse,
}

impl CashDrawerSessionState {
    /// Every state, for exhaustive transition checks.
    pub const ALL: [CashDrawerSessionState; 5] = [
        CashDrawerSessionState::NoCashDrawer,
        CashDrawerSessionState::Closed,
        CashDrawerSessionState::Open,
        CashDrawerSessionState::WaitingForOpenDrawerResponse,
        CashDrawerSessionState::WaitingForDrawerClosedResponse,
    ];
}

// =============================================================================
// Till Session Flags
// =============================================================================

/// Whether an accountable till is associated with the physical drawer.
///
/// Set by business-logic responses to till events; read-only here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TillSessionFlags {
    /// A till has been counted into the drawer.
    pub in_drawer: bool,
    /// A till is assigned but currently inactive (e.g. finally settled).
    pub inactive: bool,
    /// The till has been taken out of the drawer.
    pub not_in_drawer: bool,
}

impl TillSessionFlags {
    /// True when a till is in the drawer or merely inactive.
    #[inline]
    pub const fn in_drawer_or_inactive(&self) -> bool {
        self.in_drawer || self.inactive
    }
}

// =============================================================================
// Accountability Mode
// =============================================================================

/// Store policy for how drawer custody is assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AccountabilityMode {
    /// No accountability; the operator still scans a drawer key.
    #[default]
    None,
    /// Drawers are shared between operators; the key is scanned.
    Shared,
    /// The drawer key is fixed for the terminal and validated automatically.
    Terminal,
}

impl AccountabilityMode {
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, AccountabilityMode::Terminal)
    }
}

impl fmt::Display for AccountabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountabilityMode::None => write!(f, "none"),
            AccountabilityMode::Shared => write!(f, "shared"),
            AccountabilityMode::Terminal => write!(f, "terminal"),
        }
    }
}

// =============================================================================
// Tender Lines
// =============================================================================

/// Kind of tender line on the current transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TenderLineType {
    Payment,
    Refund,
    /// Change handed back to the customer.
    Change,
    /// Cash given out during a tender exchange.
    ExchangeOut,
}

impl TenderLineType {
    /// Payment and refund lines are the ones that open the drawer.
    #[inline]
    pub const fn is_payment_or_refund(&self) -> bool {
        matches!(self, TenderLineType::Payment | TenderLineType::Refund)
    }
}

/// External authorization behind a tender.
///
/// Anything other than `None` was authorized by a third party and cannot
/// be voided here without reversing that authorization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TenderAuthCategory {
    /// Cash-like; nothing to reverse.
    #[default]
    None,
    CreditCard,
    DebitCard,
    GiftCard,
    StoredValueCertificate,
    Loyalty,
}

impl TenderAuthCategory {
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, TenderAuthCategory::None)
    }
}

/// Read-only projection of one payment/refund/change line.
///
/// `line_number` reflects creation order: "last" means maximum line number,
/// never position in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenderDisplayLine {
    pub line_number: u32,
    pub line_type: TenderLineType,
    pub tender_id: String,
    pub tender_name: String,
    pub tender_amount: Money,
    #[serde(default)]
    pub tender_auth_category: TenderAuthCategory,
}

/// Balance of one tender held by the till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TenderBalance {
    pub tender_id: String,
    pub amount: Money,
}

// =============================================================================
// Tender Definitions
// =============================================================================

/// Store configuration for one tender type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderDefinition {
    pub tender_id: String,
    #[serde(default)]
    pub tender_name: String,
    /// Line types for which this tender pops the drawer.
    #[serde(default)]
    pub opens_drawer_for: Vec<TenderLineType>,
}

impl TenderDefinition {
    pub fn new(
        tender_id: impl Into<String>,
        tender_name: impl Into<String>,
        opens_drawer_for: impl IntoIterator<Item = TenderLineType>,
    ) -> Self {
        TenderDefinition {
            tender_id: tender_id.into(),
            tender_name: tender_name.into(),
            opens_drawer_for: opens_drawer_for.into_iter().collect(),
        }
    }
}

/// The configured tender definitions of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenderDefinitions(Vec<TenderDefinition>);

impl TenderDefinitions {
    pub fn get(&self, tender_id: &str) -> Option<&TenderDefinition> {
        self.0.iter().find(|d| d.tender_id == tender_id)
    }

    /// Whether `tender_id` opens the drawer for lines of `line_type`.
    ///
    /// Unknown tenders never open the drawer.
    pub fn opens_drawer(&self, tender_id: &str, line_type: TenderLineType) -> bool {
        self.get(tender_id)
            .is_some_and(|d| d.opens_drawer_for.contains(&line_type))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TenderDefinition> {
        self.0.iter()
    }
}

impl FromIterator<TenderDefinition> for TenderDefinitions {
    fn from_iter<I: IntoIterator<Item = TenderDefinition>>(iter: I) -> Self {
        TenderDefinitions(iter.into_iter().collect())
    }
}

// =============================================================================
// Event Type
// =============================================================================

/// Till-control event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    TillIn,
    TillOut,
    TillCount,
    TillAudit,
    TillReconciliation,
    TillToBank,
    TillToSafe,
    SafeToTill,
    PaidIn,
    PaidOut,
    NoSale,
    OpenCashDrawer,
    TenderExchange,
}

impl EventType {
    pub const ALL: [EventType; 13] = [
        EventType::TillIn,
        EventType::TillOut,
        EventType::TillCount,
        EventType::TillAudit,
        EventType::TillReconciliation,
        EventType::TillToBank,
        EventType::TillToSafe,
        EventType::SafeToTill,
        EventType::PaidIn,
        EventType::PaidOut,
        EventType::NoSale,
        EventType::OpenCashDrawer,
        EventType::TenderExchange,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::TillIn => "till_in",
            EventType::TillOut => "till_out",
            EventType::TillCount => "till_count",
            EventType::TillAudit => "till_audit",
            EventType::TillReconciliation => "till_reconciliation",
            EventType::TillToBank => "till_to_bank",
            EventType::TillToSafe => "till_to_safe",
            EventType::SafeToTill => "safe_to_till",
            EventType::PaidIn => "paid_in",
            EventType::PaidOut => "paid_out",
            EventType::NoSale => "no_sale",
            EventType::OpenCashDrawer => "open_cash_drawer",
            EventType::TenderExchange => "tender_exchange",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `till_in`, `till-in`, `TillIn` and `tillIn` spellings.
impl FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        EventType::ALL
            .into_iter()
            .find(|e| e.as_str().replace('_', "") == normalized)
            .ok_or_else(|| CoreError::UnknownEventType(s.to_string()))
    }
}

// =============================================================================
// Workflow
// =============================================================================

/// The event a coordinator instance was activated for.
///
/// Fixed at construction; it never changes mid-session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TillWorkflow {
    pub event_type: EventType,
    /// The drawer opened while issuing a gift certificate.
    #[serde(default)]
    pub gift_certificate_issue: bool,
}

impl TillWorkflow {
    pub const fn new(event_type: EventType) -> Self {
        TillWorkflow {
            event_type,
            gift_certificate_issue: false,
        }
    }

    pub const fn gift_certificate(event_type: EventType) -> Self {
        TillWorkflow {
            event_type,
            gift_certificate_issue: true,
        }
    }
}

// =============================================================================
// Policy & Receipts
// =============================================================================

/// Store-configured till policy switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TillPolicy {
    /// Till events other than reconciliation are refused after final
    /// settlement until the till is reconciled.
    #[serde(default)]
    pub disallow_till_events_after_final_settlement: bool,
    /// A no-sale must go through the receipt form instead of printing
    /// directly.
    #[serde(default)]
    pub print_no_sale_receipt_required: bool,
    /// The locale prints VAT receipts.
    #[serde(default)]
    pub vat_receipt: bool,
}

impl TillPolicy {
    /// Receipt category for a completed open-cash-drawer event.
    pub const fn open_drawer_receipt(&self) -> ReceiptCategory {
        if self.vat_receipt {
            ReceiptCategory::VatReceipt
        } else {
            ReceiptCategory::Receipt
        }
    }
}

/// Which receipt the completion screen produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptCategory {
    Receipt,
    VatReceipt,
    TenderExchange,
    NoSale,
}

// =============================================================================
// Unit Tests
// =============================================================================
