//! # Tender Line Selection
//!
//! Pure functions that pick, out of the current transaction's tender lines,
//! the lines responsible for the drawer opening.
//!
//! ## Selection Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tender lines ──► change_tender() ──┐                                   │
//! │       │                             ▼                                   │
//! │       └──────────────────► open_drawer_tenders(lines, change, defs)     │
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                          last_open_drawer_tender()  (max line number)   │
//! │                                     │                                   │
//! │                                     ▼                                   │
//! │                          is_void_allowed(tender, change, gift flag)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Several tenders on one transaction may each open the drawer, so
//! recovery always evaluates the candidate set rather than a single line.
//! Every caller goes through [`last_open_drawer_tender_in`] so the
//! candidate filter is the same wherever the last tender is needed.

use crate::types::{TenderDefinitions, TenderDisplayLine, TenderLineType};

/// The line returning change to the customer.
///
/// With several change lines the earliest one (lowest line number) wins,
/// independent of list order.
pub fn change_tender(lines: &[TenderDisplayLine]) -> Option<&TenderDisplayLine> {
    lines
        .iter()
        .filter(|l| l.line_type == TenderLineType::Change)
        .min_by_key(|l| l.line_number)
}

/// Payment/refund lines that may have opened the drawer.
///
/// ## Rules
/// 1. The change tender's own type opens the drawer for change lines: the
///    drawer opened for the payment that produced the change, so only the
///    most recent payment or refund line is a candidate.
/// 2. Otherwise every payment or refund line qualifies whose tender matches
///    the change tender, or whose own tender type opens the drawer for its
///    line type.
pub fn open_drawer_tenders<'a>(
    lines: &'a [TenderDisplayLine],
    change: Option<&TenderDisplayLine>,
    definitions: &TenderDefinitions,
) -> Vec<&'a TenderDisplayLine> {
    let payments_and_refunds = lines.iter().filter(|l| l.line_type.is_payment_or_refund());

    if let Some(change) = change {
        if definitions.opens_drawer(&change.tender_id, change.line_type) {
            return payments_and_refunds
                .max_by_key(|l| l.line_number)
                .into_iter()
                .collect();
        }
    }

    payments_and_refunds
        .filter(|l| {
            change.is_some_and(|c| c.tender_id == l.tender_id)
                || definitions.opens_drawer(&l.tender_id, l.line_type)
        })
        .collect()
}

/// The candidate with the highest line number.
pub fn last_open_drawer_tender<'a>(
    candidates: &[&'a TenderDisplayLine],
) -> Option<&'a TenderDisplayLine> {
    candidates.iter().copied().max_by_key(|l| l.line_number)
}

/// Change tender plus last open-drawer tender, computed in one place.
pub fn last_open_drawer_tender_in<'a>(
    lines: &'a [TenderDisplayLine],
    definitions: &TenderDefinitions,
) -> (Option<&'a TenderDisplayLine>, Option<&'a TenderDisplayLine>) {
    let change = change_tender(lines);
    let candidates = open_drawer_tenders(lines, change, definitions);
    (change, last_open_drawer_tender(&candidates))
}

/// Whether a drawer-opening tender can be voided from the recovery prompt.
///
/// Only cash-like tenders qualify: voiding an externally authorized tender
/// here would leave the authorization in place. Gift-certificate issuance
/// has its own recovery path.
pub fn is_void_allowed(
    tender: &TenderDisplayLine,
    change: Option<&TenderDisplayLine>,
    gift_certificate_issue: bool,
) -> bool {
    tender.tender_auth_category.is_none()
        && change.map_or(true, |c| c.tender_auth_category.is_none())
        && !gift_certificate_issue
}

/// The most recent refund or exchange-out line, if one is pending.
pub fn pending_refund_line(lines: &[TenderDisplayLine]) -> Option<&TenderDisplayLine> {
    lines
        .iter()
        .filter(|l| matches!(l.line_type, TenderLineType::Refund | TenderLineType::ExchangeOut))
        .max_by_key(|l| l.line_number)
}

// =============================================================================
// Unit Tests
// =============================================================================
