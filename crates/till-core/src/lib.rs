//! # till-core: Pure Till-Control Logic for Titan POS
//!
//! This crate decides what a terminal does while a cash drawer is involved
//! in a till event: whether the event may start at all, what a drawer state
//! change means, and which tender or transaction to void when the drawer
//! misbehaves. It never talks to hardware.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Drawer hardware / business layer                     │
//! │      open/closed acknowledgements, till flags, tender lines            │
//! └─────────────────────────────┬───────────────────────────────────────────┘
//!                               │ snapshots
//! ┌─────────────────────────────▼───────────────────────────────────────────┐
//! │                    till-session (orchestration)                         │
//! └─────────────────────────────┬───────────────────────────────────────────┘
//!                               │
//! ┌─────────────────────────────▼───────────────────────────────────────────┐
//! │               ★ till-core (THIS CRATE) ★                                │
//! │                                                                         │
//! │   ┌──────────────┐ ┌───────────────┐ ┌──────────────┐ ┌─────────────┐  │
//! │   │ accountability│ │  coordinator  │ │   tender     │ │  recovery   │  │
//! │   │  pre-flight   │ │ drawer edges  │ │  selection   │ │ void routing│  │
//! │   └──────────────┘ └───────────────┘ └──────────────┘ └─────────────┘  │
//! │                                                                         │
//! │   NO I/O • NO HARDWARE • NO LOGGING • PURE FUNCTIONS                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Drawer states, till flags, tender lines, event types
//! - [`money`] - Integer money for tender amounts and till balances
//! - [`tender`] - Change tender and last open-drawer tender selection
//! - [`accountability`] - Terminal accountability pre-flight gate
//! - [`coordinator`] - Drawer state machine and its decisions
//! - [`recovery`] - Void registry and operator recovery options
//! - [`command`] - Outbound business commands, navigation, prompts
//! - [`validation`] - Drawer key and tender input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::{
//!     AccountabilityMode, CashDrawerSessionState, Decision, DrawerSessionCoordinator,
//!     EventType, TenderDefinitions, TillPolicy, TillWorkflow,
//! };
//!
//! let coordinator = DrawerSessionCoordinator::new(
//!     TillWorkflow::new(EventType::NoSale),
//!     TillPolicy::default(),
//!     TenderDefinitions::default(),
//! );
//!
//! let decision = coordinator.on_state_change(
//!     CashDrawerSessionState::WaitingForOpenDrawerResponse,
//!     CashDrawerSessionState::Open,
//!     AccountabilityMode::Terminal,
//!     &[],
//! );
//! assert_eq!(decision, Decision::ConfirmDrawerClosed);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod accountability;
pub mod command;
pub mod coordinator;
pub mod error;
pub mod money;
pub mod recovery;
pub mod tender;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use accountability::{BlockReason, BlockedRoute, GateOutcome, GateRequest, KeyValidation};
pub use command::{BusinessCommand, NavigationIntent, OperatorPrompt};
pub use coordinator::{decide, Decision, DecisionContext, DrawerSessionCoordinator, SessionEdge};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use recovery::{
    OperatorChoice, PromptReason, RecoveryOption, RecoveryPrompt, VoidAction, VoidCommand,
};
pub use types::*;
