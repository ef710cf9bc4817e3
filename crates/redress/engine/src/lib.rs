//! Redress Engine - the flag remediation workflow state machine
//!
//! The engine owns the Flag and ResolutionRecord lifecycle:
//!
//! ```text
//! OPEN ──start──▶ IN_REMEDIATION ──submit──▶ PENDING_VERIFICATION ──approve──▶ CLOSED
//!   │                   ▲                           │
//!   │                   └────────── reject ─────────┘
//!   └──────────────── override ──▶ CLOSED_ACCEPTED_RISK
//! ```
//!
//! Warn-severity flags skip `PENDING_VERIFICATION`: submission auto-approves
//! and closes them. Every write-bearing action executes its precondition
//! reads, policy checks, row writes, and audit emission inside one critical
//! section of the store - the losing side of a race observes the committed
//! state and fails its own precondition instead of corrupting rows.

#![deny(unsafe_code)]

mod error;
mod evidence;
mod gate;
mod machine;
mod store;
mod tasks;

pub use error::WorkflowError;
pub use gate::VerificationGate;
pub use machine::{RemediationEngine, StartOutcome, StartRemediationParams};
pub use store::{FlagDetail, WorkflowStore};
