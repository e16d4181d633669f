//! Order snapshots and their lifecycle.
//!
//! ```text
//!            request_cancel            approve_cancel
//! PENDING ─────────────────┐     ┌──────────────────> CANCELLED
//! PAID    ─────────────────┴──> CANCEL_REQUESTED
//!    ^                               │
//!    └──────── reject_cancel ────────┘
//! ```
//!
//! `force_set_status` is a separate admin escape hatch outside this table.

mod lifecycle;
mod order;
mod reason;
mod service;

pub use order::{Order, OrderLine, OrderStatus};
pub use reason::{CancelReason, ReasonPreset, MIN_REASON_CHARS};
pub use service::OrderService;
