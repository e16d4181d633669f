//! Guarded status transitions.
//!
//! These are the local half of each transition: they check the guard and
//! apply the change to a snapshot. The dashboard runs them as optimistic
//! updaters; the order service runs the guards before any network call.

use super::order::{Order, OrderStatus};
use super::reason::CancelReason;
use crate::session::Actor;
use crate::CommerceError;
use chrono::{DateTime, Utc};
use tracing::warn;

impl Order {
    fn invalid(&self, action: &'static str) -> CommerceError {
        CommerceError::InvalidState {
            action,
            status: self.status.as_str().to_string(),
        }
    }

    /// Guard for [`Order::request_cancel`].
    pub fn ensure_can_request_cancel(&self) -> Result<(), CommerceError> {
        if self.status.can_request_cancel() {
            Ok(())
        } else {
            Err(self.invalid("request cancellation of"))
        }
    }

    /// PENDING | PAID -> CANCEL_REQUESTED.
    pub fn request_cancel(&mut self, reason: &CancelReason, at: DateTime<Utc>) -> Result<(), CommerceError> {
        self.ensure_can_request_cancel()?;
        self.pre_cancel_status = Some(self.status);
        self.status = OrderStatus::CancelRequested;
        self.cancel_reason = Some(reason.as_str().to_string());
        self.cancel_requested_at = Some(at);
        Ok(())
    }

    /// Guard shared by approve and reject.
    pub fn ensure_cancel_pending(&self, action: &'static str) -> Result<(), CommerceError> {
        if self.is_cancel_pending() {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    /// CANCEL_REQUESTED -> CANCELLED. Admin only.
    pub fn approve_cancel(&mut self, actor: &Actor, at: DateTime<Utc>) -> Result<(), CommerceError> {
        actor.require_admin("approving a cancellation")?;
        self.ensure_cancel_pending("approve cancellation of")?;
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(at);
        Ok(())
    }

    /// CANCEL_REQUESTED -> the status held before the request. Admin only.
    ///
    /// Falls back to PENDING when no prior status was recorded.
    pub fn reject_cancel(&mut self, actor: &Actor) -> Result<(), CommerceError> {
        actor.require_admin("rejecting a cancellation")?;
        self.ensure_cancel_pending("reject cancellation of")?;
        self.status = self
            .pre_cancel_status
            .take()
            .filter(OrderStatus::can_request_cancel)
            .unwrap_or(OrderStatus::Pending);
        self.cancel_reason = None;
        self.cancel_requested_at = None;
        Ok(())
    }

    /// Admin override outside the transition table.
    ///
    /// Only PENDING, PAID and DELIVERED may be set this way, and a cancelled
    /// order stays cancelled. Nothing is audited beyond the log line.
    pub fn force_set_status(&mut self, actor: &Actor, status: OrderStatus) -> Result<(), CommerceError> {
        actor.require_admin("setting an order status")?;
        Self::ensure_forceable(status)?;
        if self.status.is_terminal() {
            return Err(self.invalid("change the status of"));
        }
        warn!(
            order_id = %self.id,
            admin_id = %actor.user_id,
            from = %self.status,
            to = %status,
            "Forcing order status"
        );
        if self.status == OrderStatus::CancelRequested {
            self.pre_cancel_status = None;
            self.cancel_reason = None;
            self.cancel_requested_at = None;
        }
        self.status = status;
        Ok(())
    }

    /// Targets reachable through [`Order::force_set_status`].
    pub fn ensure_forceable(status: OrderStatus) -> Result<(), CommerceError> {
        match status {
            OrderStatus::Pending | OrderStatus::Paid | OrderStatus::Delivered => Ok(()),
            other => Err(CommerceError::Validation(format!(
                "{} can only be reached through the cancellation workflow",
                other
            ))),
        }
    }
}
