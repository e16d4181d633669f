//! Order types.

use crate::cart::CartLine;
use crate::ids::{OrderId, ProductId, UserId};
use crate::money::Money;
use crate::session::CustomerContact;
use crate::CommerceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, not yet paid.
    #[default]
    Pending,
    /// Payment received.
    Paid,
    /// Handed to the customer.
    Delivered,
    /// Customer asked to cancel; waiting on an admin.
    CancelRequested,
    /// Cancelled. Terminal.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Delivered,
        OrderStatus::CancelRequested,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::CancelRequested => "CANCEL_REQUESTED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Paid => "Paid",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::CancelRequested => "Cancel requested",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Check if order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled)
    }

    /// Check if a customer may ask to cancel from this state.
    pub fn can_request_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Paid)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CommerceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| CommerceError::Validation(format!("unknown order status: {}", s)))
    }
}

/// One product's entry in a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Unit price charged.
    pub unit_price: Money,
    pub line_total: Money,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.final_unit_price,
            line_total: line.line_total,
        }
    }
}

/// A placed order as mirrored from the order service.
///
/// `lines` and `total_amount` never change after creation; only the status
/// and the cancel fields move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub lines: Vec<OrderLine>,
    pub total_amount: Money,
    pub status: OrderStatus,
    /// Status held when the cancellation was requested.
    #[serde(default)]
    pub pre_cancel_status: Option<OrderStatus>,
    #[serde(default)]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub cancel_requested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer: CustomerContact,
}

impl Order {
    /// A fresh PENDING order with no cancel history.
    pub fn new(id: impl Into<OrderId>, user_id: impl Into<UserId>, lines: Vec<OrderLine>) -> Self {
        let total_amount = lines.iter().map(|l| l.line_total).sum();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            lines,
            total_amount,
            status: OrderStatus::Pending,
            pre_cancel_status: None,
            cancel_reason: None,
            cancel_requested_at: None,
            cancelled_at: None,
            created_at: None,
            customer: CustomerContact::default(),
        }
    }

    /// Get total item count.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn is_cancel_pending(&self) -> bool {
        self.status == OrderStatus::CancelRequested
    }
}
