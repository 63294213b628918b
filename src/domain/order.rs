//! Order status machine and cart-to-order snapshotting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::cart::{self, CartLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(OrderError::InvalidStatus)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("No cart exists")]
    NoCartExists,

    #[error("No products in cart")]
    EmptyCart,

    #[error("Invalid status")]
    InvalidStatus,

    #[error("Order already cancelled")]
    AlreadyCancelled,

    #[error("Order cannot be cancelled after shipping")]
    CancellationWindowClosed,

    #[error("Order total is too large")]
    TotalOverflow,
}

/// Checks whether an order in `status` may still be cancelled by its owner
/// or an admin.
pub fn ensure_cancellable(status: OrderStatus) -> Result<(), OrderError> {
    match status {
        OrderStatus::Cancelled => Err(OrderError::AlreadyCancelled),
        OrderStatus::Shipped | OrderStatus::Delivered => Err(OrderError::CancellationWindowClosed),
        OrderStatus::Pending | OrderStatus::Processing => Ok(()),
    }
}

/// Owned copy of a cart taken at placement time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSnapshot {
    pub items: Vec<CartLine>,
    pub total_amount: i64,
}

pub fn snapshot_cart(lines: &[CartLine]) -> Result<OrderSnapshot, OrderError> {
    if lines.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    Ok(OrderSnapshot {
        items: lines.to_vec(),
        total_amount: cart::total(lines).map_err(|_| OrderError::TotalOverflow)?,
    })
}
