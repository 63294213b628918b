//! Cart line arithmetic.
//!
//! Every function here works on an in-memory list of [`CartLine`]s; the cart
//! service loads the lines under a row lock, applies one [`CartAction`] and
//! writes the result back together with [`total`] in the same transaction.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Add,
    Increase,
    Decrease,
    Remove,
}

impl FromStr for CartAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(CartAction::Add),
            "increase" => Ok(CartAction::Increase),
            "decrease" => Ok(CartAction::Decrease),
            "remove" => Ok(CartAction::Remove),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    /// Unit price snapshot taken when the line was created.
    pub price: i64,
    pub quantity: i32,
}

impl CartLine {
    /// `None` when price × quantity does not fit in an `i64`.
    pub fn subtotal(&self) -> Option<i64> {
        self.price.checked_mul(i64::from(self.quantity))
    }
}

/// The live catalog figures a cart mutation is checked against.
#[derive(Debug, Clone, Copy)]
pub struct StockView {
    pub product_id: Uuid,
    pub sale_price: i64,
    pub stock: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Only {available} units available")]
    InsufficientStock { available: i32 },

    #[error("Product not in cart")]
    ItemNotInCart,

    #[error("Cart total is too large")]
    TotalOverflow,
}

/// Applies `action` to `lines`. On error `lines` is left untouched.
pub fn apply_action(
    lines: &mut Vec<CartLine>,
    product: &StockView,
    action: CartAction,
    quantity: i32,
) -> Result<(), CartError> {
    let index = lines
        .iter()
        .position(|line| line.product_id == product.product_id);

    match (action, index) {
        (CartAction::Add, _) if quantity < 1 => Err(CartError::InvalidQuantity),
        (CartAction::Add, None) => {
            ensure_within_stock(quantity, product.stock)?;
            lines.push(CartLine {
                product_id: product.product_id,
                price: product.sale_price,
                quantity,
            });
            Ok(())
        }
        (CartAction::Add, Some(i)) => {
            let next = lines[i]
                .quantity
                .checked_add(quantity)
                .ok_or(CartError::InsufficientStock {
                    available: product.stock,
                })?;
            ensure_within_stock(next, product.stock)?;
            lines[i].quantity = next;
            Ok(())
        }
        (CartAction::Increase, Some(i)) => {
            let next = lines[i]
                .quantity
                .checked_add(1)
                .ok_or(CartError::InsufficientStock {
                    available: product.stock,
                })?;
            ensure_within_stock(next, product.stock)?;
            lines[i].quantity = next;
            Ok(())
        }
        (CartAction::Decrease, Some(i)) => {
            if lines[i].quantity <= 1 {
                lines.remove(i);
            } else {
                lines[i].quantity -= 1;
            }
            Ok(())
        }
        (CartAction::Remove, Some(i)) => {
            lines.remove(i);
            Ok(())
        }
        (CartAction::Increase | CartAction::Decrease | CartAction::Remove, None) => {
            Err(CartError::ItemNotInCart)
        }
    }
}

pub fn total(lines: &[CartLine]) -> Result<i64, CartError> {
    lines.iter().try_fold(0_i64, |acc, line| {
        line.subtotal()
            .and_then(|subtotal| acc.checked_add(subtotal))
            .ok_or(CartError::TotalOverflow)
    })
}

fn ensure_within_stock(quantity: i32, stock: i32) -> Result<(), CartError> {
    if quantity > stock {
        return Err(CartError::InsufficientStock {
            available: stock.max(0),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, stock: i32) -> StockView {
        StockView {
            product_id: Uuid::new_v4(),
            sale_price: price,
            stock,
        }
    }

    #[test]
    fn add_creates_line_with_price_snapshot() {
        let p = product(10, 5);
        let mut lines = Vec::new();
        apply_action(&mut lines, &p, CartAction::Add, 2).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].price, 10);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(total(&lines).unwrap(), 20);
    }

    #[test]
    fn add_existing_increments_and_keeps_original_price() {
        let mut p = product(10, 5);
        let mut lines = Vec::new();
        apply_action(&mut lines, &p, CartAction::Add, 1).unwrap();

        p.sale_price = 99;
        apply_action(&mut lines, &p, CartAction::Add, 2).unwrap();

        assert_eq!(lines[0].quantity, 3);
        assert_eq!(lines[0].price, 10);
        assert_eq!(total(&lines).unwrap(), 30);
    }

    #[test]
    fn add_beyond_stock_leaves_cart_unchanged() {
        let p = product(10, 3);
        let mut lines = Vec::new();
        apply_action(&mut lines, &p, CartAction::Add, 2).unwrap();
        let before = lines.clone();

        let err = apply_action(&mut lines, &p, CartAction::Add, 2).unwrap_err();
        assert_eq!(err, CartError::InsufficientStock { available: 3 });
        assert_eq!(lines, before);

        let mut empty = Vec::new();
        let err = apply_action(&mut empty, &p, CartAction::Add, 4).unwrap_err();
        assert_eq!(err, CartError::InsufficientStock { available: 3 });
        assert!(empty.is_empty());
    }

    #[test]
    fn add_rejects_non_positive_quantity() {
        let p = product(10, 3);
        let mut lines = Vec::new();
        assert_eq!(
            apply_action(&mut lines, &p, CartAction::Add, 0),
            Err(CartError::InvalidQuantity)
        );
        assert!(lines.is_empty());
    }

    #[test]
    fn increase_stops_at_stock_ceiling() {
        let p = product(7, 2);
        let mut lines = Vec::new();
        apply_action(&mut lines, &p, CartAction::Add, 1).unwrap();
        apply_action(&mut lines, &p, CartAction::Increase, 1).unwrap();
        assert_eq!(lines[0].quantity, 2);

        let err = apply_action(&mut lines, &p, CartAction::Increase, 1).unwrap_err();
        assert_eq!(err, CartError::InsufficientStock { available: 2 });
        assert_eq!(lines[0].quantity, 2);
    }

    #[test]
    fn decrease_on_single_unit_removes_line() {
        let p = product(7, 5);
        let mut lines = Vec::new();
        apply_action(&mut lines, &p, CartAction::Add, 2).unwrap();
        apply_action(&mut lines, &p, CartAction::Decrease, 1).unwrap();
        assert_eq!(lines[0].quantity, 1);

        apply_action(&mut lines, &p, CartAction::Decrease, 1).unwrap();
        assert!(lines.is_empty());
        assert_eq!(total(&lines).unwrap(), 0);
    }

    #[test]
    fn actions_on_missing_item_fail() {
        let p = product(7, 5);
        let mut lines = Vec::new();
        for action in [CartAction::Increase, CartAction::Decrease, CartAction::Remove] {
            assert_eq!(
                apply_action(&mut lines, &p, action, 1),
                Err(CartError::ItemNotInCart)
            );
        }
    }

    #[test]
    fn repeated_remove_reports_missing_item() {
        let p = product(7, 5);
        let mut lines = Vec::new();
        apply_action(&mut lines, &p, CartAction::Add, 1).unwrap();
        apply_action(&mut lines, &p, CartAction::Remove, 1).unwrap();
        assert_eq!(
            apply_action(&mut lines, &p, CartAction::Remove, 1),
            Err(CartError::ItemNotInCart)
        );
    }

    #[test]
    fn total_tracks_every_mutation() {
        let a = product(10, 10);
        let b = product(5, 10);
        let mut lines = Vec::new();
        let steps = [
            (&a, CartAction::Add, 2),
            (&b, CartAction::Add, 1),
            (&a, CartAction::Increase, 1),
            (&b, CartAction::Add, 3),
            (&a, CartAction::Decrease, 1),
            (&b, CartAction::Remove, 1),
            (&b, CartAction::Add, 1),
        ];
        for (p, action, qty) in steps {
            apply_action(&mut lines, p, action, qty).unwrap();
            let expected: i64 = lines.iter().map(|l| l.price * l.quantity as i64).sum();
            assert_eq!(total(&lines).unwrap(), expected);
            assert!(lines.iter().all(|l| l.quantity >= 1));
        }
        assert_eq!(total(&lines).unwrap(), 25);
    }

    #[test]
    fn total_reports_overflow_instead_of_wrapping() {
        let p = product(i64::MAX / 2, 10);
        let mut lines = Vec::new();
        apply_action(&mut lines, &p, CartAction::Add, 3).unwrap();
        assert_eq!(total(&lines), Err(CartError::TotalOverflow));

        let q = product(i64::MAX / 2, 10);
        let mut pair = Vec::new();
        apply_action(&mut pair, &p, CartAction::Add, 1).unwrap();
        apply_action(&mut pair, &q, CartAction::Add, 1).unwrap();
        assert_eq!(total(&pair), Ok(i64::MAX / 2 * 2));
        apply_action(&mut pair, &q, CartAction::Increase, 1).unwrap();
        assert_eq!(total(&pair), Err(CartError::TotalOverflow));
    }

    #[test]
    fn parses_action_names() {
        assert_eq!("add".parse::<CartAction>(), Ok(CartAction::Add));
        assert_eq!("remove".parse::<CartAction>(), Ok(CartAction::Remove));
        assert!("clear".parse::<CartAction>().is_err());
    }
}
