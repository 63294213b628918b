use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{ValidationError, require_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Category {
    #[serde(rename = "electronics")]
    Electronics,
    #[serde(rename = "fashion")]
    Fashion,
    #[serde(rename = "dairy")]
    Dairy,
    #[serde(rename = "technology")]
    Technology,
    #[serde(rename = "home appliances")]
    HomeAppliances,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Electronics,
        Category::Fashion,
        Category::Dairy,
        Category::Technology,
        Category::HomeAppliances,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electronics => "electronics",
            Category::Fashion => "fashion",
            Category::Dairy => "dairy",
            Category::Technology => "technology",
            Category::HomeAppliances => "home appliances",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ValidationError::new("category", format!("{s} is not a valid category")))
    }
}

/// The fields of a product that carry invariants, after any partial update
/// has been merged in.
#[derive(Debug, Clone)]
pub struct ProductDraft<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub cost_price: i64,
    pub sale_price: i64,
    pub stock: i32,
}

pub fn validate_product(draft: &ProductDraft<'_>) -> Result<(), ValidationError> {
    require_text("name", draft.name)?;
    require_text("description", draft.description)?;
    if draft.cost_price < 0 {
        return Err(ValidationError::new("costPrice", "Cost price cannot be negative"));
    }
    if draft.sale_price < 0 {
        return Err(ValidationError::new("salePrice", "Sale price cannot be negative"));
    }
    if draft.sale_price > draft.cost_price {
        return Err(ValidationError::new(
            "salePrice",
            "Sale price must be equal or lesser than cost price",
        ));
    }
    validate_stock(draft.stock)
}

pub fn validate_stock(stock: i32) -> Result<(), ValidationError> {
    if stock < 0 {
        return Err(ValidationError::new("stock", "Stock cannot be negative"));
    }
    Ok(())
}
