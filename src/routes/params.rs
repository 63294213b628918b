use std::str::FromStr;

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    domain::ValidationError,
    error::{AppError, AppResult},
};

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Returns `(page, limit, offset)` with page >= 1 and limit in 1..=100.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(limit);
        (page, limit, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::new("order", "Invalid sort order")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
pub enum ProductSortBy {
    CreatedAt,
    Name,
    SalePrice,
    CostPrice,
    Stock,
}

impl FromStr for ProductSortBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(ProductSortBy::CreatedAt),
            "name" => Ok(ProductSortBy::Name),
            "salePrice" => Ok(ProductSortBy::SalePrice),
            "costPrice" => Ok(ProductSortBy::CostPrice),
            "stock" => Ok(ProductSortBy::Stock),
            _ => Err(ValidationError::new("sortBy", "Invalid sort field")),
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductSearchQuery {
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// One of `createdAt`, `name`, `salePrice`, `costPrice`, `stock`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`.
    pub order: Option<String>,
}

impl ProductSearchQuery {
    pub fn sorting(&self) -> AppResult<(ProductSortBy, SortOrder)> {
        let sort_by = match self.sort_by.as_deref() {
            None | Some("") => ProductSortBy::CreatedAt,
            Some(raw) => raw.parse()?,
        };
        let order = match self.order.as_deref() {
            None | Some("") => SortOrder::Desc,
            Some(raw) => raw.parse()?,
        };
        Ok((sort_by, order))
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Only honoured on the admin listing.
    pub status: Option<String>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Parses a path id, rejecting malformed values with `Invalid {what} ID`.
pub fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {what} ID")))
}
