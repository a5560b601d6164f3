//! Discount request/response models and the store-level query types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::discounts;
use crate::error::AggregatorError;

/// Default page size for discount listings
pub const DEFAULT_LIMIT: u64 = 100;
/// Largest page a single listing may return
pub const MAX_LIMIT: u64 = 1000;

/// Normalized discount ready to be inserted; id and timestamps are assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewDiscount {
    pub source: String,
    pub product_name: String,
    pub category: Option<String>,
    pub original_price: Option<f64>,
    pub discount_price: f64,
    pub discount_percentage: Option<f64>,
    pub valid_from: Option<NaiveDateTime>,
    pub valid_until: Option<NaiveDateTime>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Conjunction of predicates; unset predicates are left out of the query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscountFilter {
    pub active_only: bool,
    pub source: Option<String>,
    pub category: Option<String>,
    pub min_discount: Option<f64>,
    /// Case-insensitive substring of the product name
    pub search: Option<String>,
}

impl DiscountFilter {
    pub fn active() -> Self {
        Self {
            active_only: true,
            ..Default::default()
        }
    }
}

/// Listing order. Every variant breaks ties by id ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscountSort {
    /// Highest discount percentage first, records without one last
    #[default]
    Discount,
    /// Cheapest discount price first
    Price,
    /// Most recently collected first
    Newest,
    /// Soonest ending first, open-ended offers last
    Ending,
}

impl std::str::FromStr for DiscountSort {
    type Err = AggregatorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "discount" => Ok(DiscountSort::Discount),
            "price" => Ok(DiscountSort::Price),
            "newest" => Ok(DiscountSort::Newest),
            "ending" => Ok(DiscountSort::Ending),
            other => Err(AggregatorError::InvalidQuery(format!(
                "unknown sort '{}', expected one of discount, price, newest, ending",
                other
            ))),
        }
    }
}

/// Facet fields that can be listed with `distinct_values`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetField {
    Source,
    Category,
}

/// Aggregate statistics over the records matching a filter
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountStats {
    pub total_count: u64,
    pub count_by_source: BTreeMap<String, u64>,
    pub average_discount_percentage: f64,
}

/// Query parameters for GET /api/discounts.
///
/// Numeric parameters arrive as raw strings so that malformed values surface as
/// `InvalidQuery` instead of being dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscountListQuery {
    pub supermarket: Option<String>,
    pub category: Option<String>,
    pub min_discount: Option<String>,
    pub search: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountResponse {
    pub id: i32,
    pub supermarket: String,
    pub product_name: String,
    pub category: Option<String>,
    pub original_price: Option<f64>,
    pub discount_price: f64,
    pub discount_percentage: Option<f64>,
    pub valid_from: Option<NaiveDateTime>,
    pub valid_until: Option<NaiveDateTime>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<discounts::Model> for DiscountResponse {
    fn from(model: discounts::Model) -> Self {
        Self {
            id: model.id,
            supermarket: model.source,
            product_name: model.product_name,
            category: model.category,
            original_price: model.original_price,
            discount_price: model.discount_price,
            discount_percentage: model.discount_percentage,
            valid_from: model.valid_from,
            valid_until: model.valid_until,
            image_url: model.image_url,
            product_url: model.product_url,
            description: model.description,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Response for GET /api/discounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountListResponse {
    pub discounts: Vec<DiscountResponse>,
    /// Count matching the filters before pagination
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupermarketsResponse {
    pub supermarkets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Response for GET /api/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_discounts: u64,
    pub supermarket_counts: BTreeMap<String, u64>,
    pub average_discount_percentage: f64,
}

impl From<DiscountStats> for StatsResponse {
    fn from(stats: DiscountStats) -> Self {
        Self {
            total_discounts: stats.total_count,
            supermarket_counts: stats.count_by_source,
            average_discount_percentage: stats.average_discount_percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
