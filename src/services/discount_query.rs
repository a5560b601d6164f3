//! Discount query service
//!
//! Translates caller-supplied primitive parameters into store filters, sorts and
//! pagination. Reads only from the store.

use crate::error::{AggregatorError, Result};
use crate::models::discount::{
    CategoriesResponse, DEFAULT_LIMIT, DiscountFilter, DiscountListQuery, DiscountListResponse,
    DiscountResponse, DiscountSort, FacetField, MAX_LIMIT, StatsResponse, SupermarketsResponse,
};
use crate::services::discount_store::DiscountStore;

#[derive(Clone)]
pub struct DiscountQueryService {
    store: DiscountStore,
}

/// Validated form of `DiscountListQuery`
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
    pub filter: DiscountFilter,
    pub sort: DiscountSort,
    pub limit: u64,
    pub offset: u64,
}

impl DiscountListQuery {
    /// Validate and convert into a store request. Listings always restrict to active records.
    pub fn validate(&self) -> Result<ListRequest> {
        let min_discount = match present(&self.min_discount) {
            None => None,
            Some(raw) => {
                let value = raw.parse::<f64>().map_err(|_| {
                    AggregatorError::InvalidQuery(format!("min_discount must be a number, got '{}'", raw))
                })?;
                if !value.is_finite() {
                    return Err(AggregatorError::InvalidQuery(
                        "min_discount must be a finite number".to_string(),
                    ));
                }
                Some(value)
            }
        };

        let limit = match present(&self.limit) {
            None => DEFAULT_LIMIT,
            Some(raw) => {
                let limit = parse_non_negative("limit", raw)?;
                if limit < 1 {
                    return Err(AggregatorError::InvalidQuery("limit must be at least 1".to_string()));
                }
                if limit > MAX_LIMIT {
                    return Err(AggregatorError::InvalidQuery(format!(
                        "limit cannot exceed {}",
                        MAX_LIMIT
                    )));
                }
                limit
            }
        };

        let offset = match present(&self.offset) {
            None => 0,
            Some(raw) => parse_non_negative("offset", raw)?,
        };

        let sort = match present(&self.sort) {
            None => DiscountSort::default(),
            Some(raw) => raw.parse()?,
        };

        Ok(ListRequest {
            filter: DiscountFilter {
                active_only: true,
                source: present(&self.supermarket).map(str::to_string),
                category: present(&self.category).map(str::to_string),
                min_discount,
                search: present(&self.search).map(str::to_string),
            },
            sort,
            limit,
            offset,
        })
    }
}

/// Empty parameters (`?category=`) count as not supplied
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_non_negative(name: &str, raw: &str) -> Result<u64> {
    let value = raw.parse::<i64>().map_err(|_| {
        AggregatorError::InvalidQuery(format!("{} must be an integer, got '{}'", name, raw))
    })?;
    if value < 0 {
        return Err(AggregatorError::InvalidQuery(format!("{} cannot be negative", name)));
    }
    Ok(value as u64)
}

impl DiscountQueryService {
    pub fn new(store: DiscountStore) -> Self {
        Self { store }
    }

    pub async fn list_discounts(&self, query: &DiscountListQuery) -> Result<DiscountListResponse> {
        let request = query.validate()?;

        let (page, total) = self
            .store
            .query(&request.filter, request.sort, request.limit, request.offset)
            .await?;

        Ok(DiscountListResponse {
            discounts: page.into_iter().map(DiscountResponse::from).collect(),
            total,
            limit: request.limit,
            offset: request.offset,
        })
    }

    pub async fn get_discount(&self, id: i32) -> Result<DiscountResponse> {
        self.store
            .get(id)
            .await?
            .map(DiscountResponse::from)
            .ok_or(AggregatorError::NotFound(id))
    }

    pub async fn deactivate_discount(&self, id: i32) -> Result<DiscountResponse> {
        let record = self.store.deactivate(id).await?;
        Ok(DiscountResponse::from(record))
    }

    pub async fn list_sources(&self) -> Result<SupermarketsResponse> {
        let supermarkets = self
            .store
            .distinct_values(FacetField::Source, &DiscountFilter::active())
            .await?;
        Ok(SupermarketsResponse { supermarkets })
    }

    pub async fn list_categories(&self) -> Result<CategoriesResponse> {
        let categories = self
            .store
            .distinct_values(FacetField::Category, &DiscountFilter::active())
            .await?;
        Ok(CategoriesResponse { categories })
    }

    pub async fn get_stats(&self) -> Result<StatsResponse> {
        let stats = self.store.aggregate_stats(&DiscountFilter::active()).await?;
        Ok(StatsResponse::from(stats))
    }
}
