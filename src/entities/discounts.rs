//! `SeaORM` Entity for the discounts table
//!
//! One row per collected promotional price. Rows are appended by collection runs and
//! only ever mutated by deactivation (expiry sweep or explicit request).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "discounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Retailer the record was collected from (e.g., "Jumbo")
    pub source: String,
    pub product_name: String,
    pub category: Option<String>,
    pub original_price: Option<f64>,
    pub discount_price: f64,
    /// Always derived from the two prices, rounded to 2 decimals
    pub discount_percentage: Option<f64>,
    pub valid_from: Option<DateTime>,
    pub valid_until: Option<DateTime>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
