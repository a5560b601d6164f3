//! Discount store
//!
//! Durable keyed collection of discount records on top of a SeaORM connection.
//! Records are only ever appended or deactivated; nothing here deletes rows.

use chrono::{NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    sea_query::{Expr, Func},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::entities::{discounts, prelude::*};
use crate::error::{AggregatorError, Result};
use crate::models::discount::{DiscountFilter, DiscountSort, DiscountStats, FacetField, NewDiscount};
use crate::scrapers::parser::decimal_to_f64;

#[derive(Clone)]
pub struct DiscountStore {
    db: DatabaseConnection,
}

impl DiscountStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Round-trip to the database, used by the health endpoint
    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await?;
        Ok(())
    }

    /// Append one record, returning its new id
    pub async fn insert(&self, record: NewDiscount) -> Result<i32> {
        let now = Utc::now().naive_utc();
        let inserted = active_model(record, now).insert(&self.db).await?;
        Ok(inserted.id)
    }

    /// Append a batch in a single transaction; either every record is stored or none is
    pub async fn insert_batch(&self, records: Vec<NewDiscount>) -> Result<Vec<i32>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now().naive_utc();
        let txn = self.db.begin().await?;
        let mut ids = Vec::with_capacity(records.len());
        for record in records {
            let inserted = active_model(record, now).insert(&txn).await?;
            ids.push(inserted.id);
        }
        txn.commit().await?;

        Ok(ids)
    }

    pub async fn get(&self, id: i32) -> Result<Option<discounts::Model>> {
        Ok(Discounts::find_by_id(id).one(&self.db).await?)
    }

    /// Filtered, sorted page of records plus the unpaginated match count
    pub async fn query(
        &self,
        filter: &DiscountFilter,
        sort: DiscountSort,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<discounts::Model>, u64)> {
        let select = Discounts::find().filter(condition(filter));

        let total = select.clone().count(&self.db).await?;
        let page = apply_sort(select, sort)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok((page, total))
    }

    /// Distinct non-null values of a facet field, ascending
    pub async fn distinct_values(
        &self,
        field: FacetField,
        filter: &DiscountFilter,
    ) -> Result<Vec<String>> {
        let column = match field {
            FacetField::Source => discounts::Column::Source,
            FacetField::Category => discounts::Column::Category,
        };

        let values: Vec<String> = Discounts::find()
            .select_only()
            .column(column)
            .distinct()
            .filter(condition(filter))
            .filter(column.is_not_null())
            .filter(column.ne(""))
            .order_by_asc(column)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(values)
    }

    /// Deactivate every active record whose validity ended before `now`.
    ///
    /// Runs as a single UPDATE so a concurrent reader sees either none or all of it.
    pub async fn expire_stale(&self, now: NaiveDateTime) -> Result<u64> {
        let result = Discounts::update_many()
            .col_expr(discounts::Column::IsActive, Expr::value(false))
            .col_expr(discounts::Column::UpdatedAt, Expr::value(now))
            .filter(discounts::Column::IsActive.eq(true))
            .filter(discounts::Column::ValidUntil.is_not_null())
            .filter(discounts::Column::ValidUntil.lt(now))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Explicitly deactivate one record. Already inactive records are left untouched.
    pub async fn deactivate(&self, id: i32) -> Result<discounts::Model> {
        let record = Discounts::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AggregatorError::NotFound(id))?;

        if !record.is_active {
            return Ok(record);
        }

        let mut active: discounts::ActiveModel = record.into();
        active.is_active = Set(false);
        active.updated_at = Set(Utc::now().naive_utc());
        Ok(active.update(&self.db).await?)
    }

    pub async fn aggregate_stats(&self, filter: &DiscountFilter) -> Result<DiscountStats> {
        let cond = condition(filter);

        let total_count = Discounts::find()
            .filter(cond.clone())
            .count(&self.db)
            .await?;

        let by_source: Vec<(String, i64)> = Discounts::find()
            .select_only()
            .column(discounts::Column::Source)
            .column_as(Expr::col(discounts::Column::Id).count(), "count")
            .filter(cond.clone())
            .group_by(discounts::Column::Source)
            .into_tuple()
            .all(&self.db)
            .await?;

        let percentages: Vec<f64> = Discounts::find()
            .select_only()
            .column(discounts::Column::DiscountPercentage)
            .filter(cond)
            .filter(discounts::Column::DiscountPercentage.is_not_null())
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(DiscountStats {
            total_count,
            count_by_source: by_source
                .into_iter()
                .map(|(source, count)| (source, count.max(0) as u64))
                .collect::<BTreeMap<_, _>>(),
            average_discount_percentage: average(&percentages),
        })
    }
}

/// Mean rounded to 2 decimals, 0 for an empty set
fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let sum: Decimal = values
        .iter()
        .filter_map(|v| Decimal::from_str(&v.to_string()).ok())
        .sum();
    let mean = sum / Decimal::from(values.len() as u64);
    decimal_to_f64(mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

fn active_model(record: NewDiscount, now: NaiveDateTime) -> discounts::ActiveModel {
    discounts::ActiveModel {
        source: Set(record.source),
        product_name: Set(record.product_name),
        category: Set(record.category),
        original_price: Set(record.original_price),
        discount_price: Set(record.discount_price),
        discount_percentage: Set(record.discount_percentage),
        valid_from: Set(record.valid_from),
        valid_until: Set(record.valid_until),
        image_url: Set(record.image_url),
        product_url: Set(record.product_url),
        description: Set(record.description),
        is_active: Set(record.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

fn condition(filter: &DiscountFilter) -> Condition {
    let mut cond = Condition::all();

    if filter.active_only {
        cond = cond.add(discounts::Column::IsActive.eq(true));
    }
    if let Some(ref source) = filter.source {
        cond = cond.add(discounts::Column::Source.eq(source.as_str()));
    }
    if let Some(ref category) = filter.category {
        cond = cond.add(discounts::Column::Category.eq(category.as_str()));
    }
    if let Some(min_discount) = filter.min_discount {
        // NULL never satisfies >=, so records without a percentage drop out
        cond = cond.add(discounts::Column::DiscountPercentage.gte(min_discount));
    }
    if let Some(ref search) = filter.search {
        // Both sides go through the database's LOWER so they fold case identically
        let pattern = format!("%{}%", escape_like(search));
        cond = cond.add(Expr::cust_with_exprs(
            "$1 LIKE $2 ESCAPE '!'",
            [
                Func::lower(Expr::col(discounts::Column::ProductName)).into(),
                Func::lower(Expr::val(pattern)).into(),
            ],
        ));
    }

    cond
}

/// Escape `LIKE` wildcards (with `!`) so the search text matches literally
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '!' | '%' | '_') {
            escaped.push('!');
        }
        escaped.push(c);
    }
    escaped
}

fn apply_sort(select: Select<Discounts>, sort: DiscountSort) -> Select<Discounts> {
    let select = match sort {
        DiscountSort::Discount => select
            .order_by(
                Expr::col(discounts::Column::DiscountPercentage).is_null(),
                Order::Asc,
            )
            .order_by(discounts::Column::DiscountPercentage, Order::Desc),
        DiscountSort::Price => select.order_by(discounts::Column::DiscountPrice, Order::Asc),
        DiscountSort::Newest => select.order_by(discounts::Column::CreatedAt, Order::Desc),
        DiscountSort::Ending => select
            .order_by(Expr::col(discounts::Column::ValidUntil).is_null(), Order::Asc)
            .order_by(discounts::Column::ValidUntil, Order::Asc),
    };

    select.order_by(discounts::Column::Id, Order::Asc)
}
