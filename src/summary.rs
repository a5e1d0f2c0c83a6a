//! Sales-by-category summary.
//!
//! Filters order lines to an inclusive date range, resolves each line through
//! the product → subcategory → category hierarchy with inner-join semantics,
//! and aggregates sales per category name:
//!
//! | output column       | measure                                   |
//! |---------------------|-------------------------------------------|
//! | `ProductCategory`   | category name                             |
//! | `TotalSales`        | sum of line sales amounts                 |
//! | `TotalOrders`       | count of non-null order numbers           |
//! | `AverageOrderValue` | mean of line sales amounts                |
//!
//! Rows are ordered by `TotalSales` descending, then by category name.

use crate::dates::{parse_date, DateBound};
use crate::rules::RuleSet;
use crate::table::{FieldValue, JoinKey, Table, TableError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Error type for the summary transform
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryError {
    /// Input tables lack columns the transform reads (`table.column` entries)
    MissingColumn { missing: Vec<String> },
    /// An order date could not be interpreted as a date
    DateParse {
        table: String,
        row: usize,
        value: String,
    },
    /// A measure cell is not numeric
    InvalidValue {
        table: String,
        column: String,
        row: usize,
        value: String,
    },
}

impl fmt::Display for SummaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryError::MissingColumn { missing } => {
                write!(f, "Input tables are missing columns: {}", missing.join(", "))
            }
            SummaryError::DateParse { table, row, value } => {
                write!(f, "Unparseable date '{}' in {} row {}", value, table, row)
            }
            SummaryError::InvalidValue {
                table,
                column,
                row,
                value,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for {}.{} in row {}: expected a number",
                    value, table, column, row
                )
            }
        }
    }
}

impl std::error::Error for SummaryError {}

impl From<TableError> for SummaryError {
    fn from(err: TableError) -> Self {
        let TableError::MissingColumns { table, columns } = err;
        SummaryError::MissingColumn {
            missing: columns
                .into_iter()
                .map(|c| format!("{}.{}", table, c))
                .collect(),
        }
    }
}

/// The four inputs of the summary, borrowed for the duration of one call
#[derive(Debug, Clone, Copy)]
pub struct SalesTables<'a> {
    pub orders: &'a Table,
    pub products: &'a Table,
    pub subcategories: &'a Table,
    pub categories: &'a Table,
}

/// One output row per category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesSummaryRow {
    #[serde(rename = "ProductCategory")]
    pub category_name: String,
    #[serde(rename = "TotalSales")]
    pub total_sales: f64,
    #[serde(rename = "TotalOrders")]
    pub total_orders: u64,
    #[serde(rename = "AverageOrderValue")]
    pub average_order_value: f64,
}

/// Ordered summary result.
///
/// An empty summary still reports its column names through
/// [`SalesSummary::columns`] and [`SalesSummary::to_table`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesSummary {
    rows: Vec<SalesSummaryRow>,
}

impl SalesSummary {
    pub const COLUMNS: [&'static str; 4] = [
        "ProductCategory",
        "TotalSales",
        "TotalOrders",
        "AverageOrderValue",
    ];

    pub fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    pub fn rows(&self) -> &[SalesSummaryRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<SalesSummaryRow> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesSummaryRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a category, if it had any matching sales.
    pub fn get(&self, category_name: &str) -> Option<&SalesSummaryRow> {
        self.rows.iter().find(|r| r.category_name == category_name)
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new("SalesSummary", Self::COLUMNS);
        for row in &self.rows {
            table.push_row([
                FieldValue::String(row.category_name.clone()),
                FieldValue::Float(row.total_sales),
                FieldValue::Int(row.total_orders as i64),
                FieldValue::Float(row.average_order_value),
            ]);
        }
        table
    }
}

impl<'a> IntoIterator for &'a SalesSummary {
    type Item = &'a SalesSummaryRow;
    type IntoIter = std::slice::Iter<'a, SalesSummaryRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for SalesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 4]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.category_name.clone(),
                    format!("{:.2}", r.total_sales),
                    r.total_orders.to_string(),
                    format!("{:.2}", r.average_order_value),
                ]
            })
            .collect();

        let mut widths = Self::COLUMNS.map(str::len);
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        writeln!(
            f,
            "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}",
            Self::COLUMNS[0],
            Self::COLUMNS[1],
            Self::COLUMNS[2],
            Self::COLUMNS[3],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2],
            w3 = widths[3],
        )?;
        for row in &cells {
            writeln!(
                f,
                "{:<w0$}  {:>w1$}  {:>w2$}  {:>w3$}",
                row[0],
                row[1],
                row[2],
                row[3],
                w0 = widths[0],
                w1 = widths[1],
                w2 = widths[2],
                w3 = widths[3],
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Measures {
    total_sales: f64,
    /// Lines with a sales amount; the divisor of the average.
    priced: u64,
    orders: u64,
}

/// Key → matches lookup built from a dimension table.
///
/// Duplicate keys keep every match so joins fan out like a SQL inner join.
fn index_dimension<V>(
    table: &Table,
    key_col: usize,
    value_col: usize,
    value: impl Fn(&FieldValue) -> Option<V>,
) -> HashMap<JoinKey, Vec<V>> {
    let mut index: HashMap<JoinKey, Vec<V>> = HashMap::new();
    for row in 0..table.len() {
        let key = table.get(row, key_col).and_then(JoinKey::from_value);
        let val = table.get(row, value_col).and_then(&value);
        if let (Some(key), Some(val)) = (key, val) {
            index.entry(key).or_default().push(val);
        }
    }
    index
}

fn category_label(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Null => None,
        other => Some(other.to_string()),
    }
}

/// Product → subcategory → category lookups.
struct CategoryChain {
    products: HashMap<JoinKey, Vec<JoinKey>>,
    subcategories: HashMap<JoinKey, Vec<JoinKey>>,
    categories: HashMap<JoinKey, Vec<String>>,
}

impl CategoryChain {
    fn build(
        tables: &SalesTables<'_>,
        product_cols: &[usize],
        subcategory_cols: &[usize],
        category_cols: &[usize],
    ) -> Self {
        Self {
            products: index_dimension(
                tables.products,
                product_cols[0],
                product_cols[1],
                JoinKey::from_value,
            ),
            subcategories: index_dimension(
                tables.subcategories,
                subcategory_cols[0],
                subcategory_cols[1],
                JoinKey::from_value,
            ),
            categories: index_dimension(
                tables.categories,
                category_cols[0],
                category_cols[1],
                category_label,
            ),
        }
    }

    /// Every category name a product resolves to, one per join path.
    fn names(&self, product_key: &JoinKey) -> Vec<&String> {
        self.products
            .get(product_key)
            .into_iter()
            .flatten()
            .filter_map(|subcategory| self.subcategories.get(subcategory))
            .flatten()
            .filter_map(|category| self.categories.get(category))
            .flatten()
            .collect()
    }
}

#[derive(Debug, Default, PartialEq)]
struct JoinCounts {
    /// Output lines after fan-out.
    joined: usize,
    /// Input lines with no category match.
    unmatched: usize,
}

/// Group the given order rows by category.
///
/// `order_cols` is `[sales_amount, order_number, order_date, product_key]`.
fn accumulate(
    orders: &Table,
    order_cols: &[usize],
    rows: &[usize],
    chain: &CategoryChain,
    amount_column: &str,
) -> Result<(IndexMap<String, Measures>, JoinCounts), SummaryError> {
    let (amount_col, number_col, product_col) = (order_cols[0], order_cols[1], order_cols[3]);
    let mut groups: IndexMap<String, Measures> = IndexMap::new();
    let mut counts = JoinCounts::default();

    for &row in rows {
        let names = orders
            .get(row, product_col)
            .and_then(JoinKey::from_value)
            .map(|key| chain.names(&key))
            .unwrap_or_default();
        if names.is_empty() {
            counts.unmatched += 1;
            continue;
        }

        // A null amount is skipped by the sum and the average, like SQL SUM/AVG.
        let amount = match orders.get(row, amount_col).unwrap_or(&FieldValue::Null) {
            FieldValue::Null => None,
            cell => Some(cell.as_f64().ok_or_else(|| SummaryError::InvalidValue {
                table: orders.name.clone(),
                column: amount_column.to_string(),
                row,
                value: cell.to_string(),
            })?),
        };
        let has_order_number = orders
            .get(row, number_col)
            .is_some_and(|v| !v.is_null());

        for name in names {
            let measures = groups.entry(name.clone()).or_default();
            if let Some(amount) = amount {
                measures.total_sales += amount;
                measures.priced += 1;
            }
            if has_order_number {
                measures.orders += 1;
            }
            counts.joined += 1;
        }
    }

    Ok((groups, counts))
}

/// Resolve every column the rule set reads, reporting all gaps at once.
fn resolve_columns(
    tables: &SalesTables<'_>,
    rules: &RuleSet,
) -> Result<[Vec<usize>; 4], SummaryError> {
    let resolved = [
        tables.orders.require_columns(&rules.orders_columns()),
        tables.products.require_columns(&rules.products_columns()),
        tables.subcategories.require_columns(&rules.subcategories_columns()),
        tables.categories.require_columns(&rules.categories_columns()),
    ];

    let mut missing = Vec::new();
    for result in &resolved {
        if let Err(TableError::MissingColumns { table, columns }) = result {
            missing.extend(columns.iter().map(|c| format!("{}.{}", table, c)));
        }
    }
    if !missing.is_empty() {
        return Err(SummaryError::MissingColumn { missing });
    }

    let [o, p, s, c] = resolved;
    Ok([o?, p?, s?, c?])
}

/// Summarize sales by category over the inclusive range `start..=end`.
///
/// A range whose start is after its end is legal and yields an empty
/// summary. Order lines whose product, subcategory, or category does not
/// resolve are dropped.
///
/// # Errors
///
/// * [`SummaryError::MissingColumn`] before any row is read, if an input lacks a bound column
/// * [`SummaryError::DateParse`] if any order date is not a recognizable date
/// * [`SummaryError::InvalidValue`] if a contributing sales amount is non-numeric text
///
/// A null sales amount is left out of `TotalSales` and out of the average's
/// divisor, but the line still counts toward `TotalOrders`. A category whose
/// lines all lack an amount reports `NaN` as its average.
pub fn summarize(
    tables: &SalesTables<'_>,
    start: impl Into<DateBound>,
    end: impl Into<DateBound>,
    rules: &RuleSet,
) -> Result<SalesSummary, SummaryError> {
    let (start, end) = (start.into().date(), end.into().date());
    let [order_cols, product_cols, subcategory_cols, category_cols] =
        resolve_columns(tables, rules)?;
    let date_col = order_cols[2];

    if start > end {
        tracing::debug!("Empty date range {} > {}", start, end);
    }

    let orders = tables.orders;
    let mut in_range = Vec::new();
    for row in 0..orders.len() {
        let cell = orders.get(row, date_col).unwrap_or(&FieldValue::Null);
        let date = parse_date(cell).map_err(|value| SummaryError::DateParse {
            table: orders.name.clone(),
            row,
            value,
        })?;
        if matches!(date, Some(d) if start <= d && d <= end) {
            in_range.push(row);
        }
    }

    let chain = CategoryChain::build(tables, &product_cols, &subcategory_cols, &category_cols);
    let amount_column = &rules.tables.orders.sales_amount;
    let (groups, counts) = accumulate(orders, &order_cols, &in_range, &chain, amount_column)?;

    tracing::debug!(
        "{} of {} order lines in range, {} without a category match",
        in_range.len(),
        orders.len(),
        counts.unmatched
    );

    let mut rows: Vec<SalesSummaryRow> = groups
        .into_iter()
        .map(|(category_name, m)| SalesSummaryRow {
            category_name,
            total_sales: m.total_sales,
            total_orders: m.orders,
            average_order_value: if m.priced == 0 {
                f64::NAN
            } else {
                m.total_sales / m.priced as f64
            },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_sales
            .total_cmp(&a.total_sales)
            .then_with(|| a.category_name.cmp(&b.category_name))
    });

    tracing::info!(
        "Summarized {} joined order lines into {} categories ({} to {})",
        counts.joined,
        rows.len(),
        start,
        end
    );

    Ok(SalesSummary { rows })
}

/// [`summarize`] with the default AdventureWorks bindings.
pub fn summarize_default(
    tables: &SalesTables<'_>,
    start: impl Into<DateBound>,
    end: impl Into<DateBound>,
) -> Result<SalesSummary, SummaryError> {
    summarize(tables, start, end, &RuleSet::default())
}
