//! Schema conformance checks against a metadata catalog.
//!
//! A catalog is any table listing `(schema, table, column)` triples, such as
//! an export of `INFORMATION_SCHEMA.COLUMNS`. Validation confirms that every
//! column a rule set reads actually exists before the rule set is run.

use crate::table::{FieldValue, Table};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Accepted header names for each catalog lookup column, in preference order.
const SCHEMA_HEADERS: &[&str] = &["TABLE_SCHEMA", "schema_name"];
const TABLE_HEADERS: &[&str] = &["TABLE_NAME", "table_name"];
const COLUMN_HEADERS: &[&str] = &["COLUMN_NAME", "column_name"];

/// Error type for schema validation
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// The catalog lacks one or more of its lookup columns
    Shape { missing: Vec<String> },
    /// Required columns are absent from an otherwise well-formed catalog
    Conformance { missing: Vec<ColumnRef> },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::Shape { missing } => {
                write!(f, "Schema metadata missing columns: {}", missing.join(", "))
            }
            SchemaError::Conformance { missing } => {
                let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "Schema metadata is missing required columns: {}",
                    names.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// A fully qualified column reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    /// Parse `schema.table.column`, with each part optionally bracket-quoted.
    ///
    /// # Example
    /// ```
    /// use sales_summary::ColumnRef;
    ///
    /// let col = ColumnRef::parse("[dbo].[FactInternetSales].[OrderDate]").unwrap();
    /// assert_eq!(col.to_string(), "dbo.FactInternetSales.OrderDate");
    /// ```
    pub fn parse(text: &str) -> Result<Self, String> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            let part = r"(?:\[([^\]]+)\]|([^.\[\]\s]+))";
            Regex::new(&format!(r"^{part}\.{part}\.{part}$")).expect("valid column pattern")
        });

        let caps = pattern
            .captures(text.trim())
            .ok_or_else(|| format!("Invalid column reference: '{}'", text))?;
        let part = |quoted: usize| {
            caps.get(quoted)
                .or_else(|| caps.get(quoted + 1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        };

        Ok(Self::new(part(1), part(3), part(5)))
    }

    fn matches(&self, schema: &str, table: &str, column: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.schema == schema && self.table == table && self.column == column
        } else {
            self.schema.eq_ignore_ascii_case(schema)
                && self.table.eq_ignore_ascii_case(table)
                && self.column.eq_ignore_ascii_case(column)
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.table, self.column)
    }
}

/// The set of columns a rule set depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredColumns {
    columns: Vec<ColumnRef>,
    case_sensitive: bool,
}

impl RequiredColumns {
    /// Build a requirement list. Duplicates are dropped, first occurrence wins.
    pub fn new(columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        let mut seen = HashSet::new();
        let columns = columns
            .into_iter()
            .filter(|c| seen.insert(c.clone()))
            .collect();

        Self {
            columns,
            case_sensitive: true,
        }
    }

    /// Columns read by the sales-by-category summary.
    pub fn sales_summary() -> Self {
        crate::rules::RuleSet::default().required_columns()
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Catalog rows reduced to their three lookup fields
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    entries: Vec<(String, String, String)>,
}

impl MetadataCatalog {
    /// Read the lookup columns out of a catalog table.
    ///
    /// Rows with a non-text lookup cell cannot match anything and are skipped.
    pub fn from_table(table: &Table) -> Result<Self, SchemaError> {
        let mut missing = Vec::new();
        let mut locate = |headers: &[&str]| {
            let found = headers.iter().find_map(|h| table.column_index(h));
            if found.is_none() {
                missing.push(headers[0].to_string());
            }
            found
        };

        let schema_idx = locate(SCHEMA_HEADERS);
        let table_idx = locate(TABLE_HEADERS);
        let column_idx = locate(COLUMN_HEADERS);

        let (Some(schema_idx), Some(table_idx), Some(column_idx)) =
            (schema_idx, table_idx, column_idx)
        else {
            missing.sort();
            return Err(SchemaError::Shape { missing });
        };

        let text = |row: usize, col: usize| match table.get(row, col) {
            Some(FieldValue::String(s)) => Some(s.clone()),
            _ => None,
        };

        let entries = (0..table.len())
            .filter_map(|row| {
                Some((
                    text(row, schema_idx)?,
                    text(row, table_idx)?,
                    text(row, column_idx)?,
                ))
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any catalog row names the given column.
    pub fn contains(&self, column: &ColumnRef, case_sensitive: bool) -> bool {
        self.entries
            .iter()
            .any(|(s, t, c)| column.matches(s, t, c, case_sensitive))
    }
}

/// Confirm that every required column is present in the catalog.
///
/// Collects all missing columns before failing so that a single run reports
/// everything that needs fixing.
pub fn validate(catalog: &Table, required: &RequiredColumns) -> Result<(), SchemaError> {
    let catalog = MetadataCatalog::from_table(catalog)?;
    tracing::debug!(
        "Checking {} required columns against {} catalog rows",
        required.len(),
        catalog.len()
    );

    let missing: Vec<ColumnRef> = required
        .columns()
        .iter()
        .filter(|col| !catalog.contains(col, required.is_case_sensitive()))
        .cloned()
        .collect();

    if !missing.is_empty() {
        for col in &missing {
            tracing::warn!("Required column not found in schema metadata: {}", col);
        }
        return Err(SchemaError::Conformance { missing });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with(rows: &[(&str, &str, &str)]) -> Table {
        let mut table = Table::new("catalog", ["TABLE_SCHEMA", "TABLE_NAME", "COLUMN_NAME"]);
        for (s, t, c) in rows {
            table.push_row([*s, *t, *c]);
        }
        table
    }

    fn full_catalog() -> Table {
        let required = RequiredColumns::sales_summary();
        let mut table = Table::new(
            "catalog",
            ["TABLE_CATALOG", "TABLE_SCHEMA", "TABLE_NAME", "COLUMN_NAME", "DATA_TYPE"],
        );
        for col in required.columns() {
            table.push_row([
                "AdventureWorksDW",
                col.schema.as_str(),
                col.table.as_str(),
                col.column.as_str(),
                "int",
            ]);
        }
        table
    }

    #[test]
    fn test_sales_summary_requirements() {
        let required = RequiredColumns::sales_summary();
        let names: Vec<String> = required.columns().iter().map(|c| c.to_string()).collect();

        assert_eq!(
            names,
            vec![
                "dbo.FactInternetSales.SalesAmount",
                "dbo.FactInternetSales.SalesOrderNumber",
                "dbo.FactInternetSales.OrderDate",
                "dbo.FactInternetSales.ProductKey",
                "dbo.DimProduct.ProductKey",
                "dbo.DimProduct.ProductSubcategoryKey",
                "dbo.DimProductSubcategory.ProductSubcategoryKey",
                "dbo.DimProductSubcategory.ProductCategoryKey",
                "dbo.DimProductCategory.ProductCategoryKey",
                "dbo.DimProductCategory.EnglishProductCategoryName",
            ]
        );
        assert!(required.is_case_sensitive());
    }

    #[test]
    fn test_validate_complete_catalog() {
        assert_eq!(validate(&full_catalog(), &RequiredColumns::sales_summary()), Ok(()));
    }

    #[test]
    fn test_validate_duplicate_rows_are_harmless() {
        let mut catalog = full_catalog();
        let first = catalog.rows[0].clone();
        catalog.rows.push(first);

        assert!(validate(&catalog, &RequiredColumns::sales_summary()).is_ok());
    }

    #[test]
    fn test_validate_missing_lookup_column() {
        let catalog = Table::new("catalog", ["TABLE_SCHEMA", "TABLE_NAME"])
            .with_row(["dbo", "FactInternetSales"]);

        let err = validate(&catalog, &RequiredColumns::sales_summary()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::Shape {
                missing: vec!["COLUMN_NAME".to_string()]
            }
        );
    }

    #[test]
    fn test_validate_accepts_snake_case_lookup_headers() {
        let catalog = Table::new("catalog", ["schema_name", "table_name", "column_name"])
            .with_row(["dbo", "DimProduct", "ProductKey"]);
        let required = RequiredColumns::new([ColumnRef::new("dbo", "DimProduct", "ProductKey")]);

        assert!(validate(&catalog, &required).is_ok());
    }

    #[test]
    fn test_validate_reports_every_missing_column() {
        let catalog = catalog_with(&[("dbo", "FactInternetSales", "SalesAmount")]);

        let err = validate(&catalog, &RequiredColumns::sales_summary()).unwrap_err();
        match &err {
            SchemaError::Conformance { missing } => assert_eq!(missing.len(), 9),
            other => panic!("unexpected error: {:?}", other),
        }

        let message = err.to_string();
        assert!(message.contains("dbo.FactInternetSales.OrderDate"));
        assert!(message.contains("dbo.DimProductCategory.EnglishProductCategoryName"));
        assert!(!message.contains("dbo.FactInternetSales.SalesAmount"));
    }

    #[test]
    fn test_validate_names_single_missing_triple() {
        let mut catalog = full_catalog();
        catalog
            .rows
            .retain(|row| row[3] != FieldValue::from("OrderDate"));

        let err = validate(&catalog, &RequiredColumns::sales_summary()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::Conformance {
                missing: vec![ColumnRef::new("dbo", "FactInternetSales", "OrderDate")]
            }
        );
        assert!(err.to_string().contains("dbo.FactInternetSales.OrderDate"));
    }

    #[test]
    fn test_validate_is_case_sensitive_by_default() {
        let catalog = catalog_with(&[("DBO", "dimproduct", "productkey")]);
        let required = RequiredColumns::new([ColumnRef::new("dbo", "DimProduct", "ProductKey")]);

        assert!(validate(&catalog, &required).is_err());
        assert!(validate(&catalog, &required.case_sensitive(false)).is_ok());
    }

    #[test]
    fn test_validate_skips_non_text_rows() {
        let mut catalog = catalog_with(&[]);
        catalog.push_row([FieldValue::from("dbo"), FieldValue::Null, FieldValue::from("ProductKey")]);
        let required = RequiredColumns::new([ColumnRef::new("dbo", "DimProduct", "ProductKey")]);

        assert!(matches!(
            validate(&catalog, &required),
            Err(SchemaError::Conformance { .. })
        ));
    }

    #[test]
    fn test_required_columns_dedup() {
        let col = ColumnRef::new("dbo", "DimProduct", "ProductKey");
        let required = RequiredColumns::new([col.clone(), col]);
        assert_eq!(required.len(), 1);
    }

    #[test]
    fn test_column_ref_parse() {
        assert_eq!(
            ColumnRef::parse("dbo.DimProduct.ProductKey").unwrap(),
            ColumnRef::new("dbo", "DimProduct", "ProductKey")
        );
        assert_eq!(
            ColumnRef::parse("[dbo].[Dim Product].ProductKey").unwrap(),
            ColumnRef::new("dbo", "Dim Product", "ProductKey")
        );
        assert!(ColumnRef::parse("DimProduct.ProductKey").is_err());
        assert!(ColumnRef::parse("a.b.c.d").is_err());
    }
}
