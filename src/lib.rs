//! # Sales Summary: Category Sales Rules over Tabular Data
//!
//! Aggregates internet sales by product category from an orders fact table
//! and a product → subcategory → category dimension chain, and checks a
//! schema metadata catalog for every column the rules read before they run.
//!
//! ## Features
//!
//! - **Schema validation**: report every missing `schema.table.column` in one pass
//! - **Summary transform**: inclusive date filter, inner-join chain, per-category measures
//! - **Rule sets**: YAML bindings from logical roles to physical table and column names
//! - **Loading and output**: CSV input, table/CSV/JSON/NDJSON output
//!
//! ## Example
//!
//! ```
//! use sales_summary::{summarize_default, synthetic, SalesTables};
//!
//! let (products, subcategories, categories) = synthetic::dimensions();
//! let orders = synthetic::orders();
//! let tables = SalesTables {
//!     orders: &orders,
//!     products: &products,
//!     subcategories: &subcategories,
//!     categories: &categories,
//! };
//!
//! let start = "2013-01-01".parse::<sales_summary::DateBound>().unwrap();
//! let end = "2013-12-31".parse::<sales_summary::DateBound>().unwrap();
//! let summary = summarize_default(&tables, start, end).unwrap();
//! assert_eq!(summary.rows()[0].category_name, "Bikes");
//! ```

// Core modules
pub mod table;
pub mod dates;
pub mod schema;
pub mod rules;
pub mod summary;

// Input and output
pub mod loader;
pub mod serialization;

// Fixtures
pub mod synthetic;

// Re-export key types
pub use table::{FieldValue, JoinKey, Table, TableError};
pub use dates::DateBound;
pub use schema::{validate, ColumnRef, MetadataCatalog, RequiredColumns, SchemaError};
pub use rules::RuleSet;
pub use summary::{
    summarize, summarize_default, SalesSummary, SalesSummaryRow, SalesTables, SummaryError,
};
pub use loader::{load_catalog, load_csv_table, LoadError};
pub use serialization::{RecordFormat, RecordWriter, SerializationError};
