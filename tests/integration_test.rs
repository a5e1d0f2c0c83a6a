//! Integration tests: catalog validation and summaries over the shipped CSV fixtures

use sales_summary::loader::read_csv_table;
use sales_summary::{
    load_catalog, load_csv_table, summarize, synthetic, validate, ColumnRef, DateBound,
    RecordFormat, RecordWriter, RequiredColumns, RuleSet, SalesSummary, SalesTables,
    SchemaError, SummaryError, Table,
};
use std::path::PathBuf;

fn config_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config").join(relative)
}

struct Fixtures {
    orders: Table,
    products: Table,
    subcategories: Table,
    categories: Table,
}

impl Fixtures {
    fn load() -> Self {
        let load = |file: &str, name: &str| load_csv_table(&config_path(file), name).unwrap();
        Self {
            orders: load("data/FactInternetSales.csv", "FactInternetSales"),
            products: load("data/DimProduct.csv", "DimProduct"),
            subcategories: load("data/DimProductSubcategory.csv", "DimProductSubcategory"),
            categories: load("data/DimProductCategory.csv", "DimProductCategory"),
        }
    }

    fn tables(&self) -> SalesTables<'_> {
        SalesTables {
            orders: &self.orders,
            products: &self.products,
            subcategories: &self.subcategories,
            categories: &self.categories,
        }
    }
}

fn bound(text: &str) -> DateBound {
    text.parse().unwrap()
}

#[test]
fn test_shipped_rules_match_defaults() {
    let rules = RuleSet::load_from_file(config_path("sales_summary.yaml")).unwrap();
    assert_eq!(rules, RuleSet::default());
    assert_eq!(rules.required_columns(), RequiredColumns::sales_summary());
}

#[test]
fn test_validate_shipped_catalog() {
    let catalog = load_catalog(&config_path("schema_metadata.csv")).unwrap();
    validate(&catalog, &RequiredColumns::sales_summary()).unwrap();
}

#[test]
fn test_validate_catalog_missing_order_date() {
    let mut catalog = load_catalog(&config_path("schema_metadata.csv")).unwrap();
    let column_idx = catalog.column_index("COLUMN_NAME").unwrap();
    catalog
        .rows
        .retain(|row| row[column_idx].as_str() != Some("OrderDate"));

    let err = validate(&catalog, &RequiredColumns::sales_summary()).unwrap_err();

    assert_eq!(
        err,
        SchemaError::Conformance {
            missing: vec![ColumnRef::new("dbo", "FactInternetSales", "OrderDate")],
        }
    );
    assert!(err.to_string().contains("dbo.FactInternetSales.OrderDate"));
}

#[test]
fn test_summary_from_csv_fixtures() {
    let fixtures = Fixtures::load();
    let summary = summarize(
        &fixtures.tables(),
        bound("2013-01-01"),
        bound("2013-12-31"),
        &RuleSet::default(),
    )
    .unwrap();

    let names: Vec<&str> = summary.iter().map(|r| r.category_name.as_str()).collect();
    assert_eq!(names, vec!["Bikes", "Accessories", "Clothing"]);

    for pair in summary.rows().windows(2) {
        assert!(pair[0].total_sales >= pair[1].total_sales);
    }

    for row in &summary {
        let mean = row.total_sales / row.total_orders as f64;
        assert!((row.average_order_value - mean).abs() < 1e-9);
    }

    let bikes = summary.get("Bikes").unwrap();
    assert_eq!(bikes.total_sales, 2450.0);
    assert_eq!(bikes.total_orders, 4);

    // 2012-12-31 line is outside the range; product 9999 has no dimension row.
    let clothing = summary.get("Clothing").unwrap();
    assert_eq!(clothing.total_sales, 45.0);
    assert_eq!(clothing.total_orders, 1);
}

#[test]
fn test_single_day_range_includes_boundary() {
    let fixtures = Fixtures::load();
    let summary = summarize(
        &fixtures.tables(),
        bound("2013-02-05"),
        bound("2013-02-05"),
        &RuleSet::default(),
    )
    .unwrap();

    assert_eq!(summary.len(), 1);
    assert_eq!(summary.rows()[0].category_name, "Bikes");
    assert_eq!(summary.rows()[0].total_sales, 900.0);
}

#[test]
fn test_inverted_range_writes_header_only_csv() {
    let fixtures = Fixtures::load();
    let summary = summarize(
        &fixtures.tables(),
        bound("2013-12-31"),
        bound("2013-01-01"),
        &RuleSet::default(),
    )
    .unwrap();
    assert!(summary.is_empty());

    let mut buf = Vec::new();
    let mut writer =
        RecordWriter::new(&mut buf, RecordFormat::Csv, summary.columns()).unwrap();
    writer.write_all(&summary).unwrap();
    writer.finish().unwrap();

    assert_eq!(
        String::from_utf8(buf).unwrap(),
        format!("{}\n", SalesSummary::COLUMNS.join(","))
    );
}

#[test]
fn test_csv_output_uses_summary_column_names() {
    let fixtures = Fixtures::load();
    let summary = summarize(
        &fixtures.tables(),
        bound("2013-01-01"),
        bound("2013-01-31"),
        &RuleSet::default(),
    )
    .unwrap();

    let mut buf = Vec::new();
    let mut writer =
        RecordWriter::new(&mut buf, RecordFormat::Csv, summary.columns()).unwrap();
    writer.write_all(&summary).unwrap();
    writer.finish().unwrap();

    let output = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "ProductCategory,TotalSales,TotalOrders,AverageOrderValue");
    assert!(lines[1].starts_with("Bikes,1550.0,3,516.66"));
}

#[test]
fn test_garbage_order_date_fails_whole_call() {
    let mut fixtures = Fixtures::load();
    let date_idx = fixtures.orders.column_index("OrderDate").unwrap();
    fixtures.orders.rows[3][date_idx] = "sometime in spring".into();

    let err = summarize(
        &fixtures.tables(),
        bound("2013-01-01"),
        bound("2013-12-31"),
        &RuleSet::default(),
    )
    .unwrap_err();

    assert!(matches!(err, SummaryError::DateParse { row: 3, .. }));
}

#[test]
fn test_missing_input_column_fails_before_reading_rows() {
    let mut fixtures = Fixtures::load();
    fixtures.products.columns[1] = "SubcategoryKey".to_string();

    let err = summarize(
        &fixtures.tables(),
        bound("2013-01-01"),
        bound("2013-12-31"),
        &RuleSet::default(),
    )
    .unwrap_err();

    assert_eq!(
        err,
        SummaryError::MissingColumn {
            missing: vec!["DimProduct.ProductSubcategoryKey".to_string()],
        }
    );
}

#[test]
fn test_blank_sales_amount_in_csv_is_skipped() {
    let data = "ProductKey,OrderDate,SalesAmount,SalesOrderNumber\n\
                1000,2013-01-01,100.0,SO1\n\
                1000,2013-01-02,,SO2\n";
    let orders = read_csv_table(data.as_bytes(), "FactInternetSales").unwrap();
    let (products, subcategories, categories) = synthetic::dimensions();
    let tables = SalesTables {
        orders: &orders,
        products: &products,
        subcategories: &subcategories,
        categories: &categories,
    };

    let summary = summarize(
        &tables,
        bound("2013-01-01"),
        bound("2013-12-31"),
        &RuleSet::default(),
    )
    .unwrap();

    let bikes = summary.get("Bikes").unwrap();
    assert_eq!(bikes.total_sales, 100.0);
    assert_eq!(bikes.total_orders, 2);
    assert_eq!(bikes.average_order_value, 100.0);
}
