//! Small synthetic AdventureWorks-shaped tables.
//!
//! Used by the `synthetic` CLI command and by tests. Column names follow
//! [`RuleSet::default`](crate::RuleSet).

use crate::table::{FieldValue, Table};
use chrono::NaiveDate;

/// Product, subcategory, and category dimensions.
///
/// Categories: 1 Bikes, 2 Accessories, 3 Clothing. Subcategories 10/11 are
/// bikes, 20/21 accessories, 30 clothing.
pub fn dimensions() -> (Table, Table, Table) {
    let categories = Table::new(
        "DimProductCategory",
        ["ProductCategoryKey", "EnglishProductCategoryName"],
    )
    .with_row([FieldValue::Int(1), "Bikes".into()])
    .with_row([FieldValue::Int(2), "Accessories".into()])
    .with_row([FieldValue::Int(3), "Clothing".into()]);

    let subcategories = Table::new(
        "DimProductSubcategory",
        ["ProductSubcategoryKey", "ProductCategoryKey"],
    )
    .with_row([10, 1]) // road bikes
    .with_row([11, 1]) // mountain bikes
    .with_row([20, 2]) // helmets
    .with_row([21, 2]) // gloves
    .with_row([30, 3]); // jerseys

    let products = Table::new("DimProduct", ["ProductKey", "ProductSubcategoryKey"])
        .with_row([1000, 10])
        .with_row([1001, 10])
        .with_row([1010, 11])
        .with_row([2000, 20])
        .with_row([2001, 21])
        .with_row([3000, 30]);

    (products, subcategories, categories)
}

/// Order lines across January and February 2013, plus one line dated
/// 2012-12-31 that a 2013 range excludes.
pub fn orders() -> Table {
    let lines: [(i64, (i32, u32, u32), f64, &str); 9] = [
        (1000, (2013, 1, 1), 500.0, "SO100"),
        (1000, (2013, 1, 3), 750.0, "SO101"),
        (1001, (2013, 1, 15), 300.0, "SO102"),
        (1010, (2013, 2, 5), 900.0, "SO103"),
        (2000, (2013, 1, 10), 80.0, "SO200"),
        (2000, (2013, 2, 12), 120.0, "SO201"),
        (2001, (2013, 2, 20), 60.0, "SO202"),
        (3000, (2013, 1, 25), 45.0, "SO300"),
        (3000, (2012, 12, 31), 999.0, "SO301"),
    ];

    let mut table = Table::new(
        "FactInternetSales",
        ["ProductKey", "OrderDate", "SalesAmount", "SalesOrderNumber"],
    );
    for (product_key, (y, m, d), amount, order_number) in lines {
        table.push_row([
            FieldValue::Int(product_key),
            NaiveDate::from_ymd_opt(y, m, d).into(),
            FieldValue::Float(amount),
            order_number.into(),
        ]);
    }
    table
}
