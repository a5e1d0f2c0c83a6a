//! Rule set configuration.
//!
//! Binds the logical roles of the sales summary (orders, products,
//! subcategories, categories and their key/measure columns) to physical
//! table and column names. The same bindings drive both schema validation
//! and the transform, so the columns checked are the columns read.

use crate::schema::{ColumnRef, RequiredColumns};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Order-line fact table bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersTable {
    pub name: String,
    pub product_key: String,
    pub order_date: String,
    pub sales_amount: String,
    pub order_number: String,
}

impl Default for OrdersTable {
    fn default() -> Self {
        Self {
            name: "FactInternetSales".to_string(),
            product_key: "ProductKey".to_string(),
            order_date: "OrderDate".to_string(),
            sales_amount: "SalesAmount".to_string(),
            order_number: "SalesOrderNumber".to_string(),
        }
    }
}

/// Product dimension bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductsTable {
    pub name: String,
    pub product_key: String,
    pub product_subcategory_key: String,
}

impl Default for ProductsTable {
    fn default() -> Self {
        Self {
            name: "DimProduct".to_string(),
            product_key: "ProductKey".to_string(),
            product_subcategory_key: "ProductSubcategoryKey".to_string(),
        }
    }
}

/// Product subcategory dimension bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoriesTable {
    pub name: String,
    pub product_subcategory_key: String,
    pub product_category_key: String,
}

impl Default for SubcategoriesTable {
    fn default() -> Self {
        Self {
            name: "DimProductSubcategory".to_string(),
            product_subcategory_key: "ProductSubcategoryKey".to_string(),
            product_category_key: "ProductCategoryKey".to_string(),
        }
    }
}

/// Product category dimension bindings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoriesTable {
    pub name: String,
    pub product_category_key: String,
    pub category_name: String,
}

impl Default for CategoriesTable {
    fn default() -> Self {
        Self {
            name: "DimProductCategory".to_string(),
            product_category_key: "ProductCategoryKey".to_string(),
            category_name: "EnglishProductCategoryName".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBindings {
    #[serde(default)]
    pub orders: OrdersTable,
    #[serde(default)]
    pub products: ProductsTable,
    #[serde(default)]
    pub subcategories: SubcategoriesTable,
    #[serde(default)]
    pub categories: CategoriesTable,
}

fn default_name() -> String {
    "sales_summary".to_string()
}

fn default_schema() -> String {
    "dbo".to_string()
}

fn default_case_sensitive() -> bool {
    true
}

/// A named rule set: source schema plus table and column bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default = "default_name")]
    pub name: String,

    /// Database schema that owns every bound table
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Whether catalog lookups compare identifiers exactly
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    #[serde(default)]
    pub tables: TableBindings,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            name: default_name(),
            schema: default_schema(),
            case_sensitive: default_case_sensitive(),
            tables: TableBindings::default(),
        }
    }
}

impl RuleSet {
    /// Load a rule set from a YAML file with a top-level `rules` key.
    ///
    /// # Example
    /// ```ignore
    /// use sales_summary::RuleSet;
    ///
    /// let rules = RuleSet::load_from_file("config/sales_summary.yaml")?;
    /// println!("Validating {} columns", rules.required_columns().len());
    /// ```
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read rules file {}: {}", path.display(), e))?;

        Self::from_yaml_str(&contents)
            .map_err(|e| format!("Invalid rules file {}: {}", path.display(), e))
    }

    /// Parse a rule set from YAML text.
    pub fn from_yaml_str(contents: &str) -> Result<Self, String> {
        let yaml: serde_yaml::Value = serde_yaml::from_str(contents)
            .map_err(|e| format!("Failed to parse YAML: {}", e))?;

        let rules_yaml = yaml
            .get("rules")
            .ok_or_else(|| "Rules YAML missing 'rules' field".to_string())?;

        let rules: RuleSet = serde_yaml::from_value(rules_yaml.clone())
            .map_err(|e| format!("Failed to parse rule set: {}", e))?;

        rules.validate()?;
        Ok(rules)
    }

    /// Reject blank identifiers.
    pub fn validate(&self) -> Result<(), String> {
        let mut blank = Vec::new();
        for (path, value) in self.identifiers() {
            if value.trim().is_empty() {
                blank.push(path);
            }
        }

        if !blank.is_empty() {
            return Err(format!(
                "Rule set '{}' has empty identifiers: {}",
                self.name,
                blank.join(", ")
            ));
        }

        Ok(())
    }

    fn identifiers(&self) -> Vec<(&'static str, &str)> {
        let t = &self.tables;
        vec![
            ("schema", self.schema.as_str()),
            ("tables.orders.name", t.orders.name.as_str()),
            ("tables.orders.product_key", t.orders.product_key.as_str()),
            ("tables.orders.order_date", t.orders.order_date.as_str()),
            ("tables.orders.sales_amount", t.orders.sales_amount.as_str()),
            ("tables.orders.order_number", t.orders.order_number.as_str()),
            ("tables.products.name", t.products.name.as_str()),
            ("tables.products.product_key", t.products.product_key.as_str()),
            (
                "tables.products.product_subcategory_key",
                t.products.product_subcategory_key.as_str(),
            ),
            ("tables.subcategories.name", t.subcategories.name.as_str()),
            (
                "tables.subcategories.product_subcategory_key",
                t.subcategories.product_subcategory_key.as_str(),
            ),
            (
                "tables.subcategories.product_category_key",
                t.subcategories.product_category_key.as_str(),
            ),
            ("tables.categories.name", t.categories.name.as_str()),
            (
                "tables.categories.product_category_key",
                t.categories.product_category_key.as_str(),
            ),
            ("tables.categories.category_name", t.categories.category_name.as_str()),
        ]
    }

    /// Columns of the fact table, in the order they are required.
    pub fn orders_columns(&self) -> [&str; 4] {
        let o = &self.tables.orders;
        [
            o.sales_amount.as_str(),
            o.order_number.as_str(),
            o.order_date.as_str(),
            o.product_key.as_str(),
        ]
    }

    pub fn products_columns(&self) -> [&str; 2] {
        let p = &self.tables.products;
        [p.product_key.as_str(), p.product_subcategory_key.as_str()]
    }

    pub fn subcategories_columns(&self) -> [&str; 2] {
        let s = &self.tables.subcategories;
        [s.product_subcategory_key.as_str(), s.product_category_key.as_str()]
    }

    pub fn categories_columns(&self) -> [&str; 2] {
        let c = &self.tables.categories;
        [c.product_category_key.as_str(), c.category_name.as_str()]
    }

    /// Every `(schema, table, column)` triple this rule set reads.
    pub fn required_columns(&self) -> RequiredColumns {
        let t = &self.tables;
        let groups = [
            (t.orders.name.as_str(), self.orders_columns().to_vec()),
            (t.products.name.as_str(), self.products_columns().to_vec()),
            (t.subcategories.name.as_str(), self.subcategories_columns().to_vec()),
            (t.categories.name.as_str(), self.categories_columns().to_vec()),
        ];

        let columns = groups.iter().flat_map(|(table, cols)| {
            cols.iter()
                .map(move |col| ColumnRef::new(self.schema.as_str(), *table, *col))
        });

        RequiredColumns::new(columns).case_sensitive(self.case_sensitive)
    }
}
