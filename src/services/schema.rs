use crate::models::{ColumnKind, ColumnSpec};

pub const ORDER_ID: &str = "Order ID";
pub const ORDER_DATE: &str = "Order Date";
pub const SHIP_DATE: &str = "Ship Date";
pub const REGION: &str = "Region";
pub const PRODUCT_ID: &str = "Product ID";
pub const SALES: &str = "Sales";
pub const PROFIT: &str = "Profit";
pub const QUANTITY: &str = "Quantity";
pub const SHIP_MODE: &str = "Ship Mode";

/// The declared sales dataset schema. Column names are case-sensitive and
/// must match the input header row exactly.
pub const REQUIRED_COLUMNS: [(&str, ColumnKind); 9] = [
    (ORDER_ID, ColumnKind::Text),
    (ORDER_DATE, ColumnKind::Date),
    (SHIP_DATE, ColumnKind::Date),
    (REGION, ColumnKind::Text),
    (PRODUCT_ID, ColumnKind::Text),
    (SALES, ColumnKind::Real),
    (PROFIT, ColumnKind::Real),
    (QUANTITY, ColumnKind::Integer),
    (SHIP_MODE, ColumnKind::Text),
];

pub fn sales_columns() -> Vec<ColumnSpec> {
    REQUIRED_COLUMNS
        .iter()
        .map(|(name, kind)| ColumnSpec { name, kind: *kind })
        .collect()
}

/// Required columns absent from `headers`, preserving required-list order.
/// Empty result means the schema check passes. Purely a report function,
/// nothing is mutated.
pub fn missing_columns(headers: &[String]) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !headers.iter().any(|header| header == name))
        .collect()
}
