use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::PipelineError;
use crate::models::{DeliverySummaryRow, MetricSummaryRow, ReportSummaries, Table};
use crate::services::schema;

/// Compute the three summary sequences from a cleaned table. Result rows
/// are ordered by ascending key; every distinct key yields exactly one row.
pub fn summarize(table: &Table) -> Result<ReportSummaries, PipelineError> {
    Ok(ReportSummaries {
        by_region: sum_metrics_by(table, schema::REGION)?,
        by_product: sum_metrics_by(table, schema::PRODUCT_ID)?,
        delivery_by_ship_mode: mean_delivery_by_ship_mode(table)?,
    })
}

/// Whole days between order and ship dates. Negative when the ship date
/// precedes the order date; that is preserved, not clamped.
pub fn delivery_days(order_date: NaiveDate, ship_date: NaiveDate) -> i64 {
    (ship_date - order_date).num_days()
}

fn sum_metrics_by(table: &Table, key_column: &str) -> Result<Vec<MetricSummaryRow>, PipelineError> {
    let key_col = table.require_column(key_column)?;
    let sales_col = table.require_column(schema::SALES)?;
    let profit_col = table.require_column(schema::PROFIT)?;
    let quantity_col = table.require_column(schema::QUANTITY)?;

    // BTreeMap keeps keys in ascending lexicographic order.
    let mut groups: BTreeMap<String, (f64, f64, i64)> = BTreeMap::new();
    for row in 0..table.height() {
        let key = table.text(row, key_col)?.to_string();
        let totals = groups.entry(key).or_insert((0.0, 0.0, 0));
        totals.0 += table.real(row, sales_col)?;
        totals.1 += table.real(row, profit_col)?;
        totals.2 += table.int(row, quantity_col)?;
    }

    Ok(groups
        .into_iter()
        .map(|(key, (sales, profit, quantity))| MetricSummaryRow {
            key,
            sales,
            profit,
            quantity,
        })
        .collect())
}

fn mean_delivery_by_ship_mode(table: &Table) -> Result<Vec<DeliverySummaryRow>, PipelineError> {
    let mode_col = table.require_column(schema::SHIP_MODE)?;
    let order_col = table.require_column(schema::ORDER_DATE)?;
    let ship_col = table.require_column(schema::SHIP_DATE)?;

    let mut groups: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for row in 0..table.height() {
        let mode = table.text(row, mode_col)?.to_string();
        let days = delivery_days(table.date(row, order_col)?, table.date(row, ship_col)?);
        let (total, count) = groups.entry(mode).or_insert((0, 0));
        *total += days;
        *count += 1;
    }

    Ok(groups
        .into_iter()
        .map(|(ship_mode, (total, count))| DeliverySummaryRow {
            ship_mode,
            mean_delivery_days: total as f64 / count as f64,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn cleaned_row(
        region: &str,
        product: &str,
        sales: f64,
        profit: f64,
        quantity: i64,
        ship_mode: &str,
        order_date: NaiveDate,
        ship_date: NaiveDate,
    ) -> Vec<Cell> {
        vec![
            Cell::Text(format!("O-{region}-{product}")),
            Cell::Date(order_date),
            Cell::Date(ship_date),
            Cell::Text(region.to_string()),
            Cell::Text(product.to_string()),
            Cell::Real(sales),
            Cell::Real(profit),
            Cell::Int(quantity),
            Cell::Text(ship_mode.to_string()),
        ]
    }

    fn cleaned_table(rows: Vec<Vec<Cell>>) -> Table {
        let mut table = Table::new(schema::sales_columns());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    #[test]
    fn regions_sum_and_sort_lexicographically() {
        let table = cleaned_table(vec![
            cleaned_row("West", "P-1", 200.0, 40.0, 4, "Standard", date(2023, 3, 1), date(2023, 3, 4)),
            cleaned_row("East", "P-1", 100.0, 20.0, 2, "Standard", date(2023, 3, 1), date(2023, 3, 3)),
        ]);
        let summaries = summarize(&table).unwrap();

        assert_eq!(summaries.by_region.len(), 2);
        assert_eq!(summaries.by_region[0].key, "East");
        assert_eq!(summaries.by_region[0].sales, 100.0);
        assert_eq!(summaries.by_region[1].key, "West");
        assert_eq!(summaries.by_region[1].sales, 200.0);
    }

    #[test]
    fn per_key_sums_conserve_table_totals() {
        let table = cleaned_table(vec![
            cleaned_row("East", "P-1", 10.5, 2.0, 1, "First", date(2023, 1, 1), date(2023, 1, 2)),
            cleaned_row("East", "P-2", 20.0, -3.5, 2, "First", date(2023, 1, 1), date(2023, 1, 3)),
            cleaned_row("West", "P-1", 30.25, 4.0, 3, "Second", date(2023, 1, 1), date(2023, 1, 4)),
            cleaned_row("South", "P-3", 40.0, 8.5, 4, "Second", date(2023, 1, 1), date(2023, 1, 5)),
        ]);
        let summaries = summarize(&table).unwrap();

        let region_sales: f64 = summaries.by_region.iter().map(|r| r.sales).sum();
        let product_sales: f64 = summaries.by_product.iter().map(|r| r.sales).sum();
        assert_eq!(region_sales, 10.5 + 20.0 + 30.25 + 40.0);
        assert_eq!(product_sales, region_sales);

        let region_quantity: i64 = summaries.by_region.iter().map(|r| r.quantity).sum();
        assert_eq!(region_quantity, 10);
    }

    #[test]
    fn one_summary_row_per_distinct_product() {
        let table = cleaned_table(vec![
            cleaned_row("East", "P-2", 5.0, 1.0, 1, "First", date(2023, 1, 1), date(2023, 1, 2)),
            cleaned_row("West", "P-1", 6.0, 1.0, 1, "First", date(2023, 1, 1), date(2023, 1, 2)),
            cleaned_row("East", "P-2", 7.0, 1.0, 1, "First", date(2023, 1, 1), date(2023, 1, 2)),
        ]);
        let summaries = summarize(&table).unwrap();

        assert_eq!(summaries.by_product.len(), 2);
        assert_eq!(summaries.by_product[0].key, "P-1");
        assert_eq!(summaries.by_product[1].key, "P-2");
        assert_eq!(summaries.by_product[1].sales, 12.0);
    }

    #[test]
    fn ship_mode_means_average_whole_days() {
        let table = cleaned_table(vec![
            cleaned_row("East", "P-1", 1.0, 0.0, 1, "Standard", date(2023, 3, 1), date(2023, 3, 3)),
            cleaned_row("West", "P-2", 1.0, 0.0, 1, "Standard", date(2023, 3, 1), date(2023, 3, 6)),
            cleaned_row("East", "P-3", 1.0, 0.0, 1, "First", date(2023, 3, 1), date(2023, 3, 2)),
        ]);
        let summaries = summarize(&table).unwrap();

        assert_eq!(summaries.delivery_by_ship_mode.len(), 2);
        assert_eq!(summaries.delivery_by_ship_mode[0].ship_mode, "First");
        assert_eq!(summaries.delivery_by_ship_mode[0].mean_delivery_days, 1.0);
        assert_eq!(summaries.delivery_by_ship_mode[1].ship_mode, "Standard");
        assert_eq!(summaries.delivery_by_ship_mode[1].mean_delivery_days, 3.5);
    }

    #[test]
    fn ship_before_order_yields_negative_days() {
        assert_eq!(delivery_days(date(2023, 3, 10), date(2023, 3, 7)), -3);

        let table = cleaned_table(vec![cleaned_row(
            "East", "P-1", 1.0, 0.0, 1, "Standard", date(2023, 3, 10), date(2023, 3, 7),
        )]);
        let summaries = summarize(&table).unwrap();
        assert_eq!(summaries.delivery_by_ship_mode[0].mean_delivery_days, -3.0);
    }
}
