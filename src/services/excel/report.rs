use rust_xlsxwriter::{Chart, ChartType, Format, Workbook, Worksheet, XlsxError};

use crate::error::PipelineError;
use crate::models::{Cell, DeliverySummaryRow, MetricSummaryRow, ReportSummaries, Table};
use crate::services::{aggregate, schema};

const DATE_NUMBER_FORMAT: &str = "yyyy-mm-dd";
const DELIVERY_DAYS_HEADER: &str = "Delivery Time(Days)";
/// G7, in zero-based row/column terms. Uniform across summary sheets.
const CHART_ANCHOR_ROW: u32 = 6;
const CHART_ANCHOR_COL: u16 = 6;

/// First and last zero-based data row of a summary sheet holding `n_keys`
/// rows below a single header row. An off-by-one here silently truncates
/// or overruns every chart series, so this mapping is kept in one place.
fn data_row_bounds(n_keys: usize) -> (u32, u32) {
    (1, n_keys as u32)
}

/// Cleaned-report artifact: a single sheet mirroring the cleaned table,
/// nothing derived added.
pub fn write_cleaned_workbook(table: &Table) -> Result<Vec<u8>, PipelineError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(DATE_NUMBER_FORMAT);

    let sheet = workbook.add_worksheet();
    write_table(sheet, table, &date_format)?;

    Ok(workbook.save_to_buffer()?)
}

/// Summary-report artifact: four sheets in fixed order, with one column
/// chart per summary sheet.
pub fn build_summary_workbook(
    table: &Table,
    summaries: &ReportSummaries,
) -> Result<Vec<u8>, PipelineError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format(DATE_NUMBER_FORMAT);

    let cleaned = workbook.add_worksheet();
    cleaned.set_name("cleaned_report")?;
    write_cleaned_sheet(cleaned, table, &date_format)?;

    let region = workbook.add_worksheet();
    region.set_name("summary_region")?;
    write_metric_summary_sheet(
        region,
        "summary_region",
        schema::REGION,
        "Region",
        &summaries.by_region,
    )?;

    let product = workbook.add_worksheet();
    product.set_name("summary_product")?;
    write_metric_summary_sheet(
        product,
        "summary_product",
        schema::PRODUCT_ID,
        "Product",
        &summaries.by_product,
    )?;

    let shipment = workbook.add_worksheet();
    shipment.set_name("Shipment_delivery_analysis")?;
    write_delivery_sheet(shipment, &summaries.delivery_by_ship_mode)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_table(sheet: &mut Worksheet, table: &Table, date_format: &Format) -> Result<(), XlsxError> {
    for (col, spec) in table.columns().iter().enumerate() {
        sheet.write_string(0, col as u16, spec.name)?;
    }
    for (row, cells) in table.rows().iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            write_cell(sheet, row as u32 + 1, col as u16, cell, date_format)?;
        }
    }
    Ok(())
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    date_format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        Cell::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        Cell::Int(i) => {
            sheet.write_number(row, col, *i as f64)?;
        }
        Cell::Real(f) => {
            sheet.write_number(row, col, *f)?;
        }
        Cell::Date(d) => {
            sheet.write_with_format(row, col, d, date_format)?;
        }
        Cell::Missing => {}
    }
    Ok(())
}

/// The workbook's copy of the cleaned table carries the derived delivery
/// time column alongside the schema columns.
fn write_cleaned_sheet(
    sheet: &mut Worksheet,
    table: &Table,
    date_format: &Format,
) -> Result<(), PipelineError> {
    write_table(sheet, table, date_format)?;

    let days_col = table.width() as u16;
    sheet.write_string(0, days_col, DELIVERY_DAYS_HEADER)?;

    let order_col = table.require_column(schema::ORDER_DATE)?;
    let ship_col = table.require_column(schema::SHIP_DATE)?;
    for row in 0..table.height() {
        let days =
            aggregate::delivery_days(table.date(row, order_col)?, table.date(row, ship_col)?);
        sheet.write_number(row as u32 + 1, days_col, days as f64)?;
    }
    Ok(())
}

fn write_metric_summary_sheet(
    sheet: &mut Worksheet,
    sheet_name: &str,
    key_header: &str,
    series_label: &str,
    rows: &[MetricSummaryRow],
) -> Result<(), XlsxError> {
    sheet.write_string(0, 0, key_header)?;
    sheet.write_string(0, 1, schema::SALES)?;
    sheet.write_string(0, 2, schema::PROFIT)?;
    sheet.write_string(0, 3, schema::QUANTITY)?;

    for (idx, row) in rows.iter().enumerate() {
        let excel_row = idx as u32 + 1;
        sheet.write_string(excel_row, 0, &row.key)?;
        sheet.write_number(excel_row, 1, row.sales)?;
        sheet.write_number(excel_row, 2, row.profit)?;
        sheet.write_number(excel_row, 3, row.quantity as f64)?;
    }

    if rows.is_empty() {
        return Ok(());
    }

    let (first_row, last_row) = data_row_bounds(rows.len());
    let mut chart = Chart::new(ChartType::Column);
    for (metric_col, metric) in [
        (1u16, schema::SALES),
        (2, schema::PROFIT),
        (3, schema::QUANTITY),
    ] {
        let name = format!("{} by {}", metric, series_label);
        chart
            .add_series()
            .set_name(name.as_str())
            .set_categories((sheet_name, first_row, 0, last_row, 0))
            .set_values((sheet_name, first_row, metric_col, last_row, metric_col));
    }
    sheet.insert_chart(CHART_ANCHOR_ROW, CHART_ANCHOR_COL, &chart)?;
    Ok(())
}

fn write_delivery_sheet(
    sheet: &mut Worksheet,
    rows: &[DeliverySummaryRow],
) -> Result<(), XlsxError> {
    sheet.write_string(0, 0, schema::SHIP_MODE)?;
    sheet.write_string(0, 1, DELIVERY_DAYS_HEADER)?;

    for (idx, row) in rows.iter().enumerate() {
        let excel_row = idx as u32 + 1;
        sheet.write_string(excel_row, 0, &row.ship_mode)?;
        sheet.write_number(excel_row, 1, row.mean_delivery_days)?;
    }

    if rows.is_empty() {
        return Ok(());
    }

    let (first_row, last_row) = data_row_bounds(rows.len());
    let mut chart = Chart::new(ChartType::Column);
    chart
        .add_series()
        .set_name("Delivery Time by Shipment Mode")
        .set_categories(("Shipment_delivery_analysis", first_row, 0, last_row, 0))
        .set_values(("Shipment_delivery_analysis", first_row, 1, last_row, 1));
    sheet.insert_chart(CHART_ANCHOR_ROW, CHART_ANCHOR_COL, &chart)?;
    Ok(())
}
