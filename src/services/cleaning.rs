use std::collections::HashSet;

use crate::error::{DateParseError, PipelineError};
use crate::models::{Cell, ColumnKind, Table};
use crate::services::dates::DateNormalizer;

/// Sentinel substituted for missing text values.
pub const UNKNOWN: &str = "Unknown";

/// Orchestrates the fixed cleaning sequence: deduplicate, normalize dates,
/// trim text, impute missing text, impute missing numbers. Later steps
/// assume the earlier ones have run, so the order is not negotiable.
pub struct DataCleaner {
    dates: DateNormalizer,
}

impl Default for DataCleaner {
    fn default() -> Self {
        Self {
            dates: DateNormalizer::new(),
        }
    }
}

impl DataCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalizer(dates: DateNormalizer) -> Self {
        Self { dates }
    }

    /// Single-pass batch clean of an owned table. The first unparseable
    /// date aborts the run; there is no partially cleaned output.
    pub fn clean(&self, mut table: Table) -> Result<Table, PipelineError> {
        deduplicate(&mut table);
        self.normalize_dates(&mut table)?;
        trim_text(&mut table);
        impute_missing_text(&mut table);
        impute_missing_numbers(&mut table);
        Ok(table)
    }

    fn normalize_dates(&self, table: &mut Table) -> Result<(), PipelineError> {
        let date_columns = columns_of_kind(table, ColumnKind::Date);

        for (row_idx, row) in table.rows_mut().iter_mut().enumerate() {
            for (col, name) in &date_columns {
                let cell = &mut row[*col];
                match cell {
                    // Already canonical, e.g. a native spreadsheet date.
                    Cell::Date(_) => {}
                    Cell::Text(raw) => {
                        let date = self.dates.normalize(raw).map_err(|source| {
                            PipelineError::DateParse {
                                row: row_idx + 1,
                                column: name.clone(),
                                source,
                            }
                        })?;
                        *cell = Cell::Date(date);
                    }
                    // A date column cannot be imputed; an absent date is as
                    // fatal as an unreadable one.
                    Cell::Missing => {
                        return Err(PipelineError::DateParse {
                            row: row_idx + 1,
                            column: name.clone(),
                            source: DateParseError {
                                value: String::new(),
                            },
                        });
                    }
                    Cell::Int(_) | Cell::Real(_) => {
                        return Err(PipelineError::UnexpectedType {
                            row: row_idx + 1,
                            column: name.clone(),
                            expected: "date",
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Remove rows that duplicate an earlier row across all columns. First
/// occurrence wins; surviving rows keep their relative order.
fn deduplicate(table: &mut Table) {
    let mut seen: HashSet<Vec<Cell>> = HashSet::with_capacity(table.height());
    table.rows_mut().retain(|row| seen.insert(row.clone()));
}

fn trim_text(table: &mut Table) {
    let text_columns = columns_of_kind(table, ColumnKind::Text);

    for row in table.rows_mut() {
        for (col, _) in &text_columns {
            if let Cell::Text(value) = &mut row[*col] {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_string();
                }
            }
        }
    }
}

fn impute_missing_text(table: &mut Table) {
    let text_columns = columns_of_kind(table, ColumnKind::Text);

    for row in table.rows_mut() {
        for (col, _) in &text_columns {
            if matches!(row[*col], Cell::Missing) {
                row[*col] = Cell::Text(UNKNOWN.to_string());
            }
        }
    }
}

fn impute_missing_numbers(table: &mut Table) {
    let integer_columns = columns_of_kind(table, ColumnKind::Integer);
    let real_columns = columns_of_kind(table, ColumnKind::Real);

    for row in table.rows_mut() {
        for (col, _) in &integer_columns {
            if matches!(row[*col], Cell::Missing) {
                row[*col] = Cell::Int(0);
            }
        }
        for (col, _) in &real_columns {
            if matches!(row[*col], Cell::Missing) {
                row[*col] = Cell::Real(0.0);
            }
        }
    }
}

fn columns_of_kind(table: &Table, kind: ColumnKind) -> Vec<(usize, String)> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, spec)| spec.kind == kind)
        .map(|(idx, spec)| (idx, spec.name.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::schema;
    use chrono::NaiveDate;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn raw_row(
        order_id: &str,
        order_date: Cell,
        ship_date: Cell,
        region: Cell,
        product: Cell,
        sales: Cell,
        profit: Cell,
        quantity: Cell,
        ship_mode: Cell,
    ) -> Vec<Cell> {
        vec![
            text(order_id),
            order_date,
            ship_date,
            region,
            product,
            sales,
            profit,
            quantity,
            ship_mode,
        ]
    }

    fn simple_row(order_id: &str) -> Vec<Cell> {
        raw_row(
            order_id,
            text("05/03/2023"),
            text("08/03/2023"),
            text("East"),
            text("P-1"),
            Cell::Real(100.0),
            Cell::Real(20.0),
            Cell::Int(2),
            text("Standard"),
        )
    }

    fn raw_table(rows: Vec<Vec<Cell>>) -> Table {
        let mut table = Table::new(schema::sales_columns());
        for row in rows {
            table.push_row(row);
        }
        table
    }

    #[test]
    fn duplicate_rows_keep_the_first_occurrence() {
        let table = raw_table(vec![
            simple_row("A-1"),
            simple_row("A-2"),
            simple_row("A-1"),
            simple_row("A-3"),
        ]);
        let cleaned = DataCleaner::new().clean(table).unwrap();

        assert_eq!(cleaned.height(), 3);
        assert_eq!(cleaned.text(0, 0).unwrap(), "A-1");
        assert_eq!(cleaned.text(1, 0).unwrap(), "A-2");
        assert_eq!(cleaned.text(2, 0).unwrap(), "A-3");
    }

    #[test]
    fn dates_are_normalized_through_both_paths() {
        let mut row = simple_row("A-1");
        row[1] = text("05/03/2023");
        row[2] = text("March 8, 2023");
        let cleaned = DataCleaner::new().clean(raw_table(vec![row])).unwrap();

        assert_eq!(
            cleaned.date(0, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 5).unwrap()
        );
        assert_eq!(
            cleaned.date(0, 2).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 8).unwrap()
        );
    }

    #[test]
    fn text_columns_are_trimmed() {
        let mut row = simple_row("A-1");
        row[3] = text("  East  ");
        row[8] = text("Standard\t");
        let cleaned = DataCleaner::new().clean(raw_table(vec![row])).unwrap();

        assert_eq!(cleaned.text(0, 3).unwrap(), "East");
        assert_eq!(cleaned.text(0, 8).unwrap(), "Standard");
    }

    #[test]
    fn missing_values_are_imputed_by_declared_kind() {
        let mut row = simple_row("A-1");
        row[3] = Cell::Missing; // Region (text)
        row[5] = Cell::Missing; // Sales (real)
        row[7] = Cell::Missing; // Quantity (integer)
        let cleaned = DataCleaner::new().clean(raw_table(vec![row])).unwrap();

        assert_eq!(cleaned.text(0, 3).unwrap(), UNKNOWN);
        assert_eq!(cleaned.real(0, 5).unwrap(), 0.0);
        assert_eq!(cleaned.int(0, 7).unwrap(), 0);
    }

    #[test]
    fn all_digit_id_column_stays_text() {
        let mut row = simple_row("0042");
        row[0] = text("0042");
        let cleaned = DataCleaner::new().clean(raw_table(vec![row])).unwrap();

        assert_eq!(cleaned.text(0, 0).unwrap(), "0042");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let table = raw_table(vec![
            simple_row("A-1"),
            simple_row("A-1"),
            {
                let mut row = simple_row("A-2");
                row[3] = text("  West ");
                row[6] = Cell::Missing;
                row
            },
        ]);

        let cleaner = DataCleaner::new();
        let once = cleaner.clean(table).unwrap();
        let twice = cleaner.clean(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unparseable_date_aborts_with_row_context() {
        let table = raw_table(vec![simple_row("A-1"), {
            let mut row = simple_row("A-2");
            row[2] = text("whenever");
            row
        }]);

        let err = DataCleaner::new().clean(table).unwrap_err();
        match err {
            PipelineError::DateParse { row, column, source } => {
                assert_eq!(row, 2);
                assert_eq!(column, schema::SHIP_DATE);
                assert_eq!(source.value, "whenever");
            }
            other => panic!("expected a date parse error, got {other}"),
        }
    }

    #[test]
    fn missing_date_is_fatal() {
        let mut row = simple_row("A-1");
        row[1] = Cell::Missing;
        let err = DataCleaner::new().clean(raw_table(vec![row])).unwrap_err();
        assert!(matches!(err, PipelineError::DateParse { row: 1, .. }));
    }
}
