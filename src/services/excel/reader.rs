use std::io::Cursor;

use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};

use crate::error::{AppError, PipelineError};
use crate::models::{Cell, ColumnKind, ColumnSpec, Table};
use crate::services::schema;

/// Read the first worksheet of an XLSX document into a raw typed table.
///
/// The header row is matched against the declared schema verbatim, no
/// renaming, since the column check is case-sensitive. Ingestion is the
/// schema gate: a missing required column means the pipeline never runs.
pub fn read_raw_table(file_data: Bytes) -> Result<Table, AppError> {
    let cursor = Cursor::new(file_data);

    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor)
        .map_err(|e| AppError::FileProcessingError(format!("Failed to open Excel file: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| AppError::FileProcessingError("No sheets found in workbook".to_string()))?;

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        AppError::FileProcessingError(format!("Failed to read worksheet {}: {}", sheet_name, e))
    })?;

    let rows: Vec<Vec<Data>> = range.rows().map(|row| row.to_vec()).collect();
    let header_row = rows
        .first()
        .ok_or_else(|| AppError::FileProcessingError("Worksheet has no header row".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(|cell| cell.to_string()).collect();

    let missing = schema::missing_columns(&headers);
    if !missing.is_empty() {
        return Err(AppError::SchemaError(
            missing.iter().map(|name| name.to_string()).collect(),
        ));
    }

    let columns = schema::sales_columns();
    let indices = columns
        .iter()
        .map(|spec| {
            headers
                .iter()
                .position(|header| header == spec.name)
                .ok_or_else(|| {
                    AppError::Internal(format!("column '{}' vanished after validation", spec.name))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut table = Table::new(columns.clone());
    for (row_idx, row) in rows.iter().enumerate().skip(1) {
        let mut cells = Vec::with_capacity(columns.len());
        for (spec, &col_idx) in columns.iter().zip(&indices) {
            let value = row.get(col_idx).unwrap_or(&Data::Empty);
            cells.push(convert_cell(value, spec, row_idx).map_err(AppError::Pipeline)?);
        }
        table.push_row(cells);
    }

    Ok(table)
}

/// Convert one raw cell by the column's declared kind. Date strings are
/// kept as text for the cleaner to normalize; native spreadsheet dates are
/// already canonical.
fn convert_cell(value: &Data, spec: &ColumnSpec, row: usize) -> Result<Cell, PipelineError> {
    let unexpected = |expected: &'static str| PipelineError::UnexpectedType {
        row,
        column: spec.name.to_string(),
        expected,
    };

    Ok(match spec.kind {
        ColumnKind::Text => match value {
            Data::Empty => Cell::Missing,
            Data::String(s) => Cell::Text(s.clone()),
            other => Cell::Text(other.to_string()),
        },
        ColumnKind::Real => match value {
            Data::Empty => Cell::Missing,
            Data::Float(f) => Cell::Real(*f),
            Data::Int(i) => Cell::Real(*i as f64),
            Data::String(s) if s.trim().is_empty() => Cell::Missing,
            Data::String(s) => Cell::Real(s.trim().parse().map_err(|_| unexpected("numeric"))?),
            _ => return Err(unexpected("numeric")),
        },
        ColumnKind::Integer => match value {
            Data::Empty => Cell::Missing,
            Data::Int(i) => Cell::Int(*i),
            Data::Float(f) if f.fract() == 0.0 => Cell::Int(*f as i64),
            Data::String(s) if s.trim().is_empty() => Cell::Missing,
            Data::String(s) => Cell::Int(s.trim().parse().map_err(|_| unexpected("integer"))?),
            _ => return Err(unexpected("integer")),
        },
        ColumnKind::Date => match value {
            Data::Empty => Cell::Missing,
            Data::String(s) => Cell::Text(s.clone()),
            Data::DateTime(_) | Data::DateTimeIso(_) => value
                .as_date()
                .map(Cell::Date)
                .ok_or_else(|| unexpected("date"))?,
            _ => return Err(unexpected("date")),
        },
    })
}
