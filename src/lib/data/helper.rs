/*
 * Ticker-LSTM, a stock price forecasting workbench built on LSTM
 * Copyright (C) 2025 Athaariq A. Ramadhani <foss@athaariq.my.id>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <http://www.gnu.org/licenses/>.
 */

use std::{path::Path, sync::Arc};

use calamine::{Data, DataType, Reader};
use chrono::{DateTime, Local, MappedLocalTime};
use ndarray::{Array1, ArrayView1};
use parse_datetime::parse_datetime;
use tracing::debug;

use super::typedef::*;
use crate::error::{ForecastError, Result};
use crate::typedef::{CellValue, TimeTable};

/// Numbers are tried before date-times so that plain figures never turn into timestamps.
pub(super) fn parse_cell(cell: &str) -> CellValue {
	if cell.trim().is_empty() {
		CellValue::String(String::new())
	} else if let Ok(number_value) = cell.trim().parse::<f64>() {
		CellValue::Number(number_value)
	} else if let Ok(boolean_value) = cell.trim().parse::<bool>() {
		CellValue::Boolean(boolean_value)
	} else if let Ok(datetime_value) = parse_datetime(cell) {
		CellValue::DateTime(datetime_value.into())
	} else {
		CellValue::String(cell.to_string())
	}
}

pub(super) fn unwrap_timezone_assumption(
	timezone: MappedLocalTime<DateTime<Local>>,
	raw_cell: &Data,
) -> CellValue {
	match timezone {
		chrono::offset::LocalResult::Single(datetime) => CellValue::DateTime(datetime),
		chrono::offset::LocalResult::Ambiguous(earliest, _latest) => CellValue::DateTime(earliest),
		chrono::offset::LocalResult::None => CellValue::String(raw_cell.to_string()),
	}
}

fn spreadsheet_cell(cell: &Data) -> CellValue {
	match cell {
		Data::Int(_) | Data::Float(_) => CellValue::Number(cell.as_f64().unwrap_or(f64::NAN)),
		Data::Bool(boolean_value) => CellValue::Boolean(*boolean_value),
		Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
			Some(datetime_value) => {
				unwrap_timezone_assumption(datetime_value.and_local_timezone(Local), cell)
			}
			None => parse_cell(cell.to_string().as_str()),
		},
		Data::Empty => CellValue::String(String::new()),
		_ => parse_cell(cell.to_string().as_str()),
	}
}

pub(super) fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<CellValue>>)> {
	let mut reader = csv::Reader::from_path(path)?;
	let headers = reader
		.headers()?
		.iter()
		.map(|each| each.trim().to_string())
		.collect::<Vec<_>>();

	let rows = reader
		.records()
		.map(|each| -> Result<Vec<CellValue>> { Ok(each?.iter().map(parse_cell).collect()) })
		.collect::<Result<Vec<_>>>()?;

	Ok((headers, rows))
}

/// Reads the first sheet. The first row is the header.
pub(super) fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<Vec<CellValue>>)> {
	let mut workbook = calamine::open_workbook_auto(path)?;
	let sheet = workbook
		.worksheet_range_at(0)
		.ok_or_else(|| ForecastError::validation(format!("{} has no sheet", path.display())))??;

	let headers = sheet
		.headers()
		.ok_or_else(|| ForecastError::validation("The first sheet has no header"))?;

	let rows = sheet
		.rows()
		.skip(1) // Skip header row
		.map(|each| each.iter().map(spreadsheet_cell).collect::<Vec<_>>())
		.collect::<Vec<_>>();

	Ok((headers, rows))
}

/// Picks the first all-timestamp column as the index and every numeric column as a feature, then
/// orders the rows by time.
pub(super) fn build_table(headers: &[String], rows: Vec<Vec<CellValue>>) -> Result<TimeTable> {
	let cell_at = |row: &Vec<CellValue>, column: usize| row.get(column).cloned().unwrap_or_default();

	let index_column = (0..headers.len())
		.find(|column| {
			!rows.is_empty()
				&& rows
					.iter()
					.all(|row| matches!(cell_at(row, *column), CellValue::DateTime(_)))
		})
		.ok_or_else(|| ForecastError::validation("No date/time column found"))?;

	let feature_columns = (0..headers.len())
		.filter(|column| *column != index_column)
		.filter(|column| {
			let numeric = rows
				.iter()
				.all(|row| cell_at(row, *column).as_number().is_some());
			if !numeric {
				debug!(column = %headers[*column], "Skipping non-numeric column");
			}
			numeric
		})
		.collect::<Vec<_>>();

	let mut stamped_rows = rows
		.iter()
		.filter_map(|row| match cell_at(row, index_column) {
			CellValue::DateTime(stamp) => Some((
				stamp,
				feature_columns
					.iter()
					.map(|column| cell_at(row, *column))
					.collect::<Vec<_>>(),
			)),
			_ => None,
		})
		.collect::<Vec<_>>();
	stamped_rows.sort_by_key(|(stamp, _)| *stamp);

	let (index, cells): (Vec<_>, Vec<_>) = stamped_rows.into_iter().unzip();
	let columns = feature_columns
		.iter()
		.map(|column| Arc::new(headers[*column].clone()))
		.collect::<Vec<_>>();

	TimeTable::from_cells(index, columns, &cells)
}

pub(super) fn filter_period(table: &TimeTable, period: Period) -> TimeTable {
	match table.index().last().and_then(|latest| period.start_from(*latest)) {
		Some(start) => table.since(start),
		None => table.clone(),
	}
}

/// Row-to-row percentage change. The first row has no predecessor and stays missing.
pub(super) fn change_percent(close: ArrayView1<'_, f64>) -> Array1<f64> {
	let mut output = Array1::<f64>::from_elem(close.len(), f64::NAN);
	for i in 1..close.len() {
		output[i] = (close[i] / close[i - 1] - 1f64) * 100f64;
	}

	output
}

pub(super) fn validate_symbol(symbol: &str) -> Result<()> {
	let valid = !symbol.is_empty()
		&& symbol
			.chars()
			.all(|each| each.is_ascii_alphanumeric() || matches!(each, '.' | '-' | '^' | '='));

	if !valid {
		return Err(ForecastError::Acquisition {
			symbol: symbol.to_string(),
			reason: String::from("not a valid ticker symbol"),
		});
	}

	Ok(())
}

pub(super) fn column_summary(column: ArrayView1<'_, f64>) -> ColumnSummary {
	let present = column.iter().copied().filter(|each| !each.is_nan()).collect::<Vec<_>>();
	let count = present.len();

	let mean = present.iter().sum::<f64>() / count as f64;
	let deviations = present
		.iter()
		.fold(0f64, |last_value, each| last_value + (*each - mean).powf(2f64));
	let std = (deviations / (count as f64 - 1f64)).sqrt();

	ColumnSummary {
		count,
		mean,
		std,
		min: present.iter().copied().fold(f64::NAN, f64::min),
		max: present.iter().copied().fold(f64::NAN, f64::max),
		missing: column.len() - count,
	}
}
