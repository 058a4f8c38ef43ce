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

use burn::backend::{ndarray::NdArrayDevice, NdArray};
use chrono::{DateTime, Local};
use ndarray::{concatenate, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, ops::Range, sync::Arc};
use tracing::info;

use crate::error::{ForecastError, Result};
use crate::evaluate::typedef::Predictions;
use crate::preprocess::typedef::{Preprocessed, SplitData, SplitRatio};
use crate::train::typedef::TrainedForecaster;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
	String(String),
	Number(f64),
	DateTime(DateTime<Local>),
	Boolean(bool),
}

impl Default for CellValue {
	fn default() -> Self {
		CellValue::String(String::new())
	}
}

impl CellValue {
	/// Numeric view of the cell. Blank cells read as missing (NaN), anything else non-numeric is `None`.
	pub fn as_number(&self) -> Option<f64> {
		match self {
			CellValue::Number(number) => Some(*number),
			CellValue::String(text) if text.trim().is_empty() => Some(f64::NAN),
			_ => None,
		}
	}
}

/// Column-major view of one instrument: a strictly increasing timestamp index with named `f64` columns.
/// Missing observations are stored as NaN.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeTable {
	index: Vec<DateTime<Local>>,
	columns: Vec<Arc<String>>,
	values: Array2<f64>,
}

impl TimeTable {
	pub fn new(
		index: Vec<DateTime<Local>>,
		columns: Vec<Arc<String>>,
		values: Array2<f64>,
	) -> Result<Self> {
		if values.nrows() != index.len() {
			return Err(ForecastError::validation(format!(
				"Table has {} rows but {} timestamps",
				values.nrows(),
				index.len()
			)));
		}

		if values.ncols() != columns.len() {
			return Err(ForecastError::validation(format!(
				"Table has {} columns but {} column names",
				values.ncols(),
				columns.len()
			)));
		}

		if let Some(duplicate) = columns
			.iter()
			.enumerate()
			.find(|(i, name)| columns[..*i].contains(*name))
			.map(|(_, name)| name)
		{
			return Err(ForecastError::validation(format!(
				"Column \"{duplicate}\" appears more than once"
			)));
		}

		if let Some(pair) = index.windows(2).find(|pair| pair[0] >= pair[1]) {
			return Err(ForecastError::validation(format!(
				"Timestamps must be strictly increasing, found {} followed by {}",
				pair[0].to_rfc3339(),
				pair[1].to_rfc3339()
			)));
		}

		Ok(Self {
			index,
			columns,
			values,
		})
	}

	/// Builds a table from parsed cells, rejecting anything that is not a number or a blank.
	pub fn from_cells(
		index: Vec<DateTime<Local>>,
		columns: Vec<Arc<String>>,
		rows: &[Vec<CellValue>],
	) -> Result<Self> {
		let width = columns.len();
		let mut values = Array2::<f64>::from_elem((rows.len(), width), f64::NAN);

		for (row_index, row) in rows.iter().enumerate() {
			for (column_index, cell) in row.iter().take(width).enumerate() {
				values[[row_index, column_index]] = cell.as_number().ok_or_else(|| {
					ForecastError::Type(format!(
						"Column \"{}\" holds non-numeric value {:?} at row {}",
						columns[column_index], cell, row_index
					))
				})?;
			}
		}

		Self::new(index, columns, values)
	}

	pub fn index(&self) -> &[DateTime<Local>] {
		&self.index
	}

	pub fn columns(&self) -> &[Arc<String>] {
		&self.columns
	}

	pub fn values(&self) -> ArrayView2<'_, f64> {
		self.values.view()
	}

	pub fn len(&self) -> usize {
		self.index.len()
	}

	pub fn is_empty(&self) -> bool {
		self.index.is_empty()
	}

	pub fn width(&self) -> usize {
		self.columns.len()
	}

	pub fn has_column(&self, name: &str) -> bool {
		self.columns.iter().any(|each| each.as_str() == name)
	}

	pub fn column_position(&self, name: &str) -> Result<usize> {
		self.columns
			.iter()
			.position(|each| each.as_str() == name)
			.ok_or_else(|| ForecastError::lookup(name))
	}

	pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>> {
		let position = self.column_position(name)?;
		Ok(self.values.column(position))
	}

	/// Single-column table sharing this table's index.
	pub fn select(&self, name: &str) -> Result<TimeTable> {
		let position = self.column_position(name)?;
		Ok(Self {
			index: self.index.clone(),
			columns: vec![self.columns[position].clone()],
			values: self.values.column(position).to_owned().insert_axis(Axis(1)),
		})
	}

	/// Contiguous, order-preserving row range.
	pub fn rows(&self, range: Range<usize>) -> TimeTable {
		Self {
			index: self.index[range.clone()].to_vec(),
			columns: self.columns.clone(),
			values: self.values.slice(ndarray::s![range, ..]).to_owned(),
		}
	}

	/// Rows stamped at or after `start`.
	pub fn since(&self, start: DateTime<Local>) -> TimeTable {
		let offset = self.index.partition_point(|each| *each < start);
		self.rows(offset..self.len())
	}

	/// Same index and column names over new values of identical shape.
	pub fn with_values(&self, values: Array2<f64>) -> Result<TimeTable> {
		if values.dim() != self.values.dim() {
			return Err(ForecastError::validation(format!(
				"Expected values of shape {:?}, got {:?}",
				self.values.dim(),
				values.dim()
			)));
		}

		Ok(Self {
			index: self.index.clone(),
			columns: self.columns.clone(),
			values,
		})
	}

	/// Appends a column, or replaces it when the name already exists.
	pub fn with_column(&self, name: &str, column: Array1<f64>) -> Result<TimeTable> {
		if column.len() != self.len() {
			return Err(ForecastError::validation(format!(
				"Column \"{name}\" has {} values but the table has {} rows",
				column.len(),
				self.len()
			)));
		}

		let mut table = self.clone();
		match table.column_position(name) {
			Ok(position) => table.values.column_mut(position).assign(&column),
			Err(_) => {
				table.values = concatenate(
					Axis(1),
					&[table.values.view(), column.view().insert_axis(Axis(1))],
				)?;
				table.columns.push(Arc::new(name.to_string()));
			}
		}

		Ok(table)
	}

	pub fn has_missing(&self) -> bool {
		self.values.iter().any(|each| each.is_nan())
	}

	pub fn has_infinite(&self) -> bool {
		self.values.iter().any(|each| each.is_infinite())
	}
}

/// What the user picked to forecast.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
	pub symbol: String,
	pub feature: String,
	pub window_size: usize,
	pub ratio: SplitRatio,
}

/// Everything gathered so far in one forecasting session. Each stage is an immutable handle; moving to a
/// new stage returns a new state and drops whatever depended on the stage being replaced.
#[derive(Default, Clone, Debug)]
pub struct PipelineState {
	stock_data: Option<Arc<BTreeMap<String, TimeTable>>>,
	selection: Option<Selection>,
	split_data: Option<Arc<SplitData>>,
	preprocessed: Option<Arc<Preprocessed>>,
	trained: Option<Arc<TrainedForecaster<NdArray>>>,
}

impl PipelineState {
	pub fn gathered(stock_data: BTreeMap<String, TimeTable>) -> Self {
		Self {
			stock_data: Some(Arc::new(stock_data)),
			..Default::default()
		}
	}

	pub fn stock_data(&self) -> Option<&BTreeMap<String, TimeTable>> {
		self.stock_data.as_deref()
	}

	pub fn selection(&self) -> Option<&Selection> {
		self.selection.as_ref()
	}

	pub fn split_data(&self) -> Option<&Arc<SplitData>> {
		self.split_data.as_ref()
	}

	pub fn preprocessed(&self) -> Option<&Arc<Preprocessed>> {
		self.preprocessed.as_ref()
	}

	pub fn trained(&self) -> Option<&Arc<TrainedForecaster<NdArray>>> {
		self.trained.as_ref()
	}

	/// Splits the selected column. Anything derived from a previous split is discarded.
	pub fn with_split(&self, selection: Selection) -> Result<Self> {
		let stock_data = self.stock_data.as_ref().ok_or_else(|| {
			ForecastError::validation("No data available, gather stock data first")
		})?;

		let split_data = crate::preprocess::command::split_dataset_sequentially(
			stock_data,
			(selection.symbol.as_str(), selection.feature.as_str()),
			selection.ratio,
		)?;

		Ok(Self {
			stock_data: Some(stock_data.clone()),
			selection: Some(selection),
			split_data: Some(Arc::new(split_data)),
			preprocessed: None,
			trained: None,
		})
	}

	/// Splits then preprocesses the selected column. Any previously trained model is discarded.
	pub fn with_preprocessing(&self, selection: Selection) -> Result<Self> {
		let state = self.with_split(selection)?;
		let (Some(split_data), Some(selection)) = (state.split_data.as_ref(), state.selection.as_ref())
		else {
			return Err(ForecastError::validation("Split stage is incomplete"));
		};

		let preprocessed = crate::preprocess::command::preprocess(
			&split_data.train,
			&split_data.validation,
			&split_data.test,
			selection.window_size,
		)?;

		info!(
			symbol = %selection.symbol,
			feature = %selection.feature,
			window_size = selection.window_size,
			"Preprocessing stage ready"
		);

		Ok(Self {
			preprocessed: Some(Arc::new(preprocessed)),
			..state
		})
	}

	/// Replaces the trained stage. Requires preprocessing to have happened.
	pub fn with_trained(&self, trained: TrainedForecaster<NdArray>) -> Result<Self> {
		if self.preprocessed.is_none() {
			return Err(ForecastError::validation(
				"Missing preprocessing data, complete data preprocessing first",
			));
		}

		Ok(Self {
			trained: Some(Arc::new(trained)),
			..self.clone()
		})
	}

	pub fn predictions(&self) -> Result<Predictions> {
		let preprocessed = self.preprocessed.as_ref().ok_or_else(|| {
			ForecastError::validation("Missing preprocessing data, complete data preprocessing first")
		})?;
		let trained = self.trained.as_ref().ok_or_else(|| {
			ForecastError::validation("No trained model available, train the model first")
		})?;

		crate::evaluate::command::predict(&trained.model, preprocessed, &NdArrayDevice::Cpu)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, TimeZone};
	use ndarray::array;

	fn index(count: usize) -> Vec<DateTime<Local>> {
		let start = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		(0..count).map(|i| start + Duration::days(i as i64)).collect()
	}

	fn names(names: &[&str]) -> Vec<Arc<String>> {
		names.iter().map(|each| Arc::new(each.to_string())).collect()
	}

	#[test]
	fn rejects_unordered_index() {
		let mut stamps = index(3);
		stamps.swap(0, 1);
		let result = TimeTable::new(stamps, names(&["Close"]), array![[1.0], [2.0], [3.0]]);
		assert!(matches!(result, Err(ForecastError::Validation(_))));
	}

	#[test]
	fn select_keeps_index_and_name() {
		let table = TimeTable::new(
			index(3),
			names(&["Open", "Close"]),
			array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0]],
		)
		.unwrap();

		let close = table.select("Close").unwrap();
		assert_eq!(close.index(), table.index());
		assert_eq!(close.columns()[0].as_str(), "Close");
		assert_eq!(close.values(), array![[10.0], [20.0], [30.0]]);

		assert!(matches!(table.select("Volume"), Err(ForecastError::Lookup(_))));
	}

	#[test]
	fn from_cells_rejects_text() {
		let rows = vec![
			vec![CellValue::Number(1.0)],
			vec![CellValue::String(String::from("n/a"))],
		];
		let result = TimeTable::from_cells(index(2), names(&["Close"]), &rows);
		assert!(matches!(result, Err(ForecastError::Type(_))));
	}

	#[test]
	fn from_cells_reads_blank_as_missing() {
		let rows = vec![
			vec![CellValue::Number(1.0)],
			vec![CellValue::String(String::new())],
		];
		let table = TimeTable::from_cells(index(2), names(&["Close"]), &rows).unwrap();
		assert!(table.has_missing());
		assert!(!table.has_infinite());
	}

	#[test]
	fn with_column_appends_then_replaces() {
		let table = TimeTable::new(index(2), names(&["Close"]), array![[1.0], [2.0]]).unwrap();

		let appended = table.with_column("Volume", array![5.0, 6.0]).unwrap();
		assert_eq!(appended.width(), 2);

		let replaced = appended.with_column("Close", array![7.0, 8.0]).unwrap();
		assert_eq!(replaced.width(), 2);
		assert_eq!(replaced.column("Close").unwrap(), array![7.0, 8.0]);
	}

	#[test]
	fn since_trims_older_rows() {
		let stamps = index(5);
		let table = TimeTable::new(
			stamps.clone(),
			names(&["Close"]),
			array![[1.0], [2.0], [3.0], [4.0], [5.0]],
		)
		.unwrap();

		let recent = table.since(stamps[3]);
		assert_eq!(recent.len(), 2);
		assert_eq!(recent.index()[0], stamps[3]);
	}

	#[test]
	fn pipeline_requires_data_before_preprocessing() {
		let state = PipelineState::default();
		let selection = Selection {
			symbol: String::from("AAPL"),
			feature: String::from("Close"),
			window_size: 8,
			ratio: SplitRatio::default(),
		};

		assert!(matches!(
			state.with_preprocessing(selection),
			Err(ForecastError::Validation(_))
		));
	}
}
