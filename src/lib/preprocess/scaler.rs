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

use ndarray::{Array2, ArrayView1, ArrayView2, Axis, Zip};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ForecastError, Result};
use crate::typedef::TimeTable;

pub const FEATURE_RANGE: (f64, f64) = (-1.0, 1.0);

// Midpoint of FEATURE_RANGE
const PADDING_FILLER: f64 = 0.0;

/// Per-column affine map from the training segment's `[min, max]` onto `feature_range`.
/// Once fitted it never changes; validation/test data and model output go through the same parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MinMaxScaler {
	feature_range: (f64, f64),
	columns: Vec<String>,
	data_min: Vec<f64>,
	data_max: Vec<f64>,
}

impl MinMaxScaler {
	pub fn fit(values: ArrayView2<'_, f64>, columns: &[Arc<String>]) -> Result<Self> {
		if values.nrows() == 0 {
			return Err(ForecastError::validation(
				"Cannot fit the scaler on a table with 0 samples",
			));
		}

		if values.ncols() != columns.len() {
			return Err(ForecastError::validation(format!(
				"Scaler got {} columns but {} column names",
				values.ncols(),
				columns.len()
			)));
		}

		if values.iter().any(|each| !each.is_finite()) {
			return Err(ForecastError::validation(
				"Cannot fit the scaler on missing or infinite values",
			));
		}

		let data_min = values
			.axis_iter(Axis(1))
			.map(|column| column.fold(f64::INFINITY, |last, each| last.min(*each)))
			.collect::<Vec<_>>();
		let data_max = values
			.axis_iter(Axis(1))
			.map(|column| column.fold(f64::NEG_INFINITY, |last, each| last.max(*each)))
			.collect::<Vec<_>>();

		Ok(Self {
			feature_range: FEATURE_RANGE,
			columns: columns.iter().map(|each| each.to_string()).collect(),
			data_min,
			data_max,
		})
	}

	pub fn n_features(&self) -> usize {
		self.data_min.len()
	}

	pub fn columns(&self) -> &[String] {
		&self.columns
	}

	pub fn feature_range(&self) -> (f64, f64) {
		self.feature_range
	}

	pub fn data_min(&self) -> &[f64] {
		&self.data_min
	}

	pub fn data_max(&self) -> &[f64] {
		&self.data_max
	}

	// Constant columns get a unit range so they land on the lower bound instead of dividing by zero
	fn scale(&self, column: usize) -> f64 {
		let (low, high) = self.feature_range;
		let range = self.data_max[column] - self.data_min[column];
		let range = if range == 0f64 { 1f64 } else { range };
		(high - low) / range
	}

	fn offset(&self, column: usize) -> f64 {
		self.feature_range.0 - self.data_min[column] * self.scale(column)
	}

	fn check_width(&self, width: usize) -> Result<()> {
		if width != self.n_features() {
			return Err(ForecastError::validation(format!(
				"Scaler was fitted on {} columns, got {}",
				self.n_features(),
				width
			)));
		}

		Ok(())
	}

	pub fn transform(&self, values: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
		self.check_width(values.ncols())?;

		let mut output = values.to_owned();
		for (column, mut each_column) in output.axis_iter_mut(Axis(1)).enumerate() {
			let (scale, offset) = (self.scale(column), self.offset(column));
			each_column.mapv_inplace(|each| each * scale + offset);
		}

		Ok(output)
	}

	pub fn inverse_transform(&self, values: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
		self.check_width(values.ncols())?;

		let mut output = values.to_owned();
		for (column, mut each_column) in output.axis_iter_mut(Axis(1)).enumerate() {
			let (scale, offset) = (self.scale(column), self.offset(column));
			each_column.mapv_inplace(|each| (each - offset) / scale);
		}

		Ok(output)
	}

	/// Inverts a single column of scaled values. The values are padded into a matrix as wide as the
	/// fitted feature count (other columns hold a neutral filler), inverted as a whole, then the requested
	/// column is extracted.
	pub fn inverse_transform_column(&self, values: &[f64], column: usize) -> Result<Vec<f64>> {
		if column >= self.n_features() {
			return Err(ForecastError::validation(format!(
				"Column {} is out of range for a scaler fitted on {} columns",
				column,
				self.n_features()
			)));
		}

		let mut padded = Array2::<f64>::from_elem((values.len(), self.n_features()), PADDING_FILLER);
		Zip::from(padded.column_mut(column))
			.and(ArrayView1::from(values))
			.for_each(|slot, value| *slot = *value);

		let restored = self.inverse_transform(padded.view())?;
		Ok(restored.column(column).to_vec())
	}

	/// Transforms a table whose column names match the ones this scaler was fitted on.
	pub fn transform_table(&self, table: &TimeTable) -> Result<TimeTable> {
		let names_match = table.width() == self.columns.len()
			&& table
				.columns()
				.iter()
				.zip(self.columns.iter())
				.all(|(left, right)| left.as_str() == right.as_str());

		if !names_match {
			return Err(ForecastError::validation(format!(
				"Table columns {:?} do not match the fitted columns {:?}",
				table.columns(),
				self.columns
			)));
		}

		table.with_values(self.transform(table.values())?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use approx::assert_abs_diff_eq;
	use ndarray::array;

	fn names(count: usize) -> Vec<Arc<String>> {
		(0..count).map(|i| Arc::new(format!("value{i}"))).collect()
	}

	#[test]
	fn maps_training_extremes_onto_feature_range() {
		let train = array![[10.0], [15.0], [20.0]];
		let scaler = MinMaxScaler::fit(train.view(), &names(1)).unwrap();

		let scaled = scaler.transform(train.view()).unwrap();
		assert_abs_diff_eq!(scaled[[0, 0]], -1.0, epsilon = 1e-12);
		assert_abs_diff_eq!(scaled[[1, 0]], 0.0, epsilon = 1e-12);
		assert_abs_diff_eq!(scaled[[2, 0]], 1.0, epsilon = 1e-12);
	}

	#[test]
	fn transforming_other_segments_keeps_fitted_parameters() {
		let train = array![[1.0, 100.0], [3.0, 300.0]];
		let scaler = MinMaxScaler::fit(train.view(), &names(2)).unwrap();
		let fitted = scaler.clone();

		// Out-of-range data is not clipped and does not refit
		let test = array![[5.0, 500.0], [-1.0, 0.0]];
		let scaled = scaler.transform(test.view()).unwrap();

		assert_eq!(scaler, fitted);
		assert_abs_diff_eq!(scaled[[0, 0]], 3.0, epsilon = 1e-12);
		assert_abs_diff_eq!(scaled[[1, 1]], -2.0, epsilon = 1e-12);
	}

	#[test]
	fn padded_inversion_round_trips_every_column() {
		let train = array![[1.0, 50.0, -3.0], [2.0, 70.0, 4.0], [4.0, 60.0, 0.5]];
		let scaler = MinMaxScaler::fit(train.view(), &names(3)).unwrap();
		let scaled = scaler.transform(train.view()).unwrap();

		for column in 0..3 {
			let restored = scaler
				.inverse_transform_column(&scaled.column(column).to_vec(), column)
				.unwrap();

			for (left, right) in restored.iter().zip(train.column(column).iter()) {
				assert_abs_diff_eq!(*left, *right, epsilon = 1e-9);
			}
		}
	}

	#[test]
	fn constant_column_maps_to_lower_bound() {
		let train = array![[7.0], [7.0], [7.0]];
		let scaler = MinMaxScaler::fit(train.view(), &names(1)).unwrap();

		let scaled = scaler.transform(train.view()).unwrap();
		assert!(scaled.iter().all(|each| (*each + 1.0).abs() < 1e-12));

		let restored = scaler.inverse_transform(scaled.view()).unwrap();
		assert!(restored.iter().all(|each| (*each - 7.0).abs() < 1e-12));
	}

	#[test]
	fn rejects_empty_and_mismatched_input() {
		let empty = Array2::<f64>::zeros((0, 1));
		assert!(matches!(
			MinMaxScaler::fit(empty.view(), &names(1)),
			Err(ForecastError::Validation(_))
		));

		let scaler = MinMaxScaler::fit(array![[1.0], [2.0]].view(), &names(1)).unwrap();
		assert!(matches!(
			scaler.transform(array![[1.0, 2.0]].view()),
			Err(ForecastError::Validation(_))
		));
		assert!(matches!(
			scaler.inverse_transform_column(&[0.0], 1),
			Err(ForecastError::Validation(_))
		));
	}
}
