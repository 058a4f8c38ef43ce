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

use chrono::{DateTime, Local};
use ndarray::{Array1, Array3, ArrayD, Axis};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum_macros::EnumIter;

use super::scaler::MinMaxScaler;
use crate::error::{ForecastError, Result};
use crate::typedef::TimeTable;

#[derive(PartialEq, Eq, Hash, EnumIter, Deserialize, Serialize, Clone, Copy, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
	Train,
	Validation,
	Test,
}

impl std::fmt::Display for Segment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Segment::Train => write!(f, "train"),
			Segment::Validation => write!(f, "validation"),
			Segment::Test => write!(f, "test"),
		}
	}
}

/// Fractions of the series assigned to each segment.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct SplitRatio {
	pub train: f64,
	pub validation: f64,
	pub test: f64,
}

impl Default for SplitRatio {
	fn default() -> Self {
		Self {
			train: 0.7,
			validation: 0.1,
			test: 0.2,
		}
	}
}

impl SplitRatio {
	pub fn new(train: f64, validation: f64, test: f64) -> Self {
		Self {
			train,
			validation,
			test,
		}
	}

	/// The sum is taken left to right and compared exactly, so `0.7 + 0.1 + 0.2` passes while
	/// `0.6 + 0.3 + 0.1` does not.
	pub fn validate(&self) -> Result<()> {
		if [self.train, self.validation, self.test]
			.iter()
			.any(|each| !each.is_finite() || *each < 0f64)
		{
			return Err(ForecastError::validation(format!(
				"Split proportions must be non-negative, got {self:?}"
			)));
		}

		if self.train + self.validation + self.test != 1f64 {
			return Err(ForecastError::validation(
				"Train, validation, and test sizes must sum to 1.0",
			));
		}

		Ok(())
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SplitData {
	pub train: TimeTable,
	pub validation: TimeTable,
	pub test: TimeTable,
}

impl SplitData {
	pub fn segment(&self, segment: Segment) -> &TimeTable {
		match segment {
			Segment::Train => &self.train,
			Segment::Validation => &self.validation,
			Segment::Test => &self.test,
		}
	}

	pub fn len(&self) -> usize {
		self.train.len() + self.validation.len() + self.test.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Overlapping input windows and the sample right after each one.
#[derive(Clone, Debug, PartialEq)]
pub struct Windows {
	pub inputs: ArrayD<f64>,
	pub targets: ArrayD<f64>,
}

impl Windows {
	pub fn len(&self) -> usize {
		self.inputs.len_of(Axis(0))
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Model-ready tensors of one segment. `inputs` is `(windows, window_size, features)`; `targets` is
/// `(windows,)` for a single feature or `(windows, features)` otherwise. `target_index` holds the timestamp
/// of each target row.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentTensors {
	pub inputs: Array3<f64>,
	pub targets: ArrayD<f64>,
	pub target_index: Vec<DateTime<Local>>,
}

impl SegmentTensors {
	pub fn len(&self) -> usize {
		self.inputs.len_of(Axis(0))
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn feature_size(&self) -> usize {
		self.inputs.len_of(Axis(2))
	}

	pub fn target_width(&self) -> usize {
		match self.targets.ndim() {
			1 => 1,
			_ => self.targets.len_of(Axis(1)),
		}
	}

	/// One column of the (scaled) targets.
	pub fn target_column(&self, column: usize) -> Result<Array1<f64>> {
		if column >= self.target_width() {
			return Err(ForecastError::validation(format!(
				"Target column {} is out of range for width {}",
				column,
				self.target_width()
			)));
		}

		Ok(match self.targets.ndim() {
			1 => self.targets.iter().copied().collect(),
			_ => self.targets.index_axis(Axis(1), column).iter().copied().collect(),
		})
	}
}

#[derive(Clone, Debug)]
pub struct Preprocessed {
	pub train: SegmentTensors,
	pub validation: SegmentTensors,
	pub test: SegmentTensors,
	pub scaler: Arc<MinMaxScaler>,
	pub window_size: usize,
}

impl Preprocessed {
	pub fn segment(&self, segment: Segment) -> &SegmentTensors {
		match segment {
			Segment::Train => &self.train,
			Segment::Validation => &self.validation,
			Segment::Test => &self.test,
		}
	}

	pub fn feature_size(&self) -> usize {
		self.scaler.n_features()
	}
}
