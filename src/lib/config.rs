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

use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::data::typedef::{CLOSE_COLUMN, DEFAULT_PERIOD, DEFAULT_SYMBOL};
use crate::error::{ForecastError, Result};
use crate::preprocess::typedef::SplitRatio;
use crate::train::typedef::TrainingConfig;
use crate::typedef::Selection;

pub const DEFAULT_WINDOW_SIZE: usize = 8;

/// One end-to-end forecasting run, stored as JSON.
#[derive(Serialize, Deserialize, Clone)]
pub struct WorkbenchConfig {
	/// Directory holding `<SYMBOL>.csv` (or a spreadsheet) per symbol
	pub data_dir: PathBuf,
	pub symbol: String,
	pub period: String,
	/// Column to forecast
	pub feature: String,
	pub split: SplitRatio,
	pub window_size: usize,
	pub training: TrainingConfig,
	pub checkpoint_dir: PathBuf,
	pub predictions_path: PathBuf,
	pub history_path: PathBuf,
}

impl Default for WorkbenchConfig {
	fn default() -> Self {
		Self {
			data_dir: PathBuf::from("data"),
			symbol: String::from(DEFAULT_SYMBOL),
			period: String::from(DEFAULT_PERIOD),
			feature: String::from(CLOSE_COLUMN),
			split: SplitRatio::default(),
			window_size: DEFAULT_WINDOW_SIZE,
			training: TrainingConfig::for_window(DEFAULT_WINDOW_SIZE),
			checkpoint_dir: PathBuf::from("models"),
			predictions_path: PathBuf::from("predictions.csv"),
			history_path: PathBuf::from("loss_history.json"),
		}
	}
}

impl WorkbenchConfig {
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
		let contents = fs::read_to_string(path.as_ref())?;
		let config: WorkbenchConfig = serde_json::from_str(&contents)?;
		config.validate()?;
		Ok(config)
	}

	pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
		fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
		Ok(())
	}

	pub fn validate(&self) -> Result<()> {
		self.split.validate()?;

		if self.window_size == 0 {
			return Err(ForecastError::validation("Window size must be a positive integer"));
		}

		Ok(())
	}

	pub fn selection(&self) -> Selection {
		Selection {
			symbol: self.symbol.clone(),
			feature: self.feature.clone(),
			window_size: self.window_size,
			ratio: self.split,
		}
	}

	/// Training settings with the model sized for this run's windows of `feature_size`-wide steps.
	pub fn training_for(&self, feature_size: usize) -> TrainingConfig {
		let mut training = self.training.clone();
		training.model.input_size = self.window_size;
		training.model = training
			.model
			.clone()
			.with_feature_size(feature_size)
			.with_output_size(feature_size);
		training
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_round_trips_through_json() {
		let directory = tempfile::tempdir().unwrap();
		let path = directory.path().join("workbench.json");

		WorkbenchConfig::default().write_file(&path).unwrap();
		let restored = WorkbenchConfig::from_file(&path).unwrap();

		assert_eq!(restored.symbol, "AAPL");
		assert_eq!(restored.window_size, 8);
		assert_eq!(restored.split, SplitRatio::default());
		assert_eq!(restored.training.epochs, 150);
		assert_eq!(restored.training.batch_size, 16);
		assert_eq!(restored.training.model.lstm_hidden_size, 50);
		assert_eq!(restored.training.model.linear_widths(), vec![10, 6]);
	}

	#[test]
	fn rejects_bad_split_on_load() {
		let directory = tempfile::tempdir().unwrap();
		let path = directory.path().join("workbench.json");

		let mut config = WorkbenchConfig::default();
		config.split = SplitRatio::new(0.5, 0.5, 0.5);
		config.write_file(&path).unwrap();

		assert!(matches!(
			WorkbenchConfig::from_file(&path),
			Err(ForecastError::Validation(_))
		));
	}

	#[test]
	fn training_follows_window_and_width() {
		let mut config = WorkbenchConfig::default();
		config.window_size = 12;

		let training = config.training_for(2);
		assert_eq!(training.model.input_size, 12);
		assert_eq!(training.model.feature_size, 2);
		assert_eq!(training.model.output_size, 2);
	}
}
