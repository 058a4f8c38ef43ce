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

use std::{fs::File, io::BufWriter, path::Path};

use burn::tensor::backend::Backend;
use strum::IntoEnumIterator;
use tracing::info;

use super::helper::*;
use super::typedef::*;
use crate::error::Result;
use crate::preprocess::typedef::{Preprocessed, Segment};
use crate::train::{model::LstmNetwork, typedef::LossHistory};

/// Runs `model` over the windows of every segment and maps both the targets and the first output column
/// back to price units with the fitted scaler.
pub fn predict<B: Backend>(
	model: &LstmNetwork<B>,
	preprocessed: &Preprocessed,
	device: &B::Device,
) -> Result<Predictions> {
	let scaler = preprocessed.scaler.as_ref();

	let predictions = Predictions {
		train: predict_segment(model, &preprocessed.train, scaler, Segment::Train, device)?,
		validation: predict_segment(
			model,
			&preprocessed.validation,
			scaler,
			Segment::Validation,
			device,
		)?,
		test: predict_segment(model, &preprocessed.test, scaler, Segment::Test, device)?,
	};

	info!(
		train = predictions.train.predicted.len(),
		validation = predictions.validation.predicted.len(),
		test = predictions.test.predicted.len(),
		"Prediction finished"
	);

	Ok(predictions)
}

impl Predictions {
	pub fn segment(&self, segment: Segment) -> &SegmentPrediction {
		match segment {
			Segment::Train => &self.train,
			Segment::Validation => &self.validation,
			Segment::Test => &self.test,
		}
	}

	/// Actual (`y0`) against predicted (`y1`) values for charting.
	pub fn comparison_points(&self, segment: Segment) -> Vec<ComparisonPoint> {
		let prediction = self.segment(segment);

		prediction
			.index
			.iter()
			.zip(prediction.actual.iter())
			.zip(prediction.predicted.iter())
			.map(|((x, y0), y1)| ComparisonPoint {
				x: *x,
				y0: Some(*y0),
				y1: Some(*y1),
			})
			.collect()
	}

	pub fn high_peak(&self, segment: Segment) -> Option<ComparisonPoint> {
		let [high_peak, _] = find_peaks(&self.comparison_points(segment));
		high_peak
	}

	pub fn low_peak(&self, segment: Segment) -> Option<ComparisonPoint> {
		let [_, low_peak] = find_peaks(&self.comparison_points(segment));
		low_peak
	}
}

pub fn save_predictions(path: impl AsRef<Path>, predictions: &Predictions) -> Result<()> {
	let mut writer = csv::Writer::from_path(path.as_ref())?;
	writer.write_record(["Date/Time", "Segment", "Actual Value", "Predicted Value"])?;

	for segment in Segment::iter() {
		let prediction = predictions.segment(segment);
		for ((x, actual), predicted) in prediction
			.index
			.iter()
			.zip(prediction.actual.iter())
			.zip(prediction.predicted.iter())
		{
			writer.write_record([
				x.to_rfc3339(),
				segment.to_string(),
				actual.to_string(),
				predicted.to_string(),
			])?;
		}
	}

	writer.flush()?;
	info!(path = %path.as_ref().display(), "Predictions saved");
	Ok(())
}

pub fn save_loss_history(path: impl AsRef<Path>, history: &LossHistory) -> Result<()> {
	let writer = BufWriter::new(File::create(path.as_ref())?);
	serde_json::to_writer_pretty(writer, history)?;
	info!(path = %path.as_ref().display(), "Loss history saved");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::preprocess::command::preprocess;
	use crate::train::model::LstmNetworkConfig;
	use crate::typedef::TimeTable;
	use approx::assert_abs_diff_eq;
	use burn::backend::{ndarray::NdArrayDevice, NdArray};
	use chrono::{DateTime, Duration, Local, TimeZone};
	use ndarray::{Array1, Axis};
	use std::sync::Arc;

	fn index(count: usize) -> Vec<DateTime<Local>> {
		let start = Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
		(0..count).map(|i| start + Duration::days(i as i64)).collect()
	}

	fn preprocessed() -> Preprocessed {
		let values = Array1::from_shape_fn(60, |i| 100.0 + i as f64 * 0.5).insert_axis(Axis(1));
		let table = TimeTable::new(index(60), vec![Arc::new(String::from("Close"))], values).unwrap();
		preprocess(&table.rows(0..40), &table.rows(40..50), &table.rows(50..60), 5).unwrap()
	}

	#[test]
	fn output_lengths_follow_window_counts() {
		let device = NdArrayDevice::Cpu;
		let preprocessed = preprocessed();
		let model = LstmNetworkConfig::new(5).init::<NdArray>(&device).unwrap();

		let predictions = predict(&model, &preprocessed, &device).unwrap();
		assert_eq!(predictions.train.predicted.len(), 35);
		assert_eq!(predictions.validation.predicted.len(), 5);
		assert_eq!(predictions.test.predicted.len(), 5);
		assert_eq!(predictions.test.actual.len(), 5);
		assert_eq!(predictions.test.index.len(), 5);
	}

	#[test]
	fn actual_values_are_back_in_price_units() {
		let device = NdArrayDevice::Cpu;
		let preprocessed = preprocessed();
		let model = LstmNetworkConfig::new(5).init::<NdArray>(&device).unwrap();

		let predictions = predict(&model, &preprocessed, &device).unwrap();
		// Row 5 is the first train target, row 55 the first test target
		assert_abs_diff_eq!(predictions.train.actual[0], 102.5, epsilon = 1e-9);
		assert_abs_diff_eq!(predictions.test.actual[0], 127.5, epsilon = 1e-9);
		assert!(predictions.test.predicted.iter().all(|each| each.is_finite()));
	}

	#[test]
	fn comparison_points_pair_actual_with_predicted() {
		let device = NdArrayDevice::Cpu;
		let preprocessed = preprocessed();
		let model = LstmNetworkConfig::new(5).init::<NdArray>(&device).unwrap();
		let predictions = predict(&model, &preprocessed, &device).unwrap();

		let points = predictions.comparison_points(Segment::Validation);
		assert_eq!(points.len(), 5);
		assert_eq!(points[0].x, preprocessed.validation.target_index[0]);
		assert_eq!(points[0].y0, Some(predictions.validation.actual[0]));

		let high = predictions.high_peak(Segment::Validation).unwrap();
		let low = predictions.low_peak(Segment::Validation).unwrap();
		assert!(high.y1 >= low.y1);
	}

	#[test]
	fn csv_export_has_one_row_per_prediction() {
		let device = NdArrayDevice::Cpu;
		let preprocessed = preprocessed();
		let model = LstmNetworkConfig::new(5).init::<NdArray>(&device).unwrap();
		let predictions = predict(&model, &preprocessed, &device).unwrap();

		let directory = tempfile::tempdir().unwrap();
		let path = directory.path().join("predictions.csv");
		save_predictions(&path, &predictions).unwrap();

		let mut reader = csv::Reader::from_path(&path).unwrap();
		assert_eq!(
			reader.headers().unwrap().iter().collect::<Vec<_>>(),
			vec!["Date/Time", "Segment", "Actual Value", "Predicted Value"]
		);

		let records = reader.records().collect::<std::result::Result<Vec<_>, _>>().unwrap();
		assert_eq!(records.len(), 45);
		assert_eq!(&records[0][1], "train");
		assert_eq!(&records[44][1], "test");
	}

	#[test]
	fn loss_history_is_written_as_json() {
		let mut history = LossHistory::default();
		history.push(0.5, 0.7);
		history.push(0.25, 0.4);

		let directory = tempfile::tempdir().unwrap();
		let path = directory.path().join("history.json");
		save_loss_history(&path, &history).unwrap();

		let restored: LossHistory = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
		assert_eq!(restored, history);
	}
}
