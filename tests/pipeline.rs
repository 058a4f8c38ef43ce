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

use std::{fmt::Write as _, fs};

use approx::assert_abs_diff_eq;
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use chrono::{Duration, NaiveDate};

use ticker_lstm_lib::data::command::{gather_data, FileMarketSource};
use ticker_lstm_lib::data::typedef::StockData;
use ticker_lstm_lib::evaluate::command::{save_loss_history, save_predictions};
use ticker_lstm_lib::preprocess::typedef::{Segment, SplitRatio};
use ticker_lstm_lib::train::command::fit;
use ticker_lstm_lib::{ErrorKind, PipelineState, Selection, WorkbenchConfig};

fn write_history(directory: &std::path::Path, symbol: &str, rows: usize) {
	let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
	let mut content = String::from("Date,Open,High,Low,Close,Volume\n");

	for i in 0..rows {
		let day = start + Duration::days(i as i64);
		let close = 100.0 + 10.0 * (i as f64 / 6.0).sin() + i as f64 * 0.1;
		writeln!(
			content,
			"{},{:.4},{:.4},{:.4},{:.4},{}",
			day.format("%Y-%m-%d"),
			close - 0.5,
			close + 1.0,
			close - 1.0,
			close,
			1000 + i
		)
		.unwrap();
	}

	fs::write(directory.join(format!("{symbol}.csv")), content).unwrap();
}

fn gathered(rows: usize) -> (tempfile::TempDir, StockData) {
	let directory = tempfile::tempdir().unwrap();
	write_history(directory.path(), "AAPL", rows);

	let source = FileMarketSource::new(directory.path());
	let data = gather_data(&source, None, Some("max")).unwrap();
	(directory, data)
}

fn selection(window_size: usize) -> Selection {
	Selection {
		symbol: String::from("AAPL"),
		feature: String::from("Close"),
		window_size,
		ratio: SplitRatio::default(),
	}
}

#[test]
fn split_covers_every_row_in_order() {
	let (_directory, data) = gathered(203);
	let state = PipelineState::gathered(data).with_split(selection(8)).unwrap();

	let split = state.split_data().unwrap();
	assert_eq!(split.train.len(), 142);
	assert_eq!(split.test.len(), 40);
	assert_eq!(split.validation.len(), 21);

	let original = state.stock_data().unwrap()["AAPL"].column("Close").unwrap().to_vec();
	let joined = [&split.train, &split.validation, &split.test]
		.iter()
		.flat_map(|each| each.values().column(0).to_vec())
		.collect::<Vec<_>>();
	assert_eq!(joined, original);
}

#[test]
fn preprocessing_gives_one_window_per_row_after_the_first_window() {
	let (_directory, data) = gathered(200);
	let state = PipelineState::gathered(data).with_preprocessing(selection(8)).unwrap();

	let preprocessed = state.preprocessed().unwrap();
	assert_eq!(preprocessed.train.inputs.shape(), &[132, 8, 1]);
	assert_eq!(preprocessed.train.targets.shape(), &[132]);
	assert_eq!(preprocessed.validation.inputs.shape(), &[13, 8, 1]);
	assert_eq!(preprocessed.test.inputs.shape(), &[31, 8, 1]);

	let scaler = &preprocessed.scaler;
	let train = &state.split_data().unwrap().train;
	let close = train.column("Close").unwrap();
	assert_abs_diff_eq!(
		scaler.data_min()[0],
		close.iter().copied().fold(f64::INFINITY, f64::min),
		epsilon = 1e-12
	);
	assert_abs_diff_eq!(
		scaler.data_max()[0],
		close.iter().copied().fold(f64::NEG_INFINITY, f64::max),
		epsilon = 1e-12
	);
}

#[test]
fn unknown_feature_is_a_lookup_error() {
	let (_directory, data) = gathered(60);
	let mut wrong = selection(8);
	wrong.feature = String::from("Dividends");

	let err = PipelineState::gathered(data).with_split(wrong).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Lookup);
}

#[test]
fn oversized_window_is_a_validation_error() {
	let (_directory, data) = gathered(60);

	// 60 rows give a validation segment of 7 rows
	let err = PipelineState::gathered(data)
		.with_preprocessing(selection(8))
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn change_percent_has_a_missing_first_row() {
	let (_directory, data) = gathered(60);
	let mut with_change = selection(4);
	with_change.feature = String::from("change_percent");

	let err = PipelineState::gathered(data)
		.with_preprocessing(with_change)
		.unwrap_err();
	assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn trains_predicts_and_exports() {
	let (directory, data) = gathered(120);

	let mut config = WorkbenchConfig::default();
	config.window_size = 5;
	config.training = config.training.clone().with_epochs(3).with_seed(Some(42));
	config.training.model = config.training.model.clone().with_lstm_hidden_size(8);
	config.checkpoint_dir = directory.path().join("models");

	let state = PipelineState::gathered(data)
		.with_preprocessing(config.selection())
		.unwrap();
	let preprocessed = state.preprocessed().unwrap().clone();

	let trained = fit::<Autodiff<NdArray>>(
		config.training_for(preprocessed.feature_size()),
		&preprocessed,
		&config.checkpoint_dir,
		&NdArrayDevice::Cpu,
	)
	.unwrap();

	assert_eq!(trained.history.len(), 3);
	assert!((1..=3).contains(&trained.best_epoch));
	assert!(config.checkpoint_dir.join("model.json").is_file());
	assert!(config.checkpoint_dir.join("model.mpk").is_file());

	let history = trained.history.clone();
	let state = state.with_trained(trained).unwrap();
	let predictions = state.predictions().unwrap();

	for segment in [Segment::Train, Segment::Validation, Segment::Test] {
		let windows = preprocessed.segment(segment).len();
		let split_rows = state.split_data().unwrap().segment(segment).len();

		assert_eq!(predictions.segment(segment).predicted.len(), windows);
		assert_eq!(windows, split_rows - 5);
	}

	let predictions_path = directory.path().join("predictions.csv");
	let history_path = directory.path().join("history.json");
	save_predictions(&predictions_path, &predictions).unwrap();
	save_loss_history(&history_path, &history).unwrap();

	let exported = fs::read_to_string(&predictions_path).unwrap();
	assert_eq!(exported.lines().count(), 1 + 79 + 8 + 18);

	// Reselecting drops the trained model
	let reselected = state.with_preprocessing(config.selection()).unwrap();
	assert!(reselected.trained().is_none());
	assert!(reselected.predictions().is_err());
}
