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

use ndarray::{stack, ArrayD, ArrayViewD, Axis, Ix3, IxDyn, Slice};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info};

use super::helper::*;
use super::scaler::MinMaxScaler;
use super::typedef::*;
use crate::error::{ForecastError, Result};
use crate::typedef::{CellValue, TimeTable};

/// Cuts one column of one instrument into train, validation and test segments without reordering.
pub fn split_dataset_sequentially(
	data: &BTreeMap<String, TimeTable>,
	(symbol, feature): (&str, &str),
	ratio: SplitRatio,
) -> Result<SplitData> {
	ratio.validate()?;

	let table = data.get(symbol).ok_or_else(|| ForecastError::lookup(symbol))?;
	let column = table.select(feature)?;

	let n = column.len();
	let (train_end, validation_end) = split_boundaries(n, ratio);

	debug!(
		symbol,
		feature,
		train = train_end,
		validation = validation_end - train_end,
		test = n - validation_end,
		"Split dataset"
	);

	Ok(SplitData {
		train: column.rows(0..train_end),
		validation: column.rows(train_end..validation_end),
		test: column.rows(validation_end..n),
	})
}

/// Slides a window of `sequence_size` samples along the leading axis. Window `i` covers
/// `data[i..i + sequence_size]` and its target is `data[i + sequence_size]`.
pub fn construct_windows(data: ArrayViewD<'_, f64>, sequence_size: usize) -> Result<Windows> {
	if data.ndim() == 0 {
		return Err(ForecastError::validation(
			"Input data needs at least one axis to window over",
		));
	}

	let n = data.len_of(Axis(0));
	if sequence_size == 0 || sequence_size >= n {
		return Err(ForecastError::validation(format!(
			"Sequence size must be a positive integer less than the number of samples ({n}), got {sequence_size}"
		)));
	}

	let count = n - sequence_size;
	let windows = (0..count)
		.map(|start| data.slice_axis(Axis(0), Slice::from(start..start + sequence_size)))
		.collect::<Vec<_>>();
	let inputs = stack(Axis(0), &windows)?;

	let targets = data.slice_axis(Axis(0), Slice::from(sequence_size..n));
	let shape = squeezed_shape(targets.shape());
	let targets = ArrayD::from_shape_vec(IxDyn(&shape), targets.iter().copied().collect())?;

	Ok(Windows { inputs, targets })
}

/// Same as [`construct_windows`] for raw cells. Any non-numeric cell is a type error, whatever the
/// sequence size.
pub fn construct_windows_from_cells(
	cells: ArrayViewD<'_, CellValue>,
	sequence_size: usize,
) -> Result<Windows> {
	let numbers = cells_to_numbers(cells)?;
	construct_windows(numbers.view(), sequence_size)
}

fn to_segment_tensors(
	scaler: &MinMaxScaler,
	table: &TimeTable,
	window_size: usize,
) -> Result<SegmentTensors> {
	let scaled = scaler.transform_table(table)?;
	let windows = construct_windows(scaled.values().into_dyn(), window_size)?;

	Ok(SegmentTensors {
		inputs: windows.inputs.into_dimensionality::<Ix3>()?,
		targets: windows.targets,
		target_index: scaled.index()[window_size..].to_vec(),
	})
}

/// Fits the scaler on `train`, scales all three segments with it, then windows each segment on its own.
pub fn preprocess(
	train: &TimeTable,
	validation: &TimeTable,
	test: &TimeTable,
	window_size: usize,
) -> Result<Preprocessed> {
	let segments = [
		(Segment::Train, train),
		(Segment::Validation, validation),
		(Segment::Test, test),
	];

	ensure_clean(&segments)?;
	ensure_matching_columns(train, &segments)?;

	let scaler = MinMaxScaler::fit(train.values(), train.columns())?;

	let preprocessed = Preprocessed {
		train: to_segment_tensors(&scaler, train, window_size)?,
		validation: to_segment_tensors(&scaler, validation, window_size)?,
		test: to_segment_tensors(&scaler, test, window_size)?,
		scaler: Arc::new(scaler),
		window_size,
	};

	info!(
		window_size,
		features = preprocessed.feature_size(),
		train = preprocessed.train.len(),
		validation = preprocessed.validation.len(),
		test = preprocessed.test.len(),
		"Preprocessing finished"
	);

	Ok(preprocessed)
}
