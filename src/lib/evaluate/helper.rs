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

use burn::tensor::backend::Backend;
use ndarray::Axis;

use super::typedef::*;
use crate::error::Result;
use crate::preprocess::{
	scaler::MinMaxScaler,
	typedef::{Segment, SegmentTensors},
};
use crate::train::{inputs_to_tensor, model::LstmNetwork, tensor_to_array};

// Windows per forward pass
const PREDICT_BATCH: usize = 256;

pub(super) fn predict_segment<B: Backend>(
	model: &LstmNetwork<B>,
	tensors: &SegmentTensors,
	scaler: &MinMaxScaler,
	segment: Segment,
	device: &B::Device,
) -> Result<SegmentPrediction> {
	let mut scaled_output = Vec::with_capacity(tensors.len());
	for chunk in tensors.inputs.axis_chunks_iter(Axis(0), PREDICT_BATCH) {
		let output = tensor_to_array(model.forward(inputs_to_tensor::<B>(chunk, device)))?;
		scaled_output.extend(output.column(0).iter().copied());
	}

	let scaled_actual = tensors.target_column(0)?.to_vec();

	Ok(SegmentPrediction {
		segment,
		index: tensors.target_index.clone(),
		actual: scaler.inverse_transform_column(&scaled_actual, 0)?,
		predicted: scaler.inverse_transform_column(&scaled_output, 0)?,
	})
}

/// Highest and lowest predicted points, earliest one wins on ties.
pub(super) fn find_peaks(points: &[ComparisonPoint]) -> [Option<ComparisonPoint>; 2] {
	let [high_peak, low_peak] = points.iter().filter(|each| each.y1.is_some()).fold(
		[Option::<&ComparisonPoint>::None; 2],
		|[last_max, last_min], each| {
			let y1 = each.y1.unwrap_or_default();
			let last_max_y1 = last_max.and_then(|found| found.y1).unwrap_or(f64::MIN);
			let last_min_y1 = last_min.and_then(|found| found.y1).unwrap_or(f64::MAX);

			let max = Some(if y1 > last_max_y1 {
				each
			} else {
				last_max.unwrap_or(each)
			});

			let min = Some(if y1 < last_min_y1 {
				each
			} else {
				last_min.unwrap_or(each)
			});

			[max, min]
		},
	);

	[high_peak.cloned(), low_peak.cloned()]
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::{Duration, Local, TimeZone};

	#[test]
	fn peaks_ignore_points_without_prediction() {
		let start = Local.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
		let points = [Some(3.0), None, Some(9.0), Some(1.0), Some(9.0)]
			.iter()
			.enumerate()
			.map(|(i, y1)| ComparisonPoint {
				x: start + Duration::days(i as i64),
				y0: Some(100.0),
				y1: *y1,
			})
			.collect::<Vec<_>>();

		let [high, low] = find_peaks(&points);
		assert_eq!(high.unwrap().x, points[2].x);
		assert_eq!(low.unwrap().y1, Some(1.0));

		assert_eq!(find_peaks(&points[1..2]), [None, None]);
	}
}
