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
use serde::Serialize;

use crate::preprocess::typedef::Segment;

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonPoint {
	pub x: DateTime<Local>,
	pub y0: Option<f64>,
	pub y1: Option<f64>,
}

/// Model output for one segment in price units, aligned row for row with the segment's targets.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPrediction {
	pub segment: Segment,
	pub index: Vec<DateTime<Local>>,
	pub actual: Vec<f64>,
	pub predicted: Vec<f64>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Predictions {
	pub train: SegmentPrediction,
	pub validation: SegmentPrediction,
	pub test: SegmentPrediction,
}
