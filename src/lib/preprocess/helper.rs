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

use ndarray::{ArrayD, ArrayViewD};

use super::typedef::*;
use crate::error::{ForecastError, Result};
use crate::typedef::{CellValue, TimeTable};

/// End of the train segment and end of the validation segment for `n` samples. Any remainder left by
/// flooring both boundaries grows validation by one sample, never test.
pub(super) fn split_boundaries(n: usize, ratio: SplitRatio) -> (usize, usize) {
	let train_end = ((ratio.train * n as f64).floor() as usize).min(n);
	let mut validation_end = (train_end + (ratio.validation * n as f64).floor() as usize).min(n);

	if validation_end < n {
		validation_end += 1;
	}

	(train_end, validation_end)
}

/// Drops singleton axes after the leading one, so `(count, 1)` becomes `(count,)` while the window count
/// survives even when it is 1.
pub(super) fn squeezed_shape(shape: &[usize]) -> Vec<usize> {
	shape
		.iter()
		.enumerate()
		.filter(|(axis, length)| *axis == 0 || **length != 1)
		.map(|(_, length)| *length)
		.collect()
}

pub(super) fn cells_to_numbers(cells: ArrayViewD<'_, CellValue>) -> Result<ArrayD<f64>> {
	if let Some(offender) = cells.iter().find(|each| !matches!(each, CellValue::Number(_))) {
		return Err(ForecastError::Type(format!(
			"Input data must be numeric, found {offender:?}"
		)));
	}

	Ok(cells.map(|each| match each {
		CellValue::Number(number) => *number,
		_ => f64::NAN,
	}))
}

/// Every segment is checked for missing values before any is checked for infinite ones.
pub(super) fn ensure_clean(segments: &[(Segment, &TimeTable)]) -> Result<()> {
	if let Some((segment, _)) = segments.iter().find(|(_, table)| table.has_missing()) {
		return Err(ForecastError::validation(format!(
			"Input data contains missing values (first seen in the {segment} segment)"
		)));
	}

	if let Some((segment, _)) = segments.iter().find(|(_, table)| table.has_infinite()) {
		return Err(ForecastError::validation(format!(
			"Input data contains infinite values (first seen in the {segment} segment)"
		)));
	}

	Ok(())
}

pub(super) fn ensure_matching_columns(reference: &TimeTable, segments: &[(Segment, &TimeTable)]) -> Result<()> {
	for (segment, table) in segments {
		if table.columns() != reference.columns() {
			return Err(ForecastError::validation(format!(
				"The {segment} segment has columns {:?}, expected {:?}",
				table.columns(),
				reference.columns()
			)));
		}
	}

	Ok(())
}
