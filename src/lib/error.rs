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

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForecastError>;

/// Coarse classification a front end can branch on without matching every variant.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ErrorKind {
	Validation,
	Type,
	Lookup,
	Runtime,
}

#[derive(Debug, Error)]
pub enum ForecastError {
	#[error("{0}")]
	Validation(String),

	#[error("{0}")]
	Type(String),

	#[error("{0} not found")]
	Lookup(String),

	#[error("Error downloading data for stock symbol {symbol}: {reason}")]
	Acquisition { symbol: String, reason: String },

	#[error("Error occurred during model training: {0}")]
	Training(#[source] Box<dyn std::error::Error + Send + Sync>),

	#[error("Checkpoint unusable: {0}")]
	Checkpoint(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Csv(#[from] csv::Error),

	#[error(transparent)]
	Spreadsheet(#[from] calamine::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Shape(#[from] ndarray::ShapeError),
}

impl ForecastError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ForecastError::Validation(_) | ForecastError::Acquisition { .. } => ErrorKind::Validation,
			ForecastError::Type(_) => ErrorKind::Type,
			ForecastError::Lookup(_) => ErrorKind::Lookup,
			ForecastError::Training(_)
			| ForecastError::Checkpoint(_)
			| ForecastError::Io(_)
			| ForecastError::Csv(_)
			| ForecastError::Spreadsheet(_)
			| ForecastError::Json(_)
			| ForecastError::Shape(_) => ErrorKind::Runtime,
		}
	}

	pub(crate) fn validation(message: impl Into<String>) -> Self {
		ForecastError::Validation(message.into())
	}

	pub(crate) fn lookup(key: impl std::fmt::Display) -> Self {
		ForecastError::Lookup(format!("\"{key}\""))
	}

	pub(crate) fn training(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
		ForecastError::Training(cause.into())
	}
}
