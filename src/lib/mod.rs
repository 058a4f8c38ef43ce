#![recursion_limit = "256"]

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

//! Stock price forecasting workbench: gather a ticker's history, split it chronologically, scale it with
//! statistics from the training segment only, window it, then train and evaluate a stacked LSTM on it.

pub mod config;
pub mod error;
pub mod typedef;

pub mod data;
pub mod evaluate;
pub mod preprocess;
pub mod train;

pub use config::WorkbenchConfig;
pub use error::{ErrorKind, ForecastError, Result};
pub use typedef::{CellValue, PipelineState, Selection, TimeTable};
