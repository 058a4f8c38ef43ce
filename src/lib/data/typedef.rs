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

use chrono::{DateTime, Datelike, Duration, Local, Months, TimeZone};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, str::FromStr};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::error::{ForecastError, Result};
use crate::typedef::TimeTable;

pub type StockData = BTreeMap<String, TimeTable>;

pub const DEFAULT_SYMBOL: &str = "AAPL";
pub const DEFAULT_PERIOD: &str = "1y";
pub const CLOSE_COLUMN: &str = "Close";
pub const CHANGE_PERCENT_COLUMN: &str = "change_percent";

#[derive(Default, PartialEq, Eq, EnumIter, Deserialize, Serialize, Clone, Copy, Debug)]
pub enum Period {
	#[serde(rename = "1d")]
	OneDay,
	#[serde(rename = "5d")]
	FiveDays,
	#[serde(rename = "1mo")]
	OneMonth,
	#[serde(rename = "3mo")]
	ThreeMonths,
	#[serde(rename = "6mo")]
	SixMonths,
	#[default]
	#[serde(rename = "1y")]
	OneYear,
	#[serde(rename = "2y")]
	TwoYears,
	#[serde(rename = "5y")]
	FiveYears,
	#[serde(rename = "10y")]
	TenYears,
	#[serde(rename = "ytd")]
	YearToDate,
	#[serde(rename = "max")]
	Max,
}

impl std::fmt::Display for Period {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Period::OneDay => write!(f, "1d"),
			Period::FiveDays => write!(f, "5d"),
			Period::OneMonth => write!(f, "1mo"),
			Period::ThreeMonths => write!(f, "3mo"),
			Period::SixMonths => write!(f, "6mo"),
			Period::OneYear => write!(f, "1y"),
			Period::TwoYears => write!(f, "2y"),
			Period::FiveYears => write!(f, "5y"),
			Period::TenYears => write!(f, "10y"),
			Period::YearToDate => write!(f, "ytd"),
			Period::Max => write!(f, "max"),
		}
	}
}

impl FromStr for Period {
	type Err = ForecastError;

	fn from_str(text: &str) -> Result<Self> {
		let trimmed = text.trim();
		Period::iter()
			.find(|each| each.to_string() == trimmed)
			.ok_or_else(|| {
				ForecastError::validation(format!(
					"Unknown period \"{trimmed}\", expected one of: {}",
					Period::iter().map(|each| each.to_string()).collect::<Vec<_>>().join(", ")
				))
			})
	}
}

impl Period {
	/// Oldest timestamp kept when the most recent row is stamped `latest`. `None` keeps everything.
	pub fn start_from(&self, latest: DateTime<Local>) -> Option<DateTime<Local>> {
		match self {
			Period::OneDay => Some(latest - Duration::days(1)),
			Period::FiveDays => Some(latest - Duration::days(5)),
			Period::OneMonth => latest.checked_sub_months(Months::new(1)),
			Period::ThreeMonths => latest.checked_sub_months(Months::new(3)),
			Period::SixMonths => latest.checked_sub_months(Months::new(6)),
			Period::OneYear => latest.checked_sub_months(Months::new(12)),
			Period::TwoYears => latest.checked_sub_months(Months::new(24)),
			Period::FiveYears => latest.checked_sub_months(Months::new(60)),
			Period::TenYears => latest.checked_sub_months(Months::new(120)),
			Period::YearToDate => Local
				.with_ymd_and_hms(latest.year(), 1, 1, 0, 0, 0)
				.earliest(),
			Period::Max => None,
		}
	}
}

/// Descriptive statistics of one column. `std` is the sample deviation; missing values are skipped
/// everywhere except `missing`.
#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
	pub count: usize,
	pub mean: f64,
	pub std: f64,
	pub min: f64,
	pub max: f64,
	pub missing: usize,
}
