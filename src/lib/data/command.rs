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

use std::path::PathBuf;

use tracing::{info, warn};

use super::helper::*;
use super::typedef::*;
use crate::error::{ForecastError, Result};
use crate::typedef::TimeTable;

/// Supplies the complete history of one symbol over a period. Calls block until the table is ready.
pub trait MarketDataSource {
	fn fetch(&self, symbol: &str, period: Period) -> Result<TimeTable>;
}

/// Reads `<root>/<SYMBOL>.<ext>` where `ext` is one of the supported spreadsheet formats.
#[derive(Clone, Debug)]
pub struct FileMarketSource {
	root: PathBuf,
}

impl FileMarketSource {
	pub const EXTENSIONS: [&'static str; 5] = ["csv", "xlsx", "xls", "xlsb", "ods"];

	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}
}

impl MarketDataSource for FileMarketSource {
	fn fetch(&self, symbol: &str, period: Period) -> Result<TimeTable> {
		let source_path = Self::EXTENSIONS
			.iter()
			.map(|extension| self.root.join(format!("{symbol}.{extension}")))
			.find(|each| each.is_file())
			.ok_or_else(|| ForecastError::Acquisition {
				symbol: symbol.to_string(),
				reason: format!("no data file in {}", self.root.display()),
			})?;

		let extension = source_path
			.extension()
			.and_then(|each| each.to_str())
			.unwrap_or_default();
		let (headers, rows) = match extension {
			"csv" => read_csv(&source_path)?,
			_ => read_spreadsheet(&source_path)?,
		};

		let table = build_table(&headers, rows)?;
		Ok(filter_period(&table, period))
	}
}

/// Fetches every symbol and derives `change_percent` from `Close`. Symbols default to `["AAPL"]` and the
/// period to `"1y"`. A symbol the source cannot deliver fails the whole call.
pub fn gather_data<S: MarketDataSource + ?Sized>(
	source: &S,
	symbols: Option<&[String]>,
	period: Option<&str>,
) -> Result<StockData> {
	let default_symbols = [String::from(DEFAULT_SYMBOL)];
	let symbols = symbols.unwrap_or(&default_symbols);
	let period = period.unwrap_or(DEFAULT_PERIOD).parse::<Period>()?;

	let mut stock_data = StockData::new();
	for symbol in symbols {
		validate_symbol(symbol)?;

		let table = source.fetch(symbol, period).map_err(|err| match err {
			ForecastError::Acquisition { .. } => err,
			other => ForecastError::Acquisition {
				symbol: symbol.clone(),
				reason: other.to_string(),
			},
		})?;

		if table.is_empty() {
			return Err(ForecastError::Acquisition {
				symbol: symbol.clone(),
				reason: format!("no data found for stock symbol {symbol}"),
			});
		}

		let change = change_percent(table.column(CLOSE_COLUMN)?);
		let table = table.with_column(CHANGE_PERCENT_COLUMN, change)?;

		info!(symbol = %symbol, %period, rows = table.len(), "Stock data gathered");
		stock_data.insert(symbol.clone(), table);
	}

	Ok(stock_data)
}

/// Statistics of `feature` for `symbol`, as shown next to the price chart.
pub fn summarize(data: &StockData, symbol: &str, feature: &str) -> Result<ColumnSummary> {
	if data.is_empty() {
		return Err(ForecastError::validation("Data is empty"));
	}

	let table = data.get(symbol).ok_or_else(|| ForecastError::lookup(symbol))?;

	if !table.has_column(CHANGE_PERCENT_COLUMN) {
		return Err(ForecastError::validation(format!(
			"Data does not contain '{CHANGE_PERCENT_COLUMN}' column"
		)));
	}

	let summary = column_summary(table.column(feature)?);
	if summary.missing > 0 {
		warn!(symbol, feature, missing = summary.missing, "Column has missing values");
	}

	Ok(summary)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{collections::HashMap, io::Write};

	struct FixedSource(HashMap<String, TimeTable>);

	impl MarketDataSource for FixedSource {
		fn fetch(&self, symbol: &str, _period: Period) -> Result<TimeTable> {
			self.0
				.get(symbol)
				.cloned()
				.ok_or_else(|| ForecastError::validation("unknown symbol"))
		}
	}

	const CSV: &str = "Date,Open,High,Low,Close,Volume\n\
		2024-01-04,11,12,10,11,1000\n\
		2024-01-02,10,11,9,10,900\n\
		2024-01-03,10,12,10,12,1100\n";

	fn directory_with(symbol: &str, content: &str) -> tempfile::TempDir {
		let directory = tempfile::tempdir().unwrap();
		let mut file = std::fs::File::create(directory.path().join(format!("{symbol}.csv"))).unwrap();
		file.write_all(content.as_bytes()).unwrap();
		directory
	}

	#[test]
	fn gathers_from_csv_with_defaults() {
		let directory = directory_with("AAPL", CSV);
		let source = FileMarketSource::new(directory.path());

		let data = gather_data(&source, None, None).unwrap();
		let table = &data["AAPL"];

		assert_eq!(table.len(), 3);
		assert_eq!(table.columns().last().unwrap().as_str(), CHANGE_PERCENT_COLUMN);
		assert_eq!(table.column("Close").unwrap().to_vec(), vec![10.0, 12.0, 11.0]);

		let change = table.column(CHANGE_PERCENT_COLUMN).unwrap();
		assert!(change[0].is_nan());
		assert!((change[1] - 20.0).abs() < 1e-9);
	}

	#[test]
	fn period_is_trimmed_and_checked() {
		let directory = directory_with("AAPL", CSV);
		let source = FileMarketSource::new(directory.path());

		assert!(gather_data(&source, None, Some(" 5d ")).is_ok());
		assert!(matches!(
			gather_data(&source, None, Some("1y!")),
			Err(ForecastError::Validation(_))
		));
		assert!(matches!(
			gather_data(&source, None, Some("")),
			Err(ForecastError::Validation(_))
		));
	}

	#[test]
	fn unknown_symbols_name_the_symbol() {
		let directory = directory_with("AAPL", CSV);
		let source = FileMarketSource::new(directory.path());

		let symbols = [String::from("ZZZZ")];
		match gather_data(&source, Some(symbols.as_slice()), None) {
			Err(ForecastError::Acquisition { symbol, .. }) => assert_eq!(symbol, "ZZZZ"),
			other => panic!("Expected an acquisition error, got {other:?}"),
		}

		let symbols = [String::from("AAPL Inc")];
		assert!(matches!(
			gather_data(&source, Some(symbols.as_slice()), None),
			Err(ForecastError::Acquisition { .. })
		));
	}

	#[test]
	fn empty_symbol_list_gives_empty_map() {
		let source = FixedSource(HashMap::new());
		assert!(gather_data(&source, Some(&[] as &[String]), None).unwrap().is_empty());
	}

	#[test]
	fn source_failures_become_acquisition_errors() {
		let source = FixedSource(HashMap::new());
		let symbols = [String::from("MSFT")];
		let err = gather_data(&source, Some(symbols.as_slice()), None).unwrap_err();

		assert!(matches!(err, ForecastError::Acquisition { .. }));
		assert!(err.to_string().contains("MSFT"));
	}

	#[test]
	fn summary_checks_its_inputs() {
		let directory = directory_with("AAPL", CSV);
		let data = gather_data(&FileMarketSource::new(directory.path()), None, None).unwrap();

		let summary = summarize(&data, "AAPL", "Close").unwrap();
		assert_eq!(summary.count, 3);
		assert_eq!(summary.max, 12.0);

		assert!(matches!(
			summarize(&StockData::new(), "AAPL", "Close"),
			Err(ForecastError::Validation(_))
		));
		assert!(matches!(
			summarize(&data, "MSFT", "Close"),
			Err(ForecastError::Lookup(_))
		));
		assert!(matches!(
			summarize(&data, "AAPL", "Dividends"),
			Err(ForecastError::Lookup(_))
		));
	}
}
