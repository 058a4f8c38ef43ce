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

use anyhow::{Context, Result};
use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ticker_lstm_lib::data::command::{gather_data, summarize, FileMarketSource};
use ticker_lstm_lib::data::typedef::{StockData, CHANGE_PERCENT_COLUMN};
use ticker_lstm_lib::evaluate::command::{save_loss_history, save_predictions};
use ticker_lstm_lib::preprocess::typedef::Segment;
use ticker_lstm_lib::train::command::fit;
use ticker_lstm_lib::{PipelineState, WorkbenchConfig};

type TrainingBackend = Autodiff<NdArray>;

#[derive(Parser, Debug)]
#[command(name = "ticker-lstm")]
#[command(about = "Forecast stock prices with a stacked LSTM", long_about = None)]
#[command(version)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	/// Verbose output
	#[arg(short, long, global = true)]
	verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Write a default configuration file
	InitConfig {
		#[arg(default_value = "workbench.json")]
		path: PathBuf,
	},

	/// Print statistics of the configured symbol
	Analyze {
		/// Path to configuration file
		#[arg(short, long, default_value = "workbench.json")]
		config: PathBuf,
	},

	/// Gather, preprocess, train, then export predictions
	Run {
		/// Path to configuration file
		#[arg(short, long, default_value = "workbench.json")]
		config: PathBuf,

		/// Symbol to forecast (overrides config file)
		#[arg(short, long)]
		symbol: Option<String>,

		/// Number of epochs (overrides config file)
		#[arg(short, long)]
		epochs: Option<usize>,

		/// Seed for weight initialization and shuffling
		#[arg(long)]
		seed: Option<u64>,
	},
}

fn setup_logging(verbose: bool) {
	let level = if verbose { "debug" } else { "info" };
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	let console_layer = tracing_subscriber::fmt::layer()
		.with_target(false)
		.with_ansi(true);

	tracing_subscriber::registry()
		.with(env_filter)
		.with(console_layer)
		.init();
}

fn load_stock_data(config: &WorkbenchConfig) -> Result<StockData> {
	let source = FileMarketSource::new(&config.data_dir);
	let symbols = [config.symbol.clone()];

	gather_data(&source, Some(symbols.as_slice()), Some(config.period.as_str()))
		.with_context(|| format!("Failed to gather data from {}", config.data_dir.display()))
}

fn analyze(config: WorkbenchConfig) -> Result<()> {
	let stock_data = load_stock_data(&config)?;

	for feature in [config.feature.as_str(), CHANGE_PERCENT_COLUMN] {
		let summary = summarize(&stock_data, &config.symbol, feature)?;
		info!(
			symbol = %config.symbol,
			feature,
			count = summary.count,
			mean = summary.mean,
			std = summary.std,
			min = summary.min,
			max = summary.max,
			missing = summary.missing,
			"Summary"
		);
	}

	Ok(())
}

fn run(config: WorkbenchConfig) -> Result<()> {
	let device = NdArrayDevice::Cpu;

	let state = PipelineState::gathered(load_stock_data(&config)?)
		.with_preprocessing(config.selection())
		.context("Failed to preprocess")?;

	let preprocessed = state
		.preprocessed()
		.context("Preprocessing stage is missing")?
		.clone();

	let trained = fit::<TrainingBackend>(
		config.training_for(preprocessed.feature_size()),
		&preprocessed,
		&config.checkpoint_dir,
		&device,
	)
	.context("Failed to train")?;
	info!(
		best_epoch = trained.best_epoch,
		checkpoint = %config.checkpoint_dir.display(),
		"Best model kept"
	);

	let history = trained.history.clone();
	let state = state.with_trained(trained)?;
	let predictions = state.predictions()?;

	for segment in [Segment::Validation, Segment::Test] {
		if let (Some(high), Some(low)) = (predictions.high_peak(segment), predictions.low_peak(segment)) {
			info!(
				%segment,
				high_at = %high.x,
				high = ?high.y1,
				low_at = %low.x,
				low = ?low.y1,
				"Predicted peaks"
			);
		}
	}

	save_predictions(&config.predictions_path, &predictions)?;
	save_loss_history(&config.history_path, &history)?;

	Ok(())
}

fn main() -> Result<()> {
	let cli = Cli::parse();
	setup_logging(cli.verbose);

	match cli.command {
		Commands::InitConfig { path } => {
			WorkbenchConfig::default().write_file(&path)?;
			info!(path = %path.display(), "Default configuration written");
		}
		Commands::Analyze { config } => {
			let config = WorkbenchConfig::from_file(&config)
				.with_context(|| format!("Failed to load {}", config.display()))?;
			analyze(config)?;
		}
		Commands::Run {
			config,
			symbol,
			epochs,
			seed,
		} => {
			let mut config = WorkbenchConfig::from_file(&config)
				.with_context(|| format!("Failed to load {}", config.display()))?;

			if let Some(symbol) = symbol {
				config.symbol = symbol;
			}
			if let Some(epochs) = epochs {
				config.training.epochs = epochs;
			}
			if seed.is_some() {
				config.training.seed = seed;
			}

			run(config)?;
		}
	}

	Ok(())
}
