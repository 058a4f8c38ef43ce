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

use burn::{
	grad_clipping::GradientClippingConfig,
	optim::AdamConfig,
	tensor::{
		backend::{AutodiffBackend, Backend},
		Tensor,
	},
};
use serde::{Deserialize, Serialize};

use super::model::*;
use crate::error::ForecastError;

#[derive(burn::config::Config)]
pub struct TrainingConfig {
	pub model: LstmNetworkConfig,
	pub optimizer: AdamConfig,

	#[config(default = 1e-3)]
	pub learning_rate: f64,

	#[config(default = 150)]
	pub epochs: usize,

	#[config(default = 16)]
	pub batch_size: usize,

	/// Fixed seed for weight init and shuffling. A random one is drawn when absent.
	pub seed: Option<u64>,
}

impl TrainingConfig {
	/// Defaults for windows of `window_size` steps: Adam with gradient-norm clipping at 1.0.
	pub fn for_window(window_size: usize) -> Self {
		Self::new(
			LstmNetworkConfig::new(window_size),
			AdamConfig::new().with_grad_clipping(Some(GradientClippingConfig::Norm(1.0))),
		)
	}
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EpochReport {
	pub epoch: usize,
	pub epochs: usize,
	pub train_loss: f64,
	pub validation_loss: f64,
	pub improved: bool,
}

/// Per-epoch losses. Both sequences always have the same length.
#[derive(Default, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LossHistory {
	train: Vec<f64>,
	validation: Vec<f64>,
}

impl LossHistory {
	pub fn push(&mut self, train_loss: f64, validation_loss: f64) {
		self.train.push(train_loss);
		self.validation.push(validation_loss);
	}

	pub fn train(&self) -> &[f64] {
		&self.train
	}

	pub fn validation(&self) -> &[f64] {
		&self.validation
	}

	pub fn len(&self) -> usize {
		self.train.len()
	}

	pub fn is_empty(&self) -> bool {
		self.train.is_empty()
	}
}

/// The best-validation model reloaded from its checkpoint, with the losses that led to it.
#[derive(Clone, Debug)]
pub struct TrainedForecaster<B: Backend> {
	pub model: LstmNetwork<B>,
	pub config: LstmNetworkConfig,
	pub history: LossHistory,
	pub best_epoch: usize,
}

#[derive(Debug)]
pub enum TrainEvent<B: Backend> {
	Epoch(EpochReport),
	Completed(TrainedForecaster<B>),
	Failed(ForecastError),
}

pub(super) struct TrainInput<B: AutodiffBackend> {
	pub train_tensor: Tensor<B, 3>,
	pub train_target_tensor: Tensor<B, 2>,
	pub valid_tensor: Tensor<B::InnerBackend, 3>,
	pub valid_target_tensor: Tensor<B::InnerBackend, 2>,
}
