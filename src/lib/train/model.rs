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

use std::path::Path;

use burn::{
	config::Config,
	module::Module,
	nn::{Linear, LinearConfig, Lstm, LstmConfig, Relu},
	record::{FullPrecisionSettings, NamedMpkFileRecorder},
	tensor::{backend::Backend, Tensor},
};
use tracing::debug;

use crate::error::ForecastError;

pub const CONFIG_FILE: &str = "model.json";
// The recorder appends ".mpk" by itself
pub const WEIGHTS_STEM: &str = "model";

#[derive(Config, Debug)]
pub struct LstmNetworkConfig {
	/// Window length, the number of time steps per sample.
	pub input_size: usize,

	#[config(default = 50)]
	pub lstm_hidden_size: usize,

	#[config(default = 10)]
	pub linear_hidden_size: usize,

	#[config(default = 2)]
	pub lstm_num_layers: usize,

	#[config(default = 2)]
	pub linear_num_layers: usize,

	#[config(default = 1)]
	pub output_size: usize,

	/// Width of each time step.
	#[config(default = 1)]
	pub feature_size: usize,
}

impl LstmNetworkConfig {
	/// Widths of the dense head. Each layer after the first is 2/3 of the previous one, floored.
	pub fn linear_widths(&self) -> Vec<usize> {
		std::iter::successors(Some(self.linear_hidden_size), |width| Some(width * 2 / 3))
			.take(self.linear_num_layers)
			.collect()
	}

	pub fn validate(&self) -> crate::error::Result<()> {
		let sizes = [
			("input_size", self.input_size),
			("lstm_hidden_size", self.lstm_hidden_size),
			("linear_hidden_size", self.linear_hidden_size),
			("lstm_num_layers", self.lstm_num_layers),
			("linear_num_layers", self.linear_num_layers),
			("output_size", self.output_size),
			("feature_size", self.feature_size),
		];

		if let Some((name, _)) = sizes.iter().find(|(_, size)| *size == 0) {
			return Err(ForecastError::validation(format!(
				"Model {name} must be a positive integer"
			)));
		}

		if self.linear_widths().contains(&0) {
			return Err(ForecastError::validation(format!(
				"A dense head of {} layers starting at width {} shrinks to zero units",
				self.linear_num_layers, self.linear_hidden_size
			)));
		}

		Ok(())
	}

	pub fn init<B: Backend>(&self, device: &B::Device) -> crate::error::Result<LstmNetwork<B>> {
		self.validate()?;

		let lstm_stack = (1..self.lstm_num_layers)
			.map(|layer| {
				let input = if layer == 1 {
					self.feature_size
				} else {
					self.lstm_hidden_size
				};
				LstmConfig::new(input, self.lstm_hidden_size, true).init(device)
			})
			.collect::<Vec<_>>();

		let last_input = if self.lstm_num_layers == 1 {
			self.feature_size
		} else {
			self.lstm_hidden_size
		};
		let lstm_last = LstmConfig::new(last_input, self.lstm_hidden_size, true).init(device);

		let widths = self.linear_widths();
		let mut linear_layers = Vec::with_capacity(widths.len());
		let mut previous = self.lstm_hidden_size;
		for width in widths.iter() {
			linear_layers.push(LinearConfig::new(previous, *width).init(device));
			previous = *width;
		}

		debug!(
			lstm_layers = self.lstm_num_layers,
			lstm_hidden = self.lstm_hidden_size,
			dense_widths = ?widths,
			"Model initialized"
		);

		Ok(LstmNetwork {
			lstm_stack,
			lstm_last,
			linear_layers,
			output_layer: LinearConfig::new(previous, self.output_size).init(device),
			activation: Relu::new(),
		})
	}
}

/// Model input resolved once at the boundary. A flat `(batch, features)` batch is treated as windows of
/// a single time step.
#[derive(Clone, Debug)]
pub enum ModelInput<B: Backend> {
	Flat(Tensor<B, 2>),
	Sequence(Tensor<B, 3>),
}

impl<B: Backend> ModelInput<B> {
	pub fn into_sequence(self) -> Tensor<B, 3> {
		match self {
			ModelInput::Flat(tensor) => tensor.unsqueeze_dim::<3>(1),
			ModelInput::Sequence(tensor) => tensor,
		}
	}
}

impl<B: Backend> From<Tensor<B, 2>> for ModelInput<B> {
	fn from(tensor: Tensor<B, 2>) -> Self {
		ModelInput::Flat(tensor)
	}
}

impl<B: Backend> From<Tensor<B, 3>> for ModelInput<B> {
	fn from(tensor: Tensor<B, 3>) -> Self {
		ModelInput::Sequence(tensor)
	}
}

#[derive(Module, Debug)]
pub struct LstmNetwork<B: Backend> {
	lstm_stack: Vec<Lstm<B>>,
	lstm_last: Lstm<B>,
	linear_layers: Vec<Linear<B>>,
	output_layer: Linear<B>,
	activation: Relu,
}

impl<B: Backend> LstmNetwork<B> {
	/// `(batch, steps, features)` in, `(batch, output_size)` out.
	pub fn forward(&self, input: impl Into<ModelInput<B>>) -> Tensor<B, 2> {
		// Stacked layers hand their whole output sequence to the next one
		let sequence = self
			.lstm_stack
			.iter()
			.fold(input.into().into_sequence(), |sequence, layer| {
				layer.forward(sequence, None).0
			});

		// Only the final hidden state of the last layer goes to the dense head
		let (_, state) = self.lstm_last.forward(sequence, None);

		let hidden = self
			.linear_layers
			.iter()
			.fold(state.hidden, |hidden, layer| {
				self.activation.forward(layer.forward(hidden))
			});

		self.output_layer.forward(hidden)
	}

	/// Writes the configuration as JSON and the weights as a full-precision named MessagePack record.
	pub fn save_checkpoint(
		&self,
		config: &LstmNetworkConfig,
		directory: &Path,
	) -> crate::error::Result<()> {
		std::fs::create_dir_all(directory)?;
		config.save(directory.join(CONFIG_FILE))?;

		self.clone()
			.save_file(
				directory.join(WEIGHTS_STEM),
				&NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
			)
			.map_err(|err| ForecastError::Checkpoint(err.to_string()))?;

		debug!(directory = %directory.display(), "Checkpoint saved");
		Ok(())
	}

	pub fn load_checkpoint(
		directory: &Path,
		device: &B::Device,
	) -> crate::error::Result<(LstmNetwork<B>, LstmNetworkConfig)> {
		let config = LstmNetworkConfig::load(directory.join(CONFIG_FILE))
			.map_err(|err| ForecastError::Checkpoint(err.to_string()))?;

		let model = config
			.init::<B>(device)?
			.load_file(
				directory.join(WEIGHTS_STEM),
				&NamedMpkFileRecorder::<FullPrecisionSettings>::new(),
				device,
			)
			.map_err(|err| ForecastError::Checkpoint(err.to_string()))?;

		Ok((model, config))
	}
}
